use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use moka::sync::Cache;
use uuid::Uuid;

use crate::features::aggregate::{
    AggregationTable, BucketMode, Dimension, aggregate, aggregate_seeded,
};
use crate::features::filter::{FilterSpec, GenderFilter, SkuFilter, apply};
use crate::features::orders::{OrderRecord, OrderRepository, STATUS_DELIVERED, STATUS_RETURN};
use crate::features::summary::{
    RegionSettings, city_ranking, country_counts, country_stats, overall_peak, peak_bucket,
    return_rate, total_for,
};

use super::models::{
    CityBreakdown, DashboardReport, GenderView, RegionView, SkuTotal, SkuView, StatusView,
};

const GENDER_MALE: &str = "male";
const GENDER_FEMALE: &str = "female";

/// 对一个快照运行完整流水线：筛选一次，然后分别聚合各视图
pub fn build_report(
    repository: &OrderRepository,
    spec: &FilterSpec,
    region: &RegionSettings,
) -> DashboardReport {
    let filtered = apply(repository.orders(), spec);
    let mode = spec.bucket_mode;

    let report = DashboardReport {
        snapshot_id: repository.id(),
        generated_at: Utc::now(),
        filter: spec.clone(),
        total_orders: repository.len(),
        matched_orders: filtered.len(),
        skus: repository.distinct_skus(),
        status: status_view(&filtered, mode),
        gender: gender_view(&filtered, mode, spec.gender),
        sku: sku_view(&filtered, mode, &spec.sku),
        region: region_view(&filtered, region),
    };

    tracing::debug!(
        "报表生成完成: 快照 {}，匹配 {}/{}",
        report.snapshot_id,
        report.matched_orders,
        report.total_orders
    );
    report
}

fn status_view(filtered: &[&OrderRecord], mode: BucketMode) -> StatusView {
    let series = [STATUS_DELIVERED, STATUS_RETURN];
    let table = aggregate_seeded(filtered.iter().copied(), mode, Dimension::Status, &series);
    let delivered = total_for(&table, STATUS_DELIVERED);
    let returned = total_for(&table, STATUS_RETURN);

    StatusView {
        mode,
        axis_key: mode.axis_key(),
        rows: table.rows_for(&series),
        delivered,
        returned,
        return_rate: return_rate(delivered, returned),
        delivered_peak: peak_bucket(&table, STATUS_DELIVERED),
        return_peak: peak_bucket(&table, STATUS_RETURN),
        years: table.years(),
    }
}

fn gender_view(filtered: &[&OrderRecord], mode: BucketMode, filter: GenderFilter) -> GenderView {
    let series = [GENDER_MALE, GENDER_FEMALE];
    let table = aggregate_seeded(filtered.iter().copied(), mode, Dimension::Gender, &series);
    let visible_series = series
        .into_iter()
        .filter(|g| filter.value().is_none_or(|wanted| wanted == *g))
        .collect();

    GenderView {
        mode,
        axis_key: mode.axis_key(),
        rows: table.rows_for(&series),
        male_total: total_for(&table, GENDER_MALE),
        female_total: total_for(&table, GENDER_FEMALE),
        male_peak: peak_bucket(&table, GENDER_MALE),
        female_peak: peak_bucket(&table, GENDER_FEMALE),
        visible_series,
        peak_caption: mode.peak_caption(),
    }
}

fn sku_view(filtered: &[&OrderRecord], mode: BucketMode, filter: &SkuFilter) -> SkuView {
    let table = aggregate(filtered.iter().copied(), mode, Dimension::Sku);
    let totals = table
        .series()
        .iter()
        .map(|sku| sku_total(&table, sku))
        .collect();
    let selected = match filter {
        SkuFilter::All => None,
        SkuFilter::Exact(sku) => Some(sku_total(&table, sku)),
    };

    SkuView {
        mode,
        axis_key: mode.axis_key(),
        rows: table.rows(),
        totals,
        overall_peak: overall_peak(&table),
        peak_caption: mode.peak_caption(),
        selected,
    }
}

fn sku_total(table: &AggregationTable, sku: &str) -> SkuTotal {
    SkuTotal {
        sku: sku.to_string(),
        count: total_for(table, sku),
        peak: peak_bucket(table, sku),
    }
}

fn region_view(filtered: &[&OrderRecord], region: &RegionSettings) -> RegionView {
    let counts = country_counts(filtered.iter().copied());
    let countries = country_stats(&counts, &region.countries);

    let cities = countries
        .iter()
        .filter(|c| c.count > 0)
        .map(|c| CityBreakdown {
            code: c.code.clone(),
            name: c.name.clone(),
            total: c.count,
            cities: city_ranking(
                filtered.iter().copied(),
                &c.code,
                &region.unknown_city_label,
            ),
        })
        .collect();

    let other_countries = counts
        .iter()
        .filter(|(code, _)| region.country_name(code).is_none())
        .map(|(code, count)| (code.clone(), *count))
        .collect();

    RegionView {
        countries,
        cities,
        other_countries,
    }
}

/// 报表服务：持有当前快照并按 (快照, 筛选条件) 记忆报表
///
/// 重新导入时整体替换快照；读取方拿到的是 `Arc` 克隆，替换不会让它们看到半更新的数据。
pub struct DashboardService {
    repository: RwLock<Arc<OrderRepository>>,
    region: RegionSettings,
    cache: Option<Cache<(Uuid, FilterSpec), Arc<DashboardReport>>>,
}

impl DashboardService {
    /// 不带缓存，每次调用都重新计算
    pub fn new(repository: OrderRepository, region: RegionSettings) -> Self {
        Self {
            repository: RwLock::new(Arc::new(repository)),
            region,
            cache: None,
        }
    }

    /// 启用报表缓存
    pub fn with_cache(mut self, max_capacity: u64, ttl: Duration) -> Self {
        self.cache = Some(
            Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        );
        self
    }

    pub fn region(&self) -> &RegionSettings {
        &self.region
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// 当前快照
    pub fn snapshot(&self) -> Arc<OrderRepository> {
        self.repository
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 整体替换快照并清空缓存
    pub fn replace_orders(&self, orders: Vec<OrderRecord>) -> Arc<OrderRepository> {
        self.replace_repository(OrderRepository::new(orders))
    }

    pub fn replace_repository(&self, repository: OrderRepository) -> Arc<OrderRepository> {
        let next = Arc::new(repository);
        let previous = {
            let mut guard = self
                .repository
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, next.clone())
        };
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
        tracing::info!(
            "订单快照已替换: {} ({} 条) -> {} ({} 条)",
            previous.id(),
            previous.len(),
            next.id(),
            next.len()
        );
        next
    }

    /// 取报表；相同快照与相同筛选条件命中缓存
    pub fn report(&self, spec: &FilterSpec) -> Arc<DashboardReport> {
        let repository = self.snapshot();
        let build = || Arc::new(build_report(&repository, spec, &self.region));
        match &self.cache {
            Some(cache) => cache.get_with((repository.id(), spec.clone()), build),
            None => build(),
        }
    }
}
