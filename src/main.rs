//! 本地报表工具：读取订单导出文件，按筛选条件生成仪表盘报表。
//!
//! 筛选默认值来自 config.toml 的 `[filters]`，命令行参数逐项覆盖。

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use order_insight::AppError;
use order_insight::config::{AppConfig, LoggingConfig};
use order_insight::features::aggregate::ChartRow;
use order_insight::features::dashboard::{DashboardReport, DashboardService};
use order_insight::features::filter::{FilterSpec, GenderFilter, SkuFilter, StatusFilter};
use order_insight::features::orders::OrderRepository;
use order_insight::features::summary::{Peak, RankedEntry};
use order_insight::startup::{load_orders, run_startup_checks};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    let args = Args::parse(std::env::args().skip(1).collect());
    if args.help {
        print_help();
        return;
    }

    if let Err(e) = run(args) {
        tracing::error!("报表生成失败: {}", e);
        eprintln!("错误 [{}]: {}", e.stable_code(), e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), AppError> {
    // 正式的日志级别来自配置，加载配置期间先用临时订阅器输出
    let bootstrap = bootstrap_subscriber(env_filter("info"), std::io::stderr);
    tracing::subscriber::with_default(bootstrap, AppConfig::init_global)?;
    let config = AppConfig::global();
    init_tracing(&config.logging);

    if args.print_config {
        let text = config
            .to_toml_string()
            .map_err(|e| AppError::Internal(format!("序列化配置失败: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    let dataset = args
        .data
        .clone()
        .or_else(|| config.dataset.path.as_ref().map(PathBuf::from))
        .ok_or_else(|| {
            AppError::Config("未指定订单数据文件：请使用 --data 或配置 dataset.path".to_string())
        })?;

    run_startup_checks(config, &dataset)?;

    let spec = args.filter_spec(&config.filters)?;
    let orders = load_orders(&dataset, config.dataset.format)?;

    let mut service = DashboardService::new(OrderRepository::new(orders), config.regions.clone());
    if config.cache.enabled {
        service = service.with_cache(config.cache.max_capacity, config.cache.ttl());
    }
    let report = service.report(&spec);

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&*report)?,
        OutputFormat::Text => render_text(&report),
    };

    if let Some(out_path) = args.out_path {
        fs::write(&out_path, &output)?;
        println!("已写入: {}", out_path.display());
    } else {
        println!("{output}");
    }

    Ok(())
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| format!("order_insight={level}").into())
}

fn bootstrap_subscriber<W>(filter: EnvFilter, writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .finish()
}

// 日志写到 stderr，stdout 只留给报表
fn init_tracing(logging: &LoggingConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(&logging.level))
        .with_writer(std::io::stderr);
    let _ = if logging.format.eq_ignore_ascii_case("compact") {
        builder.compact().try_init()
    } else {
        builder.try_init()
    };
}

fn render_text(report: &DashboardReport) -> String {
    let mut out = String::new();
    let f = &report.filter;

    let _ = writeln!(out, "snapshot: {}", report.snapshot_id);
    let _ = writeln!(out, "generated_at: {}", report.generated_at);
    let _ = writeln!(
        out,
        "filter: sku={} gender={} status={} range={}..={} bucket={}",
        f.sku, f.gender, f.status, f.start_date, f.end_date, f.bucket_mode
    );
    let _ = writeln!(
        out,
        "orders: {} / {} matched",
        report.matched_orders, report.total_orders
    );

    let status = &report.status;
    out.push_str("\n[status]\n");
    let _ = writeln!(
        out,
        "Delivered: {} ({})",
        status.delivered,
        peak_text(&status.delivered_peak)
    );
    let _ = writeln!(out, "Return: {} ({})", status.returned, peak_text(&status.return_peak));
    let _ = writeln!(out, "return_rate: {:.1}%", status.return_rate);
    if !status.years.is_empty() {
        let years: Vec<String> = status.years.iter().map(|y| y.to_string()).collect();
        let _ = writeln!(out, "years: {}", years.join(","));
    }
    render_rows(&mut out, status.axis_key, &["Delivered", "Return"], &status.rows);

    let gender = &report.gender;
    out.push_str("\n[gender]\n");
    let _ = writeln!(
        out,
        "male: {} ({} {})",
        gender.male_total,
        gender.peak_caption,
        gender.male_peak.label
    );
    let _ = writeln!(
        out,
        "female: {} ({} {})",
        gender.female_total,
        gender.peak_caption,
        gender.female_peak.label
    );
    render_rows(&mut out, gender.axis_key, &gender.visible_series, &gender.rows);

    let sku = &report.sku;
    out.push_str("\n[sku]\n");
    let _ = writeln!(out, "overall: {} {}", sku.peak_caption, sku.overall_peak.label);
    for t in &sku.totals {
        let _ = writeln!(out, "{}: {} ({})", t.sku, t.count, peak_text(&t.peak));
    }
    if let Some(selected) = &sku.selected {
        let _ = writeln!(
            out,
            "selected {}: {} ({})",
            selected.sku,
            selected.count,
            peak_text(&selected.peak)
        );
    }

    let region = &report.region;
    out.push_str("\n[region]\n");
    for c in &region.countries {
        let _ = writeln!(
            out,
            "{} {}: {}{}",
            c.code,
            c.name,
            c.count,
            flags(c.is_highest, c.is_lowest)
        );
    }
    for (code, count) in &region.other_countries {
        let _ = writeln!(out, "{code} (未收录): {count}");
    }
    for breakdown in &region.cities {
        let _ = writeln!(out, "  {} ({}):", breakdown.name, breakdown.total);
        for city in &breakdown.cities {
            let _ = writeln!(out, "    {}", ranked_text(city));
        }
    }

    out
}

fn render_rows<S: AsRef<str>>(out: &mut String, axis_key: &str, series: &[S], rows: &[ChartRow]) {
    let _ = write!(out, "{axis_key:<6}");
    for s in series {
        let _ = write!(out, "{:>10}", s.as_ref());
    }
    out.push('\n');
    for row in rows {
        let _ = write!(out, "{:<6}", row.label);
        for s in series {
            let count = row.counts.get(s.as_ref()).copied().unwrap_or(0);
            let _ = write!(out, "{count:>10}");
        }
        out.push('\n');
    }
}

fn peak_text(peak: &Peak) -> String {
    if peak.is_none() {
        peak.label.to_string()
    } else {
        format!("peak {} = {}", peak.label, peak.count)
    }
}

fn ranked_text(entry: &RankedEntry) -> String {
    format!(
        "{}: {}{}",
        entry.key,
        entry.count,
        flags(entry.is_highest, entry.is_lowest)
    )
}

fn flags(is_highest: bool, is_lowest: bool) -> &'static str {
    match (is_highest, is_lowest) {
        (true, true) => " [Highest][Lowest]",
        (true, false) => " [Highest]",
        (false, true) => " [Lowest]",
        (false, false) => "",
    }
}

struct Args {
    help: bool,
    print_config: bool,
    format: OutputFormat,
    data: Option<PathBuf>,
    sku: Option<String>,
    gender: Option<String>,
    status: Option<String>,
    from: Option<String>,
    to: Option<String>,
    bucket: Option<String>,
    out_path: Option<PathBuf>,
}

impl Args {
    fn parse(argv: Vec<String>) -> Self {
        let mut args = Self {
            help: false,
            print_config: false,
            format: OutputFormat::Text,
            data: None,
            sku: None,
            gender: None,
            status: None,
            from: None,
            to: None,
            bucket: None,
            out_path: None,
        };

        let mut it = argv.into_iter();
        while let Some(a) = it.next() {
            match a.as_str() {
                "-h" | "--help" => args.help = true,
                "--print-config" => args.print_config = true,
                "--format" => {
                    let v = it.next().unwrap_or_else(|| "text".to_string());
                    args.format = match v.as_str() {
                        "json" => OutputFormat::Json,
                        _ => OutputFormat::Text,
                    };
                }
                "--data" => args.data = it.next().map(PathBuf::from),
                "--sku" => args.sku = it.next(),
                "--gender" => args.gender = it.next(),
                "--status" => args.status = it.next(),
                "--from" => args.from = it.next(),
                "--to" => args.to = it.next(),
                "--bucket" => args.bucket = it.next(),
                "--out" => args.out_path = it.next().map(PathBuf::from),
                _ => {}
            }
        }
        args
    }

    /// 以配置中的默认筛选为基础，应用命令行覆盖
    fn filter_spec(&self, base: &FilterSpec) -> Result<FilterSpec, AppError> {
        let mut spec = base.clone();
        if let Some(sku) = &self.sku {
            spec = spec.with_sku(SkuFilter::from(sku.as_str()));
        }
        if let Some(gender) = &self.gender {
            spec = spec.with_gender(gender.parse::<GenderFilter>()?);
        }
        if let Some(status) = &self.status {
            spec = spec.with_status(status.parse::<StatusFilter>()?);
        }
        let start = self.from.as_deref().map(parse_date).transpose()?;
        let end = self.to.as_deref().map(parse_date).transpose()?;
        spec = spec.with_date_range(
            start.unwrap_or(spec.start_date),
            end.unwrap_or(spec.end_date),
        );
        if let Some(bucket) = &self.bucket {
            spec = spec.with_bucket_mode(bucket.parse()?);
        }
        Ok(spec)
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| AppError::Validation(format!("日期格式应为 YYYY-MM-DD: {raw} ({e})")))
}

fn print_help() {
    println!(
        r#"order-insight（本地订单报表工具）

用法：
  cargo run --bin order-insight -- --data orders.csv --gender male --bucket weekday

常用参数：
  --data PATH                   订单数据文件（csv/json，默认取配置 dataset.path）
  --sku SKU                     SKU 筛选（All 表示不筛选）
  --gender All|male|female      性别筛选
  --status All|Delivered|Return 状态筛选（Returned 等同 Return）
  --from YYYY-MM-DD             起始日期（包含）
  --to YYYY-MM-DD               结束日期（包含）
  --bucket month|weekday        时间分桶（默认 month）
  --format text|json            输出格式（默认 text）
  --out PATH                    写入到文件（否则 stdout）
  --print-config                输出当前生效的配置并退出

配置：
  默认读取 ./config.toml，可用 APP_CONFIG_PATH 指定；
  环境变量覆盖示例：APP_FILTERS__START_DATE=2024-01-01
"#
    );
}
