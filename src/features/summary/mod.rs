/// 合计、退货率、峰值与排名
pub mod engine;
/// 国家/城市统计
pub mod region;

pub use engine::{
    NO_PEAK, Peak, RankedEntry, grand_total, overall_peak, peak_bucket, rank_desc, return_rate,
    top_n, total_for, totals,
};
pub use region::{
    CountryInfo, CountryStat, DEFAULT_UNKNOWN_CITY, RegionSettings, city_ranking, city_totals,
    country_counts, country_stats, default_catalogue,
};
