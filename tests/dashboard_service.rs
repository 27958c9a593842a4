use std::sync::Arc;
use std::thread;
use std::time::Duration;

use order_insight::features::aggregate::BucketMode;
use order_insight::features::dashboard::DashboardService;
use order_insight::features::filter::{FilterSpec, GenderFilter};
use order_insight::features::summary::RegionSettings;
use order_insight::{OrderRecord, OrderRepository};

fn order(sku: &str, status: &str, gender: &str, city: &str, date: &str) -> OrderRecord {
    OrderRecord {
        sku: sku.into(),
        status: status.into(),
        gender: Some(gender.into()),
        customer_country: Some("UAE".into()),
        customer_city: Some(city.into()),
        delivered_date: Some(date.into()),
        ..Default::default()
    }
}

fn service() -> DashboardService {
    let repo = OrderRepository::new(vec![
        order("X", "Delivered", "male", "Dubai", "2023-01-02"),
        order("X", "Return", "female", "Dubai", "2023-01-09"),
        order("Y", "Delivered", "female", "Sharjah", "2023-02-14"),
        order("Y", "Returned", "male", "Sharjah", "2023-02-15"),
    ]);
    DashboardService::new(repo, RegionSettings::default()).with_cache(32, Duration::from_secs(300))
}

#[test]
fn equal_specs_share_one_report() {
    let svc = service();
    let spec = FilterSpec::default();
    let a = svc.report(&spec);
    let b = svc.report(&FilterSpec::default());
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.status.delivered, 2);
    assert_eq!(a.status.returned, 2);
    assert_eq!(a.status.return_rate, 50.0);

    let weekly = svc.report(&spec.with_bucket_mode(BucketMode::Weekday));
    assert!(!Arc::ptr_eq(&a, &weekly));
    assert_eq!(weekly.status.rows.len(), 7);
    // 2023-01-02、2023-01-09 都是周一
    assert_eq!(weekly.status.delivered_peak.label, "Mon");
}

#[test]
fn replacing_orders_publishes_a_new_snapshot() {
    let svc = service();
    let before = svc.report(&FilterSpec::default());
    let old_snapshot = svc.snapshot();

    let next = svc.replace_orders(vec![order("Z", "Delivered", "male", "Dubai", "2023-06-01")]);
    assert_ne!(next.id(), old_snapshot.id());
    assert_eq!(old_snapshot.len(), 4);

    let after = svc.report(&FilterSpec::default());
    assert_eq!(after.snapshot_id, next.id());
    assert_eq!(after.skus, vec!["Z"]);
    assert_eq!(after.matched_orders, 1);
    assert_eq!(before.matched_orders, 4);
}

#[test]
fn city_tie_is_reported_in_region_view() {
    let svc = service();
    let report = svc.report(&FilterSpec::default());
    let uae = &report.region.cities[0];
    assert_eq!(uae.code, "UAE");
    assert_eq!(uae.total, 4);
    assert!(uae.cities.iter().all(|c| c.count == 2 && c.is_highest && c.is_lowest));

    let male = svc.report(&FilterSpec::default().with_gender(GenderFilter::Male));
    assert_eq!(male.region.cities[0].total, 2);
    assert_eq!(male.gender.visible_series, vec!["male"]);
}

#[test]
fn concurrent_readers_see_whole_snapshots() {
    let svc = Arc::new(service());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let svc = Arc::clone(&svc);
            thread::spawn(move || {
                for _ in 0..20 {
                    let report = svc.report(&FilterSpec::default());
                    assert!(report.total_orders == 4 || report.total_orders == 1);
                    let counted: u64 = report.sku.totals.iter().map(|t| t.count).sum();
                    assert_eq!(counted as usize, report.matched_orders);
                    assert_eq!(report.matched_orders, report.total_orders);
                }
                i
            })
        })
        .collect();

    svc.replace_orders(vec![order("Z", "Delivered", "male", "Dubai", "2023-06-01")]);

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(svc.report(&FilterSpec::default()).total_orders, 1);
}
