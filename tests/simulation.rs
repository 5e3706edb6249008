use csflred::prelude::*;
use std::time::Duration;

fn overload(strategy: &str) -> SimConfig {
    SimConfig::default()
        .with_strategy(strategy)
        .with_name(strategy)
        .with_duration(Duration::from_secs(20))
        .with_traffic(TrafficPattern::Poisson { lambda: 500.0 })
        .with_seed(7)
}

#[test]
fn every_preset_runs() {
    for name in StrategyRegistry::global().list() {
        let report = Simulation::new(overload(&name).with_duration(Duration::from_secs(2)))
            .run()
            .unwrap();
        assert!(report.summary.arrivals > 0, "{name}");
        assert_eq!(
            report.summary.arrivals,
            report.summary.admitted + report.summary.unforced_drops + report.summary.forced_drops
        );
    }
}

#[test]
fn early_drops_keep_the_average_off_the_limit() {
    let report = Simulation::new(overload("red").with_red(RedConfig::default().with_queue_limit(200)))
        .run()
        .unwrap();
    assert!(report.summary.unforced_drops > 0);
    assert!(report.summary.peak_avg_queue < 200.0);
}

#[test]
fn ared_moves_max_p() {
    let report = Simulation::new(overload("ared")).run().unwrap();
    assert_ne!(report.final_max_p, 1.0 / 50.0);
    assert!(report.final_max_p <= 0.5);
}

#[test]
fn fuzzy_run_records_targets() {
    let report = Simulation::new(overload("csfl-red")).run().unwrap();
    assert!(!report.stats.targets.is_empty());
    assert!((0.0..=1.0).contains(&report.final_max_p));
}

#[test]
fn config_file_overrides_preset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tight.json");
    std::fs::write(&path, r#"{ "queue_limit": 8, "min_th": 2.0, "max_th": 6.0 }"#).unwrap();
    let red = RedConfig::from_json_file(&path).unwrap();

    let report = Simulation::new(overload("red").with_red(red)).run().unwrap();
    assert!(report.summary.queue_limit_drops > 0 || report.summary.unforced_drops > 0);
    assert!(report.summary.peak_avg_queue <= 8.0);
}
