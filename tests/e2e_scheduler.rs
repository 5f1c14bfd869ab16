//! Catalog to store E2E tests

mod helper;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use helper::{ScriptedFetcher, create_test_store, registry_with_scripted};
use latestver::config::ConfigFile;
use latestver::scheduler::{CheckOutcome, Orchestrator, Schedule};
use latestver::store::{LogQuery, MetaStore};

const CONFIG: &str = r#"
catalog:
  - name: grafana
    tag: stable
    fetcher: scripted
    fetcher_config:
      package: grafana
    version_constraint:
      type: semver
  - name: chrome
    tag: stable
    fetcher: scripted
    fetcher_config:
      package: chrome
    version_constraint:
      type: numeric_dot
      allow_downgrade: true
  - name: nginx
    tag: mainline
    fetcher: scripted
    fetcher_config:
      package: nginx
"#;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn repeated_checks_follow_constraints_and_build_change_log() {
    // 1. Catalog backed by a scripted fetcher
    let fetcher = ScriptedFetcher::new()
        .with_versions("grafana", vec!["v10.0.0", "v10.1.0", "v9.5.0", "v11.0.0-beta1"])
        .with_versions("chrome", vec!["103.0.5060.134", "103.0.5060.53", "104.0.5112.79"])
        .with_versions("nginx", vec!["1.25.0", "1.25.0", "1.24.0"]);
    let registry = registry_with_scripted(fetcher);
    let config = ConfigFile::parse(CONFIG).unwrap();
    config.validate_catalog(&registry).unwrap();

    let (_temp_dir, store) = create_test_store();
    let schedule = Schedule::new(Duration::from_secs(3600), Duration::from_secs(60));
    let orchestrator = Orchestrator::new(Arc::clone(&store), Arc::new(registry), schedule);

    // 2. Check every entry once per hour, four times
    for hour in 0..4 {
        let now = start() + TimeDelta::hours(hour) + TimeDelta::minutes(59) + TimeDelta::seconds(59);
        for entry in &config.catalog {
            let outcome = orchestrator.check_entry(entry, now).await.unwrap();
            assert!(!matches!(outcome, CheckOutcome::NotDue { .. }), "{} not due at {}", entry.key(), now);
        }
    }

    // 3. Final state
    let grafana = store.get_meta("grafana", "stable").unwrap();
    assert_eq!(grafana.current_version, "10.1.0");
    assert!(grafana.error.is_empty());

    let chrome = store.get_meta("chrome", "stable").unwrap();
    assert_eq!(chrome.current_version, "104.0.5112.79");

    let nginx = store.get_meta("nginx", "mainline").unwrap();
    assert_eq!(nginx.current_version, "1.24.0");

    // 4. Change log, newest first
    let grafana_log = store
        .list_logs(&LogQuery::new(0).for_entry("grafana", "stable"))
        .unwrap();
    let transitions: Vec<_> = grafana_log
        .iter()
        .map(|l| (l.version_from.as_str(), l.version_to.as_str()))
        .collect();
    assert_eq!(transitions, vec![("10.0.0", "10.1.0"), ("", "10.0.0")]);

    let chrome_log = store
        .list_logs(&LogQuery::new(0).for_entry("chrome", "stable"))
        .unwrap();
    assert_eq!(chrome_log.len(), 3);
    assert_eq!(chrome_log[1].version_to, "103.0.5060.53");

    let all = store.list_logs(&LogQuery::new(0)).unwrap();
    assert_eq!(all.len(), 2 + 3 + 2);
    assert!(all.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
}

#[tokio::test(flavor = "multi_thread")]
async fn entry_is_not_checked_twice_in_one_window() {
    let registry = registry_with_scripted(
        ScriptedFetcher::new().with_versions("nginx", vec!["1.25.0", "1.25.1"]),
    );
    let config = ConfigFile::parse(CONFIG).unwrap();
    let entry = config.catalog_entry_by_tag("nginx", "mainline").unwrap();

    let (_temp_dir, store) = create_test_store();
    let schedule = Schedule::new(Duration::from_secs(3600), Duration::from_secs(60));
    let orchestrator = Orchestrator::new(Arc::clone(&store), Arc::new(registry), schedule);

    let first = orchestrator.check_entry(entry, start()).await.unwrap();
    let second = orchestrator
        .check_entry(entry, start() + TimeDelta::seconds(30))
        .await
        .unwrap();

    assert_eq!(
        first,
        CheckOutcome::Updated {
            from: String::new(),
            to: "1.25.0".to_string()
        }
    );
    assert!(matches!(second, CheckOutcome::NotDue { next } if next > start() + TimeDelta::seconds(30)));
    assert_eq!(store.get_meta("nginx", "mainline").unwrap().current_version, "1.25.0");
}

#[tokio::test(flavor = "multi_thread")]
async fn run_pass_checks_config_snapshot() {
    let registry = registry_with_scripted(
        ScriptedFetcher::new()
            .with_versions("grafana", vec!["10.0.0"])
            .with_versions("chrome", vec!["103.0.5060.134"]),
    );
    let config = ConfigFile::parse(CONFIG).unwrap();

    let (_temp_dir, store) = create_test_store();
    let schedule = Schedule::new(Duration::from_secs(3600), Duration::from_secs(60));
    let orchestrator = Orchestrator::new(Arc::clone(&store), Arc::new(registry), schedule);

    let report = orchestrator.run_pass(&config).await.unwrap();

    assert_eq!(report.updated, 2);
    assert_eq!(report.fetch_failed, 1);
    assert_eq!(report.checked(), 3);
    assert_eq!(
        store.get_meta("nginx", "mainline").unwrap().error,
        "no version found"
    );
    assert!(!orchestrator.is_running());
}
