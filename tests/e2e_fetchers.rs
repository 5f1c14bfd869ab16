//! HTTP fetcher E2E tests through the orchestrator

mod helper;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mockito::Server;

use helper::create_test_store;
use latestver::config::ConfigFile;
use latestver::fetcher::FetcherRegistry;
use latestver::scheduler::{CheckOutcome, Orchestrator, Schedule};
use latestver::store::{LogQuery, MetaStore};

const DOWNLOAD_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <body>
    <table id="releases">
      <tr class="release"><td>Stable</td><td><a href="/dl/app-4.2.17.tar.gz">4.2.17</a></td></tr>
      <tr class="release"><td>Legacy</td><td><a href="/dl/app-3.9.2.tar.gz">3.9.2</a></td></tr>
    </table>
  </body>
</html>"#;

const RELEASES_JSON: &str = r#"{"releases":[{"channel":"beta","version":"2.1.0-rc.1"},{"channel":"stable","version":"2.0.4"}]}"#;

#[tokio::test(flavor = "multi_thread")]
async fn html_json_and_regex_entries_are_stored() {
    let mut server = Server::new_async().await;
    let _html = server
        .mock("GET", "/downloads")
        .with_status(200)
        .with_body(DOWNLOAD_PAGE)
        .create_async()
        .await;
    let _json = server
        .mock("GET", "/releases.json")
        .with_status(200)
        .with_body(RELEASES_JSON)
        .create_async()
        .await;
    let _missing = server
        .mock("GET", "/gone")
        .with_status(404)
        .create_async()
        .await;

    let config = ConfigFile::parse(&format!(
        r#"
catalog:
  - name: app
    tag: stable
    fetcher: html
    fetcher_config:
      url: {url}/downloads
      xpath: "//tr[td[1]='Stable']/td[2]/a"
  - name: app
    tag: legacy
    fetcher: regex
    fetcher_config:
      url: {url}/downloads
      regex: 'app-(3\.[0-9.]+[0-9])\.tar\.gz'
  - name: tool
    tag: stable
    fetcher: json
    fetcher_config:
      url: {url}/releases.json
      xpath: "//releases/*[channel='stable']/version"
    version_constraint:
      type: semver
  - name: tool
    tag: gone
    fetcher: regex
    fetcher_config:
      url: {url}/gone
      regex: '([0-9.]+)'
"#,
        url = server.url()
    ))
    .unwrap();

    let registry = FetcherRegistry::with_defaults();
    config.validate_catalog(&registry).unwrap();

    let (_temp_dir, store) = create_test_store();
    let schedule = Schedule::new(Duration::from_secs(3600), Duration::from_secs(60));
    let orchestrator = Orchestrator::new(Arc::clone(&store), Arc::new(registry), schedule);

    let now = Utc::now();
    let mut outcomes = Vec::new();
    for entry in &config.catalog {
        outcomes.push(orchestrator.check_entry(entry, now).await.unwrap());
    }

    assert!(matches!(&outcomes[0], CheckOutcome::Updated { to, .. } if to == "4.2.17"));
    assert!(matches!(&outcomes[1], CheckOutcome::Updated { to, .. } if to == "3.9.2"));
    assert!(matches!(&outcomes[2], CheckOutcome::Updated { to, .. } if to == "2.0.4"));
    assert!(matches!(&outcomes[3], CheckOutcome::FetchFailed(_)));

    let gone = store.get_meta("tool", "gone").unwrap();
    assert!(gone.current_version.is_empty());
    assert!(gone.error.contains("404"), "error was {:?}", gone.error);
    assert!(gone.last_checked.is_some());

    assert_eq!(store.list_logs(&LogQuery::new(0)).unwrap().len(), 3);
}
