//! Integration tests for the harvester
//!
//! These tests use wiremock to serve an index and item pages and run full
//! sessions through the HTTP page source, the CSV snapshot and the SQLite
//! export.

use async_trait::async_trait;
use chrono::Datelike;
use listing_harvester::config::{parse_config, Config};
use listing_harvester::crawler::{harvest_with, ClearanceGate, HttpSource};
use listing_harvester::state::StopReason;
use listing_harvester::storage::{CsvSnapshot, SnapshotStore, SqliteExport};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HEADER: &str = "Price_market,Age,Mileage,Brand,Model,Power_kW,Transmission,url,title";

/// Clearance gate that returns at once and counts its calls
#[derive(Default, Clone)]
struct InstantClearance {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ClearanceGate for InstantClearance {
    async fn await_clearance(&self, _url: &str) -> std::io::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn test_config(base_url: &str, dir: &Path, target: usize, autosave: usize) -> Config {
    parse_config(&format!(
        r#"
        [crawler]
        start-url = "{base_url}/rabljeni-auti?page={{page}}"
        target-records = {target}
        item-path-pattern = "/auti/"

        [pacing]
        min-delay-ms = 0
        max-delay-ms = 5

        [fetch]
        index-timeout-secs = 5
        item-timeout-secs = 5

        [output]
        csv-path = "{csv}"
        autosave-every = {autosave}
        export-database = "{db}"
        "#,
        csv = dir.join("cars.csv").display(),
        db = dir.join("cars.db").display(),
    ))
    .expect("test config is valid")
}

fn index_page(slugs: &[&str]) -> String {
    let anchors: String = slugs
        .iter()
        .map(|s| format!(r#"<li><a href="/auti/{s}">{s}</a></li>"#))
        .collect();
    format!(
        r#"<html><body><ul>{anchors}</ul>
        <a href="/rabljeni-auti?page=2">Sljedeća</a></body></html>"#
    )
}

/// Item page with the structured parameter table
fn table_item(brand: &str, model: &str, year: u32, price: &str) -> String {
    format!(
        r#"<html><head><script>var price = "1 €";</script></head><body>
        <h1>{brand} {model} 1.6 TDI</h1>
        <dl><dd>Cijena: {price} €</dd></dl>
        <table>
          <tr><td>Marka automobila:</td><td>{brand}</td></tr>
          <tr><td>Model automobila:</td><td>{model}</td></tr>
          <tr><td>Godina proizvodnje:</td><td>{year}. godište</td></tr>
          <tr><td>Prijeđeni kilometri:</td><td>154.000 km</td></tr>
          <tr><td>Snaga motora:</td><td>77 kW</td></tr>
          <tr><td>Mjenjač:</td><td>Mehanički mjenjač</td></tr>
        </table></body></html>"#
    )
}

/// Item page without a table, fields only as label/value text
fn text_item(price: &str) -> String {
    format!(
        r#"<html><body><h1>Renault Clio</h1>
        <div>Cijena {price} €</div>
        <section>
          <p>Marka automobila: Renault</p>
          <p>Tip automobila: Clio 1.2</p>
          <p>Godina proizvodnje</p><p>2012.</p>
          <p>Prijeđeni kilometri: 180.500 km</p>
          <p>Snaga motora: 55 kW</p>
          <p>Mjenjač: Mehanički mjenjač</p>
        </section></body></html>"#
    )
}

async fn mount_index(server: &MockServer, page: u32, slugs: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/rabljeni-auti"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(index_page(slugs)))
        .mount(server)
        .await;
}

/// Mounts an item page that must be fetched exactly once over the test
async fn mount_item(server: &MockServer, slug: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/auti/{slug}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn run(config: &Config, fresh: bool) -> listing_harvester::crawler::WalkSummary {
    let source = HttpSource::new(&config.fetch).unwrap();
    harvest_with(
        config,
        fresh,
        Box::new(source),
        Box::new(InstantClearance::default()),
    )
    .await
    .unwrap()
}

fn current_year() -> u32 {
    chrono::Local::now().year() as u32
}

#[tokio::test]
async fn test_full_session_writes_snapshot_and_export() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_index(&server, 1, &["golf-1", "clio-2", "cheap-3", "incomplete-4"]).await;
    mount_index(&server, 2, &["golf-1"]).await;
    mount_item(&server, "golf-1", table_item("Volkswagen", "Golf", 2016, "11.900")).await;
    mount_item(&server, "clio-2", text_item("4.250")).await;
    mount_item(&server, "cheap-3", table_item("Fiat", "Punto", 2005, "350")).await;
    mount_item(&server, "incomplete-4", "<h1>Prodano</h1><p>15.000 €</p>".to_string()).await;

    let config = test_config(&server.uri(), dir.path(), 100, 50);
    let summary = run(&config, false).await;

    assert_eq!(summary.stop_reason, Some(StopReason::NoUnseenLinks));
    assert_eq!(summary.index_pages, 2);
    assert_eq!(summary.items_attempted, 4);
    assert_eq!(summary.accepted, 2);
    assert_eq!(summary.rejected, 2);

    let content = std::fs::read_to_string(dir.path().join("cars.csv")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], HEADER);
    assert_eq!(lines.len(), 3);

    // links are walked in sorted order, so the Clio comes first
    // and its model falls back to the trim label on the text-only page
    assert!(lines[1].starts_with(&format!("4250,{},180500,Renault,Clio 1.2,55,", current_year() - 2012)));

    let golf_age = current_year() - 2016;
    assert_eq!(
        lines[2],
        format!(
            "11900,{golf_age},154000,Volkswagen,Golf,77,Mehanički mjenjač,{}/auti/golf-1,Volkswagen Golf 1.6 TDI",
            server.uri()
        )
    );

    let export = SqliteExport::new(&dir.path().join("cars.db")).unwrap();
    assert_eq!(export.count_listings().unwrap(), 2);
}

#[tokio::test]
async fn test_resume_does_not_refetch_or_duplicate() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_index(&server, 1, &["a-1", "b-2"]).await;
    mount_index(&server, 2, &[]).await;
    mount_item(&server, "a-1", table_item("Opel", "Astra", 2014, "6.300")).await;
    mount_item(&server, "b-2", table_item("Audi", "A4", 2017, "18.500")).await;

    let config = test_config(&server.uri(), dir.path(), 100, 50);
    run(&config, false).await;
    let first = std::fs::read_to_string(dir.path().join("cars.csv")).unwrap();

    let summary = run(&config, false).await;
    let second = std::fs::read_to_string(dir.path().join("cars.csv")).unwrap();

    assert_eq!(summary.stop_reason, Some(StopReason::NoUnseenLinks));
    assert_eq!(summary.items_attempted, 0);
    assert_eq!(first, second);
    // item mocks verify on drop that each page was fetched once
}

#[tokio::test]
async fn test_interrupted_session_continues_where_it_stopped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_index(&server, 1, &["c-1", "c-2", "c-3"]).await;
    mount_index(&server, 2, &["c-4"]).await;
    mount_index(&server, 3, &[]).await;
    for (i, slug) in ["c-1", "c-2", "c-3", "c-4"].iter().enumerate() {
        let price = format!("{}.000", 5 + i);
        mount_item(&server, slug, table_item("Kia", "Ceed", 2015, &price)).await;
    }

    let first = run(&test_config(&server.uri(), dir.path(), 2, 1), false).await;
    assert_eq!(first.stop_reason, Some(StopReason::TargetReached));

    let state = CsvSnapshot::new(dir.path().join("cars.csv")).load().unwrap();
    assert_eq!(state.record_count(), 2);

    let second = run(&test_config(&server.uri(), dir.path(), 10, 1), false).await;
    assert_eq!(second.stop_reason, Some(StopReason::NoUnseenLinks));
    assert_eq!(second.accepted, 2);
    assert_eq!(second.records_total, 4);

    let state = CsvSnapshot::new(dir.path().join("cars.csv")).load().unwrap();
    let prices: Vec<u64> = state.records().iter().map(|r| r.price).collect();
    assert_eq!(prices, vec![5000, 6000, 7000, 8000]);
}

#[tokio::test]
async fn test_bot_wall_suspends_and_retries_same_item() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_index(&server, 1, &["walled-1"]).await;
    mount_index(&server, 2, &[]).await;
    Mock::given(method("GET"))
        .and(path("/auti/walled-1"))
        .respond_with(
            ResponseTemplate::new(403).set_body_string("<p>Please complete the CAPTCHA to continue</p>"),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_item(&server, "walled-1", table_item("Toyota", "Yaris", 2019, "13.400")).await;

    let config = test_config(&server.uri(), dir.path(), 100, 50);
    let gate = InstantClearance::default();
    let calls = gate.calls.clone();
    let summary = harvest_with(
        &config,
        false,
        Box::new(HttpSource::new(&config.fetch).unwrap()),
        Box::new(gate),
    )
    .await
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(summary.bot_walls, 1);
    assert_eq!(summary.accepted, 1);
}

#[tokio::test]
async fn test_fresh_session_ignores_snapshot() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("cars.csv"),
        format!(
            "{HEADER}\n9000,3,40000,Mazda,3,88,Automatski,{}/auti/old-1,Mazda 3\n",
            server.uri()
        ),
    )
    .unwrap();

    mount_index(&server, 1, &["old-1"]).await;
    mount_index(&server, 2, &[]).await;
    mount_item(&server, "old-1", table_item("Mazda", "3", 2020, "9.900")).await;

    let config = test_config(&server.uri(), dir.path(), 100, 50);
    let summary = run(&config, true).await;

    assert_eq!(summary.accepted, 1);
    let state = CsvSnapshot::new(dir.path().join("cars.csv")).load().unwrap();
    assert_eq!(state.records()[0].price, 9900);
}

#[tokio::test]
async fn test_target_already_met_only_rewrites_outputs() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("cars.csv"),
        format!("{HEADER}\n9000,3,40000,Mazda,3,88,Automatski,https://x.hr/auti/1,Mazda 3\n"),
    )
    .unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), dir.path(), 1, 50);
    let summary = run(&config, false).await;

    assert_eq!(summary.stop_reason, Some(StopReason::TargetReached));
    assert_eq!(summary.records_total, 1);
    assert!(dir.path().join("cars.db").exists());
}
