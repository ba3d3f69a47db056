//! Tests for the shipped example configuration

use listing_harvester::config::{default_labels, load_config_with_hash};
use std::path::Path;

#[test]
fn test_fixture_config_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/harvest.toml");
    let (config, hash) = load_config_with_hash(&path).unwrap();

    assert_eq!(hash.len(), 64);
    assert_eq!(config.crawler.target_records, 5000);
    assert_eq!(
        config.crawler.index_url(2),
        "https://www.njuskalo.hr/rabljeni-auti/osijek?sort=new&page=2"
    );
    assert_eq!(config.output.autosave_every, 50);
    assert_eq!(
        config.output.export_database.as_deref(),
        Some("njuskalo_osijek_auti.db")
    );
    assert_eq!(config.labels.len(), default_labels().len());
    assert_eq!(config.estimator.neighbours, 50);
}
