//! Integration tests for cache lookups, expiry and deletion

use std::fs;

use artcache::cache::{decode_timestamp, encode, parse_timestamp, CacheIndex, Clock};
use artcache::config::MemoryConfig;
use artcache::producer::JsonProducer;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use tempfile::TempDir;

#[derive(Debug, Serialize)]
struct Population {
    region: u32,
    total: u64,
}

fn at(s: &str) -> NaiveDateTime {
    parse_timestamp(s).expect("Valid timestamp")
}

/// Helper to open an index over a fresh directory, evaluated at `now`
fn create_test_cache(threshold: i64, now: &str) -> (CacheIndex<MemoryConfig>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = MemoryConfig::with_threshold(threshold);
    let cache = CacheIndex::with_dir(temp_dir.path().to_path_buf(), config)
        .expect("Index should open")
        .with_clock(Clock::Fixed(at(now)));
    (cache, temp_dir)
}

fn touch(cache: &CacheIndex<MemoryConfig>, names: &[&str]) {
    for name in names {
        fs::write(cache.path_of(name), b"{}").expect("Should write file");
    }
}

#[test]
fn test_retrieve_returns_newest_actual_entry() {
    let (cache, _temp_dir) = create_test_cache(12, "2024-01-01-20-00-00");
    touch(&cache, &["2024-01-01-00-00-00_pop_5.json", "2024-01-01-10-00-00_pop_5.json"]);

    assert_eq!(
        cache.retrieve("pop", ".json", &["5"]).unwrap().as_deref(),
        Some("2024-01-01-10-00-00_pop_5.json")
    );
}

#[test]
fn test_newest_wins_when_both_actual() {
    let (cache, _temp_dir) = create_test_cache(48, "2024-01-02-00-00-00");
    touch(&cache, &["2024-01-01-08-00-00_pop_5.json", "2024-01-01-09-00-00_pop_5.json"]);

    assert_eq!(
        cache.retrieve("pop", ".json", &["5"]).unwrap().as_deref(),
        Some("2024-01-01-09-00-00_pop_5.json")
    );
}

#[test]
fn test_entry_at_threshold_is_expired() {
    let (cache, _temp_dir) = create_test_cache(24, "2024-01-02-00-00-00");
    touch(&cache, &["2024-01-01-00-00-00_pop.json"]);

    assert_eq!(cache.retrieve("pop", ".json", &[]).unwrap(), None);
    assert!(cache.list_actual("pop", ".json").unwrap().is_empty());
    assert!(cache.list_near_expiry("pop", ".json").unwrap().is_empty());

    let status = cache.classify("2024-01-01-00-00-00_pop.json").unwrap().unwrap();
    assert_eq!(status.age_hours, 24);
    assert!(!status.freshness.is_usable());
}

#[test]
fn test_actual_entry_expires_after_threshold() {
    let created = at("2024-03-10-06-30-00");
    let name = encode(&created, "pop", ".json", '_', &["5"]);

    let (cache, _temp_dir) = create_test_cache(12, "2024-03-10-06-30-00");
    touch(&cache, &[&name]);
    assert!(cache.retrieve("pop", ".json", &["5"]).unwrap().is_some());

    let later = cache.clone().with_clock(Clock::Fixed(created + Duration::hours(12)));
    assert!(later.retrieve("pop", ".json", &["5"]).unwrap().is_none());

    let almost = created + Duration::hours(12) - Duration::seconds(1);
    let just_before = cache.with_clock(Clock::Fixed(almost));
    assert!(just_before.retrieve("pop", ".json", &["5"]).unwrap().is_some());
}

#[test]
fn test_names_do_not_match_each_other() {
    let (cache, _temp_dir) = create_test_cache(24, "2024-01-01-12-00-00");
    touch(&cache, &["2024-01-01-10-00-00_population_5.json"]);

    assert_eq!(cache.retrieve("households", ".json", &["5"]).unwrap(), None);
    assert!(cache.list_actual("households", ".json").unwrap().is_empty());
}

#[test]
fn test_retrieve_ignores_names_ending_in_the_pattern() {
    let (cache, _temp_dir) = create_test_cache(24, "2024-01-01-12-00-00");
    touch(
        &cache,
        &["2024-01-01-10-00-00_metapop_5.json", "2024-01-01-11-00-00_households_pop.json"],
    );

    assert_eq!(cache.retrieve("pop", ".json", &["5"]).unwrap(), None);
    assert_eq!(cache.retrieve("pop", ".json", &[]).unwrap(), None);

    touch(&cache, &["2024-01-01-09-00-00_pop_5.json"]);
    assert_eq!(
        cache.retrieve("pop", ".json", &["5"]).unwrap().as_deref(),
        Some("2024-01-01-09-00-00_pop_5.json")
    );
}

#[test]
fn test_retrieve_matches_tags_exactly() {
    let (cache, _temp_dir) = create_test_cache(24, "2024-01-01-12-00-00");
    touch(
        &cache,
        &["2024-01-01-11-00-00_pop_5_modeled.json", "2024-01-01-10-00-00_pop_5.json"],
    );

    assert_eq!(
        cache.retrieve("pop", ".json", &["5"]).unwrap().as_deref(),
        Some("2024-01-01-10-00-00_pop_5.json")
    );
    assert_eq!(
        cache.retrieve("pop", ".json", &["5", "modeled"]).unwrap().as_deref(),
        Some("2024-01-01-11-00-00_pop_5_modeled.json")
    );
    assert_eq!(cache.retrieve("pop", ".json", &["modeled", "5"]).unwrap(), None);
}

#[test]
fn test_list_actual_ignores_tags_and_extensions() {
    let (cache, _temp_dir) = create_test_cache(24, "2024-01-03-00-00-00");
    touch(
        &cache,
        &[
            "2024-01-02-20-00-00_pop_5.json",
            "2024-01-02-10-00-00_pop_6.json",
            "2024-01-02-12-00-00_pop_6.csv",
            "2024-01-01-00-00-00_pop_5.json",
        ],
    );

    assert_eq!(
        cache.list_actual("pop", ".json").unwrap(),
        vec!["2024-01-02-20-00-00_pop_5.json", "2024-01-02-10-00-00_pop_6.json"]
    );
}

#[test]
fn test_list_near_expiry_window() {
    let (cache, _temp_dir) = create_test_cache(48, "2024-01-05-00-00-00");
    touch(
        &cache,
        &[
            "2024-01-04-12-00-00_pop.json", // 12h
            "2024-01-04-00-00-00_pop.json", // 24h
            "2024-01-03-01-00-00_pop.json", // 47h
            "2024-01-03-00-00-00_pop.json", // 48h
            "2024-01-01-00-00-00_pop.json", // 96h
        ],
    );

    assert_eq!(
        cache.list_near_expiry("pop", ".json").unwrap(),
        vec!["2024-01-04-00-00-00_pop.json", "2024-01-03-01-00-00_pop.json"]
    );
}

#[test]
fn test_malformed_entry_sorting_first_does_not_hide_fresh_ones() {
    let (cache, _temp_dir) = create_test_cache(24, "2024-01-02-00-00-00");
    touch(&cache, &["latest_pop.json", "2024-01-01-20-00-00_pop.json"]);

    assert_eq!(
        cache.list_actual("pop", ".json").unwrap(),
        vec!["2024-01-01-20-00-00_pop.json"]
    );
    assert_eq!(
        cache.retrieve("pop", ".json", &[]).unwrap().as_deref(),
        Some("2024-01-01-20-00-00_pop.json")
    );
}

#[test]
fn test_save_then_retrieve() {
    let (cache, _temp_dir) = create_test_cache(24, "2024-06-01-12-00-00");
    let data = Population { region: 5, total: 1200 };

    let filename = cache
        .save(&JsonProducer::new(&data), "population", ".json", at("2024-06-01-11-15-00"), &["5"])
        .expect("Save should succeed");

    assert_eq!(decode_timestamp(&filename, '_').unwrap(), at("2024-06-01-11-15-00"));
    assert_eq!(
        cache.retrieve("population", ".json", &["5"]).unwrap(),
        Some(filename.clone())
    );
    let content = fs::read_to_string(cache.path_of(&filename)).unwrap();
    assert!(content.contains("\"total\": 1200"));
}

#[test]
fn test_saves_at_different_seconds_coexist() {
    let (cache, _temp_dir) = create_test_cache(24, "2024-06-01-12-00-00");
    let data = Population { region: 1, total: 1 };
    let producer = JsonProducer::new(&data);

    cache.save(&producer, "pop", ".json", at("2024-06-01-11-00-00"), &[]).unwrap();
    cache.save(&producer, "pop", ".json", at("2024-06-01-11-00-01"), &[]).unwrap();

    assert_eq!(cache.list_all().unwrap().len(), 2);
    assert_eq!(
        cache.retrieve("pop", ".json", &[]).unwrap().as_deref(),
        Some("2024-06-01-11-00-01_pop.json")
    );
}

#[test]
fn test_delete_is_idempotent() {
    let (cache, _temp_dir) = create_test_cache(24, "2024-01-01-12-00-00");
    touch(&cache, &["2024-01-01-10-00-00_pop.json", "unrelated.txt"]);

    cache.delete("").unwrap();
    cache.delete("2023-01-01-00-00-00_pop.json").unwrap();
    assert_eq!(cache.list_all().unwrap().len(), 2);

    cache.delete("2024-01-01-10-00-00_pop.json").unwrap();
    cache.delete("2024-01-01-10-00-00_pop.json").unwrap();
    assert_eq!(cache.list_all().unwrap(), vec!["unrelated.txt"]);
}

#[test]
fn test_custom_separator() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let settings = artcache::config::CacheSettings {
        cache_dir: temp_dir.path().to_path_buf(),
        separator: '&',
    };
    let cache = CacheIndex::new(settings, MemoryConfig::with_threshold(24))
        .unwrap()
        .with_clock(Clock::Fixed(at("2024-01-01-12-00-00")));
    touch(
        &cache,
        &["2024-01-01-10-00-00&land_use&city_1.json", "2024-01-01-11-00-00_land_use_city_1.json"],
    );

    assert_eq!(
        cache.retrieve("land_use", ".json", &["city_1"]).unwrap().as_deref(),
        Some("2024-01-01-10-00-00&land_use&city_1.json")
    );
}
