//! Environment-backed configuration. Serialized because these tests mutate
//! process-global environment variables.

use relmap::cache::InterpretationCacheConfig;
use relmap::config::EngineConfig;
use serial_test::serial;

fn clear_env() {
    for var in [
        "RELMAP_MAX_JOIN_DEPTH",
        "RELMAP_QUERY_TIMEOUT_SECS",
        "RELMAP_DEFAULT_TENANT",
        "RELMAP_QUERY_CACHE_ENABLED",
        "RELMAP_QUERY_CACHE_MAX_ENTRIES",
    ] {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_engine_config_defaults() {
    clear_env();
    let config = EngineConfig::from_env().unwrap();
    assert_eq!(config.max_join_depth, 16);
    assert_eq!(config.query_timeout_secs, 0);
    assert_eq!(config.default_tenant, None);
}

#[test]
#[serial]
fn test_engine_config_reads_environment() {
    clear_env();
    std::env::set_var("RELMAP_MAX_JOIN_DEPTH", "4");
    std::env::set_var("RELMAP_QUERY_TIMEOUT_SECS", "30");
    std::env::set_var("RELMAP_DEFAULT_TENANT", "T1");

    let config = EngineConfig::from_env().unwrap();
    assert_eq!(config.max_join_depth, 4);
    assert_eq!(config.query_timeout_secs, 30);
    assert_eq!(config.default_tenant.as_deref(), Some("T1"));
    clear_env();
}

#[test]
#[serial]
fn test_engine_config_rejects_out_of_range_values() {
    clear_env();
    std::env::set_var("RELMAP_MAX_JOIN_DEPTH", "0");
    assert!(EngineConfig::from_env().is_err());

    std::env::set_var("RELMAP_MAX_JOIN_DEPTH", "not-a-number");
    assert!(EngineConfig::from_env().is_err());
    clear_env();
}

#[test]
#[serial]
fn test_cache_config_reads_environment() {
    clear_env();
    std::env::set_var("RELMAP_QUERY_CACHE_ENABLED", "false");
    std::env::set_var("RELMAP_QUERY_CACHE_MAX_ENTRIES", "5");

    let config = InterpretationCacheConfig::from_env();
    assert!(!config.enabled);
    assert_eq!(config.max_entries, 5);
    clear_env();
}
