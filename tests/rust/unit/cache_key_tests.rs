//! Cache-key equality, hashing, and serialization behavior.

use super::fixtures::hr_model;
use relmap::cache::{CacheKeyError, EntityCacheKey, NaturalIdCacheKey};
use relmap::type_registry::DomainValue;

fn alice() -> Vec<DomainValue> {
    vec![DomainValue::String("alice".to_string())]
}

#[test]
fn test_equal_inputs_give_equal_keys_and_hashes() {
    let model = hr_model();
    let a = NaturalIdCacheKey::new(&model, "Employee", Some("T1"), &alice()).unwrap();
    let b = NaturalIdCacheKey::new(&model, "Employee", Some("T1"), &alice()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.hash_code(), b.hash_code());
}

#[test]
fn test_tenant_change_breaks_equality() {
    let model = hr_model();
    let a = NaturalIdCacheKey::new(&model, "Employee", Some("T1"), &alice()).unwrap();
    let b = NaturalIdCacheKey::new(&model, "Employee", Some("T2"), &alice()).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_value_change_breaks_equality() {
    let model = hr_model();
    let a = NaturalIdCacheKey::new(&model, "Employee", Some("T1"), &alice()).unwrap();
    let b = NaturalIdCacheKey::new(
        &model,
        "Employee",
        Some("T1"),
        &[DomainValue::String("bob".to_string())],
    )
    .unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_missing_natural_id_mapping_is_a_configuration_defect() {
    let model = hr_model();
    // Department declares no natural id.
    let err = NaturalIdCacheKey::new(
        &model,
        "Department",
        None,
        &[DomainValue::String("eng".to_string())],
    )
    .unwrap_err();
    assert_eq!(
        err,
        CacheKeyError::MissingNaturalIdMapping("Department".to_string())
    );
}

#[test]
fn test_arity_checked_against_the_mapping() {
    let model = hr_model();
    let err = NaturalIdCacheKey::new(
        &model,
        "Employee",
        None,
        &[
            DomainValue::String("alice".to_string()),
            DomainValue::Integer(7),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, CacheKeyError::NaturalIdArityMismatch { .. }));
}

#[test]
fn test_keys_survive_serialization_with_lazy_display() {
    let model = hr_model();
    let key = NaturalIdCacheKey::new(&model, "Employee", Some("T1"), &alice()).unwrap();

    let json = serde_json::to_string(&key).unwrap();
    // The display string is a derived transient: never serialized.
    assert!(!json.contains("NaturalId["), "display leaked into json: {}", json);

    let back: NaturalIdCacheKey = serde_json::from_str(&json).unwrap();
    assert_eq!(back, key);
    assert_eq!(back.hash_code(), key.hash_code());
    // Rebuilt lazily on first access after deserialization.
    assert_eq!(back.to_string(), key.to_string());
}

#[test]
fn test_natural_id_resolution_short_circuits_on_cache_hit() {
    use relmap::cache::{CacheRegionProvider, SecondLevelCacheKey};
    use relmap::exec::resolve_natural_id;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapRegionProvider {
        regions: RefCell<HashMap<(String, SecondLevelCacheKey), serde_json::Value>>,
    }

    impl CacheRegionProvider for MapRegionProvider {
        fn get(&self, region: &str, key: &SecondLevelCacheKey) -> Option<serde_json::Value> {
            self.regions
                .borrow()
                .get(&(region.to_string(), key.clone()))
                .cloned()
        }

        fn put(&self, region: &str, key: SecondLevelCacheKey, value: serde_json::Value) {
            self.regions
                .borrow_mut()
                .insert((region.to_string(), key), value);
        }
    }

    let model = hr_model();
    let provider = MapRegionProvider::default();
    let mut loads = 0;

    // Miss: falls through to the loader and populates the region.
    let id = resolve_natural_id(
        &provider,
        "naturalid",
        &model,
        "Employee",
        Some("T1"),
        &alice(),
        || {
            loads += 1;
            Ok(Some(DomainValue::Integer(42)))
        },
    )
    .unwrap();
    assert_eq!(id, Some(DomainValue::Integer(42)));
    assert_eq!(loads, 1);

    // Hit: the loader must not run again.
    let id = resolve_natural_id(
        &provider,
        "naturalid",
        &model,
        "Employee",
        Some("T1"),
        &alice(),
        || panic!("loader must not run on a cache hit"),
    )
    .unwrap();
    assert_eq!(id, Some(DomainValue::Integer(42)));
}

#[test]
fn test_entity_key_hash_shortcut_does_not_replace_comparison() {
    let a = EntityCacheKey::new("Employee", None, DomainValue::Integer(1));
    let b = EntityCacheKey::new("Employee", None, DomainValue::Integer(1));
    let c = EntityCacheKey::new("Employee", None, DomainValue::Integer(2));
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.to_string(), "Employee#1");
}
