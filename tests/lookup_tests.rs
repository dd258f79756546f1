// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for scope-aware lookups over the in-memory store.

use confmgr::prelude::*;
use std::collections::{BTreeMap, HashMap};

mod support;
use support::OddTypeStore;

fn settings(paths: &[&str]) -> Settings {
    Settings {
        key_paths: paths.iter().map(|p| p.to_string()).collect(),
        ..Settings::default()
    }
}

fn scope(pairs: &[(&str, &str)]) -> Scope {
    pairs.iter().map(|(k, v)| (*k, *v)).collect()
}

fn site_settings() -> Settings {
    settings(&["site/%{site}", "default"])
}

#[test]
fn test_site_scenario_hash_merge() {
    let store = MemoryStore::new()
        .with_hash("cfg:site/east:db", [("host", "east1")])
        .with_hash("cfg:default:db", [("host", "def1"), ("port", "5432")]);
    let manager = ConfigManager::new(site_settings(), store).unwrap();

    let result = manager
        .lookup_hash("db", &scope(&[("site", "east")]))
        .unwrap();

    let mut expected = BTreeMap::new();
    expected.insert(
        "host".to_string(),
        ValueSource::new("east1", "cfg:site/east:db"),
    );
    expected.insert("port".to_string(), ValueSource::new("5432", "cfg:default:db"));
    assert_eq!(result, LookupResult::Hash(expected));
}

#[test]
fn test_site_scenario_without_site_uses_default_only() {
    let store = MemoryStore::new()
        .with_hash("cfg:site/east:db", [("host", "east1")])
        .with_hash("cfg:default:db", [("host", "def1"), ("port", "5432")]);
    let manager = ConfigManager::new(site_settings(), store).unwrap();

    let result = manager.lookup_hash("db", &Scope::new()).unwrap();
    match result {
        LookupResult::Hash(fields) => {
            assert_eq!(fields["host"].value, "def1");
            assert_eq!(fields["host"].source, "cfg:default:db");
        }
        other => panic!("expected hash, got {:?}", other),
    }
}

#[test]
fn test_first_configured_template_wins_scalar() {
    let settings = settings(&["t1", "t2"]);
    let mut store = MemoryStore::new()
        .with_scalar("cfg:t1:name", "one")
        .with_scalar("cfg:t2:name", "two");
    let mut engine = LookupEngine::new(&settings, &mut store);

    let result = engine.lookup_scalar("name", &Scope::new()).unwrap();
    assert_eq!(result, ValueSource::new("one", "cfg:t1:name"));
}

#[test]
fn test_hash_union_with_override() {
    let settings = settings(&["t1", "t2"]);
    let mut store = MemoryStore::new()
        .with_hash("cfg:t1:h", [("a", "1")])
        .with_hash("cfg:t2:h", [("a", "2"), ("b", "3")]);
    let mut engine = LookupEngine::new(&settings, &mut store);

    let fields = engine.lookup_hash("h", &Scope::new()).unwrap();
    let values: HashMap<&str, &str> = fields
        .iter()
        .map(|(k, v)| (k.as_str(), v.value.as_str()))
        .collect();
    assert_eq!(values.len(), 2);
    assert_eq!(values["a"], "1");
    assert_eq!(values["b"], "3");
}

#[test]
fn test_lists_concatenate_in_scan_order() {
    let settings = settings(&["t1", "t2"]);
    let mut store = MemoryStore::new()
        .with_list("cfg:t1:l", ["x"])
        .with_list("cfg:t2:l", ["y"]);
    let mut engine = LookupEngine::new(&settings, &mut store);

    let entries = engine.lookup_list("l", &Scope::new()).unwrap();
    assert_eq!(
        entries,
        vec![
            ValueSource::new("y", "cfg:t2:l"),
            ValueSource::new("x", "cfg:t1:l"),
        ]
    );
}

#[test]
fn test_list_entries_are_not_expanded() {
    let settings = settings(&["default"]);
    let mut store = MemoryStore::new()
        .with_list("cfg:default:l", ["${name}"])
        .with_scalar("cfg:default:name", "value");
    let mut engine = LookupEngine::new(&settings, &mut store);

    let entries = engine.lookup_list("l", &Scope::new()).unwrap();
    assert_eq!(entries[0].value, "${name}");

    let entry = engine.lookup_list_index("l", 0, &Scope::new()).unwrap();
    assert_eq!(entry.value, "value");
}

#[test]
fn test_list_index_out_of_range_names_index_and_length() {
    let store = MemoryStore::new()
        .with_list("cfg:t1:l", ["x"])
        .with_list("cfg:t2:l", ["y"]);
    let manager = ConfigManager::new(settings(&["t1", "t2"]), store).unwrap();

    let err = manager
        .lookup_list_index("l", 2, &Scope::new())
        .unwrap_err();
    match err {
        ConfmgrError::ListIndexOutOfRange { index, length, .. } => {
            assert_eq!(index, 2);
            assert_eq!(length, 2);
        }
        other => panic!("unexpected error {:?}", other),
    }

    let err = manager
        .lookup_list_index("l", -1, &Scope::new())
        .unwrap_err();
    assert!(matches!(err, ConfmgrError::NegativeListIndex { .. }));
}

#[test]
fn test_list_index_on_missing_list() {
    let manager = ConfigManager::new(settings(&["default"]), MemoryStore::new()).unwrap();
    let err = manager
        .lookup_list_index("nothing", 0, &Scope::new())
        .unwrap_err();
    assert!(matches!(
        err,
        ConfmgrError::ListIndexOutOfRange { length: 0, .. }
    ));
}

#[test]
fn test_recursive_scalar_expansion() {
    let settings = settings(&["default"]);
    let mut store = MemoryStore::new()
        .with_scalar("cfg:default:recurse", "${other}")
        .with_scalar("cfg:default:other", "myvalue");
    let mut engine = LookupEngine::new(&settings, &mut store);

    let result = engine.lookup_scalar("recurse", &Scope::new()).unwrap();
    assert_eq!(result, ValueSource::new("myvalue", "cfg:default:recurse"));
}

#[test]
fn test_all_reference_forms_in_one_value() {
    let settings = settings(&["site/%{site}", "default"]);
    let mut store = MemoryStore::new()
        .with_scalar(
            "cfg:default:dsn",
            "${user}@${db/host}:${db/port} via ${proxies/index/1}",
        )
        .with_scalar("cfg:default:user", "app")
        .with_hash("cfg:default:db", [("host", "def1"), ("port", "5432")])
        .with_hash("cfg:site/east:db", [("host", "east1")])
        .with_list("cfg:default:proxies", ["p0", "p1"]);
    let mut engine = LookupEngine::new(&settings, &mut store);

    let result = engine
        .lookup_scalar("dsn", &scope(&[("site", "east")]))
        .unwrap();
    assert_eq!(result.value, "app@east1:5432 via p1");
}

#[test]
fn test_substitution_uses_request_scope() {
    let settings = settings(&["site/%{site}", "default"]);
    let mut store = MemoryStore::new()
        .with_scalar("cfg:default:greeting", "hello ${place}")
        .with_scalar("cfg:default:place", "world")
        .with_scalar("cfg:site/east:place", "east");
    let mut engine = LookupEngine::new(&settings, &mut store);

    let east = engine
        .lookup_scalar("greeting", &scope(&[("site", "east")]))
        .unwrap();
    assert_eq!(east.value, "hello east");

    let default = engine.lookup_scalar("greeting", &Scope::new()).unwrap();
    assert_eq!(default.value, "hello world");
}

#[test]
fn test_missing_scalar_reference_expands_to_empty() {
    let settings = settings(&["default"]);
    let mut store = MemoryStore::new().with_scalar("cfg:default:v", "[${absent}]");
    let mut engine = LookupEngine::new(&settings, &mut store);

    assert_eq!(engine.lookup_scalar("v", &Scope::new()).unwrap().value, "[]");
}

#[test]
fn test_missing_hash_field_reference_aborts_expansion() {
    let settings = settings(&["default"]);
    let mut store = MemoryStore::new()
        .with_scalar("cfg:default:v", "${db/absent}")
        .with_hash("cfg:default:db", [("host", "h")]);
    let mut engine = LookupEngine::new(&settings, &mut store);

    let err = engine.lookup_scalar("v", &Scope::new()).unwrap_err();
    assert!(matches!(err, ConfmgrError::HashFieldNotFound { .. }));
}

#[test]
fn test_repeated_reference_fetched_once() {
    let settings = settings(&["default"]);
    let mut store = MemoryStore::new()
        .with_scalar("cfg:default:v", "${a}-${a}-${a}")
        .with_scalar("cfg:default:a", "x");
    let mut engine = LookupEngine::new(&settings, &mut store);

    assert_eq!(engine.lookup_scalar("v", &Scope::new()).unwrap().value, "x-x-x");
    assert_eq!(store.fetch_count("cfg:default:a"), 1);
}

#[test]
fn test_no_caching_between_lookups() {
    let settings = settings(&["default"]);
    let mut store = MemoryStore::new().with_scalar("cfg:default:a", "x");
    let mut engine = LookupEngine::new(&settings, &mut store);

    engine.lookup_scalar("a", &Scope::new()).unwrap();
    engine.lookup_scalar("a", &Scope::new()).unwrap();
    assert_eq!(store.fetch_count("cfg:default:a"), 2);
}

#[test]
fn test_mutual_references_are_a_cycle() {
    let settings = settings(&["default"]);
    let mut store = MemoryStore::new()
        .with_scalar("cfg:default:a", "${b}")
        .with_scalar("cfg:default:b", "${a}");
    let mut engine = LookupEngine::new(&settings, &mut store);

    let err = engine.lookup_scalar("a", &Scope::new()).unwrap_err();
    assert!(matches!(err, ConfmgrError::SubstitutionCycle { .. }));
}

#[test]
fn test_hash_field_prefers_highest_precedence_hash_with_field() {
    let store = MemoryStore::new()
        .with_hash("cfg:site/east:db", [("host", "east1")])
        .with_hash("cfg:default:db", [("host", "def1"), ("port", "5432")]);
    let manager = ConfigManager::new(site_settings(), store).unwrap();
    let east = scope(&[("site", "east")]);

    let host = manager.lookup_hash_field("db", "host", &east).unwrap();
    assert_eq!(
        host,
        LookupResult::String(ValueSource::new("east1", "cfg:site/east:db"))
    );

    let port = manager.lookup_hash_field("db", "port", &east).unwrap();
    assert_eq!(
        port,
        LookupResult::String(ValueSource::new("5432", "cfg:default:db"))
    );
}

#[test]
fn test_scalar_miss_is_soft_and_hash_field_miss_is_hard() {
    let settings = settings(&["default"]);
    let mut store = MemoryStore::new();
    let mut engine = LookupEngine::new(&settings, &mut store);

    assert!(engine.lookup_scalar("x", &Scope::new()).unwrap().is_empty());
    assert!(engine.lookup_hash("x", &Scope::new()).unwrap().is_empty());
    assert!(engine.lookup_list("x", &Scope::new()).unwrap().is_empty());
    assert!(engine.lookup_hash_field("x", "f", &Scope::new()).is_err());
}

#[test]
fn test_unavailable_store_propagates() {
    let store = MemoryStore::new().with_scalar("cfg:default:a", "x");
    store.set_unavailable(true);
    let manager = ConfigManager::new(settings(&["default"]), store).unwrap();

    let err = manager.lookup_string("a", &Scope::new()).unwrap_err();
    assert!(err.is_connectivity());
    assert!(!err.is_not_found());
}

#[test]
fn test_header_scope_drives_lookup() {
    let store = MemoryStore::new()
        .with_scalar("cfg:site/east:motd", "east")
        .with_scalar("cfg:default:motd", "default");
    let manager = ConfigManager::new(site_settings(), store).unwrap();

    let scope = manager.scope_from_headers([
        ("Accept", "*/*"),
        ("X-CFG-SITE", "EAST"),
        ("x-cfg-site", "west"),
    ]);
    let result = manager.lookup_string("motd", &scope).unwrap();
    assert_eq!(result.to_text(), "east");
}

#[test]
fn test_json_rendering_of_lookup() {
    let store = MemoryStore::new().with_list("cfg:default:servers", ["a"]);
    let manager = ConfigManager::new(settings(&["default"]), store).unwrap();

    let json = manager
        .lookup_list("servers", &Scope::new())
        .unwrap()
        .to_json()
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["type"], "list");
    assert_eq!(parsed["data"][0]["value"], "a");
    assert_eq!(parsed["data"][0]["source"], "cfg:default:servers");
}

#[test]
fn test_unsupported_stored_type_is_skipped() {
    let settings = settings(&["odd", "default"]);
    let mut store = OddTypeStore::new(
        MemoryStore::new()
            .with_scalar("cfg:odd:name", "never")
            .with_scalar("cfg:default:name", "fallback"),
        "cfg:odd:name",
    );
    let mut engine = LookupEngine::new(&settings, &mut store);

    let result = engine.lookup_scalar("name", &Scope::new()).unwrap();
    assert_eq!(result, ValueSource::new("fallback", "cfg:default:name"));
}
