//! Configuration tests
//!
//! Loading and saving `ListConfig`, and how its switches change list behaviour.

mod common;

use common::{child_layout, key, keys, Tab};
use dock_placeholders::list::FORMAT;
use dock_placeholders::map::attr;
use dock_placeholders::{ListConfig, PlaceholderList, PlaceholderMap, StrategyConverter};

// ========================================================================
// Loading / saving
// ========================================================================

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = ListConfig::load(&dir.path().join("placeholders.yaml")).unwrap();
    assert_eq!(config, ListConfig::default());
}

#[test]
fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("placeholders.yaml");

    let config = ListConfig {
        prune_child_maps: false,
        snapshot_live_placeholders: true,
        log_changes: true,
    };
    config.save(&path).unwrap();

    assert_eq!(ListConfig::load(&path).unwrap(), config);
}

#[test]
fn test_invalid_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("placeholders.yaml");
    std::fs::write(&path, "log_changes: [not, a, bool]\n").unwrap();

    let err = ListConfig::load(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("Invalid config"));
    assert_eq!(ListConfig::load_or_default(&path), ListConfig::default());
}

#[test]
fn test_config_serialize_deserialize() {
    let config = ListConfig {
        log_changes: true,
        ..ListConfig::default()
    };
    let yaml = config.to_yaml_string().unwrap();
    assert_eq!(ListConfig::from_yaml_str(&yaml).unwrap(), config);
}

// ========================================================================
// Behaviour switches
// ========================================================================

#[test]
fn test_prune_child_maps_switch() {
    let layout = child_layout(&["inner/1", "inner/2"]);

    let mut map = PlaceholderMap::new(FORMAT, 0);
    let record = map.push_record(vec![key("slot")]);
    map.put(record, attr::MAP, layout.clone());

    let mut pruning = PlaceholderList::<Tab>::from_map(&map).unwrap();
    let mut keeping = PlaceholderList::<Tab>::with_config(ListConfig {
        prune_child_maps: false,
        ..ListConfig::default()
    });
    keeping
        .read(&map, &mut StrategyConverter::new(None))
        .unwrap();

    pruning.remove_all_of(&key("inner/1"));
    keeping.remove_all_of(&key("inner/1"));

    assert_eq!(
        pruning.items().get(0).unwrap().child_map(),
        Some(&child_layout(&["inner/2"]))
    );
    assert_eq!(keeping.items().get(0).unwrap().child_map(), Some(&layout));
}

#[test]
fn test_log_changes_does_not_alter_results() {
    dock_placeholders::tracing::init();

    let mut list = PlaceholderList::<Tab>::with_config(ListConfig {
        log_changes: true,
        ..ListConfig::default()
    });
    list.pure_placeholders().push(keys(&["x", "y"])).unwrap();
    list.pure_placeholders().push(keys(&["z"])).unwrap();

    list.remove_all(&keys(&["x", "z"]));
    assert_eq!(list.len(), 1);
    assert!(list.has_placeholder(&key("y")));
}
