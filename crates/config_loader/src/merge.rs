//! Recursive override merge for settings trees.

use serde_json::{Map, Value};

/// Merge `overlay` into `base`.
///
/// Mapping values merge key by key, recursively. Every other value (scalars,
/// lists, null) replaces what was there.
pub fn merge(base: &mut Value, overlay: Value) {
    match overlay {
        Value::Object(entries) => {
            if !base.is_object() {
                *base = Value::Object(Map::new());
            }
            if let Value::Object(target) = base {
                for (key, value) in entries {
                    match value {
                        Value::Object(_) => {
                            let slot = target
                                .entry(key)
                                .or_insert_with(|| Value::Object(Map::new()));
                            merge(slot, value);
                        }
                        other => {
                            target.insert(key, other);
                        }
                    }
                }
            }
        }
        other => *base = other,
    }
}

/// Look up a dotted key path (`carla.port`) in a tree.
///
/// Missing segments, non-mapping intermediates and explicit nulls all
/// resolve to `None`.
pub fn lookup<'a>(tree: &'a Value, key: &str) -> Option<&'a Value> {
    let mut current = tree;
    for segment in key.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    (!current.is_null()).then_some(current)
}

/// Remove null entries recursively (TOML has no null)
pub(crate) fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_mapping_merges() {
        let mut base = json!({ "a": { "x": 1, "y": 2 } });
        merge(&mut base, json!({ "a": { "y": 3, "z": 4 } }));
        assert_eq!(base, json!({ "a": { "x": 1, "y": 3, "z": 4 } }));
    }

    #[test]
    fn test_lists_and_scalars_replace() {
        let mut base = json!({ "loc": [0.0, 0.0, 2.0], "fov": 90.0 });
        merge(&mut base, json!({ "loc": [1.0], "fov": 110.0 }));
        assert_eq!(base, json!({ "loc": [1.0], "fov": 110.0 }));
    }

    #[test]
    fn test_mapping_replaces_scalar() {
        let mut base = json!({ "a": 5 });
        merge(&mut base, json!({ "a": { "b": 1 } }));
        assert_eq!(base, json!({ "a": { "b": 1 } }));
    }

    #[test]
    fn test_new_top_level_group_is_added() {
        let mut base = json!({ "carla": { "port": 2000 } });
        merge(&mut base, json!({ "extra": { "flag": true } }));
        assert_eq!(base["extra"]["flag"], json!(true));
        assert_eq!(base["carla"]["port"], json!(2000));
    }

    #[test]
    fn test_lookup_dotted() {
        let tree = json!({ "carla": { "port": 2000, "host": null } });
        assert_eq!(lookup(&tree, "carla.port"), Some(&json!(2000)));
        assert_eq!(lookup(&tree, "carla.host"), None);
        assert_eq!(lookup(&tree, "carla.port.value"), None);
        assert_eq!(lookup(&tree, "missing"), None);
    }

    #[test]
    fn test_strip_nulls() {
        let mut tree = json!({ "a": null, "b": { "c": null, "d": 1 } });
        strip_nulls(&mut tree);
        assert_eq!(tree, json!({ "b": { "d": 1 } }));
    }
}
