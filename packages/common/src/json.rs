//! JSON helpers: slash-delimited pointers, deep merge, and file loading.
//!
//! Pointer syntax follows RFC 6901 (`/layout/position/x`, with `~1` for `/`
//! and `~0` for `~` inside a segment). Writing `null` through a pointer
//! removes the addressed object key instead of storing a literal null, which
//! is how optional fields are returned to their unset state.

use crate::result::CommonResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Splits a pointer into unescaped segments. Returns `None` for the empty
/// pointer and for pointers that do not start with `/`.
pub fn pointer_segments(path: &str) -> Option<Vec<String>> {
    let rest = path.strip_prefix('/')?;
    if rest.is_empty() {
        return None;
    }

    Some(
        rest.split('/')
            .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
            .collect(),
    )
}

fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Reads the value at `path`.
pub fn get_pointer<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    root.pointer(path)
}

/// Writes `value` at `path`, creating intermediate objects as needed.
///
/// Returns `false` without modifying anything observable when the path is
/// malformed or traverses a scalar.
pub fn set_pointer(root: &mut Value, path: &str, value: Value) -> bool {
    let Some(segments) = pointer_segments(path) else {
        return false;
    };

    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return false,
    };

    let mut current = root;
    for segment in parents {
        if current.is_null() {
            if value.is_null() {
                // Removing beneath a missing key is already satisfied.
                return true;
            }
            *current = Value::Object(Map::new());
        }

        current = match current {
            Value::Object(map) => {
                if value.is_null() && !map.contains_key(segment) {
                    return true;
                }
                map.entry(segment.clone())
                    .or_insert_with(|| Value::Object(Map::new()))
            }
            Value::Array(items) => match segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                Some(item) => item,
                None => return false,
            },
            _ => return false,
        };
    }

    if current.is_null() {
        if value.is_null() {
            return true;
        }
        *current = Value::Object(Map::new());
    }

    match current {
        Value::Object(map) => {
            if value.is_null() {
                map.remove(last);
            } else {
                map.insert(last.clone(), value);
            }
            true
        }
        Value::Array(items) => match last.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
            Some(item) => {
                *item = value;
                true
            }
            None => false,
        },
        _ => false,
    }
}

/// Returns the pointer to the first segment of `path` that does not exist in
/// `root`, or `None` when the whole path resolves.
///
/// Used to invert a write that created new keys: clearing the first created
/// key restores the original shape.
pub fn first_missing_pointer(root: &Value, path: &str) -> Option<String> {
    let segments = pointer_segments(path)?;
    let mut current = root;
    let mut prefix = String::new();

    for segment in &segments {
        prefix.push('/');
        prefix.push_str(&escape_segment(segment));

        let next = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };

        match next {
            Some(value) => current = value,
            None => return Some(prefix),
        }
    }

    None
}

/// Merges `overlay` into `base`. Objects merge key by key, recursively;
/// any other overlay value replaces the base value.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Reads and decodes a JSON file.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> CommonResult<T> {
    let source = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&source)?)
}

/// Encodes `value` as pretty JSON and writes it to `path`.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> CommonResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_pointer_creates_intermediate_objects() {
        let mut value = json!({ "style": {} });
        assert!(set_pointer(&mut value, "/style/fill/color/hex", json!("#ff0000")));
        assert_eq!(value, json!({ "style": { "fill": { "color": { "hex": "#ff0000" } } } }));
    }

    #[test]
    fn test_set_null_removes_key() {
        let mut value = json!({ "style": { "shadow": { "blur": 4 } } });
        assert!(set_pointer(&mut value, "/style/shadow", Value::Null));
        assert_eq!(value, json!({ "style": {} }));
    }

    #[test]
    fn test_set_pointer_rejects_scalar_traversal() {
        let mut value = json!({ "name": "card" });
        assert!(!set_pointer(&mut value, "/name/first", json!("x")));
        assert!(!set_pointer(&mut value, "", json!("x")));
    }

    #[test]
    fn test_first_missing_pointer() {
        let value = json!({ "style": { "opacity": 1.0 } });
        assert_eq!(first_missing_pointer(&value, "/style/opacity"), None);
        assert_eq!(
            first_missing_pointer(&value, "/style/fill/color/hex"),
            Some("/style/fill".to_string())
        );
    }

    #[test]
    fn test_deep_merge() {
        let mut base = json!({ "text": "Hi", "font": { "size": 12, "weight": 400 } });
        deep_merge(&mut base, &json!({ "font": { "size": 16 } }));
        assert_eq!(base, json!({ "text": "Hi", "font": { "size": 16, "weight": 400 } }));
    }

    #[test]
    fn test_escaped_segments() {
        assert_eq!(
            pointer_segments("/props/a~1b/c~0d"),
            Some(vec!["props".to_string(), "a/b".to_string(), "c~d".to_string()])
        );
    }
}
