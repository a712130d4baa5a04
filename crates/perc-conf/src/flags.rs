use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;

/// The four compiler switches every workspace configures by name.
///
/// These form the lower layer of the option set handed to the compiler.
/// Free-form `options` from the configuration are deep-merged on top of
/// them, so a user-supplied `options.bare` overrides [`CompilerFlags::bare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerFlags {
    pub bare: bool,
    pub header: bool,
    pub inline_map: bool,
    pub source_map: bool,
}

impl Default for CompilerFlags {
    fn default() -> Self {
        Self {
            bare: false,
            header: false,
            inline_map: false,
            source_map: true,
        }
    }
}

impl CompilerFlags {
    /// Render the flags as compiler option keys.
    #[must_use]
    pub fn to_options(self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("bare".to_string(), Value::Bool(self.bare));
        map.insert("header".to_string(), Value::Bool(self.header));
        map.insert("inlineMap".to_string(), Value::Bool(self.inline_map));
        map.insert("sourceMap".to_string(), Value::Bool(self.source_map));
        map
    }

    /// Read the effective flags back out of a merged option set.
    ///
    /// Keys missing from `options` keep the value from `self`. Present keys
    /// are interpreted with JavaScript truthiness, since the compiler sees
    /// them the same way.
    #[must_use]
    pub fn resolve(self, options: &Map<String, Value>) -> Self {
        let pick = |key: &str, fallback: bool| options.get(key).map_or(fallback, truthy);
        Self {
            bare: pick("bare", self.bare),
            header: pick("header", self.header),
            inline_map: pick("inlineMap", self.inline_map),
            source_map: pick("sourceMap", self.source_map),
        }
    }

    /// Build the full option set: named flags first, user options merged on top.
    #[must_use]
    pub fn merge_options(self, user: &Map<String, Value>) -> Map<String, Value> {
        let mut merged = self.to_options();
        merge_maps(&mut merged, user);
        merged
    }
}

/// Recursively merge `overlay` into `base`. The right-hand side wins.
///
/// Objects are merged key by key; any other value (including arrays)
/// replaces what was there.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => merge_maps(base_map, overlay_map),
        (base, overlay) => *base = overlay.clone(),
    }
}

fn merge_maps(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match base.get_mut(key) {
            Some(existing) => deep_merge(existing, value),
            None => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_defaults_enable_only_source_map() {
        let flags = CompilerFlags::default();
        assert!(!flags.bare);
        assert!(!flags.header);
        assert!(!flags.inline_map);
        assert!(flags.source_map);
    }

    #[test]
    fn test_to_options_uses_compiler_key_names() {
        let options = CompilerFlags::default().to_options();
        assert_eq!(
            Value::Object(options),
            json!({"bare": false, "header": false, "inlineMap": false, "sourceMap": true})
        );
    }

    mod merging {
        use super::*;

        #[test]
        fn test_user_option_overrides_named_flag() {
            let flags = CompilerFlags {
                bare: false,
                ..CompilerFlags::default()
            };
            let merged = flags.merge_options(&object(json!({"bare": true})));
            assert_eq!(merged.get("bare"), Some(&json!(true)));
            assert!(flags.resolve(&merged).bare);
        }

        #[test]
        fn test_extra_keys_pass_through() {
            let merged = CompilerFlags::default()
                .merge_options(&object(json!({"transpile": {"presets": ["env"]}})));
            assert_eq!(merged.get("transpile"), Some(&json!({"presets": ["env"]})));
            assert_eq!(merged.get("sourceMap"), Some(&json!(true)));
        }

        #[test]
        fn test_deep_merge_nested_objects() {
            let mut base = json!({"a": {"x": 1, "y": 2}, "b": [1, 2]});
            deep_merge(&mut base, &json!({"a": {"y": 3, "z": 4}, "b": [9]}));
            assert_eq!(base, json!({"a": {"x": 1, "y": 3, "z": 4}, "b": [9]}));
        }

        #[test]
        fn test_deep_merge_scalar_replaces_object() {
            let mut base = json!({"a": {"x": 1}});
            deep_merge(&mut base, &json!({"a": false}));
            assert_eq!(base, json!({"a": false}));
        }
    }

    mod resolving {
        use super::*;

        #[test]
        fn test_missing_keys_keep_named_values() {
            let flags = CompilerFlags {
                header: true,
                ..CompilerFlags::default()
            };
            assert_eq!(flags.resolve(&Map::new()), flags);
        }

        #[test]
        fn test_non_boolean_values_use_truthiness() {
            let resolved = CompilerFlags::default()
                .resolve(&object(json!({"sourceMap": 0, "bare": "yes", "header": null})));
            assert!(!resolved.source_map);
            assert!(resolved.bare);
            assert!(!resolved.header);
        }
    }
}
