//! The resolved settings map

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::error::{EnvError, Result};
use crate::settings::entry::Entry;

/// Ordered settings with transparent access to sensitive values.
///
/// Reads always return the underlying value. Sensitivity only shows through
/// [`Settings::masked`] and [`Settings::entry`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    entries: IndexMap<String, Entry>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Get the unwrapped value stored at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::KeyNotFound`] if `key` is absent.
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.entries
            .get(key)
            .map(Entry::value)
            .ok_or_else(|| EnvError::key_not_found(key))
    }

    /// Like [`Settings::get`], falling back to `default` when `key` is absent
    pub fn get_or_default<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.entries.get(key).map(Entry::value).unwrap_or(default)
    }

    /// Raw tagged access, exposing whether the entry is sensitive
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Store `value` at `key`.
    ///
    /// If the current entry is sensitive and `value` is plain, the stored
    /// value is re-wrapped with the current mask width.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Entry>) {
        let key = key.into();
        let incoming = value.into();
        let stored = match self.entries.get(&key) {
            Some(existing) => existing.overwrite_with(incoming),
            None => incoming,
        };
        self.entries.insert(key, stored);
    }

    /// Remove `key`, returning its entry.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::KeyNotFound`] if `key` is absent.
    pub fn delete(&mut self, key: &str) -> Result<Entry> {
        self.entries
            .shift_remove(key)
            .ok_or_else(|| EnvError::key_not_found(key))
    }

    /// Apply every pair through [`Settings::set`], in iteration order
    pub fn update<K, E>(&mut self, other: impl IntoIterator<Item = (K, E)>)
    where
        K: Into<String>,
        E: Into<Entry>,
    {
        for (key, value) in other {
            self.set(key, value);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Unwrapped values, one per key
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values().map(Entry::value)
    }

    /// Unwrapped `(key, value)` pairs, one per key
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.as_str(), entry.value()))
    }

    /// Tagged `(key, entry)` pairs
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    /// Copy of the settings safe for display: sensitive values become masks
    pub fn masked(&self) -> IndexMap<String, Value> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.masked()))
            .collect()
    }

    /// Attribute-style lookup: tries `name` verbatim, then upper-cased, then
    /// lower-cased, so `settings.attr("debug")` finds `DEBUG` and vice versa.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::AttributeNotFound`] if no form is present.
    pub fn attr(&self, name: &str) -> Result<&Value> {
        if let Some(entry) = self.entries.get(name) {
            return Ok(entry.value());
        }
        self.entries
            .get(&name.to_uppercase())
            .or_else(|| self.entries.get(&name.to_lowercase()))
            .map(Entry::value)
            .ok_or_else(|| EnvError::attribute_not_found(name))
    }

    /// Render every unwrapped value as environment text.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::Serialization`] for the first value that has no
    /// text form, or a key/value the environment cannot hold.
    pub fn to_env_pairs(&self) -> Result<Vec<(String, String)>> {
        self.iter()
            .map(|(key, value)| {
                if key.is_empty() || key.contains('=') || key.contains('\0') {
                    return Err(EnvError::serialization(
                        key,
                        "not a valid environment variable name",
                    ));
                }
                let text = env_text(value)
                    .ok_or_else(|| EnvError::serialization(key, value_kind(value)))?;
                if text.contains('\0') {
                    return Err(EnvError::serialization(key, "text contains a NUL byte"));
                }
                Ok((key.to_string(), text))
            })
            .collect()
    }

    /// Copy all settings into the process environment.
    ///
    /// Nothing is written unless every value renders; see
    /// [`Settings::to_env_pairs`], which is the safe way to get the same
    /// pairs without touching the environment.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::Serialization`] if any value has no text form.
    ///
    /// # Safety
    ///
    /// Same contract as [`std::env::set_var`]: the caller must ensure no other
    /// thread reads or writes the process environment while this runs. Call it
    /// early in `main`, before spawning threads.
    pub unsafe fn export_to_environment(&self) -> Result<()> {
        let pairs = self.to_env_pairs()?;
        for (key, text) in &pairs {
            // SAFETY: upheld by the caller per this function's contract.
            unsafe {
                std::env::set_var(key, text);
            }
        }
        tracing::debug!(count = pairs.len(), "Exported settings to environment");
        Ok(())
    }
}

/// Text form of a value for the process environment, if it has one
pub(crate) fn env_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null has no text form",
        Value::Array(_) => "arrays have no text form",
        Value::Object(_) => "tables have no text form",
        _ => "unsupported value",
    }
}

impl<K: Into<String>, E: Into<Entry>> FromIterator<(K, E)> for Settings {
    fn from_iter<I: IntoIterator<Item = (K, E)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl From<IndexMap<String, Entry>> for Settings {
    fn from(entries: IndexMap<String, Entry>) -> Self {
        Self { entries }
    }
}

/// Serializes unwrapped values; use [`Settings::masked`] for safe output.
impl Serialize for Settings {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensitive::Sensitive;
    use crate::test_support::{EnvGuard, env_lock};
    use proptest::prelude::*;
    use serde_json::json;

    /// Every value kind, plain and sensitive
    fn sample_entries() -> Vec<Entry> {
        let values = vec![
            json!(0),
            json!(0.0),
            json!(""),
            json!("text"),
            json!([1, 2, 3]),
            json!({"nested": true}),
            json!(false),
            Value::Null,
        ];
        let mut entries: Vec<Entry> = values.iter().cloned().map(Entry::Plain).collect();
        entries.extend(values.into_iter().map(Entry::sensitive));
        entries
    }

    #[test]
    fn test_empty() {
        let settings = Settings::new();
        assert!(settings.is_empty());
        assert_eq!(settings.len(), 0);
        assert!(settings.masked().is_empty());
    }

    #[test]
    fn test_get_unwraps_every_kind() {
        for entry in sample_entries() {
            let expected = entry.value().clone();
            let settings: Settings = [("foo", entry)].into_iter().collect();
            assert_eq!(settings.get("foo").unwrap(), &expected);
        }
    }

    #[test]
    fn test_get_missing_key() {
        let settings = Settings::new();
        let result = settings.get("garbleblag");
        assert!(matches!(result, Err(EnvError::KeyNotFound { .. })));
    }

    #[test]
    fn test_get_or_default() {
        let settings: Settings = [("foo", Entry::sensitive("bar"))].into_iter().collect();
        let fallback = json!("fallback");
        assert_eq!(settings.get_or_default("foo", &fallback), &json!("bar"));
        assert_eq!(settings.get_or_default("missing", &fallback), &fallback);
    }

    #[test]
    fn test_masked_hides_every_sensitive_kind() {
        for entry in sample_entries() {
            let sensitive = entry.is_sensitive();
            let actual = entry.value().clone();
            let settings: Settings = [("foo", entry)].into_iter().collect();
            let masked = settings.masked();

            if sensitive {
                let shown = masked.get("foo").and_then(Value::as_str).unwrap();
                assert!(!shown.is_empty());
                assert!(shown.chars().all(|c| c == '*'));
                assert_ne!(masked["foo"], actual);
            } else {
                assert_eq!(masked["foo"], actual);
            }
        }
    }

    #[test]
    fn test_masked_uses_mask_width() {
        let mut settings = Settings::new();
        settings.set(
            "TOKEN",
            Sensitive::with_mask_width(json!("abc"), 4).unwrap(),
        );
        assert_eq!(settings.masked()["TOKEN"], json!("****"));
    }

    #[test]
    fn test_set_keeps_sensitivity() {
        for entry in sample_entries() {
            let sensitive = entry.is_sensitive();
            let actual = entry.value().clone();
            let mut settings: Settings = [("foo", entry)].into_iter().collect();

            settings.set("foo", actual.clone());

            assert_eq!(settings.get("foo").unwrap(), &actual);
            assert_eq!(settings.entry("foo").unwrap().is_sensitive(), sensitive);
        }
    }

    #[test]
    fn test_set_plain_over_sensitive_masks_new_value() {
        let mut settings: Settings = [("PASSWORD", Entry::sensitive("old"))].into_iter().collect();
        settings.set("PASSWORD", "new");

        assert_eq!(settings.get("PASSWORD").unwrap(), &json!("new"));
        assert_eq!(settings.masked()["PASSWORD"], json!("**********"));
    }

    #[test]
    fn test_set_keeps_existing_mask_width() {
        let mut settings = Settings::new();
        settings.set("KEY", Sensitive::with_mask_width(json!("a"), 3).unwrap());
        settings.set("KEY", "b");
        assert_eq!(settings.masked()["KEY"], json!("***"));
    }

    #[test]
    fn test_set_sensitive_over_plain() {
        let mut settings: Settings = [("KEY", "visible")].into_iter().collect();
        settings.set("KEY", Entry::sensitive("hidden"));
        assert!(settings.entry("KEY").unwrap().is_sensitive());
    }

    #[test]
    fn test_set_preserves_position() {
        let mut settings: Settings = [("A", 1i64), ("B", 2), ("C", 3)].into_iter().collect();
        settings.set("A", 10i64);
        assert_eq!(settings.keys().collect::<Vec<_>>(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_delete() {
        let mut settings: Settings = [("foo", Entry::sensitive(1i64))].into_iter().collect();
        let removed = settings.delete("foo").unwrap();
        assert!(removed.is_sensitive());
        assert!(matches!(settings.get("foo"), Err(EnvError::KeyNotFound { .. })));
        assert!(matches!(settings.delete("foo"), Err(EnvError::KeyNotFound { .. })));
    }

    #[test]
    fn test_iteration_yields_each_entry_once() {
        let settings: Settings = [
            ("A", Entry::from(1i64)),
            ("B", Entry::sensitive("secret")),
        ]
        .into_iter()
        .collect();

        let items: Vec<_> = settings.iter().collect();
        assert_eq!(items, vec![("A", &json!(1)), ("B", &json!("secret"))]);

        let values: Vec<_> = settings.values().collect();
        assert_eq!(values, vec![&json!(1), &json!("secret")]);

        // Restartable
        assert_eq!(settings.keys().count(), 2);
        assert_eq!(settings.keys().count(), 2);
    }

    #[test]
    fn test_attr_case_insensitive() {
        let settings: Settings = [("DEBUG", true), ("debug", false)].into_iter().collect();
        assert_eq!(settings.attr("debug").unwrap(), &json!(false));
        assert_eq!(settings.attr("DEBUG").unwrap(), &json!(true));

        let upper_only: Settings = [("APP_NAME", "envtiers")].into_iter().collect();
        assert_eq!(upper_only.attr("app_name").unwrap(), &json!("envtiers"));
    }

    #[test]
    fn test_attr_lower_key() {
        let settings: Settings = [("debug", true)].into_iter().collect();
        assert_eq!(settings.attr("debug").unwrap(), &json!(true));
        assert_eq!(settings.attr("DEBUG").unwrap(), &json!(true));
    }

    #[test]
    fn test_attr_missing() {
        let settings: Settings = [("DEBUG", true)].into_iter().collect();
        let err = settings.attr("nonexistent").unwrap_err();
        assert!(matches!(err, EnvError::AttributeNotFound { .. }));
        assert!(err.is_key_not_found());
    }

    #[test]
    fn test_update_applies_stickiness() {
        let mut settings: Settings = [("SECRET", Entry::sensitive("a"))].into_iter().collect();
        settings.update([("SECRET", "b"), ("OTHER", "c")]);
        assert!(settings.entry("SECRET").unwrap().is_sensitive());
        assert_eq!(settings.get("OTHER").unwrap(), &json!("c"));
    }

    #[test]
    fn test_serialize_is_unmasked() {
        let settings: Settings = [("A", Entry::sensitive("plain text"))].into_iter().collect();
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(json, r#"{"A":"plain text"}"#);
    }

    #[test]
    fn test_to_env_pairs() {
        let settings: Settings = [
            ("NAME", Entry::from("app")),
            ("PORT", Entry::from(8080i64)),
            ("DEBUG", Entry::from(true)),
            ("TOKEN", Entry::sensitive("abc")),
        ]
        .into_iter()
        .collect();

        let pairs = settings.to_env_pairs().unwrap();
        assert_eq!(
            pairs,
            vec![
                ("NAME".to_string(), "app".to_string()),
                ("PORT".to_string(), "8080".to_string()),
                ("DEBUG".to_string(), "true".to_string()),
                ("TOKEN".to_string(), "abc".to_string()),
            ]
        );
    }

    #[test]
    fn test_to_env_pairs_rejects_non_text() {
        for value in [Value::Null, json!([1]), json!({"a": 1})] {
            let settings: Settings = [("BAD", value)].into_iter().collect();
            let err = settings.to_env_pairs().unwrap_err();
            assert!(matches!(err, EnvError::Serialization { .. }));
        }

        let bad_key: Settings = [("A=B", "x")].into_iter().collect();
        assert!(matches!(
            bad_key.to_env_pairs(),
            Err(EnvError::Serialization { .. })
        ));
    }

    #[test]
    fn test_export_to_environment() {
        let _lock = env_lock();
        let mut env = EnvGuard::new();
        env.remove("ENVTIERS_TEST_EXPORT_A");
        env.remove("ENVTIERS_TEST_EXPORT_B");

        let settings: Settings = [
            ("ENVTIERS_TEST_EXPORT_A", Entry::from("hello")),
            ("ENVTIERS_TEST_EXPORT_B", Entry::sensitive(42i64)),
        ]
        .into_iter()
        .collect();
        // SAFETY: env_lock serializes every test that touches the environment
        unsafe { settings.export_to_environment() }.unwrap();

        assert_eq!(std::env::var("ENVTIERS_TEST_EXPORT_A").unwrap(), "hello");
        assert_eq!(std::env::var("ENVTIERS_TEST_EXPORT_B").unwrap(), "42");
    }

    #[test]
    fn test_env_pairs_leave_environment_untouched() {
        let _lock = env_lock();
        let mut env = EnvGuard::new();
        env.remove("ENVTIERS_TEST_EXPORT_E");

        let settings: Settings = [("ENVTIERS_TEST_EXPORT_E", Entry::sensitive(true))]
            .into_iter()
            .collect();
        assert_eq!(
            settings.to_env_pairs().unwrap(),
            vec![("ENVTIERS_TEST_EXPORT_E".to_string(), "true".to_string())]
        );
        assert!(std::env::var("ENVTIERS_TEST_EXPORT_E").is_err());
    }

    #[test]
    fn test_export_failure_writes_nothing() {
        let _lock = env_lock();
        let mut env = EnvGuard::new();
        env.remove("ENVTIERS_TEST_EXPORT_C");
        env.remove("ENVTIERS_TEST_EXPORT_D");

        let settings: Settings = [
            ("ENVTIERS_TEST_EXPORT_C", json!("ok")),
            ("ENVTIERS_TEST_EXPORT_D", json!([1, 2])),
        ]
        .into_iter()
        .collect();

        // SAFETY: env_lock serializes every test that touches the environment
        let result = unsafe { settings.export_to_environment() };
        assert!(matches!(result, Err(EnvError::Serialization { .. })));
        assert!(std::env::var("ENVTIERS_TEST_EXPORT_C").is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_set_then_get_returns_value(key in "[A-Za-z_][A-Za-z0-9_]{0,16}", n in any::<i64>(), s in ".*") {
            let mut settings = Settings::new();
            settings.set(key.clone(), n);
            prop_assert_eq!(settings.get(&key).unwrap(), &json!(n));
            settings.set(key.clone(), s.clone());
            prop_assert_eq!(settings.get(&key).unwrap(), &json!(s));
        }

        #[test]
        fn prop_masked_never_exposes_sensitive(s in ".+", width in 1usize..32) {
            let mut settings = Settings::new();
            settings.set("SECRET", Sensitive::with_mask_width(json!(s.clone()), width).unwrap());
            settings.set("SECRET", s.clone());
            let masked = settings.masked();
            prop_assert_eq!(&masked["SECRET"], &json!("*".repeat(width)));
        }
    }
}
