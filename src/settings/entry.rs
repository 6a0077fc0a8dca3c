//! Tagged settings entries

use serde_json::Value;

use crate::sensitive::Sensitive;

/// A stored settings value, either plain or flagged sensitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Plain(Value),
    Sensitive(Sensitive<Value>),
}

impl Entry {
    /// Wrap `value` as sensitive with the default mask width
    pub fn sensitive(value: impl Into<Value>) -> Self {
        Entry::Sensitive(Sensitive::new(value.into()))
    }

    /// The underlying value, unwrapped if sensitive
    pub fn value(&self) -> &Value {
        match self {
            Entry::Plain(value) => value,
            Entry::Sensitive(sensitive) => sensitive.inner(),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Entry::Plain(value) => value,
            Entry::Sensitive(sensitive) => sensitive.into_inner(),
        }
    }

    pub fn is_sensitive(&self) -> bool {
        matches!(self, Entry::Sensitive(_))
    }

    /// Export form: the mask for sensitive entries, the value otherwise
    pub fn masked(&self) -> Value {
        match self {
            Entry::Plain(value) => value.clone(),
            Entry::Sensitive(sensitive) => Value::String(sensitive.mask()),
        }
    }

    /// Resolve what gets stored when `incoming` overwrites `self`.
    ///
    /// Sensitivity is sticky: a plain value written over a sensitive entry is
    /// re-wrapped with the existing mask width.
    pub(crate) fn overwrite_with(&self, incoming: Entry) -> Entry {
        match (self, incoming) {
            (Entry::Sensitive(existing), Entry::Plain(value)) => {
                Entry::Sensitive(existing.rewrap(value))
            }
            (_, incoming) => incoming,
        }
    }
}

impl From<Value> for Entry {
    fn from(value: Value) -> Self {
        Entry::Plain(value)
    }
}

impl From<Sensitive<Value>> for Entry {
    fn from(sensitive: Sensitive<Value>) -> Self {
        Entry::Sensitive(sensitive)
    }
}

impl From<&str> for Entry {
    fn from(value: &str) -> Self {
        Entry::Plain(Value::from(value))
    }
}

impl From<String> for Entry {
    fn from(value: String) -> Self {
        Entry::Plain(Value::from(value))
    }
}

impl From<i64> for Entry {
    fn from(value: i64) -> Self {
        Entry::Plain(Value::from(value))
    }
}

impl From<bool> for Entry {
    fn from(value: bool) -> Self {
        Entry::Plain(Value::from(value))
    }
}
