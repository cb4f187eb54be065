//! Project property tree values.
//!
//! Properties are a flat string-keyed map. Scoped entries use `/`-joined
//! keys (`WFSLayersPrecision/<layer id>`), mirroring how host servers
//! store per-layer settings under a scope path.

use serde::{Deserialize, Serialize};

/// A property value: an integer or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Int(i64),
    List(Vec<String>),
}

impl PropertyValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            PropertyValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            PropertyValue::List(v) => Some(v),
            PropertyValue::Int(_) => None,
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(v: Vec<String>) -> Self {
        PropertyValue::List(v)
    }
}

/// Join a scope and key into a property map key.
///
/// Keys arriving with a leading `/` are tolerated so that callers can pass
/// either `id` or `/id`.
pub(crate) fn entry_key(scope: &str, key: &str) -> String {
    format!("{}/{}", scope, key.trim_start_matches('/'))
}
