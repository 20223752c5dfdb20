//! Host Storage API
//!
//! The host platform's object/state store, seen as an async key-value store:
//! - objects: typed definitions (`state`, `channel`, `folder`, `instance`, ...)
//! - states: current values with an `ack` flag and timestamp
//! - subscriptions: change notifications for matching state ids
//!
//! Every call is a suspension point and may fail independently.

use crate::error::HostError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Object definition type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Carries a state value
    State,
    /// Groups related states
    Channel,
    /// Plain namespace node
    Folder,
    /// Adapter instance definition
    Instance,
    /// Metadata node
    Meta,
}

/// Object definition stored under an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreObject {
    /// Definition type
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    /// Common attributes (`name`, `type`, `role`, `enabled`, ...)
    #[serde(default)]
    pub common: Map<String, Value>,
    /// Implementation specific attributes
    #[serde(default)]
    pub native: Map<String, Value>,
}

impl StoreObject {
    /// Empty definition of the given kind
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            common: Map::new(),
            native: Map::new(),
        }
    }

    /// State definition with a name and value type (`number`, `string`, `json`, ...)
    pub fn state(name: &str, value_type: &str) -> Self {
        Self::new(ObjectKind::State)
            .with_common("name", name)
            .with_common("type", value_type)
            .with_common("read", true)
            .with_common("write", true)
    }

    /// Channel definition
    pub fn channel(name: &str) -> Self {
        Self::new(ObjectKind::Channel).with_common("name", name)
    }

    /// Folder definition
    pub fn folder(name: &str) -> Self {
        Self::new(ObjectKind::Folder).with_common("name", name)
    }

    /// Instance definition
    pub fn instance(name: &str, enabled: bool) -> Self {
        Self::new(ObjectKind::Instance)
            .with_common("name", name)
            .with_common("enabled", enabled)
    }

    /// Set a common attribute
    pub fn with_common(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.common.insert(key.to_string(), value.into());
        self
    }

    /// Whether `common.enabled` is `true`
    pub fn is_enabled(&self) -> bool {
        self.common
            .get("enabled")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Set `common.enabled`
    pub fn set_enabled(&mut self, enabled: bool) {
        self.common.insert("enabled".to_string(), Value::Bool(enabled));
    }
}

/// Current value of a state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateValue {
    /// The value
    pub val: Value,
    /// Whether the value is confirmed by its owner
    pub ack: bool,
    /// Write time in milliseconds since the Unix epoch
    pub ts: i64,
}

impl StateValue {
    /// Value stamped with the current time
    pub fn new(val: impl Into<Value>, ack: bool) -> Self {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Self {
            val: val.into(),
            ack,
            ts,
        }
    }
}

/// A state write observed by a subscription
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    /// State id
    pub id: String,
    /// New value, `None` when deleted
    pub state: Option<StateValue>,
}

/// Async object/state store of the host platform
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Create the object unless the id already exists. Returns whether it was created.
    async fn set_object_not_exists(&self, id: &str, object: StoreObject)
    -> Result<bool, HostError>;

    /// Read an object definition
    async fn get_object(&self, id: &str) -> Result<Option<StoreObject>, HostError>;

    /// Create or overwrite an object definition
    async fn set_object(&self, id: &str, object: StoreObject) -> Result<(), HostError>;

    /// Delete an object definition (missing ids are not an error)
    async fn del_object(&self, id: &str) -> Result<(), HostError>;

    /// Object ids in the inclusive key range `start..=end`, ascending
    async fn object_ids(&self, start: &str, end: &str) -> Result<Vec<String>, HostError>;

    /// Write a state value
    async fn set_state(&self, id: &str, state: StateValue) -> Result<(), HostError>;

    /// Read a state value
    async fn get_state(&self, id: &str) -> Result<Option<StateValue>, HostError>;

    /// Delete a state value (missing ids are not an error)
    async fn del_state(&self, id: &str) -> Result<(), HostError>;

    /// Subscribe to changes of states matching `pattern` (exact id or `prefix*`)
    async fn subscribe_states(&self, pattern: &str) -> Result<(), HostError>;

    /// Drop one subscription for `pattern`
    async fn unsubscribe_states(&self, pattern: &str) -> Result<(), HostError>;
}

/// Whether a subscription pattern matches a state id
pub fn pattern_matches(pattern: &str, id: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => id.starts_with(prefix),
        None => pattern == id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_enabled_flag() {
        let mut obj = StoreObject::instance("history.0", true);
        assert!(obj.is_enabled());
        obj.set_enabled(false);
        assert!(!obj.is_enabled());
        assert!(!StoreObject::folder("x").is_enabled());
    }

    #[test]
    fn test_object_json_shape() {
        let obj = StoreObject::state("summary", "json");
        let value = serde_json::to_value(&obj).unwrap();
        assert_eq!(value["type"], "state");
        assert_eq!(value["common"]["type"], "json");
    }

    #[test]
    fn test_pattern_matches() {
        assert!(pattern_matches("benchmark.0.a", "benchmark.0.a"));
        assert!(!pattern_matches("benchmark.0.a", "benchmark.0.ab"));
        assert!(pattern_matches("benchmark.0.*", "benchmark.0.ab"));
        assert!(pattern_matches("*", "anything"));
    }
}
