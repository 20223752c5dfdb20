//! IPC Message Types
//!
//! All messages are serialized with rkyv and validated on read.

use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};

/// Whether a load request creates or removes its entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum LoadAction {
    /// Create `count` numbered entries
    Set,
    /// Delete `count` numbered entries
    Del,
}

/// Storage load applied by a secondary (`objects` / `states` commands)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct LoadRequest {
    /// Create or delete
    pub action: LoadAction,
    /// Number of numbered entries (`0..count`)
    pub count: u32,
}

impl LoadRequest {
    /// Create `count` entries
    pub fn set(count: u32) -> Self {
        Self {
            action: LoadAction::Set,
            count,
        }
    }

    /// Delete `count` entries
    pub fn del(count: u32) -> Self {
        Self {
            action: LoadAction::Del,
            count,
        }
    }
}

/// Series measured on a secondary between `startMeasuring` and `stopMeasuring`
#[derive(Debug, Clone, Default, PartialEq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct MonitoringReport {
    /// Elapsed seconds of the measuring session
    pub time: Vec<f64>,
    /// CPU usage samples in percent
    pub cpu_stats: Vec<f64>,
    /// Memory samples in bytes
    pub mem_stats: Vec<f64>,
    /// Scheduler lag samples in milliseconds
    pub event_loop_lags: Vec<f64>,
}

/// Commands understood by StoreBench instances
#[derive(Debug, Clone, PartialEq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub enum Command {
    /// Primary: run the full workload suite
    Test,
    /// Primary: run a single workload by id. Unknown ids are ignored.
    Workload(String),
    /// Primary: monitoring series reported by a secondary
    RequestedMonitoring(MonitoringReport),
    /// Secondary: create or delete numbered objects
    Objects(LoadRequest),
    /// Secondary: write or delete numbered states
    States(LoadRequest),
    /// Secondary: start local sampling under the reserved key
    StartMeasuring,
    /// Secondary: stop sampling and report back to the primary
    StopMeasuring,
}

impl Command {
    /// Wire-level command name
    pub fn name(&self) -> &str {
        match self {
            Command::Test => "test",
            Command::Workload(id) => id,
            Command::RequestedMonitoring(_) => "requestedMonitoring",
            Command::Objects(_) => "objects",
            Command::States(_) => "states",
            Command::StartMeasuring => "startMeasuring",
            Command::StopMeasuring => "stopMeasuring",
        }
    }

    /// Build a payload-free command from its name.
    ///
    /// Names that are not a fixed command are treated as workload ids.
    /// Commands carrying a payload need their typed constructor.
    pub fn from_name(name: &str) -> Result<Self, String> {
        match name {
            "test" => Ok(Command::Test),
            "startMeasuring" => Ok(Command::StartMeasuring),
            "stopMeasuring" => Ok(Command::StopMeasuring),
            "requestedMonitoring" | "objects" | "states" => {
                Err(format!("command '{}' requires a payload", name))
            }
            "" => Err("empty command name".to_string()),
            other => Ok(Command::Workload(other.to_string())),
        }
    }

    /// Whether this command is handled by the primary role
    pub fn is_primary_command(&self) -> bool {
        matches!(
            self,
            Command::Test | Command::Workload(_) | Command::RequestedMonitoring(_)
        )
    }
}

/// Routed command with sender and target instance ids
#[derive(Debug, Clone, PartialEq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct Envelope {
    /// Protocol version of the sender
    pub protocol_version: u32,
    /// Sending instance id (e.g. `benchmark.1`)
    pub from: String,
    /// Target instance id
    pub to: String,
    /// The command itself
    pub command: Command,
}

impl Envelope {
    /// Wrap a command at the current protocol version
    pub fn new(from: impl Into<String>, to: impl Into<String>, command: Command) -> Self {
        Self {
            protocol_version: crate::PROTOCOL_VERSION,
            from: from.into(),
            to: to.into(),
            command,
        }
    }
}

/// Acknowledgement returned for every inbound envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, RkyvSerialize, RkyvDeserialize)]
#[archive(check_bytes)]
pub struct Ack {
    /// Set when the receiver failed to apply a synchronous command
    pub error: Option<String>,
}

impl Ack {
    /// Acknowledgement carrying an error description
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
        }
    }

    /// Whether the receiver reported success
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names() {
        assert_eq!(Command::Test.name(), "test");
        assert_eq!(Command::Workload("setStates".into()).name(), "setStates");
        assert_eq!(Command::Objects(LoadRequest::set(5)).name(), "objects");
        assert_eq!(Command::States(LoadRequest::del(5)).name(), "states");
        assert_eq!(Command::StartMeasuring.name(), "startMeasuring");
        assert_eq!(Command::StopMeasuring.name(), "stopMeasuring");
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Command::from_name("test").unwrap(), Command::Test);
        assert_eq!(
            Command::from_name("idle").unwrap(),
            Command::Workload("idle".to_string())
        );
        assert!(Command::from_name("objects").is_err());
        assert!(Command::from_name("").is_err());
    }

    #[test]
    fn test_primary_commands() {
        assert!(Command::Test.is_primary_command());
        assert!(Command::RequestedMonitoring(MonitoringReport::default()).is_primary_command());
        assert!(!Command::StartMeasuring.is_primary_command());
        assert!(!Command::States(LoadRequest::set(1)).is_primary_command());
    }

    #[test]
    fn test_envelope_version() {
        let env = Envelope::new("benchmark.1", "benchmark.0", Command::Test);
        assert_eq!(env.protocol_version, crate::PROTOCOL_VERSION);
    }

    #[test]
    fn test_ack() {
        assert!(Ack::default().is_ok());
        assert!(!Ack::error("boom").is_ok());
    }
}
