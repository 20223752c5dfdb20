//! Error types for host collaborators and workloads

use storebench_ipc::TransportError;
use thiserror::Error;

/// Failure reported by a host collaborator (store or probe)
#[derive(Debug, Error)]
pub enum HostError {
    /// No object definition under this id
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// State write without a matching object
    #[error("State {0} has no object definition")]
    MissingObject(String),

    /// Store rejected or could not serve the call
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Probed process no longer exists
    #[error("Process {0} not found")]
    ProcessNotFound(u32),

    /// Value could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure inside a workload phase
#[derive(Debug, Error)]
pub enum WorkloadError {
    /// Store or probe failure
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// Message could not be delivered
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A secondary answered with an error ack
    #[error("Instance {instance} rejected {command}: {message}")]
    Rejected {
        /// Secondary instance id
        instance: String,
        /// Command name
        command: String,
        /// Error carried in the ack
        message: String,
    },

    /// Workload cannot run with the given context
    #[error("Invalid workload setup: {0}")]
    Invalid(String),
}
