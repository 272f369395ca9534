//! Error types for machine assembly and configuration.
//!
//! This module defines the failure taxonomy of the simulation driver. It provides:
//! 1. **Configuration errors:** Unknown registry keys, empty required settings, and
//!    connection declarations naming unregistered controllers.
//! 2. **Resource limits:** Context-pool exhaustion during core construction.
//!
//! All of these are unrecoverable by construction (nothing can run without a valid
//! machine graph), so callers surface them as a diagnostic and abort. Cycle-time
//! conditions are never reported here: cores communicate abnormal outcomes through
//! their termination vote, and log/stats I/O problems are handled at the point of use.

use thiserror::Error;

/// Fatal errors raised while validating configuration or assembling a machine.
#[derive(Debug, Error)]
pub enum MachineError {
    /// The requested machine template was never registered.
    ///
    /// Carries the list of registered templates so the diagnostic can name
    /// what *is* available.
    #[error("machine template `{name}` is not registered (registered templates: {available})")]
    UnknownTemplate {
        /// Template key that failed to resolve.
        name: String,
        /// Comma-separated registered template keys.
        available: String,
    },

    /// A machine generator requested a core type with no registered builder.
    #[error("core type `{0}` is not registered")]
    UnknownCoreType(String),

    /// A machine generator requested a cache-controller type with no registered builder.
    #[error("cache controller type `{0}` is not registered")]
    UnknownControllerType(String),

    /// A connection declaration named an interconnect type with no registered builder.
    #[error("interconnect type `{0}` is not registered")]
    UnknownInterconnectType(String),

    /// A connection attachment named a controller that was never added to the machine.
    #[error("connection `{connection}` references unregistered controller `{controller}`")]
    UnknownController {
        /// Instance name of the connection being materialized.
        connection: String,
        /// Controller instance name that failed to resolve.
        controller: String,
    },

    /// Two controllers were added under the same instance name.
    #[error("duplicate controller instance name `{0}`")]
    DuplicateController(String),

    /// `machine_config` was empty; a template name is required.
    #[error("machine_config must name a machine template")]
    EmptyTemplateName,

    /// `cores_per_worker` was zero; worker assignment needs a positive granularity.
    #[error("cores_per_worker must be positive")]
    ZeroWorkerGranularity,

    /// The fixed-size architectural context pool has no free slots left.
    #[error("context pool exhausted ({limit} contexts)")]
    ContextPoolExhausted {
        /// Architectural maximum number of contexts.
        limit: usize,
    },
}
