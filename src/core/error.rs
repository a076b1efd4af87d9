//=========================================================================
// Error Types
//=========================================================================
//
// Crate-wide error taxonomy.
//
// Families:
//   NotFound       → lookup misses (scene, activity, resource, biome, ...)
//   Precondition   → insufficient resources, invalid state for operation
//   Configuration  → malformed content, unknown action types/functions
//   Persistence    → storage read/write failures
//
// Lookup and precondition failures are recovered locally by the caller
// (log + abandon the operation). Configuration failures inside an
// activity session move it to an "unable to continue" state.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::path::PathBuf;

use thiserror::Error;

//=== GameError ===========================================================

/// Unified error type for core operations.
#[derive(Debug, Error)]
pub enum GameError {
    /// Neither the key nor the reference name resolved to a scene.
    #[error("Scene not found: {target} (reference: {reference:?})")]
    SceneNotFound {
        target: String,
        reference: Option<String>,
    },

    /// A content lookup missed.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Inventory cannot cover an activity's requirements.
    #[error(
        "Activity {activity} requires {required} of {resource}, but only {available} available"
    )]
    InsufficientResources {
        activity: String,
        resource: String,
        required: u32,
        available: u32,
    },

    /// Operation not allowed in the current state.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Content or runtime configuration cannot be executed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Storage failure.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Static content failed to load or validate.
    #[error(transparent)]
    Content(#[from] ContentError),
}

impl GameError {
    /// Creates a lookup-miss error.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a precondition error.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Whether this error must end an activity session rather than be
    /// retried by the player.
    pub fn is_fatal_to_session(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Configuration(_) | Self::Content(_)
        )
    }
}

//=== PersistenceError ====================================================

/// Storage read/write failures.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Player record could not be (de)serialized: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Backend refused the write (used by in-memory backends).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

//=== ContentError ========================================================

/// Static content load and validation failures.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Could not read content file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse content {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Every problem found by the validation pass.
    #[error("Content failed validation ({} problem(s)): {}", .0.len(), .0.join("; "))]
    Invalid(Vec<String>),
}

/// Crate result alias.
pub type GameResult<T> = Result<T, GameError>;

//=========================================================================
// Unit Tests
//=========================================================================
