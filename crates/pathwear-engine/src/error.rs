//! Error types for the Pathwear engine binary.
//!
//! [`EngineError`] wraps every failure that can abort startup or the final
//! shutdown so that `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: pathwear_core::config::ConfigError,
    },

    /// The sandbox world could not be built.
    #[error("surface error: {source}")]
    Surface {
        /// The underlying surface error.
        #[from]
        source: pathwear_world::SurfaceError,
    },

    /// The wear loop failed to shut down cleanly.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: pathwear_core::runner::RunnerError,
    },

    /// The `sandbox` config section was malformed.
    #[error("sandbox error: {message}")]
    Sandbox {
        /// Description of the sandbox failure.
        message: String,
    },

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {message}")]
    Signal {
        /// Description of the signal failure.
        message: String,
    },
}
