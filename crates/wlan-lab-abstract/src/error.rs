use thiserror::Error;

/// Failures reported by a simulation engine implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine context is not acquired")]
    NotAcquired,
    #[error("engine context is already acquired")]
    AlreadyAcquired,
    #[error("no scenario installed in the engine context")]
    NotInstalled,
    #[error("invalid engine configuration: {0}")]
    InvalidConfiguration(String),
    #[error("failed to launch engine `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("engine exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("malformed engine output: {0}")]
    Malformed(String),
}

/// Errors surfaced to the caller of a sweep.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid variant {0}, expected a value in 1..=5")]
    InvalidVariant(u8),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("need at least {required} samples, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },
    #[error("invalid data rate `{0}`")]
    InvalidRate(String),
    #[error("variant {0} requires a streaming rate")]
    MissingStreamingRate(u8),
    #[error("station count {0} is outside 1..=22")]
    InvalidStationCount(u32),
}
