use thiserror::Error;

/// Reasons a parameter set is refused before a run starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing parameter {0}")]
    MissingParameter(char),
    #[error("node count N must be positive, got {0}")]
    NonPositiveNodeCount(i64),
    #[error("packet length L must be positive, got {0}")]
    NonPositivePacketLength(i64),
    #[error("max retransmissions M must be positive, got {0}")]
    NonPositiveMaxRetries(i64),
    #[error("simulation time T must be positive, got {0}")]
    NonPositiveDuration(i64),
    #[error("backoff table R is empty")]
    EmptyBackoffTable,
    #[error("backoff table entry {index} is {value}, moduli must be positive")]
    NonPositiveModulus { index: usize, value: i64 },
    #[error("backoff table has {len} entries but M = {max_retries} needs at least {max_retries}")]
    BackoffTableTooShort { len: usize, max_retries: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("malformed value for parameter {tag} at byte {offset}: {reason}")]
    Parse {
        tag: char,
        offset: usize,
        reason: String,
    },
    #[error("utilization is undefined over zero ticks")]
    DivisionByZero,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
