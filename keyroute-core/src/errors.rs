use thiserror::Error;

/// Fatal topology errors, surfaced eagerly at load time.
///
/// The engine must not start in an invalid state; this is the only error
/// class allowed to terminate the embedding process.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("duplicate partition id: {0}")]
    DuplicatePartition(String),

    #[error("duplicate rule for resource: {0}")]
    DuplicateRule(String),

    #[error("rule '{rule}' references unknown partition '{partition}'")]
    UnknownPartition { rule: String, partition: String },

    #[error("rule '{0}' has an empty target partition list")]
    EmptyTargets(String),

    #[error("rule '{0}' has a replication_factor below 1")]
    InvalidReplicationFactor(String),

    #[error("partition '{0}' sets both hash_range and key_range")]
    ConflictingRanges(String),

    #[error("rule '{rule}': partition '{partition}' is missing the {expected} required by its strategy")]
    MissingRange {
        rule: String,
        partition: String,
        expected: &'static str,
    },

    #[error("rule '{rule}': partitions '{first}' and '{second}' have overlapping ranges")]
    OverlappingRanges {
        rule: String,
        first: String,
        second: String,
    },

    #[error("rule '{rule}': configured ranges do not cover the full {space}")]
    IncompleteCoverage { rule: String, space: &'static str },

    #[error("default partition '{0}' is not registered")]
    UnknownDefaultPartition(String),

    #[error("failed to parse topology config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Partition registry operation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("partition id already registered: {0}")]
    DuplicateId(String),

    #[error("partition not found: {0}")]
    NotFound(String),
}

/// Errors surfaced by backend collaborators (probe, stats, directory).
///
/// These never propagate to routing callers; they are absorbed into
/// fallback behavior plus observability events.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("probe failed: {0}")]
    Probe(String),

    #[error("stats collection failed: {0}")]
    Stats(String),

    #[error("directory lookup failed: {0}")]
    Directory(String),
}
