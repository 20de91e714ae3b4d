use std::path::PathBuf;

/// Failure to enumerate the scripts directory at startup.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Cannot read scripts directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read entry in scripts directory {}: {source}", path.display())]
    ReadEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A duration string that does not follow the `1h30m` / `250ms` grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationParseError {
    #[error("Empty duration")]
    Empty,

    #[error("Invalid duration '{0}'")]
    Invalid(String),

    #[error("Missing unit in duration '{0}'")]
    MissingUnit(String),

    #[error("Unknown unit '{unit}' in duration '{input}'")]
    UnknownUnit { unit: String, input: String },

    #[error("Duration '{0}' is out of range")]
    Overflow(String),
}
