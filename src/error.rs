use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can take a stub down. None of these are retried.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Missing BENCH_OUTPUT environment variable")]
    MissingOutputPath,

    #[error("missing variant argument (expected one of: agent, agent-headers, upstream, upstream-throttled)")]
    MissingVariant,

    #[error("unknown variant {0:?} (expected one of: agent, agent-headers, upstream, upstream-throttled)")]
    UnknownVariant(String),

    #[error("unable to load overrides from {}: {source}", path.display())]
    Overrides {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Unable to create/append {} because {source}", path.display())]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Content-Length has {count} separate values: {values:?}")]
    DuplicateContentLength { count: usize, values: Vec<String> },

    #[error("Unable to write to output: {0}")]
    Write(#[from] io::Error),

    #[error("output already closed")]
    Closed,

    #[error("unable to install signal handler: {0}")]
    Signal(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, FixtureError>;
