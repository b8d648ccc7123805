use crate::error::{FixtureError, Result};
use serde::Deserialize;
use std::fmt;
use tracing::info;

/// OS signals that end a stub cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => f.write_str("SIGINT"),
            ShutdownSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Resolves with the first of `signals` delivered to the process. An empty
/// set never resolves.
pub async fn wait_for(signals: &[ShutdownSignal]) -> Result<ShutdownSignal> {
    let interrupt = signals.contains(&ShutdownSignal::Interrupt);
    let terminate = signals.contains(&ShutdownSignal::Terminate);

    let ctrl_c = async {
        if interrupt {
            tokio::signal::ctrl_c().await.map_err(FixtureError::Signal)
        } else {
            std::future::pending().await
        }
    };

    #[cfg(unix)]
    let term = async {
        if terminate {
            let mut stream =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .map_err(FixtureError::Signal)?;
            stream.recv().await;
            Ok::<(), FixtureError>(())
        } else {
            std::future::pending().await
        }
    };

    #[cfg(not(unix))]
    let term = async {
        let _ = terminate;
        std::future::pending::<Result<()>>().await
    };

    let received = tokio::select! {
        res = ctrl_c => res.map(|_| ShutdownSignal::Interrupt)?,
        res = term => res.map(|_| ShutdownSignal::Terminate)?,
    };
    info!("I received a signal: {}", received);
    Ok(received)
}
