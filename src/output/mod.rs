mod throttle;

pub use throttle::Throttle;

use crate::config::Variant;
use crate::error::{FixtureError, Result};
use crate::measure::Measurement;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use tracing::{debug, info, trace};

struct Inner {
    // None once closed
    writer: Option<BufWriter<File>>,
    throttle: Option<Throttle>,
}

/// Append-only measurement file, one decimal value per line.
///
/// Lines sit in memory until [`OutputWriter::close`]; nothing is flushed per
/// write, so a crash loses whatever was buffered.
pub struct OutputWriter {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl OutputWriter {
    /// Creates the file, truncating anything already there.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        info!("Going to create/append file: {}", path.display());

        let file = File::create(&path)
            .await
            .map_err(|source| FixtureError::OpenOutput {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            inner: Mutex::new(Inner {
                writer: Some(BufWriter::new(file)),
                throttle: None,
            }),
        })
    }

    /// Opens the output with the throttle the variant asks for, if any.
    pub async fn for_variant(path: impl AsRef<Path>, variant: Variant) -> Result<Self> {
        let output = Self::create(path).await?;
        Ok(match variant.min_write_interval() {
            Some(interval) => output.with_min_interval(interval),
            None => output,
        })
    }

    /// Only keep a measurement when `min_interval` has passed since the last
    /// one that was kept.
    pub fn with_min_interval(self, min_interval: Duration) -> Self {
        let mut inner = self.inner.into_inner();
        inner.throttle = Some(Throttle::new(min_interval));
        Self {
            path: self.path,
            inner: Mutex::new(inner),
        }
    }

    /// Buffers one line. Returns `false` if the throttle dropped it.
    pub async fn record(&self, measurement: &Measurement) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        let Inner { writer, throttle } = &mut *inner;

        let writer = writer.as_mut().ok_or(FixtureError::Closed)?;

        let now = Instant::now();
        if let Some(gate) = throttle.as_ref() {
            if !gate.is_open(now) {
                debug!("Throttled measurement {}", measurement);
                return Ok(false);
            }
        }

        let line = format!("{}\n", measurement);
        writer.write_all(line.as_bytes()).await?;
        if let Some(gate) = throttle.as_mut() {
            gate.wrote(now);
        }
        trace!("Recorded {}", measurement);
        Ok(true)
    }

    /// Flushes and closes the file. Calling it again does nothing.
    pub async fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let Some(mut writer) = inner.writer.take() else {
            debug!("Output {} already closed", self.path.display());
            return Ok(());
        };

        writer.flush().await?;
        writer.shutdown().await?;
        info!("Flushed and closed {}", self.path.display());
        Ok(())
    }
}

pub type SharedOutput = Arc<OutputWriter>;
