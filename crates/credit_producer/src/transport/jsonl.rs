//! JSON-lines file transport.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use tracing::info;

use super::{EventTransport, SequenceMarker};
use crate::error::TransportError;

/// Appends one JSON object per line to a file.
///
/// A local stand-in for a broker stream: every line is one record, in
/// publish order.
#[derive(Debug)]
pub struct JsonLinesTransport {
    name: String,
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    sequence: AtomicU64,
}

impl JsonLinesTransport {
    /// Opens `path` for appending, creating it and its parent directories.
    pub async fn open(
        name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Self, TransportError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        let name = name.into();
        info!(stream = %name, path = %path.display(), "JSON-lines transport opened");
        Ok(Self {
            name,
            path,
            writer: Mutex::new(BufWriter::new(file)),
            sequence: AtomicU64::new(0),
        })
    }

    /// File being written.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EventTransport for JsonLinesTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(
        &self,
        _event_id: &str,
        _partition_key: &str,
        payload: &[u8],
    ) -> Result<SequenceMarker, TransportError> {
        let mut writer = self.writer.lock().await;
        writer.write_all(payload).await?;
        writer.write_all(b"\n").await?;

        let sequence_number = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SequenceMarker {
            shard_id: self.path.display().to_string(),
            sequence_number,
        })
    }

    async fn flush(&self) -> Result<(), TransportError> {
        self.writer.lock().await.flush().await?;
        Ok(())
    }
}
