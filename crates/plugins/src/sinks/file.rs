//! File sink

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;

use optic_core::{Encoder, Event, Plugin, PluginError, PluginResult, Sink};

use crate::codecs::LineCodec;
use crate::PluginTable;

const KIND: &str = "file";
const DESCRIPTION: &str = "Send events to file(s).";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    files: Vec<String>,
}

enum Target {
    Stdout,
    Stderr,
    File(File),
}

impl Target {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        match self {
            Target::Stdout => std::io::stdout().write_all(buf),
            Target::Stderr => std::io::stderr().write_all(buf),
            Target::File(f) => f.write_all(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Target::Stdout => std::io::stdout().flush(),
            Target::Stderr => std::io::stderr().flush(),
            Target::File(f) => f.flush(),
        }
    }
}

/// Writes encoded events to one or more files; `stdout` and `stderr` are
/// recognised as special targets. Defaults to `stdout` when no files are
/// configured. The encoder defaults to the line codec and can be replaced
/// through the encoder-consumer capability.
pub struct FileSink {
    files: Vec<String>,
    encoder: Box<dyn Encoder>,
    targets: Mutex<Vec<Target>>,
}

impl FileSink {
    /// Sink writing to the given targets with the default line encoder.
    pub fn new(files: Vec<String>) -> Self {
        Self {
            files,
            encoder: Box::new(LineCodec::new()),
            targets: Mutex::new(Vec::new()),
        }
    }
}

pub(super) fn create(config: &PluginTable) -> PluginResult<Box<dyn Sink>> {
    let config: FileConfig = crate::from_table(config)?;
    Ok(Box::new(FileSink::new(config.files)))
}

impl Plugin for FileSink {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn connect(&self) -> PluginResult<()> {
        let mut targets = Vec::new();
        let files = if self.files.is_empty() {
            &["stdout".to_string()][..]
        } else {
            &self.files[..]
        };

        for file in files {
            let target = match file.as_str() {
                "stdout" => Target::Stdout,
                "stderr" => Target::Stderr,
                path => {
                    let f = OpenOptions::new().create(true).append(true).open(path)?;
                    Target::File(f)
                }
            };
            targets.push(target);
        }

        *self.targets.lock().unwrap() = targets;
        Ok(())
    }

    async fn close(&self) -> PluginResult<()> {
        let mut targets = self.targets.lock().unwrap();
        for target in targets.iter_mut() {
            target.flush()?;
        }
        targets.clear();
        Ok(())
    }

    async fn write(&self, events: &[Event]) -> PluginResult<()> {
        let mut targets = self.targets.lock().unwrap();
        for event in events {
            let encoded = self
                .encoder
                .encode(event)
                .map_err(|e| PluginError::message(format!("failed to encode event: {}", e)))?;
            for target in targets.iter_mut() {
                target.write_all(&encoded).map_err(|e| {
                    PluginError::message(format!("failed to write event: {}, {}", event, e))
                })?;
            }
        }
        Ok(())
    }

    fn set_encoder(&mut self, encoder: Box<dyn Encoder>) -> bool {
        self.encoder = encoder;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use optic_core::event::{Fields, Tags};
    use optic_core::Raw;

    fn raw_event(payload: &[u8]) -> Event {
        Event::Raw(Raw::new("test", payload, Tags::new(), Fields::new(), Utc::now()).unwrap())
    }

    #[tokio::test]
    async fn writes_encoded_events_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let sink = FileSink::new(vec![path.display().to_string()]);

        sink.connect().await.unwrap();
        sink.write(&[raw_event(b"one"), raw_event(b"two")]).await.unwrap();
        sink.close().await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "one\ntwo\n");
    }

    #[tokio::test]
    async fn append_on_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let sink = FileSink::new(vec![path.display().to_string()]);

        sink.connect().await.unwrap();
        sink.write(&[raw_event(b"first")]).await.unwrap();
        sink.close().await.unwrap();

        sink.connect().await.unwrap();
        sink.write(&[raw_event(b"second")]).await.unwrap();
        sink.close().await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }

    #[tokio::test]
    async fn encoder_can_be_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        let mut sink = FileSink::new(vec![path.display().to_string()]);

        assert!(sink.set_encoder(Box::new(LineCodec::new())));
    }
}
