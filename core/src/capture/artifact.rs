//! Export artifacts and where they end up.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::info;

use super::encoder::VideoCodec;

/// `music-visualizer-[transparent-]<millis>.<ext>`
pub fn artifact_file_name(transparent: bool, timestamp_millis: u128, extension: &str) -> String {
    let variant = if transparent { "transparent-" } else { "" };
    format!("music-visualizer-{variant}{timestamp_millis}.{extension}")
}

pub(crate) fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// One finished recording.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub codec: VideoCodec,
    pub transparent: bool,
    pub bitrate: u32,
    /// Frames handed to the encoder.
    pub frames: u64,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn extension(&self) -> &'static str {
        self.codec.extension()
    }

    pub fn mime_type(&self) -> &'static str {
        self.codec.mime_type()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Receives every finished artifact.
pub trait ArtifactSink {
    fn deliver(&mut self, artifact: &ExportArtifact) -> std::io::Result<()>;
}

/// Keeps artifacts in memory. Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct MemorySink(Rc<RefCell<Vec<ExportArtifact>>>);

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts(&self) -> Vec<ExportArtifact> {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

impl ArtifactSink for MemorySink {
    fn deliver(&mut self, artifact: &ExportArtifact) -> std::io::Result<()> {
        self.0.borrow_mut().push(artifact.clone());
        Ok(())
    }
}

/// Writes each artifact into a directory under its file name.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Rc<RefCell<Vec<PathBuf>>>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Rc::default(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far, shared between clones.
    pub fn written(&self) -> Vec<PathBuf> {
        self.written.borrow().clone()
    }
}

impl ArtifactSink for DirectorySink {
    fn deliver(&mut self, artifact: &ExportArtifact) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(&artifact.file_name);
        fs::write(&path, &artifact.bytes)?;
        info!("saved {} ({} bytes)", path.display(), artifact.len());
        self.written.borrow_mut().push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(artifact_file_name(false, 1700000000123, "mp4"), "music-visualizer-1700000000123.mp4");
        assert_eq!(
            artifact_file_name(true, 42, "webm"),
            "music-visualizer-transparent-42.webm"
        );
    }

    #[test]
    fn test_memory_sink_clones_share_storage() {
        let sink = MemorySink::new();
        let mut handle = sink.clone();
        let artifact = ExportArtifact {
            file_name: "a.gif".into(),
            codec: VideoCodec::Gif,
            transparent: false,
            bitrate: 8_000_000,
            frames: 1,
            bytes: vec![1, 2, 3],
        };
        handle.deliver(&artifact).unwrap();
        assert_eq!(sink.artifacts(), vec![artifact]);
        assert_eq!(sink.artifacts()[0].mime_type(), "image/gif");
    }
}
