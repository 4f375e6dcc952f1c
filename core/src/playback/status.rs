use std::fmt;

/// Human-readable lifecycle state of the visualizer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Stopped,
    Ended,
    Error(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => f.write_str("Select an audio file to begin"),
            Status::Loading => f.write_str("Loading audio..."),
            Status::Ready => f.write_str("Ready: press play"),
            Status::Playing => f.write_str("Playing"),
            Status::Paused => f.write_str("Paused"),
            Status::Stopped => f.write_str("Stopped"),
            Status::Ended => f.write_str("Playback finished"),
            Status::Error(reason) => write!(f, "Error: {reason}"),
        }
    }
}

/// Human-readable state of the capture recorder.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RecordingStatus {
    #[default]
    Ready,
    Preparing,
    Recording,
    Finalizing,
    Completed { extension: String, bitrate: u32 },
    Failed(String),
}

impl fmt::Display for RecordingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingStatus::Ready => f.write_str("Ready to record"),
            RecordingStatus::Preparing => f.write_str("Preparing recording..."),
            RecordingStatus::Recording => f.write_str("Recording... (plays the whole track)"),
            RecordingStatus::Finalizing => f.write_str("Finalizing video..."),
            RecordingStatus::Completed { extension, bitrate } => write!(
                f,
                "Video saved as {} ({} Mbps)",
                extension.to_uppercase(),
                bitrate / 1_000_000
            ),
            RecordingStatus::Failed(reason) => write!(f, "Recording failed: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_carries_reason() {
        assert_eq!(Status::Error("device busy".into()).to_string(), "Error: device busy");
        assert_eq!(Status::default().to_string(), "Select an audio file to begin");
    }

    #[test]
    fn test_completed_recording_reports_format() {
        let status = RecordingStatus::Completed {
            extension: "gif".into(),
            bitrate: 10_000_000,
        };
        assert_eq!(status.to_string(), "Video saved as GIF (10 Mbps)");
    }
}
