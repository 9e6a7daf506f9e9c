use std::path::Path;

use lofty::{AudioFile, Probe};

use super::{DurationProber, checked_duration};
use crate::core::ProbeError;

/// Reads durations from container properties with lofty
///
/// Lofty reports an unknown duration as zero, which is treated as a
/// failure so a fallback chain moves on to the next backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyProber;

impl DurationProber for LoftyProber {
    fn name(&self) -> &'static str {
        "lofty"
    }

    fn probe(&self, path: &Path) -> Result<f64, ProbeError> {
        // Detect the container from its content, not the extension
        let tagged_file = Probe::open(path)
            .map_err(|e| ProbeError::new(path, format!("Failed to open file: {}", e)))?
            .guess_file_type()
            .map_err(|e| ProbeError::new(path, format!("Failed to detect file type: {}", e)))?
            .read()
            .map_err(|e| ProbeError::new(path, format!("Failed to read file: {}", e)))?;

        // Read properties (duration, bitrate, etc.)
        let duration = tagged_file.properties().duration();
        if duration.is_zero() {
            return Err(ProbeError::new(path, "Container does not report a duration"));
        }

        checked_duration(path, duration.as_secs_f64())
    }
}
