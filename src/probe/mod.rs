//! Duration probing
//!
//! Reads the playback duration of a media file from its container metadata.
//! Three backends are available and can be chained:
//! - symphonia (in-process demuxers)
//! - lofty (container properties, good at MP4/MOV)
//! - ffprobe (external binary, understands everything ffmpeg does)

pub mod detection;
mod ffprobe;
mod lofty_probe;
mod parallel;
mod symphonia_probe;

pub use detection::is_video_file;
pub use ffprobe::FfprobeProber;
pub use lofty_probe::LoftyProber;
pub use parallel::{ProbeJob, probe_files_parallel_with_callback};
pub use symphonia_probe::SymphoniaProber;

use std::path::Path;
use std::sync::Arc;

use crate::core::{ProbeBackend, ProbeError};

/// Reads a single duration, in seconds, for a file on disk
///
/// Implementations must not keep the file open after returning.
pub trait DurationProber: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    fn probe(&self, path: &Path) -> Result<f64, ProbeError>;
}

/// Reject durations that cannot be shown or summed
pub(crate) fn checked_duration(path: &Path, seconds: f64) -> Result<f64, ProbeError> {
    if !seconds.is_finite() {
        return Err(ProbeError::new(path, "Duration is not a finite number"));
    }
    if seconds < 0.0 {
        return Err(ProbeError::new(
            path,
            format!("Duration is negative ({:.3}s)", seconds),
        ));
    }
    Ok(seconds)
}

/// Tries each prober in turn and returns the first duration found
pub struct FallbackProber {
    probers: Vec<Box<dyn DurationProber>>,
}

impl FallbackProber {
    pub fn new(probers: Vec<Box<dyn DurationProber>>) -> Self {
        Self { probers }
    }
}

impl DurationProber for FallbackProber {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn probe(&self, path: &Path) -> Result<f64, ProbeError> {
        let mut messages = Vec::new();

        for prober in &self.probers {
            match prober.probe(path) {
                Ok(seconds) => {
                    log::debug!(
                        "{} read {:.3}s from {}",
                        prober.name(),
                        seconds,
                        path.display()
                    );
                    return Ok(seconds);
                }
                Err(e) => {
                    log::debug!("{} failed on {}: {}", prober.name(), path.display(), e.message);
                    messages.push(format!("{}: {}", prober.name(), e.message));
                }
            }
        }

        if messages.is_empty() {
            return Err(ProbeError::new(path, "No duration backend available"));
        }
        Err(ProbeError::new(path, messages.join("; ")))
    }
}

/// Build the prober selected in the settings
///
/// `Auto` chains symphonia, lofty and (when the binary can be found) ffprobe.
pub fn build_prober(backend: ProbeBackend) -> Result<Arc<dyn DurationProber>, String> {
    let prober: Arc<dyn DurationProber> = match backend {
        ProbeBackend::Symphonia => Arc::new(SymphoniaProber),
        ProbeBackend::Lofty => Arc::new(LoftyProber),
        ProbeBackend::Ffprobe => Arc::new(FfprobeProber::locate()?),
        ProbeBackend::Auto => {
            let mut chain: Vec<Box<dyn DurationProber>> =
                vec![Box::new(SymphoniaProber), Box::new(LoftyProber)];
            match FfprobeProber::locate() {
                Ok(ffprobe) => chain.push(Box::new(ffprobe)),
                Err(e) => log::debug!("ffprobe fallback disabled: {}", e),
            }
            Arc::new(FallbackProber::new(chain))
        }
    };
    log::debug!("Using duration backend: {}", prober.name());
    Ok(prober)
}
