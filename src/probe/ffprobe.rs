//! ffprobe subprocess handling for duration lookups

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde::Deserialize;

use super::{DurationProber, checked_duration};
use crate::core::ProbeError;

#[cfg(windows)]
const FFPROBE_BINARY: &str = "ffprobe.exe";
#[cfg(not(windows))]
const FFPROBE_BINARY: &str = "ffprobe";

/// The slice of `ffprobe -show_format` output we care about
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    /// Seconds, printed as a decimal string (or "N/A")
    duration: Option<String>,
}

/// Reads durations by running an ffprobe binary
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    binary: PathBuf,
}

impl FfprobeProber {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }

    /// Find ffprobe next to the app or on PATH
    pub fn locate() -> Result<Self, String> {
        get_ffprobe_path().map(Self::new)
    }
}

impl DurationProber for FfprobeProber {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    fn probe(&self, path: &Path) -> Result<f64, ProbeError> {
        // -v error          : Only print real errors on stderr
        // -print_format json: Machine readable output
        // -show_format      : Container level info, including duration
        let result = Command::new(&self.binary)
            .arg("-v")
            .arg("error")
            .arg("-print_format")
            .arg("json")
            .arg("-show_format")
            .arg(path)
            .output();

        handle_ffprobe_result(result, path)
    }
}

/// Turn the ffprobe process result into a duration
fn handle_ffprobe_result(
    result: Result<Output, std::io::Error>,
    path: &Path,
) -> Result<f64, ProbeError> {
    // Spawn failures mean the binary is missing or not executable
    let output = result.map_err(|e| ProbeError::new(path, format!("Failed to spawn ffprobe: {}", e)))?;

    if !output.status.success() {
        // Last stderr line is usually the useful one
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProbeError::new(
            path,
            format!(
                "ffprobe exited with status {}: {}",
                output.status,
                stderr.lines().last().unwrap_or("Unknown error")
            ),
        ));
    }

    parse_duration(&output.stdout, path)
}

/// Extract `format.duration` from ffprobe's JSON
fn parse_duration(stdout: &[u8], path: &Path) -> Result<f64, ProbeError> {
    let parsed: FfprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| ProbeError::new(path, format!("Failed to parse ffprobe output: {}", e)))?;

    // Streams without a container duration report "N/A" or nothing
    let raw = parsed
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| ProbeError::new(path, "ffprobe reported no duration"))?;

    let seconds = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| ProbeError::new(path, format!("ffprobe reported an unreadable duration: {}", raw)))?;

    checked_duration(path, seconds)
}

/// Get the path to an ffprobe binary
///
/// Looks for a bundled copy first (resources/bin/ffprobe under the manifest
/// dir in development, next to the executable in release), then searches PATH.
pub fn get_ffprobe_path() -> Result<PathBuf, String> {
    // Development: bundled binary in the source tree
    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let dev_path = PathBuf::from(manifest_dir)
            .join("resources")
            .join("bin")
            .join(FFPROBE_BINARY);

        if dev_path.is_file() {
            log::debug!("Found ffprobe at development path: {:?}", dev_path);
            return Ok(dev_path);
        }
    }

    // Release: bundled next to the executable
    if let Ok(exe_path) = std::env::current_exe()
        && let Some(exe_dir) = exe_path.parent()
    {
        let local_path = exe_dir.join("resources").join("bin").join(FFPROBE_BINARY);
        if local_path.is_file() {
            log::debug!("Found ffprobe at local path: {:?}", local_path);
            return Ok(local_path);
        }
    }

    // Fall back to whatever is installed
    if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            let candidate = dir.join(FFPROBE_BINARY);
            if candidate.is_file() {
                log::debug!("Found ffprobe on PATH: {:?}", candidate);
                return Ok(candidate);
            }
        }
    }

    Err("ffprobe binary not found in resources/bin or on PATH".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        let json = br#"{"format": {"filename": "a.mkv", "duration": "3661.250000"}}"#;
        let seconds = parse_duration(json, Path::new("a.mkv")).unwrap();
        assert_eq!(seconds, 3661.25);
    }

    #[test]
    fn test_parse_duration_missing_field() {
        let json = br#"{"format": {"filename": "a.mkv"}}"#;
        let err = parse_duration(json, Path::new("a.mkv")).unwrap_err();
        assert!(err.message.contains("no duration"));
    }

    #[test]
    fn test_parse_duration_not_available() {
        let json = br#"{"format": {"duration": "N/A"}}"#;
        assert!(parse_duration(json, Path::new("a.avi")).is_err());
    }

    #[test]
    fn test_parse_duration_empty_output() {
        // ffprobe prints "{}" when the container could not be read
        assert!(parse_duration(b"{}", Path::new("a.avi")).is_err());
        assert!(parse_duration(b"", Path::new("a.avi")).is_err());
    }

    #[test]
    fn test_missing_binary_is_a_probe_error() {
        let prober = FfprobeProber::new(PathBuf::from("/nonexistent/ffprobe"));
        let err = prober.probe(Path::new("/videos/a.mp4")).unwrap_err();
        assert!(err.message.starts_with("Failed to spawn ffprobe"));
        assert_eq!(err.path, PathBuf::from("/videos/a.mp4"));
    }
}
