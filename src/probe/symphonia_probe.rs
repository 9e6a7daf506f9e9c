use std::fs::File;
use std::path::Path;

use symphonia::core::codecs::CodecParameters;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::{DurationProber, checked_duration};
use crate::core::ProbeError;

/// Reads durations with symphonia's in-process demuxers
///
/// Covers MKV, MP4/MOV (audio tracks), WAV, OGG and the other containers
/// symphonia ships with the `all` feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaProber;

impl DurationProber for SymphoniaProber {
    fn name(&self) -> &'static str {
        "symphonia"
    }

    fn probe(&self, path: &Path) -> Result<f64, ProbeError> {
        // Open the file
        let file = File::open(path)
            .map_err(|e| ProbeError::new(path, format!("Failed to open file: {}", e)))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Create a hint to help the format registry guess the format
        let mut hint = Hint::new();
        if let Some(ext) = path.extension() {
            hint.with_extension(&ext.to_string_lossy());
        }

        // Use default options for format and metadata
        let format_opts = FormatOptions::default();
        let metadata_opts = MetadataOptions::default();

        // Probe the media source
        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &format_opts, &metadata_opts)
            .map_err(|e| ProbeError::new(path, format!("Failed to probe container: {}", e)))?;

        // The longest track is the playback length of the container
        let duration = probed
            .format
            .tracks()
            .iter()
            .filter_map(|track| track_duration(&track.codec_params))
            .fold(None, |longest: Option<f64>, d| Some(longest.map_or(d, |l| l.max(d))))
            .ok_or_else(|| ProbeError::new(path, "No track reports a duration"))?;

        checked_duration(path, duration)
    }
}

/// Duration of one track from its frame count
fn track_duration(params: &CodecParameters) -> Option<f64> {
    let n_frames = params.n_frames?;

    // Prefer the track's own time base
    if let Some(time_base) = params.time_base {
        let time = time_base.calc_time(n_frames);
        return Some(time.seconds as f64 + time.frac);
    }

    // Audio tracks without one count in samples
    match params.sample_rate {
        Some(rate) if rate > 0 => Some(n_frames as f64 / rate as f64),
        _ => None,
    }
}
