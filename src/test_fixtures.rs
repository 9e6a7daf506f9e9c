//! Test fixtures for duration probing tests
//!
//! Writes real media files of a known length and provides a scripted
//! prober for tests that should not touch the disk.

#![cfg(test)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::core::ProbeError;
use crate::probe::DurationProber;

const WAV_SAMPLE_RATE: u32 = 8000;

/// Write a silent 16-bit mono PCM WAV file of the given length
///
/// # Arguments
/// * `dir` - Directory to write into
/// * `name` - Base name for the file (without extension)
/// * `duration_secs` - Duration in seconds
///
/// # Returns
/// Path to the generated file
pub fn write_wav(dir: &Path, name: &str, duration_secs: f64) -> PathBuf {
    let frames = (duration_secs * WAV_SAMPLE_RATE as f64).round() as u32;
    let block_align: u16 = 2;
    let data_len = frames * block_align as u32;

    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&WAV_SAMPLE_RATE.to_le_bytes());
    bytes.extend_from_slice(&(WAV_SAMPLE_RATE * block_align as u32).to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());

    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 0);

    let path = dir.join(format!("{}.wav", name));
    std::fs::write(&path, bytes).expect("Failed to write WAV fixture");
    path
}

/// Write a file that no backend can read
pub fn write_garbage(dir: &Path, file_name: &str) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, b"this is not a media container at all").expect("Failed to write fixture");
    path
}

/// Scripted prober: answers from a path map and counts calls
///
/// Paths that were never registered fail with "no such file".
#[derive(Default)]
pub struct FakeProber {
    answers: Mutex<HashMap<PathBuf, Result<f64, String>>>,
    delays: Mutex<HashMap<PathBuf, Duration>>,
    calls: AtomicUsize,
}

impl FakeProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, path: &Path, seconds: f64) -> Self {
        self.set_duration(path, seconds);
        self
    }

    /// Answer `seconds` for `path`, but only after blocking for `delay`
    pub fn slow(self, path: &Path, seconds: f64, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(path.to_path_buf(), delay);
        self.with(path, seconds)
    }

    pub fn failing(self, path: &Path, message: &str) -> Self {
        self.set_failure(path, message);
        self
    }

    /// Change the answer for a path, as if the file changed on disk
    pub fn set_duration(&self, path: &Path, seconds: f64) {
        self.answers
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), Ok(seconds));
    }

    pub fn set_failure(&self, path: &Path, message: &str) {
        self.answers
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), Err(message.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DurationProber for FakeProber {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn probe(&self, path: &Path) -> Result<f64, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.lock().unwrap().get(path).copied();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        match self.answers.lock().unwrap().get(path) {
            Some(Ok(seconds)) => Ok(*seconds),
            Some(Err(message)) => Err(ProbeError::new(path, message.clone())),
            None => Err(ProbeError::new(path, "no such file")),
        }
    }
}
