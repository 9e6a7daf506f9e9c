//! Application state types
//!
//! Contains shared state types used across the application:
//! - AppSettings: Session preferences, held in memory only
//! - CalculationState: Thread-safe progress and cancellation for a calculate run

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::VideoItem;

/// Upper bound for the parallel probe pool
pub const MAX_PROBE_WORKERS: usize = 8;

/// Where calculate takes each item's duration from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationSource {
    /// Use the duration read when the file was added
    #[default]
    Cached,
    /// Read every file again from disk
    Reprobe,
}

/// Which duration backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeBackend {
    /// symphonia, then lofty, then ffprobe when available
    #[default]
    Auto,
    Symphonia,
    Lofty,
    Ffprobe,
}

/// Which items count towards the total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Include {
    #[default]
    All,
    Checked,
}

impl Include {
    pub fn matches(&self, item: &VideoItem) -> bool {
        match self {
            Include::All => true,
            Include::Checked => item.checked,
        }
    }
}

macro_rules! keyword_enum {
    ($ty:ty, $what:literal, { $($name:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($name => Ok($variant),)+
                    other => Err(format!(
                        "Unknown {} '{}' (expected one of: {})",
                        $what,
                        other,
                        [$($name),+].join(", ")
                    )),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                $(if *self == $variant {
                    return write!(f, "{}", $name);
                })+
                Ok(())
            }
        }
    };
}

keyword_enum!(DurationSource, "duration source", {
    "cached" => DurationSource::Cached,
    "reprobe" => DurationSource::Reprobe,
});

keyword_enum!(ProbeBackend, "probe backend", {
    "auto" => ProbeBackend::Auto,
    "symphonia" => ProbeBackend::Symphonia,
    "lofty" => ProbeBackend::Lofty,
    "ffprobe" => ProbeBackend::Ffprobe,
});

keyword_enum!(Include, "include filter", {
    "all" => Include::All,
    "checked" => Include::Checked,
});

/// Session preferences
///
/// Never written to disk; every run starts from the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Cached add-time durations or a fresh read on every calculate
    #[serde(default)]
    pub duration_source: DurationSource,
    /// Backend used for duration reads
    #[serde(default)]
    pub probe_backend: ProbeBackend,
    /// Number of files probed at once when re-probing (1 = one after another)
    #[serde(default = "default_probe_workers")]
    pub probe_workers: usize,
    /// Items that count towards the total
    #[serde(default)]
    pub include: Include,
}

fn default_probe_workers() -> usize {
    1
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            duration_source: DurationSource::default(),
            probe_backend: ProbeBackend::default(),
            probe_workers: default_probe_workers(),
            include: Include::default(),
        }
    }
}

impl AppSettings {
    /// Names accepted by `set`
    pub const KEYS: [&'static str; 4] = ["duration_source", "probe_backend", "probe_workers", "include"];

    /// Change one setting by name
    ///
    /// On error the settings are left as they were.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "duration_source" => self.duration_source = value.parse()?,
            "probe_backend" => self.probe_backend = value.parse()?,
            "probe_workers" => {
                let workers: usize = value
                    .trim()
                    .parse()
                    .map_err(|_| format!("probe_workers must be a whole number, got '{}'", value))?;
                if !(1..=MAX_PROBE_WORKERS).contains(&workers) {
                    return Err(format!(
                        "probe_workers must be between 1 and {}",
                        MAX_PROBE_WORKERS
                    ));
                }
                self.probe_workers = workers;
            }
            "include" => self.include = value.parse()?,
            other => {
                return Err(format!(
                    "Unknown setting '{}' (expected one of: {})",
                    other,
                    Self::KEYS.join(", ")
                ));
            }
        }
        log::debug!("Setting {} = {}", key, value);
        Ok(())
    }

    /// Whether calculate should use the worker pool
    pub fn uses_parallel_probing(&self) -> bool {
        self.duration_source == DurationSource::Reprobe && self.probe_workers > 1
    }
}

/// Shared state for tracking calculation progress across threads
#[derive(Clone)]
pub struct CalculationState {
    /// Whether a calculation is currently running
    pub is_calculating: Arc<AtomicBool>,
    /// Whether cancellation has been requested
    pub cancel_requested: Arc<AtomicBool>,
    /// Number of items processed
    pub completed: Arc<AtomicUsize>,
    /// Number of items whose probe failed
    pub failed: Arc<AtomicUsize>,
    /// Total number of items in this run
    pub total: Arc<AtomicUsize>,
}

impl CalculationState {
    pub fn new() -> Self {
        Self {
            is_calculating: Arc::new(AtomicBool::new(false)),
            cancel_requested: Arc::new(AtomicBool::new(false)),
            completed: Arc::new(AtomicUsize::new(0)),
            failed: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Prepare for a new run over `total` items
    pub fn reset(&self, total: usize) {
        self.is_calculating.store(true, Ordering::SeqCst);
        self.cancel_requested.store(false, Ordering::SeqCst);
        self.completed.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    pub fn finish(&self) {
        self.is_calculating.store(false, Ordering::SeqCst);
    }

    /// Request cancellation of the current calculation
    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    pub fn is_calculating(&self) -> bool {
        self.is_calculating.load(Ordering::SeqCst)
    }

    /// Record a processed item, returning the new completed count
    pub fn increment_completed(&self) -> usize {
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Record a failed probe, returning the new failed count
    pub fn increment_failed(&self) -> usize {
        self.failed.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// (completed, failed, total)
    pub fn progress(&self) -> (usize, usize, usize) {
        (
            self.completed.load(Ordering::SeqCst),
            self.failed.load(Ordering::SeqCst),
            self.total.load(Ordering::SeqCst),
        )
    }
}

impl Default for CalculationState {
    fn default() -> Self {
        Self::new()
    }
}
