//! Total duration calculation
//!
//! Sums item durations, scales the sum by the playback speed and formats
//! the result as HH:MM:SS.

use std::sync::Arc;

use super::error::{CalculationError, ProbeError, ValidationError};
use super::item_store::VideoItem;
use super::state::{CalculationState, DurationSource};
use crate::probe::{
    DurationProber, ProbeJob, checked_duration, probe_files_parallel_with_callback,
};

/// Called after each item with (completed, total)
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Outcome of one calculate action
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregationResult {
    pub total_seconds: f64,
    /// Always > 0
    pub speed_factor: f64,
    pub adjusted_seconds: f64,
}

impl AggregationResult {
    fn new(total_seconds: f64, speed_factor: f64) -> Self {
        Self {
            total_seconds,
            speed_factor,
            adjusted_seconds: total_seconds / speed_factor,
        }
    }

    /// Adjusted duration as HH:MM:SS
    pub fn formatted(&self) -> String {
        format_duration(self.adjusted_seconds)
    }

    /// The text shown in the result label
    pub fn label(&self) -> String {
        format!("Total Duration: {}", self.formatted())
    }
}

/// Everything a calculate action produced
#[derive(Debug, Clone)]
pub struct CalculationReport {
    pub result: AggregationResult,
    /// Files that could not be read; each counted as zero
    pub failures: Vec<ProbeError>,
    /// Items that contributed to the total (including failed ones)
    pub items_counted: usize,
    /// Items that were in scope for this run
    pub items_total: usize,
    pub cancelled: bool,
}

/// Format seconds as HH:MM:SS
///
/// Fractional seconds are truncated. Hours are zero-padded to two digits but
/// never cut, so 100 hours shows as "100:00:00".
pub fn format_duration(seconds: f64) -> String {
    let total_secs = if seconds.is_finite() && seconds > 0.0 {
        seconds.trunc() as u64
    } else {
        0
    };
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Sum the cached durations of items matching `filter`, in iteration order
pub fn total_duration<'a, I, P>(items: I, filter: P) -> f64
where
    I: IntoIterator<Item = &'a VideoItem>,
    P: Fn(&VideoItem) -> bool,
{
    items
        .into_iter()
        .filter(|item| filter(item))
        .map(|item| item.duration_seconds)
        .sum()
}

/// Check that a speed factor can be divided by
pub fn validate_speed(speed_factor: f64) -> Result<f64, ValidationError> {
    if !speed_factor.is_finite() {
        return Err(ValidationError::NotANumber(speed_factor.to_string()));
    }
    if speed_factor <= 0.0 {
        return Err(ValidationError::NonPositive(speed_factor));
    }
    Ok(speed_factor)
}

/// Parse the speed field ("1.0", "1.5", ...)
pub fn parse_speed(text: &str) -> Result<f64, ValidationError> {
    let trimmed = text.trim();
    let speed: f64 = trimmed
        .parse()
        .map_err(|_| ValidationError::NotANumber(trimmed.to_string()))?;
    validate_speed(speed)
}

/// Calculate the total duration of `items`, one item after another
///
/// With `DurationSource::Reprobe` each file is read again; a failed read is
/// recorded in the report and counts as zero. Cancellation (through `state`)
/// is checked between items and keeps whatever was summed so far.
pub fn calculate(
    items: &[&VideoItem],
    speed_factor: f64,
    source: DurationSource,
    prober: &dyn DurationProber,
    state: &CalculationState,
    on_progress: &dyn Fn(usize, usize),
) -> Result<CalculationReport, CalculationError> {
    let speed_factor = validate_speed(speed_factor)?;
    let items_total = items.len();
    state.reset(items_total);

    let mut total_seconds: f64 = 0.0;
    let mut failures = Vec::new();
    let mut items_counted = 0;
    let mut cancelled = false;

    for item in items {
        // Check for cancellation between items
        if state.is_cancelled() {
            log::info!(
                "Calculation cancelled after {}/{} items",
                items_counted,
                items_total
            );
            cancelled = true;
            break;
        }

        let seconds = match source {
            DurationSource::Cached => item.duration_seconds,
            DurationSource::Reprobe => match prober
                .probe(&item.path)
                .and_then(|seconds| checked_duration(&item.path, seconds))
            {
                Ok(seconds) => seconds,
                // Unreadable now; counts as zero
                Err(e) => {
                    log::warn!("{}", e);
                    state.increment_failed();
                    failures.push(e);
                    0.0
                }
            },
        };

        total_seconds += seconds;
        items_counted += 1;
        let completed = state.increment_completed();
        on_progress(completed, items_total);
    }

    state.finish();

    // Speed is applied once, to the whole sum
    let result = AggregationResult::new(total_seconds, speed_factor);
    log::info!(
        "Total {:.3}s over {} items at {}x: {}",
        total_seconds,
        items_counted,
        speed_factor,
        result.formatted()
    );

    Ok(CalculationReport {
        result,
        failures,
        items_counted,
        items_total,
        cancelled,
    })
}

/// Calculate by re-probing every item on a bounded worker pool
///
/// Results are summed in item order once all probes are in. On cancellation
/// no new probes start, and probes still running are dropped from the sum.
pub async fn calculate_parallel(
    items: &[&VideoItem],
    speed_factor: f64,
    prober: Arc<dyn DurationProber>,
    worker_count: usize,
    state: &CalculationState,
    on_progress: ProgressFn,
) -> Result<CalculationReport, CalculationError> {
    let speed_factor = validate_speed(speed_factor)?;
    let items_total = items.len();
    state.reset(items_total);

    // Job index is the item's position, so the sum keeps item order
    let jobs: Vec<ProbeJob> = items
        .iter()
        .enumerate()
        .map(|(index, item)| ProbeJob {
            index,
            path: item.path.clone(),
        })
        .collect();

    let run = probe_files_parallel_with_callback(
        prober,
        jobs,
        worker_count,
        state.clone(),
        move |completed, total| on_progress(completed, total),
    )
    .await;
    // Mark the calculation over even if the pool failed
    state.finish();
    let run = run?;

    let mut total_seconds: f64 = 0.0;
    let mut failures = Vec::new();
    for outcome in &run.outcomes {
        match &outcome.result {
            Ok(seconds) => total_seconds += *seconds,
            Err(e) => {
                log::warn!("{}", e);
                failures.push(e.clone());
            }
        }
    }

    if run.was_cancelled {
        log::info!(
            "Calculation cancelled after {}/{} items",
            run.outcomes.len(),
            items_total
        );
    }

    let result = AggregationResult::new(total_seconds, speed_factor);
    log::info!(
        "Total {:.3}s over {} items at {}x: {}",
        total_seconds,
        run.outcomes.len(),
        speed_factor,
        result.formatted()
    );

    Ok(CalculationReport {
        result,
        failures,
        items_counted: run.outcomes.len(),
        items_total,
        cancelled: run.was_cancelled,
    })
}
