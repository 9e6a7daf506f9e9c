//! Parallel duration probing using tokio
//!
//! Probes multiple files concurrently with a bounded worker pool. Each probe
//! is blocking file I/O, so it runs on tokio's blocking thread pool while a
//! semaphore caps how many are in flight.

use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use super::{DurationProber, checked_duration};
use crate::core::{CalculationError, CalculationState, ProbeError};

/// A file to be probed
#[derive(Debug, Clone)]
pub struct ProbeJob {
    /// Position in the item list, used to restore order afterwards
    pub index: usize,
    pub path: PathBuf,
}

/// Result of probing one file
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub index: usize,
    pub result: Result<f64, ProbeError>,
}

/// Everything a parallel run produced
#[derive(Debug, Default)]
pub struct ProbeRun {
    /// Outcomes that finished before any cancellation, sorted by index
    pub outcomes: Vec<ProbeOutcome>,
    pub was_cancelled: bool,
}

/// Probe multiple files in parallel with a callback after each file completes
///
/// `on_file_complete` receives (completed, total) and runs on the worker
/// thread that finished the probe.
///
/// Setting the cancel flag in `state` stops new probes from starting. Probes
/// already in flight run to completion but their results are discarded.
pub async fn probe_files_parallel_with_callback<F>(
    prober: Arc<dyn DurationProber>,
    jobs: Vec<ProbeJob>,
    worker_count: usize,
    state: CalculationState,
    on_file_complete: F,
) -> Result<ProbeRun, CalculationError>
where
    F: Fn(usize, usize) + Send + Sync + 'static,
{
    let worker_count = worker_count.max(1);
    let semaphore = Arc::new(Semaphore::new(worker_count));
    let on_complete = Arc::new(on_file_complete);
    let total = jobs.len();

    log::debug!(
        "Starting parallel probe: {} files with {} workers",
        total,
        worker_count
    );

    let mut futures = FuturesUnordered::new();
    let mut was_cancelled = false;

    for job in jobs {
        // Check for cancellation before starting each new job
        if state.is_cancelled() {
            log::info!("Cancellation requested - skipping remaining files");
            was_cancelled = true;
            break;
        }

        // Acquire semaphore permit (waits if at capacity)
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| CalculationError::Unexpected(format!("Probe pool closed: {}", e)))?;

        // Waiting for a permit can take a while; look again before spawning
        if state.is_cancelled() {
            was_cancelled = true;
            break;
        }

        // Clone values for the blocking task
        let prober = prober.clone();
        let state = state.clone();
        let on_complete = on_complete.clone();

        let handle = tokio::task::spawn_blocking(move || {
            // Held until the callback has run
            let _permit = permit;
            let result = prober
                .probe(&job.path)
                .and_then(|seconds| checked_duration(&job.path, seconds));

            // Cancelled while this file was being read
            if state.is_cancelled() {
                log::debug!("Discarding in-flight result for {}", job.path.display());
                return None;
            }

            // Failures still count toward progress
            if result.is_err() {
                state.increment_failed();
            }
            let completed = state.increment_completed();
            log::debug!("Probed ({}/{}): {}", completed, total, job.path.display());
            on_complete(completed, total);

            Some(ProbeOutcome {
                index: job.index,
                result,
            })
        });

        futures.push(handle);
    }

    // Wait for all in-flight tasks to finish (even if cancelled)
    let mut outcomes = Vec::with_capacity(futures.len());
    let mut worker_failure = None;

    while let Some(joined) = futures.next().await {
        match joined {
            Ok(Some(outcome)) => outcomes.push(outcome),
            Ok(None) => was_cancelled = true,
            Err(e) => {
                worker_failure.get_or_insert_with(|| format!("Probe worker failed: {}", e));
            }
        }
    }

    if let Some(message) = worker_failure {
        return Err(CalculationError::Unexpected(message));
    }

    // The flag may have been set after the last job was scheduled
    if state.is_cancelled() {
        was_cancelled = true;
    }

    // Completion order is arbitrary; restore item order
    outcomes.sort_by_key(|o| o.index);
    Ok(ProbeRun {
        outcomes,
        was_cancelled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::FakeProber;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn jobs(paths: &[&str]) -> Vec<ProbeJob> {
        paths
            .iter()
            .enumerate()
            .map(|(index, p)| ProbeJob {
                index,
                path: PathBuf::from(p),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_parallel_probe_empty_jobs() {
        let prober: Arc<dyn DurationProber> = Arc::new(FakeProber::new());
        let callback_count = Arc::new(AtomicUsize::new(0));
        let callback_count_clone = callback_count.clone();

        let run = probe_files_parallel_with_callback(
            prober,
            Vec::new(),
            4,
            CalculationState::new(),
            move |_, _| {
                callback_count_clone.fetch_add(1, Ordering::SeqCst);
            },
        )
        .await
        .unwrap();

        assert!(run.outcomes.is_empty());
        assert!(!run.was_cancelled);
        assert_eq!(callback_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_parallel_probe_results_in_input_order() {
        let prober: Arc<dyn DurationProber> = Arc::new(
            FakeProber::new()
                .with(Path::new("/v/1.mp4"), 10.0)
                .with(Path::new("/v/2.mp4"), 20.0)
                .with(Path::new("/v/3.mp4"), 30.0)
                .with(Path::new("/v/4.mp4"), 40.0),
        );

        let run = probe_files_parallel_with_callback(
            prober,
            jobs(&["/v/1.mp4", "/v/2.mp4", "/v/3.mp4", "/v/4.mp4"]),
            3,
            CalculationState::new(),
            |_, _| {},
        )
        .await
        .unwrap();

        let indices: Vec<usize> = run.outcomes.iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        let total: f64 = run.outcomes.iter().filter_map(|o| o.result.as_ref().ok()).sum();
        assert_eq!(total, 100.0);
    }

    #[tokio::test]
    async fn test_parallel_probe_callback_invoked_per_file() {
        // Unknown paths fail, but callbacks still fire for each
        let prober: Arc<dyn DurationProber> = Arc::new(FakeProber::new());
        let state = CalculationState::new();
        state.reset(3);
        let callback_count = Arc::new(AtomicUsize::new(0));
        let callback_count_clone = callback_count.clone();

        let run = probe_files_parallel_with_callback(
            prober,
            jobs(&["/fake/1.mkv", "/fake/2.mkv", "/fake/3.mkv"]),
            2,
            state.clone(),
            move |_, _| {
                callback_count_clone.fetch_add(1, Ordering::SeqCst);
            },
        )
        .await
        .unwrap();

        assert_eq!(run.outcomes.len(), 3);
        assert!(run.outcomes.iter().all(|o| o.result.is_err()));
        assert_eq!(callback_count.load(Ordering::SeqCst), 3);
        assert_eq!(state.progress(), (3, 3, 3));
    }

    #[tokio::test]
    async fn test_parallel_probe_cancellation() {
        let prober = Arc::new(
            FakeProber::new()
                .with(Path::new("/v/1.mp4"), 1.0)
                .with(Path::new("/v/2.mp4"), 2.0),
        );
        let state = CalculationState::new();
        // Pre-cancel before starting
        state.request_cancel();

        let run = probe_files_parallel_with_callback(
            prober.clone(),
            jobs(&["/v/1.mp4", "/v/2.mp4"]),
            2,
            state,
            |_, _| {},
        )
        .await
        .unwrap();

        assert!(run.was_cancelled);
        assert!(run.outcomes.is_empty());
        assert_eq!(prober.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_from_callback_discards_later_results() {
        let prober: Arc<dyn DurationProber> = Arc::new(
            FakeProber::new()
                .with(Path::new("/v/1.mp4"), 1.0)
                .with(Path::new("/v/2.mp4"), 2.0)
                .with(Path::new("/v/3.mp4"), 3.0),
        );
        let state = CalculationState::new();
        let cancel_handle = state.clone();

        // One worker, so the cancel lands before the second probe starts
        let run = probe_files_parallel_with_callback(
            prober,
            jobs(&["/v/1.mp4", "/v/2.mp4", "/v/3.mp4"]),
            1,
            state,
            move |_, _| cancel_handle.request_cancel(),
        )
        .await
        .unwrap();

        assert!(run.was_cancelled);
        assert_eq!(run.outcomes.len(), 1);
        assert_eq!(run.outcomes[0].index, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slow_result_after_cancel_is_dropped() {
        let prober = Arc::new(
            FakeProber::new()
                .slow(Path::new("/v/slow.mp4"), 100.0, Duration::from_millis(300))
                .with(Path::new("/v/fast.mp4"), 2.0)
                .with(Path::new("/v/late.mp4"), 3.0),
        );
        let state = CalculationState::new();
        state.reset(3);
        let cancel_handle = state.clone();

        // Both workers start; the fast file cancels while the slow one is still reading
        let run = probe_files_parallel_with_callback(
            prober.clone(),
            jobs(&["/v/slow.mp4", "/v/fast.mp4", "/v/late.mp4"]),
            2,
            state.clone(),
            move |_, _| cancel_handle.request_cancel(),
        )
        .await
        .unwrap();

        assert!(run.was_cancelled);
        let indices: Vec<usize> = run.outcomes.iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![1]);
        assert_eq!(prober.calls(), 2);
        assert_eq!(state.progress(), (1, 0, 3));
    }

    #[tokio::test]
    async fn test_negative_duration_is_a_failure() {
        let prober: Arc<dyn DurationProber> = Arc::new(
            FakeProber::new()
                .with(Path::new("/v/1.mp4"), 10.0)
                .with(Path::new("/v/2.mp4"), -4.0),
        );
        let state = CalculationState::new();
        state.reset(2);

        let run = probe_files_parallel_with_callback(
            prober,
            jobs(&["/v/1.mp4", "/v/2.mp4"]),
            2,
            state.clone(),
            |_, _| {},
        )
        .await
        .unwrap();

        assert_eq!(run.outcomes[0].result, Ok(10.0));
        assert!(run.outcomes[1].result.as_ref().unwrap_err().message.contains("negative"));
        assert_eq!(state.progress(), (2, 1, 2));
    }
}
