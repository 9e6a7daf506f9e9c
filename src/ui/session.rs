//! Session state and command dispatch
//!
//! A `Session` owns everything that lives for one run of the program: the
//! item store, the speed field, the last result label and the settings.
//! The shell calls the named operations here and prints whatever comes back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::Runtime;

use super::drop::dropped_files;
use crate::core::{
    AppSettings, CalculationError, CalculationReport, CalculationState, ItemId, ItemStore,
    ProbeError, ProgressFn, VideoItem, calculate, calculate_parallel, parse_speed,
};
use crate::probe::{DurationProber, build_prober, is_video_file};

/// Text of the result label before the first calculation
pub const INITIAL_RESULT_LABEL: &str = "Total Duration: ";

/// Default contents of the speed field
pub const DEFAULT_SPEED_INPUT: &str = "1.0";

/// Outcome of adding a batch of files
#[derive(Debug, Default)]
pub struct AddSummary {
    /// Items created, in input order
    pub added: Vec<ItemId>,
    /// Files that could not be read; none of them are in the store
    pub failures: Vec<ProbeError>,
}

/// What a Ctrl-C does at the moment it arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// A calculation was running and has been asked to stop
    CancelCalculation,
    /// Nothing is running, so the program exits
    Exit,
}

/// Decide what a Ctrl-C means given the current calculation state
pub fn handle_interrupt(state: &CalculationState) -> InterruptAction {
    if state.is_calculating() {
        state.request_cancel();
        InterruptAction::CancelCalculation
    } else {
        InterruptAction::Exit
    }
}

/// Checkbox operation applied to a set of rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOp {
    Check,
    Uncheck,
    Toggle,
}

pub struct Session {
    store: ItemStore,
    settings: AppSettings,
    speed_input: String,
    result_label: String,
    prober: Arc<dyn DurationProber>,
    calc_state: CalculationState,
    runtime: Runtime,
}

impl Session {
    /// Create a session with default settings and the default backend
    pub fn new() -> Result<Self, String> {
        let prober = build_prober(AppSettings::default().probe_backend)?;
        let session = Self::with_prober(prober)?;
        session.watch_interrupts();
        Ok(session)
    }

    /// Create a session that reads durations with `prober`
    pub fn with_prober(prober: Arc<dyn DurationProber>) -> Result<Self, String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| format!("Failed to start worker runtime: {}", e))?;

        Ok(Self {
            store: ItemStore::new(),
            settings: AppSettings::default(),
            speed_input: DEFAULT_SPEED_INPUT.to_string(),
            result_label: INITIAL_RESULT_LABEL.to_string(),
            prober,
            calc_state: CalculationState::new(),
            runtime,
        })
    }

    /// Listen for Ctrl-C for the rest of the program
    ///
    /// tokio never uninstalls its Ctrl-C handler, so there is one listener
    /// for the whole run rather than one per calculation.
    fn watch_interrupts(&self) {
        let state = self.calc_state.clone();
        self.runtime.spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                match handle_interrupt(&state) {
                    InterruptAction::CancelCalculation => {
                        log::info!("Interrupt received - cancelling calculation");
                    }
                    InterruptAction::Exit => {
                        log::info!("Interrupt received - exiting");
                        log::logger().flush();
                        std::process::exit(130);
                    }
                }
            }
        });
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn speed_input(&self) -> &str {
        &self.speed_input
    }

    pub fn result_label(&self) -> &str {
        &self.result_label
    }

    pub fn calculation_state(&self) -> &CalculationState {
        &self.calc_state
    }

    /// Add files to the top level, in order
    ///
    /// A file that cannot be read is reported and skipped; the rest are
    /// still added.
    pub fn add_files(&mut self, paths: &[PathBuf]) -> AddSummary {
        let mut summary = AddSummary::default();
        for path in paths {
            let result = self.store.add(path, &*self.prober);
            record_add(&mut summary, path, result);
        }
        summary
    }

    /// Add files as children of the item shown at `row`
    pub fn add_children(&mut self, row: usize, paths: &[PathBuf]) -> Result<AddSummary, String> {
        let parent = self.item_at(row).ok_or_else(|| no_such_row(row))?;
        let mut summary = AddSummary::default();
        for path in paths {
            let Some(result) = self.store.add_child(parent, path, &*self.prober) else {
                return Err(format!("Item {} is no longer in the list", parent));
            };
            record_add(&mut summary, path, result);
        }
        Ok(summary)
    }

    /// Add dropped entries that resolve to regular files
    ///
    /// Directories, missing files and non-`file` URLs are ignored.
    pub fn drop_urls<S: AsRef<str>>(&mut self, entries: &[S]) -> AddSummary {
        let files = dropped_files(entries);
        log::debug!("Drop: {} of {} entries are files", files.len(), entries.len());
        self.add_files(&files)
    }

    /// Item shown at a 1-based row of the list
    pub fn item_at(&self, row: usize) -> Option<ItemId> {
        let index = row.checked_sub(1)?;
        self.store.flatten().get(index).map(|item| item.id)
    }

    /// Apply a checkbox operation to rows
    ///
    /// If any row does not exist nothing is changed.
    pub fn set_rows(&mut self, rows: &[usize], op: CheckOp) -> Result<(), String> {
        // Resolve every row before touching anything
        let mut ids = Vec::with_capacity(rows.len());
        for &row in rows {
            ids.push(self.item_at(row).ok_or_else(|| no_such_row(row))?);
        }

        for id in ids {
            match op {
                CheckOp::Check => {
                    self.store.set_checked(id, true);
                }
                CheckOp::Uncheck => {
                    self.store.set_checked(id, false);
                }
                CheckOp::Toggle => {
                    self.store.toggle(id);
                }
            }
        }
        Ok(())
    }

    pub fn check_all(&mut self, checked: bool) {
        self.store.check_all(checked);
    }

    /// Empty the list; the last result label stays
    pub fn clear(&mut self) {
        self.store.clear();
        log::info!("List cleared");
    }

    /// Remove checked items, returning what was removed
    pub fn remove_checked(&mut self) -> Vec<VideoItem> {
        let removed = self.store.remove_checked();
        for item in &removed {
            log::info!("Removed {}", item.path.display());
        }
        removed
    }

    /// Replace the speed field; it is only validated on calculate
    pub fn set_speed_input(&mut self, text: &str) {
        self.speed_input = text.to_string();
    }

    /// Change a setting by name
    ///
    /// Switching the backend builds the new prober first, so a backend that
    /// is not available leaves the settings unchanged.
    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<(), String> {
        let mut updated = self.settings.clone();
        updated.set(key, value)?;

        // Only rebuild when the backend actually changed
        if updated.probe_backend != self.settings.probe_backend {
            self.prober = build_prober(updated.probe_backend)?;
        }
        self.settings = updated;
        log::info!("Setting {} changed to {}", key, value);
        Ok(())
    }

    /// Calculate the total duration without progress output
    #[cfg(test)]
    pub fn calculate(&mut self) -> Result<CalculationReport, CalculationError> {
        self.calculate_with_progress(Arc::new(|_: usize, _: usize| {}))
    }

    /// Calculate the total duration of the items selected by the settings
    ///
    /// On success the result label is replaced, also for a cancelled run
    /// (which keeps the partial total). On any error the label is left as
    /// it was.
    pub fn calculate_with_progress(
        &mut self,
        on_progress: ProgressFn,
    ) -> Result<CalculationReport, CalculationError> {
        let speed = parse_speed(&self.speed_input)?;

        let include = self.settings.include;
        let items: Vec<&VideoItem> = self
            .store
            .flatten()
            .into_iter()
            .filter(|item| include.matches(item))
            .collect();

        log::info!(
            "Calculating {} of {} items ({}, {} at {}x)",
            items.len(),
            self.store.len(),
            self.settings.duration_source,
            self.prober.name(),
            speed
        );

        // Parallel only when re-reading files with more than one worker
        let outcome = if self.settings.uses_parallel_probing() {
            self.runtime.block_on(calculate_parallel(
                &items,
                speed,
                self.prober.clone(),
                self.settings.probe_workers,
                &self.calc_state,
                on_progress,
            ))
        } else {
            calculate(
                &items,
                speed,
                self.settings.duration_source,
                &*self.prober,
                &self.calc_state,
                &*on_progress,
            )
        };

        match outcome {
            Ok(report) => {
                self.result_label = report.result.label();
                Ok(report)
            }
            Err(e) => {
                log::error!("Calculation failed: {}", e);
                Err(e)
            }
        }
    }
}

fn record_add(summary: &mut AddSummary, path: &Path, result: Result<&VideoItem, ProbeError>) {
    match result {
        Ok(item) => {
            if !is_video_file(path) {
                log::debug!("{} has no common video extension", path.display());
            }
            log::info!("Added {} ({})", item.display_name, item.duration_text());
            summary.added.push(item.id);
        }
        Err(e) => {
            log::warn!("{}", e);
            summary.failures.push(e);
        }
    }
}

fn no_such_row(row: usize) -> String {
    format!("No item at row {}", row)
}
