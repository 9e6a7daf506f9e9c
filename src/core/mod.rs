//! Core application logic and state
//!
//! This module contains:
//! - The item store (the list of video files and their checked flags)
//! - Total duration calculation and HH:MM:SS formatting
//! - Error types shown to the user
//! - Session settings and calculation progress state

mod aggregate;
mod error;
mod item_store;
mod state;

pub use aggregate::{
    CalculationReport, ProgressFn, calculate, calculate_parallel, format_duration, parse_speed,
    total_duration,
};
pub use error::{CalculationError, ProbeError};
pub use item_store::{ItemId, ItemStore, VideoItem};
pub use state::{AppSettings, CalculationState, ProbeBackend};
