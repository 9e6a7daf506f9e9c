//! Logging configuration for Video Duration Calculator
//!
//! Logs are written to both the terminal and a file at:
//! `~/Library/Logs/Video-Duration-Calculator/video-duration-calc.log`
//! (`<data_local_dir>/Video-Duration-Calculator/logs/` elsewhere)

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "Video-Duration-Calculator";
const LOG_FILE_NAME: &str = "video-duration-calc.log";

/// Log files larger than this are moved aside at startup
const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

/// Get the log directory path
/// On macOS: ~/Library/Logs/Video-Duration-Calculator/
pub fn get_log_directory() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        dirs::home_dir().map(|h| h.join("Library").join("Logs").join(APP_DIR_NAME))
    } else {
        dirs::data_local_dir().map(|d| d.join(APP_DIR_NAME).join("logs"))
    }
}

/// Log file path inside `log_dir`
fn log_file_in(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE_NAME)
}

/// Move `log_path` to `<name>.old` once it grows past `max_bytes`
///
/// Returns true if the file was rotated.
fn rotate_if_large(log_path: &Path, max_bytes: u64) -> bool {
    // No file yet means nothing to rotate
    let Ok(metadata) = fs::metadata(log_path) else {
        return false;
    };
    if metadata.len() <= max_bytes {
        return false;
    }

    // Replaces any previous backup
    let mut backup = log_path.as_os_str().to_owned();
    backup.push(".old");
    fs::rename(log_path, PathBuf::from(backup)).is_ok()
}

fn log_config() -> Config {
    // Timestamps only, no thread or target columns
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build()
}

/// Initialize the logging system
///
/// Sets up combined logging to:
/// - Terminal (info and above)
/// - File (debug and above)
///
/// Returns the path to the log file on success
pub fn init_logging() -> Option<PathBuf> {
    // Get log directory
    let log_dir = match get_log_directory() {
        Some(d) => d,
        None => {
            eprintln!("Warning: Could not determine log directory");
            init_terminal_only();
            return None;
        }
    };

    // Create log directory if it doesn't exist
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Could not create log directory: {}", e);
        init_terminal_only();
        return None;
    }

    let log_path = log_file_in(&log_dir);
    if rotate_if_large(&log_path, MAX_LOG_BYTES) {
        eprintln!("Log file over {} bytes, moved to .old", MAX_LOG_BYTES);
    }

    // Open log file (append mode)
    let log_file = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file: {}", e);
            init_terminal_only();
            return None;
        }
    };

    // Terminal gets info and up, the file also gets debug
    let config = log_config();
    let loggers: Vec<Box<dyn SharedLogger>> = vec![
        TermLogger::new(LevelFilter::Info, config.clone(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(LevelFilter::Debug, config, log_file),
    ];

    // Initialize combined logger
    if CombinedLogger::init(loggers).is_err() {
        eprintln!("Warning: Logger already initialized");
    }

    log::info!("=== Video Duration Calculator session started ===");
    log::info!("Log file: {}", log_path.display());

    Some(log_path)
}

/// Initialize terminal-only logging (fallback if file logging fails)
fn init_terminal_only() {
    let term_logger = TermLogger::new(
        LevelFilter::Info,
        log_config(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
    let _ = CombinedLogger::init(vec![term_logger]);
}
