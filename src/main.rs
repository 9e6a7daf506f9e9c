//! Video Duration Calculator
//!
//! Builds a list of video files and adds up their playback time, adjusted
//! for a playback speed.

mod core;
mod logging;
mod probe;
mod ui;

#[cfg(test)]
mod test_fixtures;

use std::path::PathBuf;
use std::process::ExitCode;

use ui::Session;

fn main() -> ExitCode {
    // Initialize logging first
    logging::init_logging();

    let mut session = match Session::new() {
        Ok(session) => session,
        Err(e) => {
            log::error!("Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Files handed over on launch (e.g. "Open With") are added right away
    let opened: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if !opened.is_empty() {
        let summary = session.add_files(&opened);
        println!("{}", ui::render::render_add_summary(&summary));
    }

    if let Err(e) = ui::run_shell(&mut session) {
        log::error!("Shell stopped: {}", e);
        return ExitCode::FAILURE;
    }

    log::info!("Session ended");
    ExitCode::SUCCESS
}
