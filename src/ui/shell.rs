//! Line-oriented shell
//!
//! Reads commands from stdin, dispatches them to the session and prints the
//! result. Errors are printed and the loop carries on.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use super::commands::{self, Command};
use super::render;
use super::session::{CheckOp, Session};

/// Whether the shell should keep reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Run one command against the session, writing output to `out`
pub fn execute<W: Write>(session: &mut Session, command: Command, out: &mut W) -> io::Result<Flow> {
    match command {
        Command::Add(paths) => {
            let summary = session.add_files(&paths);
            writeln!(out, "{}", render::render_add_summary(&summary))?;
        }
        Command::Nest { row, paths } => match session.add_children(row, &paths) {
            Ok(summary) => writeln!(out, "{}", render::render_add_summary(&summary))?,
            Err(e) => writeln!(out, "Error: {}", e)?,
        },
        Command::Drop(entries) => {
            let summary = session.drop_urls(&entries);
            writeln!(out, "{}", render::render_add_summary(&summary))?;
        }
        Command::List => {
            write!(out, "{}", render::render_items(session.store()))?;
            writeln!(out, "{}", render::render_footer(session.store(), session.settings()))?;
        }
        Command::Check(rows) => set_rows(session, &rows, CheckOp::Check, out)?,
        Command::Uncheck(rows) => set_rows(session, &rows, CheckOp::Uncheck, out)?,
        Command::Toggle(rows) => set_rows(session, &rows, CheckOp::Toggle, out)?,
        Command::CheckAll => session.check_all(true),
        Command::UncheckAll => session.check_all(false),
        Command::Remove => {
            let removed = session.remove_checked();
            writeln!(out, "Removed {} item(s)", removed.len())?;
        }
        Command::Clear => session.clear(),
        Command::Speed(None) => writeln!(out, "Speed: {}", session.speed_input())?,
        Command::Speed(Some(text)) => session.set_speed_input(&text),
        Command::Calc => calculate(session, out)?,
        Command::Set { key, value } => {
            if let Err(e) = session.set_setting(&key, &value) {
                writeln!(out, "Error: {}", e)?;
            }
        }
        Command::Settings => {
            writeln!(out, "{}", render::render_settings(session.settings()))?;
            writeln!(out, "Speed: {}", session.speed_input())?;
        }
        Command::Help => write!(out, "{}", render::HELP_TEXT)?,
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn set_rows<W: Write>(
    session: &mut Session,
    rows: &[usize],
    op: CheckOp,
    out: &mut W,
) -> io::Result<()> {
    if let Err(e) = session.set_rows(rows, op) {
        writeln!(out, "Error: {}", e)?;
    }
    Ok(())
}

fn calculate<W: Write>(session: &mut Session, out: &mut W) -> io::Result<()> {
    // Progress goes straight to stderr so it shows while probing
    let progress = Arc::new(|completed: usize, total: usize| {
        let mut stderr = io::stderr();
        let _ = write!(stderr, "{}", render::render_progress(completed, total));
        let _ = stderr.flush();
    });

    let outcome = session.calculate_with_progress(progress);
    let (_, _, total) = session.calculation_state().progress();
    if total > 0 {
        eprintln!();
    }

    match outcome {
        Ok(report) => writeln!(out, "{}", render::render_report(&report, session.result_label()))?,
        Err(e) => {
            writeln!(out, "Error: {}", e)?;
            writeln!(out, "{}", session.result_label())?;
        }
    }
    Ok(())
}

/// Read commands from `input` until it ends or `quit` is entered
pub fn run<R: BufRead, W: Write>(session: &mut Session, input: R, out: &mut W) -> io::Result<()> {
    write_prompt(out)?;
    for line in input.lines() {
        let line = line?;
        match commands::parse(&line) {
            Ok(Some(command)) => {
                log::debug!("Command: {}", line.trim());
                if execute(session, command, out)? == Flow::Quit {
                    return Ok(());
                }
            }
            Ok(None) => {}
            Err(e) => writeln!(out, "Error: {}", e)?,
        }
        write_prompt(out)?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_prompt<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, "> ")?;
    out.flush()
}

/// Run the shell on stdin and stdout
pub fn run_shell(session: &mut Session) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    writeln!(stdout, "Video Duration Calculator. Type 'help' for commands.")?;
    run(session, stdin.lock(), &mut stdout)
}
