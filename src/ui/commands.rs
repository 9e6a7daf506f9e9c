//! Shell command parsing
//!
//! One line of input becomes one `Command`. Arguments are split on
//! whitespace; single or double quotes keep spaces inside a path, and a
//! backslash escapes the next character.

use std::path::PathBuf;

/// Commands understood by the shell
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Add files to the top level of the list
    Add(Vec<PathBuf>),
    /// Add files under the item at a list row
    Nest { row: usize, paths: Vec<PathBuf> },
    /// Add dropped `file://` URLs or paths
    Drop(Vec<String>),
    List,
    Check(Vec<usize>),
    Uncheck(Vec<usize>),
    Toggle(Vec<usize>),
    CheckAll,
    UncheckAll,
    /// Remove checked items
    Remove,
    /// Remove every item
    Clear,
    /// Show (None) or replace the speed field
    Speed(Option<String>),
    Calc,
    Set { key: String, value: String },
    Settings,
    Help,
    Quit,
}

/// Parse one input line
///
/// Returns `Ok(None)` for blank lines and `#` comments.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let mut args = tokenize(line)?;
    if args.is_empty() || args[0].starts_with('#') {
        return Ok(None);
    }
    let name = args.remove(0).to_lowercase();

    let command = match name.as_str() {
        "add" | "open" => Command::Add(require_paths(&name, args)?),
        "nest" => {
            if args.is_empty() {
                return Err("usage: nest <row> <path>...".to_string());
            }
            let row = parse_row(&args.remove(0))?;
            Command::Nest {
                row,
                paths: require_paths(&name, args)?,
            }
        }
        "drop" => {
            if args.is_empty() {
                return Err("usage: drop <url>...".to_string());
            }
            Command::Drop(args)
        }
        "list" | "ls" => no_args(&name, &args, Command::List)?,
        "check" => Command::Check(parse_rows(&name, &args)?),
        "uncheck" => Command::Uncheck(parse_rows(&name, &args)?),
        "toggle" => Command::Toggle(parse_rows(&name, &args)?),
        "all" => no_args(&name, &args, Command::CheckAll)?,
        "none" => no_args(&name, &args, Command::UncheckAll)?,
        "remove" | "rm" => no_args(&name, &args, Command::Remove)?,
        "clear" => no_args(&name, &args, Command::Clear)?,
        "speed" => match args.len() {
            0 => Command::Speed(None),
            1 => Command::Speed(args.pop()),
            _ => return Err("usage: speed [value]".to_string()),
        },
        "calc" | "calculate" => no_args(&name, &args, Command::Calc)?,
        "set" => {
            if args.len() != 2 {
                return Err("usage: set <key> <value>".to_string());
            }
            let value = args.remove(1);
            let key = args.remove(0);
            Command::Set { key, value }
        }
        "settings" => no_args(&name, &args, Command::Settings)?,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("Unknown command '{}' (try 'help')", other)),
    };

    Ok(Some(command))
}

fn no_args(name: &str, args: &[String], command: Command) -> Result<Command, String> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(format!("'{}' takes no arguments", name))
    }
}

fn require_paths(name: &str, args: Vec<String>) -> Result<Vec<PathBuf>, String> {
    if args.is_empty() {
        return Err(format!("usage: {} <path>...", name));
    }
    Ok(args.into_iter().map(PathBuf::from).collect())
}

fn parse_row(arg: &str) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(row) if row > 0 => Ok(row),
        _ => Err(format!("'{}' is not a row number", arg)),
    }
}

fn parse_rows(name: &str, args: &[String]) -> Result<Vec<usize>, String> {
    if args.is_empty() {
        return Err(format!("usage: {} <row>...", name));
    }
    args.iter().map(|a| parse_row(a)).collect()
}

/// Split a line into arguments
fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_token = true;
            }
            (None, '\\') => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
                in_token = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        return Err("Unterminated quote".to_string());
    }
    if in_token {
        args.push(current);
    }
    Ok(args)
}
