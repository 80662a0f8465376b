use std::io::{BufRead, Write};

use colored::Colorize;
use tracing::debug;

use super::CliError;
use super::parser::parse_command;
use super::session::{Flow, Session};

fn prompt(session: &Session) -> String {
    match session.current_user() {
        Some(id) => {
            let id = id.to_string();
            format!("quotalink({})> ", &id[..8])
        }
        None => "quotalink> ".to_string(),
    }
}

/// Read commands from `input` until `exit` or end of input.
///
/// Command failures are printed and the loop continues; only I/O errors on
/// the terminal end it.
pub fn run_repl<R: BufRead, W: Write>(
    session: &mut Session,
    mut input: R,
    out: &mut W,
) -> Result<(), CliError> {
    writeln!(
        out,
        "{} Type {} for commands, {} to leave",
        "quotalink".bold().magenta(),
        "help".cyan(),
        "exit".cyan()
    )?;

    let mut line = String::new();
    loop {
        write!(out, "{}", prompt(session).bold())?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            debug!("CLI: end of input");
            writeln!(out)?;
            break;
        }

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(out, "{}", e.format_colored())?;
                continue;
            }
        };

        match session.execute(command, out) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(CliError::IoError(e)) => return Err(CliError::IoError(e)),
            Err(e) => {
                debug!("CLI: command failed: {}", e);
                writeln!(out, "{}", e.format_colored())?;
            }
        }
    }

    Ok(())
}
