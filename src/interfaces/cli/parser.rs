use uuid::Uuid;

use super::CliError;
use crate::utils::looks_like_short_code;

/// A parsed REPL line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Exit,
    /// `None` starts a fresh session user
    Login {
        user_id: Option<Uuid>,
    },
    Whoami,
    Create {
        url: String,
        max_clicks: Option<u32>,
        description: Option<String>,
    },
    List,
    Stats {
        code: String,
        /// Print the statistics as JSON
        json: bool,
    },
    Edit {
        code: String,
        max_clicks: u32,
    },
    Deactivate {
        code: String,
    },
    Delete {
        code: String,
    },
    Goto {
        code: String,
    },
    /// A bare short code typed at the prompt
    Resolve {
        code: String,
    },
    SetEmail {
        email: String,
    },
    Expired,
    Cleanup,
}

/// Parse one input line. Blank lines yield `Ok(None)`.
///
/// Keywords are case-insensitive. A single token that is not a keyword but
/// looks like a short code resolves that code.
pub fn parse_command(line: &str) -> Result<Option<Command>, CliError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, args)) = parts.split_first() else {
        return Ok(None);
    };

    let keyword = head.to_lowercase();
    let command = match keyword.as_str() {
        "help" | "?" => Command::Help,
        "exit" | "quit" => Command::Exit,
        "login" => parse_login(args)?,
        "whoami" => Command::Whoami,
        "create" => parse_create(args)?,
        "list" => Command::List,
        "stats" => match args {
            [code] => Command::Stats {
                code: code.to_string(),
                json: false,
            },
            [code, "--json"] => Command::Stats {
                code: code.to_string(),
                json: true,
            },
            _ => return Err(usage("stats <shortCode> [--json]")),
        },
        "edit" => parse_edit(args)?,
        "deactivate" => Command::Deactivate {
            code: single_code("deactivate", args)?,
        },
        "delete" => Command::Delete {
            code: single_code("delete", args)?,
        },
        "goto" => Command::Goto {
            code: single_code("goto", args)?,
        },
        "set-email" => match args {
            [email] => Command::SetEmail {
                email: email.to_string(),
            },
            _ => return Err(usage("set-email <email>")),
        },
        "expired" => Command::Expired,
        "cleanup" => Command::Cleanup,
        // 关键字已在上面匹配，剩下的单个词按短码处理
        _ if args.is_empty() && looks_like_short_code(head) => Command::Resolve {
            code: head.to_string(),
        },
        _ => {
            return Err(CliError::ParseError(format!(
                "Unknown command: '{}'. Type 'help' for available commands.",
                head
            )));
        }
    };

    Ok(Some(command))
}

fn usage(text: &str) -> CliError {
    CliError::ParseError(format!("Usage: {}", text))
}

fn single_code(command: &str, args: &[&str]) -> Result<String, CliError> {
    match args {
        [code] => Ok(code.to_string()),
        _ => Err(usage(&format!("{} <shortCode>", command))),
    }
}

fn parse_login(args: &[&str]) -> Result<Command, CliError> {
    match args {
        [] => Ok(Command::Login { user_id: None }),
        [raw] => Uuid::parse_str(raw)
            .map(|id| Command::Login { user_id: Some(id) })
            .map_err(|_| CliError::ParseError(format!("Invalid UUID format: '{}'", raw))),
        _ => Err(usage("login [userId]")),
    }
}

fn parse_max_clicks(raw: &str) -> Result<u32, CliError> {
    raw.parse::<u32>().map_err(|_| {
        CliError::ParseError(format!("Max clicks must be a positive number, got '{}'", raw))
    })
}

/// `create <url> [maxClicks] [description...]`
///
/// The second token is taken as the quota only when it is numeric;
/// otherwise it starts the description.
fn parse_create(args: &[&str]) -> Result<Command, CliError> {
    let Some((&url, rest)) = args.split_first() else {
        return Err(usage("create <URL> [maxClicks] [description]"));
    };

    let (max_clicks, description_words) = match rest.split_first() {
        Some((&first, tail)) if first.parse::<i64>().is_ok() => {
            (Some(parse_max_clicks(first)?), tail)
        }
        _ => (None, rest),
    };

    let description = (!description_words.is_empty()).then(|| description_words.join(" "));

    Ok(Command::Create {
        url: url.to_string(),
        max_clicks,
        description,
    })
}

fn parse_edit(args: &[&str]) -> Result<Command, CliError> {
    match args {
        [code, max_clicks] => Ok(Command::Edit {
            code: code.to_string(),
            max_clicks: parse_max_clicks(max_clicks)?,
        }),
        _ => Err(usage("edit <shortCode> <newMaxClicks>")),
    }
}
