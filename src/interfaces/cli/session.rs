//! REPL session state and command execution

use std::io::Write;
use std::sync::Arc;

use colored::Colorize;
use tracing::debug;
use uuid::Uuid;

use super::CliError;
use super::parser::Command;
use super::render::{state_label, write_help, write_link_table, write_statistics, write_user};
use crate::services::{CreateLinkRequest, ExpirySweeper, LinkRegistry};

/// What the REPL should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Session {
    registry: Arc<LinkRegistry>,
    sweeper: Option<Arc<ExpirySweeper>>,
    current_user: Option<Uuid>,
}

impl Session {
    pub fn new(registry: Arc<LinkRegistry>, sweeper: Option<Arc<ExpirySweeper>>) -> Self {
        Self {
            registry,
            sweeper,
            current_user: None,
        }
    }

    pub fn current_user(&self) -> Option<Uuid> {
        self.current_user
    }

    fn require_user(&self) -> Result<Uuid, CliError> {
        self.current_user.ok_or_else(|| {
            CliError::CommandError("Please login first using 'login' command".to_string())
        })
    }

    fn success<W: Write>(out: &mut W, message: &str) -> Result<(), CliError> {
        writeln!(out, "{} {}", "✓".bold().green(), message)?;
        Ok(())
    }

    fn info<W: Write>(out: &mut W, message: &str) -> Result<(), CliError> {
        writeln!(out, "{} {}", "ℹ".bold().blue(), message)?;
        Ok(())
    }

    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> Result<Flow, CliError> {
        debug!("CLI: executing {:?}", command);

        match command {
            Command::Help => {
                let settings = self.registry.settings();
                write_help(out, settings.default_ttl_hours, settings.default_max_clicks)?;
            }
            Command::Exit => {
                Self::info(out, "Goodbye")?;
                return Ok(Flow::Exit);
            }
            Command::Login { user_id } => self.login(user_id, out)?,
            Command::Whoami => match self.current_user {
                None => Self::info(out, "Not logged in (guest mode)")?,
                Some(id) => {
                    self.registry.reconcile_user_links(id);
                    let user = self.registry.users().find(id).ok_or_else(|| {
                        CliError::CommandError(format!("Session for {} has expired", id))
                    })?;
                    let links = self.registry.list_owned(id);
                    write_user(out, &user, &links)?;
                }
            },
            Command::Create {
                url,
                max_clicks,
                description,
            } => {
                let owner = match self.current_user {
                    Some(id) => id,
                    None => {
                        let id = self.registry.login(None);
                        self.current_user = Some(id);
                        Self::info(out, &format!("New user created with ID: {}", id))?;
                        id
                    }
                };
                let request = CreateLinkRequest {
                    target: url,
                    max_clicks,
                    description,
                };
                let created = self.registry.create_link(owner, request)?;
                let link = &created.link;
                if created.reused {
                    Self::info(out, "You already have a live link for this URL")?;
                }
                Self::success(
                    out,
                    &format!(
                        "{} -> {} (max {} clicks, expires {})",
                        link.code().cyan(),
                        link.target(),
                        link.max_clicks(),
                        link.expires_at().format("%Y-%m-%d %H:%M UTC")
                    ),
                )?;
            }
            Command::List => {
                let owner = self.require_user()?;
                write_link_table(out, &self.registry.list_owned(owner))?;
            }
            Command::Stats { code, json } => {
                let owner = self.require_user()?;
                let stats = self.registry.statistics(&code, owner)?;
                if json {
                    let rendered = serde_json::to_string_pretty(&stats).map_err(|e| {
                        CliError::CommandError(format!("Failed to serialize statistics: {}", e))
                    })?;
                    writeln!(out, "{}", rendered)?;
                } else {
                    write_statistics(out, &stats)?;
                }
            }
            Command::Edit { code, max_clicks } => {
                let owner = self.require_user()?;
                let link = self.registry.update_quota(&code, owner, max_clicks)?;
                Self::success(
                    out,
                    &format!("Updated link '{}' to max {} clicks", code, max_clicks),
                )?;
                Self::info(out, &format!("Status: {}", state_label(link.state())))?;
            }
            Command::Deactivate { code } => {
                let owner = self.require_user()?;
                self.registry.deactivate(&code, owner)?;
                Self::success(out, &format!("Deactivated link: {}", code))?;
            }
            Command::Delete { code } => {
                let owner = self.require_user()?;
                self.registry.delete(&code, owner)?;
                Self::success(out, &format!("Deleted link: {}", code))?;
            }
            Command::Goto { code } => {
                let target = self.registry.resolve(&code)?;
                writeln!(out, "{} {}", "URL:".bold(), target.blue().underline())?;
            }
            Command::Resolve { code } => {
                self.require_user()?;
                let target = self.registry.resolve(&code)?;
                writeln!(out, "{} {}", "URL:".bold(), target.blue().underline())?;
            }
            Command::SetEmail { email } => {
                let owner = self.require_user()?;
                self.registry.users().set_email(owner, &email)?;
                Self::success(out, &format!("Notification email set to: {}", email))?;
            }
            Command::Expired => {
                let owner = self.require_user()?;
                let expired: Vec<_> = self
                    .registry
                    .find_expired()
                    .into_iter()
                    .filter(|l| l.is_owned_by(owner))
                    .collect();
                write_link_table(out, &expired)?;
            }
            Command::Cleanup => {
                let sweeper = self.sweeper.as_ref().ok_or_else(|| {
                    CliError::CommandError("Expiry sweeper is not available".to_string())
                })?;
                let report = sweeper.run_once();
                if report.expired == 0 {
                    Self::info(out, "No expired links found.")?;
                } else {
                    Self::success(
                        out,
                        &format!(
                            "Cleanup completed: {} expired, {} deleted, {} deactivated",
                            report.expired, report.deleted, report.deactivated
                        ),
                    )?;
                }
            }
        }

        Ok(Flow::Continue)
    }

    fn login<W: Write>(&mut self, user_id: Option<Uuid>, out: &mut W) -> Result<(), CliError> {
        if let Some(current) = self.current_user {
            // 同一个用户重复登录只刷新活跃时间
            if user_id.is_none_or(|id| id == current) {
                self.registry.users().touch(current);
                return Self::info(out, &format!("Already logged in as: {}", current));
            }
        }

        let id = self.registry.login(user_id);
        self.current_user = Some(id);
        Self::success(out, &format!("Logged in as: {}", id))
    }
}
