//! Terminal rendering for REPL output

use std::io::{self, Write};

use colored::{ColoredString, Colorize};

use crate::services::LinkStatistics;
use crate::storage::{Link, LinkState, User};

/// Cut `text` to `max` characters, ending in `...` when shortened.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn state_text(state: LinkState) -> &'static str {
    match state {
        LinkState::Active => "ACTIVE",
        LinkState::Expired => "EXPIRED",
        LinkState::LimitReached => "LIMIT",
        LinkState::Deactivated => "INACTIVE",
    }
}

pub fn state_label(state: LinkState) -> ColoredString {
    color_like(state_text(state), state)
}

pub fn write_link_table<W: Write>(out: &mut W, links: &[Link]) -> io::Result<()> {
    if links.is_empty() {
        writeln!(out, "{} No links found", "ℹ".bold().blue())?;
        return Ok(());
    }

    writeln!(out)?;
    writeln!(
        out,
        "{}",
        format!(
            "{:<10} {:<46} {:<12} {:>8} {:>8}  {:<10} {}",
            "Code", "Original URL", "Expires", "Clicks", "Max", "Status", "Description"
        )
        .bold()
    )?;
    writeln!(out, "{}", "-".repeat(110))?;

    for link in links {
        // 颜色码不参与对齐，先补齐再上色
        let code = format!("{:<10}", link.code());
        let status = format!("{:<10}", state_text(link.state()));
        writeln!(
            out,
            "{} {:<46} {:<12} {:>8} {:>8}  {} {}",
            code.cyan(),
            truncate(link.target(), 45),
            link.expires_at().format("%Y-%m-%d"),
            link.current_clicks(),
            link.max_clicks(),
            color_like(&status, link.state()),
            truncate(link.description(), 20).dimmed()
        )?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "{} Total {} links",
        "ℹ".bold().blue(),
        links.len().to_string().green()
    )?;
    Ok(())
}

fn color_like(text: &str, state: LinkState) -> ColoredString {
    match state {
        LinkState::Active => text.green(),
        LinkState::Expired => text.yellow(),
        LinkState::LimitReached => text.red(),
        LinkState::Deactivated => text.dimmed(),
    }
}

pub fn write_statistics<W: Write>(out: &mut W, stats: &LinkStatistics) -> io::Result<()> {
    let rule = "=".repeat(60);
    writeln!(out)?;
    writeln!(out, "{}", rule)?;
    writeln!(out, "{} {}", "LINK STATISTICS:".bold(), stats.code.cyan())?;
    writeln!(out, "{}", rule)?;
    writeln!(out, "Original URL: {}", stats.target.blue().underline())?;
    writeln!(
        out,
        "Created:      {}",
        stats.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(
        out,
        "Expires:      {}",
        stats.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out, "Hours Left:   {}", stats.hours_left)?;
    writeln!(
        out,
        "Clicks:       {}/{}",
        stats.current_clicks, stats.max_clicks
    )?;
    writeln!(out, "Usage:        {:.1}%", stats.usage_percentage)?;
    writeln!(out, "Status:       {}", state_label(stats.state))?;
    if !stats.description.is_empty() {
        writeln!(out, "Description:  {}", stats.description)?;
    }
    writeln!(out, "{}", rule)?;
    Ok(())
}

pub fn write_user<W: Write>(out: &mut W, user: &User, links: &[Link]) -> io::Result<()> {
    let rule = "=".repeat(40);
    let accessible = links.iter().filter(|l| l.can_be_accessed()).count();

    writeln!(out)?;
    writeln!(out, "{}", rule)?;
    writeln!(out, "{}", "USER INFORMATION".bold())?;
    writeln!(out, "{}", rule)?;
    writeln!(out, "User ID:       {}", user.id().to_string().cyan())?;
    writeln!(
        out,
        "Created:       {}",
        user.created_at().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(
        out,
        "Last Activity: {}",
        user.last_activity().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out, "Total Links:   {}", links.len())?;
    writeln!(out, "Active Links:  {}", accessible)?;
    writeln!(
        out,
        "Email:         {}",
        user.notification_email().unwrap_or("Not set")
    )?;
    writeln!(out, "{}", rule)?;
    Ok(())
}

pub fn write_help<W: Write>(out: &mut W, ttl_hours: u32, max_clicks: u32) -> io::Result<()> {
    let command = |name: &str, text: &str| format!("  {:<42} {}", name.cyan(), text);

    writeln!(out, "{}", "quotalink - user-scoped short links".bold().magenta())?;
    writeln!(out)?;
    writeln!(out, "{}", "Session:".bold())?;
    writeln!(out, "{}", command("login [userId]", "log in, or start a new user"))?;
    writeln!(out, "{}", command("whoami", "show the current user"))?;
    writeln!(out, "{}", command("set-email <email>", "set the notification address"))?;
    writeln!(out)?;
    writeln!(out, "{}", "Links:".bold())?;
    writeln!(
        out,
        "{}",
        command("create <URL> [maxClicks] [description]", "create a short link")
    )?;
    writeln!(out, "{}", command("list", "list your links"))?;
    writeln!(out, "{}", command("stats <code> [--json]", "show link statistics"))?;
    writeln!(out, "{}", command("edit <code> <maxClicks>", "change the click limit"))?;
    writeln!(out, "{}", command("deactivate <code>", "disable a link"))?;
    writeln!(out, "{}", command("delete <code>", "delete a link"))?;
    writeln!(out, "{}", command("goto <code> | <code>", "resolve a link"))?;
    writeln!(out, "{}", command("expired", "list your expired links"))?;
    writeln!(out, "{}", command("cleanup", "run the expiry sweep now"))?;
    writeln!(out)?;
    writeln!(out, "{}", command("help", "show this help"))?;
    writeln!(out, "{}", command("exit | quit", "leave"))?;
    writeln!(out)?;
    writeln!(
        out,
        "{} links live {} hours; default limit is {} clicks",
        "Note:".yellow().bold(),
        ttl_hours,
        max_clicks
    )?;
    Ok(())
}
