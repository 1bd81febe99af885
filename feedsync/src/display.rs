use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;

use crate::models::{CommunityStats, Post};

pub fn relative_time(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - created_at).num_seconds();

    match seconds {
        s if s < 60 => "Just now".to_string(),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        s if s < 604_800 => format!("{}d ago", s / 86_400),
        _ => created_at.format("%Y-%m-%d").to_string(),
    }
}

/// Avatar letter for a display name.
pub fn initial(name: &str) -> char {
    name.trim()
        .chars()
        .next()
        .and_then(|c| c.to_uppercase().next())
        .unwrap_or('A')
}

pub fn format_post(post: &Post, now: DateTime<Utc>) -> String {
    let status = if post.is_tentative {
        format!(" {}", "(publishing…)".yellow())
    } else {
        String::new()
    };
    let heart = if post.viewer_has_liked { "♥" } else { "♡" };

    format!(
        "[{}] {} {}{}\n    {}\n    {} {}  {}",
        initial(&post.author.display_name).bright_cyan(),
        post.author.display_name.bold(),
        relative_time(post.created_at, now).dimmed(),
        status,
        post.content,
        heart.bright_red(),
        post.like_count,
        post.id.as_str().dimmed(),
    )
}

pub fn format_stats(stats: &CommunityStats) -> String {
    format!(
        "{} members · {} online · {} posts · {} active today",
        stats.total_members.bright_cyan(),
        stats.online_members.bright_green(),
        stats.total_posts.bright_cyan(),
        stats.active_today.bright_yellow(),
    )
}
