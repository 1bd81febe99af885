use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use inquire::Confirm;
use log::debug;
use owo_colors::OwoColorize;

use crate::api::{CommunityApi, CommunityClient};
use crate::cli::{Args, Command};
use crate::context::AppContext;
use crate::display::{format_post, format_stats};
use crate::error::{FeedError, Operation};
use crate::models::PostId;
use crate::mutator::OptimisticMutator;
use crate::session::{Session, SessionGuard};
use crate::settings::{self, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};

/// Turn a flow failure into the message the user sees. Rollback has already
/// happened by the time a flow returns.
fn surface(operation: Operation, e: FeedError) -> anyhow::Error {
    debug!("{operation:?} failed: {e}");
    anyhow!(e.user_message(operation))
}

pub async fn run(args: Args) -> Result<()> {
    let settings = settings::load_settings().context("Failed to load settings")?;
    let args = settings::merge_settings_with_args(&args, settings);

    let api_url = args.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
    let token = args
        .token
        .as_deref()
        .filter(|token| !token.trim().is_empty())
        .context("No API token configured, pass --token or set FEEDSYNC_TOKEN")?;
    let timeout = Duration::from_secs(args.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

    let client = CommunityClient::new(api_url, token, timeout)?;
    debug!("using community API at {}", client.base_url());

    let session = Arc::new(Session::default());
    let user = match client.current_user().await {
        Ok(user) => user,
        Err(e) => {
            if e.is_unauthorized() {
                session.on_unauthorized();
            }
            return Err(surface(Operation::Refresh, e));
        }
    };
    session.sign_in(user.clone());

    let client = client.with_viewer(user.id.clone());
    let context = AppContext::new(session.clone(), args.like_mode.unwrap_or_default());
    let mutator = OptimisticMutator::new(client, context);

    match args.command {
        Command::Whoami => {
            println!("{} ({})", user.display_name.bold(), user.id.dimmed());
            Ok(())
        }
        Command::List { limit } => list(&mutator, limit).await,
        Command::Post { content } => create(&mutator, content).await,
        Command::Like { post_id } => like(&mutator, &post_id).await,
        Command::Delete { post_id, yes } => delete(&mutator, &post_id, yes).await,
    }
}

async fn list<A: CommunityApi>(mutator: &OptimisticMutator<A>, limit: Option<usize>) -> Result<()> {
    mutator
        .refresh()
        .await
        .map_err(|e| surface(Operation::Refresh, e))?;

    let now = Utc::now();
    println!("{}\n", format_stats(&mutator.stats()));

    let posts = mutator.posts();
    if posts.is_empty() {
        println!("{} No posts yet.", "ℹ".blue());
        return Ok(());
    }

    for post in posts.iter().take(limit.unwrap_or(usize::MAX)) {
        println!("{}\n", format_post(post, now));
    }

    Ok(())
}

async fn create<A: CommunityApi>(mutator: &OptimisticMutator<A>, content: String) -> Result<()> {
    let mut draft = content;
    let post = mutator
        .create_post(&mut draft)
        .await
        .map_err(|e| surface(Operation::Create, e))?;

    println!("{} Published", "✓".bright_green());
    println!("{}", format_post(&post, Utc::now()));
    Ok(())
}

async fn like<A: CommunityApi>(mutator: &OptimisticMutator<A>, post_id: &PostId) -> Result<()> {
    mutator
        .refresh()
        .await
        .map_err(|e| surface(Operation::Refresh, e))?;

    let state = mutator
        .toggle_like(post_id)
        .await
        .map_err(|e| surface(Operation::Like, e))?;

    let verb = if state.viewer_has_liked { "Liked" } else { "Unliked" };
    println!(
        "{} {} {} ({} likes)",
        "✓".bright_green(),
        verb,
        post_id.as_str().bright_cyan(),
        state.like_count
    );
    Ok(())
}

async fn delete<A: CommunityApi>(
    mutator: &OptimisticMutator<A>,
    post_id: &PostId,
    yes: bool,
) -> Result<()> {
    mutator
        .refresh()
        .await
        .map_err(|e| surface(Operation::Refresh, e))?;

    if !yes {
        let confirm = Confirm::new("Are you sure you want to delete this post?")
            .with_default(false)
            .prompt()
            .context("Failed to get confirmation")?;

        if !confirm {
            println!("\n{} Deletion cancelled.", "✗".yellow());
            return Ok(());
        }
    }

    mutator
        .delete_post(post_id)
        .await
        .map_err(|e| surface(Operation::Delete, e))?;

    println!("{} Post deleted successfully!", "✓".bright_green());
    Ok(())
}
