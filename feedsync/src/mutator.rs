use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::api::CommunityApi;
use crate::context::AppContext;
use crate::error::FeedError;
use crate::models::{Author, CommunityStats, LikeState, MAX_DRAFT_CHARS, Post, PostId};
use crate::store::FeedStore;

/// How a like toggle is reflected before the server answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LikeMode {
    /// Always show `+1` right away; a failure takes one like back and clears
    /// `viewer_has_liked`.
    #[default]
    Observed,
    /// Like or unlike depending on `viewer_has_liked`; a failure undoes exactly that.
    Symmetric,
}

impl LikeMode {
    fn apply(self, post: &mut Post, was_liked: bool) {
        match self {
            LikeMode::Observed => {
                post.like_count += 1;
                if !was_liked {
                    post.viewer_has_liked = true;
                }
            }
            LikeMode::Symmetric if was_liked => {
                post.like_count = post.like_count.saturating_sub(1);
                post.viewer_has_liked = false;
            }
            LikeMode::Symmetric => {
                post.like_count += 1;
                post.viewer_has_liked = true;
            }
        }
    }

    fn revert(self, post: &mut Post, was_liked: bool) {
        match self {
            LikeMode::Observed => {
                post.like_count = post.like_count.saturating_sub(1);
                post.viewer_has_liked = false;
            }
            LikeMode::Symmetric if was_liked => {
                post.like_count += 1;
                post.viewer_has_liked = true;
            }
            LikeMode::Symmetric => {
                post.like_count = post.like_count.saturating_sub(1);
                post.viewer_has_liked = false;
            }
        }
    }
}

/// Per-post like request numbering. A response only reconciles when no newer
/// request for the same post has already applied canonical values.
#[derive(Debug, Default, Clone, Copy)]
struct LikeSequence {
    issued: u64,
    applied: u64,
}

#[derive(Debug, Default)]
struct FeedState {
    store: FeedStore,
    likes: HashMap<PostId, LikeSequence>,
}

/// Temporary ids derived from the creation timestamp, strictly increasing so
/// that two posts created within the same millisecond never share one.
#[derive(Debug, Default)]
struct TempIds {
    last: AtomicI64,
}

impl TempIds {
    fn next(&self, now: DateTime<Utc>) -> PostId {
        let millis = now.timestamp_millis();
        let mut last = self.last.load(Ordering::SeqCst);
        loop {
            let candidate = millis.max(last + 1);
            match self
                .last
                .compare_exchange(last, candidate, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return PostId::new(format!("tmp-{candidate}")),
                Err(current) => last = current,
            }
        }
    }
}

/// Check a draft before anything is shown or sent. Returns the trimmed content.
pub fn validate_draft(draft: &str) -> Result<String, FeedError> {
    let content = draft.trim();
    if content.is_empty() {
        return Err(FeedError::ValidationFailed(
            "Post content cannot be empty!".to_string(),
        ));
    }
    if content.chars().count() > MAX_DRAFT_CHARS {
        return Err(FeedError::ValidationFailed(format!(
            "Post content too long (max {MAX_DRAFT_CHARS} characters)"
        )));
    }
    Ok(content.to_string())
}

/// Applies feed mutations locally first and reconciles them with the server.
///
/// Methods take `&self` so several requests can be in flight at once; the
/// feed state lock is never held across an await point, which keeps every
/// store mutation atomic with respect to the others.
pub struct OptimisticMutator<A> {
    api: A,
    context: AppContext,
    state: Mutex<FeedState>,
    temp_ids: TempIds,
}

impl<A: CommunityApi> OptimisticMutator<A> {
    pub fn new(api: A, context: AppContext) -> Self {
        Self {
            api,
            context,
            state: Mutex::new(FeedState::default()),
            temp_ids: TempIds::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn posts(&self) -> Vec<Post> {
        self.lock().store.posts().to_vec()
    }

    pub fn post(&self, id: &PostId) -> Option<Post> {
        self.lock().store.get(id).cloned()
    }

    pub fn stats(&self) -> CommunityStats {
        self.lock().store.stats()
    }

    fn escalate(&self, e: &FeedError) {
        if e.is_unauthorized() {
            self.context.session.on_unauthorized();
        }
    }

    /// Fetch posts and stats concurrently and settle each independently.
    ///
    /// A failed post fetch keeps the current list; a failed stats fetch falls
    /// back to counters derived from the fetched list. The flag reports whether
    /// the list was replaced, which can hold even when an error is returned.
    async fn fetch_and_apply(&self) -> (bool, Result<(), FeedError>) {
        let (posts, stats) = futures::join!(self.api.list_posts(), self.api.stats());

        let unauthorized = matches!(posts, Err(FeedError::Unauthorized))
            || matches!(stats, Err(FeedError::Unauthorized));

        let posts = match posts {
            Ok(posts) => posts,
            Err(e) => {
                warn!("failed to fetch posts: {e}");
                return (false, Err(if unauthorized { FeedError::Unauthorized } else { e }));
            }
        };

        let stats = match stats {
            Ok(stats) => stats,
            Err(e) => {
                warn!("failed to fetch stats, using fallback: {e}");
                CommunityStats::fallback(posts.len())
            }
        };

        debug!("refreshed feed with {} posts", posts.len());
        let mut state = self.lock();
        state.store.replace_all(posts);
        state.store.set_stats(stats);
        drop(state);

        if unauthorized {
            return (true, Err(FeedError::Unauthorized));
        }
        (true, Ok(()))
    }

    pub async fn refresh(&self) -> Result<(), FeedError> {
        let (_, result) = self.fetch_and_apply().await;
        if let Err(e) = &result {
            self.escalate(e);
        }
        result
    }

    /// Publish `draft` optimistically.
    ///
    /// The draft is cleared as soon as the tentative entry is shown, whatever
    /// the server answers. Invalid drafts are rejected untouched and without a
    /// network call.
    pub async fn create_post(&self, draft: &mut String) -> Result<Post, FeedError> {
        let content = validate_draft(draft)?;

        let now = Utc::now();
        let author = self
            .context
            .session
            .current_user()
            .unwrap_or_else(Author::anonymous);
        let temp_id = self.temp_ids.next(now);
        let tentative = Post::tentative(temp_id.clone(), content.clone(), author, now);

        self.lock().store.insert_at_head(tentative);
        draft.clear();
        debug!("inserted tentative post {temp_id}");

        match self.api.create_post(&content).await {
            Ok(post) => {
                let confirmed = Post {
                    is_tentative: false,
                    ..post
                };
                let mut state = self.lock();
                // A refresh that landed meanwhile already counted the post.
                if state.store.replace(&temp_id, confirmed.clone()) {
                    state.store.update_stats(|stats| stats.total_posts += 1);
                }
                info!("post {temp_id} confirmed as {}", confirmed.id);
                Ok(confirmed)
            }
            Err(e) => {
                self.lock().store.remove(&temp_id);
                warn!("create failed, removed tentative post {temp_id}: {e}");
                self.escalate(&e);
                Err(e)
            }
        }
    }

    /// Toggle the viewer's like on a confirmed post.
    pub async fn toggle_like(&self, id: &PostId) -> Result<LikeState, FeedError> {
        let mode = self.context.like_mode;

        let (was_liked, seq) = {
            let mut guard = self.lock();
            let state = &mut *guard;
            let post = state.store.get(id).ok_or_else(FeedError::not_found)?;
            if post.is_tentative {
                return Err(FeedError::Pending(id.clone()));
            }

            let was_liked = post.viewer_has_liked;
            state.store.update_where(id, |post| mode.apply(post, was_liked));

            let sequence = state.likes.entry(id.clone()).or_default();
            sequence.issued += 1;
            (was_liked, sequence.issued)
        };

        let result = self.api.toggle_like(id).await;

        let mut guard = self.lock();
        let state = &mut *guard;
        let sequence = state.likes.entry(id.clone()).or_default();
        let current = seq > sequence.applied;

        match result {
            Ok(like) => {
                if current {
                    sequence.applied = seq;
                    state.store.update_where(id, |post| post.set_like_state(like));
                } else {
                    debug!("dropping stale like response #{seq} for {id}");
                }
                Ok(like)
            }
            Err(e) => {
                if current {
                    state.store.update_where(id, |post| mode.revert(post, was_liked));
                } else {
                    debug!("like #{seq} for {id} failed after a newer one settled");
                }
                drop(guard);
                warn!("like on {id} failed: {e}");
                self.escalate(&e);
                Err(e)
            }
        }
    }

    /// Delete a confirmed post. The caller asks the user for confirmation first.
    ///
    /// On failure the feed is resynchronized from the server. If that refetch
    /// could not replace the list, the removed entry is put back where it was,
    /// unless the server said it no longer exists.
    pub async fn delete_post(&self, id: &PostId) -> Result<(), FeedError> {
        let (index, removed) = {
            let mut state = self.lock();
            match state.store.get(id) {
                None => return Err(FeedError::not_found()),
                Some(post) if post.is_tentative => return Err(FeedError::Pending(id.clone())),
                Some(_) => {}
            }
            state.store.remove(id).ok_or_else(FeedError::not_found)?
        };

        match self.api.delete_post(id).await {
            Ok(()) => {
                let mut state = self.lock();
                state
                    .store
                    .update_stats(|stats| stats.total_posts = stats.total_posts.saturating_sub(1));
                state.likes.remove(id);
                info!("deleted post {id}");
                Ok(())
            }
            Err(e) => {
                warn!("delete of {id} failed, resynchronizing: {e}");
                let (applied, resync) = self.fetch_and_apply().await;
                if let Err(resync) = resync {
                    warn!("resynchronization failed: {resync}");
                    self.escalate(&resync);
                    if !applied && !matches!(e, FeedError::NotFound { .. }) {
                        self.lock().store.restore(index, removed);
                    }
                }
                self.escalate(&e);
                Err(e)
            }
        }
    }
}
