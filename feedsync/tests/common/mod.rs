#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::oneshot;

use feedsync::models::MAX_REMOTE_CONTENT_CHARS;
use feedsync::{
    AppContext, Author, CommunityApi, CommunityStats, FeedError, LikeMode, LikeState,
    OptimisticMutator, Post, PostId, Session,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Me,
    List,
    Create,
    Like,
    Delete,
    Stats,
}

struct StoredPost {
    id: String,
    content: String,
    author: Author,
    created_at: DateTime<Utc>,
    liked_by: Vec<String>,
}

struct FakeState {
    viewer: Author,
    posts: Vec<StoredPost>,
    next_id: u32,
    clock: DateTime<Utc>,
    members: u64,
    failures: Vec<(Call, FeedError)>,
    create_gates: VecDeque<oneshot::Receiver<()>>,
    like_gates: VecDeque<oneshot::Receiver<()>>,
    delete_gates: VecDeque<oneshot::Receiver<()>>,
    calls: Vec<Call>,
}

/// In-memory community server with the same rules as the real one, plus
/// scripted failures and gates that hold a response until the test releases it.
///
/// State changes happen when a request arrives; gates only delay the answer.
pub struct FakeCommunity {
    state: Mutex<FakeState>,
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

pub fn viewer() -> Author {
    Author::new("u-viewer", Some("Vera"))
}

pub fn other_user() -> Author {
    Author::new("u-other", Some("Otto"))
}

impl FakeCommunity {
    pub fn new(viewer: Author) -> Self {
        Self {
            state: Mutex::new(FakeState {
                viewer,
                posts: Vec::new(),
                next_id: 1,
                clock: base_time(),
                members: 3,
                failures: Vec::new(),
                create_gates: VecDeque::new(),
                like_gates: VecDeque::new(),
                delete_gates: VecDeque::new(),
                calls: Vec::new(),
            }),
        }
    }

    /// Seed an existing post, newest first in listing order.
    pub fn seed(&self, id: &str, author: Author, content: &str, liked_by: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.clock = state.clock + Duration::minutes(1);
        let created_at = state.clock;
        state.posts.insert(
            0,
            StoredPost {
                id: id.to_string(),
                content: content.to_string(),
                author,
                created_at,
                liked_by: liked_by.iter().map(|s| s.to_string()).collect(),
            },
        );
    }

    /// Remove a post behind the client's back.
    pub fn purge(&self, id: &str) {
        self.state.lock().unwrap().posts.retain(|p| p.id != id);
    }

    /// The next call of this kind fails with `error`.
    pub fn fail_next(&self, call: Call, error: FeedError) {
        self.state.lock().unwrap().failures.push((call, error));
    }

    pub fn gate_next_create(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().unwrap().create_gates.push_back(rx);
        tx
    }

    pub fn gate_next_like(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().unwrap().like_gates.push_back(rx);
        tx
    }

    pub fn gate_next_delete(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().unwrap().delete_gates.push_back(rx);
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls().into_iter().filter(|c| *c == call).count()
    }

    pub fn like_count(&self, id: &str) -> Option<usize> {
        let state = self.state.lock().unwrap();
        state
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.liked_by.len())
    }

    /// Record the call and pop a scripted failure for it, if any.
    fn enter(&self, call: Call) -> Result<(), FeedError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.failures.iter().position(|(c, _)| *c == call) {
            Some(index) => Err(state.failures.remove(index).1),
            None => Ok(()),
        }
    }

    fn to_post(viewer: &Author, stored: &StoredPost) -> Post {
        Post {
            id: PostId::new(stored.id.clone()),
            content: stored.content.clone(),
            author: stored.author.clone(),
            created_at: stored.created_at,
            like_count: stored.liked_by.len() as u64,
            viewer_has_liked: stored.liked_by.contains(&viewer.id),
            is_tentative: false,
        }
    }
}

async fn wait(gate: Option<oneshot::Receiver<()>>) {
    if let Some(gate) = gate {
        let _ = gate.await;
    }
}

fn not_found() -> FeedError {
    FeedError::NotFound {
        message: Some("Post not found".to_string()),
    }
}

#[async_trait]
impl CommunityApi for FakeCommunity {
    async fn current_user(&self) -> Result<Author, FeedError> {
        self.enter(Call::Me)?;
        Ok(self.state.lock().unwrap().viewer.clone())
    }

    async fn list_posts(&self) -> Result<Vec<Post>, FeedError> {
        self.enter(Call::List)?;
        let state = self.state.lock().unwrap();
        Ok(state
            .posts
            .iter()
            .map(|p| Self::to_post(&state.viewer, p))
            .collect())
    }

    async fn create_post(&self, content: &str) -> Result<Post, FeedError> {
        let (result, gate) = {
            let outcome = self.enter(Call::Create);
            let mut state = self.state.lock().unwrap();
            let gate = state.create_gates.pop_front();
            let result = outcome.and_then(|()| {
                let content = content.trim();
                if content.is_empty() {
                    return Err(FeedError::ValidationFailed(
                        "Post content cannot be empty".to_string(),
                    ));
                }
                if content.chars().count() > MAX_REMOTE_CONTENT_CHARS {
                    return Err(FeedError::ValidationFailed(
                        "Post content too long (max 1000 characters)".to_string(),
                    ));
                }

                state.clock = state.clock + Duration::minutes(1);
                let stored = StoredPost {
                    id: format!("p{}", state.next_id),
                    content: content.to_string(),
                    author: state.viewer.clone(),
                    created_at: state.clock,
                    liked_by: Vec::new(),
                };
                state.next_id += 1;
                let post = Self::to_post(&state.viewer, &stored);
                state.posts.insert(0, stored);
                Ok(post)
            });
            (result, gate)
        };

        wait(gate).await;
        result
    }

    async fn toggle_like(&self, post_id: &PostId) -> Result<LikeState, FeedError> {
        let (result, gate) = {
            let outcome = self.enter(Call::Like);
            let mut state = self.state.lock().unwrap();
            let gate = state.like_gates.pop_front();
            let viewer_id = state.viewer.id.clone();
            let result = outcome.and_then(|()| {
                let post = state
                    .posts
                    .iter_mut()
                    .find(|p| p.id == post_id.as_str())
                    .ok_or_else(not_found)?;

                let has_liked = post.liked_by.contains(&viewer_id);
                if has_liked {
                    post.liked_by.retain(|id| *id != viewer_id);
                } else {
                    post.liked_by.push(viewer_id.clone());
                }

                Ok(LikeState {
                    like_count: post.liked_by.len() as u64,
                    viewer_has_liked: !has_liked,
                })
            });
            (result, gate)
        };

        wait(gate).await;
        result
    }

    async fn delete_post(&self, post_id: &PostId) -> Result<(), FeedError> {
        let (result, gate) = {
            let outcome = self.enter(Call::Delete);
            let mut state = self.state.lock().unwrap();
            let gate = state.delete_gates.pop_front();
            let result = outcome.and_then(|()| {
                let index = state
                    .posts
                    .iter()
                    .position(|p| p.id == post_id.as_str())
                    .ok_or_else(not_found)?;

                if state.posts[index].author.id != state.viewer.id {
                    return Err(FeedError::Forbidden {
                        message: Some("Not authorized to delete this post".to_string()),
                    });
                }

                state.posts.remove(index);
                Ok(())
            });
            (result, gate)
        };

        wait(gate).await;
        result
    }

    async fn stats(&self) -> Result<CommunityStats, FeedError> {
        self.enter(Call::Stats)?;
        let state = self.state.lock().unwrap();
        Ok(CommunityStats {
            total_members: state.members,
            online_members: 1,
            total_posts: state.posts.len() as u64,
            active_today: 0,
        })
    }
}

/// Shares one fake between the mutator and the test.
pub struct Shared(pub Arc<FakeCommunity>);

#[async_trait]
impl CommunityApi for Shared {
    async fn current_user(&self) -> Result<Author, FeedError> {
        self.0.current_user().await
    }

    async fn list_posts(&self) -> Result<Vec<Post>, FeedError> {
        self.0.list_posts().await
    }

    async fn create_post(&self, content: &str) -> Result<Post, FeedError> {
        self.0.create_post(content).await
    }

    async fn toggle_like(&self, post_id: &PostId) -> Result<LikeState, FeedError> {
        self.0.toggle_like(post_id).await
    }

    async fn delete_post(&self, post_id: &PostId) -> Result<(), FeedError> {
        self.0.delete_post(post_id).await
    }

    async fn stats(&self) -> Result<CommunityStats, FeedError> {
        self.0.stats().await
    }
}

pub struct Harness {
    pub server: Arc<FakeCommunity>,
    pub session: Arc<Session>,
    pub feed: OptimisticMutator<Shared>,
}

pub fn harness(mode: LikeMode) -> Harness {
    let server = Arc::new(FakeCommunity::new(viewer()));
    let session = Arc::new(Session::new(Some(viewer())));
    let context = AppContext::new(session.clone(), mode);
    let feed = OptimisticMutator::new(Shared(server.clone()), context);

    Harness {
        server,
        session,
        feed,
    }
}

/// Let every ready branch of a surrounding `join!` make progress.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

pub fn ids(posts: &[Post]) -> Vec<String> {
    posts.iter().map(|p| p.id.to_string()).collect()
}
