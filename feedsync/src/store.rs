use log::debug;

use crate::models::{CommunityStats, Post, PostId};

/// Ordered feed entries, newest first, plus the aggregate counters.
///
/// Every operation is synchronous and only touches the held state. Operations
/// addressing an id that is not present are no-ops, since a concurrent refresh
/// may have replaced the list while a request was in flight.
#[derive(Debug, Default)]
pub struct FeedStore {
    posts: Vec<Post>,
    stats: CommunityStats,
}

impl FeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn get(&self, id: &PostId) -> Option<&Post> {
        self.posts.iter().find(|post| &post.id == id)
    }

    fn position(&self, id: &PostId) -> Option<usize> {
        self.posts.iter().position(|post| &post.id == id)
    }

    pub fn stats(&self) -> CommunityStats {
        self.stats
    }

    pub fn set_stats(&mut self, stats: CommunityStats) {
        self.stats = stats;
    }

    pub fn update_stats<F>(&mut self, mutator: F)
    where
        F: FnOnce(&mut CommunityStats),
    {
        mutator(&mut self.stats);
    }

    /// Callers guarantee the id is not already present.
    pub fn insert_at_head(&mut self, post: Post) {
        self.posts.insert(0, post);
    }

    /// Put a previously removed entry back at `index`, clamped to the list length.
    pub fn restore(&mut self, index: usize, post: Post) {
        let index = index.min(self.posts.len());
        self.posts.insert(index, post);
    }

    /// Swap the entry carrying `match_id` for `new_post`, keeping its position.
    /// Returns whether `new_post` was put in place.
    ///
    /// When another entry already carries the new id (a refresh delivered the
    /// confirmed post first), the matched entry is dropped instead so the post
    /// is never listed twice.
    pub fn replace(&mut self, match_id: &PostId, new_post: Post) -> bool {
        let Some(index) = self.position(match_id) else {
            debug!("replace: no entry {match_id}, ignoring");
            return false;
        };

        let duplicate = new_post.id != *match_id
            && self
                .posts
                .iter()
                .enumerate()
                .any(|(i, post)| i != index && post.id == new_post.id);

        if duplicate {
            debug!("replace: {} already listed, dropping {match_id}", new_post.id);
            self.posts.remove(index);
            return false;
        }
        self.posts[index] = new_post;
        true
    }

    /// Returns the removed entry and its former position.
    pub fn remove(&mut self, id: &PostId) -> Option<(usize, Post)> {
        let index = self.position(id)?;
        Some((index, self.posts.remove(index)))
    }

    pub fn update_where<F>(&mut self, id: &PostId, mutator: F) -> bool
    where
        F: FnOnce(&mut Post),
    {
        match self.posts.iter_mut().find(|post| &post.id == id) {
            Some(post) => {
                mutator(post);
                true
            }
            None => {
                debug!("update: no entry {id}, ignoring");
                false
            }
        }
    }

    /// Replace the whole list, keeping it newest first.
    pub fn replace_all(&mut self, mut posts: Vec<Post>) {
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.posts = posts;
    }
}
