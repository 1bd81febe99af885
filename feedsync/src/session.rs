use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use log::{info, warn};

use crate::models::Author;

/// Identity provider consulted by the optimistic flows.
pub trait SessionGuard: Send + Sync {
    fn current_user(&self) -> Option<Author>;

    /// Invoked after a remote call fails with an authorization error.
    fn on_unauthorized(&self);
}

#[derive(Debug, Default)]
pub struct Session {
    user: Mutex<Option<Author>>,
    invalidated: AtomicBool,
}

impl Session {
    pub fn new(user: Option<Author>) -> Self {
        Self {
            user: Mutex::new(user),
            invalidated: AtomicBool::new(false),
        }
    }

    pub fn sign_in(&self, user: Author) {
        info!("signed in as {} ({})", user.display_name, user.id);
        *self.user.lock().unwrap_or_else(PoisonError::into_inner) = Some(user);
        self.invalidated.store(false, Ordering::SeqCst);
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::SeqCst)
    }
}

impl SessionGuard for Session {
    fn current_user(&self) -> Option<Author> {
        self.user
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn on_unauthorized(&self) {
        warn!("session rejected by the server, signing out");
        *self.user.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.invalidated.store(true, Ordering::SeqCst);
    }
}
