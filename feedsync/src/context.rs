use std::sync::Arc;

use crate::mutator::LikeMode;
use crate::session::SessionGuard;

/// Per-session state handed to the mutator instead of living in globals.
#[derive(Clone)]
pub struct AppContext {
    pub session: Arc<dyn SessionGuard>,
    pub like_mode: LikeMode,
}

impl AppContext {
    pub fn new(session: Arc<dyn SessionGuard>, like_mode: LikeMode) -> Self {
        Self { session, like_mode }
    }
}
