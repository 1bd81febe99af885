//! Community feed client: posts, likes and deletes are shown immediately and
//! reconciled with the server once it answers.

pub mod api;
pub mod cli;
pub mod context;
pub mod display;
pub mod error;
pub mod models;
pub mod mutator;
pub mod services;
pub mod session;
pub mod settings;
pub mod store;

pub use api::{CommunityApi, CommunityClient};
pub use context::AppContext;
pub use error::{FeedError, Operation};
pub use models::{Author, CommunityStats, LikeState, Post, PostId};
pub use mutator::{LikeMode, OptimisticMutator};
pub use session::{Session, SessionGuard};
pub use store::FeedStore;
