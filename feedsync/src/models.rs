pub mod post;
pub mod stats;

pub use post::{
    ANONYMOUS, Author, LikeState, MAX_DRAFT_CHARS, MAX_REMOTE_CONTENT_CHARS, Post, PostId,
    RawAuthor, RawLikeResponse, RawMe, RawPost,
};
pub use stats::CommunityStats;
