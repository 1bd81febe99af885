pub mod community;

pub use community::{CommunityApi, CommunityClient};
