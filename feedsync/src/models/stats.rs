use serde::Deserialize;

/// Aggregate counters shown above the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommunityStats {
    pub total_members: u64,
    pub online_members: u64,
    pub total_posts: u64,
    pub active_today: u64,
}

impl CommunityStats {
    /// Used when the stats endpoint fails but the post list was fetched.
    pub fn fallback(post_count: usize) -> Self {
        Self {
            total_posts: post_count as u64,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_zero() {
        let stats: CommunityStats = serde_json::from_str(r#"{"totalPosts": 12}"#).unwrap();
        assert_eq!(stats.total_posts, 12);
        assert_eq!(stats.total_members, 0);
        assert_eq!(stats.active_today, 0);
    }
}
