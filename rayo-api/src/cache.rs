//! In-process list caches
//!
//! Per-user project lists and latest-blog lists are cached for five minutes
//! and invalidated explicitly whenever a mutation would change them.

use moka::sync::Cache;
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// How long cached list responses stay valid
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Upper bound on distinct cached entries
const MAX_ENTRIES: u64 = 10_000;

/// Serialized list responses, keyed per user
#[derive(Clone)]
pub struct ListCache {
    entries: Cache<String, Value>,
}

impl ListCache {
    pub fn new() -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(CACHE_TTL)
                .build(),
        }
    }

    pub fn get_projects(&self, user_id: Uuid) -> Option<Value> {
        self.entries.get(&project_key(user_id))
    }

    pub fn put_projects(&self, user_id: Uuid, payload: Value) {
        self.entries.insert(project_key(user_id), payload);
    }

    pub fn get_latest_blogs(&self, user_id: Uuid) -> Option<Value> {
        self.entries.get(&latest_blogs_key(user_id))
    }

    pub fn put_latest_blogs(&self, user_id: Uuid, payload: Value) {
        self.entries.insert(latest_blogs_key(user_id), payload);
    }

    /// Drop both of a user's cached lists after a mutation.
    pub fn invalidate_user(&self, user_id: Uuid) {
        self.entries.invalidate(&project_key(user_id));
        self.entries.invalidate(&latest_blogs_key(user_id));
    }
}

impl Default for ListCache {
    fn default() -> Self {
        Self::new()
    }
}

fn project_key(user_id: Uuid) -> String {
    format!("projects:{user_id}")
}

fn latest_blogs_key(user_id: Uuid) -> String {
    format!("latest_blogs:{user_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_put_get_invalidate() {
        let cache = ListCache::new();
        let user = Uuid::new_v4();

        assert!(cache.get_projects(user).is_none());
        cache.put_projects(user, json!([{"name": "one"}]));
        assert!(cache.get_projects(user).is_some());

        cache.invalidate_user(user);
        assert!(cache.get_projects(user).is_none());
    }

    #[test]
    fn test_users_are_isolated() {
        let cache = ListCache::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        cache.put_latest_blogs(a, json!([]));
        assert!(cache.get_latest_blogs(b).is_none());

        cache.invalidate_user(b);
        assert!(cache.get_latest_blogs(a).is_some());
    }
}
