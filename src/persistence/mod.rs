//! Per-user saved items and feedback
//!
//! Persistence is optional. When disabled every operation is a no-op that
//! returns an empty or negative answer.

use crate::config::PersistenceSettings;
use crate::results::{CanonicalKey, FeedbackItem, RecommendationItem};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Store for saved items and category feedback
#[async_trait]
pub trait PersistenceCollaborator: Send + Sync {
    fn is_enabled(&self) -> bool;

    /// Save an item to the user's collection; saving twice keeps one copy
    async fn save_item(&self, user_id: &str, item: &RecommendationItem) -> bool;

    async fn saved_items(&self, user_id: &str) -> Vec<RecommendationItem>;

    /// Remove a saved item by id
    async fn remove_item(&self, user_id: &str, item_id: &str) -> bool;

    /// Record feedback; a newer rating for the same category replaces the old one
    async fn record_feedback(&self, user_id: &str, feedback: FeedbackItem) -> bool;

    async fn feedback_for(&self, user_id: &str) -> Vec<FeedbackItem>;
}

/// Build the collaborator selected by the settings
pub fn from_settings(settings: &PersistenceSettings) -> Arc<dyn PersistenceCollaborator> {
    if settings.enabled {
        Arc::new(InMemoryPersistence::new())
    } else {
        Arc::new(DisabledPersistence)
    }
}

/// Persistence turned off
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledPersistence;

#[async_trait]
impl PersistenceCollaborator for DisabledPersistence {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn save_item(&self, user_id: &str, _item: &RecommendationItem) -> bool {
        debug!("Persistence disabled, not saving item for {}", user_id);
        false
    }

    async fn saved_items(&self, _user_id: &str) -> Vec<RecommendationItem> {
        Vec::new()
    }

    async fn remove_item(&self, _user_id: &str, _item_id: &str) -> bool {
        false
    }

    async fn record_feedback(&self, user_id: &str, _feedback: FeedbackItem) -> bool {
        debug!("Persistence disabled, not recording feedback for {}", user_id);
        false
    }

    async fn feedback_for(&self, _user_id: &str) -> Vec<FeedbackItem> {
        Vec::new()
    }
}

#[derive(Debug, Default)]
struct UserRecord {
    saved: Vec<RecommendationItem>,
    feedback: Vec<FeedbackItem>,
}

/// Process-local persistence
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceCollaborator for InMemoryPersistence {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn save_item(&self, user_id: &str, item: &RecommendationItem) -> bool {
        let key = CanonicalKey::of(item);
        let mut users = self.users.write().await;
        let record = users.entry(user_id.to_string()).or_default();

        match record.saved.iter_mut().find(|saved| CanonicalKey::of(saved) == key) {
            Some(existing) => *existing = item.clone(),
            None => record.saved.push(item.clone()),
        }
        true
    }

    async fn saved_items(&self, user_id: &str) -> Vec<RecommendationItem> {
        self.users
            .read()
            .await
            .get(user_id)
            .map(|record| record.saved.clone())
            .unwrap_or_default()
    }

    async fn remove_item(&self, user_id: &str, item_id: &str) -> bool {
        let mut users = self.users.write().await;
        let Some(record) = users.get_mut(user_id) else {
            return false;
        };
        let before = record.saved.len();
        record.saved.retain(|item| item.id != item_id);
        record.saved.len() < before
    }

    async fn record_feedback(&self, user_id: &str, feedback: FeedbackItem) -> bool {
        let mut users = self.users.write().await;
        let record = users.entry(user_id.to_string()).or_default();
        record
            .feedback
            .retain(|existing| !existing.category.eq_ignore_ascii_case(&feedback.category));
        record.feedback.push(feedback);
        true
    }

    async fn feedback_for(&self, user_id: &str) -> Vec<FeedbackItem> {
        self.users
            .read()
            .await
            .get(user_id)
            .map(|record| record.feedback.clone())
            .unwrap_or_default()
    }
}
