//! Canonical identity of a recommendation, used only for duplicate lookup

use super::types::RecommendationItem;

/// Keys longer than this are replaced by a fixed-size digest
const MAX_KEY_LEN: usize = 100;

/// Identity used to detect the same book coming from different providers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    /// Derive the key: the id when present, else `title|author` lowercased
    pub fn of(item: &RecommendationItem) -> Self {
        let id = item.id.trim();
        let raw = if id.is_empty() {
            format!(
                "{}|{}",
                item.title.trim().to_lowercase(),
                item.author.trim().to_lowercase()
            )
        } else {
            id.to_string()
        };

        if raw.chars().count() > MAX_KEY_LEN {
            Self(format!("{:x}", md5::compute(raw.as_bytes())))
        } else {
            Self(raw)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
