//! Cached conversation directory.
//!
//! Holds the last known list of conversation summaries, newest first. The
//! list is pull-refreshed from the gateway; every local edit bumps a
//! generation so that a refresh issued before the edit cannot overwrite it.

use chatsync_types::conversation::ConversationSummary;

/// Cached, pull-refreshed list of conversation summaries.
#[derive(Debug, Default)]
pub struct ConversationDirectory {
    entries: Vec<ConversationSummary>,
    generation: u64,
}

impl ConversationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summaries in display order (newest first).
    pub fn list(&self) -> &[ConversationSummary] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> Option<&ConversationSummary> {
        self.entries.first()
    }

    pub fn get(&self, id: &str) -> Option<&ConversationSummary> {
        self.entries.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// First conversation whose persisted message count is zero.
    pub fn find_empty(&self) -> Option<&ConversationSummary> {
        self.entries.iter().find(|c| c.is_empty())
    }

    /// Start a refresh and return the generation its result must match.
    pub fn begin_refresh(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Whether a refresh issued at `generation` is still the latest word.
    pub fn is_current_refresh(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Apply a refresh result if nothing newer happened since it was issued.
    ///
    /// Returns false (and leaves the cache untouched) for a stale result.
    pub fn apply_refresh(&mut self, generation: u64, entries: Vec<ConversationSummary>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.entries = entries;
        true
    }

    /// Replace the whole list, invalidating any in-flight refresh.
    pub fn replace_all(&mut self, entries: Vec<ConversationSummary>) {
        self.generation += 1;
        self.entries = entries;
    }

    /// Insert a summary at the top, replacing any entry with the same id.
    pub fn prepend(&mut self, summary: ConversationSummary) {
        self.generation += 1;
        self.entries.retain(|c| c.id != summary.id);
        self.entries.insert(0, summary);
    }

    pub fn remove(&mut self, id: &str) -> Option<ConversationSummary> {
        let index = self.entries.iter().position(|c| c.id == id)?;
        self.generation += 1;
        Some(self.entries.remove(index))
    }

    pub fn set_title(&mut self, id: &str, title: &str) -> bool {
        match self.entries.iter_mut().find(|c| c.id == id) {
            Some(entry) => {
                entry.title = title.to_string();
                self.generation += 1;
                true
            }
            None => false,
        }
    }

    /// Record the message count of a completed save.
    pub fn set_message_count(&mut self, id: &str, count: u32) -> bool {
        match self.entries.iter_mut().find(|c| c.id == id) {
            Some(entry) => {
                entry.message_count = count;
                self.generation += 1;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn summary(id: &str, count: u32) -> ConversationSummary {
        ConversationSummary {
            id: id.to_string(),
            title: format!("title {id}"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            message_count: count,
        }
    }

    #[test]
    fn test_find_empty_returns_first_zero_count() {
        let mut dir = ConversationDirectory::new();
        dir.replace_all(vec![summary("a", 2), summary("b", 0), summary("c", 0)]);
        assert_eq!(dir.find_empty().unwrap().id, "b");
    }

    #[test]
    fn test_prepend_puts_new_entry_first_without_duplicates() {
        let mut dir = ConversationDirectory::new();
        dir.replace_all(vec![summary("a", 1), summary("b", 1)]);
        dir.prepend(summary("b", 0));
        let ids: Vec<&str> = dir.list().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_remove_missing_is_none() {
        let mut dir = ConversationDirectory::new();
        dir.replace_all(vec![summary("a", 1)]);
        assert!(dir.remove("zzz").is_none());
        assert_eq!(dir.remove("a").unwrap().id, "a");
        assert!(dir.is_empty());
    }

    #[test]
    fn test_stale_refresh_is_discarded_after_local_edit() {
        let mut dir = ConversationDirectory::new();
        dir.replace_all(vec![summary("a", 1)]);

        let generation = dir.begin_refresh();
        dir.prepend(summary("new", 0));

        assert!(!dir.apply_refresh(generation, vec![summary("a", 1)]));
        assert_eq!(dir.first().unwrap().id, "new");
    }

    #[test]
    fn test_only_latest_refresh_applies() {
        let mut dir = ConversationDirectory::new();
        let older = dir.begin_refresh();
        let newer = dir.begin_refresh();

        assert!(dir.apply_refresh(newer, vec![summary("fresh", 0)]));
        assert!(!dir.apply_refresh(older, vec![summary("old", 0)]));
        assert_eq!(dir.len(), 1);
        assert!(dir.contains("fresh"));
    }

    #[test]
    fn test_set_title_and_count() {
        let mut dir = ConversationDirectory::new();
        dir.replace_all(vec![summary("a", 0)]);
        assert!(dir.set_title("a", "Renamed"));
        assert!(dir.set_message_count("a", 4));
        assert!(!dir.set_title("missing", "x"));

        let a = dir.get("a").unwrap();
        assert_eq!(a.title, "Renamed");
        assert_eq!(a.message_count, 4);
    }
}
