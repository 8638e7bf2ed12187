use std::collections::{HashSet, VecDeque};
use tracing::trace;

/// Queue of discovered relative URLs plus the set of visited ones.
///
/// A URL is either queued, visited, or unknown, never both queued and visited.
/// Insertion order is visit order, which makes the crawl breadth-first.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<String>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    visit_order: Vec<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the URL unless it was already visited or queued.
    ///
    /// Returns whether the URL was added.
    pub fn enqueue(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.visited.contains(&url) || self.queued.contains(&url) {
            trace!("Not queueing known URL: {}", url);
            return false;
        }
        self.queued.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    /// Pops the oldest queued URL
    pub fn dequeue_next(&mut self) -> Option<String> {
        let url = self.queue.pop_front()?;
        self.queued.remove(&url);
        Some(url)
    }

    /// Records the URL as fetched; returns false if it already was
    pub fn mark_visited(&mut self, url: &str) -> bool {
        if !self.visited.insert(url.to_string()) {
            return false;
        }
        // Drop any queued copy so the two sets stay disjoint
        if self.queued.remove(url) {
            self.queue.retain(|queued| queued != url);
        }
        self.visit_order.push(url.to_string());
        true
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn is_queued(&self, url: &str) -> bool {
        self.queued.contains(url)
    }

    /// Number of queued URLs
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Visited URLs in the order they were fetched
    pub fn visited(&self) -> &[String] {
        &self.visit_order
    }

    /// Consumes the frontier, returning the visit order
    pub fn into_visited(self) -> Vec<String> {
        self.visit_order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut frontier = Frontier::new();
        assert!(frontier.enqueue("/a"));
        assert!(frontier.enqueue("/b"));
        assert!(frontier.enqueue("/c"));
        assert_eq!(frontier.len(), 3);

        assert_eq!(frontier.dequeue_next().as_deref(), Some("/a"));
        assert_eq!(frontier.dequeue_next().as_deref(), Some("/b"));
        assert_eq!(frontier.dequeue_next().as_deref(), Some("/c"));
        assert_eq!(frontier.dequeue_next(), None);
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_enqueue_skips_visited_and_queued() {
        let mut frontier = Frontier::new();
        frontier.mark_visited("");
        assert!(!frontier.enqueue(""));

        assert!(frontier.enqueue("/a"));
        assert!(!frontier.enqueue("/a"));
        assert_eq!(frontier.len(), 1);
        assert!(frontier.is_queued("/a"));

        let next = frontier.dequeue_next().unwrap();
        assert!(!frontier.is_queued(&next));
        frontier.mark_visited(&next);
        assert!(!frontier.enqueue("/a"));
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_mark_visited_keeps_sets_disjoint() {
        let mut frontier = Frontier::new();
        frontier.enqueue("/a");
        frontier.enqueue("/b");

        assert!(frontier.mark_visited("/a"));
        assert!(!frontier.is_queued("/a"));
        assert_eq!(frontier.len(), 1);
        assert_eq!(frontier.dequeue_next().as_deref(), Some("/b"));
    }

    #[test]
    fn test_visit_order_has_no_duplicates() {
        let mut frontier = Frontier::new();
        assert!(frontier.mark_visited(""));
        assert!(frontier.mark_visited("/a"));
        assert!(!frontier.mark_visited("/a"));
        assert!(frontier.is_visited("/a"));
        assert!(!frontier.is_visited("/b"));
        assert_eq!(frontier.visited(), &["".to_string(), "/a".to_string()]);
        assert_eq!(frontier.into_visited(), vec!["".to_string(), "/a".to_string()]);
    }
}
