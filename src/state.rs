//! Frontier and crawl-run state. One `CrawlState` is created per run,
//! owned by a single engine, and discarded afterward. Counters and the
//! signature set are strictly monotone: nothing is ever removed.

use crate::types::FrontierItem;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet, VecDeque};

#[derive(Debug, Default)]
pub struct CrawlState {
    frontier: VecDeque<FrontierItem>,
    visited_signatures: HashSet<String>,
    pub page_count: usize,
    pub duplicate_hits: u64,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail of the FIFO queue. The page budget is the
    /// orchestrator's concern, not enforced here.
    pub fn enqueue(&mut self, item: FrontierItem) {
        self.frontier.push_back(item);
    }

    pub fn dequeue(&mut self) -> Option<FrontierItem> {
        self.frontier.pop_front()
    }

    pub fn has_pending(&self) -> bool {
        !self.frontier.is_empty()
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    /// Claim a signature before its page is processed. Returns false and
    /// counts a duplicate hit when the signature was already claimed.
    pub fn claim_signature(&mut self, signature: &str) -> bool {
        if self.visited_signatures.contains(signature) {
            self.duplicate_hits += 1;
            return false;
        }
        self.visited_signatures.insert(signature.to_string());
        true
    }

    pub fn visited_count(&self) -> usize {
        self.visited_signatures.len()
    }
}

/// Content fingerprint of a visited page: SHA-256 over a canonical
/// sorted-key JSON object. Deterministic across process restarts so the
/// digest could back external resumability.
pub fn make_signature(normalized_url: &str, dom_fingerprint: &str, landmarks: &[String]) -> String {
    let mut sorted_landmarks: Vec<&str> = landmarks.iter().map(String::as_str).collect();
    sorted_landmarks.sort_unstable();

    let mut canonical = BTreeMap::new();
    canonical.insert("dom", Value::from(dom_fingerprint));
    canonical.insert("landmarks", Value::from(sorted_landmarks));
    canonical.insert("url", Value::from(normalized_url));

    // BTreeMap serializes in key order, so the material is canonical.
    let material = serde_json::to_string(&canonical).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(material.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontier_is_fifo() {
        let mut state = CrawlState::new();
        state.enqueue(FrontierItem::seed("https://example.com"));
        state.enqueue(FrontierItem::discovered("https://example.com/login", 1));

        let first = state.dequeue().unwrap();
        assert_eq!(first.url, "https://example.com");
        assert_eq!(first.depth, 0);
        let second = state.dequeue().unwrap();
        assert_eq!(second.url, "https://example.com/login");
        assert!(state.dequeue().is_none());
    }

    #[test]
    fn signature_is_deterministic_and_input_sensitive() {
        let landmarks = vec!["main".to_string(), "nav".to_string()];
        let a = make_signature("https://example.com/login", "fp-1", &landmarks);
        let b = make_signature("https://example.com/login", "fp-1", &landmarks);
        let c = make_signature("https://example.com/login", "fp-2", &landmarks);
        let d = make_signature("https://example.com/other", "fp-1", &landmarks);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        // fixed-length hex digest
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_ignores_landmark_order() {
        let ab = make_signature("u", "fp", &["a".to_string(), "b".to_string()]);
        let ba = make_signature("u", "fp", &["b".to_string(), "a".to_string()]);
        assert_eq!(ab, ba);
    }

    #[test]
    fn claim_signature_counts_duplicates_and_only_grows() {
        let mut state = CrawlState::new();
        assert!(state.claim_signature("sig-1"));
        assert!(!state.claim_signature("sig-1"));
        assert!(!state.claim_signature("sig-1"));
        assert!(state.claim_signature("sig-2"));
        assert_eq!(state.visited_count(), 2);
        assert_eq!(state.duplicate_hits, 2);
    }
}
