//! Candidate failover.
//!
//! # Responsibilities
//! - Hand out backend candidates strictly in priority order
//! - Record why each candidate failed
//! - Produce the exhaustion error once no candidates remain
//!
//! # Design Decisions
//! - Attempts are sequential; a candidate is tried only after the previous
//!   one definitively failed
//! - No backoff between candidates: each is a different backend
//! - Only connection-level failures are recorded here; an HTTP response of any
//!   status ends failover

use crate::http::error::ProxyError;
use crate::resolver::BackendCandidates;

/// One attempt against a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt<'a> {
    /// 1-based attempt number.
    pub number: usize,
    pub candidate: &'a str,
}

/// Walks the candidate list for a single request.
#[derive(Debug)]
pub struct Failover<'a> {
    candidates: &'a BackendCandidates,
    next: usize,
    failures: Vec<ProxyError>,
}

impl<'a> Failover<'a> {
    pub fn new(candidates: &'a BackendCandidates) -> Self {
        Self {
            candidates,
            next: 0,
            failures: Vec::new(),
        }
    }

    /// The next candidate to try, or `None` once all are used up.
    pub fn next_attempt(&mut self) -> Option<Attempt<'a>> {
        let candidate = self.candidates.get(self.next)?;
        self.next += 1;
        Some(Attempt {
            number: self.next,
            candidate,
        })
    }

    /// Record that the current attempt failed at the connection level.
    pub fn record(&mut self, error: ProxyError) {
        self.failures.push(error);
    }

    pub fn attempts_made(&self) -> usize {
        self.next
    }

    /// Consume the walker into the error reported when nothing answered.
    pub fn exhausted(self) -> ProxyError {
        if self.failures.is_empty() {
            ProxyError::NoCandidates
        } else {
            ProxyError::Exhausted(self.failures)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn candidates(urls: &[&str]) -> BackendCandidates {
        let urls: Vec<String> = urls.iter().map(|s| s.to_string()).collect();
        BackendCandidates::resolve(None, &urls)
    }

    #[test]
    fn test_attempts_follow_priority_order() {
        let list = candidates(&["http://a", "http://b", "http://c"]);
        let mut failover = Failover::new(&list);

        let first = failover.next_attempt().unwrap();
        assert_eq!((first.number, first.candidate), (1, "http://a"));
        let second = failover.next_attempt().unwrap();
        assert_eq!((second.number, second.candidate), (2, "http://b"));
        assert_eq!(failover.attempts_made(), 2);
    }

    #[test]
    fn test_empty_list_is_no_candidates() {
        let list = candidates(&[]);
        let mut failover = Failover::new(&list);
        assert!(failover.next_attempt().is_none());
        assert!(matches!(failover.exhausted(), ProxyError::NoCandidates));
    }

    #[test]
    fn test_exhaustion_keeps_every_failure() {
        let list = candidates(&["http://a", "http://b"]);
        let mut failover = Failover::new(&list);
        while let Some(attempt) = failover.next_attempt() {
            failover.record(ProxyError::Timeout {
                candidate: attempt.candidate.to_string(),
                timeout: Duration::from_secs(15),
            });
        }

        let err = failover.exhausted();
        let message = err.to_string();
        assert!(matches!(err, ProxyError::Exhausted(ref f) if f.len() == 2));
        assert!(message.contains("http://a"), "{message}");
        assert!(message.contains("http://b"), "{message}");
    }
}
