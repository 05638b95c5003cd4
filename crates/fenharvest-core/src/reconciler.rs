//! Candidate reconciliation.

use fenharvest_store::Record;

use crate::context::SessionState;
use crate::extractor::{Candidate, Provenance};

/// Outcome of reconciling one iteration's candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// A new record, indexed and ready to append.
    Confirmed(Record),
    /// The selected candidate repeats the last confirmed payload.
    Duplicate,
    /// No strategy produced anything.
    Empty,
}

/// Merges candidates into at most one confirmed record.
pub struct Reconciler;

impl Reconciler {
    /// The candidate that counts: network first, probe otherwise.
    pub fn select(candidates: &[Candidate]) -> Option<&Candidate> {
        candidates
            .iter()
            .find(|c| c.provenance == Provenance::Network)
            .or_else(|| candidates.iter().find(|c| c.provenance == Provenance::Probe))
    }

    /// Confirm the selected candidate if it differs from the last confirmed payload.
    ///
    /// Confirmation allocates the next index and clears the failure count;
    /// anything else counts one failure.
    pub fn reconcile(state: &mut SessionState, candidates: &[Candidate]) -> Reconciliation {
        let Some(candidate) = Self::select(candidates) else {
            state.consecutive_failures += 1;
            return Reconciliation::Empty;
        };

        if state.last_payload.as_deref() == Some(candidate.payload.as_str()) {
            state.consecutive_failures += 1;
            return Reconciliation::Duplicate;
        }

        state.confirmed += 1;
        state.consecutive_failures = 0;
        state.last_payload = Some(candidate.payload.clone());
        Reconciliation::Confirmed(Record::new(state.confirmed as u64, candidate.payload.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fenharvest_store::Outcome;

    #[test]
    fn test_network_candidate_has_priority() {
        let candidates = vec![Candidate::probe("from-probe"), Candidate::network("from-network")];
        let selected = Reconciler::select(&candidates).unwrap();
        assert_eq!(selected.payload, "from-network");
    }

    #[test]
    fn test_probe_used_without_network() {
        let mut state = SessionState::default();
        let result = Reconciler::reconcile(&mut state, &[Candidate::probe("p1")]);
        match result {
            Reconciliation::Confirmed(record) => {
                assert_eq!(record.index, 1);
                assert_eq!(record.payload, "p1");
                assert_eq!(record.outcome, Outcome::Unknown);
                assert_eq!(record.choices, [String::new(), String::new()]);
            }
            other => panic!("expected confirmation, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_suppressed_and_counted() {
        let mut state = SessionState::default();
        Reconciler::reconcile(&mut state, &[Candidate::network("a")]);
        let result = Reconciler::reconcile(&mut state, &[Candidate::probe("a")]);

        assert_eq!(result, Reconciliation::Duplicate);
        assert_eq!(state.confirmed, 1);
        assert_eq!(state.consecutive_failures, 1);
    }

    #[test]
    fn test_empty_counts_failure() {
        let mut state = SessionState::default();
        assert_eq!(Reconciler::reconcile(&mut state, &[]), Reconciliation::Empty);
        assert_eq!(Reconciler::reconcile(&mut state, &[]), Reconciliation::Empty);
        assert_eq!(state.consecutive_failures, 2);
    }

    #[test]
    fn test_confirmation_resets_failures() {
        let mut state = SessionState {
            consecutive_failures: 4,
            ..Default::default()
        };
        Reconciler::reconcile(&mut state, &[Candidate::network("fresh")]);
        assert_eq!(state.consecutive_failures, 0);
        assert_eq!(state.last_payload.as_deref(), Some("fresh"));
    }

    #[test]
    fn test_no_consecutive_duplicates_and_gapless_indices() {
        let sequence = ["a", "a", "b", "b", "b", "a", "c", "c"];
        let mut state = SessionState::default();
        let mut confirmed = Vec::new();

        for (i, payload) in sequence.iter().enumerate() {
            let candidate = if i % 2 == 0 {
                Candidate::network(*payload)
            } else {
                Candidate::probe(*payload)
            };
            if let Reconciliation::Confirmed(record) =
                Reconciler::reconcile(&mut state, &[candidate])
            {
                confirmed.push(record);
            }
        }

        let payloads: Vec<&str> = confirmed.iter().map(|r| r.payload.as_str()).collect();
        assert_eq!(payloads, vec!["a", "b", "a", "c"]);
        for pair in confirmed.windows(2) {
            assert_ne!(pair[0].payload, pair[1].payload);
        }
        let indices: Vec<u64> = confirmed.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
    }
}
