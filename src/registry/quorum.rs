//! Quorum evaluation and the threshold-reveal gate.
//!
//! Votes are opaque commitments until the signer count crosses the
//! proposal's threshold. Crossing it unlocks the reveal: one decrypt per
//! commitment, after which the mapping is fixed. The types here are pure
//! views over a proposal snapshot; nothing in this module mutates.

use super::proposal::{Address, VoteChoice};
use serde::Serialize;

/// One revealed commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevealedVote {
    pub vote_id: u64,
    pub signer: Address,
    pub choice: VoteChoice,
}

/// Result of evaluating a proposal's quorum condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuorumView {
    pub reached: bool,
    /// The reveal mapping; present only when `reached` is true.
    pub revealed: Option<Vec<RevealedVote>>,
}

impl QuorumView {
    pub fn not_reached() -> Self {
        Self {
            reached: false,
            revealed: None,
        }
    }

    /// Tally of the reveal mapping, if quorum was reached.
    pub fn tally(&self) -> Option<Tally> {
        self.revealed.as_deref().map(Tally::count)
    }
}

/// Approve/reject counts over a reveal mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub approve: u32,
    pub reject: u32,
}

impl Tally {
    pub fn count(revealed: &[RevealedVote]) -> Self {
        let mut tally = Self {
            approve: 0,
            reject: 0,
        };
        for vote in revealed {
            match vote.choice {
                VoteChoice::Approve => tally.approve += 1,
                VoteChoice::Reject => tally.reject += 1,
            }
        }
        tally
    }

    /// Funds move only on a strict approve majority. Ties fail safe.
    pub fn passes(&self) -> bool {
        self.approve > self.reject
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revealed(choices: &[VoteChoice]) -> Vec<RevealedVote> {
        choices
            .iter()
            .enumerate()
            .map(|(i, &choice)| RevealedVote {
                vote_id: i as u64 + 1,
                signer: Address::parse(&format!("0x{:040x}", i + 1)).unwrap(),
                choice,
            })
            .collect()
    }

    #[test]
    fn test_tally_counts() {
        use VoteChoice::{Approve, Reject};

        let tally = Tally::count(&revealed(&[Approve, Reject, Approve]));
        assert_eq!(tally.approve, 2);
        assert_eq!(tally.reject, 1);
        assert!(tally.passes());

        let tally = Tally::count(&revealed(&[Approve, Reject, Reject]));
        assert_eq!(tally.approve, 1);
        assert_eq!(tally.reject, 2);
        assert!(!tally.passes());
    }

    #[test]
    fn test_tie_fails_safe() {
        use VoteChoice::{Approve, Reject};

        let tally = Tally::count(&revealed(&[Approve, Reject]));
        assert_eq!(tally.approve, tally.reject);
        assert!(!tally.passes());
    }

    #[test]
    fn test_empty_tally_does_not_pass() {
        assert!(!Tally::count(&[]).passes());
    }

    #[test]
    fn test_view_tally() {
        assert_eq!(QuorumView::not_reached().tally(), None);

        let view = QuorumView {
            reached: true,
            revealed: Some(revealed(&[VoteChoice::Approve])),
        };
        assert_eq!(
            view.tally(),
            Some(Tally {
                approve: 1,
                reject: 0
            })
        );
    }
}
