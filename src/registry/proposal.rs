//! Proposal and vote data model.
//!
//! Field constraints are enforced at the edge: a draft is validated in
//! full before the registry issues any remote call, so a rejected draft
//! never reaches the codec or the contract.

use super::RegistryError;
use crate::chain::traits::OnChainProposal;
use crate::codec::Ciphertext;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum title length in characters.
pub const TITLE_MIN_CHARS: usize = 5;

/// Minimum description length in characters.
pub const DESCRIPTION_MIN_CHARS: usize = 20;

/// Registry-assigned proposal identifier. Immutable once assigned.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ProposalId(pub u64);

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 20-byte account address: `0x` + 40 hex characters.
///
/// Stored lowercased so signer comparisons ignore checksum casing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    pub fn parse(s: &str) -> Result<Self, String> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| "must start with 0x".to_string())?;
        if digits.len() != 40 {
            return Err(format!("expected 40 hex characters, got {}", digits.len()));
        }
        if hex::decode(digits).is_err() {
            return Err("contains non-hex characters".to_string());
        }
        Ok(Self(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Positive decimal quantity, kept in its validated string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount(String);

impl Amount {
    pub fn parse(s: &str) -> Result<Self, String> {
        let (int_part, frac_part) = match s.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (s, None),
        };

        if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err("must be a decimal number".to_string());
        }
        if let Some(frac) = frac_part {
            if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return Err("must be a decimal number".to_string());
            }
        }
        if s.bytes().all(|b| b == b'0' || b == b'.') {
            return Err("must be positive".to_string());
        }

        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Treasury currencies accepted in proposals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Eth,
    Usdc,
    Usdt,
    Dai,
    Wbtc,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Eth => "ETH",
            Self::Usdc => "USDC",
            Self::Usdt => "USDT",
            Self::Dai => "DAI",
            Self::Wbtc => "WBTC",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ETH" => Ok(Self::Eth),
            "USDC" => Ok(Self::Usdc),
            "USDT" => Ok(Self::Usdt),
            "DAI" => Ok(Self::Dai),
            "WBTC" => Ok(Self::Wbtc),
            other => Err(format!("unknown currency: {other}")),
        }
    }
}

/// Proposal categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Treasury,
    Investment,
    Operations,
    Governance,
    Security,
    Infrastructure,
    Partnership,
    Other,
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "treasury" => Ok(Self::Treasury),
            "investment" => Ok(Self::Investment),
            "operations" => Ok(Self::Operations),
            "governance" => Ok(Self::Governance),
            "security" => Ok(Self::Security),
            "infrastructure" => Ok(Self::Infrastructure),
            "partnership" => Ok(Self::Partnership),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// Priority label. Cosmetic only: has no effect on the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

/// Proposal lifecycle state.
///
/// `Active` is the unique initial state; `Executed` and `Rejected` are
/// terminal. There is no transition out of a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Executed,
    Rejected,
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Executed | Self::Rejected)
    }
}

/// Vote choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Approve,
    Reject,
}

impl VoteChoice {
    /// External wire encoding: approve=1, reject=2.
    pub fn wire_value(&self) -> u64 {
        match self {
            Self::Approve => 1,
            Self::Reject => 2,
        }
    }

    pub fn from_wire(value: u64) -> Option<Self> {
        match value {
            1 => Some(Self::Approve),
            2 => Some(Self::Reject),
            _ => None,
        }
    }
}

impl FromStr for VoteChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown vote choice: {other}")),
        }
    }
}

/// A recorded vote. Append-only within its proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    /// Unique within the owning proposal.
    pub id: u64,
    pub signer: Address,
    /// The encrypted choice as submitted; kept for the reveal call.
    pub ciphertext: Ciphertext,
    /// True until the choice has been revealed.
    pub encrypted: bool,
    /// Set only after the owning proposal's quorum held at reveal time.
    pub revealed: Option<VoteChoice>,
}

/// A governance proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    pub amount: Amount,
    pub currency: Currency,
    pub recipient: Address,
    pub category: Category,
    /// Voting deadline, unix seconds. Strictly after `created_at`.
    pub deadline: u64,
    pub urgency: Urgency,
    /// Quorum threshold, fixed at creation.
    pub required_signers: u32,
    pub status: Status,
    pub votes: Vec<Vote>,
    /// Last refreshed tally from the contract. The ledger is
    /// authoritative; this cache may run ahead of the local votes.
    pub on_chain: Option<OnChainProposal>,
    pub created_at: u64,
}

impl Proposal {
    pub fn has_voted(&self, signer: &Address) -> bool {
        self.votes.iter().any(|vote| vote.signer == *signer)
    }

    /// Freshest known signer count: the local votes or the last
    /// refreshed on-chain tally, whichever is ahead.
    pub fn current_signers(&self) -> u32 {
        let local = self.votes.len() as u32;
        let remote = self.on_chain.map(|o| o.total_votes).unwrap_or(0);
        local.max(remote)
    }

    pub fn quorum_reached(&self) -> bool {
        self.current_signers() >= self.required_signers
    }
}

/// Unvalidated proposal fields as collected from a form or CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalDraft {
    pub title: String,
    pub description: String,
    pub amount: String,
    pub currency: Currency,
    pub recipient: String,
    pub category: Category,
    /// Voting deadline, unix seconds.
    pub deadline: u64,
    pub urgency: Urgency,
}

impl ProposalDraft {
    /// Validate every field, returning the typed amount and recipient.
    ///
    /// The first failing field aborts with [`RegistryError::Validation`]
    /// naming it.
    pub fn validate(&self, now: u64) -> Result<(Amount, Address), RegistryError> {
        if self.title.chars().count() < TITLE_MIN_CHARS {
            return Err(RegistryError::Validation {
                field: "title",
                reason: format!("must be at least {TITLE_MIN_CHARS} characters"),
            });
        }
        if self.description.chars().count() < DESCRIPTION_MIN_CHARS {
            return Err(RegistryError::Validation {
                field: "description",
                reason: format!("must be at least {DESCRIPTION_MIN_CHARS} characters"),
            });
        }

        let amount = Amount::parse(&self.amount).map_err(|reason| RegistryError::Validation {
            field: "amount",
            reason,
        })?;
        let recipient =
            Address::parse(&self.recipient).map_err(|reason| RegistryError::Validation {
                field: "recipient",
                reason,
            })?;

        if self.deadline <= now {
            return Err(RegistryError::Validation {
                field: "deadline",
                reason: "must be in the future".to_string(),
            });
        }

        Ok((amount, recipient))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProposalDraft {
        ProposalDraft {
            title: "Treasury Diversification".to_string(),
            description: "Allocate 50 ETH to DeFi yield farming protocols".to_string(),
            amount: "50.0".to_string(),
            currency: Currency::Eth,
            recipient: format!("0x{}", "a".repeat(40)),
            category: Category::Treasury,
            deadline: 2_000,
            urgency: Urgency::Medium,
        }
    }

    fn failing_field(draft: &ProposalDraft) -> &'static str {
        match draft.validate(1_000) {
            Err(RegistryError::Validation { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        let (amount, recipient) = draft().validate(1_000).unwrap();
        assert_eq!(amount.as_str(), "50.0");
        assert_eq!(recipient.as_str(), format!("0x{}", "a".repeat(40)));
    }

    #[test]
    fn test_short_title_rejected() {
        let mut d = draft();
        d.title = "Pay".to_string();
        assert_eq!(failing_field(&d), "title");
    }

    #[test]
    fn test_short_description_rejected() {
        let mut d = draft();
        d.description = "Too short".to_string();
        assert_eq!(failing_field(&d), "description");
    }

    #[test]
    fn test_amount_forms() {
        for ok in ["10", "0.5", "1234.5678", "50.0"] {
            assert!(Amount::parse(ok).is_ok(), "{ok} should parse");
        }
        for bad in ["", "0", "0.0", "1.", ".5", "-1", "1e3", "ten", "1.2.3"] {
            assert!(Amount::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_bad_amount_names_field() {
        let mut d = draft();
        d.amount = "0".to_string();
        assert_eq!(failing_field(&d), "amount");
    }

    #[test]
    fn test_recipient_shape() {
        assert!(Address::parse(&format!("0x{}", "a".repeat(40))).is_ok());
        assert!(Address::parse(&format!("0x{}", "A".repeat(40))).is_ok());

        assert!(Address::parse("0xZZZZ").is_err());
        assert!(Address::parse(&format!("0x{}", "z".repeat(40))).is_err());
        assert!(Address::parse(&format!("0x{}", "a".repeat(39))).is_err());
        assert!(Address::parse(&format!("0x{}", "a".repeat(41))).is_err());
        assert!(Address::parse(&"a".repeat(42)).is_err());
    }

    #[test]
    fn test_address_comparison_ignores_case() {
        let lower = Address::parse(&format!("0x{}", "ab".repeat(20))).unwrap();
        let upper = Address::parse(&format!("0x{}", "AB".repeat(20))).unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_bad_recipient_names_field() {
        let mut d = draft();
        d.recipient = "0xZZZZ".to_string();
        assert_eq!(failing_field(&d), "recipient");
    }

    #[test]
    fn test_deadline_must_be_future() {
        let mut d = draft();
        d.deadline = 1_000; // equal to "now" is not strictly after
        assert_eq!(failing_field(&d), "deadline");

        d.deadline = 999;
        assert_eq!(failing_field(&d), "deadline");
    }

    #[test]
    fn test_vote_choice_wire_encoding() {
        assert_eq!(VoteChoice::Approve.wire_value(), 1);
        assert_eq!(VoteChoice::Reject.wire_value(), 2);
        assert_eq!(VoteChoice::from_wire(1), Some(VoteChoice::Approve));
        assert_eq!(VoteChoice::from_wire(2), Some(VoteChoice::Reject));
        assert_eq!(VoteChoice::from_wire(0), None);
        assert_eq!(VoteChoice::from_wire(3), None);
    }

    #[test]
    fn test_status_terminality() {
        assert!(!Status::Active.is_terminal());
        assert!(Status::Executed.is_terminal());
        assert!(Status::Rejected.is_terminal());
    }

    #[test]
    fn test_current_signers_prefers_freshest_count() {
        let mut proposal = Proposal {
            id: ProposalId(1),
            title: "Treasury Diversification".to_string(),
            description: "Allocate 50 ETH to DeFi yield farming protocols".to_string(),
            amount: Amount::parse("50.0").unwrap(),
            currency: Currency::Eth,
            recipient: Address::parse(&format!("0x{}", "a".repeat(40))).unwrap(),
            category: Category::Treasury,
            deadline: 2_000,
            urgency: Urgency::Medium,
            required_signers: 3,
            status: Status::Active,
            votes: vec![],
            on_chain: None,
            created_at: 1_000,
        };

        assert_eq!(proposal.current_signers(), 0);
        assert!(!proposal.quorum_reached());

        // Remote tally ran ahead of the local cache.
        proposal.on_chain = Some(OnChainProposal {
            votes_for: 2,
            votes_against: 1,
            total_votes: 3,
            required_quorum: 3,
            is_active: true,
            is_executed: false,
        });
        assert_eq!(proposal.current_signers(), 3);
        assert!(proposal.quorum_reached());
    }
}
