//! Trait abstraction for the treasury contract.
//!
//! The contract performs the encrypted vote tallying, threshold checks,
//! and fund custody on-chain. This crate only ever sees the operations
//! below; the trait boundary enables mock implementations for testing.

use crate::codec::{Ciphertext, Proof};
use crate::registry::proposal::{Address, Amount, ProposalId};
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Ledger transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Proposal tally as the contract reports it.
///
/// The registry caches this per proposal; it is the authoritative count
/// and may run ahead of the locally recorded votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnChainProposal {
    pub votes_for: u32,
    pub votes_against: u32,
    pub total_votes: u32,
    pub required_quorum: u32,
    pub is_active: bool,
    pub is_executed: bool,
}

/// Treasury balances and signer roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryInfo {
    pub total_funds: String,
    pub available_funds: String,
    pub locked_funds: String,
    pub required_signatures: u32,
    pub signers: Vec<Address>,
}

/// Push notification from the contract's event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalEvent {
    ProposalSubmitted {
        proposal: ProposalId,
        tx: TransactionId,
    },
    VoteCast {
        proposal: ProposalId,
        total_votes: u32,
    },
    FundsTransferred {
        proposal: ProposalId,
        tx: TransactionId,
    },
    Deposited {
        tx: TransactionId,
    },
}

/// Result type for contract operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Contract operation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ChainError {
    #[error("network error: {0}")]
    Network(String),

    #[error("transaction reverted: {0}")]
    Reverted(String),

    #[error("proposal {0} not found on chain")]
    UnknownProposal(ProposalId),

    #[error("event subscription failed: {0}")]
    Subscription(String),
}

/// Event stream handed to subscribers.
pub type EventStream = Box<dyn Stream<Item = ProposalEvent> + Send + Unpin>;

/// Treasury contract abstraction.
///
/// Quorum values and vote choices are submitted as opaque ciphertexts;
/// the contract tallies them homomorphically and never reveals
/// individual choices before quorum.
#[async_trait]
pub trait TreasuryContract: Send + Sync {
    /// Register a proposal with its encrypted quorum threshold.
    async fn submit_proposal(
        &self,
        title: &str,
        description: &str,
        quorum: &Ciphertext,
        proof: &Proof,
    ) -> ChainResult<TransactionId>;

    /// Submit an encrypted vote choice for a proposal.
    async fn submit_vote(
        &self,
        proposal: ProposalId,
        choice: &Ciphertext,
        proof: &Proof,
    ) -> ChainResult<TransactionId>;

    /// Release funds to the recipient of a passed proposal.
    async fn transfer_funds(
        &self,
        proposal: ProposalId,
        recipient: &Address,
        amount: &Amount,
    ) -> ChainResult<TransactionId>;

    /// Deposit an encrypted amount into the treasury.
    async fn deposit_funds(&self, amount: &Ciphertext, proof: &Proof)
        -> ChainResult<TransactionId>;

    /// Read the authoritative tally for a proposal.
    async fn read_proposal(&self, proposal: ProposalId) -> ChainResult<OnChainProposal>;

    /// Read treasury balances and the signer roster.
    async fn read_treasury(&self) -> ChainResult<TreasuryInfo>;

    /// Subscribe to contract events.
    ///
    /// Lets a view layer refresh on push instead of polling the tally.
    async fn subscribe(&self) -> ChainResult<EventStream>;
}
