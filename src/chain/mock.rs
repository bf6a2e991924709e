//! Mock treasury contract for testing.
//!
//! In-memory stand-in for the on-chain contract: records every call for
//! assertions, supports failure injection, and tallies "encrypted" votes
//! by decoding the mock codec's token format (standing in for the
//! homomorphic aggregation the real contract performs).

use super::traits::*;
use crate::codec::{mock::decode_token, Ciphertext, Proof};
use crate::registry::proposal::{Address, Amount, ProposalId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Mock treasury contract.
#[derive(Clone)]
pub struct MockTreasury {
    state: Arc<Mutex<MockState>>,
    events: broadcast::Sender<ProposalEvent>,
}

#[derive(Default)]
struct MockState {
    proposals: Vec<SubmittedProposal>,
    votes: HashMap<u64, Vec<Ciphertext>>,
    transfers: Vec<TransferCall>,
    deposits: Vec<Ciphertext>,
    signers: Vec<Address>,
    required_signatures: u32,
    fail_submissions: bool,
    fail_votes: bool,
    fail_transfers: bool,
}

/// A recorded `submit_proposal` call.
#[derive(Debug, Clone)]
pub struct SubmittedProposal {
    pub title: String,
    pub description: String,
    pub quorum: Ciphertext,
    pub proof: Proof,
}

/// A recorded `transfer_funds` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferCall {
    pub proposal: ProposalId,
    pub recipient: Address,
    pub amount: Amount,
}

impl MockTreasury {
    /// Create a mock contract configured with a signature threshold.
    pub fn new(required_signatures: u32) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(MockState {
                required_signatures,
                ..Default::default()
            })),
            events,
        }
    }

    /// Register a signer on the roster reported by `read_treasury`.
    pub fn add_signer(&self, signer: Address) {
        self.state.lock().unwrap().signers.push(signer);
    }

    /// Recorded proposal submissions, in order.
    pub fn submissions(&self) -> Vec<SubmittedProposal> {
        self.state.lock().unwrap().proposals.clone()
    }

    /// Recorded vote ciphertexts for a proposal.
    pub fn votes_for(&self, proposal: ProposalId) -> Vec<Ciphertext> {
        self.state
            .lock()
            .unwrap()
            .votes
            .get(&proposal.0)
            .cloned()
            .unwrap_or_default()
    }

    /// Recorded fund transfers, in order.
    pub fn transfers(&self) -> Vec<TransferCall> {
        self.state.lock().unwrap().transfers.clone()
    }

    /// Recorded deposit ciphertexts, in order.
    pub fn deposits(&self) -> Vec<Ciphertext> {
        self.state.lock().unwrap().deposits.clone()
    }

    /// Make subsequent `submit_proposal` calls revert.
    pub fn fail_submissions(&self, fail: bool) {
        self.state.lock().unwrap().fail_submissions = fail;
    }

    /// Make subsequent `submit_vote` calls revert.
    pub fn fail_votes(&self, fail: bool) {
        self.state.lock().unwrap().fail_votes = fail;
    }

    /// Make subsequent `transfer_funds` calls revert.
    pub fn fail_transfers(&self, fail: bool) {
        self.state.lock().unwrap().fail_transfers = fail;
    }

    fn emit(&self, event: ProposalEvent) {
        // No subscribers is fine; events are best-effort.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl TreasuryContract for MockTreasury {
    async fn submit_proposal(
        &self,
        title: &str,
        description: &str,
        quorum: &Ciphertext,
        proof: &Proof,
    ) -> ChainResult<TransactionId> {
        let proposal = {
            let mut state = self.state.lock().unwrap();
            if state.fail_submissions {
                return Err(ChainError::Reverted("proposal rejected".to_string()));
            }
            state.proposals.push(SubmittedProposal {
                title: title.to_string(),
                description: description.to_string(),
                quorum: quorum.clone(),
                proof: proof.clone(),
            });
            ProposalId(state.proposals.len() as u64)
        };

        let tx = TransactionId::new();
        self.emit(ProposalEvent::ProposalSubmitted { proposal, tx });
        Ok(tx)
    }

    async fn submit_vote(
        &self,
        proposal: ProposalId,
        choice: &Ciphertext,
        _proof: &Proof,
    ) -> ChainResult<TransactionId> {
        let total_votes = {
            let mut state = self.state.lock().unwrap();
            if state.fail_votes {
                return Err(ChainError::Reverted("vote rejected".to_string()));
            }
            if proposal.0 == 0 || proposal.0 > state.proposals.len() as u64 {
                return Err(ChainError::UnknownProposal(proposal));
            }
            let votes = state.votes.entry(proposal.0).or_default();
            votes.push(choice.clone());
            votes.len() as u32
        };

        self.emit(ProposalEvent::VoteCast {
            proposal,
            total_votes,
        });
        Ok(TransactionId::new())
    }

    async fn transfer_funds(
        &self,
        proposal: ProposalId,
        recipient: &Address,
        amount: &Amount,
    ) -> ChainResult<TransactionId> {
        {
            let mut state = self.state.lock().unwrap();
            if state.fail_transfers {
                return Err(ChainError::Reverted("transfer rejected".to_string()));
            }
            if proposal.0 == 0 || proposal.0 > state.proposals.len() as u64 {
                return Err(ChainError::UnknownProposal(proposal));
            }
            state.transfers.push(TransferCall {
                proposal,
                recipient: recipient.clone(),
                amount: amount.clone(),
            });
        }

        let tx = TransactionId::new();
        self.emit(ProposalEvent::FundsTransferred { proposal, tx });
        Ok(tx)
    }

    async fn deposit_funds(
        &self,
        amount: &Ciphertext,
        _proof: &Proof,
    ) -> ChainResult<TransactionId> {
        self.state.lock().unwrap().deposits.push(amount.clone());
        let tx = TransactionId::new();
        self.emit(ProposalEvent::Deposited { tx });
        Ok(tx)
    }

    async fn read_proposal(&self, proposal: ProposalId) -> ChainResult<OnChainProposal> {
        let state = self.state.lock().unwrap();
        let submitted = match proposal.0 {
            0 => None,
            id => state.proposals.get(id as usize - 1),
        }
        .ok_or(ChainError::UnknownProposal(proposal))?;

        // Stand-in for the homomorphic tally: decode the mock tokens.
        let mut votes_for = 0;
        let mut votes_against = 0;
        for choice in state.votes.get(&proposal.0).into_iter().flatten() {
            match decode_token(choice) {
                Ok(1) => votes_for += 1,
                Ok(2) => votes_against += 1,
                _ => {}
            }
        }

        let is_executed = state.transfers.iter().any(|t| t.proposal == proposal);
        Ok(OnChainProposal {
            votes_for,
            votes_against,
            total_votes: votes_for + votes_against,
            required_quorum: decode_token(&submitted.quorum).unwrap_or(0) as u32,
            is_active: !is_executed,
            is_executed,
        })
    }

    async fn read_treasury(&self) -> ChainResult<TreasuryInfo> {
        let state = self.state.lock().unwrap();
        let total: u64 = state
            .deposits
            .iter()
            .filter_map(|d| decode_token(d).ok())
            .sum();

        Ok(TreasuryInfo {
            total_funds: total.to_string(),
            available_funds: total.to_string(),
            locked_funds: "0".to_string(),
            required_signatures: state.required_signatures,
            signers: state.signers.clone(),
        })
    }

    async fn subscribe(&self) -> ChainResult<EventStream> {
        let stream = BroadcastStream::new(self.events.subscribe()).filter_map(|event| event.ok());
        Ok(Box::new(stream))
    }
}
