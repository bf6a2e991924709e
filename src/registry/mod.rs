//! Proposal registry: the authoritative lifecycle for governance
//! proposals.
//!
//! State machine: `Active -> Executed`, `Active -> Rejected`. Terminal
//! states never regress. The registry exclusively owns Proposal and Vote
//! mutation; view layers receive owned, versioned snapshots and route
//! every intent back through the operations here.
//!
//! Operations take `&mut self`, so the single-writer guarantee is the
//! borrow checker's. Each operation mutates only after every remote call
//! in it has succeeded: cancelling an in-flight call leaves no
//! half-created proposal or vote behind.

pub mod proposal;
pub mod quorum;
#[cfg(test)]
mod proptests;

use crate::chain::retry::{is_chain_error_retryable, retry_with_backoff};
use crate::chain::traits::{TransactionId, TreasuryContract, TreasuryInfo};
use crate::codec::EncryptionCodec;
use crate::wallet::WalletSession;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

pub use proposal::{
    Address, Amount, Category, Currency, Proposal, ProposalDraft, ProposalId, Status, Urgency,
    Vote, VoteChoice,
};
pub use quorum::{QuorumView, RevealedVote, Tally};

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registry operation errors.
///
/// Every variant is the machine-checkable kind; `Display` carries the
/// human-readable message. None is fatal to the process.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    /// A draft field failed a constraint. Local; the caller corrects the
    /// input and resubmits.
    #[error("invalid {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },

    /// No authorized signer available. Local; the caller connects a
    /// wallet and retries.
    #[error("no wallet connected")]
    WalletNotConnected,

    /// The remote proposal submission failed. No proposal was recorded.
    #[error("proposal submission failed: {0}")]
    SubmissionFailed(String),

    /// The remote vote submission failed. No vote was recorded.
    #[error("vote submission failed: {0}")]
    VoteSubmissionFailed(String),

    /// The ledger refused or lost the fund transfer. The proposal stays
    /// active so finalization can be retried.
    #[error("ledger transfer failed: {0}")]
    LedgerTransferFailed(String),

    /// The decrypt capability failed mid-reveal. Votes stay encrypted.
    #[error("vote reveal failed: {0}")]
    RevealFailed(String),

    /// Reading the authoritative ledger state failed.
    #[error("ledger read failed: {0}")]
    LedgerReadFailed(String),

    /// Policy violation: one vote per signer per proposal.
    #[error("signer {0} already voted on proposal {1}")]
    AlreadyVoted(Address, ProposalId),

    #[error("proposal {0} not found")]
    ProposalNotFound(ProposalId),

    /// Policy violation: the proposal is in a terminal state.
    #[error("proposal {0} is no longer active")]
    ProposalNotActive(ProposalId),

    #[error("quorum not reached: {current} of {required} signers")]
    QuorumNotReached { current: u32, required: u32 },
}

/// Whether an error is a transient remote failure worth retrying.
///
/// Policy violations and validation failures are deterministic and must
/// never be retried automatically.
pub fn is_registry_error_retryable(err: &RegistryError) -> bool {
    matches!(
        err,
        RegistryError::SubmissionFailed(_)
            | RegistryError::VoteSubmissionFailed(_)
            | RegistryError::LedgerTransferFailed(_)
            | RegistryError::RevealFailed(_)
            | RegistryError::LedgerReadFailed(_)
    )
}

/// Receipt returned by [`ProposalRegistry::cast_vote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteReceipt {
    pub vote_id: u64,
    pub transaction: TransactionId,
    /// True once this vote pushed the count to the threshold. Unlocks
    /// the reveal; the status itself only changes in `finalize`.
    pub quorum_reached: bool,
}

/// Outcome of [`ProposalRegistry::finalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    Executed {
        tally: Tally,
        transaction: TransactionId,
    },
    Rejected {
        tally: Tally,
    },
    /// The proposal was already terminal; nothing changed.
    AlreadyFinal { status: Status },
}

/// Owned, versioned snapshot handed to view layers.
///
/// `version` increments on every successful registry mutation, so a view
/// can cheaply detect staleness.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub version: u64,
    pub proposals: Vec<Proposal>,
}

/// The proposal registry.
///
/// Generic over the two consumed capabilities so tests and the simulator
/// can run against in-memory mocks.
pub struct ProposalRegistry<C, E> {
    chain: C,
    codec: E,
    /// Multisig threshold applied to every new proposal. Must be at
    /// least 1.
    required_signers: u32,
    proposals: Vec<Proposal>,
    next_id: u64,
    version: u64,
}

impl<C, E> ProposalRegistry<C, E>
where
    C: TreasuryContract,
    E: EncryptionCodec,
{
    pub fn new(chain: C, codec: E, required_signers: u32) -> Self {
        Self {
            chain,
            codec,
            required_signers,
            proposals: Vec::new(),
            next_id: 1,
            version: 0,
        }
    }

    pub fn required_signers(&self) -> u32 {
        self.required_signers
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Owned snapshot of all proposals for the view layer.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: self.version,
            proposals: self.proposals.clone(),
        }
    }

    fn proposal(&self, id: ProposalId) -> RegistryResult<&Proposal> {
        self.proposals
            .iter()
            .find(|p| p.id == id)
            .ok_or(RegistryError::ProposalNotFound(id))
    }

    fn proposal_mut(&mut self, id: ProposalId) -> RegistryResult<&mut Proposal> {
        self.proposals
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RegistryError::ProposalNotFound(id))
    }

    /// Validate and submit a new proposal.
    ///
    /// The draft is validated in full before any remote call. The quorum
    /// threshold (not the amount) is what gets encrypted: the contract
    /// compares its running tally against this value. Encryption or
    /// submission failure aborts with no proposal recorded.
    pub async fn submit_proposal(
        &mut self,
        session: &WalletSession,
        draft: ProposalDraft,
    ) -> RegistryResult<ProposalId> {
        let now = unix_now();
        let (amount, recipient) = draft.validate(now)?;
        let proposer = session
            .signer()
            .ok_or(RegistryError::WalletNotConnected)?
            .clone();

        let (ciphertext, proof) = self
            .codec
            .encrypt(u64::from(self.required_signers))
            .await
            .map_err(|e| RegistryError::SubmissionFailed(format!("quorum encryption: {e}")))?;

        let tx = self
            .chain
            .submit_proposal(&draft.title, &draft.description, &ciphertext, &proof)
            .await
            .map_err(|e| RegistryError::SubmissionFailed(e.to_string()))?;

        let id = ProposalId(self.next_id);
        self.next_id += 1;
        self.proposals.push(Proposal {
            id,
            title: draft.title,
            description: draft.description,
            amount,
            currency: draft.currency,
            recipient,
            category: draft.category,
            deadline: draft.deadline,
            urgency: draft.urgency,
            required_signers: self.required_signers,
            status: Status::Active,
            votes: Vec::new(),
            on_chain: None,
            created_at: now,
        });
        self.version += 1;

        tracing::info!(proposal = %id, %tx, proposer = %proposer, "proposal submitted");
        Ok(id)
    }

    /// Cast an encrypted vote on an active proposal.
    ///
    /// Repeated votes by the same signer are refused, never overwritten.
    pub async fn cast_vote(
        &mut self,
        session: &WalletSession,
        id: ProposalId,
        choice: VoteChoice,
    ) -> RegistryResult<VoteReceipt> {
        let signer = session
            .signer()
            .ok_or(RegistryError::WalletNotConnected)?
            .clone();

        {
            let proposal = self.proposal(id)?;
            if proposal.status != Status::Active {
                return Err(RegistryError::ProposalNotActive(id));
            }
            if proposal.has_voted(&signer) {
                return Err(RegistryError::AlreadyVoted(signer, id));
            }
        }

        let (ciphertext, proof) = self
            .codec
            .encrypt(choice.wire_value())
            .await
            .map_err(|e| RegistryError::VoteSubmissionFailed(format!("choice encryption: {e}")))?;

        let tx = self
            .chain
            .submit_vote(id, &ciphertext, &proof)
            .await
            .map_err(|e| RegistryError::VoteSubmissionFailed(e.to_string()))?;

        let proposal = self.proposal_mut(id)?;
        let vote_id = proposal.votes.len() as u64 + 1;
        proposal.votes.push(Vote {
            id: vote_id,
            signer: signer.clone(),
            ciphertext,
            encrypted: true,
            revealed: None,
        });
        let quorum_reached = proposal.quorum_reached();
        self.version += 1;

        tracing::info!(
            proposal = %id,
            vote = vote_id,
            signer = %signer,
            quorum_reached,
            "vote recorded"
        );
        Ok(VoteReceipt {
            vote_id,
            transaction: tx,
            quorum_reached,
        })
    }

    /// Evaluate the quorum condition over the current snapshot.
    ///
    /// Pure: never mutates registry state. When quorum holds, the reveal
    /// mapping is produced with one decrypt per still-encrypted vote;
    /// already-revealed votes are reused as-is, so re-evaluation yields
    /// the same mapping and nothing is ever re-encrypted.
    pub async fn evaluate_quorum(&self, id: ProposalId) -> RegistryResult<QuorumView> {
        let proposal = self.proposal(id)?;
        if !proposal.quorum_reached() {
            return Ok(QuorumView::not_reached());
        }

        let mut revealed = Vec::with_capacity(proposal.votes.len());
        for vote in &proposal.votes {
            let choice = match vote.revealed {
                Some(choice) => choice,
                None => {
                    let value = self
                        .codec
                        .decrypt(&vote.ciphertext)
                        .await
                        .map_err(|e| RegistryError::RevealFailed(e.to_string()))?;
                    VoteChoice::from_wire(value).ok_or_else(|| {
                        RegistryError::RevealFailed(format!("unknown choice encoding {value}"))
                    })?
                }
            };
            revealed.push(RevealedVote {
                vote_id: vote.id,
                signer: vote.signer.clone(),
                choice,
            });
        }

        Ok(QuorumView {
            reached: true,
            revealed: Some(revealed),
        })
    }

    /// Drive a quorate proposal to its terminal state.
    ///
    /// A strict approve majority executes the proposal and releases the
    /// funds; ties and reject majorities reject it, so funds never move
    /// on a tie. Terminal proposals are a no-op, not an error. A failed
    /// ledger transfer leaves the proposal active and its votes
    /// unrevealed: nothing is recorded as executed until the ledger
    /// confirms.
    pub async fn finalize(&mut self, id: ProposalId) -> RegistryResult<FinalizeOutcome> {
        {
            let proposal = self.proposal(id)?;
            if proposal.status.is_terminal() {
                tracing::debug!(proposal = %id, status = ?proposal.status, "finalize on terminal proposal");
                return Ok(FinalizeOutcome::AlreadyFinal {
                    status: proposal.status,
                });
            }
        }

        let view = self.evaluate_quorum(id).await?;
        let revealed = match view.revealed {
            Some(revealed) => revealed,
            None => {
                let proposal = self.proposal(id)?;
                return Err(RegistryError::QuorumNotReached {
                    current: proposal.current_signers(),
                    required: proposal.required_signers,
                });
            }
        };

        let tally = Tally::count(&revealed);
        if tally.passes() {
            let (recipient, amount) = {
                let proposal = self.proposal(id)?;
                (proposal.recipient.clone(), proposal.amount.clone())
            };
            let tx = self
                .chain
                .transfer_funds(id, &recipient, &amount)
                .await
                .map_err(|e| RegistryError::LedgerTransferFailed(e.to_string()))?;

            self.apply_reveal(id, &revealed);
            let proposal = self.proposal_mut(id)?;
            proposal.status = Status::Executed;
            self.version += 1;

            tracing::info!(
                proposal = %id,
                approve = tally.approve,
                reject = tally.reject,
                %tx,
                "proposal executed"
            );
            Ok(FinalizeOutcome::Executed {
                tally,
                transaction: tx,
            })
        } else {
            self.apply_reveal(id, &revealed);
            let proposal = self.proposal_mut(id)?;
            proposal.status = Status::Rejected;
            self.version += 1;

            tracing::info!(
                proposal = %id,
                approve = tally.approve,
                reject = tally.reject,
                "proposal rejected"
            );
            Ok(FinalizeOutcome::Rejected { tally })
        }
    }

    /// Reconcile the local cache with the ledger's authoritative tally.
    ///
    /// The read is side-effect free, so transient network failures are
    /// retried with backoff before surfacing.
    pub async fn refresh(&mut self, id: ProposalId) -> RegistryResult<()> {
        self.proposal(id)?;

        let chain = &self.chain;
        let on_chain = retry_with_backoff(|| chain.read_proposal(id), is_chain_error_retryable)
            .await
            .map_err(|e| RegistryError::LedgerReadFailed(e.to_string()))?;

        let proposal = self.proposal_mut(id)?;
        proposal.on_chain = Some(on_chain);
        self.version += 1;

        tracing::debug!(proposal = %id, total_votes = on_chain.total_votes, "tally refreshed");
        Ok(())
    }

    /// Encrypt and deposit funds into the treasury.
    pub async fn deposit(
        &mut self,
        session: &WalletSession,
        amount: u64,
    ) -> RegistryResult<TransactionId> {
        let depositor = session
            .signer()
            .ok_or(RegistryError::WalletNotConnected)?
            .clone();

        let (ciphertext, proof) = self
            .codec
            .encrypt(amount)
            .await
            .map_err(|e| RegistryError::SubmissionFailed(format!("amount encryption: {e}")))?;
        let tx = self
            .chain
            .deposit_funds(&ciphertext, &proof)
            .await
            .map_err(|e| RegistryError::SubmissionFailed(e.to_string()))?;

        tracing::info!(%tx, depositor = %depositor, "funds deposited");
        Ok(tx)
    }

    /// Treasury balances and signer roster, straight from the ledger.
    pub async fn treasury(&self) -> RegistryResult<TreasuryInfo> {
        self.chain
            .read_treasury()
            .await
            .map_err(|e| RegistryError::LedgerReadFailed(e.to_string()))
    }

    /// Persist a reveal mapping onto the proposal's votes. Idempotent.
    fn apply_reveal(&mut self, id: ProposalId, revealed: &[RevealedVote]) {
        if let Some(proposal) = self.proposals.iter_mut().find(|p| p.id == id) {
            for reveal in revealed {
                if let Some(vote) = proposal.votes.iter_mut().find(|v| v.id == reveal.vote_id) {
                    vote.encrypted = false;
                    vote.revealed = Some(reveal.choice);
                }
            }
        }
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
