//! Treasury contract boundary.
//!
//! The external contract holds the funds and performs the encrypted
//! tallying; everything in this crate talks to it through the
//! [`TreasuryContract`] trait.

pub mod mock;
pub mod retry;
pub mod traits;

pub use mock::MockTreasury;
pub use retry::{is_chain_error_retryable, retry_with_backoff};
pub use traits::{
    ChainError, ChainResult, EventStream, OnChainProposal, ProposalEvent, TransactionId,
    TreasuryContract, TreasuryInfo,
};
