//! VaultGuard - Confidential Multisig Treasury Governance
//!
//! The authoritative proposal registry for a multisig treasury whose
//! votes stay encrypted until quorum is reached.
//!
//! Key principles:
//! - The registry owns the proposal/vote lifecycle; views get snapshots
//! - Votes are opaque commitments until the signer threshold is crossed
//! - The ledger is the source of truth; local state is a refreshable cache
//! - Encryption and fund custody are consumed capabilities, not built here

pub mod chain;
pub mod codec;
pub mod registry;
pub mod wallet;
