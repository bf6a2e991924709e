//! Wallet session state.
//!
//! Tracks which signer, if any, is currently connected. Mutating
//! registry operations require a connected signer; the handshake with
//! the actual wallet provider happens outside this crate.

use crate::registry::proposal::Address;

/// Connected-wallet session.
#[derive(Debug, Clone, Default)]
pub struct WalletSession {
    address: Option<Address>,
}

impl WalletSession {
    /// Session with no wallet connected.
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Session connected as `address`.
    pub fn connected(address: Address) -> Self {
        Self {
            address: Some(address),
        }
    }

    pub fn connect(&mut self, address: Address) {
        self.address = Some(address);
    }

    pub fn disconnect(&mut self) {
        self.address = None;
    }

    /// The connected signer, if any.
    pub fn signer(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }
}
