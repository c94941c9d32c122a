//! Address normalization seam.
//!
//! Two spellings of the same account compare equal only after they have
//! been re-encoded to one canonical form. The encoding itself belongs to
//! the caller; the engines only see [`AddressCodec`].

use crate::types::Address;

/// Normalizes raw account strings for a network.
pub trait AddressCodec: Send + Sync {
    /// Canonical encoding of `address` on `network`.
    fn normalize(&self, address: &str, network: &str) -> Address;
}

/// Codec for inputs that are already canonical. Only strips whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrimmingCodec;

impl AddressCodec for TrimmingCodec {
    fn normalize(&self, address: &str, _network: &str) -> Address {
        Address::from(address.trim())
    }
}
