//! Deterministic address derivation
//!
//! Maps (owner identity, namespace tag) to a storage address plus a
//! disambiguation value ("bump"). The mapping is a pure function: there is
//! no directory that could drift from the derivation rule.
//!
//! A candidate address for bump B is
//! `SHA-256(namespace ‖ owner ‖ [B] ‖ domain separator)`. The candidate is
//! valid only if it is off-curve, i.e. does not decode as an Ed25519
//! public key, so no signing keypair can ever claim the address. The bump
//! search runs 255 down to 0 and the first valid candidate wins.

use crate::{
    error::{Error, Result},
    types::{OwnerId, StoreAddress},
};
use ed25519_dalek::VerifyingKey;
use sha2::{Digest, Sha256};

/// Namespace tag for store accounts. Distinguishes this ledger's address
/// space from any other address space sharing the same owner identity.
pub const STORE_NAMESPACE: &[u8] = b"store_account";

/// Domain separator folded into every candidate hash.
const DERIVATION_DOMAIN: &[u8] = b"store-ledger:derived-address:v1";

/// Derive the storage address and bump for an owner under a namespace tag.
///
/// Deterministic: repeated calls with the same inputs yield the identical
/// address and bump. Fails with [`Error::AddressDerivation`] only if no
/// bump in 0..=255 yields an off-curve address.
pub fn derive(owner: &OwnerId, namespace: &[u8]) -> Result<(StoreAddress, u8)> {
    for bump in (0u8..=255).rev() {
        let candidate = candidate_address(owner, namespace, bump);
        if is_off_curve(&candidate) {
            return Ok((StoreAddress::new(candidate), bump));
        }
    }
    Err(Error::AddressDerivation(*owner))
}

/// Derive the store account address for an owner under [`STORE_NAMESPACE`].
pub fn derive_store_address(owner: &OwnerId) -> Result<(StoreAddress, u8)> {
    derive(owner, STORE_NAMESPACE)
}

fn candidate_address(owner: &OwnerId, namespace: &[u8], bump: u8) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(namespace);
    hasher.update(owner.as_bytes());
    hasher.update([bump]);
    hasher.update(DERIVATION_DOMAIN);
    hasher.finalize().into()
}

/// A 32-byte string is off-curve when it fails Ed25519 point decompression.
fn is_off_curve(bytes: &[u8; 32]) -> bool {
    VerifyingKey::from_bytes(bytes).is_err()
}
