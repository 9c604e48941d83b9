//! Simulated accounts
//!
//! A `SimAccount` is an address plus the key material the harness signs
//! with. The key never leaves the harness: it is not serialized and its
//! `Debug` output is redacted.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Ledger address (account or validator operator)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Opaque signing capability held by the harness
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey([u8; 32]);

impl SigningKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Deterministic test key derived from a label
    pub fn derive(label: &str) -> Self {
        let digest = Sha256::digest(label.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Short public identifier, safe to log
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0);
        digest[..4].iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey({}…)", self.fingerprint())
    }
}

/// An account the harness can sign for
///
/// # Example
/// ```
/// use ledger_simulator_core::SimAccount;
///
/// let acc = SimAccount::with_derived_key("val-0");
/// assert_eq!(acc.address().as_str(), "val-0");
/// ```
#[derive(Debug, Clone)]
pub struct SimAccount {
    address: Address,
    signer: SigningKey,
}

impl SimAccount {
    pub fn new(address: Address, signer: SigningKey) -> Self {
        Self { address, signer }
    }

    /// Account whose key is derived from its address
    pub fn with_derived_key(address: &str) -> Self {
        Self::new(Address::new(address), SigningKey::derive(address))
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn signer(&self) -> &SigningKey {
        &self.signer
    }
}
