//! A 20-byte SHA-1 digest, the address of an object or the integrity tag of
//! the index. Grounded on the teacher's `ObjectHash` (object.rs), but this
//! type carries no notion of *when* it was hashed relative to compression —
//! callers decide that (see `store.rs`).

use std::fmt::{self, Debug, Display};

use sha1::{Digest as _, Sha1};

use crate::error::DircacheError;
use crate::hex;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; 20]);

impl Digest {
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(bytes);
        Self(hasher.finalize().into())
    }

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, DircacheError> {
        Ok(Self(hex::from_hex(s)?))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::to_hex(&self.0)
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}
