//! # Root Hashes
//!
//! A [`RootHash`] names the root of a filesystem-tree snapshot in the content
//! store. The history never interprets it: it is stored, compared and printed.
//!
//! ## Textual Form
//!
//! ```text
//! 3f1a...e9            # sha1 (no suffix)
//! 3f1a...e9-rmd160     # ripemd-160
//! 3f1a...e9-shake128   # shake-128, truncated to 160 bits
//! ```
//!
//! All supported algorithms produce 20-byte digests, so a hash is always
//! 40 hex characters plus an optional algorithm suffix.

use crate::error::{HistoryError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub const DIGEST_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha1,
    Rmd160,
    Shake128,
}

impl HashAlgorithm {
    pub fn suffix(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "",
            HashAlgorithm::Rmd160 => "-rmd160",
            HashAlgorithm::Shake128 => "-shake128",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "" => Some(HashAlgorithm::Sha1),
            "-rmd160" => Some(HashAlgorithm::Rmd160),
            "-shake128" => Some(HashAlgorithm::Shake128),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RootHash {
    algorithm: HashAlgorithm,
    digest: [u8; DIGEST_LEN],
}

impl RootHash {
    pub fn new(algorithm: HashAlgorithm, digest: [u8; DIGEST_LEN]) -> Self {
        Self { algorithm, digest }
    }

    pub fn sha1(digest: [u8; DIGEST_LEN]) -> Self {
        Self::new(HashAlgorithm::Sha1, digest)
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn digest(&self) -> &[u8; DIGEST_LEN] {
        &self.digest
    }

    pub fn is_null(&self) -> bool {
        self.digest.iter().all(|b| *b == 0)
    }
}

// Raw digest bytes first; the algorithm only separates equal digests.
impl Ord for RootHash {
    fn cmp(&self, other: &Self) -> Ordering {
        self.digest
            .cmp(&other.digest)
            .then(self.algorithm.cmp(&other.algorithm))
    }
}

impl PartialOrd for RootHash {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RootHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", hex::encode(self.digest), self.algorithm.suffix())
    }
}

impl FromStr for RootHash {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self> {
        let hex_len = DIGEST_LEN * 2;
        if s.len() < hex_len || !s.is_char_boundary(hex_len) {
            return Err(HistoryError::InvalidHash(format!(
                "'{}' is shorter than {} hex digits",
                s, hex_len
            )));
        }
        let (hex_part, suffix) = s.split_at(hex_len);
        let algorithm = HashAlgorithm::from_suffix(suffix).ok_or_else(|| {
            HistoryError::InvalidHash(format!("unknown algorithm suffix '{}'", suffix))
        })?;
        let mut digest = [0u8; DIGEST_LEN];
        hex::decode_to_slice(hex_part, &mut digest)
            .map_err(|e| HistoryError::InvalidHash(format!("'{}': {}", s, e)))?;
        Ok(Self { algorithm, digest })
    }
}

impl Serialize for RootHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RootHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
