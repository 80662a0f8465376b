//! Short code generation
//!
//! Codes are deterministic per `(owner, url)`: the generator keeps a ledger of
//! every code it has issued and of the code assigned to each pair. Ledger
//! entries are never released, so a code is never reissued even after its
//! link is deleted.

use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strum::{AsRefStr, EnumIter};
use tracing::{debug, warn};
use uuid::Uuid;
use xxhash_rust::xxh3::xxh3_128;

use crate::errors::{QuotalinkError, Result};
use crate::utils::{BASE62_ALPHABET, encode_base62, generate_random_code};

/// 默认短码长度
pub const DEFAULT_CODE_LENGTH: usize = 7;

/// 最大尝试次数
pub const MAX_ATTEMPTS: u32 = 100;

/// Candidate generation strategy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CodeStrategy {
    /// Uniformly random alphanumeric characters.
    Random,
    /// 128-bit content hash rendered in base62.
    #[default]
    Base62,
    /// SHA-256 rendered as URL-safe base64.
    Hash,
}

impl std::fmt::Display for CodeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl FromStr for CodeStrategy {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "base62" => Ok(Self::Base62),
            "hash" => Ok(Self::Hash),
            _ => Err(format!(
                "Invalid generation algorithm: '{}'. Valid: random, base62, hash",
                s
            )),
        }
    }
}

pub struct ShortCodeGenerator {
    strategy: CodeStrategy,
    code_length: usize,
    /// 已发放的全部短码
    issued: DashSet<String>,
    /// (owner, url) -> 已分配的短码
    assigned: DashMap<(Uuid, String), String>,
}

impl ShortCodeGenerator {
    /// A zero `code_length` falls back to [`DEFAULT_CODE_LENGTH`].
    pub fn new(strategy: CodeStrategy, code_length: usize) -> Self {
        let code_length = if code_length == 0 {
            DEFAULT_CODE_LENGTH
        } else {
            code_length
        };
        Self {
            strategy,
            code_length,
            issued: DashSet::new(),
            assigned: DashMap::new(),
        }
    }

    pub fn strategy(&self) -> CodeStrategy {
        self.strategy
    }

    pub fn code_length(&self) -> usize {
        self.code_length
    }

    /// Return the code for `(url, owner)`, issuing a new one on first use.
    ///
    /// The ledger entry for the pair is held locked while a new code is
    /// chosen, so two concurrent calls for the same pair agree on one code.
    pub fn generate(&self, url: &str, owner: Uuid) -> Result<String> {
        if url.is_empty() {
            return Err(QuotalinkError::invalid_input("URL cannot be empty"));
        }
        if owner.is_nil() {
            return Err(QuotalinkError::invalid_input("Owner id cannot be nil"));
        }

        match self.assigned.entry((owner, url.to_string())) {
            Entry::Occupied(existing) => Ok(existing.get().clone()),
            Entry::Vacant(slot) => {
                let code = self.issue_new(url, owner)?;
                slot.insert(code.clone());
                Ok(code)
            }
        }
    }

    fn issue_new(&self, url: &str, owner: Uuid) -> Result<String> {
        for attempt in 1..=MAX_ATTEMPTS {
            let seeded = format!("{}:{}:{}", url, owner, attempt);
            let candidate = self.candidate(&seeded);

            // insert 返回 false 说明已被占用
            if self.issued.insert(candidate.clone()) {
                if attempt > 1 {
                    debug!(
                        "ShortCodeGenerator: issued '{}' after {} attempts",
                        candidate, attempt
                    );
                }
                return Ok(candidate);
            }
        }

        warn!(
            "ShortCodeGenerator: no free code for owner {} after {} attempts",
            owner, MAX_ATTEMPTS
        );
        Err(QuotalinkError::code_space_exhausted(format!(
            "Failed to generate unique code after {} attempts",
            MAX_ATTEMPTS
        )))
    }

    fn candidate(&self, seeded: &str) -> String {
        match self.strategy {
            CodeStrategy::Random => generate_random_code(self.code_length),
            CodeStrategy::Base62 => base62_code(seeded, self.code_length),
            CodeStrategy::Hash => hash_code(seeded, self.code_length),
        }
    }

    /// Whether `code` has been issued by this generator.
    pub fn is_issued(&self, code: &str) -> bool {
        self.issued.contains(code)
    }

    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }
}

/// xxh3-128 of the input in base62, left-padded with `0` and cut to `length`.
fn base62_code(input: &str, length: usize) -> String {
    let digits = encode_base62(xxh3_128(input.as_bytes()));
    if digits.len() >= length {
        return digits[..length].to_string();
    }
    let pad = char::from(BASE62_ALPHABET[0]).to_string().repeat(length - digits.len());
    pad + &digits
}

/// SHA-256 of the input as unpadded URL-safe base64, cut to `length`.
fn hash_code(input: &str, length: usize) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut encoded = URL_SAFE_NO_PAD.encode(digest);
    encoded.truncate(length.min(encoded.len()));
    encoded
}
