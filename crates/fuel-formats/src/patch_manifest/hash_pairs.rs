//! Hash pairs submitted to the patch lookup service
//!
//! Each file to fetch becomes one pair: the hash the client already has
//! (if any) and the hash it wants. The service answers with a full file or
//! a delta for each target hash.

use crate::manifest::Comparison;
use fuel_crypto::ContentHash;
use std::slice::Chunks;

/// Largest number of pairs accepted in one lookup request
pub const MAX_HASH_PAIRS_PER_REQUEST: usize = 1000;

/// Source/target hash pair of one file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HashPair {
    /// Hash of the installed content; `None` for files not installed yet
    pub source_hash: Option<ContentHash>,
    /// Hash of the wanted content
    pub target_hash: ContentHash,
}

/// Ordered hash pairs of a comparison
///
/// Updated files come first, then new files. [`HashPairs::batches`] can be
/// called any number of times; each call starts from the first pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashPairs {
    pairs: Vec<HashPair>,
}

impl HashPairs {
    /// Collect the pairs for every file a comparison needs fetched
    pub fn from_comparison(comparison: &Comparison) -> Self {
        let updated = comparison.updated.iter().map(|(old, new)| HashPair {
            source_hash: Some(old.hash.clone()),
            target_hash: new.hash.clone(),
        });
        let new = comparison.new.iter().map(|file| HashPair {
            source_hash: None,
            target_hash: file.hash.clone(),
        });
        Self {
            pairs: updated.chain(new).collect(),
        }
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when there is nothing to look up
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// All pairs in order
    pub fn as_slice(&self) -> &[HashPair] {
        &self.pairs
    }

    /// Request-sized batches of at most [`MAX_HASH_PAIRS_PER_REQUEST`] pairs
    pub fn batches(&self) -> Chunks<'_, HashPair> {
        self.pairs.chunks(MAX_HASH_PAIRS_PER_REQUEST)
    }

    /// Number of batches [`HashPairs::batches`] yields
    pub fn batch_count(&self) -> usize {
        self.pairs.len().div_ceil(MAX_HASH_PAIRS_PER_REQUEST)
    }
}

impl From<Vec<HashPair>> for HashPairs {
    fn from(pairs: Vec<HashPair>) -> Self {
        Self { pairs }
    }
}
