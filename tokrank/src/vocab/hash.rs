//! The choice of hash algorithm and hash function used to maintain the lookup table mapping byte
//! strings to ranks has a big impact on performance.
//!
//! This is isolated to this module to make it easier to experiment with different impls.
use crate::token::{Rank, TokenBytes};

pub use rustc_hash::FxHashMap as HashMap;

/// Forward table, from the byte string of each token to its rank.
#[derive(Clone, Debug, Default)]
pub(crate) struct RankEncoder(HashMap<TokenBytes, Rank>);

/// Inverse table, from the rank of each token back to its byte string.
#[derive(Clone, Debug, Default)]
pub(crate) struct RankDecoder(HashMap<Rank, TokenBytes>);

impl RankEncoder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self(HashMap::with_capacity_and_hasher(
            capacity,
            Default::default(),
        ))
    }

    /// Insert a token.  If the same bytes are already present, the new rank replaces the old.
    pub fn insert(&mut self, bytes: TokenBytes, rank: Rank) {
        self.0.insert(bytes, rank);
    }

    #[inline]
    pub fn rank_for_bytes(&self, bytes: &[u8]) -> Option<Rank> {
        self.0.get(bytes).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn tokens(&self) -> impl Iterator<Item = (&TokenBytes, Rank)> {
        self.0.iter().map(|(bytes, rank)| (bytes, *rank))
    }
}

impl RankDecoder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self(HashMap::with_capacity_and_hasher(
            capacity,
            Default::default(),
        ))
    }

    /// Record the bytes for a rank.  If the rank is already taken, the existing bytes are left in
    /// place and returned.
    pub fn insert_new(&mut self, rank: Rank, bytes: &[u8]) -> Option<&TokenBytes> {
        use std::collections::hash_map::Entry;

        match self.0.entry(rank) {
            Entry::Occupied(entry) => Some(&*entry.into_mut()),
            Entry::Vacant(entry) => {
                entry.insert(bytes.to_vec());
                None
            }
        }
    }

    #[inline]
    pub fn bytes_for_rank(&self, rank: Rank) -> Option<&TokenBytes> {
        self.0.get(&rank)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
