use crate::error::{
    DuplicateRankSnafu, EmptyTokenBytesSnafu, RankNotFoundSnafu, ReservedRankSnafu,
    TokenNotFoundSnafu,
};
use crate::token::{Rank, TokenBytes, NO_RANK};
use crate::Result;
use snafu::{ensure, OptionExt};
use std::fmt;
use std::io::BufRead;
use std::path::Path;
use tracing::*;

mod hash;
pub mod loader;

pub use loader::{FileVocabLoader, VocabLoader};

/// The fixed set of tokens a tokenizer works with, each one a byte string with a unique rank.
///
/// A `Vocab` holds two tables built together at construction time: byte string to rank, used when
/// encoding, and rank to byte string, used when decoding.  Neither is ever modified afterwards, so
/// a single `Vocab` can be shared between any number of threads, typically inside an `Arc`.
///
/// For byte pair encoding to work on arbitrary input, every one of the 256 possible single byte
/// values should be present.  That isn't enforced here, but encoding text that contains a byte
/// with no token of its own will fail with [`crate::TokrankError::RankNotFound`].
#[derive(Clone)]
pub struct Vocab {
    /// Mapping of byte sequences to integer ranks
    encode: hash::RankEncoder,

    /// Mapping of integer ranks back to byte sequences
    decode: hash::RankDecoder,
}

impl Vocab {
    /// Build a vocabulary from pairs of token bytes and ranks.
    ///
    /// The input is treated as a mapping: if the same bytes appear more than once, the last rank
    /// given for them wins.  The mapping must be injective, that is no two different byte strings
    /// may have the same rank, otherwise this fails with
    /// [`crate::TokrankError::DuplicateRank`].  Every token must be at least one byte long.
    pub fn new<Iter, Bytes>(items: Iter) -> Result<Self>
    where
        Iter: IntoIterator<Item = (Bytes, Rank)>,
        Bytes: Into<TokenBytes>,
    {
        let items = items.into_iter();
        let mut encode = hash::RankEncoder::with_capacity(items.size_hint().0);

        for (bytes, rank) in items {
            let bytes = bytes.into();
            ensure!(rank != NO_RANK, ReservedRankSnafu { rank, bytes });
            ensure!(!bytes.is_empty(), EmptyTokenBytesSnafu { rank });

            if let Some(previous) = encode.rank_for_bytes(&bytes) {
                warn!(?bytes, previous, rank, "Token appears more than once; keeping the last rank");
            }
            encode.insert(bytes, rank);
        }

        let mut decode = hash::RankDecoder::with_capacity(encode.len());
        for (bytes, rank) in encode.tokens() {
            if let Some(existing) = decode.insert_new(rank, bytes) {
                // Report the pair in a stable order; the hash map iteration order is not
                let (first, second) = if existing <= bytes {
                    (existing.clone(), bytes.clone())
                } else {
                    (bytes.clone(), existing.clone())
                };

                return DuplicateRankSnafu {
                    rank,
                    first,
                    second,
                }
                .fail();
            }
        }

        debug_assert_eq!(encode.len(), decode.len());
        debug!(tokens = encode.len(), "Constructed vocabulary");

        Ok(Self { encode, decode })
    }

    /// Parse a vocabulary in the line oriented base64 format from a reader.
    ///
    /// See [`loader::read_vocab`].
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        loader::read_vocab(reader)
    }

    /// Load a vocabulary in the line oriented base64 format from a file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        loader::load_vocab_file(path.as_ref())
    }

    /// Look up the rank of a byte string, if it's a token.
    #[inline]
    pub fn try_get_rank(&self, bytes: &[u8]) -> Option<Rank> {
        self.encode.rank_for_bytes(bytes)
    }

    /// Look up the rank of a byte string that is required to be a token.
    pub fn get_rank(&self, bytes: &[u8]) -> Result<Rank> {
        self.try_get_rank(bytes)
            .context(RankNotFoundSnafu { bytes })
    }

    /// Look up the byte string of the token with the given rank.
    pub fn get_token(&self, rank: Rank) -> Result<&[u8]> {
        self.decode
            .bytes_for_rank(rank)
            .map(Vec::as_slice)
            .context(TokenNotFoundSnafu { rank })
    }

    /// All of the tokens and their ranks, in no particular order
    pub fn tokens(&self) -> impl Iterator<Item = (&[u8], Rank)> {
        self.encode
            .tokens()
            .map(|(bytes, rank)| (bytes.as_slice(), rank))
    }

    /// Number of distinct tokens
    pub fn len(&self) -> usize {
        self.encode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Vocab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vocab").field("len", &self.len()).finish()
    }
}
