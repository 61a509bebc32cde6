//! Implementation of BPE (byte pair encoding) as it relates to breaking a single piece of text
//! into tokens.
use crate::token::{Rank, NO_RANK};
use crate::vocab::Vocab;
use crate::Result;
use std::ops::Range;
use tracing::*;

/// Using the BPE algorithm find the tokens in a word and return their integer form.
///
/// Fails with [`crate::TokrankError::RankNotFound`] if the word can't be fully covered by tokens
/// in the vocabulary, which can only happen if some single byte in the word isn't a token itself.
pub fn byte_pair_encode(word: &[u8], vocab: &Vocab) -> Result<Vec<Rank>> {
    if word.len() == 1 {
        return Ok(vec![vocab.get_rank(word)?]);
    }

    byte_pair_merge(word, vocab, |p| vocab.get_rank(&word[p]))
        .into_iter()
        .collect()
}

/// Using the BPE algorithm, find the tokens in a word and return their byte string form.
///
/// Unlike [`byte_pair_encode`] this never fails; a byte with no token of its own simply comes
/// back as a slice of its own.
pub fn byte_pair_split<'a>(word: &'a [u8], vocab: &Vocab) -> Vec<&'a [u8]> {
    if word.len() == 1 {
        return vec![word];
    }

    byte_pair_merge(word, vocab, |p| &word[p])
}

/// Merge bytes within a word together into progressively fewer, longer byte sequences that
/// correspond to tokens in the vocabulary.
///
/// The word starts out as one part per byte.  Each round, every pair of adjacent parts whose
/// concatenation is a token is a merge candidate, and the candidate with the lowest rank wins.
/// When two candidates have the same rank (the same pair of byte strings occurring twice in the
/// word) the leftmost one wins.  Merging stops when no adjacent pair is a token.
///
/// `f` is called on the byte range of each of the final parts, left to right.
fn byte_pair_merge<T>(word: &[u8], vocab: &Vocab, f: impl Fn(Range<usize>) -> T) -> Vec<T> {
    if word.is_empty() {
        return Vec::new();
    }

    // This is a vector of (start, rank).
    // The rank is of the pair formed by the part starting at `start` and the part after it.
    // The last item marks the end of the word; its rank is never a valid value.
    let mut parts: Vec<(usize, Rank)> = (0..word.len() + 1).map(|i| (i, NO_RANK)).collect();

    // Rank of the bytes spanning the part at `start_idx` and its right neighbor, pretending that
    // the `skip` parts after `start_idx` have already been removed.
    let get_rank = {
        #[inline(always)]
        |parts: &Vec<(usize, Rank)>, start_idx: usize, skip: usize| {
            if (start_idx + skip + 2) < parts.len() {
                vocab.try_get_rank(&word[parts[start_idx].0..parts[start_idx + skip + 2].0])
            } else {
                None
            }
        }
    };

    // We look up the ranks once in the beginning and iteratively update
    // them during each merge, which reduces the number of rank lookups.
    for i in 0..parts.len() - 2 {
        if let Some(rank) = get_rank(&parts, i, 0) {
            parts[i].1 = rank;
        }
    }

    // If you have n parts and m merges, this does O(mn) work.  n is usually small, and a linear
    // scan over a contiguous vector beats a heap at these sizes.
    loop {
        if parts.len() == 1 {
            break;
        }

        // Only a strictly smaller rank replaces the current best, so ties go to the leftmost
        let mut min_rank: (Rank, usize) = (NO_RANK, 0);
        for (i, &(_, rank)) in parts[..parts.len() - 1].iter().enumerate() {
            if rank < min_rank.0 {
                min_rank = (rank, i);
            }
        }

        if min_rank.0 == NO_RANK {
            break;
        }

        let i = min_rank.1;
        trace!(rank = min_rank.0, offset = parts[i].0, "Merging pair");

        // parts[i + 1] is about to be removed.  Update parts[i] and parts[i - 1] first, skipping
        // over it, so the removal is the last thing to touch the vector.
        parts[i].1 = get_rank(&parts, i, 1).unwrap_or(NO_RANK);
        if i > 0 {
            parts[i - 1].1 = get_rank(&parts, i - 1, 1).unwrap_or(NO_RANK);
        }

        parts.remove(i + 1);
    }

    parts.windows(2).map(|w| f(w[0].0..w[1].0)).collect()
}
