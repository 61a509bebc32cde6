//! Contains the implementation of the bulk of the tokenization logic, implemented as a Rust
//! [`Iterator`].

use crate::segment::Pieces;
use crate::token::Rank;
use crate::vocab::Vocab;
use crate::{bpe, Result};
use std::collections::VecDeque;

/// Applies the encoder's segmenter to get the next "piece" of text, skipping the empty matches
/// some patterns produce.
///
/// Stops for good after the first error.
pub(crate) struct PieceIterator<'a> {
    pieces: Pieces<'a>,
    failed: bool,
}

impl<'a> PieceIterator<'a> {
    pub(crate) fn new(pieces: Pieces<'a>) -> Self {
        Self {
            pieces,
            failed: false,
        }
    }
}

impl<'a> Iterator for PieceIterator<'a> {
    type Item = Result<&'a str>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            match self.pieces.next()? {
                Ok("") => continue,
                Ok(piece) => return Some(Ok(piece)),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// The iterator which yields the tokens for a string of text.
///
/// See [`crate::Encoder::encode_iter`]
pub struct EncodeIterator<'a> {
    vocab: &'a Vocab,
    pieces: PieceIterator<'a>,

    /// Tokens found in the current piece, if the piece itself didn't map directly to a token.
    /// If there are any tokens here, they're removed from the front of the queue one iteration
    /// cycle at a time
    current_piece_tokens: VecDeque<Rank>,

    failed: bool,
}

impl<'a> EncodeIterator<'a> {
    pub(crate) fn new(vocab: &'a Vocab, pieces: Pieces<'a>) -> Self {
        Self {
            vocab,
            pieces: PieceIterator::new(pieces),
            current_piece_tokens: VecDeque::new(),
            failed: false,
        }
    }

    fn fail<T>(&mut self, e: crate::TokrankError) -> Option<Result<T>> {
        self.failed = true;
        Some(Err(e))
    }
}

impl<'a> Iterator for EncodeIterator<'a> {
    type Item = Result<Rank>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        // If there are still tokens left from a previously processed piece, use one of them
        if let Some(token) = self.current_piece_tokens.pop_front() {
            return Some(Ok(token));
        }

        let piece = match self.pieces.next()? {
            Ok(piece) => piece.as_bytes(),
            Err(e) => return self.fail(e),
        };

        // Either the piece is itself a token, in which case we're done, or it's not and we need
        // to break it up into smaller tokens with the BPE algorithm
        if let Some(token) = self.vocab.try_get_rank(piece) {
            return Some(Ok(token));
        }

        match bpe::byte_pair_encode(piece, self.vocab) {
            Ok(tokens) => {
                debug_assert!(!tokens.is_empty());
                self.current_piece_tokens.extend(tokens);
                self.current_piece_tokens.pop_front().map(Ok)
            }
            Err(e) => self.fail(e),
        }
    }
}
