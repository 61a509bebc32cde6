use snafu::ResultExt;
use std::fmt;
use std::sync::Arc;
use tracing::*;

mod bpe;
mod error;
mod iterator;
pub mod segment;
mod token;
pub mod vocab;

pub use bpe::*;
pub use error::*;
pub use iterator::EncodeIterator;
pub use segment::{PatternPreset, Segmenter};
pub use token::*;
pub use vocab::{FileVocabLoader, Vocab, VocabLoader};

pub type Result<T> = std::result::Result<T, TokrankError>;

/// A byte pair encoding tokenizer: a vocabulary of ranked tokens, plus the segmenter that breaks
/// text into pieces before the tokens are found.
///
/// With this encoder, it's possible to tokenize input text into integer tokens or the byte strings
/// they stand for, and to decode integer tokens back into the text they came from.
///
/// Instances of `Encoder` are light weight and can be very cheaply cloned.  They are also thread
/// safe; a single instance can be used to encode or decode text in multiple threads
/// simultaneously.
#[derive(Clone, Debug)]
pub struct Encoder {
    name: Arc<str>,
    vocab: Arc<Vocab>,
    segmenter: Arc<dyn Segmenter>,
}

impl Encoder {
    /// Create an encoder from its parts.
    ///
    /// `name` is only used to identify the encoder in diagnostics.
    pub fn new(
        name: impl AsRef<str>,
        vocab: impl Into<Arc<Vocab>>,
        segmenter: Arc<dyn Segmenter>,
    ) -> Self {
        let name: Arc<str> = Arc::from(name.as_ref());
        let vocab = vocab.into();

        debug!(%name, tokens = vocab.len(), ?segmenter, "Created encoder");

        Self {
            name,
            vocab,
            segmenter,
        }
    }

    /// Create an encoder that segments text with the given regular expression.
    ///
    /// The expression may use look-around and other features that need a backtracking engine.
    pub fn with_pattern(
        name: impl AsRef<str>,
        vocab: impl Into<Arc<Vocab>>,
        pattern: &str,
    ) -> Result<Self> {
        let regex = segment::compile_pattern(pattern)?;

        Ok(Self::new(name, vocab, Arc::new(regex)))
    }

    /// Create an encoder that segments text with one of the well known published patterns.
    pub fn with_preset(
        name: impl AsRef<str>,
        vocab: impl Into<Arc<Vocab>>,
        preset: PatternPreset,
    ) -> Result<Self> {
        let regex = preset.regex()?;

        Ok(Self::new(name, vocab, regex))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }

    /// Encode the specified text into a sequence of tokens.
    ///
    /// The text is split into pieces by the segmenter.  Each piece that is itself a token is
    /// encoded as that token; all other pieces are broken up into smaller tokens with BPE.
    pub fn encode(&self, text: impl AsRef<str>) -> Result<Vec<Rank>> {
        let text = text.as_ref();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        self.encode_iter(text).collect()
    }

    /// Lazily encode the specified text, yielding one token at a time.
    ///
    /// The iterator yields at most one error, after which it's exhausted.
    pub fn encode_iter<'a>(&'a self, text: &'a str) -> EncodeIterator<'a> {
        EncodeIterator::new(&self.vocab, self.segmenter.segment(text))
    }

    /// Count the tokens in some text without keeping them.
    pub fn count_tokens(&self, text: impl AsRef<str>) -> Result<usize> {
        self.encode_iter(text.as_ref())
            .try_fold(0, |count, token| token.map(|_| count + 1))
    }

    /// Tokenize the specified text the same way as [`Self::encode`], but return the bytes of each
    /// token rather than its rank.
    ///
    /// The returned slices all borrow from `text` and cover the pieces the segmenter matched, in
    /// order.  Text the pattern doesn't match is not represented.  Individual slices aren't
    /// necessarily valid UTF-8.
    pub fn split<'a>(&'a self, text: &'a str) -> Result<Vec<&'a [u8]>> {
        let mut tokens = Vec::new();

        for piece in iterator::PieceIterator::new(self.segmenter.segment(text)) {
            let piece = piece?.as_bytes();

            if self.vocab.try_get_rank(piece).is_some() {
                tokens.push(piece);
            } else {
                tokens.extend(bpe::byte_pair_split(piece, &self.vocab));
            }
        }

        Ok(tokens)
    }

    /// Decode a set of tokens into the bytes that they came from.
    ///
    /// This is fallible only in case the tokens passed in to `tokens` came from a different
    /// vocabulary, and thus some rank doesn't correspond to an actual token.
    pub fn decode(&self, tokens: &[Rank]) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(tokens.len() * 4);

        for &rank in tokens {
            bytes.extend_from_slice(self.vocab.get_token(rank)?);
        }

        Ok(bytes)
    }

    /// Decode a set of tokens into the string that they came from.
    ///
    /// Note that a valid UTF-8 string can be broken down into tokens which are not valid UTF-8 on
    /// their own.  As long as the tokens came from a string, and the sequence has not been modified
    /// or truncated, this will succeed; otherwise it fails with [`TokrankError::InvalidUtf8`].
    pub fn decode_to_string(&self, tokens: &[Rank]) -> Result<String> {
        let bytes = self.decode(tokens)?;

        String::from_utf8(bytes).context(InvalidUtf8Snafu)
    }

    /// Like [`Self::decode_to_string`], but replaces invalid UTF-8 with U+FFFD instead of failing.
    pub fn decode_to_string_lossy(&self, tokens: &[Rank]) -> Result<String> {
        let bytes = self.decode(tokens)?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl fmt::Display for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Encoder(name=\"{}\", vocab={})", self.name, self.vocab.len())
    }
}
