//! Vocabularies are usually distributed as text files in the format popularized by `tiktoken`: one
//! token per line, with the token's bytes encoded as standard base64, a single space, and the
//! token's rank in decimal.
//!
//! ```text
//! aGVsbG8= 6
//! IHdvcmxk 7
//! ```
//!
//! Parsing is strict.  Any line that doesn't follow this form fails the whole load with an error
//! that names the line number, and which reports `true` from
//! [`crate::TokrankError::is_parse_error`].
use super::Vocab;
use crate::error::{
    EmptyTokenSnafu, FileIoSnafu, InvalidBase64Snafu, InvalidRankSnafu, IoSnafu,
    MalformedLineSnafu,
};
use crate::token::{Rank, TokenBytes};
use crate::Result;
use base64::{engine::general_purpose, Engine as _};
use snafu::{ensure, OptionExt, ResultExt};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::*;

/// Something that knows how to produce a [`Vocab`] given some identifier for it.
///
/// What the identifier means is up to the implementation.
pub trait VocabLoader {
    fn load(&self, uri: &str) -> Result<Vocab>;
}

/// Loads vocabularies from files on the local filesystem.
///
/// Identifiers are file paths.  Relative paths are resolved against the base directory if one was
/// given, or the process working directory otherwise.
#[derive(Clone, Debug, Default)]
pub struct FileVocabLoader {
    base_dir: Option<PathBuf>,
}

impl FileVocabLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn resolve(&self, uri: &str) -> PathBuf {
        match &self.base_dir {
            Some(base_dir) => base_dir.join(uri),
            None => PathBuf::from(uri),
        }
    }
}

impl VocabLoader for FileVocabLoader {
    fn load(&self, uri: &str) -> Result<Vocab> {
        load_vocab_file(&self.resolve(uri))
    }
}

/// Open the file at `path` and parse it as a vocabulary.
pub fn load_vocab_file(path: &Path) -> Result<Vocab> {
    debug!(path = %path.display(), "Loading vocabulary file");

    let file = File::open(path).with_context(|_| FileIoSnafu {
        path: path.to_path_buf(),
    })?;

    read_vocab(BufReader::new(file))
}

/// Parse every line of `reader` and build a vocabulary from the results.
///
/// Blank lines are skipped.  Besides the parse errors, this can fail with any of the errors
/// [`Vocab::new`] produces, most notably a duplicate rank.
pub fn read_vocab(reader: impl BufRead) -> Result<Vocab> {
    let mut tokens = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.context(IoSnafu)?;
        if line.trim_end_matches(['\r', '\n']).is_empty() {
            continue;
        }

        tokens.push(parse_line(&line, index + 1)?);
    }

    debug!(lines = tokens.len(), "Parsed vocabulary lines");

    Vocab::new(tokens)
}

/// Parse a single `<base64 token> <rank>` line.  `line_no` is 1-based and is only used for error
/// reporting.
pub fn parse_line(line: &str, line_no: usize) -> Result<(TokenBytes, Rank)> {
    let line = line.trim_end_matches(['\r', '\n']);

    let (token, rank) = line
        .split_once(' ')
        .context(MalformedLineSnafu { line: line_no })?;
    ensure!(!rank.contains(' '), MalformedLineSnafu { line: line_no });

    let bytes = general_purpose::STANDARD
        .decode(token)
        .with_context(|_| InvalidBase64Snafu {
            line: line_no,
            token,
        })?;
    ensure!(!bytes.is_empty(), EmptyTokenSnafu { line: line_no });

    let rank = rank
        .parse::<Rank>()
        .with_context(|_| InvalidRankSnafu {
            line: line_no,
            rank,
        })?;

    Ok((bytes, rank))
}
