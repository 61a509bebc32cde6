use crate::token::{Rank, TokenBytes};
use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TokrankError {
    #[snafu(display(
        "Rank {rank} is assigned to more than one token: {first:?} and {second:?}"
    ))]
    DuplicateRank {
        rank: Rank,
        first: TokenBytes,
        second: TokenBytes,
    },

    #[snafu(display("Rank {rank} is reserved and can't be assigned to token {bytes:?}"))]
    ReservedRank { rank: Rank, bytes: TokenBytes },

    #[snafu(display("Rank {rank} is assigned to an empty byte string"))]
    EmptyTokenBytes { rank: Rank },

    #[snafu(display("No rank for bytes vector: {bytes:?}"))]
    RankNotFound { bytes: TokenBytes },

    #[snafu(display("No token for rank: {rank}"))]
    TokenNotFound { rank: Rank },

    #[snafu(display("Segmenting the input text failed: {source}"))]
    Segmentation {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[snafu(display("The segmentation pattern '{pattern}' is not a valid regex"))]
    InvalidPattern {
        pattern: String,
        source: fancy_regex::Error,
    },

    #[snafu(display("Decoded tokens are not valid UTF-8"))]
    InvalidUtf8 { source: std::string::FromUtf8Error },

    #[snafu(display("Line {line}: expected '<base64 token> <rank>'"))]
    MalformedLine { line: usize },

    #[snafu(display("Line {line}: could not decode token '{token}'"))]
    InvalidBase64 {
        line: usize,
        token: String,
        source: base64::DecodeError,
    },

    #[snafu(display("Line {line}: token decodes to an empty byte string"))]
    EmptyToken { line: usize },

    #[snafu(display("Line {line}: '{rank}' is not a valid rank"))]
    InvalidRank {
        line: usize,
        rank: String,
        source: std::num::ParseIntError,
    },

    #[snafu(display("I/O error reading vocabulary"))]
    Io { source: std::io::Error },

    #[snafu(display("File I/O error on file '{}'", path.display()))]
    FileIo {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl TokrankError {
    /// True if this error came from parsing a malformed line of a vocabulary source, as opposed
    /// to a violation detected by the tokenizer itself.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedLine { .. }
                | Self::InvalidBase64 { .. }
                | Self::EmptyToken { .. }
                | Self::InvalidRank { .. }
        )
    }
}
