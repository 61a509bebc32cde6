//! Splitting text into pieces before byte pair encoding.
//!
//! BPE never merges across piece boundaries, so the choice of pattern decides things like whether
//! a leading space belongs to the following word.  The encoder doesn't care how the pieces are
//! found, only that they come back in order and don't overlap, so the matching engine is hidden
//! behind the [`Segmenter`] trait.
use crate::error::{InvalidPatternSnafu, TokrankError};
use crate::Result;
use once_cell::sync::OnceCell;
use snafu::ResultExt;
use std::fmt::Debug;
use std::sync::Arc;
use strum::{EnumIter, EnumString, EnumVariantNames};

/// The pieces of some text found by a [`Segmenter`], in left to right order.
pub type Pieces<'a> = Box<dyn Iterator<Item = Result<&'a str>> + 'a>;

/// Anything that can split text into an ordered sequence of non-overlapping substrings.
///
/// Implementations may yield empty matches; the encoder skips them.  A matching failure should be
/// reported as [`TokrankError::Segmentation`], after which the iterator is not polled again.
pub trait Segmenter: Send + Sync + Debug {
    fn segment<'a>(&'a self, text: &'a str) -> Pieces<'a>;
}

/// Most published tokenizer patterns use look-around, which needs the backtracking engine.  The
/// backtracking can hit its limit on pathological input, which is reported as an error.
impl Segmenter for fancy_regex::Regex {
    fn segment<'a>(&'a self, text: &'a str) -> Pieces<'a> {
        Box::new(self.find_iter(text).map(|m| {
            m.map(|m| m.as_str())
                .map_err(|e| TokrankError::Segmentation {
                    source: Box::new(e),
                })
        }))
    }
}

impl Segmenter for regex::Regex {
    fn segment<'a>(&'a self, text: &'a str) -> Pieces<'a> {
        Box::new(self.find_iter(text).map(|m| Ok(m.as_str())))
    }
}

/// Compile a segmentation pattern with the backtracking regex engine.
pub fn compile_pattern(pattern: &str) -> Result<fancy_regex::Regex> {
    fancy_regex::Regex::new(pattern).context(InvalidPatternSnafu { pattern })
}

/// Word splitting patterns published along with well known vocabularies.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, EnumString, EnumIter, EnumVariantNames, strum::Display,
)]
pub enum PatternPreset {
    #[strum(serialize = "r50k_base")]
    R50kBase,
    #[strum(serialize = "p50k_base")]
    P50kBase,
    #[strum(serialize = "cl100k_base")]
    Cl100kBase,
}

impl PatternPreset {
    /// The source text of the pattern
    pub fn pattern(self) -> &'static str {
        const GPT2: &str =
            r##"'s|'t|'re|'ve|'m|'ll|'d| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+"##;
        const CL100K: &str = r##"(?i:'s|'t|'re|'ve|'m|'ll|'d)|[^\r\n\p{L}\p{N}]?\p{L}+|\p{N}{1,3}| ?[^\s\p{L}\p{N}]+[\r\n]*|\s*[\r\n]+|\s+(?!\S)|\s+"##;

        match self {
            // p50k shares r50k's pattern, only the vocabulary differs
            PatternPreset::R50kBase | PatternPreset::P50kBase => GPT2,
            PatternPreset::Cl100kBase => CL100K,
        }
    }

    /// The compiled pattern.
    ///
    /// Each preset is compiled the first time it's asked for, and then held for the duration of
    /// the process.  The resulting `Arc` is very cheap to clone.
    pub fn regex(self) -> Result<Arc<fancy_regex::Regex>> {
        static GPT2: OnceCell<Arc<fancy_regex::Regex>> = OnceCell::new();
        static CL100K: OnceCell<Arc<fancy_regex::Regex>> = OnceCell::new();

        let cell = match self {
            PatternPreset::R50kBase | PatternPreset::P50kBase => &GPT2,
            PatternPreset::Cl100kBase => &CL100K,
        };

        cell.get_or_try_init(|| compile_pattern(self.pattern()).map(Arc::new))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::{IntoEnumIterator, VariantNames};

    fn pieces<'a>(segmenter: &'a dyn Segmenter, text: &'a str) -> Vec<&'a str> {
        segmenter
            .segment(text)
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn every_preset_compiles() {
        for preset in PatternPreset::iter() {
            let regex = preset.regex().unwrap();
            assert_eq!(preset.pattern(), regex.as_str());
        }
    }

    #[test]
    fn presets_parse_from_names() {
        assert_eq!(
            PatternPreset::Cl100kBase,
            "cl100k_base".parse::<PatternPreset>().unwrap()
        );
        assert_eq!("p50k_base", PatternPreset::P50kBase.to_string());
        assert!("gpt-5".parse::<PatternPreset>().is_err());
        assert_eq!(
            &["r50k_base", "p50k_base", "cl100k_base"],
            PatternPreset::VARIANTS
        );
    }

    #[test]
    fn cl100k_splits_words() {
        let regex = PatternPreset::Cl100kBase.regex().unwrap();

        assert!(pieces(&*regex, "").is_empty());
        assert_eq!(vec!["foo"], pieces(&*regex, "foo"));
        assert_eq!(
            vec!["foo", " bar", " baz"],
            pieces(&*regex, "foo bar baz")
        );
        assert_eq!(
            vec!["let", " x", " =", " ", "123", "456", ";\n"],
            pieces(&*regex, "let x = 123456;\n")
        );
    }

    #[test]
    fn plain_regex_is_a_segmenter() {
        let regex = regex::Regex::new(r"\S+|\s+").unwrap();

        assert_eq!(vec!["hello", " ", "world"], pieces(&regex, "hello world"));
    }

    /// Alternatives that overlap, followed by a look-ahead that never matches, take exponential
    /// time in the backtracking engine.
    fn runaway_regex() -> fancy_regex::Regex {
        fancy_regex::RegexBuilder::new(r"(?i)(a|b|ab)*(?=c)")
            .backtrack_limit(100_000)
            .build()
            .unwrap()
    }

    #[test]
    fn backtrack_limit_is_a_segmentation_error() {
        let regex = runaway_regex();
        let text = "ab".repeat(30);

        let err = regex
            .segment(&text)
            .collect::<Result<Vec<_>>>()
            .unwrap_err();
        match err {
            TokrankError::Segmentation { source } => {
                assert!(source.downcast_ref::<fancy_regex::Error>().is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn backtrack_limit_fails_encoding() {
        let vocab = crate::Vocab::new([(b"a".to_vec(), 0), (b"b".to_vec(), 1)]).unwrap();
        let encoder = crate::Encoder::new("runaway", vocab, Arc::new(runaway_regex()));
        let text = "ab".repeat(30);

        assert!(matches!(
            encoder.encode(&text),
            Err(TokrankError::Segmentation { .. })
        ));
        assert!(matches!(
            encoder.count_tokens(&text),
            Err(TokrankError::Segmentation { .. })
        ));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = compile_pattern("(unclosed").unwrap_err();

        assert!(matches!(err, TokrankError::InvalidPattern { pattern, .. } if pattern == "(unclosed"));
    }
}
