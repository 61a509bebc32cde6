/// A token output by the tokenizer, represented in its integer form corresponding to the rank this
/// token has in the vocabulary.
///
/// The rank does double duty: it is the id handed to downstream consumers, and it is the merge
/// priority used while breaking a piece of text into tokens.  Lower ranks are merged first.
pub type Rank = usize;

/// A token in its byte string form.
///
/// Token byte strings are never empty, and are not necessarily valid UTF-8 on their own; a single
/// multi-byte code point may be split across several tokens.
pub type TokenBytes = Vec<u8>;

/// Reserved rank value that the merge algorithm uses to mean "this pair has no rank".  No
/// vocabulary may assign it to a real token.
pub(crate) const NO_RANK: Rank = Rank::MAX;
