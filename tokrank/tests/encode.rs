//! End to end encoding and decoding through the public API, with a small vocabulary that covers
//! every single byte value so any text can be encoded.
use proptest::prelude::*;
use std::sync::Arc;
use tokrank::{Encoder, PatternPreset, Rank, Vocab};

/// Multi-byte tokens, in rank order after the 256 single bytes
const MERGES: &[&str] = &[
    "th", "he", "in", "er", "an", " t", " a", "the", " the", "ing", "on", "re", "at", "nd", "ll",
    "lo", "hello", " w", "or", "ld", " wor", " world", "é", "ü", "中", "文",
];

fn byte_level_vocab() -> Vocab {
    let singles = (0..=255u8).map(|b| (vec![b], b as Rank));
    let merges = MERGES
        .iter()
        .enumerate()
        .map(|(i, token)| (token.as_bytes().to_vec(), 256 + i));

    Vocab::new(singles.chain(merges)).unwrap()
}

fn cl100k_encoder() -> Encoder {
    Encoder::with_preset("test-cl100k", byte_level_vocab(), PatternPreset::Cl100kBase).unwrap()
}

fn rank_of(token: &str) -> Rank {
    256 + MERGES.iter().position(|t| *t == token).unwrap()
}

#[test]
fn known_words_are_single_tokens() {
    let encoder = cl100k_encoder();

    assert_eq!(
        vec![rank_of("hello"), rank_of(" world")],
        encoder.encode("hello world").unwrap()
    );
}

#[test]
fn unknown_words_are_merged_from_bytes() {
    let encoder = cl100k_encoder();

    // " there" isn't a token.  "th" merges first, but then "er" outranks "the", so the "th" part
    // never grows and the leading space is left on its own
    let tokens = encoder.encode(" there").unwrap();
    assert_eq!(
        vec![b' ' as Rank, rank_of("th"), rank_of("er"), b'e' as Rank],
        tokens
    );
    assert_eq!(" there", encoder.decode_to_string(&tokens).unwrap());
}

#[test]
fn multi_byte_characters_round_trip() {
    let encoder = cl100k_encoder();
    let text = "Grüße aus 中文 café";

    let tokens = encoder.encode(text).unwrap();
    assert!(tokens.contains(&rank_of("ü")));
    assert!(tokens.contains(&rank_of("é")));
    assert_eq!(text, encoder.decode_to_string(&tokens).unwrap());
}

#[test]
fn split_matches_encode() {
    let encoder = cl100k_encoder();
    let text = "the thing in the world";

    let tokens = encoder.encode(text).unwrap();
    let pieces = encoder.split(text).unwrap();

    assert_eq!(tokens.len(), pieces.len());
    for (token, piece) in tokens.iter().zip(pieces) {
        assert_eq!(encoder.vocab().get_token(*token).unwrap(), piece);
    }
}

#[test]
fn encoder_can_be_shared_between_threads() {
    let encoder = Arc::new(cl100k_encoder());
    let expected = encoder.encode("hello world, the end").unwrap();

    let handles = (0..4)
        .map(|_| {
            let encoder = encoder.clone();
            std::thread::spawn(move || encoder.encode("hello world, the end").unwrap())
        })
        .collect::<Vec<_>>();

    for handle in handles {
        assert_eq!(expected, handle.join().unwrap());
    }
}

#[test]
fn loaded_from_file() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    // h e l o he ll hello
    file.write_all(b"aA== 0\nZQ== 1\nbA== 2\nbw== 3\naGU= 4\nbGw= 5\naGVsbG8= 6\n")
        .unwrap();

    let vocab = Vocab::from_path(file.path()).unwrap();
    let encoder = Encoder::with_pattern("hello", vocab, r"\w+").unwrap();

    assert_eq!(vec![6], encoder.encode("hello").unwrap());
    assert_eq!("hello", encoder.decode_to_string(&[6]).unwrap());
    assert_eq!("Encoder(name=\"hello\", vocab=7)", encoder.to_string());
}

proptest! {
    #[test]
    fn decode_reverses_encode(s in "\\PC*") {
        let encoder = cl100k_encoder();

        let tokens = encoder.encode(&s).unwrap();
        let decoded = encoder.decode(&tokens).unwrap();
        prop_assert_eq!(s.as_bytes(), decoded.as_slice());
    }

    #[test]
    fn encoding_is_deterministic(s in "[a-z ]{0,40}") {
        let encoder = cl100k_encoder();

        let first = encoder.encode(&s).unwrap();
        let second = encoder.encode(&s).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), encoder.count_tokens(&s).unwrap());
    }
}
