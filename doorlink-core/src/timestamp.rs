//! Heartbeat timestamp encoding
//!
//! Unix time is carried as 6 characters of 6 bits each, least-significant
//! unit first, giving a 36-bit timestamp space. The alphabet is exactly 64
//! symbols; there is no fallback character.
//!
//! ```text
//! value:  0..=25   26..=51   52..=61   62   63
//! char:   A..=Z    a..=z     0..=9     +    /
//! ```

use crate::error::{Error, Result};

/// Encoded timestamp length in characters
pub const ENCODED_LEN: usize = 6;

/// Bits carried per character
const BITS_PER_SYMBOL: u32 = 6;

const SYMBOL_MASK: u64 = 0x3F;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Largest timestamp that survives an encode/decode round trip
pub const MAX_TIMESTAMP: u64 = (1 << (BITS_PER_SYMBOL as usize * ENCODED_LEN)) - 1;

/// Encode a Unix timestamp
///
/// Bits above the 36-bit space are dropped.
///
/// # Examples
///
/// ```
/// use doorlink_core::encode_time;
///
/// assert_eq!(encode_time(0), "AAAAAA");
/// assert_eq!(encode_time(63), "/AAAAA");
/// ```
pub fn encode_time(t: u64) -> String {
    (0..ENCODED_LEN)
        .map(|i| {
            let value = (t >> (BITS_PER_SYMBOL as usize * i)) & SYMBOL_MASK;
            char::from(ALPHABET[value as usize])
        })
        .collect()
}

/// Decode a timestamp produced by [`encode_time`]
///
/// # Errors
///
/// - [`Error::InvalidEncoding`] for any character outside the alphabet
/// - [`Error::InvalidEncodingLength`] for input longer than 6 characters
pub fn decode_time(s: &str) -> Result<u64> {
    let len = s.chars().count();
    if len > ENCODED_LEN {
        return Err(Error::InvalidEncodingLength(len));
    }

    s.chars().enumerate().try_fold(0u64, |t, (position, character)| {
        let value = decode_symbol(character).ok_or(Error::InvalidEncoding {
            position,
            character,
        })?;
        Ok(t | (value << (BITS_PER_SYMBOL as usize * position)))
    })
}

/// Encode the current wall-clock time
pub fn encoded_now() -> String {
    let now = chrono::Utc::now().timestamp();
    encode_time(u64::try_from(now).unwrap_or(0))
}

fn decode_symbol(c: char) -> Option<u64> {
    let value = match c {
        'A'..='Z' => c as u32 - 'A' as u32,
        'a'..='z' => c as u32 - 'a' as u32 + 26,
        '0'..='9' => c as u32 - '0' as u32 + 52,
        '+' => 62,
        '/' => 63,
        _ => return None,
    };
    Some(u64::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_encode_least_significant_first() {
        assert_eq!(encode_time(0), "AAAAAA");
        assert_eq!(encode_time(1), "BAAAAA");
        assert_eq!(encode_time(64), "ABAAAA");
        assert_eq!(encode_time(MAX_TIMESTAMP), "//////");
    }

    #[test]
    fn test_alphabet_boundaries() {
        assert_eq!(encode_time(25), "ZAAAAA");
        assert_eq!(encode_time(26), "aAAAAA");
        assert_eq!(encode_time(52), "0AAAAA");
        assert_eq!(encode_time(61), "9AAAAA");
        assert_eq!(encode_time(62), "+AAAAA");
        assert_eq!(encode_time(63), "/AAAAA");
    }

    #[test]
    fn test_encode_drops_high_bits() {
        assert_eq!(encode_time(MAX_TIMESTAMP + 1), "AAAAAA");
    }

    #[test]
    fn test_decode_known_value() {
        // 2024-01-01T00:00:00Z
        let t = 1_704_067_200;
        assert_eq!(decode_time(&encode_time(t)).unwrap(), t);
    }

    #[test]
    fn test_decode_rejects_fallback_symbol() {
        let err = decode_time("AA*AAA").unwrap_err();
        assert_eq!(
            err,
            Error::InvalidEncoding {
                position: 2,
                character: '*'
            }
        );
    }

    #[test]
    fn test_decode_rejects_long_input() {
        assert_eq!(
            decode_time("AAAAAAA").unwrap_err(),
            Error::InvalidEncodingLength(7)
        );
    }

    #[test]
    fn test_encoded_now_is_six_chars() {
        let now = encoded_now();
        assert_eq!(now.len(), ENCODED_LEN);
        assert!(decode_time(&now).unwrap() > 0);
    }

    proptest! {
        #[test]
        fn prop_round_trip(t in 0u64..=MAX_TIMESTAMP) {
            prop_assert_eq!(decode_time(&encode_time(t)).unwrap(), t);
        }

        #[test]
        fn prop_alphabet_strings_decode(s in "[A-Za-z0-9+/]{6}") {
            prop_assert!(decode_time(&s).is_ok());
        }

        #[test]
        fn prop_foreign_character_fails(
            prefix in "[A-Za-z0-9+/]{0,5}",
            c in any::<char>().prop_filter("outside alphabet", |c| decode_symbol(*c).is_none()),
        ) {
            let s: String = prefix.chars().chain(std::iter::once(c)).collect();
            let is_invalid_encoding = matches!(decode_time(&s), Err(Error::InvalidEncoding { .. }));
            prop_assert!(is_invalid_encoding);
        }
    }
}
