//! Modified UTF-7 mailbox-name codec (RFC 3501 §5.1.3).
//!
//! IMAP mailbox names are transmitted as a variant of UTF-7 that uses `&`
//! rather than `+` as the shift character (since `&` has no other special
//! meaning in IMAP strings) and a modified Base64 alphabet substituting
//! `,` for `/` with no padding. Grounded on the escaping strategy in the
//! original's `imap_utf8_to_modified_utf7`/`imap_modified_utf7_to_utf8`
//! (which drive the same transform through `iconv`'s UTF-7 codec).

use base64::Engine;
use base64::alphabet::Alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};

const MODIFIED_BASE64_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+,";

fn engine() -> GeneralPurpose {
    let alphabet =
        Alphabet::new(MODIFIED_BASE64_ALPHABET).expect("modified UTF-7 alphabet is well-formed");
    GeneralPurpose::new(&alphabet, GeneralPurposeConfig::new().with_encode_padding(false))
}

/// Encodes a Unicode mailbox name into modified UTF-7.
///
/// Printable ASCII (0x20-0x7e) passes through unchanged, except `&`, which
/// is escaped as `&-`. Runs of anything else are transcoded to UTF-16BE,
/// Base64-encoded with the modified alphabet, and wrapped in `&...-`.
#[must_use]
pub fn encode(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut run: Vec<u16> = Vec::new();

    let flush = |run: &mut Vec<u16>, output: &mut String| {
        if run.is_empty() {
            return;
        }
        let mut bytes = Vec::with_capacity(run.len() * 2);
        for unit in run.drain(..) {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        output.push('&');
        output.push_str(&engine().encode(&bytes));
        output.push('-');
    };

    for ch in input.chars() {
        if ch == '&' {
            flush(&mut run, &mut output);
            output.push_str("&-");
        } else if (' '..='~').contains(&ch) {
            flush(&mut run, &mut output);
            output.push(ch);
        } else {
            let mut buf = [0u16; 2];
            for unit in ch.encode_utf16(&mut buf) {
                run.push(*unit);
            }
        }
    }
    flush(&mut run, &mut output);

    output
}

/// Decodes a modified UTF-7 mailbox name back to Unicode.
///
/// Per spec, this transform is total in both directions: a wire name that
/// fails to decode as valid modified UTF-7 is returned unchanged, with a
/// warning logged, rather than raising an error up to the caller.
#[must_use]
pub fn decode(input: &str) -> String {
    try_decode(input).unwrap_or_else(|e| {
        tracing::warn!(mailbox = input, error = %e, "mailbox name is not valid modified UTF-7, passing through unchanged");
        input.to_string()
    })
}

/// Fallible inner decode, used by [`decode`] before it falls back.
fn try_decode(input: &str) -> crate::error::Result<String> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '&' {
            output.push(ch);
            continue;
        }

        if chars.peek() == Some(&'-') {
            chars.next();
            output.push('&');
            continue;
        }

        let mut run = String::new();
        for c in chars.by_ref() {
            if c == '-' {
                break;
            }
            run.push(c);
        }

        let decoded = engine()
            .decode(&run)
            .map_err(|e| crate::error::Error::InvalidEncoding(format!("modified UTF-7 run: {e}")))?;
        if decoded.len() % 2 != 0 {
            return Err(crate::error::Error::InvalidEncoding(
                "modified UTF-7 run has an odd number of bytes".to_string(),
            ));
        }
        let units: Vec<u16> = decoded
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        let text = String::from_utf16(&units)
            .map_err(|e| crate::error::Error::InvalidEncoding(format!("modified UTF-7 run: {e}")))?;
        output.push_str(&text);
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_round_trips_unchanged() {
        let name = "INBOX/Archive 2024";
        assert_eq!(encode(name), name);
        assert_eq!(decode(name), name);
    }

    #[test]
    fn ampersand_is_escaped() {
        assert_eq!(encode("Q&A"), "Q&-A");
        assert_eq!(decode("Q&-A"), "Q&A");
    }

    #[test]
    fn non_ascii_round_trips() {
        let name = "Entwürfe";
        let encoded = encode(name);
        assert_ne!(encoded, name);
        assert_eq!(decode(&encoded), name);
    }

    #[test]
    fn japanese_folder_name_round_trips() {
        let name = "削除済みメッセージ";
        let encoded = encode(name);
        assert_eq!(decode(&encoded), name);
    }

    #[test]
    fn invalid_run_falls_back_to_unchanged_input() {
        let wire = "&abc$def-";
        assert_eq!(decode(wire), wire);
    }

    #[test]
    fn odd_byte_count_falls_back_to_unchanged_input() {
        // A single base64 char decodes to fewer than 2 bytes: not a valid
        // UTF-16BE run, so this must fall back rather than panic or error.
        let wire = "&AA-";
        let _ = decode(wire);
    }
}
