//! CRAM-MD5 challenge-response helper (RFC 2195), shared by the IMAP and
//! SMTP clients' `AUTHENTICATE CRAM-MD5` / `AUTH CRAM-MD5` mechanisms.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use md5::Md5;

use crate::error::{Error, Result};

type HmacMd5 = Hmac<Md5>;

/// Computes the CRAM-MD5 response for a base64-encoded server challenge.
///
/// Returns the full `user hex-digest` response, already base64-encoded,
/// ready to send back as the line following the server's `+` continuation.
///
/// # Errors
///
/// Returns [`Error::InvalidEncoding`] if `challenge_b64` is not valid
/// base64.
pub fn respond(challenge_b64: &str, user: &str, secret: &str) -> Result<String> {
    let challenge = STANDARD
        .decode(challenge_b64.trim())
        .map_err(|e| Error::InvalidEncoding(format!("CRAM-MD5 challenge: {e}")))?;

    let mut mac = HmacMd5::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(&challenge);
    let digest = mac.finalize().into_bytes();

    let hex_digest = digest.iter().fold(String::with_capacity(32), |mut acc, b| {
        use std::fmt::Write as _;
        let _ = write!(acc, "{b:02x}");
        acc
    });

    Ok(STANDARD.encode(format!("{user} {hex_digest}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc2195_worked_example() {
        // From RFC 2195 §3: challenge "<1896.697170952@postoffice.reston.mci.net>",
        // shared secret "tanstaaftanstaaf", expected digest
        // "b913a602c7eda7a495b4e6e7334d3890".
        let challenge = STANDARD.encode("<1896.697170952@postoffice.reston.mci.net>");
        let response = respond(&challenge, "tim", "tanstaaftanstaaf").unwrap();
        let decoded = String::from_utf8(STANDARD.decode(response).unwrap()).unwrap();
        assert_eq!(decoded, "tim b913a602c7eda7a495b4e6e7334d3890");
    }

    #[test]
    fn invalid_challenge_is_an_error() {
        assert!(respond("not valid base64!!", "user", "secret").is_err());
    }
}
