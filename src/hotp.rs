//! The [HMAC-based One-time Password Algorithm](https://www.rfc-editor.org/rfc/rfc4226)
//! (HOTP) that TOTP is built on.
//!
//! Secrets are given as RFC 4648 base32 text. Surrounding whitespace,
//! lowercase letters and `=` padding are accepted.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::{Digits, OtpCode, OtpError, OtpHashAlgorithm};

/// Decodes a secret (given as an RFC4648 base32-encoded ASCII string)
/// into a byte string
pub fn decode_secret(secret: &str) -> Result<Vec<u8>, OtpError> {
    let normalized = secret.trim().to_uppercase();

    data_encoding::BASE32_NOPAD
        .decode(normalized.trim_end_matches('=').as_bytes())
        .map_err(OtpError::SecretDecode)
}

/// Encodes secret bytes as unpadded RFC4648 base32
pub fn encode_secret(secret: &[u8]) -> String {
    data_encoding::BASE32_NOPAD.encode(secret)
}

fn sign<M>(secret: &[u8], data: &[u8]) -> Result<Vec<u8>, OtpError>
where
    M: Mac + hmac::digest::KeyInit,
{
    let mut mac = <M as Mac>::new_from_slice(secret).map_err(|_| OtpError::InvalidKeyLength)?;
    mac.update(data);

    Ok(mac.finalize().into_bytes().to_vec())
}

/// Calculates the HMAC digest of the big-endian counter
fn calc_digest(
    decoded_secret: &[u8],
    algorithm: OtpHashAlgorithm,
    counter: u64,
) -> Result<Vec<u8>, OtpError> {
    let data = counter.to_be_bytes();

    match algorithm {
        OtpHashAlgorithm::SHA1 => sign::<Hmac<Sha1>>(decoded_secret, &data),
        OtpHashAlgorithm::SHA256 => sign::<Hmac<Sha256>>(decoded_secret, &data),
        OtpHashAlgorithm::SHA512 => sign::<Hmac<Sha512>>(decoded_secret, &data),
    }
}

/// Encodes the HMAC digest into a truncated integer.
fn encode_digest_truncated(digest: &[u8], digits: Digits) -> Result<u32, OtpError> {
    // While sometimes this is a hardcoded 19
    // the last byte tells us the offset for any algorithm
    let offset = match digest.last() {
        Some(x) => *x & 0xf,
        None => return Err(OtpError::InvalidDigest(Vec::from(digest))),
    } as usize;

    // Gets the 4 bytes that will compose the code
    let code_bytes: [u8; 4] = match digest.get(offset..offset + 4).map(<[u8; 4]>::try_from) {
        Some(Ok(x)) => x,
        _ => return Err(OtpError::InvalidDigest(Vec::from(digest))),
    };

    let code = u32::from_be_bytes(code_bytes);

    Ok((code & 0x7fffffff) % digits.modulus())
}

/// Generates the HOTP for `counter`, truncated to the requested digits
pub fn generate_code(
    secret: &str,
    counter: u64,
    digits: Digits,
    algorithm: OtpHashAlgorithm,
) -> Result<OtpCode, OtpError> {
    let decoded = decode_secret(secret)?;
    let digest = calc_digest(decoded.as_slice(), algorithm, counter)?;

    let code = encode_digest_truncated(digest.as_ref(), digits)?;

    Ok(OtpCode { code, digits })
}

/// Checks `passcode` against the HOTP for `counter`.
///
/// A passcode whose length differs from `digits` is reported as
/// [`OtpError::InvalidPasscodeLength`] rather than as a mismatch.
pub fn validate(
    passcode: &str,
    counter: u64,
    secret: &str,
    digits: Digits,
    algorithm: OtpHashAlgorithm,
) -> Result<bool, OtpError> {
    let passcode = passcode.trim();

    if passcode.len() != digits.length() {
        return Err(OtpError::InvalidPasscodeLength {
            expected: digits.length(),
            found: passcode.len(),
        });
    }

    let expected = generate_code(secret, counter, digits, algorithm)?.to_string();

    Ok(constant_time_eq(passcode.as_bytes(), expected.as_bytes()))
}

// Lengths are public (6 or 8), only the contents are compared in constant time
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}
