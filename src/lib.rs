//! Time-based One-Time Passwords ([RFC 6238](https://www.rfc-editor.org/rfc/rfc6238))
//! on top of an [RFC 4226](https://www.rfc-editor.org/rfc/rfc4226) HOTP primitive,
//! plus generation of `otpauth://` provisioning keys for authenticator apps.
//!
//! ```
//! use totpkit::{totp, ValidateOpts};
//!
//! let secret = "JBSWY3DPEHPK3PXP";
//! let code = totp::generate_code(secret, 59_i64).unwrap();
//! assert_eq!(code, "996554");
//!
//! let opts = ValidateOpts::default().with_skew(0);
//! assert!(totp::validate_custom(&code, secret, 59_i64, opts).unwrap());
//! assert!(!totp::validate_custom(&code, secret, 90_i64, opts).unwrap());
//! ```

pub mod clock;
pub mod config;
pub mod hotp;
pub mod key;
pub mod totp;
pub(crate) mod uri_helper;

use core::num;
use std::{fmt::Display, str::FromStr};

pub use clock::UnixTime;
pub use config::{GenerateOpts, ValidateOpts};
pub use key::{Key, OtpType};

#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("Secret decode error")]
    SecretDecode(data_encoding::DecodeError),
    #[error("The HMAC rejected the secret length")]
    InvalidKeyLength,
    #[error("Invalid digest")]
    InvalidDigest(Vec<u8>),
    #[error("Invalid passcode length, found {found}. Expected: {expected}")]
    InvalidPasscodeLength { expected: usize, found: usize },
    #[error("Invalid hashing algorithm, found {0}. Expected one of: SHA1, SHA256 or SHA512")]
    InvalidHashingAlgorithm(String),
    #[error("Invalid digit count, found {0}. Expected one of: 6 or 8")]
    InvalidDigits(String),
    #[error("Issuer must be set to generate a key")]
    MissingIssuer,
    #[error("Account name must be set to generate a key")]
    MissingAccountName,
    #[error("Could not read the secret from the random source")]
    RandomSource(#[source] std::io::Error),
    #[error("The provided URI scheme is not valid, found {0}. Expected: otpauth")]
    InvalidUriScheme(String),
    #[error("The provided URI type is not valid, found {0}. Expected: {1}")]
    InvalidUriType(String, String),
    #[error("Could not parse the URI")]
    UriParseError(url::ParseError),
    #[error("Could not retrieve the secret from the URI")]
    UriMissingSecret,
    #[error("The URI label is not valid UTF-8")]
    UriLabelEncoding(std::str::Utf8Error),
    #[error("Could not parse an integer. Failed parsing: {1}")]
    IntegerParseError(num::ParseIntError, String),
    #[error("The period must be greater than zero")]
    InvalidPeriod,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OtpHashAlgorithm {
    #[default]
    SHA1,
    SHA256,
    SHA512,
}

impl Display for OtpHashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SHA1 => write!(f, "SHA1"),
            Self::SHA256 => write!(f, "SHA256"),
            Self::SHA512 => write!(f, "SHA512"),
        }
    }
}

impl FromStr for OtpHashAlgorithm {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_uppercase();

        match normalized.as_str() {
            "SHA1" => Ok(Self::SHA1),
            "SHA256" => Ok(Self::SHA256),
            "SHA512" => Ok(Self::SHA512),
            _ => Err(OtpError::InvalidHashingAlgorithm(s.to_string())),
        }
    }
}

/// Number of digits in a passcode
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Digits {
    #[default]
    Six,
    Eight,
}

impl Digits {
    /// The number of characters in a passcode of this size
    pub const fn length(self) -> usize {
        match self {
            Self::Six => 6,
            Self::Eight => 8,
        }
    }

    /// 10^digits, the truncation modulus
    pub(crate) const fn modulus(self) -> u32 {
        match self {
            Self::Six => 1_000_000,
            Self::Eight => 100_000_000,
        }
    }
}

impl Display for Digits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.length())
    }
}

impl FromStr for Digits {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "6" => Ok(Self::Six),
            "8" => Ok(Self::Eight),
            _ => Err(OtpError::InvalidDigits(s.to_string())),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OtpCode {
    code: u32,
    digits: Digits,
}

impl OtpCode {
    pub fn integer(&self) -> u32 {
        self.code
    }

    pub fn digits(&self) -> Digits {
        self.digits
    }
}

impl Display for OtpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:0padding$}",
            self.code,
            padding = self.digits.length()
        )
    }
}
