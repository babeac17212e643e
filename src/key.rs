use std::{fmt::Display, str::FromStr};

use crate::{
    config::ValidateOpts,
    hotp,
    uri_helper::{self, HOTP_TYPE, TOTP_TYPE},
    Digits, OtpError, OtpHashAlgorithm,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpType {
    Totp,
    Hotp,
}

impl Display for OtpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Totp => write!(f, "{TOTP_TYPE}"),
            Self::Hotp => write!(f, "{HOTP_TYPE}"),
        }
    }
}

/// A provisioning key: the shared secret plus everything an authenticator
/// app needs to produce matching codes, kept both as the `otpauth://` URI
/// and in parsed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub(crate) url: String,
    pub(crate) otp_type: OtpType,
    pub(crate) issuer: Option<String>,
    pub(crate) account_name: String,
    pub(crate) secret: String,
    pub(crate) period: u64,
    pub(crate) digits: Digits,
    pub(crate) algorithm: OtpHashAlgorithm,
}

impl Key {
    /// Parses an `otpauth://` URI.
    ///
    /// The issuer comes from the `issuer` query parameter, or from the label
    /// prefix (`Issuer:account`) when the parameter is absent. Missing
    /// `period`, `digits` and `algorithm` take their defaults.
    pub fn from_url(url: &str) -> Result<Self, OtpError> {
        uri_helper::key_from_uri(url)
    }

    /// The URI this key was built from
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn otp_type(&self) -> OtpType {
        self.otp_type
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    /// The base32 encoded secret
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// The decoded secret bytes
    pub fn secret_bytes(&self) -> Result<Vec<u8>, OtpError> {
        hotp::decode_secret(&self.secret)
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn digits(&self) -> Digits {
        self.digits
    }

    pub fn algorithm(&self) -> OtpHashAlgorithm {
        self.algorithm
    }

    /// Options matching this key, with the default skew
    pub fn validate_opts(&self) -> ValidateOpts {
        ValidateOpts::default()
            .with_period(self.period)
            .with_digits(self.digits)
            .with_algorithm(self.algorithm)
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

impl FromStr for Key {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_url(s)
    }
}
