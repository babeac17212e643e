//! Defaults and the option records accepted by [`crate::totp`].
//!
//! Both records are plain values: build one with `Default` (or `new`), override
//! what you need with the `with_*` methods, and hand it to the call. Zero is
//! treated as "unset" for the period and the secret size and is replaced by
//! the default before any work is done.

use std::{fmt, io::Read};

use crate::{Digits, OtpHashAlgorithm};

/// Seconds a single TOTP counter value stays valid.
pub const DEFAULT_PERIOD: u64 = 30;

/// Counters tolerated on each side of the current one during validation.
pub const DEFAULT_SKEW: u64 = 1;

pub const DEFAULT_DIGITS: Digits = Digits::Six;

pub const DEFAULT_ALGORITHM: OtpHashAlgorithm = OtpHashAlgorithm::SHA1;

/// Size in bytes of a randomly generated secret.
pub const DEFAULT_SECRET_SIZE: usize = 20;

pub const URI_SCHEME: &str = "otpauth";

/// Options for generating and validating TOTP codes.
///
/// The defaults (30 second period, a skew of 1, 6 digits and SHA1) are
/// compatible with Google Authenticator and most other clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateOpts {
    /// Seconds a code is valid for.
    pub period: u64,
    /// Periods before and after the current one to accept. A value of 1
    /// allows up to one period of drift either way; more than that is
    /// rarely a good idea.
    pub skew: u64,
    pub digits: Digits,
    pub algorithm: OtpHashAlgorithm,
}

impl Default for ValidateOpts {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            skew: DEFAULT_SKEW,
            digits: DEFAULT_DIGITS,
            algorithm: DEFAULT_ALGORITHM,
        }
    }
}

impl ValidateOpts {
    pub fn new() -> Self {
        Self::default()
    }

    ///  Sets the period in seconds
    pub fn with_period(mut self, period: u64) -> Self {
        self.period = period;

        self
    }

    ///  Sets how many periods on each side of the current one are accepted
    pub fn with_skew(mut self, skew: u64) -> Self {
        self.skew = skew;

        self
    }

    ///  Sets the number of digits to generate
    pub fn with_digits(mut self, digits: Digits) -> Self {
        self.digits = digits;

        self
    }

    ///  Sets hashing algorithm
    pub fn with_algorithm(mut self, algorithm: OtpHashAlgorithm) -> Self {
        self.algorithm = algorithm;

        self
    }

    /// Replaces unset values with their defaults.
    pub(crate) fn resolved(mut self) -> Self {
        if self.period == 0 {
            self.period = DEFAULT_PERIOD;
        }

        self
    }
}

/// Options for [`crate::totp::generate_key`].
///
/// `issuer` and `account_name` are required; everything else has a default.
pub struct GenerateOpts {
    /// Name of the issuing organization or company.
    pub issuer: String,
    /// Name of the user's account, e.g. an email address.
    pub account_name: String,
    /// Seconds a code is valid for. Defaults to 30.
    pub period: u64,
    /// Size of the generated secret in bytes. Defaults to 20.
    pub secret_size: usize,
    /// Explicit secret bytes. Leave empty to draw `secret_size` random bytes,
    /// which is what you should generally do.
    pub secret: Vec<u8>,
    pub digits: Digits,
    pub algorithm: OtpHashAlgorithm,
    /// Byte source for the secret. Defaults to the operating system CSPRNG.
    pub rand: Option<Box<dyn Read + Send>>,
}

impl Default for GenerateOpts {
    fn default() -> Self {
        Self {
            issuer: String::new(),
            account_name: String::new(),
            period: DEFAULT_PERIOD,
            secret_size: DEFAULT_SECRET_SIZE,
            secret: Vec::new(),
            digits: DEFAULT_DIGITS,
            algorithm: DEFAULT_ALGORITHM,
            rand: None,
        }
    }
}

impl fmt::Debug for GenerateOpts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerateOpts")
            .field("issuer", &self.issuer)
            .field("account_name", &self.account_name)
            .field("period", &self.period)
            .field("secret_size", &self.secret_size)
            .field("secret", &format_args!("[{} bytes]", self.secret.len()))
            .field("digits", &self.digits)
            .field("algorithm", &self.algorithm)
            .field("rand", &self.rand.as_ref().map(|_| "custom"))
            .finish()
    }
}

impl GenerateOpts {
    pub fn new(issuer: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            account_name: account_name.into(),
            ..Self::default()
        }
    }

    ///  Sets the period in seconds
    pub fn with_period(mut self, period: u64) -> Self {
        self.period = period;

        self
    }

    ///  Sets the number of random bytes drawn for the secret
    pub fn with_secret_size(mut self, secret_size: usize) -> Self {
        self.secret_size = secret_size;

        self
    }

    ///  Uses the given bytes as the secret instead of drawing random ones
    pub fn with_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.secret = secret.into();

        self
    }

    ///  Sets the number of digits to generate
    pub fn with_digits(mut self, digits: Digits) -> Self {
        self.digits = digits;

        self
    }

    ///  Sets hashing algorithm
    pub fn with_algorithm(mut self, algorithm: OtpHashAlgorithm) -> Self {
        self.algorithm = algorithm;

        self
    }

    ///  Sets the byte source the secret is drawn from
    pub fn with_rand(mut self, rand: impl Read + Send + 'static) -> Self {
        self.rand = Some(Box::new(rand));

        self
    }

    /// Replaces unset values with their defaults.
    pub(crate) fn resolved(mut self) -> Self {
        if self.period == 0 {
            self.period = DEFAULT_PERIOD;
        }

        if self.secret_size == 0 {
            self.secret_size = DEFAULT_SECRET_SIZE;
        }

        self
    }
}
