//! The [Time-based One-time Password Algorithm](http://en.wikipedia.org/wiki/Time-based_One-time_Password_Algorithm)
//! (TOTP): HOTP where the counter is the number of whole periods elapsed
//! since the Unix epoch.

use std::{io::Read, iter, time::SystemTime};

use rand::{rngs::OsRng, RngCore};

use crate::{
    clock::UnixTime,
    config::{
        GenerateOpts, ValidateOpts, DEFAULT_ALGORITHM, DEFAULT_DIGITS, DEFAULT_PERIOD,
        DEFAULT_SKEW,
    },
    hotp,
    key::Key,
    uri_helper::{totp_to_uri, TotpUriInput},
    OtpError,
};

/// The moving counter for `t`: Unix seconds divided by `period`, floored.
///
/// Times before the epoch produce a negative quotient, which is returned in
/// its two's complement form.
///
/// # Panics
/// If `period` is zero. The functions taking [`ValidateOpts`] replace a zero
/// period with the default before getting here.
pub fn counter(t: impl UnixTime, period: u64) -> u64 {
    let seconds = i128::from(t.unix_seconds());

    seconds.div_euclid(i128::from(period)) as u64
}

/// Seconds left until the counter for `t` moves on, between 1 and `period`.
///
/// # Panics
/// If `period` is zero.
pub fn remaining_seconds(t: impl UnixTime, period: u64) -> u64 {
    let elapsed = i128::from(t.unix_seconds()).rem_euclid(i128::from(period)) as u64;

    period - elapsed
}

/// Generates the code for `t` with the configuration used by Google
/// Authenticator and most clients: 6 digits, SHA1 and a 30 second period.
pub fn generate_code(secret: &str, t: impl UnixTime) -> Result<String, OtpError> {
    generate_code_custom(
        secret,
        t,
        ValidateOpts {
            period: DEFAULT_PERIOD,
            skew: DEFAULT_SKEW,
            digits: DEFAULT_DIGITS,
            algorithm: DEFAULT_ALGORITHM,
        },
    )
}

/// Generates the code for the period containing `t`.
///
/// Errors from the underlying HOTP, e.g. a secret that is not valid base32,
/// are returned unchanged.
pub fn generate_code_custom(
    secret: &str,
    t: impl UnixTime,
    opts: ValidateOpts,
) -> Result<String, OtpError> {
    let opts = opts.resolved();
    let counter = counter(t, opts.period);

    let code = hotp::generate_code(secret, counter, opts.digits, opts.algorithm)?;

    Ok(code.to_string())
}

/// Validates `passcode` against the current time.
///
/// Any error is reported as `false`; use [`validate_custom`] to tell a
/// wrong passcode apart from a bad secret or configuration.
pub fn validate(passcode: &str, secret: &str, opts: ValidateOpts) -> bool {
    validate_custom(passcode, secret, SystemTime::now(), opts).unwrap_or(false)
}

/// Validates `passcode` at `t`, accepting codes from `opts.skew` periods on
/// either side of the one containing `t`.
///
/// Counters are tried in the order base, +1, -1, +2, -2, ... and the first
/// match wins. The first HOTP error ends the validation and is returned,
/// even if a later counter would have matched.
pub fn validate_custom(
    passcode: &str,
    secret: &str,
    t: impl UnixTime,
    opts: ValidateOpts,
) -> Result<bool, OtpError> {
    let opts = opts.resolved();
    let base = counter(t, opts.period);

    // base, +1, -1, +2, -2, ... generated lazily so a match or an error stops early
    let counters = iter::once(base).chain(
        (1..=opts.skew).flat_map(|i| [base.wrapping_add(i), base.wrapping_sub(i)]),
    );

    log::trace!(
        "validating around counter {base} with skew {} (period {}s)",
        opts.skew,
        opts.period
    );

    for counter in counters {
        if hotp::validate(passcode, counter, secret, opts.digits, opts.algorithm)? {
            log::debug!(
                "passcode matched at offset {}",
                counter.wrapping_sub(base) as i64
            );
            return Ok(true);
        }
    }

    Ok(false)
}

/// Generates a new TOTP provisioning key.
///
/// The issuer and account name are checked before anything else. Unless
/// `opts.secret` is set, `opts.secret_size` bytes are drawn from `opts.rand`
/// (the operating system CSPRNG by default).
pub fn generate_key(opts: GenerateOpts) -> Result<Key, OtpError> {
    if opts.issuer.is_empty() {
        return Err(OtpError::MissingIssuer);
    }

    if opts.account_name.is_empty() {
        return Err(OtpError::MissingAccountName);
    }

    let mut opts = opts.resolved();

    let secret = if !opts.secret.is_empty() {
        log::debug!("provisioning with an explicit {} byte secret", opts.secret.len());
        hotp::encode_secret(&opts.secret)
    } else {
        log::debug!("provisioning with {} random bytes", opts.secret_size);
        let mut buffer = vec![0u8; opts.secret_size];
        match opts.rand.as_mut() {
            Some(rand) => fill_from_reader(rand, &mut buffer)?,
            None => OsRng.try_fill_bytes(&mut buffer).map_err(|e| {
                OtpError::RandomSource(std::io::Error::new(std::io::ErrorKind::Other, e))
            })?,
        }
        hotp::encode_secret(&buffer)
    };

    // otpauth://totp/Example:alice@example.com?secret=JBSWY3DPEHPK3PXP&issuer=Example&period=30&algorithm=SHA1&digits=6
    let uri = totp_to_uri(&TotpUriInput {
        issuer: &opts.issuer,
        account_name: &opts.account_name,
        secret: &secret,
        period: opts.period,
        algorithm: opts.algorithm,
        digits: opts.digits,
    })?;

    Key::from_url(&uri)
}

fn fill_from_reader(rand: &mut (dyn Read + Send), buffer: &mut [u8]) -> Result<(), OtpError> {
    rand.read_exact(buffer).map_err(OtpError::RandomSource)
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read};

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use crate::{
        config::{GenerateOpts, ValidateOpts},
        totp::{self, counter, remaining_seconds},
        Digits, OtpError, OtpHashAlgorithm, OtpType,
    };

    #[fixture]
    pub fn sha1_secret() -> String {
        "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ".to_string()
    }

    #[fixture]
    pub fn sha256_secret() -> String {
        "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZA".to_string()
    }

    #[fixture]
    pub fn sha512_secret() -> String {
        "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNA".to_string()
    }

    const SECRET: &str = "JBSWY3DPEHPK3PXP";

    #[rstest]
    #[case(0, 30, 0)]
    #[case(29, 30, 0)]
    #[case(30, 30, 1)]
    #[case(59, 30, 1)]
    #[case(1111111109, 30, 37037036)]
    #[case(59, 60, 0)]
    #[case(-1, 30, u64::MAX)]
    #[case(-30, 30, u64::MAX)]
    #[case(-31, 30, u64::MAX - 1)]
    fn counter_test(#[case] t: i64, #[case] period: u64, #[case] expected: u64) {
        assert_eq!(expected, counter(t, period));
    }

    #[rstest]
    #[case(0, 30)]
    #[case(1, 29)]
    #[case(29, 1)]
    #[case(59, 1)]
    #[case(-1, 1)]
    fn remaining_seconds_test(#[case] t: i64, #[case] expected: u64) {
        assert_eq!(expected, remaining_seconds(t, 30));
    }

    #[rstest]
    #[case(sha1_secret(), "sha1", 59, "94287082")]
    #[case(sha256_secret(), "sha256", 59, "46119246")]
    #[case(sha512_secret(), "sha512", 59, "90693936")]
    #[case(sha1_secret(), "sha1", 1111111109, "07081804")]
    #[case(sha256_secret(), "sha256", 1111111109, "68084774")]
    #[case(sha512_secret(), "sha512", 1111111109, "25091201")]
    #[case(sha1_secret(), "sha1", 1111111111, "14050471")]
    #[case(sha256_secret(), "sha256", 1111111111, "67062674")]
    #[case(sha512_secret(), "sha512", 1111111111, "99943326")]
    #[case(sha1_secret(), "sha1", 1234567890, "89005924")]
    #[case(sha256_secret(), "sha256", 1234567890, "91819424")]
    #[case(sha512_secret(), "sha512", 1234567890, "93441116")]
    #[case(sha1_secret(), "sha1", 2000000000, "69279037")]
    #[case(sha256_secret(), "sha256", 2000000000, "90698825")]
    #[case(sha512_secret(), "sha512", 2000000000, "38618901")]
    #[case(sha1_secret(), "sha1", 20000000000, "65353130")]
    #[case(sha256_secret(), "sha256", 20000000000, "77737706")]
    #[case(sha512_secret(), "sha512", 20000000000, "47863826")]
    #[case(sha1_secret(), "sha1", 20000000000, "353130")]
    #[case(sha256_secret(), "sha256", 20000000000, "737706")]
    #[case(sha512_secret(), "sha512", 20000000000, "863826")]
    fn totp_test(
        #[case] secret: String,
        #[case] hash: OtpHashAlgorithm,
        #[case] timestamp: u64,
        #[case] expected: &str,
    ) {
        let digits: Digits = expected.len().to_string().parse().unwrap();
        let opts = ValidateOpts::default()
            .with_algorithm(hash)
            .with_digits(digits);

        let generated = totp::generate_code_custom(&secret, timestamp, opts).unwrap();
        assert_eq!(expected, generated);
        assert!(totp::validate_custom(&generated, &secret, timestamp, opts.with_skew(0)).unwrap());
    }

    #[test]
    fn generate_code_uses_interoperable_defaults() {
        assert_eq!("996554", totp::generate_code(SECRET, 59_i64).unwrap());
        assert_eq!("996554", totp::generate_code(SECRET, 30_i64).unwrap());
        assert_eq!("602287", totp::generate_code(SECRET, 60_i64).unwrap());
    }

    #[test]
    fn zero_period_falls_back_to_default() {
        let opts = ValidateOpts::default().with_period(0);

        assert_eq!(
            "996554",
            totp::generate_code_custom(SECRET, 59_i64, opts).unwrap()
        );
    }

    #[test]
    fn generate_code_propagates_decode_errors() {
        let result = totp::generate_code("not base32!", 59_i64);

        assert!(matches!(result, Err(OtpError::SecretDecode(_))));
    }

    #[rstest]
    #[case(59, true)]
    #[case(30, true)]
    #[case(29, false)]
    #[case(60, false)]
    #[case(90, false)]
    fn validate_without_skew(#[case] t: i64, #[case] expected: bool) {
        let opts = ValidateOpts::default().with_skew(0);

        assert_eq!(
            expected,
            totp::validate_custom("996554", SECRET, t, opts).unwrap()
        );
    }

    // "996554" is the code for counter 1, "768897" the code for counter 5
    #[rstest]
    #[case("996554", 0, 1, true)]
    #[case("996554", 1, 0, true)]
    #[case("996554", 1, 2, true)]
    #[case("996554", 1, 3, false)]
    #[case("996554", 2, 3, true)]
    #[case("996554", 2, 4, false)]
    #[case("768897", 2, 3, true)]
    #[case("768897", 2, 2, false)]
    #[case("768897", 3, 2, true)]
    fn validate_within_skew(
        #[case] passcode: &str,
        #[case] skew: u64,
        #[case] base_counter: i64,
        #[case] expected: bool,
    ) {
        let opts = ValidateOpts::default().with_skew(skew);

        assert_eq!(
            expected,
            totp::validate_custom(passcode, SECRET, base_counter * 30, opts).unwrap()
        );
    }

    #[test]
    fn wrong_passcode_is_not_an_error() {
        let opts = ValidateOpts::default().with_skew(3);

        assert!(!totp::validate_custom("000000", SECRET, 59_i64, opts).unwrap());
    }

    #[test]
    fn validate_fails_fast_on_errors() {
        let result = totp::validate_custom("996554", "not base32!", 59_i64, ValidateOpts::default());
        assert!(matches!(result, Err(OtpError::SecretDecode(_))));

        let result = totp::validate_custom("99655", SECRET, 59_i64, ValidateOpts::default());
        assert!(matches!(
            result,
            Err(OtpError::InvalidPasscodeLength { expected: 6, found: 5 })
        ));
    }

    #[test]
    fn huge_skew_still_stops_at_the_first_candidate() {
        let opts = ValidateOpts::default().with_skew(u64::MAX);

        let result = totp::validate_custom("12345", SECRET, 59_i64, opts);
        assert!(matches!(
            result,
            Err(OtpError::InvalidPasscodeLength { expected: 6, found: 5 })
        ));

        assert!(totp::validate_custom("996554", SECRET, 59_i64, opts).unwrap());
    }

    #[test]
    fn validate_at_epoch_wraps_below_zero() {
        // counter 0 with skew 1 also checks u64::MAX
        let code = totp::generate_code(SECRET, -1_i64).unwrap();

        assert!(totp::validate_custom(&code, SECRET, 0_i64, ValidateOpts::default()).unwrap());
    }

    #[test]
    fn validate_with_current_time() {
        let code = totp::generate_code(SECRET, std::time::SystemTime::now()).unwrap();

        assert!(totp::validate(&code, SECRET, ValidateOpts::default()));
        assert!(!totp::validate(&code, "not base32!", ValidateOpts::default()));
        assert!(!totp::validate("12345", SECRET, ValidateOpts::default()));
    }

    #[test]
    fn generate_key_with_explicit_secret() {
        let key = totp::generate_key(
            GenerateOpts::new("Example", "alice@example.com")
                .with_secret(b"Hello!\xde\xad\xbe\xef".to_vec()),
        )
        .unwrap();

        assert_eq!(
            "otpauth://totp/Example:alice@example.com?secret=JBSWY3DPEHPK3PXP&issuer=Example&period=30&algorithm=SHA1&digits=6",
            key.url()
        );
        assert_eq!(OtpType::Totp, key.otp_type());
        assert_eq!(Some("Example"), key.issuer());
        assert_eq!("alice@example.com", key.account_name());
        assert_eq!("JBSWY3DPEHPK3PXP", key.secret());
        assert_eq!(30, key.period());
        assert_eq!(OtpHashAlgorithm::SHA1, key.algorithm());
        assert_eq!(Digits::Six, key.digits());
    }

    #[rstest]
    #[case(OtpHashAlgorithm::SHA256, Digits::Eight, 60,
        "otpauth://totp/ACME%20Co:john.doe@email.com?secret=JBSWY3DPEHPK3PXP&issuer=ACME+Co&period=60&algorithm=SHA256&digits=8")]
    #[case(OtpHashAlgorithm::SHA512, Digits::Six, 10,
        "otpauth://totp/ACME%20Co:john.doe@email.com?secret=JBSWY3DPEHPK3PXP&issuer=ACME+Co&period=10&algorithm=SHA512&digits=6")]
    fn generate_key_encodes_options(
        #[case] algorithm: OtpHashAlgorithm,
        #[case] digits: Digits,
        #[case] period: u64,
        #[case] expected: &str,
    ) {
        let key = totp::generate_key(
            GenerateOpts::new("ACME Co", "john.doe@email.com")
                .with_secret(b"Hello!\xde\xad\xbe\xef".to_vec())
                .with_algorithm(algorithm)
                .with_digits(digits)
                .with_period(period),
        )
        .unwrap();

        assert_eq!(expected, key.to_string());
        assert_eq!(Some("ACME Co"), key.issuer());
        assert_eq!(
            ValidateOpts::default()
                .with_algorithm(algorithm)
                .with_digits(digits)
                .with_period(period),
            key.validate_opts()
        );
    }

    #[rstest]
    #[case("50%41 Off", "bob%2Fx", "otpauth://totp/50%2541%20Off:bob%252Fx?")]
    #[case("100%", "alice@example.com", "otpauth://totp/100%25:alice@example.com?")]
    #[case("Example", "a#b?c", "otpauth://totp/Example:a%23b%3Fc?")]
    fn generate_key_keeps_labels_literal(
        #[case] issuer: &str,
        #[case] account_name: &str,
        #[case] expected_prefix: &str,
    ) {
        let key = totp::generate_key(
            GenerateOpts::new(issuer, account_name).with_secret(b"Hello!".to_vec()),
        )
        .unwrap();

        assert!(
            key.url().starts_with(expected_prefix),
            "unexpected uri {}",
            key.url()
        );
        assert_eq!(Some(issuer), key.issuer());
        assert_eq!(account_name, key.account_name());
    }

    #[test]
    fn generate_key_draws_from_injected_source() {
        let bytes: Vec<u8> = (0..32).collect();
        let key = totp::generate_key(
            GenerateOpts::new("Example", "alice").with_rand(Cursor::new(bytes)),
        )
        .unwrap();

        // the first 20 bytes, 0..20
        assert_eq!("AAAQEAYEAUDAOCAJBIFQYDIOB4IBCEQT", key.secret());
        assert_eq!((0..20).collect::<Vec<u8>>(), key.secret_bytes().unwrap());
    }

    #[test]
    fn generate_key_honors_secret_size() {
        let key = totp::generate_key(
            GenerateOpts::new("Example", "alice")
                .with_secret_size(5)
                .with_rand(Cursor::new(b"abcdefgh".to_vec())),
        )
        .unwrap();

        assert_eq!("MFRGGZDF", key.secret());
    }

    #[test]
    fn generate_key_with_default_source() {
        let first = totp::generate_key(GenerateOpts::new("Example", "alice")).unwrap();
        let second = totp::generate_key(GenerateOpts::new("Example", "alice")).unwrap();

        assert_eq!(20, first.secret_bytes().unwrap().len());
        assert_eq!(32, first.secret().len());
        assert_ne!(first.secret(), second.secret());
    }

    #[test]
    fn generate_key_requires_issuer() {
        let result = totp::generate_key(GenerateOpts::new("", "alice"));
        assert!(matches!(result, Err(OtpError::MissingIssuer)));

        let result = totp::generate_key(GenerateOpts::new("", ""));
        assert!(matches!(result, Err(OtpError::MissingIssuer)));
    }

    #[test]
    fn generate_key_requires_account_name() {
        let result = totp::generate_key(GenerateOpts::new("Example", ""));

        assert!(matches!(result, Err(OtpError::MissingAccountName)));
    }

    struct CountingReader(std::sync::Arc<std::sync::atomic::AtomicUsize>);

    impl Read for CountingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.0.fetch_add(buf.len(), std::sync::atomic::Ordering::SeqCst);
            buf.fill(7);
            Ok(buf.len())
        }
    }

    #[test]
    fn missing_names_are_checked_before_drawing() {
        let drawn = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let result = totp::generate_key(
            GenerateOpts::new("Example", "").with_rand(CountingReader(drawn.clone())),
        );

        assert!(matches!(result, Err(OtpError::MissingAccountName)));
        assert_eq!(0, drawn.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[test]
    fn short_random_source_is_an_error() {
        let result = totp::generate_key(
            GenerateOpts::new("Example", "alice").with_rand(Cursor::new(vec![1u8; 5])),
        );

        assert!(matches!(
            result,
            Err(OtpError::RandomSource(e)) if e.kind() == io::ErrorKind::UnexpectedEof
        ));
    }

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "entropy pool drained"))
        }
    }

    #[test]
    fn failing_random_source_is_an_error() {
        let result =
            totp::generate_key(GenerateOpts::new("Example", "alice").with_rand(BrokenReader));

        assert!(matches!(
            result,
            Err(OtpError::RandomSource(e)) if e.to_string() == "entropy pool drained"
        ));
    }
}
