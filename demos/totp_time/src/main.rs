use std::time::SystemTime;

use time::OffsetDateTime;
use totpkit::{totp, Digits, GenerateOpts, OtpHashAlgorithm, ValidateOpts};

pub fn main() -> anyhow::Result<()> {
    // Provision a key with a fixed secret, SHA256 and 8 digits
    let key = totp::generate_key(
        GenerateOpts::new("Example", "alice@example.com")
            .with_secret(b"12345678901234567890".to_vec())
            .with_algorithm(OtpHashAlgorithm::SHA256)
            .with_digits(Digits::Eight),
    )?;
    println!("Provisioning URI: {key}");

    let opts = ValidateOpts::default()
        .with_algorithm(key.algorithm())
        .with_digits(key.digits())
        .with_period(key.period());

    // Generate the code with the standard library clock
    let code = totp::generate_code_custom(key.secret(), SystemTime::now(), opts)?;

    // time's OffsetDateTime works as well
    let now = OffsetDateTime::now_utc();

    // Print the code
    println!(
        "Code: {}, Remaining time: {}",
        code,
        totp::remaining_seconds(now, key.period())
    );

    // Validate against the current time, errors count as a mismatch
    println!("Valid: {}", totp::validate(&code, key.secret(), opts));

    Ok(())
}
