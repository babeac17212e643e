use chrono::Utc;
use totpkit::{totp, GenerateOpts};

pub fn main() -> anyhow::Result<()> {
    // Provision a key with the defaults (random 20 byte secret, SHA1 hash, 6-digits and 30 seconds period)
    let key = totp::generate_key(GenerateOpts::new("Example", "alice@example.com"))?;
    println!("Provisioning URI: {key}");

    // chrono timestamps can be used directly
    let now = Utc::now();

    // Generate the code for the current period
    let code = totp::generate_code(key.secret(), now)?;

    // Print the code
    println!(
        "Code: {}, Remaining time: {}",
        code,
        totp::remaining_seconds(now, key.period())
    );

    // Check it the way a server would
    let valid = totp::validate_custom(&code, key.secret(), now, key.validate_opts())?;
    println!("Valid: {valid}");

    Ok(())
}
