use totpguard::{totp::unix_millis_now, BackupCodeGenerator, Secret, Totp, TotpConfig};

pub fn main() -> anyhow::Result<()> {
    // Initialize the engine with the defaults (SHA1 hash, 6-digits, 30 seconds period, window of 1)
    let totp = Totp::new(TotpConfig::new("ACME Co"))?;

    // Enroll: a fresh secret and the URI the authenticator app scans
    let secret = Secret::generate()?;
    println!(
        "Provisioning URI: {}",
        totp.provisioning_uri(&secret.to_base32(), "john.doe@email.com")
    );

    // Generate the code with the milliseconds since the UNIX epoch
    let now = unix_millis_now()?;
    let code = totp.generate(secret.as_bytes(), now);

    // Print the code
    println!(
        "Code: {}, Remaining time: {}",
        code,
        totp.remaining_seconds(now)
    );
    println!(
        "Verified: {}",
        totp.verify_at(secret.as_bytes(), &code.to_string(), now)
    );

    // Recovery codes are shown once, only the hashes are kept
    let backup = BackupCodeGenerator::new().generate()?;
    for (code, hash) in backup.codes.iter().zip(&backup.hashes) {
        println!("Backup code: {code} (stored as {hash})");
    }

    Ok(())
}
