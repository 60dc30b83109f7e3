use std::time::SystemTime;

use crate::{
    compare::constant_time_eq,
    config::{TotpConfig, MAX_WINDOW},
    hotp::Hotp,
    OtpCode, OtpError,
};

/// [Time-based One-time Password Algorithm](http://en.wikipedia.org/wiki/Time-based_One-time_Password_Algorithm)
/// (TOTP) engine.
///
/// Holds only its configuration. Secrets and timestamps are passed on every
/// call, so one engine can be shared across threads without locking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Totp {
    config: TotpConfig,
    hotp: Hotp,
}

impl Default for Totp {
    fn default() -> Self {
        let config = TotpConfig::default();
        let hotp = Hotp::new(config.algorithm, config.digits);

        Self { config, hotp }
    }
}

impl Totp {
    pub fn new(config: TotpConfig) -> Result<Self, OtpError> {
        config.validate()?;
        let hotp = Hotp::new(config.algorithm, config.digits);

        Ok(Self { config, hotp })
    }

    pub fn config(&self) -> &TotpConfig {
        &self.config
    }

    /// Maps milliseconds since the UNIX epoch to the counter of its period
    pub fn current_counter(&self, now_millis: u64) -> u64 {
        now_millis / 1000 / self.config.period
    }

    /// Seconds until the code generated at `now_millis` stops being current
    pub fn remaining_seconds(&self, now_millis: u64) -> u64 {
        self.config.period - (now_millis / 1000) % self.config.period
    }

    /// Generates the code for the period containing `now_millis`
    pub fn generate(&self, secret: &[u8], now_millis: u64) -> OtpCode {
        self.hotp.generate(secret, self.current_counter(now_millis))
    }

    /// Generates the code for the current system time
    pub fn generate_now(&self, secret: &[u8]) -> Result<OtpCode, OtpError> {
        Ok(self.generate(secret, unix_millis_now()?))
    }

    /// Checks a submitted code against the current system time and the
    /// configured window.
    ///
    /// An unreadable clock is reported as a non-match, same as a wrong code.
    pub fn verify(&self, secret: &[u8], submitted: &str) -> bool {
        match unix_millis_now() {
            Ok(now_millis) => self.verify_at(secret, submitted, now_millis),
            Err(e) => {
                tracing::warn!(error = %e, "cannot read the system clock, rejecting code");
                false
            }
        }
    }

    /// Checks a submitted code at `now_millis` using the configured window
    pub fn verify_at(&self, secret: &[u8], submitted: &str, now_millis: u64) -> bool {
        self.verify_with_window(secret, submitted, now_millis, self.config.window)
    }

    /// Checks a submitted code at `now_millis` within `window` steps on each side
    pub fn verify_with_window(
        &self,
        secret: &[u8],
        submitted: &str,
        now_millis: u64,
        window: u64,
    ) -> bool {
        self.validate_window(secret, submitted, now_millis, window)
            .is_some()
    }

    /// Validates a code in the given window
    /// Returning the counter that it was found at or None if the code is invalid
    ///
    /// Every step from `window` periods in the past to `window` periods in
    /// the future is tried, each compared in constant time. Windows wider than
    /// [`MAX_WINDOW`] are narrowed to it. Callers that want to refuse replays
    /// can remember the returned counter and reject any code that matches at
    /// or below it.
    pub fn validate_window(
        &self,
        secret: &[u8],
        submitted: &str,
        now_millis: u64,
        window: u64,
    ) -> Option<u64> {
        let submitted: String = submitted.chars().filter(|c| *c != ' ').collect();
        let counter = self.current_counter(now_millis);
        let window = window.min(MAX_WINDOW) as i64;

        let found = (-window..=window)
            // Steps before the epoch do not exist
            .filter_map(|offset| counter.checked_add_signed(offset))
            .find(|frame| {
                let expected = self.hotp.generate(secret, *frame).to_string();
                constant_time_eq(submitted.as_bytes(), expected.as_bytes())
            });

        match found {
            Some(frame) => {
                let drift = frame.wrapping_sub(counter) as i64;
                tracing::debug!(window, drift, "code accepted");
            }
            None => tracing::debug!(window, "code rejected"),
        }

        found
    }
}

/// Milliseconds since the UNIX epoch according to the system clock
pub fn unix_millis_now() -> Result<u64, OtpError> {
    let since_epoch = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_err(OtpError::SystemTime)?;

    Ok(u64::try_from(since_epoch.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use crate::{
        base32, config::MAX_WINDOW, hotp, totp::Totp, OtpError, OtpHashAlgorithm, TotpConfig,
    };

    // 1111111111 seconds, counter 37037037
    const NOW: u64 = 1_111_111_111_000;

    #[fixture]
    #[once]
    pub fn sha1_secret() -> String {
        "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ".to_string()
    }

    #[fixture]
    #[once]
    pub fn sha256_secret() -> String {
        "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZA".to_string()
    }

    #[fixture]
    #[once]
    pub fn sha512_secret() -> String {
        "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNA".to_string()
    }

    #[fixture]
    pub fn totp() -> Totp {
        Totp::default()
    }

    fn rfc_key() -> Vec<u8> {
        b"12345678901234567890".to_vec()
    }

    // RFC 6238 appendix B
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
        let mut config = TotpConfig::default();
        config
            .with_algorithm(hash)
            .with_digits(expected.len() as u32);
        let totp = Totp::new(config).unwrap();
        let key = base32::decode(&secret);

        let generated_otp = totp.generate(&key, timestamp * 1000);
        assert_eq!(expected, generated_otp.to_string());
        assert!(totp.verify_with_window(&key, expected, timestamp * 1000, 0));
    }

    #[rstest]
    #[case(0, 0)]
    #[case(29_999, 0)]
    #[case(30_000, 1)]
    #[case(59_999, 1)]
    #[case(60_000, 2)]
    #[case(NOW, 37_037_037)]
    fn counter_from_millis(totp: Totp, #[case] now_millis: u64, #[case] expected: u64) {
        assert_eq!(expected, totp.current_counter(now_millis));
    }

    #[rstest]
    #[case(0, 30)]
    #[case(30_000, 30)]
    #[case(59_000, 1)]
    #[case(59_999, 1)]
    fn remaining_seconds(totp: Totp, #[case] now_millis: u64, #[case] expected: u64) {
        assert_eq!(expected, totp.remaining_seconds(now_millis));
    }

    #[rstest]
    fn composes_codec_and_hotp(totp: Totp) {
        let key = base32::decode("JBSWY3DPEHPK3PXP");

        assert_eq!(hotp(&key, 1), totp.generate(&key, 45_000));
    }

    #[rstest]
    fn previous_step_is_accepted_with_window(totp: Totp) {
        let key = rfc_key();
        let code = totp.generate(&key, NOW - 30_000).to_string();

        assert!(totp.verify_with_window(&key, &code, NOW, 1));
        assert_eq!(
            Some(37_037_036),
            totp.validate_window(&key, &code, NOW, 1)
        );
    }

    #[rstest]
    fn next_step_is_accepted_with_window(totp: Totp) {
        let key = rfc_key();
        let code = totp.generate(&key, NOW + 30_000).to_string();

        assert!(totp.verify_at(&key, &code, NOW));
    }

    #[rstest]
    fn stale_code_is_rejected_without_window(totp: Totp) {
        let key = rfc_key();
        let stale = totp.generate(&key, NOW - 31_000).to_string();

        assert_eq!("081804", stale);
        assert_eq!("050471", totp.generate(&key, NOW).to_string());
        assert!(!totp.verify_with_window(&key, &stale, NOW, 0));
        assert!(totp.verify_with_window(&key, &stale, NOW, 1));
    }

    #[rstest]
    #[case("755224", Some(0))]
    #[case("287082", Some(1))]
    #[case("359152", Some(2))]
    #[case("969429", None)]
    #[case("000000", None)]
    #[case("287 082", Some(1))]
    #[case("28708", None)]
    #[case("2870820", None)]
    #[case("", None)]
    #[case("abcdef", None)]
    fn window_around_counter_one(
        totp: Totp,
        #[case] submitted: &str,
        #[case] expected: Option<u64>,
    ) {
        assert_eq!(expected, totp.validate_window(&rfc_key(), submitted, 59_000, 1));
    }

    #[rstest]
    fn window_does_not_reach_before_epoch(totp: Totp) {
        let key = rfc_key();

        assert!(totp.verify_with_window(&key, "755224", 10_000, 3));
        assert!(totp.verify_with_window(&key, "287082", 10_000, 1));
        assert!(!totp.verify_with_window(&key, "359152", 10_000, 1));
    }

    #[rstest]
    fn secret_without_base32_symbols_only_fails_verification(totp: Totp) {
        let key = base32::decode("!!!0189 !!!");

        assert!(key.is_empty());
        assert!(!totp.verify_at(&key, "755224", 59_000));
    }

    #[rstest]
    fn garbled_secret_only_fails_verification(totp: Totp) {
        // Letters survive permissive decoding, so this is a wrong but non-empty key
        let key = base32::decode("!!!not base32!!!");

        assert!(!totp.verify_at(&key, "755224", 59_000));
    }

    #[rstest]
    fn oversized_window_is_clamped(totp: Totp) {
        let key = rfc_key();
        let edge = totp.generate(&key, NOW - MAX_WINDOW * 30_000).to_string();
        let beyond = totp.generate(&key, NOW - (MAX_WINDOW + 1) * 30_000).to_string();

        assert!(totp.verify_with_window(&key, &edge, NOW, u64::MAX));
        assert_eq!(None, totp.validate_window(&key, &beyond, NOW, u64::MAX));
    }

    #[test]
    fn engines_with_different_configs_coexist() {
        let short = Totp::default();
        let mut config = TotpConfig::new("Other");
        config.with_digits(8).with_period(60);
        let long = Totp::new(config).unwrap();
        let key = rfc_key();

        assert_eq!("287082", short.generate(&key, 59_000).to_string());
        assert_eq!("84755224", long.generate(&key, 59_000).to_string());
        assert_eq!(30, short.config().period());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = TotpConfig::default();
        config.with_period(0);

        assert!(matches!(Totp::new(config), Err(OtpError::InvalidPeriod(0))));

        let mut config = TotpConfig::default();
        config.with_window(u64::MAX);

        assert!(matches!(Totp::new(config), Err(OtpError::InvalidWindow(u64::MAX))));
    }

    #[rstest]
    fn system_clock_round_trip(totp: Totp) {
        let key = rfc_key();
        let code = totp.generate_now(&key).unwrap();

        assert!(totp.verify(&key, &code.to_string()));
    }
}
