use crate::{OtpError, OtpHashAlgorithm};

pub const DEFAULT_ISSUER: &str = "Dealbridge";

/// Widest accepted verification window, in steps on each side of the current one.
pub const MAX_WINDOW: u64 = 10;

/// Settings for one [`crate::Totp`] engine.
///
/// Held by value so engines with different settings can live side by side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotpConfig {
    pub(crate) issuer: String,
    pub(crate) algorithm: OtpHashAlgorithm,
    pub(crate) period: u64,
    pub(crate) digits: u32,
    pub(crate) window: u64,
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ISSUER)
    }
}

impl TotpConfig {
    /// Creates the config for the given issuer name, as shown by authenticator apps.
    ///
    /// Obs.: This method defaults to the SHA1 hash, a 6-digit code, a period of
    /// 30 seconds and a verification window of one step on each side
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            algorithm: OtpHashAlgorithm::SHA1,
            period: 30,
            digits: 6,
            window: 1,
        }
    }

    ///  Sets the issuer name
    pub fn with_issuer(&mut self, issuer: impl Into<String>) -> &mut Self {
        self.issuer = issuer.into();

        self
    }

    ///  Sets hashing algorithm
    pub fn with_algorithm(&mut self, algorithm: OtpHashAlgorithm) -> &mut Self {
        self.algorithm = algorithm;

        self
    }

    ///  Sets the period in seconds
    pub fn with_period(&mut self, period: u64) -> &mut Self {
        self.period = period;

        self
    }

    ///  Sets the number of digits to generate
    pub fn with_digits(&mut self, digits: u32) -> &mut Self {
        self.digits = digits;

        self
    }

    ///  Sets how many steps before and after the current one are accepted
    pub fn with_window(&mut self, window: u64) -> &mut Self {
        self.window = window;

        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn algorithm(&self) -> OtpHashAlgorithm {
        self.algorithm
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    pub fn window(&self) -> u64 {
        self.window
    }

    pub fn validate(&self) -> Result<(), OtpError> {
        if self.period == 0 {
            return Err(OtpError::InvalidPeriod(self.period));
        }

        if !(6..=10).contains(&self.digits) {
            return Err(OtpError::InvalidDigits(self.digits));
        }

        if self.window > MAX_WINDOW {
            return Err(OtpError::InvalidWindow(self.window));
        }

        Ok(())
    }
}
