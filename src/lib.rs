//! Time-based one-time password (RFC 6238) engine for two-factor login.
//!
//! Every operation is a pure function over its inputs: secrets, counters,
//! timestamps and submitted codes come from the caller and nothing is kept
//! between calls. Persisting secrets, tracking the last accepted counter and
//! rate-limiting failed attempts belong to the calling authentication flow.

pub mod backup;
pub mod base32;
pub mod compare;
pub mod config;
pub mod hotp;
pub mod secret;
pub mod totp;
pub mod uri;

use core::num;
use std::{fmt::Display, str::FromStr, time::SystemTimeError};

pub use backup::{
    find_backup_code, generate_backup_codes, hash_backup_code, BackupCodeGenerator, BackupCodes,
};
pub use config::TotpConfig;
pub use hotp::{hotp, Hotp};
pub use secret::Secret;
pub use totp::Totp;
pub use uri::{generate_secret, parse_provisioning_uri, provisioning_uri, ProvisioningUri};

#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("The random source failed, refusing to continue with weak entropy")]
    Entropy(rand::Error),
    #[error("Invalid base32 character {0:?} at position {1}")]
    InvalidBase32(char, usize),
    #[error("Invalid hashing algorithm, found {0}. Expected one of: SHA1, SHA256 or SHA512")]
    InvalidHashingAlgorithm(String),
    #[error("Invalid number of digits, found {0}. Expected a value between 6 and 10")]
    InvalidDigits(u32),
    #[error("Invalid period, found {0}. The period must be at least one second")]
    InvalidPeriod(u64),
    #[error("Invalid verification window, found {0}. Expected at most 10 steps")]
    InvalidWindow(u64),
    #[error("The provided URI is not valid, found {0}. Expected: {1}")]
    InvalidUriType(String, String),
    #[error("Could not parse the URI")]
    UriParseError(url::ParseError),
    #[error("Could not retrieve the secret from the URI")]
    UriMissingSecret,
    #[error("Unsupported value for the URI parameter {0}: {1}")]
    UnsupportedUriParameter(String, String),
    #[error("Could not parse an integer. Failed parsing: {1}")]
    IntegerParseError(num::ParseIntError, String),
    #[error("The system clock is set before the UNIX epoch")]
    SystemTime(SystemTimeError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
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

/// A generated one-time code together with the width it must be shown with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OtpCode {
    code: u32,
    digits: u32,
}

impl OtpCode {
    pub fn integer(&self) -> u32 {
        self.code
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }
}

impl Display for OtpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:0padding$}",
            self.code,
            padding = (self.digits as usize)
        )
    }
}
