//! One-time recovery codes for users who lost their authenticator.
//!
//! Codes look like `XXXX-XXXX` (uppercase hex). Only [`hash_backup_code`]
//! output should be stored; the plaintext is shown once at generation time.
//! Marking a code as used after [`find_backup_code`] matches is the caller's
//! job, as is enforcing uniqueness per account in storage.

use data_encoding::{HEXLOWER, HEXUPPER};
use rand::{rngs::OsRng, CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use crate::{compare::constant_time_eq, OtpError};

pub const DEFAULT_BACKUP_CODE_COUNT: usize = 10;

// Random bytes per code, two hex characters each
const CODE_BYTES: usize = 4;

/// A freshly generated batch: plaintext codes for the user and their
/// hashes for storage, index for index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupCodes {
    pub codes: Vec<String>,
    pub hashes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupCodeGenerator {
    count: usize,
}

impl Default for BackupCodeGenerator {
    fn default() -> Self {
        Self {
            count: DEFAULT_BACKUP_CODE_COUNT,
        }
    }
}

impl BackupCodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    ///  Sets the number of codes per batch
    pub fn with_count(&mut self, count: usize) -> &mut Self {
        self.count = count;

        self
    }

    pub fn generate(&self) -> Result<BackupCodes, OtpError> {
        self.generate_with(&mut OsRng)
    }

    /// Generates a batch from the given random source.
    ///
    /// Codes within a batch are not checked for duplicates; with 32 random
    /// bits each a collision is negligible.
    pub fn generate_with<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> Result<BackupCodes, OtpError> {
        let mut codes = Vec::with_capacity(self.count);

        for _ in 0..self.count {
            let mut bytes = [0u8; CODE_BYTES];
            rng.try_fill_bytes(&mut bytes).map_err(|e| {
                tracing::warn!(error = %e, "random source failed while generating backup codes");
                OtpError::Entropy(e)
            })?;

            codes.push(format_code(&bytes));
        }

        let hashes = codes.iter().map(|c| hash_backup_code(c)).collect();

        tracing::debug!(count = self.count, "generated backup codes");

        Ok(BackupCodes { codes, hashes })
    }
}

/// Generates `count` plaintext backup codes from the operating system random source.
pub fn generate_backup_codes(count: usize) -> Result<Vec<String>, OtpError> {
    let mut generator = BackupCodeGenerator::new();
    generator.with_count(count);

    Ok(generator.generate()?.codes)
}

fn format_code(bytes: &[u8]) -> String {
    let hex = HEXUPPER.encode(bytes);
    let (head, tail) = hex.split_at(hex.len() / 2);

    format!("{head}-{tail}")
}

/// Removes hyphens and whitespace and uppercases, so that `abcd1234`,
/// `ABCD-1234` and ` abcd-1234 ` are all the same code.
pub fn normalize_backup_code(code: &str) -> String {
    code.chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// SHA-256 of the normalized code as lowercase hex.
pub fn hash_backup_code(code: &str) -> String {
    let digest = Sha256::digest(normalize_backup_code(code).as_bytes());

    HEXLOWER.encode(&digest)
}

/// Looks the submitted code up among stored hashes.
///
/// Returns the index of the first matching hash so the caller can consume
/// it. Every stored hash is compared in constant time and the scan never
/// stops early.
pub fn find_backup_code<S: AsRef<str>>(submitted: &str, stored_hashes: &[S]) -> Option<usize> {
    let candidate = hash_backup_code(submitted);
    let mut found = None;

    for (index, stored) in stored_hashes.iter().enumerate() {
        let matched = constant_time_eq(candidate.as_bytes(), stored.as_ref().as_bytes());
        if matched && found.is_none() {
            found = Some(index);
        }
    }

    found
}
