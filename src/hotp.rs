use hmac::{digest::KeyInit, Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::{OtpCode, OtpHashAlgorithm};

/// Computes the 6-digit SHA1 [HMAC-based One-time Password](http://en.wikipedia.org/wiki/HMAC-based_One-time_Password_Algorithm)
/// (HOTP) for the raw secret bytes and counter.
///
/// There is no failure mode: a corrupt secret yields a deterministic code that
/// simply never matches what the user submits.
pub fn hotp(secret: &[u8], counter: u64) -> OtpCode {
    Hotp::default().generate(secret, counter)
}

/// Code derivation settings shared by every counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hotp {
    algorithm: OtpHashAlgorithm,
    // How many digits to generate
    digits: u32,
}

impl Default for Hotp {
    fn default() -> Self {
        Self {
            algorithm: OtpHashAlgorithm::SHA1,
            digits: 6,
        }
    }
}

impl Hotp {
    pub fn new(algorithm: OtpHashAlgorithm, digits: u32) -> Self {
        Self { algorithm, digits }
    }

    ///  Sets hashing algorithm
    pub fn with_algorithm(&mut self, algorithm: OtpHashAlgorithm) -> &mut Self {
        self.algorithm = algorithm;

        self
    }

    ///  Sets the number of digits to generate
    pub fn with_digits(&mut self, digits: u32) -> &mut Self {
        self.digits = digits;

        self
    }

    /// Generates the code for the provided counter
    /// truncated to the configured number of digits
    pub fn generate(&self, secret: &[u8], counter: u64) -> OtpCode {
        let digest = calc_digest(secret, self.algorithm, counter);

        OtpCode {
            code: encode_digest_truncated(&digest, self.digits),
            digits: self.digits,
        }
    }
}

/// Calculates the HMAC of the big-endian counter keyed by the secret.
pub fn calc_digest(secret: &[u8], algorithm: OtpHashAlgorithm, counter: u64) -> Vec<u8> {
    let data = counter.to_be_bytes();

    match algorithm {
        OtpHashAlgorithm::SHA1 => sign::<Hmac<Sha1>>(secret, &data),
        OtpHashAlgorithm::SHA256 => sign::<Hmac<Sha256>>(secret, &data),
        OtpHashAlgorithm::SHA512 => sign::<Hmac<Sha512>>(secret, &data),
    }
}

fn sign<M: Mac + KeyInit>(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = <M as KeyInit>::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Dynamic truncation (RFC 4226 section 5.3) of an HMAC digest.
///
/// The digest must come from [`calc_digest`]: every supported algorithm
/// produces at least 20 bytes, so `offset + 4` stays in bounds.
pub(crate) fn encode_digest_truncated(digest: &[u8], target_digits_count: u32) -> u32 {
    // While sometimes this is a hardcoded 19
    // the last byte tells us the offset for any algorithm
    let offset = usize::from(digest[digest.len() - 1] & 0xf);

    let code_bytes = [
        digest[offset],
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ];
    let code = u64::from(u32::from_be_bytes(code_bytes) & 0x7fff_ffff);

    // Past ten digits the 31-bit value is already smaller than the modulus
    let truncated = match 10u64.checked_pow(target_digits_count) {
        Some(truncation_factor) => code % truncation_factor,
        None => code,
    };

    truncated as u32
}
