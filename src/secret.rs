use std::fmt;

use rand::{rngs::OsRng, CryptoRng, RngCore};
use zeroize::Zeroizing;

use crate::{base32, compare::constant_time_eq, OtpError};

/// Number of random bytes in a freshly generated secret (160 bits).
pub const SECRET_LENGTH: usize = 20;

/// Shared secret of one enrollment.
///
/// The buffer is wiped on drop, `Debug` never prints it and equality runs in
/// constant time. Storing it is up to the caller.
#[derive(Clone)]
pub struct Secret(Zeroizing<Vec<u8>>);

impl Secret {
    /// Draws [`SECRET_LENGTH`] bytes from the operating system random source.
    pub fn generate() -> Result<Self, OtpError> {
        Self::generate_with(&mut OsRng)
    }

    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, OtpError> {
        let mut bytes = Zeroizing::new(vec![0u8; SECRET_LENGTH]);

        rng.try_fill_bytes(bytes.as_mut_slice()).map_err(|e| {
            tracing::warn!(error = %e, "random source failed while generating a secret");
            OtpError::Entropy(e)
        })?;

        tracing::debug!(length = SECRET_LENGTH, "generated new secret");

        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(bytes.into()))
    }

    /// Decodes the base32 form with the permissive decoder, see [`base32::decode`].
    pub fn from_base32(text: &str) -> Self {
        Self(Zeroizing::new(base32::decode(text)))
    }

    pub fn to_base32(&self) -> String {
        base32::encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.0, &other.0)
    }
}

impl Eq for Secret {}
