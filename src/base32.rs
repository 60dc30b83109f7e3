//! RFC 4648 base32 without padding, the text form authenticator apps expect
//! for shared secrets.
//!
//! [`decode`] is permissive: it ignores case, drops trailing `=` and skips
//! every character outside `A-Z2-7`, so a secret pasted with spaces or dashes
//! still decodes. That is the policy used by [`crate::Secret::from_base32`]
//! and therefore by verification. [`decode_strict`] is available for callers
//! that want to reject garbled input at enrollment time instead.

use crate::OtpError;

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Encodes raw bytes as unpadded uppercase base32.
pub fn encode(bytes: &[u8]) -> String {
    let mut output = String::with_capacity((bytes.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for &byte in bytes {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;

        while bits >= 5 {
            let index = (buffer >> (bits - 5)) & 0x1f;
            output.push(char::from(ALPHABET[index as usize]));
            bits -= 5;
        }

        buffer &= (1 << bits) - 1;
    }

    // Last group is short, pad its low bits with zeroes
    if bits > 0 {
        let index = (buffer << (5 - bits)) & 0x1f;
        output.push(char::from(ALPHABET[index as usize]));
    }

    output
}

/// Decodes base32 text, skipping anything that is not part of the alphabet.
///
/// Never fails: input without a single valid symbol yields an empty vector,
/// and leftover bits that do not fill a whole byte are dropped.
pub fn decode(text: &str) -> Vec<u8> {
    let mut accumulator = Accumulator::with_capacity(text.len());

    for byte in text.trim_end_matches('=').bytes() {
        if let Some(value) = symbol_value(byte) {
            accumulator.push(value);
        }
    }

    accumulator.finish()
}

/// Decodes base32 text, failing on the first character outside the alphabet.
///
/// Lowercase letters and trailing `=` padding are still accepted.
pub fn decode_strict(text: &str) -> Result<Vec<u8>, OtpError> {
    let mut accumulator = Accumulator::with_capacity(text.len());

    for (position, c) in text.trim_end_matches('=').char_indices() {
        let value = u8::try_from(c)
            .ok()
            .and_then(symbol_value)
            .ok_or(OtpError::InvalidBase32(c, position))?;

        accumulator.push(value);
    }

    Ok(accumulator.finish())
}

fn symbol_value(byte: u8) -> Option<u8> {
    match byte.to_ascii_uppercase() {
        upper @ b'A'..=b'Z' => Some(upper - b'A'),
        digit @ b'2'..=b'7' => Some(digit - b'2' + 26),
        _ => None,
    }
}

/// Packs 5-bit symbols into bytes, most significant bit first.
struct Accumulator {
    buffer: u32,
    bits: u32,
    output: Vec<u8>,
}

impl Accumulator {
    fn with_capacity(symbols: usize) -> Self {
        Self {
            buffer: 0,
            bits: 0,
            output: Vec::with_capacity(symbols * 5 / 8),
        }
    }

    fn push(&mut self, value: u8) {
        self.buffer = (self.buffer << 5) | u32::from(value);
        self.bits += 5;

        if self.bits >= 8 {
            self.output.push((self.buffer >> (self.bits - 8)) as u8);
            self.bits -= 8;
            self.buffer &= (1 << self.bits) - 1;
        }
    }

    fn finish(self) -> Vec<u8> {
        self.output
    }
}
