use subtle::{Choice, ConstantTimeEq};

/// Compares `submitted` against `expected` in time that depends only on the
/// length of `expected`.
///
/// `subtle` treats slices of different lengths as unequal by returning early,
/// which leaks the length. Instead the submitted bytes are copied into a
/// buffer shaped like `expected` and the lengths are compared as integers, so
/// the full scan always runs.
pub fn constant_time_eq(submitted: &[u8], expected: &[u8]) -> bool {
    let mut padded = vec![0u8; expected.len()];
    for (slot, byte) in padded.iter_mut().zip(submitted) {
        *slot = *byte;
    }

    let same_length: Choice = (submitted.len() as u64).ct_eq(&(expected.len() as u64));
    let same_bytes: Choice = padded.as_slice().ct_eq(expected);

    (same_length & same_bytes).into()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::constant_time_eq;

    #[rstest]
    #[case(b"287082", b"287082", true)]
    #[case(b"287083", b"287082", false)]
    #[case(b"", b"", true)]
    #[case(b"", b"287082", false)]
    #[case(b"28708", b"287082", false)]
    #[case(b"2870820", b"287082", false)]
    #[case(b"287082\0", b"287082", false)]
    #[case(b"\0\0\0\0\0\0", b"", false)]
    fn compares_bytes_and_lengths(
        #[case] submitted: &[u8],
        #[case] expected: &[u8],
        #[case] equal: bool,
    ) {
        assert_eq!(equal, constant_time_eq(submitted, expected));
    }

    #[test]
    fn zero_padding_is_not_a_match() {
        // The padded buffer is all zeroes for a short input, which must not
        // collide with an expected value made of zero bytes
        assert!(!constant_time_eq(b"", &[0, 0, 0]));
    }
}
