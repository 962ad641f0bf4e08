//! Fixed-width CHARACTER copy-out.
//!
//! Fortran character buffers are not NUL-terminated: a value shorter than
//! the buffer is right-filled with blanks, a longer one is cut at the
//! buffer length. Every copy-out in the runtime goes through [`copy_padded`].

/// The padding character for CHARACTER values.
pub const BLANK: u8 = b' ';

/// Copies `src` into `dst`, truncating to `dst.len()` and blank-filling the rest.
///
/// Every byte of `dst` is written. Returns the number of bytes taken from `src`.
pub fn copy_padded(dst: &mut [u8], src: &[u8]) -> usize {
    let count = dst.len().min(src.len());
    dst[..count].copy_from_slice(&src[..count]);
    dst[count..].fill(BLANK);
    count
}

/// Overwrites all of `dst` with blanks.
pub fn fill_blanks(dst: &mut [u8]) {
    dst.fill(BLANK);
}

/// The bytes of `buf` before its first NUL, or all of `buf` when there is none.
#[must_use]
pub fn c_prefix(buf: &[u8]) -> &[u8] {
    match buf.iter().position(|&b| b == 0) {
        Some(end) => &buf[..end],
        None => buf,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_source_is_blank_padded() {
        let mut dst = [0u8; 10];
        let n = copy_padded(&mut dst, b"alpha");
        assert_eq!(n, 5);
        assert_eq!(&dst, b"alpha     ");
    }

    #[test]
    fn long_source_is_truncated_without_padding() {
        let mut dst = [0u8; 4];
        let n = copy_padded(&mut dst, b"carol");
        assert_eq!(n, 4);
        assert_eq!(&dst, b"caro");
    }

    #[test]
    fn exact_fit_copies_everything() {
        let mut dst = [b'x'; 4];
        copy_padded(&mut dst, b"beta");
        assert_eq!(&dst, b"beta");
    }

    #[test]
    fn empty_destination_is_a_no_op() {
        let mut dst: [u8; 0] = [];
        assert_eq!(copy_padded(&mut dst, b"anything"), 0);
    }

    #[test]
    fn empty_source_blanks_destination() {
        let mut dst = [0xAAu8; 3];
        copy_padded(&mut dst, b"");
        assert_eq!(&dst, b"   ");
    }

    #[test]
    fn c_prefix_stops_at_first_nul() {
        assert_eq!(c_prefix(b"bob\0junk\0"), b"bob");
        assert_eq!(c_prefix(b"\0"), b"");
        assert_eq!(c_prefix(b"no-terminator"), b"no-terminator");
    }

    proptest! {
        #[test]
        fn prop_copy_padded_writes_every_byte(
            src in proptest::collection::vec(any::<u8>(), 0..96),
            dst_seed in proptest::collection::vec(any::<u8>(), 0..96)
        ) {
            let mut dst = dst_seed.clone();
            let copied = copy_padded(&mut dst, &src);
            let expected = src.len().min(dst_seed.len());

            prop_assert_eq!(copied, expected);
            prop_assert_eq!(dst.len(), dst_seed.len());
            prop_assert_eq!(&dst[..expected], &src[..expected]);
            prop_assert!(dst[expected..].iter().all(|&b| b == BLANK));
        }

        #[test]
        fn prop_c_prefix_has_no_nul(buf in proptest::collection::vec(any::<u8>(), 0..64)) {
            let prefix = c_prefix(&buf);
            prop_assert!(!prefix.contains(&0));
            prop_assert!(buf.starts_with(prefix));
        }
    }
}
