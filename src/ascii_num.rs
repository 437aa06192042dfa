//! Fast ASCII decimal integer formatting and locale-free float parsing.
//!
//! `fast_atof` never reads the process locale: the decimal point is always
//! `.`, the exponent marker is always `e`/`E`, matching the STL ASCII grammar
//! (§3 of the format spec) regardless of the ambient `LC_NUMERIC` setting.

const MAX_FLOAT_TOKEN: usize = 64;

/// Writes the minimal decimal representation of `value` (no leading zeros,
/// `"0"` for zero) into `out`, returning the number of bytes written.
///
/// # Panics
/// Panics if `out` is too small to hold the representation (20 bytes is
/// always enough for a `u64`).
pub fn write_u64_dec(value: u64, out: &mut [u8]) -> usize {
    if value == 0 {
        out[0] = b'0';
        return 1;
    }
    let mut digits = [0u8; 20];
    let mut n = value;
    let mut i = digits.len();
    while n > 0 {
        i -= 1;
        digits[i] = b'0' + (n % 10) as u8;
        n /= 10;
    }
    let len = digits.len() - i;
    out[..len].copy_from_slice(&digits[i..]);
    len
}

pub fn write_u32_dec(value: u32, out: &mut [u8]) -> usize {
    write_u64_dec(u64::from(value), out)
}

pub fn write_i64_dec(value: i64, out: &mut [u8]) -> usize {
    if value < 0 {
        out[0] = b'-';
        1 + write_u64_dec(value.unsigned_abs(), &mut out[1..])
    } else {
        write_u64_dec(value as u64, out)
    }
}

pub fn write_i32_dec(value: i32, out: &mut [u8]) -> usize {
    write_i64_dec(i64::from(value), out)
}

/// Parses one float starting at byte 0 of `s`, per the grammar
/// `[+-]?(digits(.digits)?|.digits)([eE][+-]?digits)?[fF]?`. Trailing `f`/`F`
/// is consumed but ignored. Returns the parsed value and the number of bytes
/// consumed (including any trailing `f`/`F`), or `None` if `s` does not start
/// with a valid float token.
///
/// Accuracy: within 1 ULP of the C-locale `strtod` result cast to `f32`, for
/// all finite inputs (the decimal-to-binary conversion is delegated to
/// Rust's correctly-rounded `f32::from_str`, which is at least as accurate).
#[must_use]
pub fn fast_atof(s: &[u8]) -> Option<(f32, usize)> {
    let mut i = 0;
    let len = s.len();

    if i < len && (s[i] == b'+' || s[i] == b'-') {
        i += 1;
    }

    let int_start = i;
    while i < len && s[i].is_ascii_digit() {
        i += 1;
    }
    let mut has_digits = i > int_start;

    if i < len && s[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < len && s[i].is_ascii_digit() {
            i += 1;
        }
        has_digits = has_digits || i > frac_start;
    }

    if !has_digits {
        return None;
    }

    let mut numeric_end = i;

    if i < len && (s[i] == b'e' || s[i] == b'E') {
        let mut j = i + 1;
        if j < len && (s[j] == b'+' || s[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < len && s[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            numeric_end = j;
        }
    }

    let mut consumed = numeric_end;
    if consumed < len && (s[consumed] == b'f' || s[consumed] == b'F') {
        consumed += 1;
    }

    let text = core::str::from_utf8(&s[..numeric_end]).ok()?;
    let value: f32 = text.parse().ok()?;
    Some((value, consumed))
}

/// A minimal forward cursor over a byte stream, implemented by
/// [`crate::stringstream::Stringstream`]. Kept separate from that type so
/// `fast_atof_cursor` can be unit-tested against a plain slice cursor too.
pub trait FloatCursor {
    /// Peeks the byte at the current position, or `None` at end-of-stream.
    fn current(&mut self) -> Option<u8>;
    /// Advances one byte and returns the new current byte.
    fn advance(&mut self) -> Option<u8>;
    /// Pushes `byte` back so it becomes the current byte again, undoing the
    /// most recent `advance`. Used only to unwind a failed speculative
    /// exponent lookahead; implementors only ever see this called a byte or
    /// two at a time, in reverse order of consumption.
    fn unread(&mut self, byte: u8);
}

/// Parses one float starting at the cursor's current position, per the same
/// grammar as [`fast_atof`]. The cursor ends on the first non-consumed byte.
/// Returns `None` (cursor left at the original position's next byte is
/// unspecified on failure, matching the "fails fast" parser contract) if no
/// valid float token starts here.
pub fn fast_atof_cursor<C: FloatCursor>(cursor: &mut C) -> Option<f32> {
    let mut buf = [0u8; MAX_FLOAT_TOKEN];
    let mut len = 0usize;

    let mut push = |buf: &mut [u8; MAX_FLOAT_TOKEN], len: &mut usize, b: u8| {
        if *len < buf.len() {
            buf[*len] = b;
            *len += 1;
        }
    };

    let mut c = cursor.current();

    if let Some(b @ (b'+' | b'-')) = c {
        push(&mut buf, &mut len, b);
        c = cursor.advance();
    }

    let mut has_digits = false;
    while let Some(b) = c {
        if !b.is_ascii_digit() {
            break;
        }
        has_digits = true;
        push(&mut buf, &mut len, b);
        c = cursor.advance();
    }

    if c == Some(b'.') {
        push(&mut buf, &mut len, b'.');
        c = cursor.advance();
        while let Some(b) = c {
            if !b.is_ascii_digit() {
                break;
            }
            has_digits = true;
            push(&mut buf, &mut len, b);
            c = cursor.advance();
        }
    }

    if !has_digits {
        return None;
    }

    if let Some(b @ (b'e' | b'E')) = c {
        // Speculatively consume the exponent; only keep it if at least one
        // exponent digit follows. On failure, unread every byte consumed
        // during the lookahead so the cursor ends up exactly where it
        // started, per the "cursor ends on the first non-consumed byte"
        // contract.
        let mark_len = len;
        push(&mut buf, &mut len, b);
        let mut lookahead = cursor.advance();
        let sign = if let Some(s @ (b'+' | b'-')) = lookahead {
            push(&mut buf, &mut len, s);
            lookahead = cursor.advance();
            Some(s)
        } else {
            None
        };
        let mut exp_digits = 0;
        while let Some(d) = lookahead {
            if !d.is_ascii_digit() {
                break;
            }
            exp_digits += 1;
            push(&mut buf, &mut len, d);
            lookahead = cursor.advance();
        }
        if exp_digits > 0 {
            c = lookahead;
        } else {
            // No exponent digits: unwind the sign (if any) and 'e'/'E', in
            // reverse order, then restore the cursor's current byte.
            len = mark_len;
            if let Some(s) = sign {
                cursor.unread(s);
            }
            cursor.unread(b);
            c = cursor.current();
        }
    }

    if let Some(b @ (b'f' | b'F')) = c {
        cursor.advance();
        let _ = b;
    }

    let text = core::str::from_utf8(&buf[..len]).ok()?;
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: u64) -> String {
        let mut buf = [0u8; 20];
        let len = write_u64_dec(value, &mut buf);
        String::from_utf8(buf[..len].to_vec()).unwrap()
    }

    #[test]
    fn u64_dec_minimal_representation() {
        assert_eq!(dec(0), "0");
        assert_eq!(dec(7), "7");
        assert_eq!(dec(1234567890), "1234567890");
        assert_eq!(dec(u64::MAX), u64::MAX.to_string());
    }

    #[test]
    fn i64_dec_negative() {
        let mut buf = [0u8; 21];
        let len = write_i64_dec(-42, &mut buf);
        assert_eq!(&buf[..len], b"-42");
        let len = write_i64_dec(i64::MIN, &mut buf);
        assert_eq!(
            core::str::from_utf8(&buf[..len]).unwrap(),
            i64::MIN.to_string()
        );
    }

    #[test]
    fn atoi_roundtrip_canonical_strings() {
        for s in ["0", "7", "1234567890", "18446744073709551615"] {
            let v: u64 = s.parse().unwrap();
            assert_eq!(dec(v), s);
        }
    }

    #[rstest::rstest]
    #[case("-0.0690462109446526")]
    #[case("3.402823466e+38")]
    #[case(".00234567")]
    #[case("1.175494351e-38")]
    fn fast_atof_accuracy_scenarios(#[case] s: &str) {
        let (got, consumed) = fast_atof(s.as_bytes()).unwrap();
        assert_eq!(consumed, s.len());
        let want: f32 = s.parse().unwrap();
        assert_eq!(got.to_bits(), want.to_bits());
    }

    #[test]
    fn fast_atof_consumes_trailing_f_but_ignores_it() {
        let (v, consumed) = fast_atof(b"1.5f,").unwrap();
        assert_eq!(v, 1.5);
        assert_eq!(consumed, 4);
    }

    #[test]
    fn fast_atof_rejects_no_digits() {
        assert!(fast_atof(b"abc").is_none());
        assert!(fast_atof(b"+").is_none());
        assert!(fast_atof(b".").is_none());
    }

    struct SliceCursor<'a> {
        bytes: &'a [u8],
        pos: usize,
    }

    impl<'a> FloatCursor for SliceCursor<'a> {
        fn current(&mut self) -> Option<u8> {
            self.bytes.get(self.pos).copied()
        }
        fn advance(&mut self) -> Option<u8> {
            self.pos += 1;
            self.current()
        }
        fn unread(&mut self, byte: u8) {
            assert!(self.pos > 0);
            self.pos -= 1;
            assert_eq!(self.bytes[self.pos], byte);
        }
    }

    #[test]
    fn fast_atof_cursor_matches_slice_version() {
        for s in ["1 ", "-2.5e10 ", "0.1f "] {
            let mut cursor = SliceCursor {
                bytes: s.as_bytes(),
                pos: 0,
            };
            let got = fast_atof_cursor(&mut cursor).unwrap();
            let (want, _) = fast_atof(s.trim_end().as_bytes()).unwrap();
            assert_eq!(got.to_bits(), want.to_bits());
        }
    }
}
