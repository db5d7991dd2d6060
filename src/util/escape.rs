/*!
Provides convenience routines for escaping raw bytes.

Error messages quote the offending input through these types so that
non-printable bytes from a malformed blob cannot mangle the message.
*/

/// Provides a convenient `Display` implementation for a `u8`.
///
/// The byte is treated as ASCII and emitted in a human readable
/// representation. If the byte isn't printable ASCII, then it's emitted as a
/// hex escape sequence.
#[derive(Clone, Copy)]
pub(crate) struct Byte(pub u8);

impl core::fmt::Display for Byte {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if self.0 == b' ' {
            return write!(f, " ");
        }
        // 10 bytes is enough to cover any output from ascii::escape_default.
        let mut bytes = [0u8; 10];
        let mut len = 0;
        for (i, mut b) in core::ascii::escape_default(self.0).enumerate() {
            // capitalize \xab to \xAB
            if i >= 2 && b'a' <= b && b <= b'f' {
                b -= 32;
            }
            bytes[len] = b;
            len += 1;
        }
        write!(f, "{}", core::str::from_utf8(&bytes[..len]).unwrap())
    }
}

impl core::fmt::Debug for Byte {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "\"")?;
        core::fmt::Display::fmt(self, f)?;
        write!(f, "\"")
    }
}

/// Provides a convenient `Display` implementation for `&[u8]`.
///
/// This works best when the bytes are presumed to be mostly UTF-8, but will
/// work for anything: bytes that aren't valid UTF-8 are emitted as hex
/// escape sequences.
pub(crate) struct Bytes<'a>(pub &'a [u8]);

impl<'a> core::fmt::Display for Bytes<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut bytes = self.0;
        loop {
            match core::str::from_utf8(bytes) {
                Ok(text) => {
                    for ch in text.chars() {
                        write_char(ch, f)?;
                    }
                    return Ok(());
                }
                Err(err) => {
                    let (valid, rest) = bytes.split_at(err.valid_up_to());
                    // SAFETY-free: `valid` was just checked by from_utf8.
                    for ch in core::str::from_utf8(valid).unwrap().chars() {
                        write_char(ch, f)?;
                    }
                    if rest.is_empty() {
                        return Ok(());
                    }
                    write!(f, r"\x{:02x}", rest[0])?;
                    bytes = &rest[1..];
                }
            }
        }
    }
}

impl<'a> core::fmt::Debug for Bytes<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "\"")?;
        core::fmt::Display::fmt(self, f)?;
        write!(f, "\"")
    }
}

fn write_char(
    ch: char,
    f: &mut core::fmt::Formatter,
) -> core::fmt::Result {
    if ch.is_ascii() {
        return write!(f, "{}", Byte(ch as u8));
    }
    write!(f, "{ch}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_bytes_pass_through() {
        assert_eq!(Bytes(b"EST5EDT").to_string(), "EST5EDT");
        assert_eq!(Byte(b'A').to_string(), "A");
    }

    #[test]
    fn unprintable_bytes_escape() {
        assert_eq!(Byte(0x00).to_string(), r"\x00");
        assert_eq!(Bytes(b"a\xffb").to_string(), r"a\xffb");
        assert_eq!(Bytes(b"nul\x00").to_string(), r"nul\x00");
    }
}
