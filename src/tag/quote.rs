//! Go string literal escaping
//!
//! Tag values and interpreted string literals use the Go escape set:
//! `\a \b \f \n \r \t \v \\ \"`, three-digit octal `\ooo`, `\xHH`,
//! `\uHHHH` and `\UHHHHHHHH`. Octal and `\x` escapes produce raw bytes, so
//! the decoded result must still be valid UTF-8.

/// Decode the body of a double-quoted Go string (quotes already removed).
///
/// On failure returns the byte offset, within `body`, of the escape that
/// could not be decoded.
pub fn unescape(body: &str) -> Result<String, usize> {
    let bytes = body.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }

        let start = i;
        let esc = *bytes.get(i + 1).ok_or(start)?;
        i += 2;
        match esc {
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'v' => out.push(0x0b),
            b'\\' => out.push(b'\\'),
            b'"' => out.push(b'"'),
            b'0'..=b'7' => {
                let value = digits(bytes, i - 1, 3, 8).ok_or(start)?;
                let byte = u8::try_from(value).map_err(|_| start)?;
                out.push(byte);
                i += 2;
            }
            b'x' => {
                let value = digits(bytes, i, 2, 16).ok_or(start)?;
                out.push(value as u8);
                i += 2;
            }
            b'u' | b'U' => {
                let width = if esc == b'u' { 4 } else { 8 };
                let value = digits(bytes, i, width, 16).ok_or(start)?;
                let ch = char::from_u32(value).ok_or(start)?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                i += width;
            }
            _ => return Err(start),
        }
    }

    String::from_utf8(out).map_err(|e| e.utf8_error().valid_up_to().min(body.len()))
}

/// Decode a complete double-quoted Go string literal, quotes included.
pub fn unquote_interpreted(literal: &str) -> Option<String> {
    let body = literal.strip_prefix('"')?.strip_suffix('"')?;
    unescape(body).ok()
}

/// Decode a Go raw string literal: strip the backquotes and drop carriage returns.
pub fn unquote_raw(literal: &str) -> Option<String> {
    let body = literal.strip_prefix('`')?.strip_suffix('`')?;
    Some(body.replace('\r', ""))
}

/// Quote `value` as a double-quoted Go string that [`unescape`] decodes back to `value`.
pub fn quote_go_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn digits(bytes: &[u8], at: usize, count: usize, radix: u32) -> Option<u32> {
    let slice = bytes.get(at..at + count)?;
    slice.iter().try_fold(0u32, |acc, &b| {
        let digit = (b as char).to_digit(radix)?;
        Some(acc * radix + digit)
    })
}
