//! Text detection and line splitting.

/// Control bytes that may appear in text files: tab, line feed, carriage
/// return, form feed and escape.
const ALLOWED_CONTROL: [u8; 5] = [b'\t', b'\n', b'\r', 0x0c, 0x1b];

/// Whether content must be treated as binary.
///
/// Content is binary when it is not valid UTF-8 or contains a control byte
/// outside [`ALLOWED_CONTROL`].
pub fn is_binary(bytes: &[u8]) -> bool {
    as_text(bytes).is_none()
}

/// Borrow content as text, or `None` if it is binary.
pub fn as_text(bytes: &[u8]) -> Option<&str> {
    if bytes
        .iter()
        .any(|&b| (b < 0x20 || b == 0x7f) && !ALLOWED_CONTROL.contains(&b))
    {
        return None;
    }
    std::str::from_utf8(bytes).ok()
}

/// Split text into lines, each keeping its terminator.
///
/// Concatenating the result gives back the input exactly, including `\r\n`
/// endings and a missing final newline.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}
