use std::fmt::Write;

/// Number of raw lines shown in test mode.
pub const TEST_MODE_LINES: u64 = 11;
/// Number of raw lines shown at the start of a verbose run.
pub const VERBOSE_RULER_LINES: u64 = 3;

/// Renders a line with each character above its byte offset, for checking the
/// fixed column positions of the input format.
pub fn column_ruler(line: &str) -> String {
    let mut chars = String::new();
    let mut offsets = String::new();
    for (offset, ch) in line.char_indices() {
        let _ = write!(chars, "{:>2}|", ch);
        let _ = write!(offsets, "{:>2}|", offset);
    }
    format!(
        "Line: {}\nLine Len: {}\n{}\n{}\n",
        line,
        line.len(),
        chars,
        offsets
    )
}
