//! Printable-width measurement and terminal width discovery.

use std::sync::LazyLock;

use regex::Regex;
use unicode_width::UnicodeWidthStr;

/// Column count used when the terminal cannot be queried or reports zero.
pub const DEFAULT_WIDTH: usize = 80;

// CSI sequences such as `\x1b[1;37;44m` or `\x1b[?25l`.
static CSI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\x1b\\[[0-9;?]*[A-Za-z]").expect("CSI pattern is valid"));

/// Returns the number of terminal columns `text` occupies.
///
/// Escape sequences contribute nothing; East-Asian wide characters count as two
/// columns and zero-width marks as none.
#[must_use]
pub fn display_width(text: &str) -> usize {
    if text.contains('\x1b') {
        CSI.replace_all(text, "").width()
    } else {
        text.width()
    }
}

/// Queries the current terminal width of standard output.
///
/// Falls back to [`DEFAULT_WIDTH`] when unavailable or zero.
#[must_use]
pub fn terminal_width() -> usize {
    match terminal_size::terminal_size() {
        Some((terminal_size::Width(w), _)) if w > 0 => usize::from(w),
        _ => DEFAULT_WIDTH,
    }
}
