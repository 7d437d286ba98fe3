//! ANSI color escapes for the 8-color palette.
//!
//! A [`Style`] built with `enabled == false` produces empty strings everywhere, so
//! formatters can style unconditionally.

/// The eight standard terminal colors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    const fn foreground(self) -> u8 {
        30 + self as u8
    }

    const fn background(self) -> u8 {
        40 + self as u8
    }
}

/// Builds escape sequences, or nothing when color is disabled.
#[derive(Clone, Copy, Debug)]
pub struct Style {
    enabled: bool,
}

impl Style {
    /// Creates a style; `enabled == false` turns every method into a no-op.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Normal-intensity foreground.
    #[must_use]
    pub fn fg(self, color: Color) -> String {
        self.sgr(&format!("{}", color.foreground()))
    }

    /// Bold/bright foreground.
    #[must_use]
    pub fn bright(self, color: Color) -> String {
        self.sgr(&format!("1;{}", color.foreground()))
    }

    /// Bright foreground on a background.
    #[must_use]
    pub fn bright_on(self, color: Color, background: Color) -> String {
        self.sgr(&format!(
            "1;{};{}",
            color.foreground(),
            background.background()
        ))
    }

    /// Reset to the terminal's default attributes.
    #[must_use]
    pub fn reset(self) -> &'static str {
        if self.enabled { "\x1b[m" } else { "" }
    }

    /// Wraps `text` in `open` and a reset.
    #[must_use]
    pub fn paint(self, open: &str, text: &str) -> String {
        if self.enabled {
            format!("{open}{text}{}", self.reset())
        } else {
            text.to_owned()
        }
    }

    fn sgr(self, params: &str) -> String {
        if self.enabled {
            format!("\x1b[{params}m")
        } else {
            String::new()
        }
    }
}
