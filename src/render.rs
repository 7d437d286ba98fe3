//! Differential, in-place repainting of a single terminal line.
//!
//! The renderer only knows the line it painted last ([`RenderSnapshot`]). To
//! repaint it rewinds the cursor with backspaces, blanks the old columns with
//! spaces, rewinds again and prints the new line. Nothing is written when the
//! line has not changed.

use std::io::{self, Write};

/// Hides the terminal cursor.
pub const CURSOR_HIDE: &str = "\x1b[?25l";
/// Shows the terminal cursor.
pub const CURSOR_SHOW: &str = "\x1b[?25h";

/// The line painted by the previous cycle.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RenderSnapshot {
    /// Painted text, escape sequences included.
    pub line: String,
    /// Printable columns of `line`; also where the cursor sits.
    pub width: usize,
}

/// Repaints one line on `out`, writing only when something changed.
#[derive(Debug)]
pub struct Renderer<W: Write> {
    out: W,
    last: RenderSnapshot,
    cursor_hidden: bool,
}

impl<W: Write> Renderer<W> {
    /// Creates a renderer with nothing painted yet.
    pub fn new(out: W) -> Self {
        Self {
            out,
            last: RenderSnapshot::default(),
            cursor_hidden: false,
        }
    }

    /// The line painted last.
    pub const fn snapshot(&self) -> &RenderSnapshot {
        &self.last
    }

    /// Gives access to the underlying writer.
    pub const fn get_ref(&self) -> &W {
        &self.out
    }

    /// Paints `line` (printable width `width`) over the previous one.
    ///
    /// Returns `Ok(false)` without writing when the line is unchanged and `force`
    /// is not set.
    pub fn paint(&mut self, line: &str, width: usize, force: bool) -> io::Result<bool> {
        if !force && line == self.last.line {
            return Ok(false);
        }

        let mut buf = String::with_capacity(line.len() + 3 * self.last.width.max(width) + 8);
        self.hide_cursor(&mut buf);
        push_rewind(&mut buf, self.last.width);
        let span = self.last.width.max(width);
        push_blank(&mut buf, span);
        push_rewind(&mut buf, span);
        buf.push_str(line);

        self.out.write_all(buf.as_bytes())?;
        self.out.flush()?;

        self.last.line.clear();
        self.last.line.push_str(line);
        self.last.width = width;
        Ok(true)
    }

    /// Blanks the painted line and leaves the cursor at its start.
    ///
    /// The snapshot is reset, so the next [`paint`](Self::paint) repaints fully.
    pub fn erase(&mut self) -> io::Result<()> {
        let mut buf = String::with_capacity(3 * self.last.width + 8);
        self.hide_cursor(&mut buf);
        self.push_erase(&mut buf);
        self.out.write_all(buf.as_bytes())?;
        self.out.flush()
    }

    /// Prints `text` as an ordinary scrolling line where the bar was.
    pub fn interject(&mut self, text: &str) -> io::Result<()> {
        let mut buf = String::with_capacity(3 * self.last.width + text.len() + 1);
        self.push_erase(&mut buf);
        buf.push_str(text);
        buf.push('\n');
        self.out.write_all(buf.as_bytes())?;
        self.out.flush()
    }

    /// Writes `text` and a newline with no bar bookkeeping.
    pub fn write_line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    /// Final cleanup: keep the last frame and end the line, or erase it, then
    /// show the cursor again.
    pub fn finish(&mut self, leave: bool) -> io::Result<()> {
        let mut buf = String::new();
        if leave {
            if self.last.width > 0 {
                buf.push('\n');
            }
            self.last = RenderSnapshot::default();
        } else {
            self.push_erase(&mut buf);
        }
        buf.push_str(CURSOR_SHOW);
        self.cursor_hidden = false;
        self.out.write_all(buf.as_bytes())?;
        self.out.flush()
    }

    fn hide_cursor(&mut self, buf: &mut String) {
        if !self.cursor_hidden {
            buf.push_str(CURSOR_HIDE);
            self.cursor_hidden = true;
        }
    }

    fn push_erase(&mut self, buf: &mut String) {
        let width = self.last.width;
        push_rewind(buf, width);
        push_blank(buf, width);
        push_rewind(buf, width);
        self.last = RenderSnapshot::default();
    }
}

fn push_rewind(buf: &mut String, n: usize) {
    buf.extend(std::iter::repeat_n('\x08', n));
}

fn push_blank(buf: &mut String, n: usize) {
    buf.extend(std::iter::repeat_n(' ', n));
}
