//! Literal and comment normalization.
//!
//! Pre-pass over the raw ZeptoN source that blanks out comments and
//! re-encodes string and character literal bodies as `\uXXXX` escapes.
//! After normalization no brace or quote character survives inside a
//! comment or literal, so the brace-depth state machine in the
//! rewriter can never be desynchronized by one. Line breaks are kept
//! in place: the output always has exactly as many lines as the input.

use std::fmt::Write as _;

use crate::error::StructuralError;

/// Normalize raw ZeptoN source text.
///
/// An unterminated block comment, string, or character literal is a
/// structural error reported at the position where the construct opened.
pub fn normalize(source: &str) -> Result<String, StructuralError> {
    let normalizer = Normalizer {
        chars: source.chars().peekable(),
        out: String::with_capacity(source.len()),
        line: 1,
        col: 1,
    };
    normalizer.run()
}

struct Normalizer<'src> {
    chars: std::iter::Peekable<std::str::Chars<'src>>,
    out: String,
    line: u32,
    col: u32,
}

impl<'src> Normalizer<'src> {
    fn run(mut self) -> Result<String, StructuralError> {
        while let Some(&ch) = self.chars.peek() {
            match ch {
                '/' => {
                    let (line, col) = (self.line, self.col);
                    self.bump();
                    match self.chars.peek() {
                        Some('/') => {
                            self.bump();
                            self.out.push_str("  ");
                            self.blank_line_comment();
                        }
                        Some('*') => {
                            self.bump();
                            self.out.push_str("  ");
                            self.blank_block_comment(line, col)?;
                        }
                        _ => self.out.push('/'),
                    }
                }
                '"' => self.encode_literal('"', "string literal")?,
                '\'' => self.encode_literal('\'', "character literal")?,
                _ => {
                    self.bump();
                    self.out.push(ch);
                }
            }
        }
        Ok(self.out)
    }

    /// Blank a `//` comment up to (not including) the line break.
    fn blank_line_comment(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch == '\n' {
                break;
            }
            self.bump();
            self.out.push(if ch.is_whitespace() { ch } else { ' ' });
        }
    }

    /// Blank a `/* ... */` comment, preserving its line breaks.
    fn blank_block_comment(&mut self, open_line: u32, open_col: u32) -> Result<(), StructuralError> {
        loop {
            let Some(ch) = self.bump() else {
                return Err(StructuralError::at(
                    "unterminated block comment",
                    open_line,
                    open_col,
                ));
            };
            if ch == '*' && self.chars.peek() == Some(&'/') {
                self.bump();
                self.out.push_str("  ");
                return Ok(());
            }
            self.out.push(if ch.is_whitespace() { ch } else { ' ' });
        }
    }

    /// Re-encode the body of a quoted literal as `\uXXXX` escapes,
    /// keeping the delimiting quotes. A backslash escape in the body is
    /// encoded as two units, which the host compiler folds back into
    /// the original escape sequence.
    fn encode_literal(&mut self, quote: char, what: &str) -> Result<(), StructuralError> {
        let (open_line, open_col) = (self.line, self.col);
        self.bump();
        self.out.push(quote);
        loop {
            match self.bump() {
                None | Some('\n') => {
                    return Err(StructuralError::at(
                        format!("unterminated {what}"),
                        open_line,
                        open_col,
                    ));
                }
                Some(ch) if ch == quote => {
                    self.out.push(quote);
                    return Ok(());
                }
                Some('\\') => {
                    self.encode_char('\\');
                    match self.bump() {
                        None | Some('\n') => {
                            return Err(StructuralError::at(
                                format!("unterminated {what}"),
                                open_line,
                                open_col,
                            ));
                        }
                        Some(escaped) => self.encode_char(escaped),
                    }
                }
                Some(ch) => self.encode_char(ch),
            }
        }
    }

    fn encode_char(&mut self, ch: char) {
        let mut units = [0u16; 2];
        for unit in ch.encode_utf16(&mut units) {
            // Infallible: writing into a String cannot fail.
            let _ = write!(self.out, "\\u{:04X}", unit);
        }
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }
}
