//! Tokenizer for normalized ZeptoN source.
//!
//! The rewriter only ever looks at a token's image and position, so
//! the lexer is image-preserving: every token carries the exact text
//! it was cut from, and the rewriter re-assembles output lines from
//! those images. Keywords are not classified here; the rewriter keys
//! its transformations on the identifier images (`package`, `prog`,
//! `begin`, `me`, `main`) directly.
//!
//! The lexer runs after [`crate::normalize`], so no comments remain
//! and literal bodies contain only `\uXXXX` escapes.

/// Kind of a token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    Str,
    Char,
    Punct,
}

/// A single token: its kind, its literal text, and its position.
/// Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub image: String,
    pub begin_line: u32,
    pub begin_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

/// Seam for an injected token producer. The bundled [`lex`] satisfies
/// it through the blanket iterator impl, and so does any external
/// lexer that yields [`Token`]s.
pub trait TokenSource {
    fn next_token(&mut self) -> Option<Token>;
}

impl<I: Iterator<Item = Token>> TokenSource for I {
    fn next_token(&mut self) -> Option<Token> {
        self.next()
    }
}

/// Multi-character operators, longest first within each group.
/// Maximal munch over this table keeps compound operators like `==`
/// or `>>=` as single tokens so the rewriter's space-separated output
/// stays valid host syntax.
const OPERATORS: &[&str] = &[
    ">>>=", "...", ">>>", "<<=", ">>=", "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "->", "::",
];

/// Lex normalized source text into tokens.
pub fn lex(source: &str) -> Vec<Token> {
    let mut lexer = Lexer {
        chars: source.chars().collect(),
        index: 0,
        line: 1,
        col: 1,
    };
    lexer.run()
}

struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: u32,
    col: u32,
}

impl Lexer {
    fn run(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.bump();
                continue;
            }

            let begin = (self.line, self.col);
            let token = if is_ident_start(ch) {
                self.lex_ident(begin)
            } else if ch.is_ascii_digit() {
                self.lex_number(begin)
            } else if ch == '"' {
                self.lex_quoted('"', TokenKind::Str, begin)
            } else if ch == '\'' {
                self.lex_quoted('\'', TokenKind::Char, begin)
            } else {
                self.lex_punct(begin)
            };
            tokens.push(token);
        }

        tokens
    }

    fn lex_ident(&mut self, begin: (u32, u32)) -> Token {
        let mut image = String::new();
        while let Some(ch) = self.peek() {
            if is_ident_continue(ch) {
                image.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        self.token(TokenKind::Ident, image, begin)
    }

    fn lex_number(&mut self, begin: (u32, u32)) -> Token {
        let mut image = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' {
                image.push(ch);
                self.bump();
                // Exponent sign: 1e-5, 0x1p+3
                if matches!(ch, 'e' | 'E' | 'p' | 'P')
                    && matches!(self.peek(), Some('+') | Some('-'))
                {
                    image.push(self.peek().unwrap_or_default());
                    self.bump();
                }
            } else {
                break;
            }
        }
        self.token(TokenKind::Number, image, begin)
    }

    /// A quoted literal. Normalization guarantees the body is free of
    /// quotes and line breaks, so scanning to the closing delimiter is
    /// enough; an unterminated literal was already rejected there.
    fn lex_quoted(&mut self, quote: char, kind: TokenKind, begin: (u32, u32)) -> Token {
        let mut image = String::new();
        image.push(quote);
        self.bump();
        while let Some(ch) = self.peek() {
            image.push(ch);
            self.bump();
            if ch == quote {
                break;
            }
        }
        self.token(kind, image, begin)
    }

    fn lex_punct(&mut self, begin: (u32, u32)) -> Token {
        for op in OPERATORS {
            if self.rest_starts_with(op) {
                for _ in 0..op.len() {
                    self.bump();
                }
                return self.token(TokenKind::Punct, op.to_string(), begin);
            }
        }
        let ch = self.peek().unwrap_or_default();
        self.bump();
        self.token(TokenKind::Punct, ch.to_string(), begin)
    }

    fn token(&self, kind: TokenKind, image: String, begin: (u32, u32)) -> Token {
        Token {
            kind,
            image,
            begin_line: begin.0,
            begin_col: begin.1,
            end_line: self.line,
            end_col: self.col,
        }
    }

    fn rest_starts_with(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(offset, ch)| self.chars.get(self.index + offset) == Some(&ch))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn bump(&mut self) {
        if let Some(&ch) = self.chars.get(self.index) {
            self.index += 1;
            if ch == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_continue(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}
