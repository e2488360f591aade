//! Token-stream rewriter: ZeptoN to host-language source text.
//!
//! The rewriter consumes a token stream and reassembles output text
//! per original source line, applying point transformations keyed on
//! token images (`package`, `prog`, `begin`, `me`, `main`, braces).
//! Every untouched token is copied to the buffer of its begin line,
//! so generated line N is source line N for all user-authored code
//! (the line-fidelity invariant the diagnostic reporter relies on).
//!
//! Brace depth drives the synthesized scaffolding: the brace that
//! closes the `begin` block (depth back to 1) becomes the
//! catch/finally epilogue, and the brace that closes the program
//! (depth back to 0) carries the runtime support library plus the
//! synthesized class-closing brace.

use std::collections::BTreeMap;

use crate::error::StructuralError;
use crate::lexer::{Token, TokenKind, TokenSource};
use crate::support;

/// A generated host-language compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramUnit {
    /// Declared program name from `prog <Identifier>`.
    pub name: String,
    /// Package namespace, when the source has a `package` clause.
    pub package: Option<String>,
    /// Generated host source text.
    pub source: String,
}

impl ProgramUnit {
    /// Sentinel unit representing a failed or aborted transpile.
    /// The compile driver rejects it without invoking the backend.
    pub fn empty() -> Self {
        ProgramUnit {
            name: String::new(),
            package: None,
            source: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() || self.source.is_empty()
    }

    /// Fully qualified name, `<package>.<name>` when packaged.
    pub fn qualified_name(&self) -> String {
        match &self.package {
            Some(pack) => format!("{pack}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingPackage,
    AwaitingProgram,
    InsideBody,
    Closed,
}

#[derive(Debug, Default)]
struct BraceState {
    depth: i32,
    inside_program_block: bool,
}

/// Rewrite a ZeptoN token stream into a host-language unit.
///
/// `expected_name` is the source file's base name for file-based
/// invocations; the declared program name must match it exactly.
pub fn rewrite(
    tokens: impl TokenSource,
    expected_name: Option<&str>,
) -> Result<ProgramUnit, StructuralError> {
    let rewriter = Rewriter {
        tokens,
        lines: BTreeMap::new(),
        state: State::AwaitingPackage,
        braces: BraceState::default(),
        prog_name: String::new(),
        pack_name: None,
        preamble_emitted: false,
        begin_seen: false,
        epilogue_emitted: false,
        last_line: 0,
    };
    rewriter.run(expected_name)
}

struct Rewriter<S> {
    tokens: S,
    /// Per-line output buffer: source line number -> generated text.
    lines: BTreeMap<u32, String>,
    state: State,
    braces: BraceState,
    prog_name: String,
    pack_name: Option<String>,
    preamble_emitted: bool,
    begin_seen: bool,
    epilogue_emitted: bool,
    last_line: u32,
}

impl<S: TokenSource> Rewriter<S> {
    fn run(mut self, expected_name: Option<&str>) -> Result<ProgramUnit, StructuralError> {
        while let Some(tok) = self.next() {
            if tok.kind == TokenKind::Ident {
                check_ident_prefix(&tok)?;
            }

            match (tok.kind, tok.image.as_str()) {
                (TokenKind::Punct, "{") => {
                    self.braces.depth += 1;
                    self.push(tok.begin_line, "{");
                }
                (TokenKind::Punct, "}") => self.close_brace(&tok),
                (TokenKind::Ident, "package") => self.package_clause(&tok)?,
                (TokenKind::Ident, "prog") => self.prog_declaration(&tok)?,
                (TokenKind::Ident, "begin") => self.begin_block(&tok)?,
                (TokenKind::Ident, "me") => {
                    if !self.braces.inside_program_block {
                        return Err(StructuralError::at(
                            "keyword 'me' only used within program block begin { ... }",
                            tok.begin_line,
                            tok.begin_col,
                        ));
                    }
                    self.push(tok.begin_line, "_$me");
                }
                // A user identifier 'main' would collide with the
                // synthesized entry point.
                (TokenKind::Ident, "main") => self.push(tok.begin_line, "_$main"),
                _ => self.push(tok.begin_line, &tok.image),
            }
        }

        self.finish(expected_name)
    }

    fn close_brace(&mut self, tok: &Token) {
        self.braces.depth -= 1;
        if self.braces.inside_program_block {
            if self.braces.depth == 1 && !self.epilogue_emitted {
                self.epilogue_emitted = true;
                self.push(tok.begin_line, support::PROGRAM_EPILOGUE);
                return;
            }
            if self.braces.depth == 0 && self.state != State::Closed {
                let footer = format!("}}\n\n{}\n\n}}", support::RUNTIME_SUPPORT);
                self.push(tok.begin_line, &footer);
                self.state = State::Closed;
                return;
            }
        }
        self.push(tok.begin_line, "}");
    }

    /// `package a.b.c;` is copied through; the import preamble rides
    /// on the semicolon's line so no later line shifts.
    fn package_clause(&mut self, tok: &Token) -> Result<(), StructuralError> {
        self.push(tok.begin_line, "package");
        let mut name = String::new();
        loop {
            let Some(next) = self.next() else {
                return Err(StructuralError::at(
                    "unterminated 'package' declaration",
                    tok.begin_line,
                    tok.begin_col,
                ));
            };
            self.push(next.begin_line, &next.image);
            if next.kind == TokenKind::Punct && next.image == ";" {
                if !self.preamble_emitted {
                    self.preamble_emitted = true;
                    self.push(next.begin_line, support::IMPORT_PREAMBLE);
                }
                break;
            }
            name.push_str(&next.image);
        }
        self.pack_name = Some(name);
        if self.state == State::AwaitingPackage {
            self.state = State::AwaitingProgram;
        }
        Ok(())
    }

    fn prog_declaration(&mut self, tok: &Token) -> Result<(), StructuralError> {
        if !self.preamble_emitted {
            self.preamble_emitted = true;
            self.push(tok.begin_line, support::IMPORT_PREAMBLE);
        }
        self.push(tok.begin_line, "public final class");

        let Some(ident) = self.next() else {
            return Err(StructuralError::at(
                "identifier must follow keyword 'prog'",
                tok.begin_line,
                tok.begin_col,
            ));
        };
        if ident.kind != TokenKind::Ident {
            return Err(StructuralError::at(
                "identifier must follow keyword 'prog'",
                ident.begin_line,
                ident.begin_col,
            ));
        }
        check_ident_prefix(&ident)?;

        self.prog_name = ident.image.clone();
        self.push(ident.begin_line, &ident.image);
        if self.state == State::AwaitingPackage {
            self.state = State::AwaitingProgram;
        }
        Ok(())
    }

    /// `begin {` becomes a constructor plus the entry-point method,
    /// with the block body wrapped in a try statement. The rewritten
    /// opening brace opens both the method body and the try block;
    /// the matching depth-1 close therefore only closes the try.
    fn begin_block(&mut self, tok: &Token) -> Result<(), StructuralError> {
        if self.prog_name.is_empty() {
            return Err(StructuralError::at(
                "program block 'begin' before 'prog' declaration",
                tok.begin_line,
                tok.begin_col,
            ));
        }
        if self.begin_seen {
            return Err(StructuralError::at(
                "duplicate 'begin' program block",
                tok.begin_line,
                tok.begin_col,
            ));
        }
        self.begin_seen = true;
        self.braces.inside_program_block = true;

        self.push(
            tok.begin_line,
            &format!(
                "public {0}(){{ ; }} public static final void main(String[] _$args)",
                self.prog_name
            ),
        );

        let open = self.next();
        match open {
            Some(ref brace) if brace.kind == TokenKind::Punct && brace.image == "{" => {
                self.braces.depth += 1;
                let line = brace.begin_line;
                self.push(
                    line,
                    &format!(
                        "{{ try {{ _$start(_$args); {0} _$me = new {0}();",
                        self.prog_name
                    ),
                );
                self.state = State::InsideBody;
                Ok(())
            }
            _ => Err(StructuralError::at(
                "opening brace '{' must follow keyword 'begin'",
                tok.begin_line,
                tok.begin_col,
            )),
        }
    }

    fn finish(self, expected_name: Option<&str>) -> Result<ProgramUnit, StructuralError> {
        if self.prog_name.is_empty() {
            return Err(StructuralError::new("missing 'prog' program declaration"));
        }
        if !self.begin_seen {
            return Err(StructuralError::new("missing 'begin' program block"));
        }
        if self.state != State::Closed || self.braces.depth != 0 {
            return Err(StructuralError::new(
                "unbalanced braces: the program is never closed",
            ));
        }
        if let Some(expected) = expected_name {
            if expected != self.prog_name {
                return Err(StructuralError::new(format!(
                    "program name mismatch: 'prog {}' does not match source file name '{}'",
                    self.prog_name, expected
                )));
            }
        }

        // Render line by line; untouched lines become a single blank
        // so generated line numbers equal source line numbers.
        let mut source = String::new();
        for pos in 1..=self.last_line {
            match self.lines.get(&pos) {
                Some(text) => source.push_str(text),
                None => source.push(' '),
            }
            source.push('\n');
        }

        Ok(ProgramUnit {
            name: self.prog_name,
            package: self.pack_name,
            source,
        })
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.next_token()?;
        self.last_line = self.last_line.max(tok.begin_line);
        Some(tok)
    }

    fn push(&mut self, line: u32, text: &str) {
        let buffer = self.lines.entry(line).or_default();
        if !buffer.is_empty() {
            buffer.push(' ');
        }
        buffer.push_str(text);
    }
}

fn check_ident_prefix(tok: &Token) -> Result<(), StructuralError> {
    match tok.image.chars().next() {
        Some(prefix @ ('_' | '$')) => Err(StructuralError::at(
            format!(
                "identifier '{}' begins with illegal character '{}'; ZeptoN identifiers must begin with a letter",
                tok.image, prefix
            ),
            tok.begin_line,
            tok.begin_col,
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::normalize::normalize;

    const SUPPORT_MARKER: &str = "public static final void _$start";

    fn transpile(source: &str, expected_name: Option<&str>) -> Result<ProgramUnit, StructuralError> {
        let normalized = normalize(source).expect("normalize");
        rewrite(lex(&normalized).into_iter(), expected_name)
    }

    fn unit(source: &str) -> ProgramUnit {
        transpile(source, None).expect("transpile")
    }

    #[test]
    fn rewrites_minimal_program() {
        let unit = unit(r#"prog Hello { begin { println("Hi"); } }"#);
        assert_eq!(unit.name, "Hello");
        assert_eq!(unit.package, None);
        assert!(unit.source.contains("public final class Hello"));
        assert!(unit.source.contains("public Hello(){ ; }"));
        assert!(
            unit.source
                .contains("public static final void main(String[] _$args)")
        );
        assert_eq!(unit.source.matches(SUPPORT_MARKER).count(), 1);
    }

    #[test]
    fn carries_package_clause_through() {
        let unit = unit("package com.example;\nprog Hello {\nbegin { }\n}");
        assert_eq!(unit.package.as_deref(), Some("com.example"));
        assert_eq!(unit.qualified_name(), "com.example.Hello");
        let first_line = unit.source.lines().next().expect("first line");
        assert!(first_line.contains("package com . example ;"));
        assert!(first_line.contains("import java.io.*;"));
        // Preamble is emitted exactly once.
        assert_eq!(unit.source.matches("import java.io.*;").count(), 1);
    }

    #[test]
    fn preserves_source_line_numbers() {
        let source = "prog Hello {\n\n\nint value = 42;\nbegin {\nprintln(value);\n}\n}";
        let unit = unit(source);
        let lines: Vec<&str> = unit.source.lines().collect();
        assert!(lines.len() >= source.lines().count());
        assert!(lines[3].contains("int value = 42 ;"));
        assert!(lines[5].contains("println ( value ) ;"));
        // Untouched source lines render as placeholder blanks.
        assert_eq!(lines[1], " ");
        assert_eq!(lines[2], " ");
    }

    #[test]
    fn transpiles_identically_twice() {
        let source = "prog Twice {\nbegin {\nprintln(1);\n}\n}";
        let first = transpile(source, None).expect("first");
        let second = transpile(source, None).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn braces_in_literals_and_comments_do_not_unbalance() {
        let source = concat!(
            "prog Braces {\n",
            "/* stray } closers { here } */\n",
            "begin {\n",
            "String s = \"}}}{{{\";\n",
            "char c = '{'; // and } more\n",
            "}\n",
            "}"
        );
        let unit = unit(source);
        assert_eq!(unit.source.matches(SUPPORT_MARKER).count(), 1);
        assert!(unit.source.trim_end().ends_with('}'));
    }

    #[test]
    fn rejects_missing_prog() {
        let err = transpile("package p;\nint x;", None).unwrap_err();
        assert!(err.message.contains("missing 'prog'"));
    }

    #[test]
    fn rejects_missing_begin() {
        let err = transpile("prog Hello { }", None).unwrap_err();
        assert!(err.message.contains("missing 'begin'"));
    }

    #[test]
    fn rejects_file_name_mismatch() {
        let source = r#"prog Hello { begin { println("Hi"); } }"#;
        let err = transpile(source, Some("Wrong")).unwrap_err();
        assert!(err.message.contains("name mismatch"));
        assert!(err.message.contains("Wrong"));
    }

    #[test]
    fn accepts_matching_file_name() {
        let source = r#"prog Hello { begin { println("Hi"); } }"#;
        let unit = transpile(source, Some("Hello")).expect("transpile");
        assert_eq!(unit.name, "Hello");
    }

    #[test]
    fn rejects_me_outside_program_block() {
        let err = transpile("prog Hello {\nme;\nbegin { }\n}", None).unwrap_err();
        assert!(err.message.contains("'me'"));
        assert_eq!(err.line, Some(2));
        assert_eq!(err.column, Some(1));
    }

    #[test]
    fn rewrites_me_and_main_inside_program_block() {
        let unit = unit("prog Hello {\nbegin {\nme.main();\n}\n}");
        let body = unit.source.lines().nth(2).expect("body line");
        assert!(body.contains("_$me . _$main ( ) ;"));
    }

    #[test]
    fn rejects_reserved_identifier_prefix() {
        let err = transpile("prog Hello { begin { int _x = 1; } }", None).unwrap_err();
        assert!(err.message.contains("'_x'"));

        let err = transpile("prog Hello { begin { int $cash = 1; } }", None).unwrap_err();
        assert!(err.message.contains("'$cash'"));
    }

    #[test]
    fn rejects_begin_without_opening_brace() {
        let err = transpile("prog Hello { begin println(); }", None).unwrap_err();
        assert!(err.message.contains("must follow keyword 'begin'"));
    }

    #[test]
    fn rejects_begin_before_prog() {
        let err = transpile("begin { }\nprog Hello { }", None).unwrap_err();
        assert!(err.message.contains("before 'prog'"));
    }

    #[test]
    fn rejects_unbalanced_braces() {
        let err = transpile("prog Hello { begin { println(); }", None).unwrap_err();
        assert!(err.message.contains("unbalanced braces"));
    }

    #[test]
    fn empty_unit_sentinel_is_empty() {
        let sentinel = ProgramUnit::empty();
        assert!(sentinel.is_empty());
        assert!(!unit("prog Hello { begin { } }").is_empty());
    }
}
