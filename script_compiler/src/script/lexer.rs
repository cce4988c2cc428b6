//! Script lexer
//!
//! Splits script text into words, quoted strings, braces, colons,
//! `$variables` and line breaks. `//` and `/* */` comments are dropped.

use super::error::{ScriptError, ScriptResult};
use crate::utils::Position;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Word,
    /// Quoted string; the token text holds the unescaped contents
    Quote,
    LBrace,
    RBrace,
    Colon,
    /// `$name`; the token text keeps the `$`
    Variable,
    Newline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptToken {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    pub position: Position,
}

impl ScriptToken {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            line: position.line,
            position,
        }
    }

    pub fn is_word(&self, text: &str) -> bool {
        self.kind == TokenKind::Word && self.text == text
    }

    /// Words, quotes and variables can all stand as values
    pub fn is_value(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Word | TokenKind::Quote | TokenKind::Variable
        )
    }

    /// Text as it would be written in a script, quotes re-escaped
    pub fn to_source(&self) -> String {
        match self.kind {
            TokenKind::Quote => format!(
                "\"{}\"",
                self.text.replace('\\', "\\\\").replace('"', "\\\"")
            ),
            _ => self.text.clone(),
        }
    }
}

pub struct ScriptLexer<'a> {
    source: &'a str,
    file: &'a str,
    pos: Position,
}

impl<'a> ScriptLexer<'a> {
    pub fn new(source: &'a str, file: &'a str) -> Self {
        Self {
            source,
            file,
            pos: Position::start(),
        }
    }

    /// Tokenize `source`; `file` is only used in error messages
    pub fn tokenize(source: &str, file: &str) -> ScriptResult<Vec<ScriptToken>> {
        ScriptLexer::new(source, file).run()
    }

    fn run(mut self) -> ScriptResult<Vec<ScriptToken>> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek() {
            let start = self.pos;
            match ch {
                '\n' => {
                    self.bump();
                    tokens.push(ScriptToken::new(TokenKind::Newline, "\n", start));
                }
                c if c.is_whitespace() => {
                    self.bump();
                }
                '/' if self.peek_second() == Some('/') => self.skip_line_comment(),
                '/' if self.peek_second() == Some('*') => self.skip_block_comment(start)?,
                '{' => {
                    self.bump();
                    tokens.push(ScriptToken::new(TokenKind::LBrace, "{", start));
                }
                '}' => {
                    self.bump();
                    tokens.push(ScriptToken::new(TokenKind::RBrace, "}", start));
                }
                ':' => {
                    self.bump();
                    tokens.push(ScriptToken::new(TokenKind::Colon, ":", start));
                }
                '"' => {
                    let text = self.read_quote(start)?;
                    tokens.push(ScriptToken::new(TokenKind::Quote, text, start));
                }
                '$' => {
                    self.bump();
                    let name = self.read_word();
                    if name.is_empty() {
                        return Err(ScriptError::InvalidVariable {
                            file: self.file.to_string(),
                            line: start.line,
                        });
                    }
                    tokens.push(ScriptToken::new(
                        TokenKind::Variable,
                        format!("${}", name),
                        start,
                    ));
                }
                _ => {
                    let word = self.read_word();
                    tokens.push(ScriptToken::new(TokenKind::Word, word, start));
                }
            }
        }

        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos.offset..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.source[self.pos.offset..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos = self.pos.advance(ch);
        Some(ch)
    }

    fn at_comment_start(&self) -> bool {
        let rest = &self.source[self.pos.offset..];
        rest.starts_with("//") || rest.starts_with("/*")
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn skip_block_comment(&mut self, start: Position) -> ScriptResult<()> {
        self.bump();
        self.bump();
        loop {
            if self.source[self.pos.offset..].starts_with("*/") {
                self.bump();
                self.bump();
                return Ok(());
            }
            if self.bump().is_none() {
                return Err(ScriptError::UnterminatedComment {
                    file: self.file.to_string(),
                    line: start.line,
                });
            }
        }
    }

    /// Contents of a quoted string. `\"` and `\\` are unescaped; any other
    /// backslash is kept as written.
    fn read_quote(&mut self, start: Position) -> ScriptResult<String> {
        self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(ScriptError::UnterminatedQuote {
                        file: self.file.to_string(),
                        line: start.line,
                    })
                }
                Some('"') => return Ok(text),
                Some('\\') if matches!(self.peek(), Some('"') | Some('\\')) => {
                    if let Some(escaped) = self.bump() {
                        text.push(escaped);
                    }
                }
                Some(ch) => text.push(ch),
            }
        }
    }

    fn read_word(&mut self) -> String {
        let begin = self.pos.offset;
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || matches!(ch, '{' | '}' | '"') || self.at_comment_start() {
                break;
            }
            self.bump();
        }
        self.source[begin..self.pos.offset].to_string()
    }
}
