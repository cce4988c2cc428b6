//! Script parser producing the concrete tree
//!
//! The concrete tree keeps statements as raw token lists. Deciding what a
//! statement means (object, property, inheritance list) is left to the AST
//! builder.

use super::error::{ScriptError, ScriptResult};
use super::lexer::{ScriptToken, TokenKind};
use crate::config::compile_time::parser::{MAX_NESTING_DEPTH, MAX_TOKENS_PER_STATEMENT};

#[derive(Debug, Clone, PartialEq)]
pub enum ConcreteNode {
    /// `import <target> from <source>`
    Import {
        target: String,
        source: String,
        line: u32,
    },
    /// `set $name <values..>`
    VariableAssign {
        name: String,
        values: Vec<ScriptToken>,
        line: u32,
    },
    /// Header tokens up to the line end, plus an optional `{ }` block
    Statement {
        header: Vec<ScriptToken>,
        block: Option<Vec<ConcreteNode>>,
        line: u32,
    },
}

impl ConcreteNode {
    pub fn line(&self) -> u32 {
        match self {
            Self::Import { line, .. }
            | Self::VariableAssign { line, .. }
            | Self::Statement { line, .. } => *line,
        }
    }
}

pub struct ScriptParser<'t> {
    tokens: &'t [ScriptToken],
    pos: usize,
    file: &'t str,
}

impl<'t> ScriptParser<'t> {
    pub fn new(tokens: &'t [ScriptToken], file: &'t str) -> Self {
        Self {
            tokens,
            pos: 0,
            file,
        }
    }

    /// Parse a whole script
    pub fn parse(tokens: &[ScriptToken], file: &str) -> ScriptResult<Vec<ConcreteNode>> {
        ScriptParser::new(tokens, file).parse_block(0, None)
    }

    /// Parse a flat run of values, as used for variable contents. Line
    /// breaks are ignored.
    pub fn parse_chunk(tokens: &[ScriptToken], file: &str) -> ScriptResult<Vec<ScriptToken>> {
        let mut values = Vec::with_capacity(tokens.len());
        for token in tokens {
            match token.kind {
                TokenKind::Newline => {}
                _ if token.is_value() => values.push(token.clone()),
                _ => {
                    return Err(ScriptError::UnexpectedSymbol {
                        file: file.to_string(),
                        line: token.line,
                        symbol: token.text.clone(),
                    })
                }
            }
        }
        Ok(values)
    }

    fn peek(&self) -> Option<&'t ScriptToken> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'t ScriptToken> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn skip_newlines(&mut self) {
        while self.peek().is_some_and(|t| t.kind == TokenKind::Newline) {
            self.pos += 1;
        }
    }

    fn last_line(&self) -> u32 {
        self.tokens.last().map_or(1, |t| t.line)
    }

    fn parse_block(
        &mut self,
        depth: usize,
        opened_at: Option<u32>,
    ) -> ScriptResult<Vec<ConcreteNode>> {
        let mut nodes = Vec::new();

        loop {
            self.skip_newlines();
            let Some(token) = self.peek() else {
                return match opened_at {
                    Some(line) => Err(ScriptError::UnbalancedBrace {
                        file: self.file.to_string(),
                        line,
                    }),
                    None => Ok(nodes),
                };
            };

            match token.kind {
                TokenKind::RBrace => {
                    if opened_at.is_none() {
                        return Err(ScriptError::UnbalancedBrace {
                            file: self.file.to_string(),
                            line: token.line,
                        });
                    }
                    self.pos += 1;
                    return Ok(nodes);
                }
                TokenKind::LBrace => {
                    return Err(ScriptError::UnexpectedSymbol {
                        file: self.file.to_string(),
                        line: token.line,
                        symbol: token.text.clone(),
                    })
                }
                _ if token.is_word("import") => nodes.push(self.parse_import(depth)?),
                _ if token.is_word("set") => nodes.push(self.parse_set()?),
                _ => nodes.push(self.parse_statement(depth)?),
            }
        }
    }

    fn parse_import(&mut self, depth: usize) -> ScriptResult<ConcreteNode> {
        let line = self.next().map_or(1, |t| t.line);
        let file = self.file;
        let invalid = |message: &str| ScriptError::InvalidImport {
            file: file.to_string(),
            line,
            message: message.to_string(),
        };

        if depth > 0 {
            return Err(invalid("imports are only allowed at the top level"));
        }

        let target = match self.next() {
            Some(t) if matches!(t.kind, TokenKind::Word | TokenKind::Quote) => t.text.clone(),
            _ => return Err(invalid("expected an object name or '*'")),
        };

        match self.next() {
            Some(t) if t.is_word("from") => {}
            _ => return Err(invalid("expected 'from'")),
        }

        let source = match self.next() {
            Some(t) if matches!(t.kind, TokenKind::Word | TokenKind::Quote) => t.text.clone(),
            _ => return Err(invalid("expected a script name")),
        };

        match self.peek() {
            None => {}
            Some(t) if t.kind == TokenKind::Newline => {}
            Some(_) => return Err(invalid("unexpected token after the script name")),
        }

        Ok(ConcreteNode::Import {
            target,
            source,
            line,
        })
    }

    fn parse_set(&mut self) -> ScriptResult<ConcreteNode> {
        let line = self.next().map_or(1, |t| t.line);

        let name = match self.next() {
            Some(t) if t.kind == TokenKind::Variable => t.text.clone(),
            _ => {
                return Err(ScriptError::InvalidVariableAssignment {
                    file: self.file.to_string(),
                    line,
                })
            }
        };

        let mut values = Vec::new();
        while let Some(token) = self.peek() {
            if !token.is_value() {
                break;
            }
            values.push(token.clone());
            self.pos += 1;
        }

        if values.is_empty() {
            return Err(ScriptError::InvalidVariableAssignment {
                file: self.file.to_string(),
                line,
            });
        }

        Ok(ConcreteNode::VariableAssign { name, values, line })
    }

    fn parse_statement(&mut self, depth: usize) -> ScriptResult<ConcreteNode> {
        let line = self.peek().map_or_else(|| self.last_line(), |t| t.line);
        let mut header = Vec::new();

        while let Some(token) = self.peek() {
            if matches!(
                token.kind,
                TokenKind::Newline | TokenKind::LBrace | TokenKind::RBrace
            ) {
                break;
            }
            if header.len() >= MAX_TOKENS_PER_STATEMENT {
                return Err(ScriptError::StatementTooLong {
                    file: self.file.to_string(),
                    line,
                });
            }
            header.push(token.clone());
            self.pos += 1;
        }

        // the opening brace may sit on a following line
        let resume = self.pos;
        self.skip_newlines();
        let block = match self.peek() {
            Some(token) if token.kind == TokenKind::LBrace => {
                if depth + 1 > MAX_NESTING_DEPTH {
                    return Err(ScriptError::NestingTooDeep {
                        file: self.file.to_string(),
                        line: token.line,
                    });
                }
                self.pos += 1;
                Some(self.parse_block(depth + 1, Some(token.line))?)
            }
            _ => {
                self.pos = resume;
                None
            }
        };

        Ok(ConcreteNode::Statement {
            header,
            block,
            line,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::lexer::ScriptLexer;
    use assert_matches::assert_matches;

    fn parse(source: &str) -> ScriptResult<Vec<ConcreteNode>> {
        let tokens = ScriptLexer::tokenize(source, "test.compositor")?;
        ScriptParser::parse(&tokens, "test.compositor")
    }

    fn header_text(node: &ConcreteNode) -> Vec<&str> {
        match node {
            ConcreteNode::Statement { header, .. } => {
                header.iter().map(|t| t.text.as_str()).collect()
            }
            other => panic!("expected a statement, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_blocks() {
        let nodes =
            parse("compositor MyComp { technique { target_output { pass render_scene { } } } }")
                .unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(header_text(&nodes[0]), vec!["compositor", "MyComp"]);

        let ConcreteNode::Statement { block: Some(technique), .. } = &nodes[0] else {
            panic!("compositor has no block");
        };
        assert_eq!(header_text(&technique[0]), vec!["technique"]);
    }

    #[test]
    fn test_brace_on_next_line_and_properties() {
        let nodes = parse("material Red\n{\n  receive_shadows off\n  technique\n  {\n  }\n}\n").unwrap();
        let ConcreteNode::Statement { block: Some(children), .. } = &nodes[0] else {
            panic!("material has no block");
        };
        assert_eq!(children.len(), 2);
        assert_matches!(&children[0], ConcreteNode::Statement { block: None, line: 3, .. });
        assert_matches!(&children[1], ConcreteNode::Statement { block: Some(_), line: 4, .. });
    }

    #[test]
    fn test_property_before_closing_brace() {
        let nodes = parse("pass { depth_check on }").unwrap();
        let ConcreteNode::Statement { block: Some(children), .. } = &nodes[0] else {
            panic!("pass has no block");
        };
        assert_eq!(header_text(&children[0]), vec!["depth_check", "on"]);
    }

    #[test]
    fn test_import_and_set() {
        let nodes = parse("import * from \"base.material\"\nset $colour 1 0 0").unwrap();
        assert_matches!(&nodes[0], ConcreteNode::Import { target, source, line: 1 }
            if target == "*" && source == "base.material");
        assert_matches!(&nodes[1], ConcreteNode::VariableAssign { name, values, line: 2 }
            if name == "$colour" && values.len() == 3);
    }

    #[test]
    fn test_unbalanced_braces() {
        assert_matches!(parse("a {\n b {\n}"), Err(ScriptError::UnbalancedBrace { line: 1, .. }));
        assert_matches!(parse("a }"), Err(ScriptError::UnbalancedBrace { line: 1, .. }));
        assert_matches!(parse("{ }"), Err(ScriptError::UnexpectedSymbol { .. }));
    }

    #[test]
    fn test_invalid_import_and_set() {
        assert_matches!(parse("import * base.material"), Err(ScriptError::InvalidImport { .. }));
        assert_matches!(parse("import Foo from"), Err(ScriptError::InvalidImport { .. }));
        assert_matches!(parse("a { import * from x }"), Err(ScriptError::InvalidImport { .. }));
        assert_matches!(parse("set colour 1"), Err(ScriptError::InvalidVariableAssignment { .. }));
        assert_matches!(parse("set $colour\n"), Err(ScriptError::InvalidVariableAssignment { .. }));
    }

    #[test]
    fn test_nesting_limit() {
        let deep = "a {".repeat(MAX_NESTING_DEPTH + 1) + &"}".repeat(MAX_NESTING_DEPTH + 1);
        assert_matches!(parse(&deep), Err(ScriptError::NestingTooDeep { .. }));

        let fine = "a {".repeat(MAX_NESTING_DEPTH) + &"}".repeat(MAX_NESTING_DEPTH);
        assert!(parse(&fine).is_ok());
    }

    #[test]
    fn test_parse_chunk() {
        let tokens = ScriptLexer::tokenize("1 \"two\"\n$three", "t").unwrap();
        let values = ScriptParser::parse_chunk(&tokens, "t").unwrap();
        assert_eq!(values.len(), 3);

        let tokens = ScriptLexer::tokenize("1 { 2 }", "t").unwrap();
        assert_matches!(
            ScriptParser::parse_chunk(&tokens, "t"),
            Err(ScriptError::UnexpectedSymbol { .. })
        );
    }
}
