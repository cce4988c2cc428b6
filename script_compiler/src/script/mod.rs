//! Script text to concrete tree

pub mod error;
pub mod lexer;
pub mod parser;

pub use error::{ScriptError, ScriptResult};
pub use lexer::{ScriptLexer, ScriptToken, TokenKind};
pub use parser::{ConcreteNode, ScriptParser};

use crate::{log_debug, log_error};

/// Lex and parse a whole script
pub fn parse_script(source: &str, file: &str) -> ScriptResult<Vec<ConcreteNode>> {
    let result = ScriptLexer::tokenize(source, file).and_then(|tokens| {
        log_debug!("Script lexed", "file" => file, "tokens" => tokens.len());
        ScriptParser::parse(&tokens, file)
    });

    match &result {
        Ok(nodes) => log_debug!("Script parsed", "file" => file, "statements" => nodes.len()),
        Err(error) => log_error!(error.error_code(), &error.to_string(),
            "file" => error.file(),
            "line" => error.line()
        ),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::codes;

    #[test]
    fn test_parse_script_reports_lexer_errors() {
        let error = parse_script("material \"open", "bad.material").unwrap_err();
        assert_eq!(error.error_code(), codes::lexer::UNTERMINATED_QUOTE);
        assert_eq!(error.file(), "bad.material");
    }

    #[test]
    fn test_parse_script_ok() {
        let nodes = parse_script("particle_system Smoke { quota 10 }", "smoke.particle").unwrap();
        assert_eq!(nodes.len(), 1);
    }
}
