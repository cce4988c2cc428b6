//! Pass 1 rule-path engine and the pass 2 hook

use super::error::{Compiler2PassError, Compiler2PassResult};
use super::grammar::Grammar;
use super::scanner::ScanState;
use super::types::{Operation, Symbol, TokenInstruction, ALL_CONTEXTS};
use crate::config::compile_time::tokenizer::{MAX_CONSTANT_COUNT, MAX_RULE_DEPTH, MAX_TOKEN_COUNT};
use crate::config::runtime::TokenizerPreferences;
use crate::logging::codes;
use crate::{log_debug, log_error, log_success};
use serde::Serialize;
use std::time::Instant;

/// Token list and constants produced by a successful pass 1
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Pass1Output {
    pub tokens: Vec<TokenInstruction>,
    pub constants: Vec<f32>,
    /// Active contexts after the last accepted token
    pub active_contexts: u32,
    pub line_count: u32,
}

/// Consumer of a pass 1 token list. Pass 2 semantics belong to the grammar
/// owner.
pub trait Pass2 {
    type Output;

    fn do_pass2(
        &mut self,
        grammar: &Grammar,
        pass1: &Pass1Output,
    ) -> Compiler2PassResult<Self::Output>;
}

/// Table-driven recursive-descent tokenizer.
///
/// Every run starts from the configured active contexts; terminal symbols
/// then switch context bits on and off as they are accepted.
#[derive(Debug, Clone)]
pub struct Compiler2Pass<'g> {
    grammar: &'g Grammar,
    active_contexts: u32,
    max_depth: usize,
    trace: bool,
}

impl<'g> Compiler2Pass<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self::with_preferences(grammar, TokenizerPreferences::default())
    }

    pub fn with_preferences(grammar: &'g Grammar, preferences: TokenizerPreferences) -> Self {
        Self {
            grammar,
            active_contexts: ALL_CONTEXTS,
            max_depth: MAX_RULE_DEPTH,
            trace: preferences.trace_rule_paths,
        }
    }

    /// Lower the rule nesting limit. Values above the build limit are capped.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.min(MAX_RULE_DEPTH);
        self
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn active_contexts(&self) -> u32 {
        self.active_contexts
    }

    pub fn set_active_contexts(&mut self, contexts: u32) {
        self.active_contexts = contexts;
    }

    /// Run pass 1 then hand the tokens to `pass2`
    pub fn compile<P: Pass2>(
        &self,
        source: &str,
        pass2: &mut P,
    ) -> Compiler2PassResult<P::Output> {
        let pass1 = self.do_pass1(source)?;

        match pass2.do_pass2(self.grammar, &pass1) {
            Ok(output) => {
                log_success!(codes::success::PASS2_COMPLETE, "Pass 2 completed",
                    "tokens" => pass1.tokens.len()
                );
                Ok(output)
            }
            Err(error) => {
                log_error!(error.error_code(), &error.to_string());
                Err(error)
            }
        }
    }

    /// Tokenize `source` against the root rule path.
    ///
    /// Fails when the root path does not match or when anything but
    /// whitespace and comments is left afterwards.
    pub fn do_pass1(&self, source: &str) -> Compiler2PassResult<Pass1Output> {
        let start_time = Instant::now();
        let mut scan = ScanState::new(source, self.active_contexts);

        let passed = match self.process_rule_path(&mut scan, 0) {
            Ok(passed) => passed,
            Err(error) => return Err(Self::report(error)),
        };

        if !passed {
            let (char_pos, line) = scan.furthest();
            return Err(Self::report(Compiler2PassError::Pass1Failed { line, char_pos }));
        }

        if scan.position_to_next_symbol() {
            return Err(Self::report(Compiler2PassError::TrailingInput {
                line: scan.line,
                char_pos: scan.char_pos,
            }));
        }

        log_success!(codes::success::TOKENIZATION_COMPLETE, "Rule-path tokenization completed",
            "tokens" => scan.tokens.len(),
            "constants" => scan.constants.len(),
            "lines" => scan.line,
            "duration_ms" => start_time.elapsed().as_millis()
        );

        Ok(Pass1Output {
            tokens: scan.tokens,
            constants: scan.constants,
            active_contexts: scan.active_contexts,
            line_count: scan.line,
        })
    }

    fn report(error: Compiler2PassError) -> Compiler2PassError {
        log_error!(error.error_code(), &error.to_string());
        error
    }

    /// Try the rule path starting at `rule_index`.
    ///
    /// On failure every token, constant and cursor move made inside the path
    /// is undone.
    pub fn process_rule_path(
        &self,
        scan: &mut ScanState<'_>,
        rule_index: usize,
    ) -> Compiler2PassResult<bool> {
        if scan.depth >= self.max_depth {
            return Err(Compiler2PassError::RecursionLimit {
                max_depth: self.max_depth,
                line: scan.line,
            });
        }

        scan.depth += 1;
        let result = self.walk_rule_path(scan, rule_index);
        scan.depth -= 1;
        result
    }

    fn walk_rule_path(&self, scan: &mut ScanState<'_>, rule_index: usize) -> Compiler2PassResult<bool> {
        let head = self.grammar.rule(rule_index).ok_or_else(|| {
            Compiler2PassError::invalid_grammar(format!("no rule path at step {}", rule_index))
        })?;
        let active_ntt = head.token_id;
        let snapshot = scan.snapshot();

        if self.trace {
            log_debug!("Entering rule path",
                "rule" => head.text.unwrap_or("?"),
                "step" => rule_index,
                "char_pos" => scan.char_pos
            );
        }

        let mut passed = true;
        let mut index = rule_index + 1;

        while let Some(step) = self.grammar.rule(index) {
            match step.operation {
                Operation::And => {
                    if passed {
                        passed = self.validate_token(scan, index, active_ntt)?;
                    }
                }
                Operation::Or => {
                    if passed {
                        break;
                    }
                    scan.restore(&snapshot);
                    passed = self.validate_token(scan, index, active_ntt)?;
                }
                Operation::Optional => {
                    if passed {
                        self.validate_token(scan, index, active_ntt)?;
                    }
                }
                Operation::Repeat => {
                    if passed {
                        let mut count = 0usize;
                        loop {
                            let before = scan.char_pos;
                            if !self.validate_token(scan, index, active_ntt)? {
                                break;
                            }
                            count += 1;
                            // an empty match would repeat forever
                            if scan.char_pos == before {
                                break;
                            }
                        }
                        passed = count > 0;
                    }
                }
                Operation::End => break,
                Operation::Rule => {
                    passed = false;
                    break;
                }
            }
            index += 1;
        }

        if !passed {
            scan.restore(&snapshot);
        }

        if self.trace {
            log_debug!("Leaving rule path",
                "rule" => head.text.unwrap_or("?"),
                "passed" => passed,
                "char_pos" => scan.char_pos
            );
        }

        Ok(passed)
    }

    /// Match the symbol of the step at `rule_index`.
    ///
    /// Non-terminals recurse into their rule path. Terminals are matched as a
    /// numeric literal when they are the value symbol, otherwise by the step's
    /// text or the symbol's default text. A symbol whose context key shares
    /// no bit with the active contexts fails without touching the cursor.
    pub fn validate_token(
        &self,
        scan: &mut ScanState<'_>,
        rule_index: usize,
        active_ntt: Symbol,
    ) -> Compiler2PassResult<bool> {
        let Some(step) = self.grammar.rule(rule_index) else {
            return Ok(false);
        };
        let token_id = step.token_id;
        let Some(symbol) = self.grammar.symbol(token_id) else {
            return Ok(false);
        };

        if symbol.context_key & scan.active_contexts == 0 {
            return Ok(false);
        }

        if !symbol.is_terminal() {
            return self.process_rule_path(scan, symbol.rule_index);
        }

        let found = scan.position_to_next_symbol();
        scan.note_attempt();
        if !found {
            return Ok(false);
        }

        let length = if token_id == self.grammar.value_id() {
            let Some((value, length)) = scan.is_float_value() else {
                return Ok(false);
            };
            if scan.constants.len() >= MAX_CONSTANT_COUNT {
                return Err(Compiler2PassError::TooManyConstants);
            }
            scan.constants.push(value);
            length
        } else {
            let Some(text) = step.text.or_else(|| self.grammar.type_def_text(token_id)) else {
                return Ok(false);
            };
            if !scan.is_symbol(text) {
                return Ok(false);
            }
            text.len()
        };

        if scan.tokens.len() >= MAX_TOKEN_COUNT {
            return Err(Compiler2PassError::TooManyTokens);
        }

        scan.tokens.push(TokenInstruction {
            id: token_id,
            ntt_rule_id: active_ntt,
            line: scan.line,
            char_pos: scan.char_pos,
        });
        scan.char_pos += length;
        scan.active_contexts &= !symbol.context_pattern_clear;
        scan.active_contexts |= symbol.context_pattern_set;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler2pass::types::{SymbolDef, TokenRule};
    use assert_matches::assert_matches;

    const ROOT: Symbol = 0;
    const WORD: Symbol = 1;
    const VALUE: Symbol = 2;
    const PAIR: Symbol = 3;
    const BEGIN: Symbol = 4;

    fn symbols() -> Vec<SymbolDef> {
        vec![
            SymbolDef::new(ROOT),
            SymbolDef::new(WORD),
            SymbolDef::new(VALUE),
            SymbolDef::new(PAIR),
            SymbolDef::with_contexts(BEGIN, 0x1, 0x2, 0x1),
        ]
    }

    fn grammar(rules: Vec<TokenRule>) -> Grammar {
        Grammar::new(rules, symbols(), VALUE).unwrap()
    }

    #[test]
    fn test_identifier_value_identifier() {
        let grammar = grammar(vec![
            TokenRule::rule(ROOT, "root"),
            TokenRule::and_text(WORD, "identifier"),
            TokenRule::and(VALUE),
            TokenRule::and_text(WORD, "otherIdentifier"),
            TokenRule::end(),
        ]);

        let output = Compiler2Pass::new(&grammar)
            .do_pass1("identifier 3.14 otherIdentifier")
            .unwrap();

        let ids: Vec<Symbol> = output.tokens.iter().map(|t| t.id).collect();
        let positions: Vec<usize> = output.tokens.iter().map(|t| t.char_pos).collect();
        assert_eq!(ids, vec![WORD, VALUE, WORD]);
        assert_eq!(positions, vec![0, 11, 16]);
        assert!(output.tokens.iter().all(|t| t.ntt_rule_id == ROOT));
        assert_eq!(output.constants, vec![3.14]);
    }

    #[test]
    fn test_context_gate_blocks_without_advancing() {
        let mut table = symbols();
        table[WORD as usize].context_key = 0x2;
        let grammar = Grammar::new(
            vec![
                TokenRule::rule(ROOT, "root"),
                TokenRule::and_text(WORD, "identifier"),
                TokenRule::end(),
            ],
            table,
            VALUE,
        )
        .unwrap();
        let compiler = Compiler2Pass::new(&grammar);

        let mut scan = ScanState::new("  identifier", 0x1);
        assert!(!compiler.validate_token(&mut scan, 1, ROOT).unwrap());
        assert_eq!(scan.char_pos, 0);
        assert!(scan.tokens.is_empty());

        let mut scan = ScanState::new("  identifier", 0x2);
        assert!(compiler.validate_token(&mut scan, 1, ROOT).unwrap());
        assert_eq!(scan.char_pos, 12);
    }

    #[test]
    fn test_accepted_symbol_switches_contexts() {
        let grammar = grammar(vec![
            TokenRule::rule(ROOT, "root"),
            TokenRule::and_text(BEGIN, "begin"),
            TokenRule::end(),
        ]);
        let mut compiler = Compiler2Pass::new(&grammar);
        compiler.set_active_contexts(0x1);

        let output = compiler.do_pass1("begin").unwrap();
        assert_eq!(output.active_contexts, 0x2);
        assert_eq!(compiler.active_contexts(), 0x1);
        assert_matches!(
            compiler.do_pass1("begin begin"),
            Err(Compiler2PassError::TrailingInput { char_pos: 6, .. })
        );
    }

    #[test]
    fn test_comment_before_first_token() {
        let grammar = grammar(vec![
            TokenRule::rule(ROOT, "root"),
            TokenRule::and_text(WORD, "foo"),
            TokenRule::end(),
        ]);
        let output = Compiler2Pass::new(&grammar).do_pass1("// comment\nfoo").unwrap();
        assert_eq!(output.tokens.len(), 1);
        assert_eq!(output.tokens[0].line, 2);
        assert_eq!(output.tokens[0].char_pos, 11);
    }

    fn pair_grammar() -> Grammar {
        grammar(vec![
            TokenRule::rule(ROOT, "root"),
            TokenRule::and(PAIR),
            TokenRule::or_text(WORD, "b"),
            TokenRule::end(),
            TokenRule::rule(PAIR, "pair"),
            TokenRule::and_text(WORD, "a"),
            TokenRule::and(VALUE),
            TokenRule::end(),
        ])
    }

    #[test]
    fn test_failed_rule_path_restores_snapshot() {
        let grammar = pair_grammar();
        let compiler = Compiler2Pass::new(&grammar);
        let mut scan = ScanState::new("a\n b", ALL_CONTEXTS);

        assert!(!compiler.process_rule_path(&mut scan, 4).unwrap());
        assert!(scan.tokens.is_empty());
        assert!(scan.constants.is_empty());
        assert_eq!(scan.char_pos, 0);
        assert_eq!(scan.line, 1);
        assert_eq!(scan.furthest(), (3, 2));
    }

    #[test]
    fn test_or_alternative_after_partial_match() {
        let grammar = pair_grammar();
        let output = Compiler2Pass::new(&grammar).do_pass1("b").unwrap();
        assert_eq!(output.tokens.len(), 1);
        assert_eq!(output.tokens[0].ntt_rule_id, ROOT);
    }

    #[test]
    fn test_or_leaves_no_ghost_tokens() {
        let grammar = grammar(vec![
            TokenRule::rule(ROOT, "root"),
            TokenRule::and_text(WORD, "a"),
            TokenRule::and_text(WORD, "x"),
            TokenRule::or_text(WORD, "a"),
            TokenRule::and(VALUE),
            TokenRule::end(),
        ]);

        let output = Compiler2Pass::new(&grammar).do_pass1("a 5").unwrap();
        let ids: Vec<Symbol> = output.tokens.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![WORD, VALUE]);
        assert_eq!(output.constants, vec![5.0]);
    }

    #[test]
    fn test_repeat_needs_one_match() {
        let grammar = grammar(vec![
            TokenRule::rule(ROOT, "root"),
            TokenRule::repeat(VALUE),
            TokenRule::end(),
        ]);
        let compiler = Compiler2Pass::new(&grammar);

        assert_matches!(
            compiler.do_pass1("   "),
            Err(Compiler2PassError::Pass1Failed { line: 1, .. })
        );

        let output = compiler.do_pass1("1 2\n3").unwrap();
        assert_eq!(output.tokens.len(), 3);
        assert_eq!(output.constants, vec![1.0, 2.0, 3.0]);
        assert_eq!(output.tokens[2].line, 2);
    }

    #[test]
    fn test_trailing_input_fails() {
        let grammar = grammar(vec![
            TokenRule::rule(ROOT, "root"),
            TokenRule::repeat(VALUE),
            TokenRule::end(),
        ]);
        let error = Compiler2Pass::new(&grammar).do_pass1("1 2 x").unwrap_err();
        assert_matches!(error, Compiler2PassError::TrailingInput { line: 1, char_pos: 4 });
        assert_eq!(error.error_code(), codes::tokenizer::TRAILING_INPUT);
    }

    #[test]
    fn test_optional_does_not_fail_path() {
        let grammar = grammar(vec![
            TokenRule::rule(ROOT, "root"),
            TokenRule::and_text(WORD, "scale"),
            TokenRule::optional(VALUE),
            TokenRule::end(),
        ]);
        let compiler = Compiler2Pass::new(&grammar);
        assert_eq!(compiler.do_pass1("scale").unwrap().tokens.len(), 1);
        assert_eq!(compiler.do_pass1("scale 2").unwrap().constants, vec![2.0]);
    }

    #[test]
    fn test_repeat_of_empty_match_terminates() {
        let grammar = grammar(vec![
            TokenRule::rule(ROOT, "root"),
            TokenRule::repeat(PAIR),
            TokenRule::end(),
            TokenRule::rule(PAIR, "maybe"),
            TokenRule::optional_text(WORD, "z"),
            TokenRule::end(),
        ]);
        let output = Compiler2Pass::new(&grammar).do_pass1("").unwrap();
        assert!(output.tokens.is_empty());
    }

    #[test]
    fn test_terminal_falls_back_to_default_text() {
        let grammar = grammar(vec![
            TokenRule::rule(ROOT, "root"),
            TokenRule::and(WORD),
            TokenRule::end(),
            TokenRule::rule(PAIR, "unused"),
            TokenRule::optional_text(WORD, "word"),
            TokenRule::end(),
        ]);
        assert_eq!(Compiler2Pass::new(&grammar).do_pass1("word").unwrap().tokens.len(), 1);
    }

    #[test]
    fn test_recursion_limit() {
        let grammar = grammar(vec![
            TokenRule::rule(ROOT, "root"),
            TokenRule::and(PAIR),
            TokenRule::end(),
            TokenRule::rule(PAIR, "loop"),
            TokenRule::and(PAIR),
            TokenRule::end(),
        ]);
        let result = Compiler2Pass::new(&grammar).with_max_depth(8).do_pass1("x");
        assert_matches!(result, Err(Compiler2PassError::RecursionLimit { max_depth: 8, .. }));
    }

    struct CountTokens;

    impl Pass2 for CountTokens {
        type Output = usize;

        fn do_pass2(&mut self, _: &Grammar, pass1: &Pass1Output) -> Compiler2PassResult<usize> {
            Ok(pass1.tokens.len())
        }
    }

    #[test]
    fn test_compile_runs_pass2_only_after_pass1() {
        let grammar = grammar(vec![
            TokenRule::rule(ROOT, "root"),
            TokenRule::repeat(VALUE),
            TokenRule::end(),
        ]);
        let compiler = Compiler2Pass::new(&grammar);
        assert_eq!(compiler.compile("4 5", &mut CountTokens).unwrap(), 2);
        assert!(compiler.compile("four", &mut CountTokens).is_err());
    }
}
