//! Validated rule table plus symbol table

use super::error::{Compiler2PassError, Compiler2PassResult};
use super::types::{Operation, Symbol, SymbolDef, TokenRule};

/// Rule table, symbol table and the numeric-constant symbol.
///
/// Construction links every non-terminal symbol to its rule path and every
/// symbol that appears with literal text to the step that carries it. Rule
/// path 0 is the root.
#[derive(Debug, Clone)]
pub struct Grammar {
    rules: Vec<TokenRule>,
    symbols: Vec<SymbolDef>,
    value_id: Symbol,
}

impl Grammar {
    pub fn new(
        rules: Vec<TokenRule>,
        symbols: Vec<SymbolDef>,
        value_id: Symbol,
    ) -> Compiler2PassResult<Self> {
        let mut grammar = Self {
            rules,
            symbols,
            value_id,
        };
        grammar.validate()?;
        grammar.init_symbol_type_lib();
        Ok(grammar)
    }

    fn validate(&self) -> Compiler2PassResult<()> {
        match self.rules.first() {
            Some(rule) if rule.operation == Operation::Rule => {}
            Some(_) => {
                return Err(Compiler2PassError::invalid_grammar(
                    "rule table must start with a Rule step",
                ))
            }
            None => return Err(Compiler2PassError::invalid_grammar("rule table is empty")),
        }

        for (index, symbol) in self.symbols.iter().enumerate() {
            if symbol.id as usize != index {
                return Err(Compiler2PassError::invalid_grammar(format!(
                    "symbol at index {} has id {}",
                    index, symbol.id
                )));
            }
        }

        if self.symbol(self.value_id).is_none() {
            return Err(Compiler2PassError::invalid_grammar(format!(
                "value symbol {} is not in the symbol table",
                self.value_id
            )));
        }

        let mut open_rule: Option<usize> = None;
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.operation != Operation::End && self.symbol(rule.token_id).is_none() {
                return Err(Compiler2PassError::invalid_grammar(format!(
                    "rule step {} references unknown symbol {}",
                    index, rule.token_id
                )));
            }

            match rule.operation {
                Operation::Rule => {
                    if let Some(start) = open_rule {
                        return Err(Compiler2PassError::invalid_grammar(format!(
                            "rule path at step {} has no End",
                            start
                        )));
                    }
                    open_rule = Some(index);
                }
                Operation::End => {
                    if open_rule.take().is_none() {
                        return Err(Compiler2PassError::invalid_grammar(format!(
                            "End at step {} outside a rule path",
                            index
                        )));
                    }
                }
                _ if open_rule.is_none() => {
                    return Err(Compiler2PassError::invalid_grammar(format!(
                        "step {} outside a rule path",
                        index
                    )));
                }
                _ => {}
            }
        }

        if let Some(start) = open_rule {
            return Err(Compiler2PassError::invalid_grammar(format!(
                "rule path at step {} has no End",
                start
            )));
        }

        Ok(())
    }

    /// Link symbols to their defining rule paths and default text
    fn init_symbol_type_lib(&mut self) {
        for (index, rule) in self.rules.iter().enumerate() {
            let Some(symbol) = self.symbols.get_mut(rule.token_id as usize) else {
                continue;
            };

            match rule.operation {
                Operation::Rule => symbol.rule_index = index,
                Operation::And | Operation::Or | Operation::Optional if rule.text.is_some() => {
                    symbol.default_text_index = Some(index);
                }
                _ => {}
            }
        }
    }

    pub fn rules(&self) -> &[TokenRule] {
        &self.rules
    }

    pub fn rule(&self, index: usize) -> Option<&TokenRule> {
        self.rules.get(index)
    }

    pub fn symbols(&self) -> &[SymbolDef] {
        &self.symbols
    }

    pub fn symbol(&self, id: Symbol) -> Option<&SymbolDef> {
        self.symbols.get(id as usize)
    }

    /// Symbol whose terminals are numeric literals
    pub fn value_id(&self) -> Symbol {
        self.value_id
    }

    /// Default literal text of a symbol, if any step gives it one
    pub fn type_def_text(&self, id: Symbol) -> Option<&'static str> {
        let index = self.symbol(id)?.default_text_index?;
        self.rules.get(index)?.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const ROOT: Symbol = 0;
    const WORD: Symbol = 1;
    const VALUE: Symbol = 2;
    const PAIR: Symbol = 3;

    fn symbols() -> Vec<SymbolDef> {
        (0..4).map(SymbolDef::new).collect()
    }

    #[test]
    fn test_symbol_type_lib_links_rules_and_text() {
        let grammar = Grammar::new(
            vec![
                TokenRule::rule(ROOT, "root"),
                TokenRule::repeat(PAIR),
                TokenRule::end(),
                TokenRule::rule(PAIR, "pair"),
                TokenRule::and_text(WORD, "key"),
                TokenRule::and(VALUE),
                TokenRule::end(),
            ],
            symbols(),
            VALUE,
        )
        .unwrap();

        assert_eq!(grammar.symbol(PAIR).unwrap().rule_index, 3);
        assert!(grammar.symbol(ROOT).unwrap().is_terminal());
        assert!(grammar.symbol(WORD).unwrap().is_terminal());
        assert_eq!(grammar.type_def_text(WORD), Some("key"));
        assert_eq!(grammar.type_def_text(VALUE), None);
    }

    #[test]
    fn test_rejects_table_without_root_rule() {
        let result = Grammar::new(vec![TokenRule::and(WORD), TokenRule::end()], symbols(), VALUE);
        assert_matches!(result, Err(Compiler2PassError::InvalidGrammar { .. }));
    }

    #[test]
    fn test_rejects_unterminated_rule_path() {
        let result = Grammar::new(
            vec![TokenRule::rule(ROOT, "root"), TokenRule::and(WORD)],
            symbols(),
            VALUE,
        );
        assert_matches!(result, Err(Compiler2PassError::InvalidGrammar { reason }) if reason.contains("no End"));
    }

    #[test]
    fn test_rejects_unknown_symbol() {
        let result = Grammar::new(
            vec![TokenRule::rule(ROOT, "root"), TokenRule::and(42), TokenRule::end()],
            symbols(),
            VALUE,
        );
        assert_matches!(result, Err(Compiler2PassError::InvalidGrammar { .. }));
    }

    #[test]
    fn test_rejects_misnumbered_symbols() {
        let mut table = symbols();
        table[2].id = 7;
        let result = Grammar::new(
            vec![TokenRule::rule(ROOT, "root"), TokenRule::end()],
            table,
            VALUE,
        );
        assert_matches!(result, Err(Compiler2PassError::InvalidGrammar { .. }));
    }
}
