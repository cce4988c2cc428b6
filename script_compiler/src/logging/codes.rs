//! Error and success codes for the script compiler
//!
//! Code constants and their behavioral metadata live side by side. Every
//! `CompileErrorCode` raised by a translator has a matching `E06x` entry so the
//! global collector can classify script errors the same way it classifies I/O
//! or tokenizer failures.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for an error code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub const fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

/// File processing error codes
pub mod file_processing {
    use super::Code;

    pub const FILE_NOT_FOUND: Code = Code::new("E005");
    pub const INVALID_EXTENSION: Code = Code::new("E006");
    pub const FILE_TOO_LARGE: Code = Code::new("E007");
    pub const EMPTY_FILE: Code = Code::new("E008");
    pub const PERMISSION_DENIED: Code = Code::new("E009");
    pub const INVALID_ENCODING: Code = Code::new("E010");
    pub const IO_ERROR: Code = Code::new("E011");
    pub const INVALID_PATH: Code = Code::new("E012");
}

/// Rule-path tokenizer (pass 1 / pass 2) error codes
pub mod tokenizer {
    use super::Code;

    pub const GRAMMAR_MISMATCH: Code = Code::new("E020");
    pub const TRAILING_INPUT: Code = Code::new("E021");
    pub const RULE_DEPTH_EXCEEDED: Code = Code::new("E022");
    pub const TOO_MANY_TOKENS: Code = Code::new("E023");
    pub const INVALID_GRAMMAR: Code = Code::new("E024");
    pub const PASS2_FAILURE: Code = Code::new("E025");
}

/// Script lexer error codes
pub mod lexer {
    use super::Code;

    pub const UNTERMINATED_QUOTE: Code = Code::new("E030");
    pub const UNTERMINATED_COMMENT: Code = Code::new("E031");
    pub const INVALID_VARIABLE: Code = Code::new("E032");
}

/// Script parser error codes
pub mod parse {
    use super::Code;

    pub const UNBALANCED_BRACE: Code = Code::new("E040");
    pub const UNEXPECTED_END: Code = Code::new("E041");
    pub const INVALID_IMPORT: Code = Code::new("E042");
    pub const INVALID_VARIABLE_ASSIGNMENT: Code = Code::new("E043");
    pub const NESTING_TOO_DEEP: Code = Code::new("E044");
    pub const UNEXPECTED_SYMBOL: Code = Code::new("E045");
    pub const STATEMENT_TOO_LONG: Code = Code::new("E046");
}

/// Script compile (AST and translation) error codes
pub mod compile {
    use super::Code;

    pub const STRING_EXPECTED: Code = Code::new("E060");
    pub const NUMBER_EXPECTED: Code = Code::new("E061");
    pub const FEWER_PARAMETERS_EXPECTED: Code = Code::new("E062");
    pub const VARIABLE_EXPECTED: Code = Code::new("E063");
    pub const UNDEFINED_VARIABLE: Code = Code::new("E064");
    pub const OBJECT_NAME_EXPECTED: Code = Code::new("E065");
    pub const OBJECT_ALLOCATION_ERROR: Code = Code::new("E066");
    pub const INVALID_PARAMETERS: Code = Code::new("E067");
    pub const DUPLICATE_OVERRIDE: Code = Code::new("E068");
    pub const UNEXPECTED_TOKEN: Code = Code::new("E069");
    pub const OBJECT_BASE_NOT_FOUND: Code = Code::new("E070");
    pub const REFERENCE_TO_NON_EXISTING_OBJECT: Code = Code::new("E071");
    pub const TOO_MANY_ERRORS: Code = Code::new("E072");
    pub const SCRIPT_SYNTAX_ERROR: Code = Code::new("E073");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

/// Success codes
pub mod success {
    use super::Code;

    // General success codes
    pub const OPERATION_COMPLETED_SUCCESSFULLY: Code = Code::new("I001");
    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");

    // File processing success codes
    pub const FILE_PROCESSING_SUCCESS: Code = Code::new("I006");
    pub const FILE_VALIDATION_PASSED: Code = Code::new("I007");

    // Rule-path tokenizer
    pub const TOKENIZATION_COMPLETE: Code = Code::new("I020");
    pub const PASS2_COMPLETE: Code = Code::new("I021");

    // Script front end
    pub const LEXING_COMPLETE: Code = Code::new("I030");
    pub const PARSE_COMPLETE: Code = Code::new("I040");
    pub const AST_CONSTRUCTION_COMPLETE: Code = Code::new("I041");

    // AST processing
    pub const IMPORTS_PROCESSED: Code = Code::new("I050");
    pub const INHERITANCE_PROCESSED: Code = Code::new("I051");
    pub const VARIABLES_EXPANDED: Code = Code::new("I052");

    // Translation
    pub const TRANSLATION_COMPLETE: Code = Code::new("I060");
    pub const COMPILE_COMMITTED: Code = Code::new("I061");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

const REGISTRY_ENTRIES: &[ErrorMetadata] = &[
    // System errors
    ErrorMetadata::new(
        "ERR001",
        "System",
        Severity::Critical,
        false,
        true,
        "Critical internal system error",
        "Contact system administrator or file bug report",
    ),
    ErrorMetadata::new(
        "ERR002",
        "System",
        Severity::Critical,
        false,
        true,
        "System initialization failed",
        "Check configuration and restart the compiler",
    ),
    // File processing errors
    ErrorMetadata::new(
        "E005",
        "FileProcessing",
        Severity::High,
        false,
        true,
        "Script file not found",
        "Verify the file path exists and is accessible",
    ),
    ErrorMetadata::new(
        "E006",
        "FileProcessing",
        Severity::Medium,
        false,
        true,
        "File extension is not a known script type",
        "Use .material, .compositor, .particle, .program or .os",
    ),
    ErrorMetadata::new(
        "E007",
        "FileProcessing",
        Severity::High,
        false,
        true,
        "Script file exceeds the configured size limit",
        "Split the script or raise max_file_size in the build profile",
    ),
    ErrorMetadata::new(
        "E008",
        "FileProcessing",
        Severity::Low,
        true,
        false,
        "Script file is empty",
        "Add content to the script or remove it from the batch",
    ),
    ErrorMetadata::new(
        "E009",
        "FileProcessing",
        Severity::High,
        false,
        true,
        "Permission denied while reading script",
        "Check file permissions",
    ),
    ErrorMetadata::new(
        "E010",
        "FileProcessing",
        Severity::High,
        false,
        true,
        "Script file is not valid UTF-8",
        "Re-save the script as UTF-8 or ASCII",
    ),
    ErrorMetadata::new(
        "E011",
        "FileProcessing",
        Severity::High,
        false,
        true,
        "I/O error while processing script",
        "Check disk health and file accessibility",
    ),
    ErrorMetadata::new(
        "E012",
        "FileProcessing",
        Severity::Medium,
        false,
        true,
        "Invalid file path",
        "Provide a path to a regular file",
    ),
    // Rule-path tokenizer
    ErrorMetadata::new(
        "E020",
        "Tokenizer",
        Severity::High,
        false,
        true,
        "Source does not match the rule grammar",
        "Check the script against the grammar near the reported position",
    ),
    ErrorMetadata::new(
        "E021",
        "Tokenizer",
        Severity::High,
        false,
        true,
        "Grammar finished before the end of the source",
        "Remove or fix the trailing input",
    ),
    ErrorMetadata::new(
        "E022",
        "Tokenizer",
        Severity::Critical,
        false,
        true,
        "Rule path recursion limit exceeded",
        "Check the grammar for unbounded left recursion",
    ),
    ErrorMetadata::new(
        "E023",
        "Tokenizer",
        Severity::High,
        false,
        true,
        "Token limit exceeded",
        "Split the source or raise max_token_count",
    ),
    ErrorMetadata::new(
        "E024",
        "Tokenizer",
        Severity::Critical,
        false,
        true,
        "Grammar tables are inconsistent",
        "Fix the rule or symbol table definition",
    ),
    ErrorMetadata::new(
        "E025",
        "Tokenizer",
        Severity::High,
        false,
        true,
        "Second pass rejected the token stream",
        "Inspect the pass 2 diagnostics",
    ),
    // Script lexer
    ErrorMetadata::new(
        "E030",
        "Lexer",
        Severity::High,
        false,
        true,
        "Unterminated quoted string",
        "Close the string with a double quote",
    ),
    ErrorMetadata::new(
        "E031",
        "Lexer",
        Severity::High,
        false,
        true,
        "Unterminated block comment",
        "Close the comment with */",
    ),
    ErrorMetadata::new(
        "E032",
        "Lexer",
        Severity::Medium,
        false,
        true,
        "Variable reference without a name",
        "Follow $ with a variable name",
    ),
    // Script parser
    ErrorMetadata::new(
        "E040",
        "Parse",
        Severity::High,
        false,
        true,
        "Unbalanced braces",
        "Check that every { has a matching }",
    ),
    ErrorMetadata::new(
        "E041",
        "Parse",
        Severity::High,
        false,
        true,
        "Unexpected end of script",
        "Complete the final statement or block",
    ),
    ErrorMetadata::new(
        "E042",
        "Parse",
        Severity::Medium,
        false,
        true,
        "Malformed import statement",
        "Use: import <target> from <file>",
    ),
    ErrorMetadata::new(
        "E043",
        "Parse",
        Severity::Medium,
        false,
        true,
        "Malformed variable assignment",
        "Use: set $name <value>",
    ),
    ErrorMetadata::new(
        "E044",
        "Parse",
        Severity::High,
        false,
        true,
        "Block nesting too deep",
        "Flatten the script or raise max_nesting_depth",
    ),
    ErrorMetadata::new(
        "E045",
        "Parse",
        Severity::High,
        true,
        false,
        "Symbol not valid at this point of a script",
        "Remove the stray brace or colon",
    ),
    ErrorMetadata::new(
        "E046",
        "Parse",
        Severity::High,
        false,
        true,
        "Statement has too many tokens",
        "Split the statement or raise max_tokens_per_statement",
    ),
    // Script compile
    ErrorMetadata::new(
        "E060",
        "Compile",
        Severity::Medium,
        true,
        false,
        "String expected",
        "Supply a string value for the property",
    ),
    ErrorMetadata::new(
        "E061",
        "Compile",
        Severity::Medium,
        true,
        false,
        "Number expected",
        "Supply a numeric value for the property",
    ),
    ErrorMetadata::new(
        "E062",
        "Compile",
        Severity::Medium,
        true,
        false,
        "Fewer parameters expected",
        "Remove the extra parameters",
    ),
    ErrorMetadata::new(
        "E063",
        "Compile",
        Severity::Medium,
        true,
        false,
        "Variable expected",
        "Use a $variable where one is required",
    ),
    ErrorMetadata::new(
        "E064",
        "Compile",
        Severity::Medium,
        true,
        false,
        "Undefined variable",
        "Define the variable with set before using it",
    ),
    ErrorMetadata::new(
        "E065",
        "Compile",
        Severity::Medium,
        true,
        false,
        "Object name expected",
        "Give the object a name after its class keyword",
    ),
    ErrorMetadata::new(
        "E066",
        "Compile",
        Severity::High,
        true,
        false,
        "Object allocation failed",
        "Check for conflicting object names",
    ),
    ErrorMetadata::new(
        "E067",
        "Compile",
        Severity::Medium,
        true,
        false,
        "Invalid parameters",
        "Check the accepted values for the property",
    ),
    ErrorMetadata::new(
        "E068",
        "Compile",
        Severity::Medium,
        true,
        false,
        "Duplicate override",
        "Only override a named base child once",
    ),
    ErrorMetadata::new(
        "E069",
        "Compile",
        Severity::Medium,
        true,
        false,
        "Unexpected token",
        "Remove the unknown keyword or move it to a valid block",
    ),
    ErrorMetadata::new(
        "E070",
        "Compile",
        Severity::Medium,
        true,
        false,
        "Object base not found",
        "Define or import the base object before inheriting from it",
    ),
    ErrorMetadata::new(
        "E071",
        "Compile",
        Severity::Medium,
        true,
        false,
        "Reference to non-existing object",
        "Check the imported file and target names",
    ),
    ErrorMetadata::new(
        "E072",
        "Compile",
        Severity::High,
        false,
        true,
        "Too many compile errors",
        "Fix the reported errors and recompile",
    ),
    ErrorMetadata::new(
        "E073",
        "Compile",
        Severity::High,
        false,
        false,
        "Script could not be lexed or parsed",
        "Fix the reported syntax error; nothing in the script was translated",
    ),
    // Success codes
    ErrorMetadata::new(
        "I001",
        "Success",
        Severity::Low,
        true,
        false,
        "Operation completed successfully",
        "Continue",
    ),
    ErrorMetadata::new(
        "I004",
        "Success",
        Severity::Low,
        true,
        false,
        "System initialization completed",
        "Continue",
    ),
    ErrorMetadata::new(
        "I006",
        "Success",
        Severity::Low,
        true,
        false,
        "Script file processed",
        "Continue",
    ),
    ErrorMetadata::new(
        "I007",
        "Success",
        Severity::Low,
        true,
        false,
        "Script file validation passed",
        "Continue to compilation",
    ),
    ErrorMetadata::new(
        "I020",
        "Success",
        Severity::Low,
        true,
        false,
        "Rule-path tokenization completed",
        "Continue to pass 2",
    ),
    ErrorMetadata::new(
        "I021",
        "Success",
        Severity::Low,
        true,
        false,
        "Pass 2 completed",
        "Continue",
    ),
    ErrorMetadata::new(
        "I030",
        "Success",
        Severity::Low,
        true,
        false,
        "Script lexing completed",
        "Continue to parsing",
    ),
    ErrorMetadata::new(
        "I040",
        "Success",
        Severity::Low,
        true,
        false,
        "Script parsing completed",
        "Continue to AST construction",
    ),
    ErrorMetadata::new(
        "I041",
        "Success",
        Severity::Low,
        true,
        false,
        "AST construction completed",
        "Continue to AST processing",
    ),
    ErrorMetadata::new(
        "I050",
        "Success",
        Severity::Low,
        true,
        false,
        "Imports processed",
        "Continue to inheritance",
    ),
    ErrorMetadata::new(
        "I051",
        "Success",
        Severity::Low,
        true,
        false,
        "Object inheritance processed",
        "Continue to variable expansion",
    ),
    ErrorMetadata::new(
        "I052",
        "Success",
        Severity::Low,
        true,
        false,
        "Variables expanded",
        "Continue to translation",
    ),
    ErrorMetadata::new(
        "I060",
        "Success",
        Severity::Low,
        true,
        false,
        "Translation completed",
        "Continue",
    ),
    ErrorMetadata::new(
        "I061",
        "Success",
        Severity::Low,
        true,
        false,
        "Compile committed without errors",
        "Compiled objects are ready for use",
    ),
];

/// Error metadata registry using OnceLock for thread safety
static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

/// Initialize and get the error registry
fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        REGISTRY_ENTRIES
            .iter()
            .map(|metadata| (metadata.code, metadata.clone()))
            .collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

/// Get error metadata for a specific error code
pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

/// Get error severity from error code
pub fn get_severity(code: &str) -> Severity {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

/// Check if error is recoverable
pub fn is_recoverable(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

/// Check if error requires immediate halt
pub fn requires_halt(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.requires_halt)
        .unwrap_or(false)
}

/// Get human-readable description for error code
pub fn get_description(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

/// Get recommended action for error code
pub fn get_action(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

/// Get error category from error code
pub fn get_category(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_entry_is_unique() {
        let registry = get_error_registry();
        assert_eq!(registry.len(), REGISTRY_ENTRIES.len());
    }

    #[test]
    fn test_compile_codes_are_recoverable() {
        assert!(is_recoverable(compile::OBJECT_NAME_EXPECTED.as_str()));
        assert!(!requires_halt(compile::INVALID_PARAMETERS.as_str()));
        assert_eq!(get_category(compile::UNDEFINED_VARIABLE.as_str()), "Compile");
    }

    #[test]
    fn test_tokenizer_codes_halt() {
        assert!(requires_halt(tokenizer::GRAMMAR_MISMATCH.as_str()));
        assert_eq!(
            get_severity(tokenizer::RULE_DEPTH_EXCEEDED.as_str()),
            Severity::Critical
        );
    }

    #[test]
    fn test_unknown_code_defaults() {
        assert_eq!(get_description("Z999"), "Unknown error");
        assert_eq!(get_category("Z999"), "Unknown");
        assert!(get_error_metadata("Z999").is_none());
    }
}
