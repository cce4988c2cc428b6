// build.rs - TOML-driven compile-time limits for the script compiler
use std::env;
use std::fs;
use std::path::Path;

#[derive(serde::Deserialize)]
struct CompileTimeConfig {
    file_processing: FileProcessingLimits,
    tokenizer: TokenizerLimits,
    parser: ParserLimits,
    translation: TranslationLimits,
    batch_processing: BatchProcessingLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct FileProcessingLimits {
    max_file_size: u64,
    large_file_threshold: u64,
    max_line_count_for_analysis: usize,
}

#[derive(serde::Deserialize)]
struct TokenizerLimits {
    max_rule_depth: usize,
    max_token_count: usize,
    max_constant_count: usize,
}

#[derive(serde::Deserialize)]
struct ParserLimits {
    max_nesting_depth: usize,
    max_tokens_per_statement: usize,
    max_variable_expansion_depth: usize,
}

#[derive(serde::Deserialize)]
struct TranslationLimits {
    max_errors_per_compile: usize,
    max_import_depth: usize,
    max_overlay_depth: usize,
}

#[derive(serde::Deserialize)]
struct BatchProcessingLimits {
    max_worker_threads: usize,
    max_files_per_batch: usize,
    max_batch_memory: u64,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    max_error_collection: usize,
    log_buffer_size: usize,
    max_log_message_length: usize,
    max_log_events_per_file: usize,
    security_min_log_level: u8,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SCRIPT_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=SCRIPT_CONFIG_DIR");

    let profile = env::var("SCRIPT_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("SCRIPT_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    // Workspace root is the parent of the script_compiler directory
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("Could not find workspace root (parent directory)");

    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));

    println!("cargo:rerun-if-changed={}", config_path.display());

    if !config_path.exists() {
        panic!(
            "Configuration file not found: {}\nWorkspace root: {}\nLooking for: {}/{}/{}.toml",
            config_path.display(),
            workspace_root.display(),
            workspace_root.display(),
            config_dir,
            profile
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path.display(), e));

    let config: CompileTimeConfig = toml::from_str(&config_content)
        .unwrap_or_else(|e| panic!("Invalid TOML in {}: {}", config_path.display(), e));

    validate_security_constraints(&config, &profile);
    generate_constants(&config, &profile);
}

fn validate_security_constraints(config: &CompileTimeConfig, profile: &str) {
    const ABSOLUTE_MAX_FILE_SIZE: u64 = 1_000_000_000;
    const ABSOLUTE_MAX_MEMORY: u64 = 10_000_000_000;
    // Deeper rule recursion risks overflowing the default 2 MiB thread stack
    const ABSOLUTE_MAX_RULE_DEPTH: usize = 4096;

    if config.file_processing.max_file_size > ABSOLUTE_MAX_FILE_SIZE {
        panic!("SECURITY: max_file_size exceeds absolute maximum");
    }

    if config.tokenizer.max_rule_depth == 0 || config.tokenizer.max_rule_depth > ABSOLUTE_MAX_RULE_DEPTH {
        panic!("SECURITY: max_rule_depth must be within 1..={}", ABSOLUTE_MAX_RULE_DEPTH);
    }

    if config.parser.max_nesting_depth == 0 {
        panic!("SECURITY: max_nesting_depth must be at least 1");
    }

    if config.translation.max_errors_per_compile == 0 {
        panic!("SECURITY: max_errors_per_compile must be at least 1");
    }

    if config.batch_processing.max_batch_memory > ABSOLUTE_MAX_MEMORY {
        panic!("SECURITY: max_batch_memory exceeds absolute maximum");
    }

    if config.logging.security_min_log_level > 2 {
        panic!("SECURITY: security_min_log_level too high (max: 2)");
    }

    if config.logging.log_buffer_size < 100 || config.logging.log_buffer_size > 100_000 {
        panic!("SECURITY: log_buffer_size must be within 100..=100000");
    }

    if config.logging.max_log_events_per_file > config.logging.log_buffer_size {
        panic!("SECURITY: max_log_events_per_file cannot exceed log_buffer_size");
    }

    if profile == "production" {
        if config.file_processing.max_file_size > 50_000_000 {
            panic!("PRODUCTION: max_file_size too high for production");
        }
    }
}

fn generate_constants(config: &CompileTimeConfig, profile: &str) {
    let out_dir = env::var("OUT_DIR").unwrap();
    let output_path = Path::new(&out_dir).join("constants.rs");

    let constants_code = format!(
        r#"
// Generated compile-time constants from TOML configuration
// Profile: {}
// DO NOT EDIT - Generated by build.rs

pub mod compile_time {{
    pub const PROFILE: &str = "{}";

    pub mod file_processing {{
        pub const MAX_FILE_SIZE: u64 = {};
        pub const LARGE_FILE_THRESHOLD: u64 = {};
        pub const MAX_LINE_COUNT_FOR_ANALYSIS: usize = {};
    }}

    pub mod tokenizer {{
        pub const MAX_RULE_DEPTH: usize = {};
        pub const MAX_TOKEN_COUNT: usize = {};
        pub const MAX_CONSTANT_COUNT: usize = {};
    }}

    pub mod parser {{
        pub const MAX_NESTING_DEPTH: usize = {};
        pub const MAX_TOKENS_PER_STATEMENT: usize = {};
        pub const MAX_VARIABLE_EXPANSION_DEPTH: usize = {};
    }}

    pub mod translation {{
        pub const MAX_ERRORS_PER_COMPILE: usize = {};
        pub const MAX_IMPORT_DEPTH: usize = {};
        pub const MAX_OVERLAY_DEPTH: usize = {};
    }}

    pub mod batch_processing {{
        pub const MAX_WORKER_THREADS: usize = {};
        pub const MAX_FILES_PER_BATCH: usize = {};
        pub const MAX_BATCH_MEMORY: u64 = {};
    }}

    pub mod logging {{
        pub const MAX_ERROR_COLLECTION: usize = {};
        pub const LOG_BUFFER_SIZE: usize = {};
        pub const MAX_LOG_MESSAGE_LENGTH: usize = {};
        pub const MAX_LOG_EVENTS_PER_FILE: usize = {};
        pub const SECURITY_MIN_LOG_LEVEL: u8 = {};
    }}
}}
"#,
        profile,
        profile,
        // File Processing
        config.file_processing.max_file_size,
        config.file_processing.large_file_threshold,
        config.file_processing.max_line_count_for_analysis,
        // Tokenizer
        config.tokenizer.max_rule_depth,
        config.tokenizer.max_token_count,
        config.tokenizer.max_constant_count,
        // Parser
        config.parser.max_nesting_depth,
        config.parser.max_tokens_per_statement,
        config.parser.max_variable_expansion_depth,
        // Translation
        config.translation.max_errors_per_compile,
        config.translation.max_import_depth,
        config.translation.max_overlay_depth,
        // Batch Processing
        config.batch_processing.max_worker_threads,
        config.batch_processing.max_files_per_batch,
        config.batch_processing.max_batch_memory,
        // Logging
        config.logging.max_error_collection,
        config.logging.log_buffer_size,
        config.logging.max_log_message_length,
        config.logging.max_log_events_per_file,
        config.logging.security_min_log_level,
    );

    fs::write(output_path, constants_code).unwrap();
}
