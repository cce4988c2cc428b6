//! Configuration for the script compiler
//!
//! Compile-time limits are generated by `build.rs` from `config/<profile>.toml`
//! at the workspace root. Runtime preferences live in [`runtime`].

include!(concat!(env!("OUT_DIR"), "/constants.rs"));

pub mod runtime;

/// Build information and configuration metadata
pub mod build_info {
    /// Returns the configuration profile used during build
    pub fn profile() -> &'static str {
        super::compile_time::PROFILE
    }

    /// Returns the configuration directory used during build
    pub fn config_dir() -> &'static str {
        option_env!("SCRIPT_CONFIG_DIR").unwrap_or("config")
    }

    /// Returns configuration source information
    pub fn source_info() -> String {
        format!("Generated from {}/{}.toml", config_dir(), profile())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_limits_are_sane() {
        assert!(compile_time::tokenizer::MAX_RULE_DEPTH > 0);
        assert!(compile_time::parser::MAX_NESTING_DEPTH > 0);
        assert!(
            compile_time::logging::MAX_LOG_EVENTS_PER_FILE <= compile_time::logging::LOG_BUFFER_SIZE
        );
        assert!(build_info::source_info().ends_with(".toml"));
    }
}
