use script_compiler::batch::{self, BatchConfig, BatchResults};
use script_compiler::compiler2pass::{demo, Compiler2Pass, DemoPass2};
use script_compiler::config::runtime::{RuntimeConfig, TokenizerPreferences};
use script_compiler::file_processor::FileProcessor;
use script_compiler::logging;
use script_compiler::pipeline::{self, PipelineError};
use script_compiler::utils::SourceMap;
use std::env;
use std::path::Path;
use std::process;

#[derive(Debug)]
struct CliOptions {
    input: String,
    batch: BatchConfig,
    tokenize: bool,
    json: bool,
    config_file: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("script_compiler");

    if args.len() < 2 {
        eprintln!("Usage: {} <script|directory> [options]", program);
        eprintln!("       {} --help", program);
        process::exit(1);
    }
    if args[1] == "--help" {
        print_help(program);
        return Ok(());
    }

    let mut options = match parse_options(&args[1..]) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {}", message);
            process::exit(1);
        }
    };

    let runtime = match &options.config_file {
        Some(path) => RuntimeConfig::from_file(Path::new(path))?,
        None => RuntimeConfig::default(),
    };
    options.batch.files = runtime.file_processor;
    options.batch.compiler = runtime.compiler;
    let initialized = logging::config::init_runtime_preferences(runtime.logging)
        .and_then(|()| logging::init_global_logging())
        .and_then(|()| pipeline::validate_pipeline());
    if let Err(message) = initialized {
        logging::safe_log_critical(logging::codes::system::INITIALIZATION_FAILURE, &message);
        process::exit(1);
    }

    let input_path = Path::new(&options.input);
    if options.tokenize {
        tokenize_file(&options.input, runtime.tokenizer)?;
    } else if input_path.is_file() {
        compile_single_file(&options)?;
    } else if input_path.is_dir() {
        compile_directory(input_path, &options.batch)?;
    } else {
        eprintln!("Error: Input must be a script file or a directory");
        eprintln!("  Path: {}", input_path.display());
        process::exit(1);
    }

    Ok(())
}

fn print_help(program: &str) {
    println!("Script Compiler v{}", env!("CARGO_PKG_VERSION"));
    println!("Compiles material, compositor and particle scripts");
    println!();
    println!("USAGE:");
    println!("    {} <script>                  # Compile one script", program);
    println!("    {} <directory> [options]     # Compile every script in a directory", program);
    println!("    {} <file> --tokenize         # Run the demo rule-path grammar", program);
    println!();
    println!("OPTIONS:");
    println!("    --help              Show this help message");
    println!("    --threads N         Worker threads for directories (1 = sequential)");
    println!("    --recursive         Search subdirectories (default)");
    println!("    --no-recursive      Don't search subdirectories");
    println!("    --max-files N       Limit the number of scripts compiled");
    println!("    --fail-fast         Stop at the first script that fails");
    println!("    --quiet             Suppress progress reporting");
    println!("    --json              Print compiled objects as JSON (single script)");
    println!("    --config FILE       Read runtime preferences from a TOML file");
    println!("    --tokenize          Tokenize with the demo pass grammar instead of compiling");
    println!();
    println!("SCRIPT TYPES:");
    println!("    {}", script_compiler::file_processor::SCRIPT_EXTENSIONS.join(", "));
    println!();
    println!("EXAMPLES:");
    println!("    {} media/Water.material", program);
    println!("    {} media/ --threads 4 --fail-fast", program);
    println!("    {} effects/ --no-recursive --max-files 100", program);
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut options = CliOptions {
        input: String::new(),
        batch: BatchConfig::default(),
        tokenize: false,
        json: false,
        config_file: None,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--threads" => {
                let value = iter.next().ok_or("--threads requires a number")?;
                let threads: usize = value
                    .parse()
                    .map_err(|_| format!("Invalid thread count '{}'", value))?;
                options.batch.max_threads = threads.clamp(1, 32);
            }
            "--max-files" => {
                let value = iter.next().ok_or("--max-files requires a number")?;
                let max_files = value
                    .parse()
                    .map_err(|_| format!("Invalid max files '{}'", value))?;
                options.batch.max_files = Some(max_files);
            }
            "--config" => {
                let value = iter.next().ok_or("--config requires a file")?;
                options.config_file = Some(value.clone());
            }
            "--recursive" => options.batch.recursive = true,
            "--no-recursive" => options.batch.recursive = false,
            "--fail-fast" => options.batch.fail_fast = true,
            "--quiet" => options.batch.progress_reporting = false,
            "--json" => options.json = true,
            "--tokenize" => options.tokenize = true,
            flag if flag.starts_with("--") => {
                eprintln!("Warning: Unknown option '{}'", flag);
            }
            input if options.input.is_empty() => options.input = input.to_string(),
            extra => return Err(format!("Unexpected argument '{}'", extra)),
        }
    }

    if options.input.is_empty() {
        return Err("No input script or directory given".to_string());
    }
    Ok(options)
}

fn compile_single_file(options: &CliOptions) -> Result<(), Box<dyn std::error::Error>> {
    println!("Compiling {}", options.input);

    let result = pipeline::process_file_with_preferences(
        &options.input,
        &options.batch.files,
        &options.batch.compiler,
        0,
    );
    match result {
        Ok(result) => {
            let objects = result.stats.objects;
            println!(
                "\nSUCCESS: {} compositor(s), {} material(s), {} particle system(s), {} gpu program(s)",
                objects.compositors, objects.materials, objects.particle_systems, objects.gpu_programs
            );
            if options.json {
                println!("{}", result.output(&options.input).to_json()?);
            }
            logging::print_cargo_style_summary();
        }
        Err(error) => {
            eprintln!("\nFAILED: {}", error);
            print_detailed_error(&error);
            logging::print_cargo_style_summary();
            process::exit(1);
        }
    }

    Ok(())
}

fn compile_directory(dir_path: &Path, config: &BatchConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Starting batch compile: {}", dir_path.display());
    println!(
        "Configuration: {} threads, recursive={}, fail_fast={}",
        config.max_threads, config.recursive, config.fail_fast
    );
    if let Some(max_files) = config.max_files {
        println!("File limit: {} files maximum", max_files);
    }

    match batch::process_directory_with_config(dir_path, config) {
        Ok(results) => {
            print_batch_results(&results);
            logging::print_cargo_style_summary();
            if results.failure_count() > 0 {
                process::exit(1);
            }
        }
        Err(error) => {
            eprintln!("Batch compile failed: {}", error);
            logging::print_cargo_style_summary();
            process::exit(1);
        }
    }

    Ok(())
}

fn print_batch_results(results: &BatchResults) {
    println!("\n{}", results.summary());
    println!("  Files discovered: {}", results.files_discovered);
    println!("  Compile errors: {}", results.compile_error_count());

    let objects: usize = results
        .successful_files
        .iter()
        .map(|(_, result)| result.stats.objects.total())
        .sum();
    println!("  Objects created: {}", objects);

    if results.failure_count() > 0 {
        println!("\nFailed Files:");
        for (file_path, error) in &results.failed_files {
            println!("  {}: {}", file_path.display(), error);
        }
    }
}

fn print_detailed_error(error: &PipelineError) {
    match error {
        PipelineError::FileProcessing(file_error) => {
            eprintln!("Script could not be read:");
            eprintln!("  {}", file_error);
        }
        PipelineError::Compilation { errors, .. } => {
            for compile_error in errors {
                eprintln!("  {}", compile_error);
            }
        }
        PipelineError::Pipeline { message } => {
            eprintln!("Pipeline error: {}", message);
        }
    }
}

/// Run the demo pass grammar over a file and print its instructions
fn tokenize_file(
    file_path: &str,
    preferences: TokenizerPreferences,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = FileProcessor::new()
        .with_performance_logging(false)
        .process_file(file_path)?;
    let grammar = demo::demo_grammar()?;
    let mut tokenizer = Compiler2Pass::with_preferences(&grammar, preferences);
    tokenizer.set_active_contexts(demo::CTX_BASE);

    match tokenizer.compile(&file.source, &mut DemoPass2) {
        Ok(instructions) => {
            println!("{}", serde_json::to_string_pretty(&instructions)?);
            Ok(())
        }
        Err(error) => {
            match error.char_pos() {
                Some(pos) => {
                    let map = SourceMap::new(&file.source);
                    eprintln!("{}", map.format_error(map.position_at(pos), &error.to_string()));
                }
                None => eprintln!("error: {}", error),
            }
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_options() {
        let options = parse_options(&args(&[
            "media", "--threads", "4", "--fail-fast", "--no-recursive", "--max-files", "10",
        ]))
        .unwrap();

        assert_eq!(options.input, "media");
        assert_eq!(options.batch.max_threads, 4);
        assert!(options.batch.fail_fast);
        assert!(!options.batch.recursive);
        assert_eq!(options.batch.max_files, Some(10));
    }

    #[test]
    fn test_parse_options_errors() {
        assert!(parse_options(&args(&["media", "--threads", "many"])).is_err());
        assert!(parse_options(&args(&["media", "--threads"])).is_err());
        assert!(parse_options(&args(&["--quiet"])).is_err());
        assert!(parse_options(&args(&["a.material", "b.material"])).is_err());
    }

    #[test]
    fn test_unknown_flags_are_ignored() {
        let options = parse_options(&args(&["a.material", "--verbose", "--tokenize"])).unwrap();
        assert!(options.tokenize);
        assert!(options.batch.recursive);
    }
}
