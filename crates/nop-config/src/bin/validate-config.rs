//! Config validation CLI tool
//!
//! Validates a nopd configuration file and reports any errors and warnings.

use nop_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a nopd configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match nop_config::load_config(&config_path) {
        Ok(policy) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", nop_config::CURRENT_CONFIG_VERSION);
            println!("  Poll interval: {:?}", policy.daemon.poll_interval);
            println!("  Resources: {}", policy.resources.len());

            for resource in &policy.resources {
                println!();
                println!("  - {}", resource.name);
                for (index, rule) in resource.rules.iter().enumerate() {
                    println!(
                        "      [{}] after {} ({:?}): {} = {}",
                        index,
                        rule.threshold_text,
                        rule.threshold,
                        rule.condition_type,
                        rule.status
                    );
                }
            }

            // Non-fatal findings, e.g. thresholds that degrade to 0s
            if let Ok(raw) = nop_config::load_raw_config(&config_path) {
                let warnings = nop_config::config_warnings(&raw);
                if !warnings.is_empty() {
                    println!();
                    println!("Warnings ({}):", warnings.len());
                    for warning in &warnings {
                        println!("  ! {}", warning);
                    }
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                nop_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                nop_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                nop_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                nop_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        nop_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
