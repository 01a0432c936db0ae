//! Command line surface

use crate::config::DEFAULT_CONFIG_FILE;
use clap::Parser;
use hotfolder_printer::{default_printer, list_printers};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "hotfolder",
    version,
    about = "Print documents as they arrive in a watched folder"
)]
pub struct Cli {
    /// Path to the JSON config file
    #[arg(default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// List available printers and exit
    #[arg(short, long)]
    pub list_printers: bool,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Directory for the log file
    #[arg(long, default_value = ".")]
    pub log_dir: PathBuf,
}

/// `--list-printers`: print the printers and a hint for the config file
pub async fn list_printers_command() -> ExitCode {
    let rule = "=".repeat(50);
    println!("\n{}\nAvailable Printers\n{}", rule, rule);

    let printers = match list_printers().await {
        Ok(printers) => printers,
        Err(e) => {
            eprintln!("Failed to list printers: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let default = default_printer().await.ok().flatten();

    if printers.is_empty() {
        println!("No printers found.");
        return ExitCode::SUCCESS;
    }

    for printer in &printers {
        if Some(printer) == default.as_ref() {
            println!("  * {} (default)", printer);
        } else {
            println!("    {}", printer);
        }
    }

    println!("{}", rule);
    println!("\nCopy the printer name into \"printer_name\" in your config file.");
    println!("Leave it empty to use the default printer.\n");
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["hotfolder"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert!(!cli.list_printers);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_alternate_config_and_list_flag() {
        let cli = Cli::try_parse_from(["hotfolder", "office.json"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("office.json"));

        let cli = Cli::try_parse_from(["hotfolder", "-l"]).unwrap();
        assert!(cli.list_printers);
        let cli = Cli::try_parse_from(["hotfolder", "--list-printers"]).unwrap();
        assert!(cli.list_printers);
    }

    #[test]
    fn test_rejects_extra_arguments() {
        assert!(Cli::try_parse_from(["hotfolder", "a.json", "b.json"]).is_err());
    }
}
