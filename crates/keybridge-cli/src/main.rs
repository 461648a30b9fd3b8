//! keybridge CLI
//!
//! Configuration and inspection tool for keybridge.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use keybridge_daemon::keycodes::{self, Keycode};
use miette::IntoDiagnostic;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "keybridge")]
#[command(about = "Keyboard bridge tool")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/keybridge/config.kdl")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the configuration file
    Validate {
        /// Print the parsed configuration as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available input devices
    Devices,

    /// Look up a key by name, alias, or numeric code
    Keycode {
        /// Key name (e.g. "esc", "ret") or decimal keycode
        key: String,
    },

    /// Print the full keycode table
    Keycodes {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> miette::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&cli.config).into_owned().into();
    tracing::debug!("Using config file {}", config_path.display());

    match cli.command {
        Commands::Validate { json } => cmd_validate(&config_path, json),
        Commands::Devices => cmd_devices(),
        Commands::Keycode { key } => cmd_keycode(&key),
        Commands::Keycodes { json } => cmd_keycodes(json),
    }
}

fn cmd_validate(config_path: &Path, json: bool) -> miette::Result<()> {
    let config = keybridge_config::parse_config(config_path)?;

    if json {
        let out = serde_json::to_string_pretty(&config).into_diagnostic()?;
        println!("{}", out);
        return Ok(());
    }

    println!("Configuration is valid: {}", config_path.display());
    match &config.input {
        Some(input) => println!(
            "  Input:  {}{}",
            input.device.display(),
            if input.grab { " (grabbed)" } else { "" }
        ),
        None => println!("  Input:  <none, pass --device to keybridged>"),
    }
    let output = &config.output;
    println!(
        "  Output: '{}' {:04x}:{:04x} v{} via {}",
        output.name,
        output.vendor,
        output.product,
        output.version,
        output.path.display()
    );
    if let Some(command) = &output.post_init {
        println!("  Post-init: {}", command);
    }
    Ok(())
}

fn cmd_devices() -> miette::Result<()> {
    println!("Available input devices:\n");

    let devices = keybridge_daemon::device::enumerate_devices()
        .map_err(|e| miette::miette!("{:#}", e))?;
    tracing::debug!("Found {} input device(s)", devices.len());

    for device in devices {
        let device_type = if device.keyboard { "keyboard" } else { "other" };

        println!("  {} [{}]", device.name, device_type);
        println!("    Path: {}", device.path.display());
        println!("    ID: {}", device.vendor_product());
        println!();
    }

    Ok(())
}

fn describe_key(code: Keycode) -> String {
    match code.name() {
        Some(name) => {
            let aliases = keycodes::table().aliases_of(name);
            if aliases.is_empty() {
                format!("{:>3}  {}", code.0, name)
            } else {
                format!("{:>3}  {} (aliases: {})", code.0, name, aliases.join(", "))
            }
        }
        None => format!("{:>3}  <unnamed>", code.0),
    }
}

fn cmd_keycode(key: &str) -> miette::Result<()> {
    let code: Keycode = key.parse().map_err(|e| miette::miette!("{}", e))?;
    println!("{}", describe_key(code));
    Ok(())
}

#[derive(Serialize)]
struct KeycodeRow {
    code: Keycode,
    name: &'static str,
    aliases: &'static [&'static str],
}

fn cmd_keycodes(json: bool) -> miette::Result<()> {
    let table = keycodes::table();

    if json {
        let rows: Vec<KeycodeRow> = table
            .iter()
            .map(|(code, name)| KeycodeRow {
                code,
                name,
                aliases: table.aliases_of(name),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows).into_diagnostic()?);
        return Ok(());
    }

    for (code, _) in table.iter() {
        println!("{}", describe_key(code));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_key_with_aliases() {
        assert_eq!(describe_key(Keycode(91)), " 91  hira (aliases: hiragana, hiranaga)");
    }

    #[test]
    fn test_describe_key_without_aliases() {
        assert_eq!(describe_key(Keycode(30)), " 30  a");
    }

    #[test]
    fn test_describe_unnamed_key() {
        assert_eq!(describe_key(Keycode(600)), "600  <unnamed>");
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["keybridge", "keycode", "esc"]).unwrap();
        assert!(matches!(cli.command, Commands::Keycode { ref key } if key == "esc"));

        let cli = Cli::try_parse_from(["keybridge", "-c", "/tmp/x.kdl", "validate", "--json"])
            .unwrap();
        assert_eq!(cli.config, "/tmp/x.kdl");
        assert!(matches!(cli.command, Commands::Validate { json: true }));
    }

    #[test]
    fn test_keycode_row_serializes_code_as_number() {
        let row = KeycodeRow {
            code: Keycode(30),
            name: "a",
            aliases: &[],
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"code":30,"name":"a","aliases":[]}"#);
    }
}
