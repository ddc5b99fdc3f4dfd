//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
///
/// Addresses are hex by convention on these boards, so a bare number with
/// hex digits is also accepted as hex.
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .or_else(|| s.strip_prefix('$'))
    {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        u32::from_str_radix(s, 16).map_err(|e| format!("Invalid hex value: {}", e))
    }
}

/// Parse a length as decimal, or hex with a 0x prefix
fn parse_length(s: &str) -> Result<usize, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<usize>()
            .map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "wdcload")]
#[command(
    author,
    version,
    about = "Upload and run programs on WDC W65C02SXB, W65C816SXB and MENSCH boards",
    long_about = None
)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Serial port the board is attached to (lists ports when omitted)
    #[arg(short, long, global = true)]
    pub port: Option<String>,

    /// Baud rate
    #[arg(long, default_value_t = 9600, global = true)]
    pub baud: u32,

    /// Read timeout in milliseconds
    #[arg(long, default_value_t = 1000, global = true)]
    pub timeout_ms: u64,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// File formats accepted by `load`
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadKind {
    /// Motorola S19/S28 records
    Srec,
    /// WDC binary
    Wdc,
    /// Raw binary, requires --address
    Raw,
}

/// File formats written by `save`
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveKind {
    /// S28 records
    Srec,
    /// WDC binary
    Wdc,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available serial ports
    Ports,

    /// Show the board type and its info block
    Info,

    /// Load a file into board memory
    Load {
        /// File to load
        file: PathBuf,

        /// File format
        #[arg(short, long, value_enum, default_value_t = LoadKind::Srec)]
        format: LoadKind,

        /// Load address for raw files (hex)
        #[arg(short, long, value_parser = parse_hex_u32, required_if_eq("format", "raw"))]
        address: Option<u32>,

        /// Execute at this address after loading (hex)
        #[arg(long, value_parser = parse_hex_u32)]
        exec: Option<u32>,

        /// Open a terminal on the port when done
        #[arg(long)]
        term: bool,
    },

    /// Save board memory to a file
    Save {
        /// Start address (hex)
        #[arg(value_parser = parse_hex_u32)]
        address: u32,

        /// Number of bytes
        #[arg(value_parser = parse_length)]
        length: usize,

        /// Output file
        file: PathBuf,

        /// File format
        #[arg(short, long, value_enum, default_value_t = SaveKind::Srec)]
        format: SaveKind,
    },

    /// Dump board memory
    Show {
        /// Start address (hex)
        #[arg(value_parser = parse_hex_u32)]
        address: u32,

        /// Number of bytes
        #[arg(value_parser = parse_length)]
        length: usize,
    },

    /// Execute code at an address
    Exec {
        /// Start address (hex)
        #[arg(value_parser = parse_hex_u32)]
        address: u32,

        /// Open a terminal on the port afterwards
        #[arg(long)]
        term: bool,
    },

    /// Print the saved CPU registers (SXB boards)
    State,

    /// Terminal on the board's serial port
    Term,
}

impl Commands {
    /// Subcommand name as typed on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Ports => "ports",
            Commands::Info => "info",
            Commands::Load { .. } => "load",
            Commands::Save { .. } => "save",
            Commands::Show { .. } => "show",
            Commands::Exec { .. } => "exec",
            Commands::State => "state",
            Commands::Term => "term",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0x8000"), Ok(0x8000));
        assert_eq!(parse_hex_u32("$0200"), Ok(0x0200));
        assert_eq!(parse_hex_u32("1000"), Ok(0x1000));
        assert_eq!(parse_hex_u32("FFFFFF"), Ok(0xFF_FFFF));
        assert!(parse_hex_u32("0xZZ").is_err());
    }

    #[test]
    fn test_parse_length() {
        assert_eq!(parse_length("256"), Ok(256));
        assert_eq!(parse_length("0x100"), Ok(256));
        assert!(parse_length("ten").is_err());
    }

    #[test]
    fn test_raw_load_needs_address() {
        let err = Cli::try_parse_from(["wdcload", "-p", "/dev/ttyUSB0", "load", "-f", "raw", "a.bin"]);
        assert!(err.is_err());

        let cli = Cli::try_parse_from([
            "wdcload", "-p", "/dev/ttyUSB0", "load", "-f", "raw", "-a", "0x4000", "a.bin",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Load {
                format: LoadKind::Raw,
                address: Some(0x4000),
                ..
            })
        ));
    }
}
