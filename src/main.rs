//! wdcload - Program loader for WDC 65xx development boards
//!
//! Talks to the monitor firmware of the W65C02SXB, W65C816SXB and MENSCH
//! boards over a serial port: loads S-record, WDC binary and raw files into
//! memory, saves memory back into files, dumps memory, starts programs and
//! attaches a terminal.

mod cli;
mod commands;

use std::time::Duration;

use clap::Parser;
use cli::{Cli, Commands, LoadKind, SaveKind};
use wdcload_core::format::{LoadFormat, SaveFormat};
use wdcload_serial::{connect, SerialConfig};

/// Log level for the given number of `-v` flags
fn log_level(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// Logger filtered by verbosity; filters from `env` take precedence
fn build_logger(verbose: u8, env: env_logger::Env<'_>) -> env_logger::Logger {
    env_logger::Builder::new()
        .filter_level(log_level(verbose))
        .parse_env(env)
        .build()
}

fn main() {
    let cli = Cli::parse();

    let logger = build_logger(cli.verbose, env_logger::Env::default());
    let max_level = logger.filter();
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(max_level);
    }

    let verbose = cli.verbose;
    if let Err(e) = run(cli) {
        if verbose > 0 {
            eprintln!("Error: {:?}", e);
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let command = match cli.command {
        None | Some(Commands::Ports) => return commands::list_ports(),
        Some(command) => command,
    };
    let Some(port) = cli.port else {
        return Err(format!("--port is required for {}", command.name()).into());
    };

    let config = SerialConfig {
        baud: cli.baud,
        timeout: Duration::from_millis(cli.timeout_ms),
        ..SerialConfig::default()
    };
    let mut session = connect(&port, &config)?;

    match command {
        Commands::Ports => commands::list_ports(),
        Commands::Info => commands::run_info(&mut session),
        Commands::Load {
            file,
            format,
            address,
            exec,
            term,
        } => {
            let format = match format {
                LoadKind::Srec => LoadFormat::Srec,
                LoadKind::Wdc => LoadFormat::Wdc,
                LoadKind::Raw => LoadFormat::Raw {
                    address: address.ok_or("raw files need --address")?,
                },
            };
            commands::run_load(&mut session, &file, format, exec)?;
            if term {
                commands::run_term(&mut session)?;
            }
            Ok(())
        }
        Commands::Save {
            address,
            length,
            file,
            format,
        } => {
            let format = match format {
                SaveKind::Srec => SaveFormat::Srec,
                SaveKind::Wdc => SaveFormat::Wdc,
            };
            commands::run_save(&mut session, address, length, &file, format)
        }
        Commands::Show { address, length } => commands::run_show(&mut session, address, length),
        Commands::Exec { address, term } => {
            commands::run_exec(&mut session, address)?;
            if term {
                commands::run_term(&mut session)?;
            }
            Ok(())
        }
        Commands::State => commands::run_state(&mut session),
        Commands::Term => commands::run_term(&mut session),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;

    fn quiet_env() -> env_logger::Env<'static> {
        env_logger::Env::new().filter("WDCLOAD_TEST_UNSET_FILTER")
    }

    fn enabled(logger: &env_logger::Logger, level: log::Level) -> bool {
        logger.enabled(&log::Metadata::builder().level(level).target("wdcload").build())
    }

    #[test]
    fn test_board_command_without_port_fails() {
        for args in [
            &["wdcload", "load", "/nonexistent/prog.s28"][..],
            &["wdcload", "exec", "200"][..],
            &["wdcload", "show", "8000", "16"][..],
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            let err = run(cli).unwrap_err();
            assert!(err.to_string().starts_with("--port is required for"), "{}", err);
        }
    }

    #[test]
    fn test_verbosity_reaches_logger() {
        let logger = build_logger(0, quiet_env());
        assert!(enabled(&logger, log::Level::Info));
        assert!(!enabled(&logger, log::Level::Debug));

        let logger = build_logger(1, quiet_env());
        assert_eq!(logger.filter(), log::LevelFilter::Debug);
        assert!(enabled(&logger, log::Level::Debug));
        assert!(!enabled(&logger, log::Level::Trace));

        let logger = build_logger(2, quiet_env());
        assert!(enabled(&logger, log::Level::Trace));
    }

    #[test]
    fn test_env_filter_overrides_verbosity() {
        std::env::set_var("WDCLOAD_TEST_LOG_FILTER", "warn");
        let logger = build_logger(2, env_logger::Env::new().filter("WDCLOAD_TEST_LOG_FILTER"));
        assert!(!enabled(&logger, log::Level::Info));
        assert!(enabled(&logger, log::Level::Warn));
    }
}
