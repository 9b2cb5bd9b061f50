//! hostprep CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use hostprep::cli::{Cli, CommandContext, CommandDispatcher};
use hostprep::ui::{OutputMode, TerminalUI, UserInterface};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for diagnostics.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
///
/// Diagnostics go to stderr; step output only ever goes to the durable log.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("hostprep=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hostprep=info"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("hostprep starting with args: {:?}", cli);

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let mut ui = TerminalUI::new(OutputMode::from_quiet(cli.quiet), cli.no_color);

    let cwd = std::env::current_dir().unwrap_or_default();
    let context = CommandContext::new(cli.config.clone(), cli.log.clone(), cwd);
    let dispatcher = CommandDispatcher::new(context);

    match dispatcher.dispatch(&cli, &mut ui) {
        Ok(result) => ExitCode::from(result.exit_code.clamp(0, 255) as u8),
        Err(e) => {
            ui.error(&format!("Error: {}", e));
            ExitCode::from(e.exit_code())
        }
    }
}
