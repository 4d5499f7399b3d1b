pub mod accounts;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod context;
pub mod core;
pub mod error;
pub mod events;
pub mod handlers;
pub mod installer;
pub mod logging;
pub mod package;
pub mod ui;
pub mod utils;

use clap::Parser;
use context::CancelToken;
use std::process::exit;

/// Run unipkg CLI entrypoint.
pub fn run_cli() {
    // 0. Initialize color settings (must be first)
    ui::init_colors();

    // 1. Parse & configure output
    let args = cli::args::Cli::parse();
    ui::set_quiet(args.global.quiet);
    ui::set_verbose(args.global.verbose);
    logging::init(args.global.verbose, args.global.quiet);

    // 2. Signal handling: abort in-flight transfers, which clean up their partial files
    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!();
        ui::mark_interrupted();
        on_interrupt.cancel();
        ui::warning("Operation cancelled by user.");
    }) {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }

    // 3. Run
    if let Err(e) = cli::dispatcher::dispatch(&args, cancel) {
        if args.global.json {
            let command = args
                .command
                .as_ref()
                .map(cli::dispatcher::command_name)
                .unwrap_or_default();
            if let Err(emit_error) = utils::machine_output::emit_error(command, &e.to_string()) {
                tracing::error!(error = %emit_error, "could not write JSON error envelope");
            }
        }
        ui::error(&format!("{}", e));
        if ui::is_verbose() {
            eprintln!("{:?}", e);
        }
        exit(if ui::was_interrupted() { 130 } else { 1 });
    }
}
