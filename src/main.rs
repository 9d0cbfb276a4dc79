use clap::Parser;
use colored::*;
use dirsort::cli::{Cli, run_cli};
use dirsort::output::OutputFormatter;
use dirsort::walker::new_cancel_flag;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::Ordering;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let cancel = new_cancel_flag();
    let handler_flag = Arc::clone(&cancel);
    if let Err(e) = ctrlc::set_handler(move || {
        if handler_flag.load(Ordering::SeqCst) {
            // Second Ctrl+C
            std::process::exit(130);
        }
        eprintln!(
            "\n{}",
            "Received Ctrl+C, stopping after the current entry...".yellow().bold()
        );
        handler_flag.store(true, Ordering::SeqCst);
    }) {
        OutputFormatter::warning(&format!("Could not install Ctrl+C handler: {}", e));
    }

    match run_cli(&cli, cancel) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
