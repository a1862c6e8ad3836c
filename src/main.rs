use clap::Parser;
use f1_archive::cli::{self, Args};
use std::process;

fn main() {
    let args = Args::parse();

    // Seasons are fetched one page at a time
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Failed to create async runtime: {}", e);
            process::exit(1);
        });

    match runtime.block_on(cli::run(args)) {
        Ok(_report) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}
