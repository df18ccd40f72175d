//! Ledger script replay CLI
//!
//! Replays a CSV script of ledger commands against a fresh in-memory ledger
//! and prints the final balance of every account to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- script.csv > balances.csv
//! cargo run -- --strategy async --batch-size 2000 --workers 8 script.csv
//! RUST_LOG=debug cargo run -- --log-format json script.csv
//! ```
//!
//! # Script Format
//!
//! ```text
//! op,account,counterparty,amount
//! open,alice,,200
//! open,bob,,50
//! transfer,alice,bob,70
//! withdraw,bob,,20
//! deposit,alice,,5
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success (rejected commands are logged, not fatal)
//! - 1: Error (missing arguments, file not found, output not writable, etc.)

use ledger_engine::{cli, logging, strategy};
use std::process;
use tracing::error;

fn main() {
    let args = cli::parse_args();
    logging::init(args.log_format);

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy.clone(), config)
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        error!(error = %e, "replay failed");
        process::exit(1);
    }
}
