//! CLI entry point. Parses [`rr_log::commands::rr_options::RrOptions`] and
//! dispatches to the matching [`rr_log::commands::RrCommand`], the same
//! shape the teacher's own `main.rs` drives `RdOptions`/`RdCommand` with.

use rr_log::commands::dump_command::DumpCommand;
use rr_log::commands::rr_options::RrOptions;
use rr_log::commands::RrCommand;
use structopt::StructOpt;

fn main() {
    rr_log::log::init_from_env();
    let options = RrOptions::from_args();
    let mut command = DumpCommand::new(&options);
    if let Err(e) = command.run() {
        eprintln!("rr-log-tool: {}", e);
        std::process::exit(1);
    }
}
