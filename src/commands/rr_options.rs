//! CLI surface, generalized from the teacher's own `RdOptions`/
//! `RdSubCommand` (`structopt`-derived, the way `trace_info_command.rs`
//! consumes it).

use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "rr-log-tool")]
pub struct RrOptions {
    #[structopt(subcommand)]
    pub cmd: RrSubCommand,
}

#[derive(StructOpt, Debug, Clone)]
pub enum RrSubCommand {
    /// Prints per-kind entry counts and the final program point for an
    /// existing nondet log, as JSON.
    Dump {
        #[structopt(parse(from_os_str))]
        log_path: PathBuf,
    },
}
