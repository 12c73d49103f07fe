use crate::error::RrResult;

pub mod dump_command;
pub mod rr_options;

pub trait RrCommand {
    fn run(&mut self) -> RrResult<()>;
}
