use crate::cli::args::{Cli, CompletionCommands};
use crate::utils::errors::Result;
use crate::utils::paths::PROGRAM_NAME;
use clap::CommandFactory;
use clap_complete::generate;
use std::io;

pub fn handle_completion_command(command: &CompletionCommands) -> Result<()> {
    let mut cmd = Cli::command();
    generate(command.shell(), &mut cmd, PROGRAM_NAME, &mut io::stdout());
    Ok(())
}
