use std::io;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};

use super::Cli;

#[derive(Parser, Debug)]
#[command(about = "Generate shell completions")]
pub struct Cmd {
    /// Shell to generate completions for
    #[arg()]
    pub shell: Shell,
}

impl Cmd {
    pub fn run(&self) -> anyhow::Result<()> {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(self.shell, &mut cmd, name, &mut io::stdout());
        Ok(())
    }
}
