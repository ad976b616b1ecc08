mod cmd_check;
mod cmd_completion;
mod cmd_header;
mod cmd_table;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about)]
#[command(name = "dpih")]
pub struct Cli {
    #[arg(long, short, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub cmd: CliCmd,
}

#[derive(Parser, Debug)]
pub enum CliCmd {
    Header(cmd_header::Cmd),
    Table(cmd_table::Cmd),
    Check(cmd_check::Cmd),
    Completion(cmd_completion::Cmd),
}
