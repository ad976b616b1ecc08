use std::io::{self, Write};

use clap::Parser;
use dpi_types::DpiType;

#[derive(Parser, Debug)]
#[command(about = "Print the DPI type table")]
pub struct Cmd {}

impl Cmd {
    pub fn run(&self) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(
            out,
            "{:<10} {:<16} {:>5} {:>7} {:<9} {:>9}",
            "type", "c type", "width", "logical", "signed", "host size"
        )?;
        for ty in DpiType::ALL {
            writeln!(
                out,
                "{:<10} {:<16} {:>5} {:>7} {:<9} {:>9}",
                ty.name(),
                ty.c_type(),
                ty.width_bits(),
                ty.logical_bits(),
                ty.signedness().to_string(),
                ty.host_size()
            )?;
        }
        Ok(())
    }
}
