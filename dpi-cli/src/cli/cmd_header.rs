use std::{
    io::{self, Write},
    path::PathBuf,
};

use clap::Parser;
use dpi_types::{HeaderConfig, header::DEFAULT_GUARD, render, write_header};
use log::info;

#[derive(Parser, Debug)]
#[command(about = "Generate C header with DPI type definitions")]
pub struct Cmd {
    /// Location to store header (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Include guard macro
    #[arg(long, default_value = DEFAULT_GUARD)]
    pub guard: String,

    /// Do not include svdpi.h
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub no_svdpi: bool,

    /// Additional header to include (repeatable)
    #[arg(long = "include", short = 'I')]
    pub includes: Vec<String>,

    /// Omit the extern "C" wrapper for C++ consumers
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub c_only: bool,
}

impl Cmd {
    fn config(&self) -> HeaderConfig {
        let mut includes = vec![];
        if !self.no_svdpi {
            includes.push("svdpi.h".to_string());
        }
        includes.extend(self.includes.iter().cloned());

        HeaderConfig {
            guard: self.guard.clone(),
            includes,
            cpp_compat: !self.c_only,
        }
    }

    pub fn run(&self) -> anyhow::Result<()> {
        let cfg = self.config();

        match &self.output {
            Some(path) => {
                write_header(path, &cfg)?;
                info!("Wrote DPI header to {}.", path.to_string_lossy());
            }
            None => {
                let text = render(&cfg)?;
                io::stdout().lock().write_all(text.as_bytes())?;
            }
        }

        Ok(())
    }
}
