use std::{fs, path::PathBuf};

use anyhow::anyhow;
use clap::Parser;
use dpi_types::{TypedefStatus, check_header};
use log::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(about = "Check a C header against the DPI type table")]
pub struct Cmd {
    /// Header to check, e.g. one written by a simulator's -dpiheader option
    #[arg()]
    pub input: PathBuf,

    /// Accept a header without include guard
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub allow_unguarded: bool,
}

impl Cmd {
    pub fn run(&self) -> anyhow::Result<()> {
        let text = fs::read_to_string(&self.input).map_err(|e| {
            anyhow!("Failed to read {} - {e}", self.input.to_string_lossy())
        })?;
        let report = check_header(&text);

        let mut problems = 0;
        for (ty, status) in &report.entries {
            match status {
                TypedefStatus::Ok => debug!("{ty}: ok"),
                TypedefStatus::Missing => {
                    warn!("{ty}: no typedef found");
                    problems += 1;
                }
                TypedefStatus::Mismatch { found } => {
                    warn!(
                        "{ty}: declared as '{found}', expected '{}' ({} bit, {})",
                        ty.c_type(),
                        ty.width_bits(),
                        ty.signedness()
                    );
                    problems += 1;
                }
                TypedefStatus::ImplementationDefined { found } => {
                    warn!(
                        "{ty}: declared as '{found}', whose signedness depends on the target, expected '{}'",
                        ty.c_type()
                    );
                    problems += 1;
                }
            }
        }

        if !report.has_guard {
            warn!("{} has no include guard.", self.input.to_string_lossy());
            if !self.allow_unguarded {
                problems += 1;
            }
        }

        if problems != 0 {
            return Err(anyhow!(
                "{} is not DPI compatible ({problems} problems)",
                self.input.to_string_lossy()
            ));
        }

        info!("{} is DPI compatible.", self.input.to_string_lossy());
        Ok(())
    }
}
