//! `prime-mover report`: pretty-print a [`ControllerReport`] as a table
//! or re-serialize it, mirroring `durable-cli`'s `logs`/`events`
//! subcommands' use of `tabled` over whatever the cluster returned as
//! JSON.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use prime_mover_core::report::ControllerReport;
use tabled::{Table, Tabled};

#[derive(Debug, clap::Args)]
pub struct Report {
    /// Path to a JSON-serialized `ControllerReport`, or `-` for stdin.
    #[arg(default_value = "-")]
    path: String,

    /// Emit the report as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct SpectrumRow {
    signature: String,
    count: u64,
}

impl Report {
    pub fn run(&self) -> anyhow::Result<()> {
        let text = if self.path == "-" {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("failed to read report from stdin")?;
            buf
        } else {
            std::fs::read_to_string(PathBuf::from(&self.path)).with_context(|| format!("failed to read `{}`", self.path))?
        };

        let report: ControllerReport = serde_json::from_str(&text).context("input is not a valid controller report")?;

        if self.json {
            println!("{}", report.to_json()?);
            return Ok(());
        }

        println!("controller: {}", report.name);
        println!("start: {}  end: {}  duration: {}", report.start_time, report.end_time, report.duration);
        println!("total events: {}", report.total_events);

        let rows: Vec<_> = report.spectrum.iter().map(|entry| SpectrumRow { signature: entry.signature.clone(), count: entry.count }).collect();
        println!("{}", Table::new(rows));
        Ok(())
    }
}
