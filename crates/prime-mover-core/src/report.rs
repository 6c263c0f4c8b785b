//! Controller reports (spec.md §6, "CLI / reporting").
//!
//! `serde` derives with `rename_all = "camelCase"` get the exact JSON key
//! names spec.md pins down (`startTime`, `endTime`, `totalEvents`); `Display`
//! renders the same information as indented text for `prime-mover-cli`,
//! mirroring `durable-cli`'s pattern of deriving a human table from the same
//! struct it serializes for machine consumption.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::Time;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerReport {
    pub name: String,
    pub start_time: Time,
    pub end_time: Time,
    pub duration: u64,
    pub total_events: u64,
    /// Sorted by count descending, per spec.md §6.
    pub spectrum: Vec<SpectrumEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectrumEntry {
    pub signature: String,
    pub count: u64,
}

impl ControllerReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ControllerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "controller report: {}", self.name)?;
        writeln!(f, "  start:  {}", self.start_time)?;
        writeln!(f, "  end:    {}", self.end_time)?;
        writeln!(f, "  duration: {} ticks", self.duration)?;
        writeln!(f, "  events: {}", self.total_events)?;
        if self.spectrum.is_empty() {
            writeln!(f, "  spectrum: (empty)")?;
        } else {
            writeln!(f, "  spectrum:")?;
            for entry in &self.spectrum {
                writeln!(f, "    {:>8}  {}", entry.count, entry.signature)?;
            }
        }
        Ok(())
    }
}
