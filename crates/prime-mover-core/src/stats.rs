//! Event spectrum and source-chain tracking (spec.md §4.5).
//!
//! Both are opt-in per [`crate::config::Config`] — spec.md is explicit that
//! source tracking "increase[s] memory" and debug traces are "significantly
//! expensive", so neither is collected unless the controller asks for it.

use ahash::AHashMap;

use crate::time::Time;

/// Per-signature dispatch counts, incremented only when an event's body
/// runs to completion (spec.md §4.5 open question, resolved in
/// SPEC_FULL.md §4.5.1: suspending does not count, only the dispatch that
/// finally produces `Outcome::Done` does).
#[derive(Default)]
pub struct Spectrum {
    counts: AHashMap<&'static str, u64>,
    total: u64,
}

impl Spectrum {
    pub fn record(&mut self, signature: &'static str) {
        *self.counts.entry(signature).or_insert(0) += 1;
        self.total += 1;
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn count(&self, signature: &str) -> u64 {
        self.counts.get(signature).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.counts.iter().map(|(&sig, &count)| (sig, count))
    }
}

/// One entry in the source-chain arena.
///
/// `caller` points at the arena index of whichever event's dispatch posted
/// this one, or `None` for a top-level post — spec.md §4.5's "chain from
/// any event back to the triggering top-level post".
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub signature: &'static str,
    pub time: Time,
    pub caller: Option<usize>,
}

/// Append-only arena of every dispatched event's provenance.
///
/// A plain growable `Vec` rather than anything fancier: entries are never
/// removed mid-run, only ever walked backwards from a leaf, which is
/// exactly what an arena of indices is for.
#[derive(Default)]
pub struct SourceArena {
    entries: Vec<SourceEntry>,
}

impl SourceArena {
    pub fn push(&mut self, signature: &'static str, time: Time, caller: Option<usize>) -> usize {
        let index = self.entries.len();
        self.entries.push(SourceEntry { signature, time, caller });
        index
    }

    pub fn get(&self, index: usize) -> Option<&SourceEntry> {
        self.entries.get(index)
    }

    /// Walk the chain from `index` back to its triggering top-level post,
    /// nearest first.
    pub fn chain(&self, index: usize) -> Vec<&SourceEntry> {
        let mut out = Vec::new();
        let mut cursor = Some(index);
        while let Some(i) = cursor {
            let Some(entry) = self.entries.get(i) else { break };
            out.push(entry);
            cursor = entry.caller;
        }
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
