//! Build artefact interface (spec.md §6).
//!
//! `#[prime_mover::entity]` emits one `AlreadyTransformed` const per
//! transformed `impl` block, recording the ordinal→signature table it
//! generated. The kernel crate depends on this type but never constructs
//! one itself — only `prime-mover-macros`-generated code does.

/// Marker recording that an `impl` block has already been processed by
/// `#[prime_mover::entity]`, and the ordinal table it was processed with.
///
/// Unlike the bytecode-rewriting source system, a single Rust compilation
/// unit has no separate incremental-rebuild staleness problem — the macro
/// detects "already transformed" by the presence of this const item
/// itself, not by comparing a timestamp against a source file's mtime.
/// `generated_at` is therefore kept for human debugging only.
#[derive(Debug, Clone, Copy)]
pub struct AlreadyTransformed {
    /// Human-readable build timestamp, informational only.
    pub generated_at: &'static str,
    /// Ordinal index (the position in this slice) to the method's
    /// recorded signature.
    pub ordinals: &'static [(&'static str, &'static str)],
}

impl AlreadyTransformed {
    pub const fn new(generated_at: &'static str, ordinals: &'static [(&'static str, &'static str)]) -> Self {
        Self { generated_at, ordinals }
    }

    pub fn signature_for(&self, ordinal: usize) -> Option<&'static str> {
        self.ordinals.get(ordinal).map(|(_, signature)| *signature)
    }
}
