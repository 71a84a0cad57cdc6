//! Per-intake JSONL trail of store mutations.

pub mod writer;
