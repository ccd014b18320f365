//! Command implementations behind the `phishprobe` binary.

pub mod cli;
