//! Integration tests for the vellum reconciliation engine

mod cli_commands;
mod conflict_merge;
mod scan_pass;
mod scheduler_coalescing;
mod tombstone_table;
