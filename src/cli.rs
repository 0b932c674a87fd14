//! CLI domain: parse, route, output, and presentation only.
//! No reconciliation logic; a single route table dispatches to the Reconciler.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_ledger_json, format_ledger_text, format_merge_json, format_merge_text,
    format_pass_json, format_pass_text, format_status_json, format_status_text,
};
pub use route::RunContext;
