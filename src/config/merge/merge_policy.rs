//! Merge rules: defaults, override order.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("system.storage.document_path", ".vellum/document")?
        .set_default("system.storage.ledger_path", ".vellum/known_paths.json")?
        .set_default("reconcile.ledger_save_retries", 3)?
        .set_default("reconcile.ledger_retry_backoff_ms", 25)?
        .set_default("reconcile.flush_interval_ms", 30_000)
}
