//! Environment variable source: VELLUM_* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// `VELLUM__RECONCILE__REPLICA_ID=laptop` sets `reconcile.replica_id`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix("VELLUM")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    ))
}
