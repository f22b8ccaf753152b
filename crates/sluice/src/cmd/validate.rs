//! Validate command - check a configuration file
//!
//! Loads the file, runs config validation and builds the processor chain.
//! No broker is contacted; Kafka client construction is left to `run`.
//!
//! # Usage
//!
//! ```bash
//! sluice validate
//! sluice validate --config configs/replay.yml
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use sluice_config::Config;
use sluice_processor::{Chain, create_default_registry};

/// Run the validate command
pub fn run(config_path: &Path) -> Result<()> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("invalid configuration: {}", config_path.display()))?;

    // Processor option errors are startup errors too; surface them here
    let registry = create_default_registry();
    let chain = Chain::from_configs(&registry, &config.processors)
        .with_context(|| format!("invalid configuration: {}", config_path.display()))?;

    println!("{}: OK", config_path.display());
    println!(
        "  input:      {} @ {}",
        config.input.topic,
        config.input.brokers.join(",")
    );
    let names = chain.names();
    if names.is_empty() {
        println!("  processors: (none)");
    } else {
        println!("  processors: {}", names.join(" -> "));
    }
    println!(
        "  output:     {} @ {}",
        config.output.topic,
        config.output.brokers.join(",")
    );

    Ok(())
}
