use std::path::Path;

use anchors::config::ExportConfig;
use anchors::{generate, serialization};
use common::setup_logging;

fn main() -> anyhow::Result<()> {
    let config = ExportConfig::from_env()?;

    setup_logging(config.environment.clone());

    tracing::info!(
        config = ?config,
        "Loaded configuration"
    );

    let anchors = generate(&config.options)?;

    if let Some(expected) = config.expected_count {
        anyhow::ensure!(
            anchors.len() == expected,
            "Anchor count mismatch: expected {}, got {}",
            expected,
            anchors.len()
        );
    }

    serialization::write_anchors_file(Path::new(&config.output_path), &anchors)?;

    tracing::info!(
        count = anchors.len(),
        path = %config.output_path,
        "Anchor set written"
    );

    Ok(())
}
