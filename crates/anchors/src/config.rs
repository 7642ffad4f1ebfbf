use std::env;
use std::str::FromStr;

pub use common::Environment;

use crate::options::{AnchorOptions, GridSizing};

/// Configuration for the anchor export binary.
///
/// Every anchor parameter can be overridden through the environment; the
/// defaults are the face detection layout.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub environment: Environment,
    pub output_path: String,
    /// When set, the export fails unless the generated set has exactly this
    /// many anchors.
    pub expected_count: Option<usize>,
    pub options: AnchorOptions,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_list<T: FromStr>(name: &str) -> anyhow::Result<Option<Vec<T>>>
where
    T::Err: std::fmt::Display,
{
    let Ok(raw) = env::var(name) else {
        return Ok(None);
    };
    let values = raw
        .split(',')
        .map(|field| {
            field
                .trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("Invalid {} entry '{}': {}", name, field.trim(), e))
        })
        .collect::<anyhow::Result<Vec<T>>>()?;
    Ok(Some(values))
}

impl ExportConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::from_env();
        let defaults = AnchorOptions::face_detection();

        let output_path = env::var("OUTPUT_PATH").unwrap_or_else(|_| "anchors.txt".to_string());

        let expected_count = env::var("EXPECTED_ANCHOR_COUNT")
            .ok()
            .and_then(|s| s.parse().ok());

        let strides = env_list("STRIDES")?.unwrap_or(defaults.strides);
        let aspect_ratios = env_list("ASPECT_RATIOS")?.unwrap_or(defaults.aspect_ratios);

        let grid_sizing = match (
            env_list("FEATURE_MAP_WIDTHS")?,
            env_list("FEATURE_MAP_HEIGHTS")?,
        ) {
            (Some(widths), Some(heights)) => GridSizing::Explicit { widths, heights },
            (None, None) => GridSizing::FromStrides,
            _ => anyhow::bail!(
                "FEATURE_MAP_WIDTHS and FEATURE_MAP_HEIGHTS must be set together"
            ),
        };

        let options = AnchorOptions {
            input_size_width: env_or("INPUT_WIDTH", defaults.input_size_width),
            input_size_height: env_or("INPUT_HEIGHT", defaults.input_size_height),
            min_scale: env_or("MIN_SCALE", defaults.min_scale),
            max_scale: env_or("MAX_SCALE", defaults.max_scale),
            anchor_offset_x: env_or("ANCHOR_OFFSET_X", defaults.anchor_offset_x),
            anchor_offset_y: env_or("ANCHOR_OFFSET_Y", defaults.anchor_offset_y),
            num_layers: env_or("NUM_LAYERS", strides.len()),
            strides,
            grid_sizing,
            aspect_ratios,
            reduce_boxes_in_lowest_layer: env_or(
                "REDUCE_BOXES_IN_LOWEST_LAYER",
                defaults.reduce_boxes_in_lowest_layer,
            ),
            interpolated_scale_aspect_ratio: env_or(
                "INTERPOLATED_SCALE_ASPECT_RATIO",
                defaults.interpolated_scale_aspect_ratio,
            ),
            fixed_anchor_size: env_or("FIXED_ANCHOR_SIZE", defaults.fixed_anchor_size),
        };

        Ok(Self {
            environment,
            output_path,
            expected_count,
            options,
        })
    }

    /// Create default configuration for testing
    #[cfg(test)]
    pub fn test_default() -> Self {
        Self {
            environment: Environment::Development,
            output_path: "anchors.txt".to_string(),
            expected_count: Some(AnchorOptions::FACE_DETECTION_ANCHOR_COUNT),
            options: AnchorOptions::face_detection(),
        }
    }
}
