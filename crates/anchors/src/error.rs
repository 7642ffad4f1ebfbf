use thiserror::Error;

/// Configuration errors surfaced at generation time.
///
/// These are programmer errors in the detector configuration, not recoverable
/// runtime conditions: a malformed configuration must never silently produce
/// a truncated anchor set, because downstream decoding pairs anchors
/// positionally with model output rows.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnchorError {
    #[error("Number of layers must be at least 1")]
    NoLayers,

    #[error("Input size must be positive, got {width}x{height}")]
    InvalidInputSize { width: u32, height: u32 },

    #[error("Expected {expected} strides, got {actual}")]
    StrideCountMismatch { expected: usize, actual: usize },

    #[error("Stride for layer {layer} must be positive")]
    ZeroStride { layer: usize },

    #[error("Expected {expected} feature map dimensions, got {widths} widths and {heights} heights")]
    FeatureMapCountMismatch {
        expected: usize,
        widths: usize,
        heights: usize,
    },

    #[error("Feature map for layer {layer} has a zero dimension")]
    ZeroGridDimension { layer: usize },

    #[error("Aspect ratios must not be empty")]
    EmptyAspectRatios,

    #[error("Aspect ratios must be positive, got {ratio}")]
    NonPositiveAspectRatio { ratio: f32 },

    #[error("Scales must satisfy 0 < min <= max <= 1, got min {min_scale} max {max_scale}")]
    InvalidScaleRange { min_scale: f32, max_scale: f32 },
}
