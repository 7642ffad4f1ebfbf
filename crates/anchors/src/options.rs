use crate::error::AnchorError;

/// How per-layer grid dimensions are obtained.
///
/// Modeled as two named strategies instead of a nullable dimension list so a
/// zero-length list cannot be confused with "derive from strides".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GridSizing {
    /// Derive `ceil(input_size / stride)` per layer.
    #[default]
    FromStrides,
    /// Explicit per-layer grid dimensions, each of length `num_layers`.
    Explicit { widths: Vec<u32>, heights: Vec<u32> },
}

/// Declarative description of an SSD anchor layout.
///
/// Constructed once with the literal values a model was trained against and
/// never mutated afterwards; [`crate::generator::generate`] turns it into the
/// anchor sequence the model's output tensors are decoded against.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorOptions {
    /// Network input resolution in pixels.
    pub input_size_width: u32,
    pub input_size_height: u32,

    /// Endpoints of the per-layer scale interpolation, each in `(0, 1]`.
    pub min_scale: f32,
    pub max_scale: f32,

    /// Sub-pixel center offset within each grid cell, typically 0.5.
    pub anchor_offset_x: f32,
    pub anchor_offset_y: f32,

    /// Number of feature-map layers to generate anchors for.
    pub num_layers: usize,
    /// Downsampling stride per layer, length `num_layers`. Layers with equal
    /// strides are merged into a single grid pass.
    pub strides: Vec<u32>,
    pub grid_sizing: GridSizing,

    /// Candidate width/height ratios applied per layer.
    pub aspect_ratios: Vec<f32>,

    /// Use the fixed 3-anchor override set for layer 0 instead of the
    /// generic aspect-ratio enumeration.
    pub reduce_boxes_in_lowest_layer: bool,
    /// When positive, adds one extra anchor per cell sized at the geometric
    /// mean of this layer's and the next layer's base scale.
    pub interpolated_scale_aspect_ratio: f32,
    /// Emit every anchor with width = height = 1.0 regardless of scale and
    /// aspect ratio. Anchor count and centers are unaffected.
    pub fixed_anchor_size: bool,
}

impl AnchorOptions {
    /// Anchor layout for the 128x128 BlazeFace face detection model.
    ///
    /// Must produce exactly [`Self::FACE_DETECTION_ANCHOR_COUNT`] anchors to
    /// line up with the model's 896 output rows.
    pub fn face_detection() -> Self {
        Self {
            input_size_width: 128,
            input_size_height: 128,
            min_scale: 0.1484375,
            max_scale: 0.75,
            anchor_offset_x: 0.5,
            anchor_offset_y: 0.5,
            num_layers: 4,
            strides: vec![8, 16, 16, 16],
            grid_sizing: GridSizing::FromStrides,
            aspect_ratios: vec![1.0],
            reduce_boxes_in_lowest_layer: false,
            interpolated_scale_aspect_ratio: 1.0,
            fixed_anchor_size: true,
        }
    }

    /// Output rows of the face detection model.
    pub const FACE_DETECTION_ANCHOR_COUNT: usize = 896;

    /// Check the configuration invariants before generation.
    pub fn validate(&self) -> Result<(), AnchorError> {
        if self.num_layers == 0 {
            return Err(AnchorError::NoLayers);
        }
        if self.input_size_width == 0 || self.input_size_height == 0 {
            return Err(AnchorError::InvalidInputSize {
                width: self.input_size_width,
                height: self.input_size_height,
            });
        }
        if self.strides.len() != self.num_layers {
            return Err(AnchorError::StrideCountMismatch {
                expected: self.num_layers,
                actual: self.strides.len(),
            });
        }
        if let Some(layer) = self.strides.iter().position(|&s| s == 0) {
            return Err(AnchorError::ZeroStride { layer });
        }
        if let GridSizing::Explicit { widths, heights } = &self.grid_sizing {
            if widths.len() != self.num_layers || heights.len() != self.num_layers {
                return Err(AnchorError::FeatureMapCountMismatch {
                    expected: self.num_layers,
                    widths: widths.len(),
                    heights: heights.len(),
                });
            }
            for layer in 0..self.num_layers {
                if widths[layer] == 0 || heights[layer] == 0 {
                    return Err(AnchorError::ZeroGridDimension { layer });
                }
            }
        }
        // The lowest-layer override only covers layer 0; any other layer
        // enumerates the configured aspect ratios.
        let generic_path_reachable = self.num_layers > 1 || !self.reduce_boxes_in_lowest_layer;
        if generic_path_reachable && self.aspect_ratios.is_empty() {
            return Err(AnchorError::EmptyAspectRatios);
        }
        if let Some(&ratio) = self.aspect_ratios.iter().find(|&&r| r <= 0.0) {
            return Err(AnchorError::NonPositiveAspectRatio { ratio });
        }
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale && self.max_scale <= 1.0) {
            return Err(AnchorError::InvalidScaleRange {
                min_scale: self.min_scale,
                max_scale: self.max_scale,
            });
        }
        Ok(())
    }
}
