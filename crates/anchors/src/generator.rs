use crate::anchor::SsdAnchor;
use crate::error::AnchorError;
use crate::options::{AnchorOptions, GridSizing};

/// Linear interpolation of the base scale for one layer.
///
/// The guarded denominator keeps a single-layer configuration well-defined:
/// `num_strides == 1` yields `min_scale` for layer 0.
fn calculate_scale(min_scale: f32, max_scale: f32, stride_index: usize, num_strides: usize) -> f32 {
    let denominator = num_strides.saturating_sub(1).max(1) as f32;
    min_scale + (max_scale - min_scale) * stride_index as f32 / denominator
}

/// Generate the SSD prior-box layout described by `options`.
///
/// The result is fully determined by the configuration: layers are visited in
/// ascending order, cells row-major, per-cell anchors in enumeration order.
/// Consecutive layers sharing one stride value are merged into a single grid
/// pass, each contributing its per-cell anchors in layer order; this matches
/// the reference layout that trained models pair their output rows against.
pub fn generate(options: &AnchorOptions) -> Result<Vec<SsdAnchor>, AnchorError> {
    options.validate()?;

    let mut anchors = Vec::new();

    let mut layer_id = 0;
    while layer_id < options.num_layers {
        let mut aspect_ratios = Vec::new();
        let mut scales = Vec::new();

        // For same strides, we merge the anchors in the same order.
        let mut last_same_stride_layer = layer_id;
        while last_same_stride_layer < options.num_layers
            && options.strides[last_same_stride_layer] == options.strides[layer_id]
        {
            let scale = calculate_scale(
                options.min_scale,
                options.max_scale,
                last_same_stride_layer,
                options.num_layers,
            );
            if last_same_stride_layer == 0 && options.reduce_boxes_in_lowest_layer {
                // Fixed override set for the first layer. These are protocol
                // constants of the reference layout, not tunables.
                aspect_ratios.extend_from_slice(&[1.0, 2.0, 0.5]);
                scales.extend_from_slice(&[0.1, scale, scale]);
            } else {
                for &ratio in &options.aspect_ratios {
                    aspect_ratios.push(ratio);
                    scales.push(scale);
                }
                if options.interpolated_scale_aspect_ratio > 0.0 {
                    // One extra in-between-size anchor at the geometric mean
                    // of this layer's and the next layer's base scale. The
                    // layer past the end counts as scale 1.0.
                    let scale_next = if last_same_stride_layer == options.num_layers - 1 {
                        1.0
                    } else {
                        calculate_scale(
                            options.min_scale,
                            options.max_scale,
                            last_same_stride_layer + 1,
                            options.num_layers,
                        )
                    };
                    scales.push((scale * scale_next).sqrt());
                    aspect_ratios.push(options.interpolated_scale_aspect_ratio);
                }
            }
            last_same_stride_layer += 1;
        }

        // (width, height) per per-cell anchor slot.
        let mut anchor_sizes = Vec::with_capacity(aspect_ratios.len());
        for (&ratio, &scale) in aspect_ratios.iter().zip(&scales) {
            let ratio_sqrt = ratio.sqrt();
            anchor_sizes.push((scale * ratio_sqrt, scale / ratio_sqrt));
        }

        let (feature_map_width, feature_map_height) = match &options.grid_sizing {
            GridSizing::Explicit { widths, heights } => (widths[layer_id], heights[layer_id]),
            GridSizing::FromStrides => {
                let stride = options.strides[layer_id];
                (
                    options.input_size_width.div_ceil(stride),
                    options.input_size_height.div_ceil(stride),
                )
            }
        };

        for y in 0..feature_map_height {
            for x in 0..feature_map_width {
                for &(width, height) in &anchor_sizes {
                    let x_center = (x as f32 + options.anchor_offset_x) / feature_map_width as f32;
                    let y_center = (y as f32 + options.anchor_offset_y) / feature_map_height as f32;

                    let (width, height) = if options.fixed_anchor_size {
                        (1.0, 1.0)
                    } else {
                        (width, height)
                    };
                    anchors.push(SsdAnchor::new(x_center, y_center, width, height));
                }
            }
        }

        layer_id = last_same_stride_layer;
    }

    tracing::debug!(
        count = anchors.len(),
        layers = options.num_layers,
        "Generated anchor set"
    );

    Ok(anchors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_layer_options() -> AnchorOptions {
        AnchorOptions {
            input_size_width: 16,
            input_size_height: 16,
            min_scale: 0.3,
            max_scale: 0.9,
            anchor_offset_x: 0.5,
            anchor_offset_y: 0.5,
            num_layers: 1,
            strides: vec![4],
            grid_sizing: GridSizing::FromStrides,
            aspect_ratios: vec![1.0],
            reduce_boxes_in_lowest_layer: false,
            interpolated_scale_aspect_ratio: 0.0,
            fixed_anchor_size: false,
        }
    }

    /// Anchors per cell for each merged same-stride grid pass, computed
    /// independently of the generator's loop.
    fn expected_pass_counts(options: &AnchorOptions) -> Vec<(u32, u32, usize)> {
        let mut passes = Vec::new();
        let mut layer_id = 0;
        while layer_id < options.num_layers {
            let mut per_cell = 0;
            let mut last = layer_id;
            while last < options.num_layers && options.strides[last] == options.strides[layer_id] {
                per_cell += if last == 0 && options.reduce_boxes_in_lowest_layer {
                    3
                } else {
                    options.aspect_ratios.len()
                        + usize::from(options.interpolated_scale_aspect_ratio > 0.0)
                };
                last += 1;
            }
            let (width, height) = match &options.grid_sizing {
                GridSizing::Explicit { widths, heights } => (widths[layer_id], heights[layer_id]),
                GridSizing::FromStrides => (
                    options.input_size_width.div_ceil(options.strides[layer_id]),
                    options
                        .input_size_height
                        .div_ceil(options.strides[layer_id]),
                ),
            };
            passes.push((width, height, per_cell));
            layer_id = last;
        }
        passes
    }

    #[test]
    fn test_face_detection_preset_yields_896_anchors() {
        let anchors = generate(&AnchorOptions::face_detection()).unwrap();
        assert_eq!(
            anchors.len(),
            AnchorOptions::FACE_DETECTION_ANCHOR_COUNT,
            "face detection model expects exactly 896 anchor rows"
        );
    }

    #[test]
    fn test_generation_is_deterministic() {
        let options = AnchorOptions::face_detection();
        let first = generate(&options).unwrap();
        let second = generate(&options).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_anchor_count_matches_formula() {
        let options = AnchorOptions {
            num_layers: 3,
            strides: vec![8, 16, 16],
            input_size_width: 64,
            input_size_height: 48,
            aspect_ratios: vec![1.0, 2.0],
            interpolated_scale_aspect_ratio: 1.0,
            fixed_anchor_size: false,
            ..AnchorOptions::face_detection()
        };
        let anchors = generate(&options).unwrap();

        let expected: usize = expected_pass_counts(&options)
            .iter()
            .map(|&(w, h, per_cell)| w as usize * h as usize * per_cell)
            .sum();
        assert_eq!(anchors.len(), expected);
    }

    #[test]
    fn test_ordering_is_row_major_with_cell_anchors_last() {
        let options = AnchorOptions::face_detection();
        let anchors = generate(&options).unwrap();

        let mut index = 0;
        for (width, height, per_cell) in expected_pass_counts(&options) {
            for y in 0..height {
                for x in 0..width {
                    for _ in 0..per_cell {
                        let anchor = &anchors[index];
                        assert_eq!(
                            anchor.x,
                            (x as f32 + 0.5) / width as f32,
                            "anchor {} out of column order",
                            index
                        );
                        assert_eq!(
                            anchor.y,
                            (y as f32 + 0.5) / height as f32,
                            "anchor {} out of row order",
                            index
                        );
                        index += 1;
                    }
                }
            }
        }
        assert_eq!(index, anchors.len());
    }

    #[test]
    fn test_single_layer_uses_min_scale() {
        let anchors = generate(&single_layer_options()).unwrap();

        // 16 / 4 = 4x4 grid, one aspect ratio, no interpolated anchor.
        assert_eq!(anchors.len(), 16);
        for anchor in &anchors {
            assert!(anchor.width.is_finite() && anchor.height.is_finite());
            assert_eq!(anchor.width, 0.3, "single layer must use min_scale");
            assert_eq!(anchor.height, 0.3);
        }
    }

    #[test]
    fn test_single_layer_interpolated_anchor_uses_unit_next_scale() {
        let options = AnchorOptions {
            interpolated_scale_aspect_ratio: 1.0,
            ..single_layer_options()
        };
        let anchors = generate(&options).unwrap();

        // Two anchors per cell: base scale, then geometric mean with the
        // scale-1.0 sentinel of the layer past the end.
        assert_eq!(anchors.len(), 32);
        assert_eq!(anchors[0].width, 0.3);
        let expected = (0.3f32 * 1.0).sqrt();
        assert!((anchors[1].width - expected).abs() < 1e-6);
    }

    #[test]
    fn test_fixed_anchor_size_forces_unit_boxes() {
        let options = AnchorOptions {
            aspect_ratios: vec![1.0, 2.0, 0.5],
            fixed_anchor_size: true,
            ..single_layer_options()
        };
        let anchors = generate(&options).unwrap();

        // Count and centers still follow the enumeration, sizes do not.
        assert_eq!(anchors.len(), 48);
        assert_eq!(anchors[0].x, 0.125);
        assert_eq!(anchors[0].y, 0.125);
        for anchor in &anchors {
            assert_eq!(anchor.width, 1.0);
            assert_eq!(anchor.height, 1.0);
        }
    }

    #[test]
    fn test_reduce_boxes_in_lowest_layer_overrides() {
        let options = AnchorOptions {
            num_layers: 2,
            strides: vec![8, 16],
            input_size_width: 32,
            input_size_height: 32,
            min_scale: 0.2,
            max_scale: 0.8,
            aspect_ratios: vec![1.0, 2.0, 0.5, 3.0],
            reduce_boxes_in_lowest_layer: true,
            interpolated_scale_aspect_ratio: 0.0,
            fixed_anchor_size: false,
            ..AnchorOptions::face_detection()
        };
        let anchors = generate(&options).unwrap();

        // Layer 0: 4x4 grid with exactly 3 anchors per cell regardless of the
        // configured aspect ratios; layer 1: 2x2 grid with 4 per cell.
        assert_eq!(anchors.len(), 4 * 4 * 3 + 2 * 2 * 4);

        let scale0 = 0.2f32;
        let sqrt2 = 2.0f32.sqrt();
        let first_cell = &anchors[0..3];
        assert!((first_cell[0].width - 0.1).abs() < 1e-6);
        assert!((first_cell[0].height - 0.1).abs() < 1e-6);
        assert!((first_cell[1].width - scale0 * sqrt2).abs() < 1e-6);
        assert!((first_cell[1].height - scale0 / sqrt2).abs() < 1e-6);
        assert!((first_cell[2].width - scale0 / sqrt2).abs() < 1e-6);
        assert!((first_cell[2].height - scale0 * sqrt2).abs() < 1e-6);
    }

    #[test]
    fn test_explicit_feature_map_dims_take_precedence() {
        let options = AnchorOptions {
            grid_sizing: GridSizing::Explicit {
                widths: vec![2],
                heights: vec![3],
            },
            ..single_layer_options()
        };
        let anchors = generate(&options).unwrap();

        // Stride derivation would give a 4x4 grid; the explicit 2x3 wins.
        assert_eq!(anchors.len(), 6);
        assert_eq!(anchors[0].x, 0.25);
        assert_eq!(anchors[0].y, 0.5 / 3.0);
        assert_eq!(anchors[5].x, 0.75);
        assert_eq!(anchors[5].y, 2.5 / 3.0);
    }

    #[test]
    fn test_same_stride_layers_merge_into_one_pass() {
        // Three stride-16 layers on a 32x32 input collapse to a single 2x2
        // pass with one anchor slot contributed per merged layer.
        let options = AnchorOptions {
            num_layers: 3,
            strides: vec![16, 16, 16],
            input_size_width: 32,
            input_size_height: 32,
            aspect_ratios: vec![1.0],
            interpolated_scale_aspect_ratio: 0.0,
            ..single_layer_options()
        };
        let anchors = generate(&options).unwrap();

        assert_eq!(anchors.len(), 2 * 2 * 3);
        // All three slots of the first cell share the same center.
        assert!(anchors[0..3].iter().all(|a| a.x == 0.25 && a.y == 0.25));
        // Slot sizes walk the per-layer scale interpolation.
        assert_eq!(anchors[0].width, 0.3);
        assert!((anchors[1].width - 0.6).abs() < 1e-6);
        assert!((anchors[2].width - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_options_fail_before_generating() {
        let options = AnchorOptions {
            strides: vec![8, 16],
            ..AnchorOptions::face_detection()
        };
        assert_eq!(
            generate(&options),
            Err(AnchorError::StrideCountMismatch {
                expected: 4,
                actual: 2,
            })
        );
    }
}
