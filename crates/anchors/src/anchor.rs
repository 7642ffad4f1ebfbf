use ndarray::Array2;

/// A single SSD prior box: normalized center plus normalized box size.
///
/// Detection models predict offsets against these fixed reference boxes, so
/// an anchor sequence is always paired index-for-index with the rows of the
/// model's regression and score tensors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SsdAnchor {
    /// Normalized center x in `[0, 1]`.
    pub x: f32,
    /// Normalized center y in `[0, 1]`.
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl SsdAnchor {
    /// Tolerance used by [`SsdAnchor::approx_eq`].
    pub const EPSILON: f32 = 1e-5;

    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Compare two anchors by the squared magnitude of their field-wise
    /// difference. Returns false in the presence of NaN values.
    pub fn approx_eq(&self, other: &SsdAnchor) -> bool {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dw = self.width - other.width;
        let dh = self.height - other.height;
        let sqr_mag = dx * dx + dy * dy + dw * dw + dh * dh;
        sqr_mag < Self::EPSILON * Self::EPSILON
    }
}

/// Pack an anchor sequence into an `(n, 4)` array of `x, y, width, height`
/// rows, matching the row layout of the model output tensors the anchors are
/// decoded against.
pub fn to_array(anchors: &[SsdAnchor]) -> Array2<f32> {
    let mut array = Array2::zeros((anchors.len(), 4));
    for (i, anchor) in anchors.iter().enumerate() {
        array[[i, 0]] = anchor.x;
        array[[i, 1]] = anchor.y;
        array[[i, 2]] = anchor.width;
        array[[i, 3]] = anchor.height;
    }
    array
}
