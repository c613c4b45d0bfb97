/// Bounding box representation with format conversion utilities.
///
/// Supports the formats the tracker moves between:
/// - TLWH: Top-Left X, Top-Left Y, Width, Height
/// - TLBR: Top-Left X, Top-Left Y, Bottom-Right X, Bottom-Right Y
/// - Z: Center X, Center Y, Area (w*h), Aspect Ratio (w/h), the Kalman measurement
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
}

/// Smallest area/aspect a filter state is rendered with.
const MIN_EXTENT: f64 = 1e-6;

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR format (top-left x, top-left y, bottom-right x, bottom-right y).
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Create a Rect from the measurement form `[cx, cy, area, aspect_ratio]`.
    ///
    /// Non-positive area or aspect ratio is clamped so that any filter state
    /// renders as a (tiny) valid box.
    pub fn from_z(z: [f64; 4]) -> Self {
        let area = z[2].max(MIN_EXTENT);
        let aspect = z[3].max(MIN_EXTENT);
        let width = (area * aspect).sqrt();
        let height = area / width;
        Self {
            x: (z[0] - width / 2.0) as f32,
            y: (z[1] - height / 2.0) as f32,
            width: width as f32,
            height: height as f32,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Convert to TLWH format: (x, y, width, height).
    #[inline]
    pub fn to_tlwh(&self) -> [f32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// Convert to the measurement form: (center_x, center_y, area, aspect_ratio).
    #[inline]
    pub fn to_z(&self) -> [f64; 4] {
        let (cx, cy) = self.center();
        let aspect = if self.height > 0.0 {
            self.width as f64 / self.height as f64
        } else {
            0.0
        };
        let area = self.width as f64 * self.height as f64;
        [cx as f64, cy as f64, area, aspect]
    }

    /// Get the center point of the bounding box.
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Get the area of the bounding box.
    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// A box is usable by the tracker when both sides are strictly positive
    /// and its corners and area are finite.
    pub fn is_valid(&self) -> bool {
        let [_, _, x2, y2] = self.to_tlbr();
        self.x.is_finite()
            && self.y.is_finite()
            && self.width > 0.0
            && self.height > 0.0
            && x2.is_finite()
            && y2.is_finite()
            && self.area().is_finite()
    }

    /// Calculate Intersection over Union (IoU) with another bounding box.
    pub fn iou(&self, other: &Rect) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let inter_width = (x2 - x1).max(0.0);
        let inter_height = (y2 - y1).max(0.0);
        let inter_area = inter_width * inter_height;

        let union_area = self.area() + other.area() - inter_area;

        if union_area > 0.0 {
            inter_area / union_area
        } else {
            0.0
        }
    }
}

use ndarray::Array2;

/// Calculate IoU matrix between two sets of bounding boxes.
///
/// Returns a matrix of shape (M, N) where M is the length of `boxes_a`
/// and N is the length of `boxes_b`.
pub fn iou_batch(boxes_a: &[Rect], boxes_b: &[Rect]) -> Array2<f32> {
    let mut ious = Array2::zeros((boxes_a.len(), boxes_b.len()));
    for (i, a) in boxes_a.iter().enumerate() {
        for (j, b) in boxes_b.iter().enumerate() {
            ious[[i, j]] = a.iou(b);
        }
    }
    ious
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_conversions() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);

        assert_eq!(rect.to_tlwh(), [10.0, 20.0, 30.0, 40.0]);
        assert_eq!(rect.to_tlbr(), [10.0, 20.0, 40.0, 60.0]);

        let z = rect.to_z();
        assert_eq!(z[0], 25.0); // cx
        assert_eq!(z[1], 40.0); // cy
        assert_eq!(z[2], 1200.0); // area
        assert!((z[3] - 0.75).abs() < 1e-9); // aspect ratio = 30/40
    }

    #[test]
    fn test_from_tlbr() {
        let rect = Rect::from_tlbr(10.0, 20.0, 40.0, 60.0);
        assert_eq!(rect.to_tlwh(), [10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_from_z() {
        let rect = Rect::from_z([25.0, 40.0, 1200.0, 0.75]);
        assert!((rect.x - 10.0).abs() < 1e-4);
        assert!((rect.y - 20.0).abs() < 1e-4);
        assert!((rect.width - 30.0).abs() < 1e-4);
        assert!((rect.height - 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_from_z_clamps_degenerate_state() {
        let rect = Rect::from_z([5.0, 5.0, -3.0, 0.0]);
        assert!(rect.width > 0.0);
        assert!(rect.height > 0.0);
    }

    #[test]
    fn test_is_valid() {
        assert!(Rect::new(0.0, 0.0, 1.0, 1.0).is_valid());
        assert!(!Rect::new(0.0, 0.0, 0.0, 1.0).is_valid());
        assert!(!Rect::new(0.0, 0.0, 5.0, -1.0).is_valid());
        assert!(!Rect::new(f32::NAN, 0.0, 5.0, 5.0).is_valid());
        assert!(!Rect::new(0.0, 0.0, f32::INFINITY, 5.0).is_valid());
        // Finite sides whose product overflows f32.
        assert!(!Rect::new(0.0, 0.0, 1e20, 1e20).is_valid());
        assert!(!Rect::new(f32::MAX, 0.0, f32::MAX, 1.0).is_valid());
    }

    #[test]
    fn test_to_z_area_in_f64() {
        // 83_810_205 is not representable in f32.
        let rect = Rect::new(0.0, 0.0, 12345.0, 6789.0);
        assert_eq!(rect.to_z()[2], 83_810_205.0);
    }

    #[test]
    fn test_iou() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);

        // Intersection: 5x5 = 25
        // Union: 100 + 100 - 25 = 175
        let iou = a.iou(&b);
        assert!((iou - 25.0 / 175.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 10.0, 10.0);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_same_box() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_batch_shape() {
        let a = [Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(50.0, 50.0, 10.0, 10.0)];
        let b = [Rect::new(0.0, 0.0, 10.0, 10.0)];
        let ious = iou_batch(&a, &b);
        assert_eq!(ious.dim(), (2, 1));
        assert!((ious[[0, 0]] - 1.0).abs() < 1e-6);
        assert_eq!(ious[[1, 0]], 0.0);
    }
}
