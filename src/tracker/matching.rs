//! Matching utilities for multi-class tracking.

use std::collections::BTreeMap;

use ndarray::Array2;

use crate::tracker::rect::{Rect, iou_batch};

/// Detection input for the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Class label
    pub label: String,
    /// Bounding box in TLWH format
    pub bbox: Rect,
    /// Detection confidence score
    pub score: f32,
}

impl Detection {
    pub fn new(label: impl Into<String>, bbox: Rect, score: f32) -> Self {
        Self {
            label: label.into(),
            bbox,
            score,
        }
    }

    pub fn from_tlbr(
        label: impl Into<String>,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        score: f32,
    ) -> Self {
        Self::new(label, Rect::from_tlbr(x1, y1, x2, y2), score)
    }
}

/// Compute IoU distance matrix between tracks and detections.
pub fn iou_distance(track_boxes: &[Rect], det_boxes: &[Rect]) -> Array2<f32> {
    iou_batch(track_boxes, det_boxes).mapv(|iou| 1.0 - iou)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Solve a rectangular cost matrix and keep pairs whose cost is at most `thresh`.
///
/// The matrix is padded to square with a prohibitive cost so rows or columns
/// left over go to padding rather than to a real partner.
pub fn linear_assignment(cost_matrix: &Array2<f32>, thresh: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: vec![],
            unmatched_detections: (0..num_cols).collect(),
        };
    }

    if num_cols == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: vec![],
        };
    }

    let size = num_rows.max(num_cols);
    let mut padded = Array2::<f64>::from_elem((size, size), 1e6);

    for i in 0..num_rows {
        for j in 0..num_cols {
            padded[[i, j]] = cost_matrix[[i, j]] as f64;
        }
    }

    let mut matches = vec![];
    let mut unmatched_tracks = vec![];
    let mut unmatched_detections_mask: Vec<bool> = vec![true; num_cols];

    match lapjv::lapjv(&padded) {
        Ok((row_to_col, _)) => {
            for (row_idx, &col_idx) in row_to_col.iter().enumerate().take(num_rows) {
                if col_idx < num_cols && cost_matrix[[row_idx, col_idx]] <= thresh {
                    matches.push((row_idx, col_idx));
                    unmatched_detections_mask[col_idx] = false;
                } else {
                    unmatched_tracks.push(row_idx);
                }
            }
        }
        Err(err) => {
            tracing::warn!(rows = num_rows, cols = num_cols, "assignment solver failed: {err:?}");
            unmatched_tracks = (0..num_rows).collect();
        }
    }

    let unmatched_detections: Vec<usize> = unmatched_detections_mask
        .iter()
        .enumerate()
        .filter_map(|(i, &u)| if u { Some(i) } else { None })
        .collect();

    AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections,
    }
}

/// Match predicted track boxes to detections with `1 - IoU` cost.
///
/// A solved pair is kept only when its IoU reaches `iou_threshold`, i.e. its
/// cost is at most `1 - iou_threshold`; otherwise both sides are reported
/// unmatched.
pub fn iou_assignment(
    track_boxes: &[Rect],
    det_boxes: &[Rect],
    iou_threshold: f32,
) -> AssignmentResult {
    let costs = iou_distance(track_boxes, det_boxes);
    linear_assignment(&costs, 1.0 - iou_threshold)
}

/// Match tracks to detections independently within each label.
///
/// `track_labels[i]` / `track_boxes[i]` describe track `i`, likewise for
/// detections. Indices in the result refer to these input slices, so a pair
/// can only ever join a track and a detection of the same label.
pub fn associate_by_label(
    track_labels: &[&str],
    track_boxes: &[Rect],
    det_labels: &[&str],
    det_boxes: &[Rect],
    iou_threshold: f32,
) -> AssignmentResult {
    let mut groups: BTreeMap<&str, (Vec<usize>, Vec<usize>)> = BTreeMap::new();
    for (i, &label) in track_labels.iter().enumerate() {
        groups.entry(label).or_default().0.push(i);
    }
    for (j, &label) in det_labels.iter().enumerate() {
        groups.entry(label).or_default().1.push(j);
    }

    let mut result = AssignmentResult::default();
    for (tracks, dets) in groups.values() {
        let group_tracks: Vec<Rect> = tracks.iter().map(|&i| track_boxes[i]).collect();
        let group_dets: Vec<Rect> = dets.iter().map(|&j| det_boxes[j]).collect();
        let group = iou_assignment(&group_tracks, &group_dets, iou_threshold);

        result
            .matches
            .extend(group.matches.into_iter().map(|(t, d)| (tracks[t], dets[d])));
        result
            .unmatched_tracks
            .extend(group.unmatched_tracks.into_iter().map(|t| tracks[t]));
        result
            .unmatched_detections
            .extend(group.unmatched_detections.into_iter().map(|d| dets[d]));
    }

    result.matches.sort_unstable();
    result.unmatched_tracks.sort_unstable();
    result.unmatched_detections.sort_unstable();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes(coords: &[(f32, f32)]) -> Vec<Rect> {
        coords.iter().map(|&(x, y)| Rect::new(x, y, 10.0, 10.0)).collect()
    }

    #[test]
    fn test_iou_distance() {
        let dists = iou_distance(&boxes(&[(0.0, 0.0)]), &boxes(&[(0.0, 0.0), (100.0, 100.0)]));
        assert!(dists[[0, 0]].abs() < 1e-6);
        assert!((dists[[0, 1]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_linear_assignment_empty_inputs() {
        let result = linear_assignment(&Array2::zeros((0, 2)), 0.5);
        assert_eq!(result.unmatched_detections, vec![0, 1]);
        assert!(result.matches.is_empty());

        let result = linear_assignment(&Array2::zeros((3, 0)), 0.5);
        assert_eq!(result.unmatched_tracks, vec![0, 1, 2]);
    }

    #[test]
    fn test_linear_assignment_picks_global_optimum() {
        // Greedy on row 0 would take column 0 (0.1) and force row 1 onto 0.9.
        let costs = ndarray::array![[0.1_f32, 0.2], [0.15, 0.9]];
        let result = linear_assignment(&costs, 1.0);
        assert_eq!(result.matches, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn test_linear_assignment_rejects_pairs_above_thresh() {
        // The optimum pairs (0, 0) and (1, 1); the second costs too much.
        let costs = ndarray::array![[0.1_f32, 0.9], [0.9, 0.8]];
        let result = linear_assignment(&costs, 0.7);
        assert_eq!(result.matches, vec![(0, 0)]);
        assert_eq!(result.unmatched_tracks, vec![1]);
        assert_eq!(result.unmatched_detections, vec![1]);
    }

    #[test]
    fn test_iou_assignment_threshold_controls_gate() {
        // IoU of these two is 25 / 175, about 0.143.
        let tracks = vec![Rect::new(0.0, 0.0, 10.0, 10.0)];
        let dets = vec![Rect::new(5.0, 5.0, 10.0, 10.0)];
        assert_eq!(iou_assignment(&tracks, &dets, 0.1).matches, vec![(0, 0)]);
        assert!(iou_assignment(&tracks, &dets, 0.2).matches.is_empty());
    }

    #[test]
    fn test_iou_assignment_matches_overlapping_boxes() {
        let tracks = boxes(&[(0.0, 0.0), (50.0, 50.0)]);
        let dets = boxes(&[(51.0, 50.0), (1.0, 0.0), (200.0, 200.0)]);
        let result = iou_assignment(&tracks, &dets, 0.3);
        assert_eq!(result.matches, vec![(0, 1), (1, 0)]);
        assert!(result.unmatched_tracks.is_empty());
        assert_eq!(result.unmatched_detections, vec![2]);
    }

    #[test]
    fn test_iou_assignment_gates_low_overlap() {
        // IoU of these two is 25 / 175, below the gate.
        let tracks = vec![Rect::new(0.0, 0.0, 10.0, 10.0)];
        let dets = vec![Rect::new(5.0, 5.0, 10.0, 10.0)];
        let result = iou_assignment(&tracks, &dets, 0.3);
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_tracks, vec![0]);
        assert_eq!(result.unmatched_detections, vec![0]);
    }

    #[test]
    fn test_associate_never_crosses_labels() {
        let track_boxes = boxes(&[(0.0, 0.0), (100.0, 0.0)]);
        let det_boxes = boxes(&[(0.0, 0.0), (100.0, 0.0)]);
        let result = associate_by_label(&["A", "B"], &track_boxes, &["B", "B"], &det_boxes, 0.3);
        // Detection 0 sits exactly on track 0 but carries the other label.
        assert_eq!(result.matches, vec![(1, 1)]);
        assert_eq!(result.unmatched_tracks, vec![0]);
        assert_eq!(result.unmatched_detections, vec![0]);
    }

    #[test]
    fn test_associate_is_deterministic() {
        let track_boxes = boxes(&[(0.0, 0.0), (0.0, 0.0)]);
        let det_boxes = boxes(&[(0.0, 0.0), (0.0, 0.0)]);
        let first = associate_by_label(&["A", "A"], &track_boxes, &["A", "A"], &det_boxes, 0.3);
        for _ in 0..10 {
            let again = associate_by_label(&["A", "A"], &track_boxes, &["A", "A"], &det_boxes, 0.3);
            assert_eq!(again, first);
        }
        assert_eq!(first.matches.len(), 2);
    }
}
