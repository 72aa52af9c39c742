//! Score-based mask filtering

use segmesh_core::MaskRecord;
use tracing::debug;

/// Keep masks whose score is at least `threshold`, preserving order
pub fn filter_by_confidence(masks: Vec<MaskRecord>, threshold: f32) -> Vec<MaskRecord> {
    let total = masks.len();
    let kept: Vec<MaskRecord> = masks
        .into_iter()
        .filter(|mask| {
            let keep = mask.score >= threshold;
            if !keep {
                debug!(
                    "Dropping mask {} ('{}'): score {:.3} < {:.3}",
                    mask.index, mask.label, mask.score, threshold
                );
            }
            keep
        })
        .collect();
    debug!("Kept {} of {} masks at threshold {:.3}", kept.len(), total, threshold);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use segmesh_core::{BBox, MaskGrid};

    fn mask(index: usize, score: f32) -> MaskRecord {
        MaskRecord::new(
            index,
            MaskGrid::filled(1, 1, 1.0),
            format!("m{}", index),
            score,
            BBox::new(0, 0, 1, 1),
        )
    }

    #[test]
    fn test_filter_keeps_order_and_boundary() {
        let masks = vec![mask(0, 0.9), mask(1, 0.2), mask(2, 0.5), mask(3, 0.49)];
        let kept = filter_by_confidence(masks, 0.5);
        let indices: Vec<usize> = kept.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn test_filter_empty_input() {
        assert!(filter_by_confidence(Vec::new(), 0.5).is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let masks = vec![mask(0, 0.1), mask(1, 0.7), mask(2, 0.8)];
        let once = filter_by_confidence(masks, 0.6);
        let once_indices: Vec<usize> = once.iter().map(|m| m.index).collect();
        let twice = filter_by_confidence(once, 0.6);
        let twice_indices: Vec<usize> = twice.iter().map(|m| m.index).collect();
        assert_eq!(once_indices, twice_indices);
    }
}
