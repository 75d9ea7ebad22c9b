use ndarray::ArrayD;

/// Top class of a score vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub class_id: usize,
    pub confidence: f32,
}

/// Arg-max over scores taken in scan order.
///
/// Ties go to the first index; NaN never wins. Returns `None` for an empty
/// or all-NaN input.
pub fn top_class<'a, I>(scores: I) -> Option<Prediction>
where
    I: IntoIterator<Item = &'a f32>,
{
    let mut best: Option<Prediction> = None;
    for (class_id, &confidence) in scores.into_iter().enumerate() {
        if confidence.is_nan() {
            continue;
        }
        if best.is_none_or(|b| confidence > b.confidence) {
            best = Some(Prediction {
                class_id,
                confidence,
            });
        }
    }
    best
}

/// Arg-max over an output tensor flattened to a single `1 x K` row.
///
/// With a batch of identical images the first image's maximum wins the tie,
/// so the class id stays within `0..K`.
pub fn top_class_of(scores: &ArrayD<f32>) -> Option<Prediction> {
    top_class(scores.iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};

    #[test]
    fn test_unique_maximum() {
        let prediction = top_class(&[0.1, 0.9, 0.05]).unwrap();
        assert_eq!(prediction.class_id, 1);
        assert_eq!(prediction.confidence, 0.9);
    }

    #[test]
    fn test_ties_pick_first_index() {
        let prediction = top_class(&[0.3, 0.7, 0.7, 0.1]).unwrap();
        assert_eq!(prediction.class_id, 1, "First maximum in scan order should win");
    }

    #[test]
    fn test_negative_scores() {
        let prediction = top_class(&[-3.0, -1.5, -2.0]).unwrap();
        assert_eq!(prediction.class_id, 1);
        assert_eq!(prediction.confidence, -1.5);
    }

    #[test]
    fn test_nan_is_skipped() {
        let prediction = top_class(&[f32::NAN, 0.2, f32::NAN, 0.4]).unwrap();
        assert_eq!(prediction.class_id, 3);
        assert!(top_class(&[f32::NAN, f32::NAN]).is_none());
    }

    #[test]
    fn test_empty_scores() {
        assert!(top_class(&[]).is_none());
    }

    #[test]
    fn test_tensor_is_flattened_in_row_major_order() {
        let scores =
            Array::from_shape_vec(IxDyn(&[1, 1, 4]), vec![2.0, 1.0, 5.0, 5.0]).unwrap();
        let prediction = top_class_of(&scores).unwrap();
        assert_eq!(prediction.class_id, 2);
    }

    #[test]
    fn test_identical_batch_keeps_first_image_class() {
        let scores =
            Array::from_shape_vec(IxDyn(&[3, 3]), [0.1, 0.9, 0.05].repeat(3)).unwrap();
        let prediction = top_class_of(&scores).unwrap();
        assert_eq!(prediction.class_id, 1);
    }
}
