//! Algorithm hyperparameters sent with every tuning job.

use std::collections::BTreeMap;

use crate::domain::AnnotationType;

/// Largest mini-batch worth searching over.
pub const MAX_BATCH_SIZE: usize = 128;

const CLASSIFICATION_STATIC: &[(&str, &str)] = &[
    ("num_layers", "50"),
    ("use_pretrained_model", "1"),
    ("image_shape", "3,224,224"),
    ("epochs", "50"),
    ("lr_scheduler_step", "10"),
    ("lr_scheduler_factor", "0.8"),
    ("resize", "224"),
    ("augmentation_type", "crop_color_transform"),
    ("precision_dtype", "float32"),
    ("multi_label", "1"),
];

const OBJECT_DETECTION_STATIC: &[(&str, &str)] = &[
    ("base_network", "resnet-50"),
    ("use_pretrained_model", "1"),
    ("image_shape", "512"),
    ("epochs", "100"),
    ("lr_scheduler_step", "10"),
    ("lr_scheduler_factor", "0.8"),
    ("overlap_threshold", "0.5"),
    ("nms_threshold", "0.45"),
];

/// Static hyperparameters merged with the per-run values.
///
/// `label_width` is only set for object detection.
pub fn build(
    algorithm: AnnotationType,
    num_classes: usize,
    num_training_samples: usize,
    padding_width: Option<usize>,
) -> BTreeMap<String, String> {
    let fixed = match algorithm {
        AnnotationType::Classification => CLASSIFICATION_STATIC,
        AnnotationType::BoundingBox => OBJECT_DETECTION_STATIC,
    };
    let mut params: BTreeMap<String, String> = fixed
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    params.insert("num_classes".into(), num_classes.to_string());
    params.insert("num_training_samples".into(), num_training_samples.to_string());
    if algorithm.is_object_detection()
        && let Some(width) = padding_width
    {
        params.insert("label_width".into(), width.to_string());
    }
    params
}

/// Inclusive search range for `mini_batch_size`.
pub fn mini_batch_size_range(
    num_training_samples: usize,
    num_validation_samples: usize,
) -> (usize, usize) {
    let max = num_training_samples
        .min(num_validation_samples)
        .min(MAX_BATCH_SIZE);
    let min = max.min(8).saturating_sub(1).max(1);
    (min, max.max(min))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_gets_dynamic_counts_without_label_width() {
        let params = build(AnnotationType::Classification, 4, 120, Some(400));
        assert_eq!(params["num_classes"], "4");
        assert_eq!(params["num_training_samples"], "120");
        assert_eq!(params["multi_label"], "1");
        assert!(!params.contains_key("label_width"));
    }

    #[test]
    fn detection_sets_label_width() {
        let params = build(AnnotationType::BoundingBox, 2, 10, Some(352));
        assert_eq!(params["label_width"], "352");
        assert_eq!(params["nms_threshold"], "0.45");
    }

    #[test]
    fn batch_range_is_bounded_by_smallest_partition() {
        assert_eq!(mini_batch_size_range(500, 300), (7, 128));
        assert_eq!(mini_batch_size_range(40, 5), (4, 5));
        assert_eq!(mini_batch_size_range(1, 1), (1, 1));
    }
}
