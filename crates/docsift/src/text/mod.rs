pub mod normalize;
pub mod quality;

pub use normalize::{count_characters, count_words, normalize_text, strip_control_characters};
pub use quality::{QualityAssessor, QualityThresholds, assess_quality};
