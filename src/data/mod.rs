pub mod accuracy;
pub mod dataset;
pub mod normalizer;

pub use accuracy::AccuracyTester;
pub use dataset::{ClassPosition, Dataset};
pub use normalizer::ClassificationNormalizer;
