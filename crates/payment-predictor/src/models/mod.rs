pub mod classifier_trait;
pub mod factory;
pub mod gbdt;

pub use classifier_trait::{Classifier, TrainableClassifier};
