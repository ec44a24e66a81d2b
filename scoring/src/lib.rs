pub mod classifier;
pub mod error;
pub mod executable_utils;
pub mod features;
pub mod model;
pub mod notifier;
pub mod predictor;
pub mod scorers;
