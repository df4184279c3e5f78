pub mod detector;
pub mod log;

pub use detector::{DetectionRules, ThresholdBand};
pub use log::{ActivityEvent, ActivityLog};
