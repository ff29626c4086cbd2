pub mod analysis;
pub mod doctor;
pub mod patient;
pub mod post;

pub use analysis::{AnalysisResult, Classification, Distribution, Label, Prediction};
pub use doctor::*;
pub use patient::*;
pub use post::Post;
