pub mod analysis;
pub mod doctors;
pub mod patients;

pub use analysis::{summarize, AnalysisPipeline, Stage};
pub use doctors::DoctorService;
pub use patients::PatientService;
