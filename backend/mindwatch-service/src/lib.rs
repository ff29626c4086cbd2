//! mindwatch-service: social-post mental-health analysis plus doctor and
//! patient records.

pub mod classifier;
pub mod config;
pub mod error;
pub mod feed;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod security;
pub mod services;
pub mod store;

use std::sync::Arc;

pub use config::Config;
pub use error::{AppError, Result};

use classifier::Classifier;
use feed::FeedClient;
use security::JwtKeys;
use services::{AnalysisPipeline, DoctorService, PatientService};
use store::DocumentStore;

/// Process-wide handles, built once at startup and shared through `web::Data`.
pub struct AppState {
    pub pipeline: AnalysisPipeline,
    pub doctors: DoctorService,
    pub patients: PatientService,
    pub jwt: Arc<JwtKeys>,
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        feed: Arc<dyn FeedClient>,
        classifier: Arc<Classifier>,
        jwt: JwtKeys,
    ) -> Self {
        let jwt = Arc::new(jwt);
        Self {
            pipeline: AnalysisPipeline::new(feed, classifier),
            doctors: DoctorService::new(store.clone(), jwt.clone()),
            patients: PatientService::new(store.clone()),
            jwt,
            store,
        }
    }
}
