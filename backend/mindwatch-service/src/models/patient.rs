use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::AnalysisResult;

/// Patient document body as persisted in the `patients` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    pub doctor_id: Uuid,
    pub patient_name: String,
    #[serde(default)]
    pub twitter_username: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub last_analysis: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Patient {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_name: String,
    pub twitter_username: Option<String>,
    pub notes: Option<String>,
    pub last_analysis: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePatientRequest {
    #[validate(length(min = 1, max = 200, message = "patient_name is required"))]
    pub patient_name: String,
    #[validate(length(max = 15))]
    #[serde(default)]
    pub twitter_username: Option<String>,
    #[validate(length(max = 5000))]
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePatientRequest {
    #[validate(length(min = 1, max = 200))]
    pub patient_name: Option<String>,
    #[validate(length(max = 15))]
    pub twitter_username: Option<String>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

/// Attach an analysis to a patient, creating the patient by name if needed.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SaveAnalysisRequest {
    #[validate(length(min = 1, max = 200, message = "patient_name is required"))]
    pub patient_name: String,
    pub analysis_data: AnalysisResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveAnalysisResponse {
    pub message: String,
    pub patient_id: Uuid,
    pub created: bool,
}
