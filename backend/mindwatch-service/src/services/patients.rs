//! Patients, always scoped to the doctor who owns them
use std::sync::Arc;

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    CreatePatientRequest, Patient, PatientRecord, SaveAnalysisRequest, SaveAnalysisResponse,
    UpdatePatientRequest,
};
use crate::store::{filter, Document, DocumentStore, PATIENTS};

#[derive(Clone)]
pub struct PatientService {
    store: Arc<dyn DocumentStore>,
}

fn to_patient(doc: &Document) -> Result<(Patient, PatientRecord)> {
    let record: PatientRecord = doc.decode()?;
    let patient = Patient {
        id: doc.id,
        doctor_id: record.doctor_id,
        patient_name: record.patient_name.clone(),
        twitter_username: record.twitter_username.clone(),
        notes: record.notes.clone(),
        last_analysis: record.last_analysis.clone(),
        created_at: doc.created_at,
        updated_at: doc.updated_at,
    };
    Ok((patient, record))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl PatientService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// The doctor's patients, newest first.
    pub async fn list(&self, doctor_id: Uuid) -> Result<Vec<Patient>> {
        self.store
            .find(PATIENTS, filter(json!({ "doctor_id": doctor_id })))
            .await?
            .iter()
            .map(|doc| to_patient(doc).map(|(patient, _)| patient))
            .collect()
    }

    pub async fn create(&self, doctor_id: Uuid, req: CreatePatientRequest) -> Result<Patient> {
        let record = PatientRecord {
            doctor_id,
            patient_name: req.patient_name.trim().to_string(),
            twitter_username: non_empty(req.twitter_username),
            notes: req.notes,
            last_analysis: None,
        };
        let doc = self
            .store
            .insert(PATIENTS, serde_json::to_value(&record)?)
            .await?;

        info!(doctor_id = %doctor_id, patient_id = %doc.id, "Patient created");
        Ok(to_patient(&doc)?.0)
    }

    /// Another doctor's patient is reported as missing.
    pub async fn get(&self, doctor_id: Uuid, id: Uuid) -> Result<Patient> {
        Ok(self.owned(doctor_id, id).await?.0)
    }

    pub async fn update(
        &self,
        doctor_id: Uuid,
        id: Uuid,
        req: UpdatePatientRequest,
    ) -> Result<Patient> {
        let (_, mut record) = self.owned(doctor_id, id).await?;

        if let Some(name) = req.patient_name {
            record.patient_name = name.trim().to_string();
        }
        if req.twitter_username.is_some() {
            record.twitter_username = non_empty(req.twitter_username);
        }
        if let Some(notes) = req.notes {
            record.notes = Some(notes);
        }

        let doc = self
            .store
            .replace(PATIENTS, id, serde_json::to_value(&record)?)
            .await?
            .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))?;
        Ok(to_patient(&doc)?.0)
    }

    pub async fn delete(&self, doctor_id: Uuid, id: Uuid) -> Result<()> {
        self.owned(doctor_id, id).await?;
        if !self.store.delete(PATIENTS, id).await? {
            return Err(AppError::NotFound("Patient not found".to_string()));
        }
        info!(doctor_id = %doctor_id, patient_id = %id, "Patient deleted");
        Ok(())
    }

    /// Store an analysis on the doctor's patient with that name,
    /// creating the patient first when there is none.
    pub async fn save_analysis(
        &self,
        doctor_id: Uuid,
        req: SaveAnalysisRequest,
    ) -> Result<SaveAnalysisResponse> {
        let patient_name = req.patient_name.trim().to_string();
        let analysis = serde_json::to_value(&req.analysis_data)?;
        let twitter_username = non_empty(Some(req.analysis_data.username));

        let existing = self
            .store
            .find(
                PATIENTS,
                filter(json!({ "doctor_id": doctor_id, "patient_name": patient_name })),
            )
            .await?
            .into_iter()
            .next();

        let (patient_id, created) = match existing {
            Some(doc) => {
                let (_, mut record) = to_patient(&doc)?;
                record.last_analysis = Some(analysis);
                if twitter_username.is_some() {
                    record.twitter_username = twitter_username;
                }
                self.store
                    .replace(PATIENTS, doc.id, serde_json::to_value(&record)?)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))?;
                (doc.id, false)
            }
            None => {
                let record = PatientRecord {
                    doctor_id,
                    patient_name,
                    twitter_username,
                    notes: None,
                    last_analysis: Some(analysis),
                };
                let doc = self
                    .store
                    .insert(PATIENTS, serde_json::to_value(&record)?)
                    .await?;
                (doc.id, true)
            }
        };

        info!(doctor_id = %doctor_id, patient_id = %patient_id, created, "Analysis saved");
        Ok(SaveAnalysisResponse {
            message: "Analysis saved successfully".to_string(),
            patient_id,
            created,
        })
    }

    async fn owned(&self, doctor_id: Uuid, id: Uuid) -> Result<(Patient, PatientRecord)> {
        let doc = self
            .store
            .get(PATIENTS, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))?;
        let (patient, record) = to_patient(&doc)?;
        if record.doctor_id != doctor_id {
            return Err(AppError::NotFound("Patient not found".to_string()));
        }
        Ok((patient, record))
    }
}
