//! Doctor accounts: registration, login and profile management
use std::sync::Arc;

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    Doctor, DoctorRecord, LoginRequest, LoginResponse, RegisterDoctorRequest,
    RegisterDoctorResponse, UpdateDoctorRequest,
};
use crate::security::{hash_password, verify_password, JwtKeys};
use crate::store::{filter, Document, DocumentStore, DOCTORS, PATIENTS};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Clone)]
pub struct DoctorService {
    store: Arc<dyn DocumentStore>,
    jwt: Arc<JwtKeys>,
}

fn to_doctor(doc: &Document) -> Result<(Doctor, DoctorRecord)> {
    let record: DoctorRecord = doc.decode()?;
    let doctor = Doctor {
        id: doc.id,
        nom: record.nom.clone(),
        prenom: record.prenom.clone(),
        email: record.email.clone(),
        specialite: record.specialite.clone(),
        created_at: doc.created_at,
        updated_at: doc.updated_at,
    };
    Ok((doctor, record))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl DoctorService {
    pub fn new(store: Arc<dyn DocumentStore>, jwt: Arc<JwtKeys>) -> Self {
        Self { store, jwt }
    }

    pub async fn register(&self, req: RegisterDoctorRequest) -> Result<RegisterDoctorResponse> {
        let email = normalize_email(&req.email);
        let existing = self
            .store
            .find(DOCTORS, filter(json!({ "email": email })))
            .await?;
        if !existing.is_empty() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let record = DoctorRecord {
            nom: req.nom.trim().to_string(),
            prenom: req.prenom.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
            email,
            password_hash: hash_password(&req.password)?,
            specialite: req.specialite.trim().to_string(),
        };

        // The unique index still guards against a concurrent registration
        let doc = self
            .store
            .insert(DOCTORS, serde_json::to_value(&record)?)
            .await?;

        info!(doctor_id = %doc.id, "Doctor registered");
        Ok(RegisterDoctorResponse {
            doctor_id: doc.id,
            nom: record.nom,
            prenom: record.prenom,
            email: record.email,
            specialite: record.specialite,
            message: "Doctor registered successfully".to_string(),
        })
    }

    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse> {
        let email = normalize_email(&req.email);
        let doc = self
            .store
            .find(DOCTORS, filter(json!({ "email": email })))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        let (doctor, record) = to_doctor(&doc)?;
        if !verify_password(&req.password, &record.password_hash)? {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let access_token = self.jwt.issue(doctor.id, &doctor.email)?;
        info!(doctor_id = %doctor.id, "Doctor logged in");

        Ok(LoginResponse {
            doctor_id: doctor.id,
            nom: doctor.nom,
            email: doctor.email,
            access_token,
            token_type: "bearer",
            message: "Login successful".to_string(),
        })
    }

    pub async fn list(&self) -> Result<Vec<Doctor>> {
        self.store
            .find(DOCTORS, filter(json!({})))
            .await?
            .iter()
            .map(|doc| to_doctor(doc).map(|(doctor, _)| doctor))
            .collect()
    }

    pub async fn get(&self, id: Uuid) -> Result<Doctor> {
        let doc = self
            .store
            .get(DOCTORS, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Doctor not found".to_string()))?;
        Ok(to_doctor(&doc)?.0)
    }

    /// Update the caller's own profile.
    pub async fn update(
        &self,
        caller: Uuid,
        id: Uuid,
        req: UpdateDoctorRequest,
    ) -> Result<Doctor> {
        self.ensure_self(caller, id)?;

        let doc = self
            .store
            .get(DOCTORS, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Doctor not found".to_string()))?;
        let (_, mut record) = to_doctor(&doc)?;

        if let Some(nom) = req.nom {
            record.nom = nom.trim().to_string();
        }
        if let Some(prenom) = req.prenom {
            let prenom = prenom.trim().to_string();
            record.prenom = (!prenom.is_empty()).then_some(prenom);
        }
        if let Some(specialite) = req.specialite {
            record.specialite = specialite.trim().to_string();
        }
        if let Some(password) = req.password {
            record.password_hash = hash_password(&password)?;
        }

        let updated = self
            .store
            .replace(DOCTORS, id, serde_json::to_value(&record)?)
            .await?
            .ok_or_else(|| AppError::NotFound("Doctor not found".to_string()))?;
        Ok(to_doctor(&updated)?.0)
    }

    /// Delete the caller's own account together with its patients.
    pub async fn delete(&self, caller: Uuid, id: Uuid) -> Result<()> {
        self.ensure_self(caller, id)?;

        // Patients before the account
        let removed = self
            .store
            .delete_many(PATIENTS, filter(json!({ "doctor_id": id })))
            .await?;
        if !self.store.delete(DOCTORS, id).await? {
            return Err(AppError::NotFound("Doctor not found".to_string()));
        }

        info!(doctor_id = %id, patients_removed = removed, "Doctor deleted");
        Ok(())
    }

    fn ensure_self(&self, caller: Uuid, id: Uuid) -> Result<()> {
        if caller != id {
            return Err(AppError::Forbidden(
                "Doctors can only modify their own account".to_string(),
            ));
        }
        Ok(())
    }
}
