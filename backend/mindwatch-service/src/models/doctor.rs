use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Doctor document body as persisted in the `doctors` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorRecord {
    pub nom: String,
    #[serde(default)]
    pub prenom: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub specialite: String,
}

/// Public view of a doctor account. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct Doctor {
    pub id: Uuid,
    pub nom: String,
    pub prenom: Option<String>,
    pub email: String,
    pub specialite: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterDoctorRequest {
    #[validate(length(min = 1, max = 100, message = "nom is required"))]
    pub nom: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub prenom: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "specialite is required"))]
    pub specialite: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterDoctorResponse {
    #[serde(rename = "doctorId")]
    pub doctor_id: Uuid,
    pub nom: String,
    pub prenom: Option<String>,
    pub email: String,
    pub specialite: String,
    pub message: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    #[serde(rename = "doctorId")]
    pub doctor_id: Uuid,
    pub nom: String,
    pub email: String,
    pub access_token: String,
    pub token_type: &'static str,
    pub message: String,
}

/// Partial profile update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateDoctorRequest {
    #[validate(length(min = 1, max = 100))]
    pub nom: Option<String>,
    #[validate(length(max = 100))]
    pub prenom: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub specialite: Option<String>,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_request() -> RegisterDoctorRequest {
        RegisterDoctorRequest {
            nom: "Martin".into(),
            prenom: Some("Claire".into()),
            email: "claire.martin@example.com".into(),
            password: "correct-horse".into(),
            specialite: "Psychiatrie".into(),
        }
    }

    #[test]
    fn test_register_request_valid() {
        assert!(register_request().validate().is_ok());
    }

    #[test]
    fn test_register_request_rejects_short_password() {
        let req = RegisterDoctorRequest {
            password: "short".into(),
            ..register_request()
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_register_request_rejects_bad_email() {
        let req = RegisterDoctorRequest {
            email: "not-an-email".into(),
            ..register_request()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_request_skips_absent_fields() {
        assert!(UpdateDoctorRequest::default().validate().is_ok());

        let req = UpdateDoctorRequest {
            nom: Some(String::new()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
