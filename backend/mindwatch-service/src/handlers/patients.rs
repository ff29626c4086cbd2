use actix_web::{web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use super::analyze::normalize_username;
use crate::error::Result;
use crate::middleware::{AuthenticatedDoctor, JwtAuthMiddleware};
use crate::models::{CreatePatientRequest, SaveAnalysisRequest, UpdatePatientRequest};
use crate::AppState;

/// GET /api/patients/
pub async fn list_patients(
    state: web::Data<AppState>,
    doctor: AuthenticatedDoctor,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.patients.list(doctor.0).await?))
}

/// POST /api/patients/
pub async fn create_patient(
    state: web::Data<AppState>,
    doctor: AuthenticatedDoctor,
    req: web::Json<CreatePatientRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;
    let patient = state.patients.create(doctor.0, req).await?;
    Ok(HttpResponse::Created().json(patient))
}

/// GET /api/patients/{id}
pub async fn get_patient(
    state: web::Data<AppState>,
    doctor: AuthenticatedDoctor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.patients.get(doctor.0, path.into_inner()).await?))
}

/// PUT /api/patients/{id}
pub async fn update_patient(
    state: web::Data<AppState>,
    doctor: AuthenticatedDoctor,
    path: web::Path<Uuid>,
    req: web::Json<UpdatePatientRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;
    let patient = state
        .patients
        .update(doctor.0, path.into_inner(), req)
        .await?;
    Ok(HttpResponse::Ok().json(patient))
}

/// DELETE /api/patients/{id}
pub async fn delete_patient(
    state: web::Data<AppState>,
    doctor: AuthenticatedDoctor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    state.patients.delete(doctor.0, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/patients/save_analysis
pub async fn save_analysis(
    state: web::Data<AppState>,
    doctor: AuthenticatedDoctor,
    req: web::Json<SaveAnalysisRequest>,
) -> Result<HttpResponse> {
    let mut req = req.into_inner();
    req.validate()?;
    req.analysis_data.username = normalize_username(&req.analysis_data.username)?;
    let saved = state.patients.save_analysis(doctor.0, req).await?;
    Ok(HttpResponse::Ok().json(saved))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/patients")
            .wrap(JwtAuthMiddleware)
            .route("", web::get().to(list_patients))
            .route("", web::post().to(create_patient))
            .route("/", web::get().to(list_patients))
            .route("/", web::post().to(create_patient))
            // Registered before `/{id}` so the literal segment wins
            .route("/save_analysis", web::post().to(save_analysis))
            .route("/{id}", web::get().to(get_patient))
            .route("/{id}", web::put().to(update_patient))
            .route("/{id}", web::delete().to(delete_patient)),
    );
}
