use actix_web::{web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use crate::error::Result;
use crate::middleware::{AuthenticatedDoctor, JwtAuthMiddleware};
use crate::models::{LoginRequest, RegisterDoctorRequest, UpdateDoctorRequest};
use crate::AppState;

/// POST /api/register/doctor
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterDoctorRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;
    let created = state.doctors.register(req).await?;
    Ok(HttpResponse::Created().json(created))
}

/// POST /api/login/doctor
pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;
    let session = state.doctors.login(req).await?;
    Ok(HttpResponse::Ok().json(session))
}

/// GET /api/doctors
pub async fn list_doctors(
    state: web::Data<AppState>,
    _doctor: AuthenticatedDoctor,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.doctors.list().await?))
}

/// GET /api/doctors/{id}
pub async fn get_doctor(
    state: web::Data<AppState>,
    _doctor: AuthenticatedDoctor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.doctors.get(path.into_inner()).await?))
}

/// PUT /api/doctors/{id}
pub async fn update_doctor(
    state: web::Data<AppState>,
    doctor: AuthenticatedDoctor,
    path: web::Path<Uuid>,
    req: web::Json<UpdateDoctorRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    req.validate()?;
    let updated = state
        .doctors
        .update(doctor.0, path.into_inner(), req)
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /api/doctors/{id}
pub async fn delete_doctor(
    state: web::Data<AppState>,
    doctor: AuthenticatedDoctor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    state.doctors.delete(doctor.0, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/register/doctor", web::post().to(register))
        .route("/api/login/doctor", web::post().to(login))
        .service(
            web::scope("/api/doctors")
                .wrap(JwtAuthMiddleware)
                .route("", web::get().to(list_doctors))
                .route("/", web::get().to(list_doctors))
                .route("/{id}", web::get().to(get_doctor))
                .route("/{id}", web::put().to(update_doctor))
                .route("/{id}", web::delete().to(delete_doctor)),
        );
}
