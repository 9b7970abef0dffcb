// src/routes/roles.rs
use crate::auth::AdminUser;
use crate::db;
use crate::error::AppError;
use crate::models::users::{CreateRoleRequest, Role};
use crate::routes::{not_found_unless, require_text};
use actix_web::{HttpResponse, delete, get, post, web};
use sqlx::PgPool;
use uuid::Uuid;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_roles);
    cfg.service(create_role);
    cfg.service(delete_role);
}

#[get("/roles")]
pub async fn list_roles(pool: web::Data<PgPool>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(db::users::list_roles(&pool).await?))
}

#[post("/roles")]
pub async fn create_role(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    req: web::Json<CreateRoleRequest>,
) -> Result<HttpResponse, AppError> {
    require_text("name", &req.name, 50)?;
    let role = Role {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
    };
    db::users::create_role(&pool, &role).await?;
    Ok(HttpResponse::Created().json(role))
}

#[delete("/roles/{id}")]
pub async fn delete_role(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let role_id = path.into_inner();
    if db::users::count_users_with_role(&pool, role_id).await? > 0 {
        return Err(AppError::Conflict("Role is still assigned to users".into()));
    }
    not_found_unless(db::users::delete_role(&pool, role_id).await?, "Role")?;
    Ok(HttpResponse::NoContent().finish())
}
