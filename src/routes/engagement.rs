// src/routes/engagement.rs
use crate::auth::{AdminUser, AuthUser};
use crate::db;
use crate::error::AppError;
use crate::models::engagement::{
    CreateAnswerRequest, CreateNoteRequest, CreateQuestionRequest, QuestionFilter,
    UpdateNoteRequest,
};
use crate::routes::{not_found_unless, require_text};
use crate::target::{ContentTarget, TargetRef};
use actix_web::{HttpResponse, delete, get, post, put, web};
use sqlx::PgPool;
use uuid::Uuid;

pub const MAX_BODY: usize = 5000;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(add_favorite);
    cfg.service(my_favorites);
    cfg.service(remove_favorite);

    cfg.service(create_note);
    cfg.service(my_notes);
    cfg.service(update_note);
    cfg.service(delete_note);

    cfg.service(ask_question);
    cfg.service(my_questions);
    cfg.service(list_questions);
    cfg.service(answer_question);
    cfg.service(delete_question);
}

#[post("/favorites")]
pub async fn add_favorite(
    pool: web::Data<PgPool>,
    caller: AuthUser,
    req: web::Json<TargetRef>,
) -> Result<HttpResponse, AppError> {
    let target = ContentTarget::try_from(req.into_inner())?;
    let favorite = db::engagement::insert_favorite(&pool, caller.id, target).await?;
    Ok(HttpResponse::Created().json(favorite))
}

#[get("/favorites/me")]
pub async fn my_favorites(pool: web::Data<PgPool>, caller: AuthUser) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(db::engagement::list_favorites_for_user(&pool, caller.id).await?))
}

#[delete("/favorites/{id}")]
pub async fn remove_favorite(
    pool: web::Data<PgPool>,
    caller: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    not_found_unless(
        db::engagement::delete_favorite(&pool, path.into_inner(), caller.id).await?,
        "Favorite",
    )?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/notes")]
pub async fn create_note(
    pool: web::Data<PgPool>,
    caller: AuthUser,
    req: web::Json<CreateNoteRequest>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    require_text("body", &req.body, MAX_BODY)?;
    let target = ContentTarget::try_from(req.target)?;
    let note = db::engagement::insert_note(&pool, caller.id, target, req.body.trim()).await?;
    Ok(HttpResponse::Created().json(note))
}

#[get("/notes/me")]
pub async fn my_notes(pool: web::Data<PgPool>, caller: AuthUser) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(db::engagement::list_notes_for_user(&pool, caller.id).await?))
}

#[put("/notes/{id}")]
pub async fn update_note(
    pool: web::Data<PgPool>,
    caller: AuthUser,
    path: web::Path<Uuid>,
    req: web::Json<UpdateNoteRequest>,
) -> Result<HttpResponse, AppError> {
    require_text("body", &req.body, MAX_BODY)?;
    let note = db::engagement::update_note(&pool, path.into_inner(), caller.id, req.body.trim())
        .await?
        .ok_or(AppError::NotFound("Note"))?;
    Ok(HttpResponse::Ok().json(note))
}

#[delete("/notes/{id}")]
pub async fn delete_note(
    pool: web::Data<PgPool>,
    caller: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    not_found_unless(
        db::engagement::delete_note(&pool, path.into_inner(), caller.id).await?,
        "Note",
    )?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/questions")]
pub async fn ask_question(
    pool: web::Data<PgPool>,
    caller: AuthUser,
    req: web::Json<CreateQuestionRequest>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    require_text("body", &req.body, MAX_BODY)?;
    let target = ContentTarget::try_from(req.target)?;
    let id = db::engagement::insert_question(&pool, caller.id, target, req.body.trim()).await?;
    let question = db::engagement::get_question(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Question"))?;
    Ok(HttpResponse::Created().json(question))
}

#[get("/questions/me")]
pub async fn my_questions(pool: web::Data<PgPool>, caller: AuthUser) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(db::engagement::list_questions_for_user(&pool, caller.id).await?))
}

/// Moderation queue; `?unanswered=true` hides questions that already have an answer.
#[get("/questions")]
pub async fn list_questions(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    filter: web::Query<QuestionFilter>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(db::engagement::list_all_questions(&pool, filter.unanswered).await?))
}

#[post("/questions/{id}/answers")]
pub async fn answer_question(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    path: web::Path<Uuid>,
    req: web::Json<CreateAnswerRequest>,
) -> Result<HttpResponse, AppError> {
    require_text("body", &req.body, MAX_BODY)?;
    let question_id = path.into_inner();
    db::engagement::get_question(&pool, question_id)
        .await?
        .ok_or(AppError::NotFound("Question"))?;
    let answer =
        db::engagement::insert_answer(&pool, question_id, admin.0.id, req.body.trim()).await?;
    Ok(HttpResponse::Created().json(answer))
}

#[delete("/questions/{id}")]
pub async fn delete_question(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    not_found_unless(
        db::engagement::delete_question(&pool, path.into_inner()).await?,
        "Question",
    )?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::{AccountStatus, USER_ROLE};
    use crate::test_support::{bearer, bearer_for, lazy_pool, test_accounts, test_tokens};
    use actix_web::{App, http::StatusCode, test};
    use serde_json::json;

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(lazy_pool()))
                    .app_data(web::Data::new(test_tokens()))
                    .app_data(web::Data::new(test_accounts()))
                    .app_data(crate::routes::json_config())
                    .app_data(crate::routes::query_config())
                    .configure(init_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn favorite_needs_exactly_one_target() {
        let app = app!();
        for body in [
            json!({}),
            json!({ "episode_id": Uuid::new_v4(), "article_id": Uuid::new_v4() }),
        ] {
            let req = test::TestRequest::post()
                .uri("/favorites")
                .insert_header(bearer(Uuid::new_v4(), USER_ROLE))
                .set_json(body)
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[actix_web::test]
    async fn disabled_user_cannot_post_notes() {
        let app = app!();
        let disabled = AccountStatus {
            is_active: false,
            role: USER_ROLE.to_string(),
        };
        let req = test::TestRequest::post()
            .uri("/notes")
            .insert_header(bearer_for(Uuid::new_v4(), USER_ROLE, disabled))
            .set_json(json!({ "article_id": Uuid::new_v4(), "body": "still here" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn note_body_is_bounded() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/notes")
            .insert_header(bearer(Uuid::new_v4(), USER_ROLE))
            .set_json(json!({ "article_id": Uuid::new_v4(), "body": "x".repeat(MAX_BODY + 1) }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn moderation_list_is_admin_only() {
        let app = app!();
        let req = test::TestRequest::get()
            .uri("/questions?unanswered=true")
            .insert_header(bearer(Uuid::new_v4(), USER_ROLE))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn answering_is_admin_only() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri(&format!("/questions/{}/answers", Uuid::new_v4()))
            .insert_header(bearer(Uuid::new_v4(), USER_ROLE))
            .set_json(json!({ "body": "Thanks for asking" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }
}
