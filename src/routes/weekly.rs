// src/routes/weekly.rs
use crate::auth::{AdminUser, AuthUser};
use crate::db;
use crate::db::content::OrderedTable;
use crate::error::AppError;
use crate::models::content::{
    AssignWeeklyContentRequest, IdResponse, Task, WeeklyContent, WeeklyContentDetails,
    WeeklyContentInput, WeeklyQuestion, WeeklyQuestionAnswerInput,
};
use crate::ordering;
use crate::routes::{not_found_unless, require_positive, require_text};
use actix_web::{HttpResponse, delete, get, post, put, web};
use sqlx::PgPool;
use uuid::Uuid;

const MAX_ANSWER: usize = 5000;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(current);
    cfg.service(assign);
    cfg.service(id_by_order);
    cfg.service(list_weekly_contents);
    cfg.service(create_weekly_content);
    cfg.service(details);
    cfg.service(get_weekly_content);
    cfg.service(update_weekly_content);
    cfg.service(delete_weekly_content);

    cfg.service(answer_question);
    cfg.service(my_answers);
    cfg.service(all_answers);
}

async fn resolve(pool: &PgPool, weekly: WeeklyContent) -> Result<WeeklyContentDetails, AppError> {
    let music = match weekly.music_id {
        Some(id) => db::content::get_music(pool, id).await?,
        None => None,
    };
    let movie = match weekly.movie_id {
        Some(id) => db::content::get_movie(pool, id).await?,
        None => None,
    };
    let task: Option<Task> = match weekly.task_id {
        Some(id) => db::content::get_ordered(pool, OrderedTable::Tasks, id).await?,
        None => None,
    };
    let weekly_question: Option<WeeklyQuestion> = match weekly.weekly_question_id {
        Some(id) => db::content::get_ordered(pool, OrderedTable::WeeklyQuestions, id).await?,
        None => None,
    };

    Ok(WeeklyContentDetails {
        id: weekly.id,
        week_order: weekly.week_order,
        music,
        movie,
        task,
        weekly_question,
    })
}

#[get("/weekly-contents/current")]
pub async fn current(pool: web::Data<PgPool>, caller: AuthUser) -> Result<HttpResponse, AppError> {
    let user = crate::routes::users::load_active_user(&pool, &caller).await?;
    let weekly_id = user
        .weekly_content_id
        .ok_or(AppError::NotFound("Weekly content"))?;
    let weekly = db::weekly::get_weekly_content(&pool, weekly_id)
        .await?
        .ok_or(AppError::NotFound("Weekly content"))?;
    Ok(HttpResponse::Ok().json(resolve(&pool, weekly).await?))
}

#[put("/weekly-contents/assign")]
pub async fn assign(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    req: web::Json<AssignWeeklyContentRequest>,
) -> Result<HttpResponse, AppError> {
    db::weekly::get_weekly_content(&pool, req.weekly_content_id)
        .await?
        .ok_or(AppError::NotFound("Weekly content"))?;
    not_found_unless(
        db::users::assign_weekly_content(&pool, req.user_id, req.weekly_content_id).await?,
        "User",
    )?;
    tracing::info!("Assigned weekly content {} to user {}", req.weekly_content_id, req.user_id);
    Ok(HttpResponse::NoContent().finish())
}

#[get("/weekly-contents/by-order/{order}")]
pub async fn id_by_order(
    pool: web::Data<PgPool>,
    _user: AuthUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = db::weekly::get_weekly_content_id_by_order(&pool, path.into_inner())
        .await?
        .ok_or(AppError::NotFound("Weekly content"))?;
    Ok(HttpResponse::Ok().json(IdResponse { id }))
}

#[get("/weekly-contents")]
pub async fn list_weekly_contents(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(db::weekly::list_weekly_contents(&pool).await?))
}

#[get("/weekly-contents/{id}")]
pub async fn get_weekly_content(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let weekly = db::weekly::get_weekly_content(&pool, path.into_inner())
        .await?
        .ok_or(AppError::NotFound("Weekly content"))?;
    Ok(HttpResponse::Ok().json(weekly))
}

#[get("/weekly-contents/{id}/details")]
pub async fn details(
    pool: web::Data<PgPool>,
    _user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let weekly = db::weekly::get_weekly_content(&pool, path.into_inner())
        .await?
        .ok_or(AppError::NotFound("Weekly content"))?;
    Ok(HttpResponse::Ok().json(resolve(&pool, weekly).await?))
}

#[post("/weekly-contents")]
pub async fn create_weekly_content(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    req: web::Json<WeeklyContentInput>,
) -> Result<HttpResponse, AppError> {
    require_positive("week_order", req.week_order)?;
    let week_order = match req.week_order {
        Some(order) => order,
        None => ordering::next_order(db::weekly::get_max_week_order(&pool).await?),
    };
    let id = Uuid::new_v4();
    db::weekly::insert_weekly_content(&pool, id, &req, week_order).await?;

    let weekly = db::weekly::get_weekly_content(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Weekly content"))?;
    Ok(HttpResponse::Created().json(weekly))
}

#[put("/weekly-contents/{id}")]
pub async fn update_weekly_content(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
    req: web::Json<WeeklyContentInput>,
) -> Result<HttpResponse, AppError> {
    require_positive("week_order", req.week_order)?;
    let id = path.into_inner();
    not_found_unless(db::weekly::update_weekly_content(&pool, id, &req).await?, "Weekly content")?;
    let weekly = db::weekly::get_weekly_content(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Weekly content"))?;
    Ok(HttpResponse::Ok().json(weekly))
}

/// Users assigned to this bundle fall back to none.
#[delete("/weekly-contents/{id}")]
pub async fn delete_weekly_content(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    not_found_unless(
        db::weekly::delete_weekly_content(&pool, path.into_inner()).await?,
        "Weekly content",
    )?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/weekly-question-answers")]
pub async fn answer_question(
    pool: web::Data<PgPool>,
    caller: AuthUser,
    req: web::Json<WeeklyQuestionAnswerInput>,
) -> Result<HttpResponse, AppError> {
    require_text("answer", &req.answer, MAX_ANSWER)?;
    let answer = db::weekly::upsert_weekly_answer(
        &pool,
        caller.id,
        req.weekly_question_id,
        req.answer.trim(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(answer))
}

#[get("/weekly-question-answers/me")]
pub async fn my_answers(pool: web::Data<PgPool>, caller: AuthUser) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(db::weekly::list_weekly_answers_for_user(&pool, caller.id).await?))
}

#[get("/weekly-question-answers")]
pub async fn all_answers(pool: web::Data<PgPool>, _admin: AdminUser) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(db::weekly::list_all_weekly_answers(&pool).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::{ADMIN_ROLE, USER_ROLE};
    use crate::test_support::{bearer, lazy_pool, test_accounts, test_tokens};
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
                    .configure(init_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn assign_is_admin_only() {
        let app = app!();
        let req = test::TestRequest::put()
            .uri("/weekly-contents/assign")
            .insert_header(bearer(Uuid::new_v4(), USER_ROLE))
            .set_json(json!({ "user_id": Uuid::new_v4(), "weekly_content_id": Uuid::new_v4() }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn blank_answer_is_rejected() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/weekly-question-answers")
            .insert_header(bearer(Uuid::new_v4(), USER_ROLE))
            .set_json(json!({ "weekly_question_id": Uuid::new_v4(), "answer": "" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn zero_week_order_is_rejected() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/weekly-contents")
            .insert_header(bearer(Uuid::new_v4(), ADMIN_ROLE))
            .set_json(json!({ "week_order": 0 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
