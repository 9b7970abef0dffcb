// src/routes/podcasts.rs
use crate::access;
use crate::auth::{AdminUser, AuthUser};
use crate::cache::ContentCache;
use crate::db;
use crate::error::{AppError, AppResult};
use crate::models::podcasts::{
    EpisodeListing, PodcastEpisode, PodcastEpisodeInput, PodcastSeries, PodcastSeriesInput,
    SeriesListening,
};
use crate::ordering;
use crate::routes::{not_found_unless, require_positive, require_text};
use crate::target::AccessScope;
use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_series);
    cfg.service(create_series);
    cfg.service(series_episodes);
    cfg.service(listen);
    cfg.service(get_series);
    cfg.service(update_series);
    cfg.service(delete_series);

    cfg.service(create_episode);
    cfg.service(get_episode);
    cfg.service(update_episode);
    cfg.service(delete_episode);
}

fn validate_series(input: &PodcastSeriesInput) -> AppResult<()> {
    require_text("title", &input.title, 300)?;
    require_text("description", &input.description, 5000)
}

fn validate_episode(input: &PodcastEpisodeInput) -> AppResult<()> {
    require_text("title", &input.title, 300)?;
    require_text("description", &input.description, 5000)?;
    require_positive("sequence_number", input.sequence_number)
}

/// Listening view of `episodes` for a caller whose counter is `current`.
pub fn listing(episodes: Vec<PodcastEpisode>, current: i32) -> Vec<EpisodeListing> {
    episodes
        .into_iter()
        .map(|episode| {
            let locked = !access::is_unlocked(episode.sequence_number, current);
            EpisodeListing {
                id: episode.id,
                title: episode.title,
                description: episode.description,
                sequence_number: episode.sequence_number,
                locked,
                content: (!locked).then(|| episode.content.0),
            }
        })
        .collect()
}

#[get("/podcast-series")]
pub async fn list_series(
    pool: web::Data<PgPool>,
    cache: web::Data<ContentCache>,
    _user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let series = match cache.series().await {
        Some(series) => series,
        None => cache.put_series(db::podcasts::list_series(&pool).await?).await,
    };
    Ok(HttpResponse::Ok().json(&*series))
}

#[get("/podcast-series/{id}")]
pub async fn get_series(
    pool: web::Data<PgPool>,
    _user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let series = db::podcasts::get_series(&pool, path.into_inner())
        .await?
        .ok_or(AppError::NotFound("Podcast series"))?;
    Ok(HttpResponse::Ok().json(series))
}

#[post("/podcast-series")]
pub async fn create_series(
    pool: web::Data<PgPool>,
    cache: web::Data<ContentCache>,
    _admin: AdminUser,
    req: web::Json<PodcastSeriesInput>,
) -> Result<HttpResponse, AppError> {
    validate_series(&req)?;
    let id = Uuid::new_v4();
    db::podcasts::insert_series(&pool, id, &req).await?;
    cache.invalidate_series().await;

    let series = db::podcasts::get_series(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Podcast series"))?;
    Ok(HttpResponse::Created().json(series))
}

#[put("/podcast-series/{id}")]
pub async fn update_series(
    pool: web::Data<PgPool>,
    cache: web::Data<ContentCache>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
    req: web::Json<PodcastSeriesInput>,
) -> Result<HttpResponse, AppError> {
    validate_series(&req)?;
    let id = path.into_inner();
    not_found_unless(db::podcasts::update_series(&pool, id, &req).await?, "Podcast series")?;
    cache.invalidate_series().await;

    let series = db::podcasts::get_series(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Podcast series"))?;
    Ok(HttpResponse::Ok().json(series))
}

#[delete("/podcast-series/{id}")]
pub async fn delete_series(
    pool: web::Data<PgPool>,
    cache: web::Data<ContentCache>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    not_found_unless(db::podcasts::delete_series(&pool, id).await?, "Podcast series")?;
    cache.invalidate_series().await;
    tracing::info!("Deleted podcast series {} and its episodes", id);
    Ok(HttpResponse::NoContent().finish())
}

/// Full episode list including media, for the admin panel.
#[get("/podcast-series/{id}/episodes")]
pub async fn series_episodes(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let series_id = path.into_inner();
    db::podcasts::get_series(&pool, series_id)
        .await?
        .ok_or(AppError::NotFound("Podcast series"))?;
    Ok(HttpResponse::Ok().json(db::podcasts::list_episodes(&pool, series_id).await?))
}

#[get("/podcast-series/{id}/listen")]
pub async fn listen(
    pool: web::Data<PgPool>,
    caller: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let series: PodcastSeries = db::podcasts::get_series(&pool, path.into_inner())
        .await?
        .ok_or(AppError::NotFound("Podcast series"))?;
    let episodes = db::podcasts::list_episodes(&pool, series.id).await?;

    let current = if caller.is_admin() {
        episodes.iter().map(|e| e.sequence_number).max().unwrap_or(0)
    } else {
        let user = crate::routes::users::load_active_user(&pool, &caller).await?;
        access::require_entitlement(&user, series.requires_keci_time, Utc::now())?;
        let stored =
            db::access::get_sequence(pool.get_ref(), caller.id, AccessScope::Series(series.id))
                .await?;
        access::effective_sequence(stored)
    };

    Ok(HttpResponse::Ok().json(SeriesListening {
        current_accessible_sequence: current,
        episodes: listing(episodes, current),
        series,
    }))
}

#[post("/podcast-episodes")]
pub async fn create_episode(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    req: web::Json<PodcastEpisodeInput>,
) -> Result<HttpResponse, AppError> {
    validate_episode(&req)?;
    db::podcasts::get_series(&pool, req.series_id)
        .await?
        .ok_or(AppError::NotFound("Podcast series"))?;

    let sequence = match req.sequence_number {
        Some(sequence) => sequence,
        None => ordering::next_order(db::podcasts::get_max_sequence(&pool, req.series_id).await?),
    };
    let id = Uuid::new_v4();
    db::podcasts::insert_episode(&pool, id, &req, sequence).await?;
    tracing::info!("Added episode {} to series {} at {}", id, req.series_id, sequence);

    let episode = db::podcasts::get_episode(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Podcast episode"))?;
    Ok(HttpResponse::Created().json(episode))
}

#[get("/podcast-episodes/{id}")]
pub async fn get_episode(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let episode = db::podcasts::get_episode(&pool, path.into_inner())
        .await?
        .ok_or(AppError::NotFound("Podcast episode"))?;
    Ok(HttpResponse::Ok().json(episode))
}

#[put("/podcast-episodes/{id}")]
pub async fn update_episode(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
    req: web::Json<PodcastEpisodeInput>,
) -> Result<HttpResponse, AppError> {
    validate_episode(&req)?;
    let id = path.into_inner();
    not_found_unless(db::podcasts::update_episode(&pool, id, &req).await?, "Podcast episode")?;
    let episode = db::podcasts::get_episode(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Podcast episode"))?;
    Ok(HttpResponse::Ok().json(episode))
}

#[delete("/podcast-episodes/{id}")]
pub async fn delete_episode(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    not_found_unless(
        db::podcasts::delete_episode(&pool, path.into_inner()).await?,
        "Podcast episode",
    )?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::podcasts::EpisodeContent;
    use crate::models::users::{ADMIN_ROLE, USER_ROLE};
    use crate::test_support::{bearer, lazy_pool, test_accounts, test_cache, test_tokens};
    use actix_web::{App, http::StatusCode, test};
    use serde_json::json;
    use sqlx::types::Json;

    fn episode(sequence_number: i32) -> PodcastEpisode {
        PodcastEpisode {
            id: Uuid::new_v4(),
            series_id: Uuid::new_v4(),
            title: format!("Episode {sequence_number}"),
            description: String::new(),
            sequence_number,
            content: Json(EpisodeContent {
                audio_url: Some(format!("https://cdn.test/episodes/{sequence_number}.mp3")),
                ..EpisodeContent::default()
            }),
            created_at: Utc::now(),
        }
    }

    #[actix_web::test]
    async fn locked_episodes_hide_media() {
        let listed = listing(vec![episode(1), episode(2), episode(3)], 2);
        assert_eq!(listed.iter().filter(|e| e.locked).count(), 1);
        assert!(listed[1].content.is_some());
        assert!(listed[2].locked);
        assert!(listed[2].content.is_none());
    }

    #[actix_web::test]
    async fn listening_requires_authentication() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(test_tokens()))
                .app_data(web::Data::new(test_accounts()))
                .app_data(web::Data::new(test_cache()))
                .configure(init_routes),
        )
        .await;
        let req = test::TestRequest::get()
            .uri(&format!("/podcast-series/{}/listen", Uuid::new_v4()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn episode_writes_are_admin_only() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(test_tokens()))
                .app_data(web::Data::new(test_accounts()))
                .app_data(web::Data::new(test_cache()))
                .app_data(crate::routes::json_config())
                .configure(init_routes),
        )
        .await;
        let body = json!({
            "series_id": Uuid::new_v4(),
            "title": "Intro",
            "description": "First steps",
        });

        let req = test::TestRequest::post()
            .uri("/podcast-episodes")
            .insert_header(bearer(Uuid::new_v4(), USER_ROLE))
            .set_json(&body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let mut invalid = body.clone();
        invalid["sequence_number"] = json!(0);
        let req = test::TestRequest::post()
            .uri("/podcast-episodes")
            .insert_header(bearer(Uuid::new_v4(), ADMIN_ROLE))
            .set_json(&invalid)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
