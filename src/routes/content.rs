// src/routes/content.rs
//! Ordered content lists share one set of handlers; movies and music are
//! plain CRUD.
use crate::access;
use crate::auth::{AdminUser, AuthUser};
use crate::cache::ContentCache;
use crate::db;
use crate::db::content::OrderedTable;
use crate::error::{AppError, AppResult};
use crate::models::content::{
    Affirmation, AffirmationInput, Aphorism, AphorismInput, Article, ArticleInput, ArticleReading,
    IdResponse, MovieInput, MusicInput, Task, TaskInput, WeeklyQuestion, WeeklyQuestionInput,
};
use crate::ordering;
use crate::routes::{not_found_unless, require_positive, require_text};
use crate::target::AccessScope;
use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const MAX_TEXT: usize = 5000;
const MAX_TITLE: usize = 300;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    ordered_routes::<Affirmation>(cfg, "affirmations");
    ordered_routes::<Aphorism>(cfg, "aphorisms");
    ordered_routes::<Task>(cfg, "tasks");
    ordered_routes::<WeeklyQuestion>(cfg, "weekly-questions");
    cfg.service(read_article);
    ordered_routes::<Article>(cfg, "articles");

    cfg.service(list_movies);
    cfg.service(get_movie);
    cfg.service(create_movie);
    cfg.service(update_movie);
    cfg.service(delete_movie);

    cfg.service(list_music);
    cfg.service(get_music);
    cfg.service(create_music);
    cfg.service(update_music);
    cfg.service(delete_music);
}

/// A table of content rows positioned by a unique `sort_order`.
pub trait OrderedResource: Serialize + for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static {
    type Input: DeserializeOwned + 'static;

    const TABLE: OrderedTable;
    const LABEL: &'static str;

    fn validate(input: &Self::Input) -> AppResult<()>;

    fn requested_order(input: &Self::Input) -> Option<i32>;

    async fn insert(pool: &PgPool, id: Uuid, input: &Self::Input, order: i32) -> Result<(), sqlx::Error>;

    async fn update(pool: &PgPool, id: Uuid, input: &Self::Input) -> Result<bool, sqlx::Error>;

    /// Cached views built from this table.
    fn invalidate(_cache: &ContentCache) {}
}

impl OrderedResource for Affirmation {
    type Input = AffirmationInput;
    const TABLE: OrderedTable = OrderedTable::Affirmations;
    const LABEL: &'static str = "Affirmation";

    fn validate(input: &AffirmationInput) -> AppResult<()> {
        require_text("text", &input.text, MAX_TEXT)?;
        require_positive("sort_order", input.sort_order)
    }

    fn requested_order(input: &AffirmationInput) -> Option<i32> {
        input.sort_order
    }

    async fn insert(pool: &PgPool, id: Uuid, input: &AffirmationInput, order: i32) -> Result<(), sqlx::Error> {
        db::content::insert_affirmation(pool, id, input, order).await
    }

    async fn update(pool: &PgPool, id: Uuid, input: &AffirmationInput) -> Result<bool, sqlx::Error> {
        db::content::update_affirmation(pool, id, input).await
    }

    fn invalidate(cache: &ContentCache) {
        cache.invalidate_daily();
    }
}

impl OrderedResource for Aphorism {
    type Input = AphorismInput;
    const TABLE: OrderedTable = OrderedTable::Aphorisms;
    const LABEL: &'static str = "Aphorism";

    fn validate(input: &AphorismInput) -> AppResult<()> {
        require_text("text", &input.text, MAX_TEXT)?;
        require_positive("sort_order", input.sort_order)
    }

    fn requested_order(input: &AphorismInput) -> Option<i32> {
        input.sort_order
    }

    async fn insert(pool: &PgPool, id: Uuid, input: &AphorismInput, order: i32) -> Result<(), sqlx::Error> {
        db::content::insert_aphorism(pool, id, input, order).await
    }

    async fn update(pool: &PgPool, id: Uuid, input: &AphorismInput) -> Result<bool, sqlx::Error> {
        db::content::update_aphorism(pool, id, input).await
    }

    fn invalidate(cache: &ContentCache) {
        cache.invalidate_daily();
    }
}

impl OrderedResource for Task {
    type Input = TaskInput;
    const TABLE: OrderedTable = OrderedTable::Tasks;
    const LABEL: &'static str = "Task";

    fn validate(input: &TaskInput) -> AppResult<()> {
        require_text("title", &input.title, MAX_TITLE)?;
        require_text("description", &input.description, MAX_TEXT)?;
        require_positive("sort_order", input.sort_order)
    }

    fn requested_order(input: &TaskInput) -> Option<i32> {
        input.sort_order
    }

    async fn insert(pool: &PgPool, id: Uuid, input: &TaskInput, order: i32) -> Result<(), sqlx::Error> {
        db::content::insert_task(pool, id, input, order).await
    }

    async fn update(pool: &PgPool, id: Uuid, input: &TaskInput) -> Result<bool, sqlx::Error> {
        db::content::update_task(pool, id, input).await
    }
}

impl OrderedResource for WeeklyQuestion {
    type Input = WeeklyQuestionInput;
    const TABLE: OrderedTable = OrderedTable::WeeklyQuestions;
    const LABEL: &'static str = "Weekly question";

    fn validate(input: &WeeklyQuestionInput) -> AppResult<()> {
        require_text("text", &input.text, MAX_TEXT)?;
        require_positive("sort_order", input.sort_order)
    }

    fn requested_order(input: &WeeklyQuestionInput) -> Option<i32> {
        input.sort_order
    }

    async fn insert(pool: &PgPool, id: Uuid, input: &WeeklyQuestionInput, order: i32) -> Result<(), sqlx::Error> {
        db::content::insert_weekly_question(pool, id, input, order).await
    }

    async fn update(pool: &PgPool, id: Uuid, input: &WeeklyQuestionInput) -> Result<bool, sqlx::Error> {
        db::content::update_weekly_question(pool, id, input).await
    }
}

impl OrderedResource for Article {
    type Input = ArticleInput;
    const TABLE: OrderedTable = OrderedTable::Articles;
    const LABEL: &'static str = "Article";

    fn validate(input: &ArticleInput) -> AppResult<()> {
        require_text("title", &input.title, MAX_TITLE)?;
        require_text("summary", &input.summary, MAX_TEXT)?;
        require_positive("sort_order", input.sort_order)?;
        if input.pages.iter().any(|p| p.trim().is_empty()) {
            return Err(AppError::validation("pages must not be empty"));
        }
        Ok(())
    }

    fn requested_order(input: &ArticleInput) -> Option<i32> {
        input.sort_order
    }

    async fn insert(pool: &PgPool, id: Uuid, input: &ArticleInput, order: i32) -> Result<(), sqlx::Error> {
        db::content::insert_article(pool, id, input, order).await
    }

    async fn update(pool: &PgPool, id: Uuid, input: &ArticleInput) -> Result<bool, sqlx::Error> {
        db::content::update_article(pool, id, input).await
    }
}

fn ordered_routes<R: OrderedResource>(cfg: &mut web::ServiceConfig, prefix: &str) {
    cfg.service(
        web::resource(format!("/{prefix}"))
            .route(web::get().to(list_ordered::<R>))
            .route(web::post().to(create_ordered::<R>)),
    );
    cfg.service(
        web::resource(format!("/{prefix}/by-order/{{order}}"))
            .route(web::get().to(id_by_order::<R>)),
    );
    cfg.service(
        web::resource(format!("/{prefix}/max-order")).route(web::get().to(max_order::<R>)),
    );
    cfg.service(
        web::resource(format!("/{prefix}/{{id}}"))
            .route(web::get().to(get_ordered::<R>))
            .route(web::put().to(update_ordered::<R>))
            .route(web::delete().to(delete_ordered::<R>)),
    );
}

async fn list_ordered<R: OrderedResource>(
    pool: web::Data<PgPool>,
    _user: AuthUser,
) -> Result<HttpResponse, AppError> {
    let rows: Vec<R> = db::content::list_ordered(&pool, R::TABLE).await?;
    Ok(HttpResponse::Ok().json(rows))
}

async fn get_ordered<R: OrderedResource>(
    pool: web::Data<PgPool>,
    _user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let row: R = db::content::get_ordered(&pool, R::TABLE, path.into_inner())
        .await?
        .ok_or(AppError::NotFound(R::LABEL))?;
    Ok(HttpResponse::Ok().json(row))
}

async fn id_by_order<R: OrderedResource>(
    pool: web::Data<PgPool>,
    _user: AuthUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = db::content::get_id_by_order(&pool, R::TABLE, path.into_inner())
        .await?
        .ok_or(AppError::NotFound(R::LABEL))?;
    Ok(HttpResponse::Ok().json(IdResponse { id }))
}

async fn max_order<R: OrderedResource>(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let max = db::content::get_max_order(&pool, R::TABLE).await?;
    Ok(HttpResponse::Ok().json(json!({ "max_order": max.unwrap_or(0) })))
}

async fn create_ordered<R: OrderedResource>(
    pool: web::Data<PgPool>,
    cache: web::Data<ContentCache>,
    _admin: AdminUser,
    req: web::Json<R::Input>,
) -> Result<HttpResponse, AppError> {
    R::validate(&req)?;
    let order = match R::requested_order(&req) {
        Some(order) => order,
        None => ordering::next_order(db::content::get_max_order(&pool, R::TABLE).await?),
    };

    let id = Uuid::new_v4();
    R::insert(&pool, id, &req, order).await?;
    R::invalidate(&cache);
    tracing::info!("Created {} {} at order {}", R::LABEL, id, order);

    let row: R = db::content::get_ordered(&pool, R::TABLE, id)
        .await?
        .ok_or(AppError::NotFound(R::LABEL))?;
    Ok(HttpResponse::Created().json(row))
}

async fn update_ordered<R: OrderedResource>(
    pool: web::Data<PgPool>,
    cache: web::Data<ContentCache>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
    req: web::Json<R::Input>,
) -> Result<HttpResponse, AppError> {
    R::validate(&req)?;
    let id = path.into_inner();
    not_found_unless(R::update(&pool, id, &req).await?, R::LABEL)?;
    R::invalidate(&cache);

    let row: R = db::content::get_ordered(&pool, R::TABLE, id)
        .await?
        .ok_or(AppError::NotFound(R::LABEL))?;
    Ok(HttpResponse::Ok().json(row))
}

async fn delete_ordered<R: OrderedResource>(
    pool: web::Data<PgPool>,
    cache: web::Data<ContentCache>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    not_found_unless(
        db::content::delete_ordered(&pool, R::TABLE, path.into_inner()).await?,
        R::LABEL,
    )?;
    R::invalidate(&cache);
    Ok(HttpResponse::NoContent().finish())
}

/// Pages `1..=accessible` of `pages`.
pub fn visible_pages(pages: &[String], accessible: i32) -> Vec<String> {
    let n = usize::try_from(accessible).unwrap_or(0).min(pages.len());
    pages[..n].to_vec()
}

#[get("/articles/{id}/read")]
pub async fn read_article(
    pool: web::Data<PgPool>,
    caller: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let article: Article = db::content::get_article(&pool, path.into_inner())
        .await?
        .ok_or(AppError::NotFound("Article"))?;
    let total = article.pages.len() as i32;

    let accessible = if caller.is_admin() {
        total
    } else {
        let user = crate::routes::users::load_active_user(&pool, &caller).await?;
        access::require_entitlement(&user, false, chrono::Utc::now())?;
        let stored =
            db::access::get_sequence(pool.get_ref(), caller.id, AccessScope::Article(article.id))
                .await?;
        access::effective_sequence(stored)
    };

    Ok(HttpResponse::Ok().json(ArticleReading {
        id: article.id,
        title: article.title,
        summary: article.summary,
        image_url: article.image_url,
        total_pages: total,
        current_accessible_page: accessible.min(total),
        pages: visible_pages(&article.pages, accessible),
    }))
}

fn validate_movie(input: &MovieInput) -> AppResult<()> {
    require_text("title", &input.title, MAX_TITLE)?;
    require_text("description", &input.description, MAX_TEXT)
}

#[get("/movies")]
pub async fn list_movies(pool: web::Data<PgPool>, _user: AuthUser) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(db::content::list_movies(&pool).await?))
}

#[get("/movies/{id}")]
pub async fn get_movie(
    pool: web::Data<PgPool>,
    _user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let movie = db::content::get_movie(&pool, path.into_inner())
        .await?
        .ok_or(AppError::NotFound("Movie"))?;
    Ok(HttpResponse::Ok().json(movie))
}

#[post("/movies")]
pub async fn create_movie(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    req: web::Json<MovieInput>,
) -> Result<HttpResponse, AppError> {
    validate_movie(&req)?;
    let id = Uuid::new_v4();
    db::content::insert_movie(&pool, id, &req).await?;
    let movie = db::content::get_movie(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Movie"))?;
    Ok(HttpResponse::Created().json(movie))
}

#[put("/movies/{id}")]
pub async fn update_movie(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
    req: web::Json<MovieInput>,
) -> Result<HttpResponse, AppError> {
    validate_movie(&req)?;
    let id = path.into_inner();
    not_found_unless(db::content::update_movie(&pool, id, &req).await?, "Movie")?;
    let movie = db::content::get_movie(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Movie"))?;
    Ok(HttpResponse::Ok().json(movie))
}

#[delete("/movies/{id}")]
pub async fn delete_movie(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    not_found_unless(db::content::delete_movie(&pool, path.into_inner()).await?, "Movie")?;
    Ok(HttpResponse::NoContent().finish())
}

fn validate_music(input: &MusicInput) -> AppResult<()> {
    require_text("title", &input.title, MAX_TITLE)?;
    require_text("artist", &input.artist, MAX_TITLE)?;
    require_text("url", &input.url, 2000)
}

#[get("/music")]
pub async fn list_music(pool: web::Data<PgPool>, _user: AuthUser) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(db::content::list_music(&pool).await?))
}

#[get("/music/{id}")]
pub async fn get_music(
    pool: web::Data<PgPool>,
    _user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let music = db::content::get_music(&pool, path.into_inner())
        .await?
        .ok_or(AppError::NotFound("Music"))?;
    Ok(HttpResponse::Ok().json(music))
}

#[post("/music")]
pub async fn create_music(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    req: web::Json<MusicInput>,
) -> Result<HttpResponse, AppError> {
    validate_music(&req)?;
    let id = Uuid::new_v4();
    db::content::insert_music(&pool, id, &req).await?;
    let music = db::content::get_music(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Music"))?;
    Ok(HttpResponse::Created().json(music))
}

#[put("/music/{id}")]
pub async fn update_music(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
    req: web::Json<MusicInput>,
) -> Result<HttpResponse, AppError> {
    validate_music(&req)?;
    let id = path.into_inner();
    not_found_unless(db::content::update_music(&pool, id, &req).await?, "Music")?;
    let music = db::content::get_music(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Music"))?;
    Ok(HttpResponse::Ok().json(music))
}

#[delete("/music/{id}")]
pub async fn delete_music(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    not_found_unless(db::content::delete_music(&pool, path.into_inner()).await?, "Music")?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::{ADMIN_ROLE, USER_ROLE};
    use crate::test_support::{bearer, lazy_pool, test_accounts, test_cache, test_tokens};
    use actix_web::{App, http::StatusCode, test};

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(lazy_pool()))
                    .app_data(web::Data::new(test_tokens()))
                    .app_data(web::Data::new(test_accounts()))
                    .app_data(web::Data::new(test_cache()))
                    .app_data(crate::routes::json_config())
                    .configure(init_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn visible_pages_follow_the_gate() {
        let pages: Vec<String> = ["one", "two", "three"].iter().map(|s| s.to_string()).collect();
        assert_eq!(visible_pages(&pages, 1), vec!["one".to_string()]);
        assert_eq!(visible_pages(&pages, 5).len(), 3);
        assert!(visible_pages(&pages, 0).is_empty());
        assert!(visible_pages(&pages, -2).is_empty());
    }

    #[actix_web::test]
    async fn affirmation_validation() {
        let ok = AffirmationInput {
            text: "I am calm".into(),
            sort_order: None,
        };
        assert!(Affirmation::validate(&ok).is_ok());

        let zero_order = AffirmationInput {
            text: "I am calm".into(),
            sort_order: Some(0),
        };
        assert!(Affirmation::validate(&zero_order).is_err());
    }

    #[actix_web::test]
    async fn article_rejects_blank_pages() {
        let input = ArticleInput {
            title: "Breathing".into(),
            summary: "Basics".into(),
            image_url: None,
            pages: vec!["intro".into(), "   ".into()],
            sort_order: None,
        };
        assert!(Article::validate(&input).is_err());
    }

    #[actix_web::test]
    async fn reads_require_authentication() {
        let app = app!();
        for uri in ["/affirmations", "/aphorisms", "/tasks", "/weekly-questions", "/articles", "/movies", "/music"] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[actix_web::test]
    async fn writes_require_admin() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/affirmations")
            .insert_header(bearer(Uuid::new_v4(), USER_ROLE))
            .set_json(json!({ "text": "I am calm" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn blank_text_is_rejected() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/aphorisms")
            .insert_header(bearer(Uuid::new_v4(), ADMIN_ROLE))
            .set_json(json!({ "text": "  " }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn movie_without_title_is_rejected() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/movies")
            .insert_header(bearer(Uuid::new_v4(), ADMIN_ROLE))
            .set_json(json!({ "title": "", "description": "A film" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
