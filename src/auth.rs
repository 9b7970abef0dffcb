// src/auth.rs
use crate::cache::AccountCache;
use crate::config::Config;
use crate::db;
use crate::error::{AppError, AppResult};
use crate::models::users::{
    ADMIN_ROLE, AuthResponse, LoginRequest, RefreshTokenRequest, RegisterRequest,
    RevokeTokenRequest, USER_ROLE, User,
};
use crate::token::TokenService;
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, HttpResponse, post, web};
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register);
    cfg.service(login);
    cfg.service(refresh);
    cfg.service(revoke);
}

/// Caller identified by a valid bearer access token.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Caller whose access token carries the admin role.
#[derive(Clone, Debug)]
pub struct AdminUser(pub AuthUser);

pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Verifies the bearer token, then checks the account behind it is still
/// active. The stored role wins over the one in the token.
async fn authenticate(req: HttpRequest) -> Result<AuthUser, AppError> {
    let tokens = req
        .app_data::<web::Data<TokenService>>()
        .ok_or_else(|| AppError::internal("token service is not registered"))?;
    let token = bearer_token(&req).ok_or(AppError::Unauthorized("Unauthorized"))?;
    let claims = tokens.validate_access_token(token)?;
    let id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized("Unauthorized"))?;

    let accounts = req
        .app_data::<web::Data<AccountCache>>()
        .ok_or_else(|| AppError::internal("account cache is not registered"))?;
    let status = match accounts.get(id) {
        Some(status) => status,
        None => {
            let pool = req
                .app_data::<web::Data<PgPool>>()
                .ok_or_else(|| AppError::internal("database pool is not registered"))?;
            let status = db::users::get_account_status(pool, id)
                .await?
                .ok_or(AppError::Unauthorized("Unauthorized"))?;
            accounts.put(id, status.clone());
            status
        }
    };
    if !status.is_active {
        return Err(AppError::Unauthorized("Unauthorized"));
    }

    Ok(AuthUser {
        id,
        role: status.role,
    })
}

type Extracted<T> = Pin<Box<dyn Future<Output = Result<T, AppError>>>>;

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Extracted<Self>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        Box::pin(authenticate(req.clone()))
    }
}

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = Extracted<Self>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let user = authenticate(req).await?;
            if user.is_admin() {
                Ok(AdminUser(user))
            } else {
                Err(AppError::Forbidden("Admin access required"))
            }
        })
    }
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> AppResult<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(AppError::validation("email is invalid")),
    }
}

/// bcrypt is CPU-bound; keep it off the async workers.
pub async fn hash_password(password: String) -> AppResult<String> {
    web::block(move || hash(password, DEFAULT_COST))
        .await
        .map_err(|e| AppError::internal(format!("blocking pool error: {e}")))?
        .map_err(|e| AppError::internal(format!("password hashing error: {e}")))
}

pub async fn verify_password(password: String, password_hash: String) -> AppResult<bool> {
    let verified = web::block(move || verify(password, &password_hash))
        .await
        .map_err(|e| AppError::internal(format!("blocking pool error: {e}")))?;
    // a malformed stored hash is treated as a mismatch
    Ok(verified.unwrap_or(false))
}

/// Issues an access token and a fresh refresh token for `user`.
async fn start_session(pool: &PgPool, tokens: &TokenService, user: &User) -> AppResult<AuthResponse> {
    let access = tokens.issue_access_token(user.id, &user.role_name)?;
    let refresh_token = tokens.generate_refresh_token();
    db::tokens::insert_refresh_token(
        pool,
        &TokenService::hash_refresh_token(&refresh_token),
        user.id,
        tokens.refresh_expiry(),
    )
    .await?;

    Ok(AuthResponse {
        access_token: access.token,
        refresh_token,
        expires_at: access.expires_at,
        user: user.profile(Utc::now()),
        roles: vec![user.role_name.clone()],
    })
}

#[post("/auth/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    tokens: web::Data<TokenService>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    validate_email(&req.email)?;
    validate_password(&req.password)?;
    if req.full_name.trim().is_empty() {
        return Err(AppError::validation("full_name is required"));
    }

    if db::users::get_user_by_email(&pool, req.email.trim()).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(req.password).await?;
    let id = Uuid::new_v4();
    db::users::create_user(
        &pool,
        &db::users::NewUser {
            id,
            email: req.email.trim(),
            full_name: req.full_name.trim(),
            password_hash: &password_hash,
            role_name: USER_ROLE,
            subscription_end: Utc::now() + Duration::days(config.default_subscription_days),
        },
    )
    .await?;

    let user = db::users::get_user_by_id(&pool, id)
        .await?
        .ok_or_else(|| AppError::internal("registered user vanished"))?;
    tracing::info!("Registered user {}", user.id);

    let session = start_session(&pool, &tokens, &user).await?;
    Ok(HttpResponse::Created().json(session))
}

#[post("/auth/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    let invalid = AppError::Unauthorized("Invalid credentials");

    let Some(user) = db::users::get_user_by_email(&pool, req.email.trim()).await? else {
        return Err(invalid);
    };
    if !user.is_active {
        tracing::info!("Login attempt for inactive user {}", user.id);
        return Err(invalid);
    }
    if !verify_password(req.password, user.password_hash.clone()).await? {
        return Err(invalid);
    }

    let session = start_session(&pool, &tokens, &user).await?;
    Ok(HttpResponse::Ok().json(session))
}

/// Swaps a live refresh token for a new session. Presenting a token that was
/// already rotated revokes every live token of its owner.
pub async fn rotate_session(
    pool: &PgPool,
    tokens: &TokenService,
    refresh_token: &str,
) -> AppResult<AuthResponse> {
    let presented = TokenService::hash_refresh_token(refresh_token);
    let invalid = AppError::Unauthorized("Invalid refresh token");

    let mut tx = pool.begin().await?;
    let Some(stored) = db::tokens::lock_refresh_token(&mut tx, &presented).await? else {
        return Err(invalid);
    };

    if stored.revoked_at.is_some() {
        if stored.replaced_by_hash.is_some() {
            let revoked = db::tokens::revoke_all_for_user(&mut *tx, stored.user_id).await?;
            tx.commit().await?;
            tracing::warn!(
                "Rotated refresh token reused for user {}; revoked {} live tokens",
                stored.user_id,
                revoked
            );
        }
        return Err(invalid);
    }
    if stored.expires_at <= Utc::now() {
        return Err(invalid);
    }

    let user = match db::users::get_user_by_id(pool, stored.user_id).await? {
        Some(user) if user.is_active => user,
        _ => return Err(invalid),
    };

    let access = tokens.issue_access_token(user.id, &user.role_name)?;
    let refresh_token = tokens.generate_refresh_token();
    let replacement = TokenService::hash_refresh_token(&refresh_token);
    db::tokens::insert_refresh_token(&mut *tx, &replacement, user.id, tokens.refresh_expiry())
        .await?;
    db::tokens::mark_replaced(&mut tx, &presented, &replacement).await?;
    tx.commit().await?;

    Ok(AuthResponse {
        access_token: access.token,
        refresh_token,
        expires_at: access.expires_at,
        user: user.profile(Utc::now()),
        roles: vec![user.role_name.clone()],
    })
}

#[post("/auth/refresh")]
pub async fn refresh(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    req: web::Json<RefreshTokenRequest>,
) -> Result<HttpResponse, AppError> {
    let session = rotate_session(&pool, &tokens, &req.refresh_token).await?;
    Ok(HttpResponse::Ok().json(session))
}

#[post("/auth/revoke")]
pub async fn revoke(
    pool: web::Data<PgPool>,
    req: web::Json<RevokeTokenRequest>,
) -> Result<HttpResponse, AppError> {
    let hash = TokenService::hash_refresh_token(&req.refresh_token);
    if !db::tokens::revoke_token(pool.get_ref(), &hash).await? {
        tracing::debug!("Revoke called for unknown or already revoked token");
    }
    Ok(HttpResponse::NoContent().finish())
}
