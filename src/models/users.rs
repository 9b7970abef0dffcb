// src/models/users.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const ADMIN_ROLE: &str = "Admin";
pub const USER_ROLE: &str = "User";

/// User row joined with its role name.
#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role_id: Uuid,
    pub role_name: String,
    pub subscription_end: DateTime<Utc>,
    pub keci_time_end: Option<DateTime<Utc>>,
    pub daily_content_order: i32,
    pub weekly_content_id: Option<Uuid>,
    pub has_seen_popup: bool,
    pub profile_picture_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_active_subscription(&self, now: DateTime<Utc>) -> bool {
        self.subscription_end > now
    }

    pub fn has_keci_time(&self, now: DateTime<Utc>) -> bool {
        self.keci_time_end.is_some_and(|end| end > now)
    }

    pub fn profile(&self, now: DateTime<Utc>) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role_name.clone(),
            subscription_end: self.subscription_end,
            keci_time_end: self.keci_time_end,
            has_active_subscription: self.has_active_subscription(now),
            has_keci_time: self.has_keci_time(now),
            daily_content_order: self.daily_content_order,
            weekly_content_id: self.weekly_content_id,
            has_seen_popup: self.has_seen_popup,
            profile_picture_url: self.profile_picture_url.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub subscription_end: DateTime<Utc>,
    pub keci_time_end: Option<DateTime<Utc>>,
    pub has_active_subscription: bool,
    pub has_keci_time: bool,
    pub daily_content_order: i32,
    pub weekly_content_id: Option<Uuid>,
    pub has_seen_popup: bool,
    pub profile_picture_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
}

/// What an access token's holder is currently allowed to be.
#[derive(Clone, Debug, PartialEq, FromRow)]
pub struct AccountStatus {
    pub is_active: bool,
    pub role: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, FromRow)]
pub struct RefreshToken {
    pub token_hash: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub replaced_by_hash: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Claims {
    pub sub: String, // user_id
    pub role: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub full_name: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Serialize, Deserialize)]
pub struct RevokeTokenRequest {
    pub refresh_token: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
    pub roles: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub email: String,
    pub full_name: String,
    pub role_id: Uuid,
    pub is_active: bool,
}

#[derive(Serialize, Deserialize)]
pub struct ExtendTimeRequest {
    pub days: i64,
}

#[derive(Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize, Deserialize)]
pub struct SetPasswordRequest {
    pub new_password: String,
}

#[derive(Serialize, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(role: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "ada@example.com".into(),
            full_name: "Ada".into(),
            password_hash: "hash".into(),
            role_id: Uuid::new_v4(),
            role_name: role.into(),
            subscription_end: now + Duration::days(3),
            keci_time_end: None,
            daily_content_order: 1,
            weekly_content_id: None,
            has_seen_popup: false,
            profile_picture_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn profile_reports_subscription_windows() {
        let now = Utc::now();
        let mut u = user(USER_ROLE);
        u.keci_time_end = Some(now - Duration::hours(1));

        let profile = u.profile(now);
        assert!(profile.has_active_subscription);
        assert!(!profile.has_keci_time);
        assert_eq!(profile.role, "User");
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let value = serde_json::to_value(user(ADMIN_ROLE)).unwrap();
        assert!(value.get("password_hash").is_none());
    }
}
