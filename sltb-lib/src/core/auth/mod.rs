pub mod jwt;
pub mod password;

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use sltb_database::database::users::{self, NewUser};
use sltb_database::models::users::Model as UserModel;
use sltb_database::types::{UserRole, UserStatus};
use sltb_database::Store;

use crate::config::AdminSeed;
use crate::core::{SignInInfo, SignUpInfo};
use crate::error::{ApplicationError, FieldError};
use jwt::JwtManager;
use password::{hash_password_blocking, verify_password_blocking, DUMMY_HASH};

const MIN_PASSWORD_LENGTH: usize = 6;

/// A user as shown to clients. The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl From<UserModel> for UserProfile {
    fn from(user: UserModel) -> Self {
        UserProfile {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone_number: user.phone_number,
            role: user.role,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Identity carried by a verified bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: &jwt::Claims) -> Self {
        AuthenticatedUser {
            id: claims.sub,
            role: claims.role,
        }
    }

    pub fn require_officer(&self) -> Result<(), ApplicationError> {
        match self.role {
            UserRole::Officer | UserRole::Admin => Ok(()),
            UserRole::User => Err(ApplicationError::Forbidden(
                "Officer or admin role required".to_string(),
            )),
        }
    }
}

fn validate_sign_up(info: &SignUpInfo) -> Result<(), ApplicationError> {
    let mut errors = Vec::new();
    if info.first_name.trim().is_empty() {
        errors.push(FieldError::new("first_name", "First name is required"));
    }
    if info.last_name.trim().is_empty() {
        errors.push(FieldError::new("last_name", "Last name is required"));
    }
    if !info.email.contains('@') {
        errors.push(FieldError::new("email", "Please provide a valid email"));
    }
    if info.password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(FieldError::new(
            "password",
            "Password must be at least 6 characters long",
        ));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApplicationError::Validation(errors))
    }
}

/**
 * Register a self-service account
 *
 * # Arguments
 * @param info: SignUpInfo - Names, email, optional phone number and the plain password
 *
 * # Returns
 * @return Result<UserProfile, ApplicationError> - The stored account, active with role user
 */
pub async fn sign_up(store: &Store, info: SignUpInfo) -> Result<UserProfile, ApplicationError> {
    validate_sign_up(&info)?;
    let email = info.email.trim().to_lowercase();
    if users::get_user_by_email(store.conn(), &email).await?.is_some() {
        return Err(ApplicationError::DuplicateKey("Email already registered".to_string()));
    }

    let password = hash_password_blocking(info.password).await?;
    let user = users::create_user(
        store.conn(),
        NewUser {
            first_name: info.first_name.trim().to_string(),
            last_name: info.last_name.trim().to_string(),
            email,
            phone_number: info.phone_number.filter(|p| !p.trim().is_empty()),
            password,
            role: UserRole::User,
            status: UserStatus::Active,
        },
    )
    .await
    .map_err(|e| match ApplicationError::from(e) {
        ApplicationError::DuplicateKey(_) => {
            ApplicationError::DuplicateKey("Email already registered".to_string())
        }
        other => other,
    })?;
    info!("Registered user {}", user.id);
    Ok(user.into())
}

/// Checks the credentials and issues a token.
pub async fn sign_in(
    store: &Store,
    jwt: &JwtManager,
    info: SignInInfo,
) -> Result<SignInResponse, ApplicationError> {
    let invalid = || ApplicationError::Unauthorized("Invalid credentials".to_string());
    let email = info.email.trim().to_lowercase();
    let user = users::get_user_by_email(store.conn(), &email).await?;
    let stored_hash = user.as_ref().map_or(DUMMY_HASH, |u| u.password.as_str()).to_string();
    let matches = verify_password_blocking(info.password, stored_hash).await?;
    let user = match user {
        Some(user) if matches => user,
        _ => return Err(invalid()),
    };
    if user.status == UserStatus::Inactive {
        return Err(ApplicationError::Forbidden("Account is inactive".to_string()));
    }

    let token = jwt.issue(user.id, &user.email, user.role)?;
    Ok(SignInResponse {
        token,
        user: user.into(),
    })
}

pub async fn profile(store: &Store, user_id: i32) -> Result<UserProfile, ApplicationError> {
    users::get_user(store.conn(), user_id)
        .await?
        .map(UserProfile::from)
        .ok_or_else(|| ApplicationError::NotFound("User not found".to_string()))
}

/// Creates the configured admin account unless the email is already taken.
pub async fn ensure_admin(store: &Store, seed: &AdminSeed) -> Result<(), ApplicationError> {
    let email = seed.email.trim().to_lowercase();
    if users::get_user_by_email(store.conn(), &email).await?.is_some() {
        return Ok(());
    }
    let password = hash_password_blocking(seed.password.clone()).await?;
    let admin = users::create_user(
        store.conn(),
        NewUser {
            first_name: "System".to_string(),
            last_name: "Administrator".to_string(),
            email,
            phone_number: None,
            password,
            role: UserRole::Admin,
            status: UserStatus::Active,
        },
    )
    .await?;
    info!("Created admin account {}", admin.id);
    Ok(())
}
