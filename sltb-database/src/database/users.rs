use chrono::Utc;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};

use crate::models::users::{ActiveModel, Column, Entity as User, Model as UserModel};
use crate::types::{UserRole, UserStatus};

/// Fields needed to register an account. `password` is already hashed.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password: String,
    pub role: UserRole,
    pub status: UserStatus,
}

/**
 * Insert a user
 *
 * # Returns
 * @return Result<UserModel, sea_orm::DbErr> - The stored user; a unique violation when the email is taken
 */
pub async fn create_user<C: ConnectionTrait>(db: &C, user: NewUser) -> Result<UserModel, DbErr> {
    let now = Utc::now();
    ActiveModel {
        first_name: Set(user.first_name),
        last_name: Set(user.last_name),
        email: Set(user.email),
        phone_number: Set(user.phone_number),
        password: Set(user.password),
        role: Set(user.role),
        status: Set(user.status),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn get_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<UserModel>, DbErr> {
    User::find_by_id(id).one(db).await
}

pub async fn get_user_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<UserModel>, DbErr> {
    User::find().filter(Column::Email.eq(email)).one(db).await
}
