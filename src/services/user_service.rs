use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::models::{CreateUser, User, UserResponse};

#[derive(Debug, Clone)]
pub struct UserService {
    db: PgPool,
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_user(&self, user_data: CreateUser) -> Result<UserResponse> {
        let password_hash = hash_password(&user_data.password)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, email, password_hash, role, phone)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&user_data.name)
        .bind(&user_data.email)
        .bind(&password_hash)
        .bind(user_data.role.as_str())
        .bind(&user_data.phone)
        .fetch_one(&self.db)
        .await?;

        Ok(user.into())
    }

    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    /// Flip `email_verified_at` once. Returns false when the user was
    /// already verified.
    pub async fn mark_email_verified(&self, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET email_verified_at = now(), updated_at = now()
             WHERE id = $1 AND email_verified_at IS NULL",
        )
        .bind(user_id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_users(&self) -> Result<Vec<UserResponse>> {
        let users =
            sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
                .fetch_all(&self.db)
                .await?;

        Ok(users.into_iter().map(UserResponse::from).collect())
    }
}
