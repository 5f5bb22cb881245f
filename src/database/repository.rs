use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Role, UserRecord};
use crate::users::{RoleRepository, SchoolRepository, UserRepository};

const USER_COLUMNS: &str = "id, username, password, email, email_verified, \
    name_first, name_middle, name_last, position, school_id, role_id, deactivated, \
    finished_tutorials, force_update_info, date_created, last_modified";

/// `users` table access
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, DatabaseError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn count_by_role(&self, role_id: i32, active_only: bool) -> Result<i64, DatabaseError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users WHERE role_id = $1 AND (NOT $2 OR deactivated = false)",
        )
        .bind(role_id)
        .bind(active_only)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    async fn list(&self) -> Result<Vec<UserRecord>, DatabaseError> {
        let users = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users ORDER BY date_created",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn insert(&self, user: &UserRecord) -> Result<(), DatabaseError> {
        sqlx::query(&format!(
            "INSERT INTO users ({}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.email)
        .bind(user.email_verified)
        .bind(&user.name_first)
        .bind(&user.name_middle)
        .bind(&user.name_last)
        .bind(&user.position)
        .bind(user.school_id)
        .bind(user.role_id)
        .bind(user.deactivated)
        .bind(&user.finished_tutorials)
        .bind(user.force_update_info)
        .bind(user.date_created)
        .bind(user.last_modified)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save(&self, user: &UserRecord) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                username = $2, password = $3, email = $4, email_verified = $5,
                name_first = $6, name_middle = $7, name_last = $8, position = $9,
                school_id = $10, role_id = $11, deactivated = $12,
                finished_tutorials = $13, force_update_info = $14, last_modified = $15
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.email)
        .bind(user.email_verified)
        .bind(&user.name_first)
        .bind(&user.name_middle)
        .bind(&user.name_last)
        .bind(&user.position)
        .bind(user.school_id)
        .bind(user.role_id)
        .bind(user.deactivated)
        .bind(&user.finished_tutorials)
        .bind(user.force_update_info)
        .bind(user.last_modified)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("user {}", user.id)));
        }
        Ok(())
    }
}

/// `schools` table access
#[derive(Clone)]
pub struct PgSchoolRepository {
    pool: PgPool,
}

impl PgSchoolRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchoolRepository for PgSchoolRepository {
    async fn exists(&self, school_id: i32) -> Result<bool, DatabaseError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM schools WHERE id = $1")
            .bind(school_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0 > 0)
    }

    async fn clear_assigned_noted_by(&self, user_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE schools SET assigned_noted_by = NULL WHERE assigned_noted_by = $1",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            "Cleared noted-by reference to {} on {} school(s)",
            user_id,
            result.rows_affected()
        );
        Ok(())
    }
}

/// `roles` table access
#[derive(Clone)]
pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert any of the given roles that are missing; returns how many were added
    pub async fn ensure(&self, roles: &[Role]) -> Result<u64, DatabaseError> {
        let mut inserted = 0;
        for role in roles {
            let result = sqlx::query(
                r#"
                INSERT INTO roles (id, description, modifiable) VALUES ($1, $2, $3)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(role.id)
            .bind(&role.description)
            .bind(role.modifiable)
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn exists(&self, role_id: i32) -> Result<bool, DatabaseError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM roles WHERE id = $1")
            .bind(role_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0 > 0)
    }

    async fn list(&self) -> Result<Vec<Role>, DatabaseError> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, description, modifiable FROM roles ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }
}
