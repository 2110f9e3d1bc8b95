use async_trait::async_trait;
use chrono::SecondsFormat;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{FromRow, SqlitePool};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

use super::{
    AdminCredential, Availability, ContactSubmission, DataError, DataResult, DataService,
    DeveloperProfile, DeveloperRecord,
};
use crate::auth::hash_password;

const DEVELOPER_COLUMNS: &str = "id, full_name, email, phone, location, bio, skills, photo_url, \
     github_url, linkedin_url, portfolio_url, availability_status, experience_years, \
     hourly_rate, projects_completed, rating, created_at";

/// `developers` row as stored: skills as JSON text, availability as text.
#[derive(Debug, FromRow)]
struct DeveloperRow {
    id: String,
    full_name: String,
    email: Option<String>,
    phone: Option<String>,
    location: Option<String>,
    bio: Option<String>,
    skills: String,
    photo_url: Option<String>,
    github_url: Option<String>,
    linkedin_url: Option<String>,
    portfolio_url: Option<String>,
    availability_status: String,
    experience_years: i64,
    hourly_rate: i64,
    projects_completed: i64,
    rating: f64,
    created_at: String,
}

impl TryFrom<DeveloperRow> for DeveloperProfile {
    type Error = DataError;

    fn try_from(row: DeveloperRow) -> Result<Self, Self::Error> {
        Ok(DeveloperProfile {
            id: row.id,
            record: DeveloperRecord {
                full_name: row.full_name,
                email: row.email,
                phone: row.phone,
                location: row.location,
                bio: row.bio,
                skills: serde_json::from_str(&row.skills)?,
                photo_url: row.photo_url,
                github_url: row.github_url,
                linkedin_url: row.linkedin_url,
                portfolio_url: row.portfolio_url,
                availability_status: Availability::from(row.availability_status.as_str()),
                experience_years: row.experience_years,
                hourly_rate: row.hourly_rate,
                projects_completed: row.projects_completed,
                rating: row.rating,
            },
            created_at: Some(row.created_at),
        })
    }
}

/// Execute a SQL migration file, skipping comment lines
async fn execute_sql(pool: &SqlitePool, sql: &str) -> DataResult<()> {
    for statement in sql.split(';') {
        let cleaned: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = cleaned.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Clone)]
pub struct SqliteDataService {
    pool: SqlitePool,
}

impl SqliteDataService {
    pub async fn open(path: &Path) -> DataResult<Self> {
        let db_url = format!("sqlite:{}?mode=rwc", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&pool)
            .await?;

        Self::with_pool(pool).await
    }

    /// A private in-memory database. Single connection, since every SQLite
    /// memory connection is its own database.
    pub async fn in_memory() -> DataResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> DataResult<Self> {
        execute_sql(&pool, include_str!("../../migrations/001_initial.sql")).await?;
        Ok(Self { pool })
    }

    /// Create an admin account unless one with this email already exists.
    /// Returns the id of the existing or created row.
    pub async fn ensure_admin(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> anyhow::Result<String> {
        let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM admin_users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        if let Some((id,)) = existing {
            return Ok(id);
        }

        let id = Uuid::new_v4().to_string();
        let password_hash = hash_password(password)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

        sqlx::query(
            "INSERT INTO admin_users (id, email, password_hash, is_active, full_name, role, created_at) \
             VALUES (?, ?, ?, 1, ?, 'admin', ?)",
        )
        .bind(&id)
        .bind(email)
        .bind(&password_hash)
        .bind(full_name)
        .bind(now())
        .execute(&self.pool)
        .await?;

        info!(email = %email, "Created bootstrap admin account");
        Ok(id)
    }

    /// Flip the active flag of an admin account.
    pub async fn set_admin_active(&self, email: &str, active: bool) -> DataResult<()> {
        sqlx::query("UPDATE admin_users SET is_active = ? WHERE email = ?")
            .bind(active)
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Number of stored contact submissions.
    pub async fn contact_count(&self) -> DataResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contacts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn fetch_developer(&self, id: &str) -> DataResult<Option<DeveloperProfile>> {
        let row: Option<DeveloperRow> = sqlx::query_as(&format!(
            "SELECT {} FROM developers WHERE id = ?",
            DEVELOPER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DeveloperProfile::try_from).transpose()
    }
}

#[async_trait]
impl DataService for SqliteDataService {
    async fn find_active_admin(&self, email: &str) -> DataResult<Option<AdminCredential>> {
        let admin = sqlx::query_as::<_, AdminCredential>(
            "SELECT id, email, password_hash, is_active, full_name, role \
             FROM admin_users WHERE email = ? AND is_active = 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }

    async fn list_developers(&self) -> DataResult<Vec<DeveloperProfile>> {
        let rows: Vec<DeveloperRow> = sqlx::query_as(&format!(
            "SELECT {} FROM developers ORDER BY created_at DESC, rowid DESC",
            DEVELOPER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(DeveloperProfile::try_from).collect()
    }

    async fn insert_developer(&self, record: &DeveloperRecord) -> DataResult<DeveloperProfile> {
        let id = Uuid::new_v4().to_string();
        let skills = serde_json::to_string(&record.skills)?;

        sqlx::query(&format!(
            "INSERT INTO developers ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            DEVELOPER_COLUMNS
        ))
        .bind(&id)
        .bind(&record.full_name)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&record.location)
        .bind(&record.bio)
        .bind(&skills)
        .bind(&record.photo_url)
        .bind(&record.github_url)
        .bind(&record.linkedin_url)
        .bind(&record.portfolio_url)
        .bind(record.availability_status.to_string())
        .bind(record.experience_years)
        .bind(record.hourly_rate)
        .bind(record.projects_completed)
        .bind(record.rating)
        .bind(now())
        .execute(&self.pool)
        .await?;

        self.fetch_developer(&id)
            .await?
            .ok_or_else(|| DataError::Missing("Insert returned no row".to_string()))
    }

    async fn update_developer(
        &self,
        id: &str,
        record: &DeveloperRecord,
    ) -> DataResult<DeveloperProfile> {
        let skills = serde_json::to_string(&record.skills)?;

        let result = sqlx::query(
            r#"
            UPDATE developers SET
                full_name = ?,
                email = ?,
                phone = ?,
                location = ?,
                bio = ?,
                skills = ?,
                photo_url = ?,
                github_url = ?,
                linkedin_url = ?,
                portfolio_url = ?,
                availability_status = ?,
                experience_years = ?,
                hourly_rate = ?,
                projects_completed = ?,
                rating = ?
            WHERE id = ?
            "#,
        )
        .bind(&record.full_name)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&record.location)
        .bind(&record.bio)
        .bind(&skills)
        .bind(&record.photo_url)
        .bind(&record.github_url)
        .bind(&record.linkedin_url)
        .bind(&record.portfolio_url)
        .bind(record.availability_status.to_string())
        .bind(record.experience_years)
        .bind(record.hourly_rate)
        .bind(record.projects_completed)
        .bind(record.rating)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DataError::Missing("Developer not found".to_string()));
        }

        self.fetch_developer(id)
            .await?
            .ok_or_else(|| DataError::Missing("Developer not found".to_string()))
    }

    async fn delete_developer(&self, id: &str) -> DataResult<()> {
        let result = sqlx::query("DELETE FROM developers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DataError::Missing("Developer not found".to_string()));
        }
        Ok(())
    }

    async fn insert_contact(&self, submission: &ContactSubmission) -> DataResult<()> {
        sqlx::query(
            "INSERT INTO contacts (id, name, email, message, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&submission.name)
        .bind(&submission.email)
        .bind(&submission.message)
        .bind(now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
