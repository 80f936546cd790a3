use crate::auth::claims::AccountStatus;
use crate::auth::password::{burn_verification, hash_password, verify_password};
use crate::db::traits::{CredentialStore, NewUser, User};
use crate::types::{AppError, Result, UpdateProfileRequest};
use async_trait::async_trait;
use chrono::Utc;
use libsql::{Builder, Connection, Database, Row};
use uuid::Uuid;

const USER_COLUMNS: &str =
    "user_id, username, email_address, password_hash, real_name, location, bio, status";

pub struct TursoClient {
    // Keeps the database alive for the lifetime of the shared connection.
    _db: Database,
    conn: Connection,
}

impl TursoClient {
    /// Ephemeral in-memory database, lost on restart.
    pub async fn new_memory() -> Result<Self> {
        Self::new_local(":memory:").await
    }

    /// File-backed database at `path`, or in-memory for `:memory:`.
    pub async fn new_local(path: &str) -> Result<Self> {
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let client = Self { _db: db, conn };
        client.initialize_schema().await?;

        Ok(client)
    }

    pub fn connection(&self) -> Connection {
        self.conn.clone()
    }

    async fn initialize_schema(&self) -> Result<()> {
        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS users (
                    user_id TEXT PRIMARY KEY,
                    username TEXT UNIQUE NOT NULL,
                    email_address TEXT UNIQUE NOT NULL,
                    password_hash TEXT NOT NULL,
                    real_name TEXT NOT NULL,
                    location TEXT NOT NULL DEFAULT '',
                    bio TEXT NOT NULL DEFAULT '',
                    status TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        Ok(())
    }

    // User operations
    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let password_hash = hash_password(&new_user.password)?;
        let user = User {
            user_id: Uuid::new_v4(),
            username: new_user.username,
            email_address: new_user.email_address,
            password_hash,
            real_name: new_user.real_name,
            location: new_user.location,
            bio: new_user.bio,
            status: new_user.status,
        };
        let now = Utc::now().timestamp();

        self.conn
            .execute(
                "INSERT INTO users (user_id, username, email_address, password_hash, real_name,
                                    location, bio, status, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                libsql::params![
                    user.user_id.to_string(),
                    user.username.clone(),
                    user.email_address.clone(),
                    user.password_hash.clone(),
                    user.real_name.clone(),
                    user.location.clone(),
                    user.bio.clone(),
                    user.status.as_str(),
                    now,
                    now
                ],
            )
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("UNIQUE constraint failed") {
                    AppError::Conflict("Username or email address already registered".to_string())
                } else {
                    AppError::Database(format!("Failed to create user: {}", msg))
                }
            })?;

        Ok(user)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.query_one_user(
            &format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS),
            username.to_string(),
        )
        .await
    }

    /// Apply the fields present in `update` and return the stored result.
    pub async fn update_profile(&self, user_id: Uuid, update: &UpdateProfileRequest) -> Result<User> {
        let mut user = self
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if let Some(real_name) = &update.real_name {
            user.real_name = real_name.clone();
        }
        if let Some(location) = &update.location {
            user.location = location.clone();
        }
        if let Some(bio) = &update.bio {
            user.bio = bio.clone();
        }

        self.conn
            .execute(
                "UPDATE users SET real_name = ?, location = ?, bio = ?, updated_at = ?
                 WHERE user_id = ?",
                libsql::params![
                    user.real_name.clone(),
                    user.location.clone(),
                    user.bio.clone(),
                    Utc::now().timestamp(),
                    user.user_id.to_string()
                ],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update profile: {}", e)))?;

        Ok(user)
    }

    pub async fn set_status(&self, user_id: Uuid, status: AccountStatus) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE users SET status = ?, updated_at = ? WHERE user_id = ?",
                libsql::params![status.as_str(), Utc::now().timestamp(), user_id.to_string()],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update status: {}", e)))?;

        if changed == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    async fn query_one_user(&self, sql: &str, param: String) -> Result<Option<User>> {
        let mut rows = self
            .conn
            .query(sql, [param])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query user: {}", e)))?;

        match rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Some(row) => Ok(Some(user_from_row(&row)?)),
            None => Ok(None),
        }
    }
}

fn user_from_row(row: &Row) -> Result<User> {
    let user_id: String = row.get(0).map_err(|e| AppError::Database(e.to_string()))?;
    let status: String = row.get(7).map_err(|e| AppError::Database(e.to_string()))?;

    Ok(User {
        user_id: Uuid::parse_str(&user_id)
            .map_err(|e| AppError::Database(format!("Corrupt user id: {}", e)))?,
        username: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
        email_address: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
        password_hash: row.get(3).map_err(|e| AppError::Database(e.to_string()))?,
        real_name: row.get(4).map_err(|e| AppError::Database(e.to_string()))?,
        location: row.get(5).map_err(|e| AppError::Database(e.to_string()))?,
        bio: row.get(6).map_err(|e| AppError::Database(e.to_string()))?,
        status: status.parse().unwrap_or_default(),
    })
}

#[async_trait]
impl CredentialStore for TursoClient {
    async fn find_user_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>> {
        let Some(user) = self.find_user_by_username(username).await? else {
            burn_verification(password);
            return Ok(None);
        };

        if verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        self.query_one_user(
            &format!("SELECT {} FROM users WHERE user_id = ?", USER_COLUMNS),
            user_id.to_string(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email_address: email.to_string(),
            password: "correct horse battery".to_string(),
            real_name: "Test User".to_string(),
            location: String::new(),
            bio: String::new(),
            status: AccountStatus::Approved,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let db = TursoClient::new_memory().await.expect("should open database");
        let created = db
            .create_user(new_user("ada", "ada@showcash.io"))
            .await
            .expect("should create user");

        assert!(created.password_hash.starts_with("$argon2"));

        let by_id = db
            .find_user_by_id(created.user_id)
            .await
            .expect("query should succeed")
            .expect("user should exist");
        assert_eq!(by_id, created);

        let by_name = db
            .find_user_by_username("ada")
            .await
            .expect("query should succeed");
        assert_eq!(by_name, Some(created));
    }

    #[tokio::test]
    async fn test_credentials_check_password() {
        let db = TursoClient::new_memory().await.unwrap();
        db.create_user(new_user("ada", "ada@showcash.io")).await.unwrap();

        let ok = db
            .find_user_by_credentials("ada", "correct horse battery")
            .await
            .unwrap();
        assert!(ok.is_some());

        let wrong = db.find_user_by_credentials("ada", "nope").await.unwrap();
        assert!(wrong.is_none());

        let unknown = db
            .find_user_by_credentials("nobody", "correct horse battery")
            .await
            .unwrap();
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let db = TursoClient::new_memory().await.unwrap();
        db.create_user(new_user("ada", "ada@showcash.io")).await.unwrap();

        let result = db.create_user(new_user("ada", "other@showcash.io")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let result = db.create_user(new_user("other", "ada@showcash.io")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_set_status_deactivates() {
        let db = TursoClient::new_memory().await.unwrap();
        let user = db.create_user(new_user("ada", "ada@showcash.io")).await.unwrap();
        assert!(db.is_account_active(&user));

        db.set_status(user.user_id, AccountStatus::Suspended)
            .await
            .unwrap();
        let user = db.find_user_by_id(user.user_id).await.unwrap().unwrap();

        assert_eq!(user.status, AccountStatus::Suspended);
        assert!(!db.is_account_active(&user));

        let missing = db.set_status(Uuid::new_v4(), AccountStatus::Approved).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_profile_applies_present_fields() {
        let db = TursoClient::new_memory().await.unwrap();
        let user = db.create_user(new_user("ada", "ada@showcash.io")).await.unwrap();

        let update = UpdateProfileRequest {
            location: Some("Adelaide".to_string()),
            ..Default::default()
        };
        let updated = db.update_profile(user.user_id, &update).await.unwrap();

        assert_eq!(updated.location, "Adelaide");
        assert_eq!(updated.real_name, "Test User");
        assert_eq!(
            db.find_user_by_id(user.user_id).await.unwrap().unwrap(),
            updated
        );
    }
}
