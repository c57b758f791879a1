//! Database repository for all data operations.
//!
//! Group mutations never overwrite a previously read snapshot: joins are
//! conditional inserts on the membership key and preference submissions are
//! row updates keyed by uid, so concurrent writers cannot lose each other's
//! writes.

use chrono::{Duration, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    generate_group_code, normalize_group_code, Group, Identity, Member, MemberPreferences,
    PreferenceFields, UpdateProfileRequest, UserProfile,
};

/// Attempts at generating an unused group code before giving up.
const CODE_ATTEMPTS: usize = 5;

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== USER OPERATIONS ====================

    /// Create a new user account. The password must already be hashed.
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserProfile, AppError> {
        let uid = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO users (uid, name, email, password_hash, created_at, features, preferences) VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&uid)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(&now)
        .bind(r#"["basic"]"#)
        .bind("{}")
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(UserProfile {
                uid,
                name: name.to_string(),
                email: email.to_string(),
                created_at: now,
                profile_picture: None,
                features: vec!["basic".to_string()],
                preferences: serde_json::json!({}),
            }),
            Err(e) if is_unique_violation(&e) => Err(AppError::Auth(
                "An account with this email already exists".to_string(),
            )),
            Err(e) => Err(AppError::storage_write(e)),
        }
    }

    /// Get a user by uid.
    pub async fn get_user(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        let row = sqlx::query(
            "SELECT uid, name, email, created_at, profile_picture, features, preferences FROM users WHERE uid = ?"
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::storage_read)?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Get a user and their password hash by email, for sign-in.
    pub async fn get_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(UserProfile, String)>, AppError> {
        let row = sqlx::query(
            "SELECT uid, name, email, password_hash, created_at, profile_picture, features, preferences FROM users WHERE email = ?"
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::storage_read)?;

        Ok(row
            .as_ref()
            .map(|row| (user_from_row(row), row.get("password_hash"))))
    }

    /// Update the caller's profile.
    pub async fn update_profile(
        &self,
        uid: &str,
        request: &UpdateProfileRequest,
    ) -> Result<UserProfile, AppError> {
        let existing = self
            .get_user(uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", uid)))?;

        let name = request.name.as_ref().unwrap_or(&existing.name);
        let email = request.email.as_ref().unwrap_or(&existing.email);

        let result = sqlx::query("UPDATE users SET name = ?, email = ? WHERE uid = ?")
            .bind(name)
            .bind(email)
            .bind(uid)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(UserProfile {
                name: name.clone(),
                email: email.clone(),
                ..existing
            }),
            Err(e) if is_unique_violation(&e) => Err(AppError::Validation(
                "Email is already in use by another account".to_string(),
            )),
            Err(e) => Err(AppError::storage_write(e)),
        }
    }

    /// Delete a user account. Sessions are removed by cascade.
    pub async fn delete_user(&self, uid: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE uid = ?")
            .bind(uid)
            .execute(&self.pool)
            .await
            .map_err(AppError::storage_write)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", uid)));
        }
        Ok(())
    }

    // ==================== SESSION OPERATIONS ====================

    /// Store a new session for a user. Only the token hash is persisted.
    pub async fn create_session(
        &self,
        token_hash: &str,
        uid: &str,
        ttl_hours: i64,
    ) -> Result<(), AppError> {
        let now = Utc::now();
        let expires = now + Duration::hours(ttl_hours);

        sqlx::query(
            "INSERT INTO sessions (token_hash, uid, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(token_hash)
        .bind(uid)
        .bind(now.to_rfc3339())
        .bind(expires.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(AppError::storage_write)?;

        Ok(())
    }

    /// Resolve a session token hash to the caller identity, if the session
    /// exists and has not expired.
    pub async fn get_session_identity(
        &self,
        token_hash: &str,
    ) -> Result<Option<Identity>, AppError> {
        let now = Utc::now().to_rfc3339();

        let row = sqlx::query(
            r#"SELECT u.uid, u.name, u.email, u.profile_picture
               FROM sessions s JOIN users u ON u.uid = s.uid
               WHERE s.token_hash = ? AND s.expires_at > ?"#,
        )
        .bind(token_hash)
        .bind(&now)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::storage_read)?;

        Ok(row.map(|row| Identity {
            uid: row.get("uid"),
            name: row.get("name"),
            email: row.get("email"),
            photo_url: row.get("profile_picture"),
        }))
    }

    /// Delete a session. Deleting an unknown session is a no-op success.
    pub async fn delete_session(&self, token_hash: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(AppError::storage_write)?;
        Ok(())
    }

    // ==================== GROUP OPERATIONS ====================

    /// Create a new group with the caller as founding member.
    ///
    /// The code is regenerated on collision; after `CODE_ATTEMPTS`
    /// collisions the create fails with a conflict.
    pub async fn create_group(&self, founder: &Identity, name: &str) -> Result<Group, AppError> {
        let now = Utc::now().to_rfc3339();

        for _ in 0..CODE_ATTEMPTS {
            let code = generate_group_code();

            let mut tx = self.pool.begin().await.map_err(AppError::storage_write)?;

            let inserted = sqlx::query(
                "INSERT INTO groups (code, name, created_at, version) VALUES (?, ?, ?, 1)",
            )
            .bind(&code)
            .bind(name)
            .bind(&now)
            .execute(&mut *tx)
            .await;

            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => continue,
                Err(e) => return Err(AppError::storage_write(e)),
            }

            sqlx::query(
                "INSERT INTO group_members (group_code, uid, name, photo_url, joined_at) VALUES (?, ?, ?, ?, ?)"
            )
            .bind(&code)
            .bind(&founder.uid)
            .bind(&founder.name)
            .bind(&founder.photo_url)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(AppError::storage_write)?;

            tx.commit().await.map_err(AppError::storage_write)?;

            return self
                .get_group(&code)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Group {} not found", code)));
        }

        Err(AppError::Conflict(
            "Could not allocate an unused group code".to_string(),
        ))
    }

    /// Get a group snapshot by code, members in join order.
    pub async fn get_group(&self, code: &str) -> Result<Option<Group>, AppError> {
        let code = normalize_group_code(code);

        let group_row = sqlx::query("SELECT code, name, created_at, version FROM groups WHERE code = ?")
            .bind(&code)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::storage_read)?;

        let Some(group_row) = group_row else {
            return Ok(None);
        };

        let member_rows = sqlx::query(
            r#"SELECT uid, name, photo_url, interests, availability, special_requests, location, prefs_updated_at
               FROM group_members WHERE group_code = ? ORDER BY rowid"#,
        )
        .bind(&code)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::storage_read)?;

        Ok(Some(Group {
            code: group_row.get("code"),
            name: group_row.get("name"),
            created_at: group_row.get("created_at"),
            version: group_row.get("version"),
            members: member_rows.iter().map(member_from_row).collect(),
        }))
    }

    /// Join a group by code.
    ///
    /// Joining a group the caller already belongs to is a no-op success.
    /// The append is a conditional insert on the membership key, so two
    /// racing joins both land and neither is lost.
    pub async fn join_group(&self, code: &str, caller: &Identity) -> Result<Group, AppError> {
        let code = normalize_group_code(code);

        let exists = sqlx::query("SELECT 1 FROM groups WHERE code = ?")
            .bind(&code)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::storage_read)?;

        if exists.is_none() {
            return Err(AppError::NotFound(format!("Group {} not found", code)));
        }

        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await.map_err(AppError::storage_write)?;

        let result = sqlx::query(
            r#"INSERT INTO group_members (group_code, uid, name, photo_url, joined_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(group_code, uid) DO NOTHING"#,
        )
        .bind(&code)
        .bind(&caller.uid)
        .bind(&caller.name)
        .bind(&caller.photo_url)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(AppError::storage_write)?;

        if result.rows_affected() > 0 {
            sqlx::query("UPDATE groups SET version = version + 1 WHERE code = ?")
                .bind(&code)
                .execute(&mut *tx)
                .await
                .map_err(AppError::storage_write)?;
        }

        tx.commit().await.map_err(AppError::storage_write)?;

        self.get_group(&code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", code)))
    }

    /// Replace the caller's preferences in a group.
    ///
    /// The update targets the membership row by uid; the whole preference
    /// substructure is replaced and `prefs_updated_at` stamped, so readers
    /// never observe a partial submission. The caller's photo is refreshed
    /// as a side effect.
    pub async fn submit_preferences(
        &self,
        code: &str,
        caller: &Identity,
        fields: &PreferenceFields,
    ) -> Result<Group, AppError> {
        let code = normalize_group_code(code);
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await.map_err(AppError::storage_write)?;

        let result = sqlx::query(
            r#"UPDATE group_members
               SET interests = ?, availability = ?, special_requests = ?, location = ?,
                   prefs_updated_at = ?, photo_url = ?
               WHERE group_code = ? AND uid = ?"#,
        )
        .bind(&fields.interests)
        .bind(&fields.availability)
        .bind(&fields.special_requests)
        .bind(&fields.location)
        .bind(&now)
        .bind(&caller.photo_url)
        .bind(&code)
        .bind(&caller.uid)
        .execute(&mut *tx)
        .await
        .map_err(AppError::storage_write)?;

        if result.rows_affected() == 0 {
            drop(tx);
            return match self.get_group(&code).await? {
                None => Err(AppError::NotFound(format!("Group {} not found", code))),
                Some(_) => Err(AppError::NotAMember(format!(
                    "You are not a member of group {}",
                    code
                ))),
            };
        }

        sqlx::query("UPDATE groups SET version = version + 1 WHERE code = ?")
            .bind(&code)
            .execute(&mut *tx)
            .await
            .map_err(AppError::storage_write)?;

        tx.commit().await.map_err(AppError::storage_write)?;

        self.get_group(&code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", code)))
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

// Helper functions for row conversion

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> UserProfile {
    let features: String = row.get("features");
    let preferences: String = row.get("preferences");
    UserProfile {
        uid: row.get("uid"),
        name: row.get("name"),
        email: row.get("email"),
        created_at: row.get("created_at"),
        profile_picture: row.get("profile_picture"),
        features: serde_json::from_str(&features).unwrap_or_default(),
        preferences: serde_json::from_str(&preferences).unwrap_or(serde_json::json!({})),
    }
}

fn member_from_row(row: &sqlx::sqlite::SqliteRow) -> Member {
    let prefs_updated_at: Option<String> = row.get("prefs_updated_at");
    Member {
        uid: row.get("uid"),
        name: row.get("name"),
        photo_url: row.get("photo_url"),
        preferences: prefs_updated_at.map(|updated_at| MemberPreferences {
            interests: row
                .get::<Option<String>, _>("interests")
                .unwrap_or_default(),
            availability: row
                .get::<Option<String>, _>("availability")
                .unwrap_or_default(),
            special_requests: row
                .get::<Option<String>, _>("special_requests")
                .unwrap_or_default(),
            location: row
                .get::<Option<String>, _>("location")
                .unwrap_or_default(),
            updated_at,
        }),
    }
}
