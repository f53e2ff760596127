use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::Row;

use rental_core::domain::user::{SessionToken, UserId};

use super::{RepositoryError, SessionRepository};
use crate::DbPool;

/// Stored form of a session. The raw token never reaches the database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRecord {
    pub token_hash: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// A freshly issued session: the token to hand to the client plus what was stored.
#[derive(Debug)]
pub struct IssuedSession {
    pub token: SessionToken,
    pub record: SessionRecord,
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub async fn issue_session<R>(
    repo: &R,
    user_id: UserId,
    ttl_hours: u32,
    now: DateTime<Utc>,
) -> Result<IssuedSession, RepositoryError>
where
    R: SessionRepository + ?Sized,
{
    let raw = uuid::Uuid::new_v4().simple().to_string();
    let record = SessionRecord {
        token_hash: hash_token(&raw),
        user_id,
        expires_at: now + Duration::hours(i64::from(ttl_hours)),
        created_at: now,
    };

    repo.save(record.clone()).await?;
    Ok(IssuedSession { token: SessionToken::new(raw), record })
}

pub struct SqlSessionRepository {
    pool: DbPool,
}

impl SqlSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{field} `{raw}`: {e}")))
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<SessionRecord, RepositoryError> {
    let token_hash: String =
        row.try_get("token_hash").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let expires_at: String =
        row.try_get("expires_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(SessionRecord {
        token_hash,
        user_id: UserId(user_id),
        expires_at: parse_timestamp("expires_at", &expires_at)?,
        created_at: parse_timestamp("created_at", &created_at)?,
    })
}

#[async_trait::async_trait]
impl SessionRepository for SqlSessionRepository {
    async fn save(&self, session: SessionRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO user_session (token_hash, user_id, expires_at, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(token_hash) DO UPDATE SET
                 user_id = excluded.user_id,
                 expires_at = excluded.expires_at",
        )
        .bind(&session.token_hash)
        .bind(&session.user_id.0)
        .bind(session.expires_at.to_rfc3339())
        .bind(session.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<SessionRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT token_hash, user_id, expires_at, created_at
             FROM user_session WHERE token_hash = ?",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_session(r)?)),
            None => Ok(None),
        }
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        // RFC 3339 in UTC sorts lexically, so a text comparison is a time comparison.
        let result = sqlx::query("DELETE FROM user_session WHERE expires_at <= ?")
            .bind(now.to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use rental_core::domain::user::UserId;

    use super::{hash_token, issue_session, SqlSessionRepository};
    use crate::repositories::SessionRepository;
    use crate::{connect_with_settings, migrations, DbPool};

    async fn pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[test]
    fn token_hash_is_stable_sha256_hex() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }

    #[tokio::test]
    async fn issued_session_is_found_by_token_hash_only() {
        let pool = pool().await;
        let repo = SqlSessionRepository::new(pool.clone());
        let now = Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).single().expect("valid time");

        let issued =
            issue_session(&repo, UserId("user-9".to_string()), 24, now).await.expect("issue");

        let stored: String = sqlx::query_scalar("SELECT token_hash FROM user_session")
            .fetch_one(&pool)
            .await
            .expect("stored hash");
        assert_ne!(stored, issued.token.expose());

        let found = repo
            .find_by_token_hash(&hash_token(issued.token.expose()))
            .await
            .expect("find")
            .expect("session exists");
        assert_eq!(found.user_id, UserId("user-9".to_string()));
        assert_eq!(found.expires_at, now + Duration::hours(24));
        assert!(found.is_active_at(now));
        assert!(!found.is_active_at(now + Duration::hours(24)));
        pool.close().await;
    }

    #[tokio::test]
    async fn delete_expired_removes_only_stale_sessions() {
        let pool = pool().await;
        let repo = SqlSessionRepository::new(pool.clone());
        let now = Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).single().expect("valid time");

        issue_session(&repo, UserId("old".to_string()), 1, now - Duration::hours(2))
            .await
            .expect("issue old");
        let fresh =
            issue_session(&repo, UserId("fresh".to_string()), 1, now).await.expect("issue fresh");

        let removed = repo.delete_expired(now).await.expect("delete");

        assert_eq!(removed, 1);
        assert!(repo
            .find_by_token_hash(&fresh.record.token_hash)
            .await
            .expect("find")
            .is_some());
        pool.close().await;
    }
}
