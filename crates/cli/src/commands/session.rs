use chrono::Utc;
use rental_core::domain::user::UserId;
use rental_db::repositories::{issue_session, SessionRepository, SqlSessionRepository};

use crate::commands::{load_config, open_database, runtime, CommandResult, StepFailure};

/// Issues a bearer session for `user`. The raw token appears only in this output;
/// storage keeps its digest.
pub fn run(user: &str) -> CommandResult {
    let Some(user_id) = UserId::parse(user) else {
        return CommandResult::failure(
            "session",
            "input_validation",
            "user id must not be blank",
            2,
        );
    };
    let config = match load_config("session") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("session") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let repo = SqlSessionRepository::new(pool.clone());
        let now = Utc::now();

        let purged = repo
            .delete_expired(now)
            .await
            .map_err(|error| ("session_store", error.to_string(), 4u8))?;
        let issued = issue_session(&repo, user_id, config.auth.session_ttl_hours, now)
            .await
            .map_err(|error| ("session_store", error.to_string(), 4u8))?;

        pool.close().await;
        Ok::<String, StepFailure>(format!(
            "token={} user={} expires_at={} purged_expired={purged}",
            issued.token.expose(),
            issued.record.user_id,
            issued.record.expires_at.to_rfc3339(),
        ))
    });

    CommandResult::from_step("session", result)
}
