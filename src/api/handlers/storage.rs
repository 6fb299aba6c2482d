//! Persistence helpers for the registration flow.
//!
//! Availability checks are point-in-time reads: two concurrent requests can
//! both see a pair as free. The UNIQUE constraints on `accounts` and
//! `profiles` are the authority at write time; unique violations are
//! surfaced so handlers answer 409 instead of 500.

use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{Instrument, info_span};
use uuid::Uuid;

/// Returns `true` when `err` is a Postgres unique-constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

/// # Errors
///
/// Returns the database error unchanged.
pub async fn email_taken(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    let query = "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = $1) AS exists";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_one(pool)
        .instrument(span)
        .await?;

    Ok(row.get("exists"))
}

/// # Errors
///
/// Returns the database error unchanged.
pub async fn username_taken(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
    let query = "SELECT EXISTS(SELECT 1 FROM accounts WHERE username = $1) AS exists";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_one(pool)
        .instrument(span)
        .await?;

    Ok(row.get("exists"))
}

/// # Errors
///
/// Returns the database error unchanged.
pub async fn find_profile_uuid_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<Uuid>, sqlx::Error> {
    let query = "SELECT uuid FROM profiles WHERE email = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await?;

    Ok(row.map(|row| row.get("uuid")))
}

/// Provision a fresh profile identity for an email the store has never seen.
///
/// # Errors
///
/// Returns the database error unchanged; a unique violation means a
/// concurrent request provisioned the same email first.
pub async fn create_profile(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
) -> Result<Uuid, sqlx::Error> {
    let query = "INSERT INTO profiles (uuid, email) VALUES ($1, $2) RETURNING uuid";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(Uuid::new_v4())
        .bind(email)
        .fetch_one(&mut **tx)
        .instrument(span)
        .await?;

    Ok(row.get("uuid"))
}

/// Create the account record binding the claimed pair, the credential, and
/// the resolved profile.
///
/// # Errors
///
/// Returns the database error unchanged; a unique violation means the email
/// or username was claimed between the availability check and this write.
pub async fn create_account(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
    username: &str,
    password: &str,
    profile_uuid: Uuid,
) -> Result<Uuid, sqlx::Error> {
    let query = "INSERT INTO accounts (uuid, email, username, password, profile_uuid) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING uuid";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(username)
        .bind(password)
        .bind(profile_uuid)
        .fetch_one(&mut **tx)
        .instrument(span)
        .await?;

    Ok(row.get("uuid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_conflicts() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::PoolClosed));
    }
}
