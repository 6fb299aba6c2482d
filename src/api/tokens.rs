//! Claim-token signing bound to process configuration.
//!
//! `ClaimSigner` keeps the signing secret and token lifetimes together so
//! handlers stay simple and stateless. The secret is loaded once at startup
//! and never mutated; a distinct signer per test gets a distinct secret.

use anyhow::{Result, anyhow};
use claim_token::{
    Error, RegistrationClaims, SessionClaims, TOKEN_VERSION, sign_registration, sign_session,
    verify_registration, verify_session,
};
use secrecy::{ExposeSecret, SecretString};
use std::time::{SystemTime, UNIX_EPOCH};
use ulid::Ulid;
use uuid::Uuid;

pub struct ClaimSigner {
    secret: SecretString,
    claim_token_ttl_seconds: u64,
    session_token_ttl_seconds: u64,
}

impl ClaimSigner {
    /// # Errors
    ///
    /// Returns an error if the secret is empty or a TTL is zero.
    pub fn new(
        secret: SecretString,
        claim_token_ttl_seconds: u64,
        session_token_ttl_seconds: u64,
    ) -> Result<Self> {
        if secret.expose_secret().is_empty() {
            return Err(anyhow!("token signing secret must not be empty"));
        }

        if claim_token_ttl_seconds == 0 || session_token_ttl_seconds == 0 {
            return Err(anyhow!("token ttl must be at least one second"));
        }

        Ok(Self {
            secret,
            claim_token_ttl_seconds,
            session_token_ttl_seconds,
        })
    }

    /// Mint a claim token reserving `email`/`username` for its holder.
    ///
    /// `profile_uuid` is set only on the copy mailed to the owner of an
    /// already-linked address; the token returned to the caller never
    /// carries it.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn mint_claim_token(
        &self,
        email: &str,
        username: &str,
        profile_uuid: Option<Uuid>,
    ) -> Result<String, Error> {
        let iat = unix_now();
        let claims = RegistrationClaims {
            v: TOKEN_VERSION,
            email: email.to_string(),
            username: username.to_string(),
            profile_uuid,
            iat,
            exp: iat.saturating_add(ttl_i64(self.claim_token_ttl_seconds)),
            jti: Ulid::new().to_string(),
        };

        sign_registration(self.secret.expose_secret().as_bytes(), &claims)
    }

    /// Verify a claim token against the current clock.
    ///
    /// # Errors
    ///
    /// Propagates the codec error: `Expired` past the embedded expiry,
    /// `InvalidSignature` and friends for everything else.
    pub fn verify_claim_token(&self, token: &str) -> Result<RegistrationClaims, Error> {
        verify_registration(self.secret.expose_secret().as_bytes(), token, unix_now())
    }

    /// Mint the session token returned by a successful finalization.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn mint_session_token(&self, account_uuid: Uuid, email: &str) -> Result<String, Error> {
        let iat = unix_now();
        let claims = SessionClaims {
            v: TOKEN_VERSION,
            sub: account_uuid,
            email: email.to_string(),
            iat,
            exp: iat.saturating_add(ttl_i64(self.session_token_ttl_seconds)),
            jti: Ulid::new().to_string(),
        };

        sign_session(self.secret.expose_secret().as_bytes(), &claims)
    }

    /// Verify a session token against the current clock.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::verify_claim_token`].
    pub fn verify_session_token(&self, token: &str) -> Result<SessionClaims, Error> {
        verify_session(self.secret.expose_secret().as_bytes(), token, unix_now())
    }
}

impl std::fmt::Debug for ClaimSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimSigner")
            .field("secret", &"***")
            .field("claim_token_ttl_seconds", &self.claim_token_ttl_seconds)
            .field("session_token_ttl_seconds", &self.session_token_ttl_seconds)
            .finish()
    }
}

fn ttl_i64(seconds: u64) -> i64 {
    i64::try_from(seconds).unwrap_or(i64::MAX)
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX)
        })
}
