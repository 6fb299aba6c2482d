use crate::api::{
    handlers::{storage, valid_password},
    tokens::ClaimSigner,
};
use axum::{Json, extract::Extension, http::StatusCode};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Deserialize)]
pub struct RegistrationFinalize {
    #[serde(rename = "claimToken")]
    claim_token: String,
    password: String,
    // Accepted for wire compatibility; the claim token is authoritative for
    // both, so a stolen token cannot be pointed at someone else's identity
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    profile_uuid: Option<Uuid>,
}

impl std::fmt::Debug for RegistrationFinalize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationFinalize")
            .field("claim_token", &self.claim_token)
            .field("password", &"***")
            .field("email", &self.email)
            .field("profile_uuid", &self.profile_uuid)
            .finish()
    }
}

/// Fixed-shape phase-2 result.
#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationFinalizeResponse {
    pub claim_token_invalid: bool,
    pub password_invalid: bool,
    pub auth_token: Option<String>,
}

type FinalizeResponse =
    Result<(StatusCode, Json<RegistrationFinalizeResponse>), (StatusCode, String)>;

#[utoipa::path(
    post,
    path= "/registration/finalize",
    request_body = RegistrationFinalize,
    responses (
        (status = 201, description = "Account created, session token issued", body = RegistrationFinalizeResponse),
        (status = 400, description = "Invalid claim token or password", body = RegistrationFinalizeResponse),
        (status = 409, description = "Email or username claimed since initialization", body = String),
        (status = 500, description = "Store or signing failure", body = String)
    ),
    tag= "registration"
)]
#[instrument(skip(pool, signer, payload))]
pub async fn registration_finalize(
    pool: Extension<PgPool>,
    signer: Extension<Arc<ClaimSigner>>,
    payload: Option<Json<RegistrationFinalize>>,
) -> FinalizeResponse {
    let Some(Json(request)) = payload else {
        return Err((StatusCode::BAD_REQUEST, "Missing payload".to_string()));
    };

    debug!("registration finalize: {:?}", request);

    // Both checks run before either is reported; nothing is written if
    // any of them fail
    let claims = match signer.verify_claim_token(&request.claim_token) {
        Ok(claims) => Some(claims),
        Err(err) => {
            debug!("claim token rejected: {err}");
            None
        }
    };
    let password_invalid = !valid_password(&request.password);

    let Some(claims) = claims else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(RegistrationFinalizeResponse {
                claim_token_invalid: true,
                password_invalid,
                auth_token: None,
            }),
        ));
    };

    if password_invalid {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(RegistrationFinalizeResponse {
                claim_token_invalid: false,
                password_invalid: true,
                auth_token: None,
            }),
        ));
    }

    let mut tx = pool.begin().await.map_err(|err| {
        error!("Error starting transaction: {err}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error creating account".to_string(),
        )
    })?;

    // The token, not the request body, names the identity being finalized.
    // A claim set without profile_uuid means the email has never been seen:
    // provision a profile for the email captured at initialization time.
    let profile_uuid = match claims.profile_uuid {
        Some(uuid) => uuid,
        None => match storage::create_profile(&mut tx, &claims.email).await {
            Ok(uuid) => uuid,
            Err(err) if storage::is_unique_violation(&err) => {
                error!("Profile already exists for claimed email");
                return Err((
                    StatusCode::CONFLICT,
                    "Profile already exists for this email".to_string(),
                ));
            }
            Err(err) => {
                error!("Error creating profile: {err}");
                return Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error creating profile".to_string(),
                ));
            }
        },
    };

    let account_uuid = match storage::create_account(
        &mut tx,
        &claims.email,
        &claims.username,
        &request.password,
        profile_uuid,
    )
    .await
    {
        Ok(uuid) => uuid,
        Err(err) if storage::is_unique_violation(&err) => {
            error!("Account already exists for claimed email or username");
            return Err((
                StatusCode::CONFLICT,
                "Email or username already claimed".to_string(),
            ));
        }
        Err(err) => {
            error!("Error creating account: {err}");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error creating account".to_string(),
            ));
        }
    };

    tx.commit().await.map_err(|err| {
        error!("Error committing account: {err}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error creating account".to_string(),
        )
    })?;

    let auth_token = signer
        .mint_session_token(account_uuid, &claims.email)
        .map_err(|err| {
            error!("Error signing session token: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error signing session token".to_string(),
            )
        })?;

    Ok((
        StatusCode::CREATED,
        Json(RegistrationFinalizeResponse {
            claim_token_invalid: false,
            password_invalid: false,
            auth_token: Some(auth_token),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_accepts_wire_fields() {
        let request: RegistrationFinalize = serde_json::from_value(json!({
            "claimToken": "token",
            "password": "password1",
            "email": "ignored@example.test",
            "profile_uuid": "9b2f0a1e-3c4d-4e5f-8a6b-7c8d9e0f1a2b"
        }))
        .unwrap();

        assert_eq!(request.claim_token, "token");
        assert_eq!(request.password, "password1");
        assert_eq!(request.email.as_deref(), Some("ignored@example.test"));
        assert!(request.profile_uuid.is_some());
    }

    #[test]
    fn request_works_without_optional_fields() {
        let request: RegistrationFinalize = serde_json::from_value(json!({
            "claimToken": "token",
            "password": "password1"
        }))
        .unwrap();

        assert_eq!(request.email, None);
        assert_eq!(request.profile_uuid, None);
    }

    #[test]
    fn debug_redacts_password() {
        let request: RegistrationFinalize = serde_json::from_value(json!({
            "claimToken": "token",
            "password": "password1"
        }))
        .unwrap();

        let debug = format!("{request:?}");
        assert!(debug.contains("***"));
        assert!(!debug.contains("password1"));
    }

    #[test]
    fn rejection_response_serializes_camel_case() {
        let response = RegistrationFinalizeResponse {
            claim_token_invalid: true,
            password_invalid: true,
            auth_token: None,
        };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "claimTokenInvalid": true,
                "passwordInvalid": true,
                "authToken": null
            })
        );
    }
}
