use crate::api::{
    email::{EmailSender, send_account_claim_token_email},
    handlers::{normalize_email, storage, valid_email, valid_username},
    tokens::ClaimSigner,
};
use axum::{Json, extract::Extension, http::StatusCode};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegistrationInitialize {
    email: String,
    username: String,
}

/// Fixed-shape phase-1 result: the validation flags are always present,
/// the availability and profile fields stay `null` until their check ran.
#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationInitializeResponse {
    pub email_invalid: bool,
    pub username_invalid: bool,
    pub email_claimed: Option<bool>,
    pub username_claimed: Option<bool>,
    pub profile_exists: Option<bool>,
    pub claim_token: Option<String>,
}

impl RegistrationInitializeResponse {
    fn rejected(email_invalid: bool, username_invalid: bool) -> Self {
        Self {
            email_invalid,
            username_invalid,
            email_claimed: None,
            username_claimed: None,
            profile_exists: None,
            claim_token: None,
        }
    }
}

type InitializeResponse =
    Result<(StatusCode, Json<RegistrationInitializeResponse>), (StatusCode, String)>;

#[utoipa::path(
    post,
    path= "/registration/initialize",
    request_body = RegistrationInitialize,
    responses (
        (status = 200, description = "Pair reserved, claim token issued", body = RegistrationInitializeResponse),
        (status = 400, description = "Invalid or already claimed email/username", body = RegistrationInitializeResponse),
        (status = 500, description = "Store or signing failure", body = String)
    ),
    tag= "registration"
)]
#[instrument(skip(pool, signer, sender, payload))]
pub async fn registration_initialize(
    pool: Extension<PgPool>,
    signer: Extension<Arc<ClaimSigner>>,
    sender: Extension<Arc<dyn EmailSender>>,
    payload: Option<Json<RegistrationInitialize>>,
) -> InitializeResponse {
    let Some(Json(request)) = payload else {
        return Err((StatusCode::BAD_REQUEST, "Missing payload".to_string()));
    };

    debug!("registration initialize: {:?}", request);

    let email = normalize_email(&request.email);
    let username = request.username;

    // Both validation flags are reported together, never short-circuited
    let email_invalid = !valid_email(&email);
    let username_invalid = !valid_username(&username);
    if email_invalid || username_invalid {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(RegistrationInitializeResponse::rejected(
                email_invalid,
                username_invalid,
            )),
        ));
    }

    // Availability of both is answered in one round trip
    let email_claimed = storage::email_taken(&pool, &email).await.map_err(|err| {
        error!("Error checking email availability: {err}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error checking email availability".to_string(),
        )
    })?;

    let username_claimed = storage::username_taken(&pool, &username)
        .await
        .map_err(|err| {
            error!("Error checking username availability: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error checking username availability".to_string(),
            )
        })?;

    if email_claimed || username_claimed {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(RegistrationInitializeResponse {
                email_invalid: false,
                username_invalid: false,
                email_claimed: Some(email_claimed),
                username_claimed: Some(username_claimed),
                profile_exists: None,
                claim_token: None,
            }),
        ));
    }

    // The pair is free: this token reserves it for whoever holds it
    let claim_token = signer
        .mint_claim_token(&email, &username, None)
        .map_err(|err| {
            error!("Error signing claim token: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error signing claim token".to_string(),
            )
        })?;

    let profile_uuid = storage::find_profile_uuid_by_email(&pool, &email)
        .await
        .map_err(|err| {
            error!("Error looking up profile: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error looking up profile".to_string(),
            )
        })?;

    // A linked profile is only claimable through its mailbox: the token
    // carrying profile_uuid goes out by email, never over this connection
    if let Some(uuid) = profile_uuid {
        let profile_token = signer
            .mint_claim_token(&email, &username, Some(uuid))
            .map_err(|err| {
                error!("Error signing profile claim token: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error signing profile claim token".to_string(),
                )
            })?;

        send_account_claim_token_email(sender.0.clone(), &email, &profile_token);
    }

    Ok((
        StatusCode::OK,
        Json(RegistrationInitializeResponse {
            email_invalid: false,
            username_invalid: false,
            email_claimed: Some(false),
            username_claimed: Some(false),
            profile_exists: Some(profile_uuid.is_some()),
            claim_token: Some(claim_token),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejected_response_leaves_unreached_fields_null() {
        let response = RegistrationInitializeResponse::rejected(false, true);

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "emailInvalid": false,
                "usernameInvalid": true,
                "emailClaimed": null,
                "usernameClaimed": null,
                "profileExists": null,
                "claimToken": null
            })
        );
    }

    #[test]
    fn success_response_serializes_camel_case() {
        let response = RegistrationInitializeResponse {
            email_invalid: false,
            username_invalid: false,
            email_claimed: Some(false),
            username_claimed: Some(false),
            profile_exists: Some(true),
            claim_token: Some("token".to_string()),
        };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "emailInvalid": false,
                "usernameInvalid": false,
                "emailClaimed": false,
                "usernameClaimed": false,
                "profileExists": true,
                "claimToken": "token"
            })
        );
    }

    #[test]
    fn request_deserializes_plain_fields() {
        let request: RegistrationInitialize =
            serde_json::from_value(json!({"email": "a@x.test", "username": "abc"})).unwrap();

        assert_eq!(request.email, "a@x.test");
        assert_eq!(request.username, "abc");
    }
}
