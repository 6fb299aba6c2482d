//! Email delivery for account-claim tokens.
//!
//! Delivery is a collaborator, not part of the registration core: the
//! initialize handler hands a recipient and a token to an [`EmailSender`]
//! and moves on. Failed sends are retried in the background with
//! exponential backoff and jitter, then logged; they never fail the request
//! that queued them. Swapping in a real provider (SMTP, API, broker) means
//! implementing `EmailSender`.

use anyhow::Result;
use rand::Rng;
use std::{sync::Arc, time::Duration};
use tokio::time::sleep;
use tracing::{error, info};

const MAX_ATTEMPTS: u32 = 5;
const BACKOFF_BASE: Duration = Duration::from_secs(5);
const BACKOFF_MAX: Duration = Duration::from_secs(300);

/// Message handed to an [`EmailSender`].
#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// Email delivery abstraction.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error so the dispatcher can retry.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            "email send stub"
        );
        Ok(())
    }
}

/// Build the account-claim message for `token` and dispatch it in the
/// background. Fire-and-forget: the caller's response does not wait on
/// delivery.
pub fn send_account_claim_token_email(sender: Arc<dyn EmailSender>, email: &str, token: &str) {
    let message = EmailMessage {
        to_email: email.to_string(),
        subject: "Finish claiming your account".to_string(),
        body: format!(
            "Your account claim token:\n\n{token}\n\n\
             Submit it with your new password to finish registration. \
             The token expires shortly after it was requested."
        ),
    };

    tokio::spawn(async move {
        if let Err(err) = dispatch_with_retry(
            sender.as_ref(),
            &message,
            MAX_ATTEMPTS,
            BACKOFF_BASE,
            BACKOFF_MAX,
        )
        .await
        {
            error!(to_email = %message.to_email, "giving up on claim email: {err}");
        }
    });
}

/// Retry failed sends with exponential backoff and jitter until
/// `max_attempts` is reached.
async fn dispatch_with_retry(
    sender: &dyn EmailSender,
    message: &EmailMessage,
    max_attempts: u32,
    backoff_base: Duration,
    backoff_max: Duration,
) -> Result<()> {
    let mut attempt: u32 = 0;

    loop {
        match sender.send(message) {
            Ok(()) => return Ok(()),
            Err(err) => {
                attempt = attempt.saturating_add(1);
                if attempt >= max_attempts {
                    return Err(err);
                }

                sleep(backoff_delay(attempt, backoff_base, backoff_max)).await;
            }
        }
    }
}

fn backoff_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let exponential = base.saturating_mul(2_u32.saturating_pow(attempt.saturating_sub(1)));
    let capped = exponential.min(max);

    // Up to 10% jitter so concurrent retries spread out
    let jitter_cap = u64::try_from(capped.as_millis() / 10).unwrap_or(0);
    let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_cap));

    capped.saturating_add(jitter)
}
