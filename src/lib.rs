//! # Enskribo (Two-Phase Account Registration)
//!
//! `enskribo` registers accounts in two phases. Phase 1 (`POST
//! /registration/initialize`) validates an email/username pair, checks that
//! neither is taken, and hands back a signed, expiring claim token that
//! reserves the pair for its holder. Phase 2 (`POST
//! /registration/finalize`) exchanges a valid claim token plus a credential
//! for an account and a session token.
//!
//! ## Statelessness
//!
//! No registration state is stored between the phases: the claim token
//! carries the claimed pair (and, when the email already maps to a profile,
//! the profile identity), signed with a process-wide secret and bounded by
//! an embedded expiry. Validity is signature + expiry, never a server-side
//! table.
//!
//! ## Profile linking
//!
//! When the claimed email is already linked to a profile, the token that
//! can attach the new account to that profile is delivered to the mailbox
//! itself, never over the requesting connection. Receiving it is the proof
//! of ownership.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
