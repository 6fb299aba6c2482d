use secrecy::SecretString;

/// Process-wide configuration, loaded once at startup and read-only after.
#[derive(Clone)]
pub struct GlobalArgs {
    pub token_secret: SecretString,
    pub claim_token_ttl_seconds: u64,
    pub session_token_ttl_seconds: u64,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(
        token_secret: SecretString,
        claim_token_ttl_seconds: u64,
        session_token_ttl_seconds: u64,
    ) -> Self {
        Self {
            token_secret,
            claim_token_ttl_seconds,
            session_token_ttl_seconds,
        }
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("token_secret", &"***")
            .field("claim_token_ttl_seconds", &self.claim_token_ttl_seconds)
            .field("session_token_ttl_seconds", &self.session_token_ttl_seconds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(SecretString::from("hunter2".to_string()), 600, 3600);
        assert_eq!(args.token_secret.expose_secret(), "hunter2");
        assert_eq!(args.claim_token_ttl_seconds, 600);
        assert_eq!(args.session_token_ttl_seconds, 3600);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let args = GlobalArgs::new(SecretString::from("hunter2".to_string()), 600, 3600);
        let debug = format!("{args:?}");
        assert!(debug.contains("***"));
        assert!(!debug.contains("hunter2"));
    }
}
