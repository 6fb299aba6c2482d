mod claims;
mod error;
mod hs256;

pub use claims::{
    RegistrationClaims, SessionClaims, TOKEN_VERSION, sign_registration, sign_session,
    verify_registration, verify_session,
};
pub use error::Error;
pub use hs256::{decode_hs256, encode_hs256};
