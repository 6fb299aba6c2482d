//! Minimal HS256 compact-token primitives.
//!
//! Tokens are `base64url(header).base64url(claims).base64url(mac)` with
//! unpadded encoding. The header and signature are verified before the
//! payload is parsed; expiry policy belongs to the typed claim layer.

use crate::error::Error;
use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

impl Header {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: DeserializeOwned>(s: &str) -> Result<T, Error> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| Error::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn mac(secret: &[u8], signing_input: &str) -> Result<HmacSha256, Error> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| Error::InvalidKey)?;
    mac.update(signing_input.as_bytes());
    Ok(mac)
}

/// Encode `claims` as an HS256-signed compact token.
///
/// # Errors
///
/// Returns an error if the key is rejected by the MAC or the claims cannot
/// be encoded as JSON.
pub fn encode_hs256<T: Serialize>(secret: &[u8], claims: &T) -> Result<String, Error> {
    let header_b64 = b64e_json(&Header::hs256())?;
    let claims_b64 = b64e_json(claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");

    let signature = mac(secret, &signing_input)?.finalize().into_bytes();
    let sig_b64 = Base64UrlUnpadded::encode_string(&signature);

    Ok(format!("{signing_input}.{sig_b64}"))
}

/// Decode an HS256 compact token, verifying structure, header, and
/// signature before the payload is parsed.
///
/// This does not check `exp`; callers with typed claims must do that.
///
/// # Errors
///
/// Returns `TokenFormat` for anything other than three dot-separated parts,
/// `InvalidHeader` for an unexpected `alg`/`typ`, `InvalidSignature` when
/// the MAC does not verify, and `Base64`/`Json` for malformed segments.
pub fn decode_hs256<T: DeserializeOwned>(secret: &[u8], token: &str) -> Result<T, Error> {
    let mut parts = token.trim().split('.');
    let (Some(header_b64), Some(claims_b64), Some(sig_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::TokenFormat);
    };

    let header: Header = b64d_json(header_b64)?;
    if header.alg != "HS256" || !header.typ.eq_ignore_ascii_case("JWT") {
        return Err(Error::InvalidHeader);
    }

    let signing_input = format!("{header_b64}.{claims_b64}");
    let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| Error::Base64)?;
    mac(secret, &signing_input)?
        .verify_slice(&signature)
        .map_err(|_| Error::InvalidSignature)?;

    b64d_json(claims_b64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"hs256-unit-secret";

    #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
    struct Payload {
        name: String,
        n: u32,
    }

    fn payload() -> Payload {
        Payload {
            name: "claim".to_string(),
            n: 7,
        }
    }

    #[test]
    fn roundtrip() -> Result<(), Error> {
        let token = encode_hs256(SECRET, &payload())?;
        let decoded: Payload = decode_hs256(SECRET, &token)?;
        assert_eq!(decoded, payload());
        Ok(())
    }

    #[test]
    fn rejects_wrong_part_count() {
        let token = encode_hs256(SECRET, &payload()).unwrap();

        let two_parts = token.rsplit_once('.').unwrap().0;
        let result: Result<Payload, Error> = decode_hs256(SECRET, two_parts);
        assert!(matches!(result, Err(Error::TokenFormat)));

        let four_parts = format!("{token}.extra");
        let result: Result<Payload, Error> = decode_hs256(SECRET, &four_parts);
        assert!(matches!(result, Err(Error::TokenFormat)));
    }

    #[test]
    fn rejects_unexpected_header() -> Result<(), Error> {
        // Re-sign with a "none" header so only the header check can fail.
        let header = Header {
            alg: "none".to_string(),
            typ: "JWT".to_string(),
        };
        let header_b64 = b64e_json(&header)?;
        let claims_b64 = b64e_json(&payload())?;
        let signing_input = format!("{header_b64}.{claims_b64}");
        let signature = mac(SECRET, &signing_input)?.finalize().into_bytes();
        let token = format!(
            "{signing_input}.{}",
            Base64UrlUnpadded::encode_string(&signature)
        );

        let result: Result<Payload, Error> = decode_hs256(SECRET, &token);
        assert!(matches!(result, Err(Error::InvalidHeader)));
        Ok(())
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = encode_hs256(SECRET, &payload()).unwrap();
        let result: Result<Payload, Error> = decode_hs256(b"other-secret", &token);
        assert!(matches!(result, Err(Error::InvalidSignature)));
    }

    #[test]
    fn rejects_tampered_payload() {
        let token = encode_hs256(SECRET, &payload()).unwrap();
        let other = encode_hs256(
            SECRET,
            &Payload {
                name: "other".to_string(),
                n: 8,
            },
        )
        .unwrap();

        // Payload from one token, signature from another.
        let (signed_part, _) = token.rsplit_once('.').unwrap();
        let (_, other_sig) = other.rsplit_once('.').unwrap();
        let spliced = format!("{signed_part}.{other_sig}");

        let result: Result<Payload, Error> = decode_hs256(SECRET, &spliced);
        assert!(matches!(result, Err(Error::InvalidSignature)));
    }
}
