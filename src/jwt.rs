//! Signed token mint/decode.
//!
//! Tokens are HS256 JWTs carrying `{category, sub, role, exp, iat}`. The
//! codec is stateless: keys are derived once from the configured secret and
//! the same instance is shared across all requests. Expiry is validated with
//! zero leeway so that `exp <= now` always surfaces as [`TokenError::Expired`],
//! never as a successful decode.

use jsonwebtoken::{
    errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Role;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("malformed token: {0}")]
    Malformed(#[source] jsonwebtoken::errors::Error),

    #[error("token encoding failed: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
}

/// What a token is good for. Only `access` tokens grant resource access;
/// a `refresh` token presented in the access position is rejected outright,
/// however valid it is otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenCategory {
    Access,
    Refresh,
}

impl TokenCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenCategory::Access => "access",
            TokenCategory::Refresh => "refresh",
        }
    }
}

#[derive(Debug, Error)]
#[error("unrecognized token category: {0}")]
pub struct UnknownCategory(pub String);

impl std::str::FromStr for TokenCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, UnknownCategory> {
        match s {
            "access" => Ok(TokenCategory::Access),
            "refresh" => Ok(TokenCategory::Refresh),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// Claims carried by every token this service mints or accepts.
///
/// `role` stays a raw string here; converting it to [`Role`] is an explicit
/// fallible step at the consumer so an unrecognized name is its own error,
/// distinct from a decode failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub category: TokenCategory,
    pub sub: String,
    pub role: String,
    pub exp: u64,
    pub iat: u64,
}

pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    header: Header,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            header: Header::new(Algorithm::HS256),
        }
    }

    /// Mint a signed token with `exp = now + ttl`.
    pub fn mint(
        &self,
        category: TokenCategory,
        subject: &str,
        role: Role,
        ttl: chrono::Duration,
    ) -> Result<String, TokenError> {
        let now = chrono::Utc::now();
        let claims = Claims {
            category,
            sub: subject.to_string(),
            role: role.as_str().to_string(),
            exp: (now + ttl).timestamp() as u64,
            iat: now.timestamp() as u64,
        };
        jsonwebtoken::encode(&self.header, &claims, &self.encoding).map_err(TokenError::Encoding)
    }

    /// Decode and validate a token. `Expired` is reported only when the
    /// signature and shape are otherwise sound; anything else is `Malformed`.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        match jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Malformed(e)),
            },
        }
    }
}

// ── Tests ────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn codec() -> TokenCodec {
        TokenCodec::new("unit-test-secret")
    }

    #[test]
    fn test_mint_decode_round_trip() {
        let before = Utc::now().timestamp() as u64;
        let token = codec()
            .mint(TokenCategory::Access, "user-1", Role::Editor, Duration::minutes(10))
            .unwrap();
        let claims = codec().decode(&token).unwrap();

        assert_eq!(claims.category, TokenCategory::Access);
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, "editor");
        assert!(claims.exp >= before);
        assert!(claims.exp <= (Utc::now() + Duration::minutes(10)).timestamp() as u64);
    }

    #[test]
    fn test_refresh_category_round_trip() {
        let token = codec()
            .mint(TokenCategory::Refresh, "user-2", Role::Viewer, Duration::days(1))
            .unwrap();
        let claims = codec().decode(&token).unwrap();
        assert_eq!(claims.category, TokenCategory::Refresh);
    }

    #[test]
    fn test_expired_token_reports_expired() {
        let token = codec()
            .mint(TokenCategory::Access, "user-3", Role::Admin, Duration::seconds(-30))
            .unwrap();
        assert!(matches!(codec().decode(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_tampered_signature_is_malformed() {
        let token = codec()
            .mint(TokenCategory::Access, "user-4", Role::Admin, Duration::minutes(5))
            .unwrap();
        let other = TokenCodec::new("a-different-secret");
        assert!(matches!(other.decode(&token), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(codec().decode("not-a-jwt"), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_unknown_category_is_malformed() {
        // Hand-roll claims with a category outside the enum.
        let claims = serde_json::json!({
            "category": "session",
            "sub": "user-5",
            "role": "admin",
            "exp": (Utc::now() + Duration::minutes(5)).timestamp(),
            "iat": Utc::now().timestamp(),
        });
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();
        assert!(matches!(codec().decode(&token), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("access".parse::<TokenCategory>().unwrap(), TokenCategory::Access);
        assert_eq!("refresh".parse::<TokenCategory>().unwrap(), TokenCategory::Refresh);
        assert!("bearer".parse::<TokenCategory>().is_err());
    }
}
