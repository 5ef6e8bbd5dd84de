use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of JWT: access or refresh.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,             // user ID
    pub email: String,         // email at issue time
    pub token_type: TokenKind, // access or refresh
    pub iat: usize,            // issued at (unix timestamp)
    pub exp: usize,            // expires at (unix timestamp)
    pub iss: String,           // issuer
    pub aud: String,           // audience
}
