//! User profile and access-token claims.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

/// Role within a tenant, normalized to the backend's canonical casing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    TenantAdmin,
    User,
}

impl std::str::FromStr for Role {
    type Err = ();

    /// Case-insensitive parse; backends have emitted both casings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            "TENANT_ADMIN" => Ok(Role::TenantAdmin),
            "USER" => Ok(Role::User),
            _ => Err(()),
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(|_| {
            serde::de::Error::unknown_variant(&raw, &["SUPER_ADMIN", "TENANT_ADMIN", "USER"])
        })
    }
}

/// Immutable profile snapshot, replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    pub role: Role,
    /// Owning tenant (organizational scope for every request)
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Claims we read out of the access token payload.
///
/// Used only as a fallback for tenant/user scoping when no profile is
/// cached; the token is never validated client-side.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

impl AccessClaims {
    /// Decode the payload segment of a JWT without verifying it.
    pub fn decode(token: &str) -> Option<Self> {
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload.as_bytes()).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// User id, preferring the explicit claim over the subject.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref().or(self.sub.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

    fn fake_jwt(payload: serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
        format!("{}.{}.sig", header, body)
    }

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!("tenant_admin".parse::<Role>(), Ok(Role::TenantAdmin));
        assert_eq!("SUPER_ADMIN".parse::<Role>(), Ok(Role::SuperAdmin));
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_normalizes_casing() {
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::User);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"USER\"");
        assert!(serde_json::from_str::<Role>("\"owner\"").is_err());
    }

    #[test]
    fn test_claims_decode() {
        let token = fake_jwt(serde_json::json!({
            "sub": "u-1", "tenant_id": "t-9", "exp": 0
        }));
        let claims = AccessClaims::decode(&token).unwrap();
        assert_eq!(claims.user_id(), Some("u-1"));
        assert_eq!(claims.tenant_id.as_deref(), Some("t-9"));
    }

    #[test]
    fn test_claims_decode_garbage() {
        assert!(AccessClaims::decode("not-a-jwt").is_none());
        assert!(AccessClaims::decode("a.%%%.c").is_none());
    }
}
