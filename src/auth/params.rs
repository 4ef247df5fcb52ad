//! Wire shapes for the login handshake.
//!
//! Requests are built here and handed to the host as query strings or
//! JSON bodies; responses parse back into typed structs. Field names
//! follow the host's camelCase convention exactly.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Parameters for the browser authorization request.
///
/// Rendered as a query string appended to the host's authorize
/// endpoint; the user approves the request in their browser.
#[derive(Debug, Clone)]
pub struct AuthorizationParams {
    /// Identifier the host shows the user (the app's domain)
    pub client_id: String,
    /// Client category, "app" for this crate
    pub client_type: String,
    /// Free-form client description
    pub client_info: String,
    /// base64url JWK of the ephemeral public key
    pub public_key: String,
    /// JSON-encoded permission request
    pub permission_request: String,
    /// Opaque token correlating the callback with this attempt
    pub state: String,
    /// Where the host redirects after approval
    pub redirect_uri: String,
}

impl AuthorizationParams {
    /// Render as a URL-encoded query string.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.client_id)
            .append_pair("client_type", &self.client_type)
            .append_pair("client_info", &self.client_info)
            .append_pair("public_key", &self.public_key)
            .append_pair("permission_request", &self.permission_request)
            .append_pair("state", &self.state)
            .append_pair("redirect_uri", &self.redirect_uri)
            .finish()
    }

    /// Build the full authorization URL for the browser.
    pub fn to_url(&self, authorize_endpoint: &str) -> String {
        format!("{}?{}", authorize_endpoint, self.to_query_string())
    }
}

/// Access to one drive requested during authorization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DriveAccessRequest {
    /// Drive alias (hex identifier)
    pub alias: String,
    /// Drive type (hex identifier)
    #[serde(rename = "type")]
    pub drive_type: String,
    /// Display name shown on the consent screen
    pub name: String,
    /// Purpose shown on the consent screen
    pub description: String,
    /// Permission bits requested on the drive
    pub permissions: i32,
}

/// The app-level permission request embedded in the authorization URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppPermissionParams {
    /// Stable app identifier
    pub app_id: String,
    /// Display name shown on the consent screen
    pub app_name: String,
    /// Drives the app wants access to
    pub drives: Vec<DriveAccessRequest>,
    /// Host-defined permission keys
    pub permission_keys: Vec<i32>,
}

impl AppPermissionParams {
    /// JSON string form, placed in the `permission_request` parameter.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Parameters the host sends back on the redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    /// The identity that approved the request
    pub identity: String,
    /// Host's ephemeral public key, base64url JWK
    pub public_key: String,
    /// base64 salt for the HKDF step
    pub salt: String,
    /// The state token from the authorization request
    pub state: String,
}

impl CallbackParams {
    /// Parse the redirect URL's query parameters.
    pub fn from_url(callback_url: &str) -> Result<Self> {
        let url = Url::parse(callback_url)
            .map_err(|e| Error::DeserializationError(format!("bad callback URL: {}", e)))?;

        let mut identity = None;
        let mut public_key = None;
        let mut salt = None;
        let mut state = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "identity" => identity = Some(value.into_owned()),
                "public_key" => public_key = Some(value.into_owned()),
                "salt" => salt = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                _ => {}
            }
        }

        let require = |field: Option<String>, name: &str| {
            field.ok_or_else(|| {
                Error::DeserializationError(format!("callback missing parameter: {}", name))
            })
        };
        Ok(Self {
            identity: require(identity, "identity")?,
            public_key: require(public_key, "public_key")?,
            salt: require(salt, "salt")?,
            state: require(state, "state")?,
        })
    }
}

/// Body of the token exchange request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    /// base64 SHA-256 of the exchanged secret
    pub secret_digest: String,
}

/// Body of the token exchange response.
///
/// Each field pairs a ciphertext with its IV; everything decrypts
/// under the exchanged secret.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Wrapped session shared secret
    pub base64_shared_secret_cipher: String,
    /// IV for the shared secret
    pub base64_shared_secret_iv: String,
    /// Wrapped client auth token
    pub base64_client_auth_token_cipher: String,
    /// IV for the client auth token
    pub base64_client_auth_token_iv: String,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_encodes_reserved_characters() {
        let params = AuthorizationParams {
            client_id: "app.example.com".to_string(),
            client_type: "app".to_string(),
            client_info: "Example App".to_string(),
            public_key: "eyJrdHkiOiJFQyJ9".to_string(),
            permission_request: r#"{"appId":"1234"}"#.to_string(),
            state: "abc-123".to_string(),
            redirect_uri: "https://app.example.com/auth/finish?x=1".to_string(),
        };

        let qs = params.to_query_string();
        assert!(qs.contains("client_id=app.example.com"));
        assert!(qs.contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Fauth%2Ffinish%3Fx%3D1"));
        assert!(qs.contains("permission_request=%7B%22appId%22%3A%221234%22%7D"));

        let full = params.to_url("https://id.example.com/api/owner/v1/youauth/authorize");
        assert!(full.starts_with("https://id.example.com/"));
        assert!(full.contains('?'));
    }

    #[test]
    fn test_permission_params_json_is_camel_case() {
        let params = AppPermissionParams {
            app_id: "1234".to_string(),
            app_name: "Example".to_string(),
            drives: vec![DriveAccessRequest {
                alias: "aa".to_string(),
                drive_type: "bb".to_string(),
                name: "Photos".to_string(),
                description: "Photo library".to_string(),
                permissions: 3,
            }],
            permission_keys: vec![10],
        };

        let json = params.to_json().unwrap();
        assert!(json.contains("\"appId\""));
        assert!(json.contains("\"permissionKeys\""));
        assert!(json.contains("\"type\":\"bb\""));

        let parsed: AppPermissionParams = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, params);
    }

    #[test]
    fn test_callback_params_from_url() {
        let url = "https://app.example.com/auth/finish?identity=alice.example.com\
                   &public_key=eyJrdHkiOiJFQyJ9&salt=c2FsdHNhbHRzYWx0c2FsdA%3D%3D&state=tok-1";
        let params = CallbackParams::from_url(url).unwrap();
        assert_eq!(params.identity, "alice.example.com");
        assert_eq!(params.salt, "c2FsdHNhbHRzYWx0c2FsdA==");
        assert_eq!(params.state, "tok-1");
    }

    #[test]
    fn test_callback_params_missing_field() {
        let url = "https://app.example.com/auth/finish?identity=alice.example.com&state=tok-1";
        let err = CallbackParams::from_url(url).unwrap_err();
        assert!(matches!(err, Error::DeserializationError(_)));
        assert!(err.to_string().contains("public_key"));
    }

    #[test]
    fn test_token_response_field_names() {
        let json = r#"{
            "base64SharedSecretCipher": "AAAA",
            "base64SharedSecretIv": "BBBB",
            "base64ClientAuthTokenCipher": "CCCC",
            "base64ClientAuthTokenIv": "DDDD"
        }"#;
        let parsed: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.base64_shared_secret_cipher, "AAAA");
        assert_eq!(parsed.base64_client_auth_token_iv, "DDDD");
    }
}
