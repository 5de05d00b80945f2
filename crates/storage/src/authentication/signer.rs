use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::Result;

const AUTHORIZATION_HEADER_FORMAT_HEADERS: &str = "date";

/// Trait for signing outgoing storage requests.
///
/// Implementations are sync. Agent-backed signers block on a socket, so
/// async callers should move signing onto `spawn_blocking`.
pub trait Signer: Send + Sync {
    /// MD5 fingerprint of the signing key, colon separated.
    fn key_fingerprint(&self) -> &str;

    /// HTTP signature algorithm name (e.g. "rsa-sha256").
    fn default_algorithm(&self) -> &str;

    /// Sign raw bytes. Returns the base64 signature and the algorithm used.
    fn sign_raw(&self, data: &[u8]) -> Result<(String, String)>;

    /// Build the `Authorization` header value for a request carrying `date_header`.
    fn sign(&self, date_header: &str, is_manta: bool) -> Result<String>;
}

/// Identifies the key a request was signed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyId {
    pub account_name: String,
    pub user_name: Option<String>,
    pub fingerprint: String,
    pub is_manta: bool,
}

impl KeyId {
    pub fn generate(&self) -> String {
        match self.user_name.as_deref().filter(|name| !name.is_empty()) {
            Some(user) if self.is_manta => {
                format!("/{}/{}/keys/{}", self.account_name, user, self.fingerprint)
            }
            Some(user) => format!(
                "/{}/users/{}/keys/{}",
                self.account_name, user, self.fingerprint
            ),
            None => format!("/{}/keys/{}", self.account_name, self.fingerprint),
        }
    }
}

pub(crate) fn signing_string(date_header: &str) -> String {
    format!("{AUTHORIZATION_HEADER_FORMAT_HEADERS}: {date_header}")
}

pub(crate) fn authorization_header(key_id: &KeyId, algorithm: &str, signature: &str) -> String {
    format!(
        "Signature keyId=\"{}\",algorithm=\"{}\",headers=\"{}\",signature=\"{}\"",
        key_id.generate(),
        algorithm,
        AUTHORIZATION_HEADER_FORMAT_HEADERS,
        signature,
    )
}

pub(crate) fn encode_signature(raw: &[u8]) -> String {
    STANDARD.encode(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_id(user: Option<&str>, is_manta: bool) -> KeyId {
        KeyId {
            account_name: "acct".into(),
            user_name: user.map(String::from),
            fingerprint: "aa:bb".into(),
            is_manta,
        }
    }

    #[test]
    fn account_key_id() {
        assert_eq!(key_id(None, true).generate(), "/acct/keys/aa:bb");
        assert_eq!(key_id(None, false).generate(), "/acct/keys/aa:bb");
    }

    #[test]
    fn empty_user_is_account_key() {
        assert_eq!(key_id(Some(""), true).generate(), "/acct/keys/aa:bb");
    }

    #[test]
    fn manta_subuser_key_id() {
        assert_eq!(key_id(Some("bob"), true).generate(), "/acct/bob/keys/aa:bb");
    }

    #[test]
    fn cloudapi_subuser_key_id() {
        assert_eq!(
            key_id(Some("bob"), false).generate(),
            "/acct/users/bob/keys/aa:bb"
        );
    }

    #[test]
    fn authorization_header_layout() {
        let header = authorization_header(&key_id(None, true), "rsa-sha256", "c2ln");
        assert_eq!(
            header,
            "Signature keyId=\"/acct/keys/aa:bb\",algorithm=\"rsa-sha256\",headers=\"date\",signature=\"c2ln\""
        );
    }

    #[test]
    fn signing_string_covers_date_header() {
        assert_eq!(
            signing_string("Sun, 18 Oct 2026 10:00:00 GMT"),
            "date: Sun, 18 Oct 2026 10:00:00 GMT"
        );
    }
}
