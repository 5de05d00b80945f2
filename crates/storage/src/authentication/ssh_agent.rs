use std::path::PathBuf;

use ssh_agent_client_rs::Client as AgentClient;
use ssh_key::{Algorithm, EcdsaCurve, HashAlg, PublicKey};
use tracing::debug;

use super::fingerprint;
use super::signer::{KeyId, Signer, authorization_header, encode_signature, signing_string};
use crate::error::{Error, Result};

pub struct SshAgentSignerInput {
    pub key_id: String,
    pub account_name: String,
    pub username: Option<String>,
    /// Agent socket. Falls back to `$SSH_AUTH_SOCK` when unset.
    pub socket_path: Option<PathBuf>,
}

/// Signer that delegates to a running ssh-agent.
///
/// A fresh connection is opened for every signature.
pub struct SshAgentSigner {
    socket_path: PathBuf,
    public_key: PublicKey,
    fingerprint: String,
    algorithm: &'static str,
    account_name: String,
    username: Option<String>,
}

impl SshAgentSigner {
    pub fn new(input: SshAgentSignerInput) -> Result<Self> {
        if input.account_name.is_empty() {
            return Err(Error::MissingAccountName);
        }

        let socket_path = match input.socket_path {
            Some(path) => path,
            None => std::env::var_os("SSH_AUTH_SOCK")
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
                .ok_or_else(|| Error::Agent("SSH_AUTH_SOCK is not set".into()))?,
        };

        let identities = connect(&socket_path)?
            .list_identities()
            .map_err(|e| Error::Agent(format!("listing identities: {e}")))?;
        debug!(count = identities.len(), "listed ssh agent identities");

        let mut public_key = None;
        for identity in identities {
            if fingerprint::matches(&input.key_id, &identity)? {
                public_key = Some(identity);
                break;
            }
        }
        let public_key = public_key.ok_or_else(|| Error::KeyNotInAgent(input.key_id.clone()))?;
        let algorithm = key_algorithm(&public_key.algorithm())?;

        Ok(Self {
            fingerprint: fingerprint::md5_fingerprint(&public_key)?,
            socket_path,
            public_key,
            algorithm,
            account_name: input.account_name,
            username: input.username,
        })
    }
}

impl Signer for SshAgentSigner {
    fn key_fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn default_algorithm(&self) -> &str {
        self.algorithm
    }

    fn sign_raw(&self, data: &[u8]) -> Result<(String, String)> {
        let signature = connect(&self.socket_path)?
            .sign(&self.public_key, data)
            .map_err(|e| Error::Agent(format!("signing: {e}")))?;

        let (raw, algorithm) = match signature.algorithm() {
            Algorithm::Rsa { hash } => (signature.as_bytes().to_vec(), rsa_algorithm(hash)?),
            Algorithm::Ecdsa {
                curve: EcdsaCurve::NistP256,
            } => {
                let signature = p256::ecdsa::Signature::try_from(&signature)
                    .map_err(|e| Error::Agent(format!("decoding ecdsa signature: {e}")))?;
                (signature.to_der().as_bytes().to_vec(), "ecdsa-sha256")
            }
            Algorithm::Ecdsa {
                curve: EcdsaCurve::NistP384,
            } => {
                let signature = p384::ecdsa::Signature::try_from(&signature)
                    .map_err(|e| Error::Agent(format!("decoding ecdsa signature: {e}")))?;
                (signature.to_der().as_bytes().to_vec(), "ecdsa-sha384")
            }
            Algorithm::Ed25519 => (signature.as_bytes().to_vec(), "ed25519"),
            other => {
                return Err(Error::Agent(format!("unsupported signature type {other}")));
            }
        };

        Ok((encode_signature(&raw), algorithm.to_string()))
    }

    fn sign(&self, date_header: &str, is_manta: bool) -> Result<String> {
        let (signature, algorithm) = self.sign_raw(signing_string(date_header).as_bytes())?;
        let key_id = KeyId {
            account_name: self.account_name.clone(),
            user_name: self.username.clone(),
            fingerprint: self.fingerprint.clone(),
            is_manta,
        };
        Ok(authorization_header(&key_id, &algorithm, &signature))
    }
}

fn connect(socket_path: &std::path::Path) -> Result<AgentClient> {
    AgentClient::connect(socket_path)
        .map_err(|e| Error::Agent(format!("connecting to {}: {e}", socket_path.display())))
}

/// HTTP signature name for a key held by the agent. RSA keys are signed with
/// SHA-512 when the agent supports it.
fn key_algorithm(algorithm: &Algorithm) -> Result<&'static str> {
    match algorithm {
        Algorithm::Rsa { .. } => Ok("rsa-sha512"),
        Algorithm::Ecdsa {
            curve: EcdsaCurve::NistP256,
        } => Ok("ecdsa-sha256"),
        Algorithm::Ecdsa {
            curve: EcdsaCurve::NistP384,
        } => Ok("ecdsa-sha384"),
        Algorithm::Ed25519 => Ok("ed25519"),
        other => Err(Error::Agent(format!("unsupported key type {other}"))),
    }
}

fn rsa_algorithm(hash: Option<HashAlg>) -> Result<&'static str> {
    match hash {
        Some(HashAlg::Sha512) => Ok("rsa-sha512"),
        Some(HashAlg::Sha256) => Ok("rsa-sha256"),
        None => Ok("rsa-sha1"),
        Some(other) => Err(Error::Agent(format!("unsupported rsa hash {other}"))),
    }
}
