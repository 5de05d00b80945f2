use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer as _};
use sha2::Sha256;

use super::fingerprint;
use super::key_material::is_encrypted;
use super::signer::{KeyId, Signer, authorization_header, encode_signature, signing_string};
use crate::error::{Error, Result};

const ALGORITHM: &str = "rsa-sha256";

pub struct PrivateKeySignerInput {
    pub key_id: String,
    pub private_key_material: Vec<u8>,
    pub account_name: String,
    pub username: Option<String>,
}

/// RSA PKCS#1 v1.5 signer with SHA-256 digest, backed by an in-memory PEM key.
pub struct PrivateKeySigner {
    signing_key: SigningKey<Sha256>,
    fingerprint: String,
    account_name: String,
    username: Option<String>,
}

impl PrivateKeySigner {
    pub fn new(input: PrivateKeySignerInput) -> Result<Self> {
        if input.account_name.is_empty() {
            return Err(Error::MissingAccountName);
        }

        let private_key = parse_private_key(&input.private_key_material)?;
        let public_key = fingerprint::rsa_public_key(&private_key.to_public_key())?;
        let md5 = fingerprint::md5_fingerprint(&public_key)?;
        if !fingerprint::matches(&input.key_id, &public_key)? {
            return Err(Error::FingerprintMismatch {
                expected: input.key_id,
                actual: md5,
            });
        }

        Ok(Self {
            signing_key: SigningKey::<Sha256>::new(private_key),
            fingerprint: md5,
            account_name: input.account_name,
            username: input.username,
        })
    }
}

fn parse_private_key(material: &[u8]) -> Result<RsaPrivateKey> {
    let block = pem::parse(material).map_err(|e| Error::InvalidKey(e.to_string()))?;
    if is_encrypted(&block) {
        return Err(Error::EncryptedKey("<inline>".into()));
    }

    match block.tag() {
        "RSA PRIVATE KEY" => RsaPrivateKey::from_pkcs1_der(block.contents())
            .map_err(|e| Error::InvalidKey(format!("decoding PKCS#1 key: {e}"))),
        "PRIVATE KEY" => RsaPrivateKey::from_pkcs8_der(block.contents())
            .map_err(|e| Error::InvalidKey(format!("decoding PKCS#8 key: {e}"))),
        "OPENSSH PRIVATE KEY" => Err(Error::InvalidKey(
            "OpenSSH format keys are not supported, convert with `ssh-keygen -p -m PEM`".into(),
        )),
        other => Err(Error::InvalidKey(format!("unsupported PEM block '{other}'"))),
    }
}

impl Signer for PrivateKeySigner {
    fn key_fingerprint(&self) -> &str {
        &self.fingerprint
    }

    fn default_algorithm(&self) -> &str {
        ALGORITHM
    }

    fn sign_raw(&self, data: &[u8]) -> Result<(String, String)> {
        let signature = self.signing_key.sign(data);
        Ok((encode_signature(&signature.to_vec()), ALGORITHM.to_string()))
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
