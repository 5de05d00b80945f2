use md5::{Digest, Md5};
use rsa::traits::PublicKeyParts;
use ssh_key::public::{KeyData, RsaPublicKey};
use ssh_key::{HashAlg, Mpint, PublicKey};

use crate::error::{Error, Result};

/// SSH form of an RSA public key.
pub fn rsa_public_key(key: &rsa::RsaPublicKey) -> Result<PublicKey> {
    let mpint = |bytes: Vec<u8>| {
        Mpint::from_positive_bytes(&bytes).map_err(|e| Error::InvalidKey(e.to_string()))
    };
    let key_data = KeyData::Rsa(RsaPublicKey {
        e: mpint(key.e().to_bytes_be())?,
        n: mpint(key.n().to_bytes_be())?,
    });
    Ok(PublicKey::from(key_data))
}

/// Legacy MD5 fingerprint, e.g. `a1:b2:...`. This is the form used in key ids.
pub fn md5_fingerprint(key: &PublicKey) -> Result<String> {
    let blob = key
        .to_bytes()
        .map_err(|e| Error::InvalidKey(format!("encoding public key: {e}")))?;
    Ok(Md5::digest(&blob)
        .iter()
        .map(|b| hex::encode([*b]))
        .collect::<Vec<_>>()
        .join(":"))
}

/// OpenSSH style fingerprint, e.g. `SHA256:47DEQpj8...`.
pub fn sha256_fingerprint(key: &PublicKey) -> String {
    key.fingerprint(HashAlg::Sha256).to_string()
}

/// Whether a user supplied key id refers to `key`.
///
/// Accepts `SHA256:` fingerprints, and MD5 fingerprints with or without the
/// `MD5:` prefix.
pub fn matches(key_id: &str, key: &PublicKey) -> Result<bool> {
    let key_id = key_id.trim();
    if key_id.starts_with("SHA256:") {
        return Ok(key_id == sha256_fingerprint(key));
    }
    let md5 = key_id.strip_prefix("MD5:").unwrap_or(key_id);
    Ok(md5.eq_ignore_ascii_case(&md5_fingerprint(key)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssh_key::public::Ed25519PublicKey;

    fn sample_key() -> PublicKey {
        PublicKey::from(KeyData::Ed25519(Ed25519PublicKey([0u8; 32])))
    }

    #[test]
    fn md5_fingerprint_is_colon_separated_hex() {
        let fp = md5_fingerprint(&sample_key()).unwrap();
        assert_eq!(fp.len(), 16 * 3 - 1);
        assert!(fp.split(':').all(|pair| pair.len() == 2));
        assert_eq!(fp, fp.to_lowercase());
    }

    #[test]
    fn sha256_fingerprint_has_no_padding() {
        let fp = sha256_fingerprint(&sample_key());
        assert!(fp.starts_with("SHA256:"));
        assert!(!fp.ends_with('='));
        assert_eq!(fp.len(), "SHA256:".len() + 43);
    }

    #[test]
    fn matches_every_fingerprint_form() {
        let key = sample_key();
        let md5 = md5_fingerprint(&key).unwrap();
        assert!(matches(&md5, &key).unwrap());
        assert!(matches(&md5.to_uppercase(), &key).unwrap());
        assert!(matches(&format!("MD5:{md5}"), &key).unwrap());
        assert!(matches(&sha256_fingerprint(&key), &key).unwrap());
        assert!(!matches("00:11:22", &key).unwrap());
        assert!(!matches("SHA256:nope", &key).unwrap());
    }

    #[test]
    fn rsa_key_round_trips_through_openssh_encoding() {
        use rand_chacha::ChaCha20Rng;
        use rand_chacha::rand_core::SeedableRng;

        let mut rng = ChaCha20Rng::from_seed([9u8; 32]);
        let private_key = rsa::RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let key = rsa_public_key(&private_key.to_public_key()).unwrap();
        assert_eq!(key.algorithm(), ssh_key::Algorithm::Rsa { hash: None });

        let reparsed = PublicKey::from_bytes(&key.to_bytes().unwrap()).unwrap();
        assert_eq!(
            md5_fingerprint(&reparsed).unwrap(),
            md5_fingerprint(&key).unwrap()
        );
    }
}
