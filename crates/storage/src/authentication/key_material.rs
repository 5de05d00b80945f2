use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

const PROC_TYPE_HEADER: &str = "Proc-Type";
const ENCRYPTED_PROC_TYPE: &str = "4,ENCRYPTED";
const ENCRYPTED_PKCS8_TAG: &str = "ENCRYPTED PRIVATE KEY";

/// Resolve key material given either as a path to a PEM file or as literal PEM text.
///
/// Files are checked for a PEM block and rejected if password protected.
/// Literal material is passed through untouched.
pub fn load_key_material(material: &str) -> Result<Vec<u8>> {
    let path = Path::new(material);
    if std::fs::metadata(path).is_err() {
        return Ok(material.as_bytes().to_vec());
    }

    debug!(path = %path.display(), "reading key material from file");
    let bytes = std::fs::read(path).map_err(|source| Error::KeyRead {
        path: path.to_path_buf(),
        source,
    })?;

    let block = pem::parse(&bytes).map_err(|_| Error::NoKeyFound(material.to_string()))?;
    if is_encrypted(&block) {
        return Err(Error::EncryptedKey(material.to_string()));
    }

    Ok(bytes)
}

pub(crate) fn is_encrypted(block: &pem::Pem) -> bool {
    block.tag() == ENCRYPTED_PKCS8_TAG
        || block.headers().get(PROC_TYPE_HEADER) == Some(ENCRYPTED_PROC_TYPE)
}
