mod fingerprint;
mod key_material;
mod private_key;
mod signer;
#[cfg(unix)]
mod ssh_agent;

pub use fingerprint::{md5_fingerprint, rsa_public_key, sha256_fingerprint};
pub use key_material::load_key_material;
pub use private_key::{PrivateKeySigner, PrivateKeySignerInput};
pub use signer::{KeyId, Signer};
#[cfg(unix)]
pub use ssh_agent::{SshAgentSigner, SshAgentSignerInput};
