pub mod authentication;
pub mod client;
pub mod directories;
pub mod error;
pub mod objects;

pub use client::{Client, ClientConfig};
pub use error::{Error, Result};
pub use objects::{GetObjectOutput, ObjectInfo, PutObjectInput};
pub use directories::{DirectoryEntry, ListDirectoryOutput};
