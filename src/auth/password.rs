use sha2::{Digest, Sha256};

/// Hex SHA-256 of the password. Unsalted, so equal passwords share a digest and
/// login can match on `(email, digest)` directly.
pub fn hash_password(plain: &str) -> String {
    hex::encode(Sha256::digest(plain.as_bytes()))
}
