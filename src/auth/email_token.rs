use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

const TOKEN_LENGTH: usize = 40;

/// One-time tokens confirming an email change. Only the hash is persisted.
pub struct EmailTokenService;

impl EmailTokenService {
    pub fn generate_token() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect()
    }

    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn matches(token: &str, stored_hash: &str) -> bool {
        token.len() == TOKEN_LENGTH && Self::hash_token(token) == stored_hash
    }
}
