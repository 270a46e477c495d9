/// Token and OTP material for the auth-adjacent flows.
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

/// Verification / reset token length (before hashing)
const TOKEN_LENGTH: usize = 32;

/// Login OTP length
const OTP_LENGTH: usize = 6;

/// Verification token validity in hours
pub const VERIFICATION_TOKEN_EXPIRY_HOURS: i64 = 24;

/// Login OTP validity in minutes
pub const OTP_EXPIRY_MINUTES: i64 = 10;

/// Password reset token validity in hours
pub const RESET_TOKEN_EXPIRY_HOURS: i64 = 1;

/// Generate a secure random alphanumeric token
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Generate a random numeric login OTP
pub fn generate_otp() -> String {
    let mut rng = rand::thread_rng();
    (0..OTP_LENGTH)
        .map(|_| rng.gen_range(0..10).to_string())
        .collect()
}

/// Hash a token using SHA-256; only hashes are stored for reset tokens.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_alphanumeric()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_generate_otp() {
        let otp = generate_otp();
        assert_eq!(otp.len(), OTP_LENGTH);
        assert!(otp.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_hash_token() {
        let token = "test_token_123";
        let hash1 = hash_token(token);
        let hash2 = hash_token(token);

        // Same input should produce same hash
        assert_eq!(hash1, hash2);

        // Hash should be 64 characters (SHA-256 hex)
        assert_eq!(hash1.len(), 64);

        // Different input should produce different hash
        let hash3 = hash_token("different_token");
        assert_ne!(hash1, hash3);
    }
}
