pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, cost)
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    bcrypt::verify(password, stored_hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_matching_password() {
        let hashed = hash_password("correct horse", 4).unwrap();
        assert!(verify_password("correct horse", &hashed));
        assert!(!verify_password("wrong horse", &hashed));
    }

    #[test]
    fn malformed_hash_never_matches() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }
}
