/// Reference credential pair loaded from the secrets file; immutable for
/// the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    #[must_use]
    pub fn matches(&self, candidate_username: &str, candidate_password: &str) -> bool {
        authenticate(
            candidate_username,
            candidate_password,
            &self.username,
            &self.password,
        )
    }
}

/// Exact-match credential gate: true iff both fields match the reference
/// pair byte for byte. Case-sensitive, no normalization, no hashing.
/// Total over all string inputs; never fails.
#[must_use]
pub fn authenticate(
    candidate_username: &str,
    candidate_password: &str,
    reference_username: &str,
    reference_password: &str,
) -> bool {
    candidate_username == reference_username && candidate_password == reference_password
}

#[cfg(test)]
mod tests {
    use super::{authenticate, Credentials};

    #[test]
    fn exact_pair_authenticates() {
        assert!(authenticate("admin", "hunter2", "admin", "hunter2"));
    }

    #[test]
    fn any_single_field_mismatch_rejects() {
        assert!(!authenticate("admin", "hunter3", "admin", "hunter2"));
        assert!(!authenticate("admins", "hunter2", "admin", "hunter2"));
        assert!(!authenticate("", "hunter2", "admin", "hunter2"));
        assert!(!authenticate("admin", "", "admin", "hunter2"));
    }

    #[test]
    fn comparison_is_case_sensitive_and_untrimmed() {
        assert!(!authenticate("Admin", "hunter2", "admin", "hunter2"));
        assert!(!authenticate("admin", "Hunter2", "admin", "hunter2"));
        assert!(!authenticate(" admin", "hunter2", "admin", "hunter2"));
        assert!(!authenticate("admin", "hunter2 ", "admin", "hunter2"));
    }

    #[test]
    fn credentials_matches_mirrors_the_free_function() {
        let credentials = Credentials::new("admin", "hunter2");
        assert!(credentials.matches("admin", "hunter2"));
        assert!(!credentials.matches("admin", "wrong"));
    }
}
