//! Client-side checks run before any network round-trip.

/// Reject tokens that do not start with `prefix`.
pub fn validate_token_prefix(value: &str, prefix: &str) -> Result<(), String> {
    if value.trim().starts_with(prefix) {
        Ok(())
    } else {
        Err(format!(
            "Please enter a valid token, should begin with '{prefix}'"
        ))
    }
}

/// Reject empty answers for mandatory fields.
pub fn validate_non_empty(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err("A value is required".to_string())
    } else {
        Ok(())
    }
}

/// Which of the two accepted GitHub scope sets a token carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeGrant {
    Private,
    Public,
}

/// Token must hold every scope of at least one of two sets.
#[derive(Debug, Clone, Copy)]
pub struct ScopePolicy {
    pub private: &'static [&'static str],
    pub public: &'static [&'static str],
}

impl ScopePolicy {
    pub const GITHUB: ScopePolicy = ScopePolicy {
        private: &["repo", "read:org"],
        public: &["repo:status", "public_repo"],
    };

    pub fn scopes_for(&self, grant: ScopeGrant) -> &'static [&'static str] {
        match grant {
            ScopeGrant::Private => self.private,
            ScopeGrant::Public => self.public,
        }
    }

    /// Private access is checked first since it is the wider grant.
    pub fn evaluate<S: AsRef<str>>(&self, granted: &[S]) -> Option<ScopeGrant> {
        let has_all = |required: &[&str]| {
            required
                .iter()
                .all(|scope| granted.iter().any(|g| g.as_ref() == *scope))
        };
        if has_all(self.private) {
            Some(ScopeGrant::Private)
        } else if has_all(self.public) {
            Some(ScopeGrant::Public)
        } else {
            None
        }
    }
}

/// Split an `X-OAuth-Scopes` style header into trimmed, non-empty scopes.
pub fn parse_scope_header(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
