//! Revoked session tokens.
//!
//! Logout puts the token's `jti` here until the token would have expired
//! anyway. Expired entries are pruned on every revoke.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct RevokedTokens {
    /// jti → exp (unix seconds)
    entries: HashMap<String, i64>,
}

impl RevokedTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoke(&mut self, jti: &str, exp: i64, now: i64) {
        self.entries.retain(|_, e| *e > now);
        self.entries.insert(jti.to_string(), exp);
    }

    pub fn is_revoked(&self, jti: &str) -> bool {
        self.entries.contains_key(jti)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revoke_and_prune() {
        let mut revoked = RevokedTokens::new();
        revoked.revoke("a", 100, 50);
        assert!(revoked.is_revoked("a"));
        assert!(!revoked.is_revoked("b"));

        // "a" expired at 100, pruned when "b" is revoked at 150
        revoked.revoke("b", 200, 150);
        assert!(!revoked.is_revoked("a"));
        assert!(revoked.is_revoked("b"));
        assert_eq!(revoked.len(), 1);
    }
}
