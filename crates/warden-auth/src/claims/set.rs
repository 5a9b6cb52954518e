//! Insertion-ordered claim collection.

use indexmap::IndexMap;

use super::claim::Claim;
use super::value::{ClaimMap, ClaimValue};
use crate::AuthResult;

/// Claims keyed by name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimSet {
    claims: IndexMap<String, Claim>,
}

impl ClaimSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a claim, replacing any claim with the same name.
    pub fn put(&mut self, claim: Claim) {
        self.claims.insert(claim.name().to_string(), claim);
    }

    /// Builder-style [`ClaimSet::put`].
    #[must_use]
    pub fn with(mut self, claim: Claim) -> Self {
        self.put(claim);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Claim> {
        self.claims.get(name)
    }

    pub fn get_value(&self, name: &str) -> Option<&ClaimValue> {
        self.get(name).map(Claim::value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.claims.contains_key(name)
    }

    /// Returns `true` if every name is present.
    pub fn has_all<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names.iter().all(|name| self.contains(name.as_ref()))
    }

    pub fn remove(&mut self, name: &str) -> Option<Claim> {
        self.claims.shift_remove(name)
    }

    /// Merges `other` into this set; claims from `other` win on conflict.
    pub fn merge(&mut self, other: ClaimSet) {
        for (name, claim) in other.claims {
            self.claims.insert(name, claim);
        }
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.claims.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Claim> {
        self.claims.values()
    }

    /// Runs every claim's normal-mode temporal check.
    ///
    /// # Errors
    ///
    /// Returns the first failing claim's error.
    pub fn validate_payload_at(&self, now: i64, leeway: i64) -> AuthResult<()> {
        self.iter()
            .try_for_each(|claim| claim.validate_payload(now, leeway))
    }

    /// Runs the refresh-window check against `iat`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExpired` once the window has elapsed.
    pub fn validate_refresh_at(&self, now: i64, refresh_ttl: i64) -> AuthResult<()> {
        self.iter()
            .try_for_each(|claim| claim.validate_refresh(now, refresh_ttl))
    }

    /// Plain `name -> value` map, in insertion order.
    #[must_use]
    pub fn to_map(&self) -> ClaimMap {
        self.iter()
            .map(|claim| (claim.name().to_string(), claim.to_json()))
            .collect()
    }
}

impl FromIterator<Claim> for ClaimSet {
    fn from_iter<I: IntoIterator<Item = Claim>>(iter: I) -> Self {
        let mut set = Self::new();
        for claim in iter {
            set.put(claim);
        }
        set
    }
}

impl IntoIterator for ClaimSet {
    type Item = Claim;
    type IntoIter = indexmap::map::IntoValues<String, Claim>;

    fn into_iter(self) -> Self::IntoIter {
        self.claims.into_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::ClaimContext;
    use crate::AuthError;

    const T: i64 = 1_700_000_000;

    fn sample() -> ClaimSet {
        let ctx = ClaimContext::at(T);
        ClaimSet::new()
            .with(Claim::subject(1))
            .with(Claim::issued_at(T, &ctx).unwrap())
            .with(Claim::expiration(T + 3600).unwrap())
    }

    #[test]
    fn test_put_overwrites_by_name() {
        let mut set = sample();
        set.put(Claim::subject(2));
        assert_eq!(set.len(), 3);
        assert_eq!(set.get_value("sub"), Some(&ClaimValue::Integer(2)));
    }

    #[test]
    fn test_merge_right_wins() {
        let mut left = sample();
        let right = ClaimSet::new()
            .with(Claim::subject("other"))
            .with(Claim::custom("role", "admin"));

        left.merge(right);
        assert_eq!(left.get_value("sub"), Some(&ClaimValue::from("other")));
        assert!(left.contains("role"));
        assert_eq!(left.len(), 4);
    }

    #[test]
    fn test_has_all() {
        let set = sample();
        assert!(set.has_all(&["sub", "iat"]));
        assert!(!set.has_all(&["sub", "jti"]));
        assert!(set.has_all::<&str>(&[]));
    }

    #[test]
    fn test_to_map_preserves_order() {
        let names: Vec<String> = sample().to_map().keys().cloned().collect();
        assert_eq!(names, vec!["sub", "iat", "exp"]);
    }

    #[test]
    fn test_bulk_validation() {
        let set = sample();
        assert!(set.validate_payload_at(T, 0).is_ok());
        assert!(matches!(
            set.validate_payload_at(T + 3601, 0),
            Err(AuthError::TokenExpired)
        ));
        assert!(set.validate_refresh_at(T + 100, 100).is_ok());
        assert!(set.validate_refresh_at(T + 101, 100).is_err());
    }
}
