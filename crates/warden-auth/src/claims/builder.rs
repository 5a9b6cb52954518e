//! Per-call accumulator for caller-supplied claims.

use indexmap::IndexMap;

use super::claim::Claim;
use super::factory::ClaimFactory;
use super::set::ClaimSet;
use super::value::{ClaimMap, ClaimValue};
use crate::claims::ClaimContext;
use crate::AuthResult;

#[derive(Debug, Clone, PartialEq)]
enum Pending {
    Raw(ClaimValue),
    Resolved(Claim),
}

/// Custom claims to embed in the next token.
///
/// Raw values are resolved through a [`ClaimFactory`] when the payload is
/// built; claims added with [`ClaimsBuilder::add_resolved`] are kept as-is.
///
/// ```
/// use warden_auth::claims::ClaimsBuilder;
///
/// let claims = ClaimsBuilder::new()
///     .with_claim("sub", 42)
///     .with_claim("role", "admin");
/// assert_eq!(claims.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimsBuilder {
    claims: IndexMap<String, Pending>,
}

impl ClaimsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a claim by name.
    pub fn add_claim(&mut self, name: impl Into<String>, value: impl Into<ClaimValue>) -> &mut Self {
        self.claims.insert(name.into(), Pending::Raw(value.into()));
        self
    }

    /// Builder-style [`ClaimsBuilder::add_claim`].
    #[must_use]
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<ClaimValue>) -> Self {
        self.add_claim(name, value);
        self
    }

    /// Adds an already-built claim; it bypasses factory resolution.
    pub fn add_resolved(&mut self, claim: Claim) -> &mut Self {
        self.claims
            .insert(claim.name().to_string(), Pending::Resolved(claim));
        self
    }

    /// Adds several raw claims at once.
    pub fn add_claims<I, K, V>(&mut self, claims: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ClaimValue>,
    {
        for (name, value) in claims {
            self.add_claim(name, value);
        }
        self
    }

    /// Copies every claim of `other`; entries of `other` win.
    pub fn merge(&mut self, other: &ClaimsBuilder) -> &mut Self {
        for (name, pending) in &other.claims {
            self.claims.insert(name.clone(), pending.clone());
        }
        self
    }

    /// Adds every entry of a decoded claim map.
    pub fn extend_from_map(&mut self, map: ClaimMap) -> &mut Self {
        self.add_claims(map)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.claims.contains_key(name)
    }

    /// Raw or resolved value for `name`.
    pub fn get(&self, name: &str) -> Option<&ClaimValue> {
        self.claims.get(name).map(|pending| match pending {
            Pending::Raw(value) => value,
            Pending::Resolved(claim) => claim.value(),
        })
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    pub fn clear(&mut self) {
        self.claims.clear();
    }

    /// Resolves every pending claim and overlays it on `base`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidClaim` for the first value its claim type rejects.
    pub(crate) fn resolve_onto(
        &self,
        mut base: ClaimSet,
        factory: &ClaimFactory,
        ctx: &ClaimContext,
    ) -> AuthResult<ClaimSet> {
        for (name, pending) in &self.claims {
            let claim = match pending {
                Pending::Raw(value) => factory.get_with(name, value.clone(), ctx)?,
                Pending::Resolved(claim) => claim.clone(),
            };
            base.put(claim);
        }
        Ok(base)
    }
}

impl<K: Into<String>, V: Into<ClaimValue>> FromIterator<(K, V)> for ClaimsBuilder {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut builder = Self::new();
        builder.add_claims(iter);
        builder
    }
}
