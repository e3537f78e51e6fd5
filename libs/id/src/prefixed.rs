use std::fmt;

use ulid::Ulid;

use crate::IdError;

/// A ULID carried under a fixed textual prefix, rendered `{prefix}_{ulid}`.
///
/// Implemented by every type [`define_id!`](crate::define_id) generates.
/// Ordering follows the ULID, so identifiers minted later sort later.
pub trait PrefixedId: Copy + Ord + Sized {
    const PREFIX: &'static str;

    fn from_ulid(ulid: Ulid) -> Self;

    fn ulid(&self) -> Ulid;

    fn generate() -> Self {
        Self::from_ulid(Ulid::new())
    }

    fn parse_prefixed(s: &str) -> Result<Self, IdError> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }

        let (prefix, body) = s.split_once('_').ok_or_else(|| IdError::Malformed {
            input: s.to_string(),
            expected: Self::PREFIX,
        })?;

        if prefix != Self::PREFIX {
            return Err(IdError::WrongKind {
                expected: Self::PREFIX,
                found: prefix.to_string(),
            });
        }

        Ok(Self::from_ulid(body.parse()?))
    }

    fn fmt_prefixed(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", Self::PREFIX, self.ulid())
    }
}
