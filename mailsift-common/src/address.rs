//! Candidate email addresses
//!
//! An [`Address`] can only be built through [`Address::parse`], so holding one
//! proves the string passed the basic well-formedness check: non-empty,
//! exactly one `@`, and non-empty text on either side of it. Nothing more is
//! inferred; addresses are neither normalised nor deduplicated.

use std::{
    fmt::{self, Display},
    sync::Arc,
};

use serde::{Deserialize, Serialize};

use crate::error::AddressError;

/// A well-formed candidate address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address {
    raw: Arc<str>,
    at: usize,
}

impl Address {
    /// Check `candidate` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns an [`AddressError`] naming the first rule the candidate breaks.
    ///
    /// # Examples
    ///
    /// ```
    /// use mailsift_common::Address;
    ///
    /// let address = Address::parse("user@example.com").unwrap();
    /// assert_eq!(address.local_part(), "user");
    ///
    /// assert!(Address::parse("bad").is_err());
    /// ```
    pub fn parse(candidate: &str) -> Result<Self, AddressError> {
        if candidate.is_empty() {
            return Err(AddressError::Empty);
        }

        let count = candidate.matches('@').count();
        let at = match (count, candidate.find('@')) {
            (1, Some(at)) => at,
            (0, _) | (_, None) => {
                return Err(AddressError::MissingSeparator(candidate.to_string()));
            }
            (count, Some(_)) => {
                return Err(AddressError::MultipleSeparators {
                    address: candidate.to_string(),
                    count,
                });
            }
        };

        if at == 0 {
            return Err(AddressError::EmptyLocalPart(candidate.to_string()));
        }

        if at + 1 == candidate.len() {
            return Err(AddressError::EmptyDomain(candidate.to_string()));
        }

        Ok(Self {
            raw: Arc::from(candidate),
            at,
        })
    }

    /// The full address as it was supplied
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn local_part(&self) -> &str {
        &self.raw[..self.at]
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.raw.to_string()
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Split a newline separated list into candidate addresses.
///
/// Each line is trimmed and blank lines are dropped. Order and duplicates are
/// kept; candidates are *not* checked here, that happens per item inside the
/// batch so malformed lines still show up in the report.
pub fn parse_address_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_well_formed() {
        let address = Address::parse("someone@test.com").unwrap();
        assert_eq!(address.as_str(), "someone@test.com");
        assert_eq!(address.local_part(), "someone");
        assert_eq!(address.to_string(), "someone@test.com");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(Address::parse(""), Err(AddressError::Empty));
        assert_eq!(
            Address::parse("bad"),
            Err(AddressError::MissingSeparator("bad".to_string()))
        );
        assert_eq!(
            Address::parse("a@b@c.com"),
            Err(AddressError::MultipleSeparators {
                address: "a@b@c.com".to_string(),
                count: 2,
            })
        );
        assert_eq!(
            Address::parse("@test.com"),
            Err(AddressError::EmptyLocalPart("@test.com".to_string()))
        );
        assert_eq!(
            Address::parse("user@"),
            Err(AddressError::EmptyDomain("user@".to_string()))
        );
    }

    #[test]
    fn test_parse_does_not_normalise() {
        // Only the structural check applies; case and whitespace are kept as-is
        let address = Address::parse("User.Name+tag@Example.COM").unwrap();
        assert_eq!(address.as_str(), "User.Name+tag@Example.COM");
    }

    #[test]
    fn test_parse_address_list() {
        let list = parse_address_list("  a@test.com\n\nbad\r\n b@test.com  \n\n a@test.com");
        assert_eq!(list, vec!["a@test.com", "bad", "b@test.com", "a@test.com"]);
    }

    #[test]
    fn test_parse_address_list_empty() {
        assert!(parse_address_list("").is_empty());
        assert!(parse_address_list(" \n\t\n").is_empty());
    }
}
