//! Email address types.

use crate::error::{Error, Result};
use std::fmt;

/// Bare email address as used in the SMTP envelope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address from a string.
    ///
    /// Only the shape is checked: exactly one `@` with non-empty local and
    /// domain parts, and no whitespace or angle brackets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the address is malformed.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the part after the `@`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, domain)| domain)
    }

    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("Address cannot be empty".into()));
        }

        if addr
            .chars()
            .any(|c| c.is_whitespace() || c == '<' || c == '>')
        {
            return Err(Error::InvalidAddress(format!(
                "Unexpected character in {addr}"
            )));
        }

        match addr.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                if domain.contains('@') {
                    Err(Error::InvalidAddress(format!(
                        "More than one @ in {addr}"
                    )))
                } else {
                    Ok(())
                }
            }
            Some(_) => Err(Error::InvalidAddress(format!(
                "Empty local or domain part in {addr}"
            ))),
            None => Err(Error::InvalidAddress(format!("Missing @ in {addr}"))),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mailbox (optional display name + address).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Display name (optional).
    pub name: Option<String>,
    /// Email address.
    pub address: Address,
}

impl Mailbox {
    /// Creates a new mailbox with just an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(address: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: None,
            address: Address::new(address)?,
        })
    }

    /// Creates a new mailbox with a display name and address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or the name contains
    /// control characters.
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Result<Self> {
        Ok(Self {
            name: Some(check_display_name(name.into())?),
            address: Address::new(address)?,
        })
    }

    /// Parses `addr`, `<addr>`, or `Display Name <addr>`.
    ///
    /// Surrounding quotes on the display name are removed. An empty name
    /// is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if the address part is malformed
    /// or the name contains control characters.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        let Some(inner) = s.strip_suffix('>') else {
            return Self::new(s);
        };
        let Some((name, address)) = inner.rsplit_once('<') else {
            return Err(Error::InvalidAddress(format!("Unbalanced brackets in {s}")));
        };

        let name = name.trim();
        let name = name
            .strip_prefix('"')
            .and_then(|n| n.strip_suffix('"'))
            .unwrap_or(name)
            .trim();

        let name = if name.is_empty() {
            None
        } else {
            Some(check_display_name(name.to_string())?)
        };
        Ok(Self {
            name,
            address: Address::new(address.trim())?,
        })
    }
}

/// Display names end up verbatim in header lines, so CR, LF and other
/// controls are refused.
fn check_display_name(name: String) -> Result<String> {
    if name.chars().any(char::is_control) {
        return Err(Error::InvalidAddress(format!(
            "Control character in display name {name:?}"
        )));
    }
    Ok(name)
}

impl From<Address> for Mailbox {
    fn from(address: Address) -> Self {
        Self {
            name: None,
            address,
        }
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_address() {
        let addr = Address::new("user@example.com").unwrap();
        assert_eq!(addr.as_str(), "user@example.com");
        assert_eq!(addr.domain(), "example.com");
    }

    #[test]
    fn test_invalid_addresses() {
        for bad in ["", "userexample.com", "@example.com", "user@", "a@b@c", "a b@c.d", "<a@b>"] {
            assert!(Address::new(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_mailbox_with_name() {
        let mailbox = Mailbox::with_name("John Doe", "john@example.com").unwrap();
        assert_eq!(mailbox.name.as_deref(), Some("John Doe"));
        assert_eq!(mailbox.to_string(), "John Doe <john@example.com>");
    }

    #[test]
    fn test_parse_bare() {
        let mailbox = Mailbox::parse("  user@example.com ").unwrap();
        assert_eq!(mailbox, Mailbox::new("user@example.com").unwrap());
    }

    #[test]
    fn test_parse_bracketed() {
        let mailbox = Mailbox::parse("<user@example.com>").unwrap();
        assert!(mailbox.name.is_none());
        assert_eq!(mailbox.address.as_str(), "user@example.com");
    }

    #[test]
    fn test_parse_named() {
        let mailbox = Mailbox::parse("\"Doe, Jane\" <jane@example.com>").unwrap();
        assert_eq!(mailbox.name.as_deref(), Some("Doe, Jane"));
        assert_eq!(mailbox.address.as_str(), "jane@example.com");

        let mailbox = Mailbox::parse("Jane <jane@example.com>").unwrap();
        assert_eq!(mailbox.name.as_deref(), Some("Jane"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Mailbox::parse("Jane jane@example.com>").is_err());
        assert!(Mailbox::parse("Jane <not-an-address>").is_err());
        assert!(Mailbox::parse("").is_err());
    }

    #[test]
    fn test_display_name_rejects_line_breaks() {
        let err = Mailbox::parse("Eve\r\nBcc: spy@evil.test <eve@example.com>").unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));
        assert!(Mailbox::parse("\"Eve\nX\" <eve@example.com>").is_err());
        assert!(Mailbox::with_name("Eve\r\nBcc: spy@evil.test", "eve@example.com").is_err());
        assert!(Mailbox::with_name("Eve\t", "eve@example.com").is_err());
    }
}
