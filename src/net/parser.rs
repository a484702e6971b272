use std::fmt;

use hickory_resolver::proto::rr::RecordType;

use crate::error::SpfMacroError;

/// SPF mechanism that names another domain to expand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MechanismKind {
    Txt,
    A,
    Include,
}

impl MechanismKind {
    /// Unknown keywords fall back to a TXT lookup
    fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_lowercase().as_str() {
            "a" => Self::A,
            "include" => Self::Include,
            _ => Self::Txt,
        }
    }

    /// DNS record type queried for this mechanism
    pub fn record_type(self) -> RecordType {
        match self {
            Self::Txt | Self::Include => RecordType::TXT,
            Self::A => RecordType::A,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::A => "a",
            Self::Include => "include",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MechanismSpec {
    pub kind: MechanismKind,
    pub domain: String,
}

impl MechanismSpec {
    pub fn new(kind: MechanismKind, domain: impl Into<String>) -> Self {
        Self {
            kind,
            domain: domain.into(),
        }
    }

    /// Parse a `kind:domain` token
    ///
    /// The domain is the text between the first `:` and the next one (or the end of
    /// the token). A dual-cidr suffix such as `/24` and a trailing root dot are
    /// dropped. Returns `None` when the token has no `:` or the domain part is empty.
    ///
    /// # Examples
    /// ```
    /// use spfmacro::net::parser::{MechanismKind, MechanismSpec};
    ///
    /// let spec = MechanismSpec::parse("include:_spf.example.com").unwrap();
    /// assert_eq!(spec.kind, MechanismKind::Include);
    /// assert_eq!(spec.domain, "_spf.example.com");
    /// ```
    pub fn parse(token: &str) -> Option<Self> {
        let (keyword, rest) = token.split_once(':')?;
        let domain = rest.split([':', '/']).next().unwrap_or_default();
        let domain = domain.strip_suffix('.').unwrap_or(domain);
        if domain.is_empty() {
            return None;
        }

        Some(Self::new(MechanismKind::from_keyword(keyword), domain))
    }

    /// Fully qualified form of the domain, as sent upstream
    pub fn fqdn(&self) -> String {
        format!("{}.", self.domain)
    }
}

impl fmt::Display for MechanismSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.keyword(), self.domain)
    }
}

/// Validate configured domain entries and parse them into mechanism specs
///
/// Every entry must be of the form `kind:domain`. The list must not be empty.
///
/// # Arguments
/// * `entries` - Entries such as "txt:example.com", "a:mail.example.com"
///
/// # Returns
/// * `Ok(Vec<MechanismSpec>)` - Specs in configuration order
/// * `Err(SpfMacroError)` - If the list is empty or an entry is malformed
pub fn parse_domain_specs(entries: &[String]) -> Result<Vec<MechanismSpec>, SpfMacroError> {
    if entries.is_empty() {
        return Err(SpfMacroError::NoDomains);
    }

    entries
        .iter()
        .map(|raw| {
            let trimmed = raw.trim();
            if !trimmed.contains(':') {
                return Err(SpfMacroError::InvalidDomainSpec {
                    entry: raw.clone(),
                    reason: "domains must be in the form txt:example.com".to_string(),
                });
            }
            MechanismSpec::parse(trimmed).ok_or_else(|| SpfMacroError::InvalidDomainSpec {
                entry: raw.clone(),
                reason: "empty domain".to_string(),
            })
        })
        .collect()
}
