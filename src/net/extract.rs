use std::sync::LazyLock;

use ipnet::Ipv4Net;
use regex::Regex;

static CIDR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{1,3}(?:\.\d{1,3}){3}(?:/\d{0,2})?").expect("valid CIDR pattern")
});

static ADDRESS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,3}(?:\.\d{1,3}){3}").expect("valid address pattern"));

static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:txt|a|include):[a-zA-Z0-9@:%._+~#=()?]{2,256}\.[a-z]{2,6}\b[-a-zA-Z0-9@:%_+.~#?&/=]*",
    )
    .expect("valid reference pattern")
});

/// Extract IPv4 subnets embedded in free-form record text
///
/// Matches dotted addresses with an optional `/prefix`. A bare address becomes a
/// `/32`. Matches that do not parse (octet above 255, prefix above 32, dangling `/`)
/// are skipped, as are matches cut out of a longer digit run (`10.0.0.1234`).
/// Host bits are cleared, so `192.0.2.7/24` yields `192.0.2.0/24`.
pub fn extract_subnets(text: &str) -> Vec<Ipv4Net> {
    let bytes = text.as_bytes();
    let digit_at = |idx: usize| bytes.get(idx).is_some_and(u8::is_ascii_digit);

    CIDR_PATTERN
        .find_iter(text)
        .filter_map(|m| {
            let token = m.as_str();
            if digit_at(m.end()) || (m.start() > 0 && digit_at(m.start() - 1)) {
                log::debug!("Skipping truncated subnet token {token}");
                return None;
            }
            let parsed = if token.contains('/') {
                token.parse::<Ipv4Net>()
            } else {
                format!("{token}/32").parse::<Ipv4Net>()
            };
            match parsed {
                Ok(net) => Some(net.trunc()),
                Err(_) => {
                    log::debug!("Skipping unparseable subnet token {token}");
                    None
                }
            }
        })
        .collect()
}

/// Extract nested `txt:`, `a:` and `include:` references, verbatim
pub fn extract_domain_references(text: &str) -> Vec<&str> {
    REFERENCE_PATTERN
        .find_iter(text)
        .map(|m| m.as_str())
        .collect()
}

/// First dotted IPv4-looking token in `text`, if any
pub fn find_address(text: &str) -> Option<&str> {
    ADDRESS_PATTERN.find(text).map(|m| m.as_str())
}
