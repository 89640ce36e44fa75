//! Scope Matcher (spec.md §4.1): classifies whether an IP falls inside a
//! project's scope given compiled include/exclude predicate lists.
//!
//! Each rule parses as a CIDR, an `A-B` range, or a single IP via the
//! `ipnetwork` crate; exclude rules always take precedence over include
//! rules, and a project with no matching rule falls back to
//! `allow_all_by_default`.

use ipnetwork::IpNetwork;
use nmaptracker_models::scope::ScopeKind;
use std::net::IpAddr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("invalid scope rule {0:?}: {1}")]
    InvalidRule(String, String),

    #[error("invalid IP address: {0:?}")]
    InvalidIp(String),
}

/// One compiled predicate: either a CIDR block or an inclusive address range.
#[derive(Debug, Clone)]
enum ScopeRule {
    Cidr(IpNetwork),
    Range(IpAddr, IpAddr),
}

impl ScopeRule {
    fn parse(raw: &str) -> Result<Self, ScopeError> {
        let raw = raw.trim();
        if raw.contains('/') {
            let net: IpNetwork = raw
                .parse()
                .map_err(|e: ipnetwork::IpNetworkError| ScopeError::InvalidRule(raw.to_string(), e.to_string()))?;
            return Ok(ScopeRule::Cidr(net));
        }

        if let Some((left, right)) = raw.split_once('-') {
            let left = left.trim();
            let right = right.trim();
            let start: IpAddr = left
                .parse()
                .map_err(|_| ScopeError::InvalidRule(raw.to_string(), format!("invalid range start {left:?}")))?;

            let end: IpAddr = if let Ok(full) = right.parse::<IpAddr>() {
                full
            } else {
                let octet: u8 = right
                    .parse()
                    .map_err(|_| ScopeError::InvalidRule(raw.to_string(), format!("invalid range end {right:?}")))?;
                match start {
                    IpAddr::V4(addr) => {
                        let mut octets = addr.octets();
                        octets[3] = octet;
                        IpAddr::V4(std::net::Ipv4Addr::from(octets))
                    }
                    IpAddr::V6(_) => {
                        return Err(ScopeError::InvalidRule(
                            raw.to_string(),
                            "trailing-octet ranges require an IPv4 start address".to_string(),
                        ));
                    }
                }
            };

            let (start, end) = if ip_to_u128(&end) < ip_to_u128(&start) { (end, start) } else { (start, end) };
            return Ok(ScopeRule::Range(start, end));
        }

        let ip: IpAddr = raw
            .parse()
            .map_err(|_| ScopeError::InvalidRule(raw.to_string(), "not a CIDR, range, or IP".to_string()))?;
        Ok(ScopeRule::Range(ip, ip))
    }

    fn matches(&self, ip: &IpAddr) -> bool {
        match self {
            ScopeRule::Cidr(net) => net.contains(*ip),
            ScopeRule::Range(start, end) => {
                same_family(start, ip) && ip_to_u128(start) <= ip_to_u128(ip) && ip_to_u128(ip) <= ip_to_u128(end)
            }
        }
    }
}

fn same_family(a: &IpAddr, b: &IpAddr) -> bool {
    matches!((a, b), (IpAddr::V4(_), IpAddr::V4(_)) | (IpAddr::V6(_), IpAddr::V6(_)))
}

fn ip_to_u128(ip: &IpAddr) -> u128 {
    match ip {
        IpAddr::V4(addr) => u32::from(*addr) as u128,
        IpAddr::V6(addr) => u128::from(*addr),
    }
}

/// A compiled set of include/exclude predicates for one project.
pub struct ScopeMatcher {
    includes: Vec<ScopeRule>,
    excludes: Vec<ScopeRule>,
    allow_all_by_default: bool,
}

impl ScopeMatcher {
    /// Compile a rule set. `allow_all_by_default` controls the fallback
    /// answer when a rule set has no matching include (or is empty):
    /// `true` (CLI default) admits everything not excluded; `false` (the
    /// safe default for a programmatic API) admits nothing not explicitly
    /// included.
    pub fn compile<I>(rules: I, allow_all_by_default: bool) -> Result<Self, ScopeError>
    where
        I: IntoIterator<Item = (String, ScopeKind)>,
    {
        let mut includes = Vec::new();
        let mut excludes = Vec::new();
        for (definition, kind) in rules {
            let rule = ScopeRule::parse(&definition)?;
            match kind {
                ScopeKind::Include => includes.push(rule),
                ScopeKind::Exclude => excludes.push(rule),
            }
        }
        Ok(Self { includes, excludes, allow_all_by_default })
    }

    /// Classify `ip` against the compiled rule set. Excludes take
    /// precedence over includes regardless of ordering.
    pub fn in_scope(&self, ip: &str) -> Result<bool, ScopeError> {
        let addr: IpAddr = ip.parse().map_err(|_| ScopeError::InvalidIp(ip.to_string()))?;

        if self.excludes.iter().any(|r| r.matches(&addr)) {
            return Ok(false);
        }
        if self.includes.iter().any(|r| r.matches(&addr)) {
            return Ok(true);
        }
        Ok(self.allow_all_by_default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(rules: &[(&str, ScopeKind)], allow_all: bool) -> ScopeMatcher {
        ScopeMatcher::compile(rules.iter().map(|(d, k)| (d.to_string(), *k)), allow_all).unwrap()
    }

    #[test]
    fn test_cidr_include() {
        let m = compile(&[("10.0.0.0/24", ScopeKind::Include)], false);
        assert!(m.in_scope("10.0.0.5").unwrap());
        assert!(!m.in_scope("10.0.1.5").unwrap());
    }

    #[test]
    fn test_exclude_takes_precedence() {
        let m = compile(
            &[("10.0.0.0/24", ScopeKind::Include), ("10.0.0.5", ScopeKind::Exclude)],
            false,
        );
        assert!(!m.in_scope("10.0.0.5").unwrap());
        assert!(m.in_scope("10.0.0.6").unwrap());
    }

    #[test]
    fn test_trailing_octet_range() {
        let m = compile(&[("10.0.0.10-20", ScopeKind::Include)], false);
        assert!(m.in_scope("10.0.0.10").unwrap());
        assert!(m.in_scope("10.0.0.15").unwrap());
        assert!(m.in_scope("10.0.0.20").unwrap());
        assert!(!m.in_scope("10.0.0.21").unwrap());
    }

    #[test]
    fn test_reversed_range_normalizes() {
        let m = compile(&[("10.0.0.20-10", ScopeKind::Include)], false);
        assert!(m.in_scope("10.0.0.15").unwrap());
    }

    #[test]
    fn test_full_ip_range() {
        let m = compile(&[("10.0.0.1-10.0.1.5", ScopeKind::Include)], false);
        assert!(m.in_scope("10.0.0.200").unwrap());
        assert!(!m.in_scope("10.0.2.1").unwrap());
    }

    #[test]
    fn test_single_ip_rule() {
        let m = compile(&[("10.0.0.1", ScopeKind::Include)], false);
        assert!(m.in_scope("10.0.0.1").unwrap());
        assert!(!m.in_scope("10.0.0.2").unwrap());
    }

    #[test]
    fn test_empty_rules_allow_all_true() {
        let m = compile(&[], true);
        assert!(m.in_scope("1.2.3.4").unwrap());
    }

    #[test]
    fn test_empty_rules_allow_all_false() {
        let m = compile(&[], false);
        assert!(!m.in_scope("1.2.3.4").unwrap());
    }

    #[test]
    fn test_invalid_ip_fails() {
        let m = compile(&[], true);
        assert!(m.in_scope("not-an-ip").is_err());
    }

    #[test]
    fn test_invalid_rule_fails_compilation() {
        let err = ScopeMatcher::compile(vec![("not-a-rule///".to_string(), ScopeKind::Include)], true);
        assert!(err.is_err());
    }

    #[test]
    fn test_ipv6_in_cidr() {
        let m = compile(&[("2001:db8::/32", ScopeKind::Include)], false);
        assert!(m.in_scope("2001:db8::1").unwrap());
        assert!(!m.in_scope("2001:db9::1").unwrap());
    }

    #[test]
    fn test_trailing_octet_range_rejects_ipv6_start() {
        let err = ScopeRule::parse("2001:db8::1-5");
        assert!(err.is_err());
    }
}
