//! Resolves `scan_import.source_ip`/`source_port` from an Nmap `args`
//! string (spec.md §4.5 step 3): tokens `-S <ip>` and `-g <port>` /
//! `--source-port <port>`. Manual overrides take effect whenever argv
//! did not supply a *parseable* value for that field — that includes
//! both "the flag was never given" and "the flag was given but its
//! value doesn't parse".

/// The outcome of looking for one flag in argv: either the flag was
/// found with a following value, or it wasn't found at all.
enum Resolved<T> {
    FromArgs(T),
    Absent,
}

fn find_flag_value<'a>(tokens: &[&'a str], flag: &str) -> Option<Resolved<&'a str>> {
    let mut iter = tokens.iter().enumerate();
    while let Some((i, tok)) = iter.next() {
        if *tok == flag {
            return Some(match tokens.get(i + 1) {
                Some(value) => Resolved::FromArgs(value),
                None => Resolved::Absent,
            });
        }
        if let Some(stripped) = tok.strip_prefix(&format!("{flag}=")) {
            return Some(Resolved::FromArgs(stripped));
        }
    }
    None
}

/// Resolve `source_ip` from `nmap_args`'s `-S <ip>` token, falling back to
/// `manual_source_ip` whenever argv supplied no `-S` token at all, or gave
/// one whose value fails to parse as IPv4. `manual_source_ip` is assumed
/// already validated as IPv4 by the caller.
pub fn resolve_source_ip(nmap_args: Option<&str>, manual_source_ip: Option<&str>) -> Option<String> {
    let tokens: Vec<&str> = nmap_args.unwrap_or("").split_whitespace().collect();
    match find_flag_value(&tokens, "-S") {
        Some(Resolved::FromArgs(ip)) => match ip.parse::<std::net::Ipv4Addr>() {
            Ok(addr) => Some(addr.to_string()),
            Err(_) => manual_source_ip.map(str::to_string),
        },
        Some(Resolved::Absent) | None => manual_source_ip.map(str::to_string),
    }
}

/// Resolve `(source_port, source_port_raw)` from `nmap_args`'s `-g <port>`
/// or `--source-port <port>` token. `source_port_raw` always preserves
/// whatever raw token argv supplied (spec.md §3 invariant 5); the numeric
/// `source_port` falls back to `manual_source_port` whenever argv supplied
/// neither flag, or supplied one whose value fails to parse as `1..=65535`.
pub fn resolve_source_port(
    nmap_args: Option<&str>,
    manual_source_port: Option<&str>,
) -> (Option<i64>, Option<String>) {
    let tokens: Vec<&str> = nmap_args.unwrap_or("").split_whitespace().collect();
    let from_args = find_flag_value(&tokens, "-g").or_else(|| find_flag_value(&tokens, "--source-port"));

    match from_args {
        Some(Resolved::FromArgs(value)) => {
            let raw = Some(value.to_string());
            match value.parse::<u16>() {
                Ok(port) => (Some(i64::from(port)), raw),
                Err(_) => {
                    let numeric = manual_source_port.and_then(|p| p.parse::<u16>().ok()).map(i64::from);
                    (numeric, raw)
                }
            }
        }
        Some(Resolved::Absent) | None => (
            manual_source_port.and_then(|p| p.parse::<u16>().ok()).map(i64::from),
            manual_source_port.map(str::to_string),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_ip_from_args() {
        assert_eq!(resolve_source_ip(Some("nmap -S 10.0.0.9 10.0.0.1"), None), Some("10.0.0.9".to_string()));
    }

    #[test]
    fn test_source_ip_manual_fallback_when_args_absent() {
        assert_eq!(resolve_source_ip(Some("nmap 10.0.0.1"), Some("10.0.0.9")), Some("10.0.0.9".to_string()));
    }

    #[test]
    fn test_source_ip_manual_fallback_when_args_present_but_unparseable() {
        assert_eq!(resolve_source_ip(Some("nmap -S not-an-ip 10.0.0.1"), Some("10.0.0.9")), Some("10.0.0.9".to_string()));
    }

    #[test]
    fn test_source_ip_none_when_args_unparseable_and_no_manual() {
        assert_eq!(resolve_source_ip(Some("nmap -S not-an-ip 10.0.0.1"), None), None);
    }

    #[test]
    fn test_source_port_from_dash_g() {
        let (port, raw) = resolve_source_port(Some("nmap -g 53 10.0.0.1"), None);
        assert_eq!(port, Some(53));
        assert_eq!(raw.as_deref(), Some("53"));
    }

    #[test]
    fn test_source_port_from_long_flag() {
        let (port, raw) = resolve_source_port(Some("nmap --source-port 4444 10.0.0.1"), None);
        assert_eq!(port, Some(4444));
        assert_eq!(raw.as_deref(), Some("4444"));
    }

    #[test]
    fn test_source_port_unparseable_keeps_raw_null_numeric_without_manual() {
        let (port, raw) = resolve_source_port(Some("nmap -g not-a-port 10.0.0.1"), None);
        assert_eq!(port, None);
        assert_eq!(raw.as_deref(), Some("not-a-port"));
    }

    #[test]
    fn test_source_port_unparseable_falls_back_to_manual_numeric_but_keeps_argv_raw() {
        let (port, raw) = resolve_source_port(Some("nmap -g not-a-port 10.0.0.1"), Some("4444"));
        assert_eq!(port, Some(4444), "manual numeric must apply when argv's token fails to parse");
        assert_eq!(raw.as_deref(), Some("not-a-port"), "raw token preserves what argv actually supplied");
    }

    #[test]
    fn test_source_port_manual_fallback_when_absent() {
        let (port, raw) = resolve_source_port(Some("nmap 10.0.0.1"), Some("4444"));
        assert_eq!(port, Some(4444));
        assert_eq!(raw.as_deref(), Some("4444"));
    }

    #[test]
    fn test_source_port_out_of_range_is_null() {
        let (port, raw) = resolve_source_port(Some("nmap -g 70000 10.0.0.1"), None);
        assert_eq!(port, None);
        assert_eq!(raw.as_deref(), Some("70000"));
    }

    #[test]
    fn test_source_port_out_of_range_falls_back_to_manual() {
        let (port, raw) = resolve_source_port(Some("nmap -g 70000 10.0.0.1"), Some("2222"));
        assert_eq!(port, Some(2222));
        assert_eq!(raw.as_deref(), Some("70000"));
    }
}
