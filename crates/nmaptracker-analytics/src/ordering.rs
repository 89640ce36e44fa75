//! Deterministic ordering for delta/report output (spec.md §4.6: "by IPv4
//! numeric when both endpoints parse, else lexicographic; then port
//! number; then protocol").

use std::cmp::Ordering;
use std::net::Ipv4Addr;

pub fn ip_cmp(a: &str, b: &str) -> Ordering {
    match (a.parse::<Ipv4Addr>(), b.parse::<Ipv4Addr>()) {
        (Ok(a4), Ok(b4)) => u32::from(a4).cmp(&u32::from(b4)),
        _ => a.cmp(b),
    }
}

pub fn exposure_cmp(a: (&str, i64, &str), b: (&str, i64, &str)) -> Ordering {
    ip_cmp(a.0, b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(b.2))
}
