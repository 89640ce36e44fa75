//! Intent Inferencer (spec.md §4.3): guesses which of the five closed scan
//! intents a completed import most likely represents, from its filename
//! and `nmap_args` string.
//!
//! A fixed heuristic table is evaluated top to bottom against the
//! normalized args/filename, with first-wins dedup across rows that
//! imply the same intent.

use nmaptracker_models::intent::{IntentKind, IntentSource};

fn normalize(nmap_args: Option<&str>) -> String {
    nmap_args.unwrap_or("").to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn tokens(normalized: &str) -> Vec<&str> {
    normalized.split_whitespace().collect()
}

fn has_explicit_port_selection(toks: &[&str]) -> bool {
    toks.iter().any(|t| t.starts_with("-p") || t.starts_with("--port"))
}

fn has_all_tcp_range(normalized: &str, toks: &[&str]) -> bool {
    toks.iter().any(|t| *t == "-p-")
        || normalized.contains("-p 1-65535")
        || normalized.contains("-p1-65535")
        || normalized.contains("-p t:1-65535")
        || normalized.contains("-pt:1-65535")
}

/// Evaluate the fixed heuristic table against a filename and `nmap_args`
/// string, in spec order, deduping by intent (first match for a given
/// intent wins; later rules for the same intent are suppressed).
pub fn suggest(filename: &str, nmap_args: Option<&str>) -> Vec<(IntentKind, f64)> {
    let normalized = normalize(nmap_args);
    let toks = tokens(&normalized);
    let filename_lower = filename.to_lowercase();

    let mut out = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut push = |intent: IntentKind, confidence: f64, out: &mut Vec<(IntentKind, f64)>, seen: &mut std::collections::HashSet<IntentKind>| {
        if seen.insert(intent) {
            out.push((intent, confidence));
        }
    };

    let has_sn = toks.contains(&"-sn");
    let has_su = toks.contains(&"-su");
    let has_top_ports = normalized.contains("--top-ports");
    let explicit_port_selection = has_explicit_port_selection(&toks);

    if has_sn || filename_lower.contains("ping") {
        push(IntentKind::PingSweep, 0.98, &mut out, &mut seen);
    }

    if normalized.contains("--top-ports 1000") {
        push(IntentKind::Top1kTcp, 0.98, &mut out, &mut seen);
    }

    if !normalized.is_empty() && !has_sn && !has_su && !explicit_port_selection {
        push(IntentKind::Top1kTcp, 0.85, &mut out, &mut seen);
    }

    if has_all_tcp_range(&normalized, &toks) {
        push(IntentKind::AllTcp, 0.99, &mut out, &mut seen);
    }

    if has_su && (has_top_ports || !explicit_port_selection) {
        push(IntentKind::TopUdp, 0.92, &mut out, &mut seen);
    }

    if normalized.contains("--script vuln") {
        push(IntentKind::VulnNse, 0.95, &mut out, &mut seen);
    }

    out
}

/// Resolve the intents actually recorded for an import: manual values
/// come first with `source = manual, confidence = 1.0`; the remaining
/// suggested values fill in with `source = auto`, skipping any intent
/// already covered by a manual value. A set union, manual-biased.
pub fn resolve(manual: &[IntentKind], suggested: &[(IntentKind, f64)]) -> Vec<(IntentKind, IntentSource, f64)> {
    let mut resolved = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for &intent in manual {
        if seen.insert(intent) {
            resolved.push((intent, IntentSource::Manual, 1.0));
        }
    }
    for &(intent, confidence) in suggested {
        if seen.insert(intent) {
            resolved.push((intent, IntentSource::Auto, confidence));
        }
    }
    resolved
}
