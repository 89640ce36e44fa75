//! Expected asset baseline (spec.md §4.6 + §4.4 invariant 9): IPv4-only
//! include/exclude rules describing the assets an operator expects to
//! exist, compared against what was actually observed.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;
use nmaptracker_db::repo::{baselines, host_observations};
use nmaptracker_models::baseline::ExpectedAssetBaseline;
use nmaptracker_models::error::{Result, TrackerError};
use nmaptracker_models::scope::ScopeKind;
use sqlx::SqlitePool;

use crate::ordering::ip_cmp;
use crate::types::BaselineEvalReport;

/// Baseline definitions below this prefix length enumerate more addresses
/// than a local-first evaluation should walk (spec.md §4.6).
const MIN_CIDR_PREFIX: u8 = 16;

enum BaselineRule {
    Cidr(Ipv4Network),
    Range(Ipv4Addr, Ipv4Addr),
    Single(Ipv4Addr),
}

fn parse_definition(raw: &str) -> Result<BaselineRule> {
    let raw = raw.trim();
    if raw.contains('/') {
        let net: Ipv4Network = raw
            .parse()
            .map_err(|_| TrackerError::InvalidInput(format!("baseline definitions must be IPv4 CIDR: {raw:?}")))?;
        if net.prefix() < MIN_CIDR_PREFIX {
            return Err(TrackerError::BaselineRangeTooBroad(raw.to_string()));
        }
        return Ok(BaselineRule::Cidr(net));
    }

    if let Some((left, right)) = raw.split_once('-') {
        let start: Ipv4Addr = left
            .trim()
            .parse()
            .map_err(|_| TrackerError::InvalidInput(format!("baseline definitions must be IPv4: {raw:?}")))?;
        let end: Ipv4Addr = right
            .trim()
            .parse()
            .map_err(|_| TrackerError::InvalidInput(format!("baseline definitions must be IPv4: {raw:?}")))?;
        let (start, end) = if u32::from(end) < u32::from(start) { (end, start) } else { (start, end) };
        return Ok(BaselineRule::Range(start, end));
    }

    let ip: Ipv4Addr =
        raw.parse().map_err(|_| TrackerError::InvalidInput(format!("baseline definitions must be IPv4: {raw:?}")))?;
    Ok(BaselineRule::Single(ip))
}

fn enumerate(rule: &BaselineRule) -> Vec<Ipv4Addr> {
    match rule {
        BaselineRule::Cidr(net) => net.iter().collect(),
        BaselineRule::Range(start, end) => (u32::from(*start)..=u32::from(*end)).map(Ipv4Addr::from).collect(),
        BaselineRule::Single(ip) => vec![*ip],
    }
}

pub async fn baseline_add(
    pool: &SqlitePool,
    project_id: &str,
    definition: String,
    kind: ScopeKind,
) -> Result<ExpectedAssetBaseline> {
    parse_definition(&definition)?;
    let baseline = ExpectedAssetBaseline::new(project_id.to_string(), definition, kind);
    baselines::insert(pool, &baseline).await?;
    Ok(baseline)
}

pub async fn baseline_list(pool: &SqlitePool, project_id: &str) -> Result<Vec<ExpectedAssetBaseline>> {
    baselines::list_by_project(pool, project_id).await
}

pub async fn baseline_delete(pool: &SqlitePool, id: &str) -> Result<bool> {
    baselines::delete(pool, id).await
}

pub async fn baseline_eval(pool: &SqlitePool, project_id: &str) -> Result<BaselineEvalReport> {
    let defs = baselines::list_by_project(pool, project_id).await?;

    let mut expected: HashSet<Ipv4Addr> = HashSet::new();
    let mut excluded: HashSet<Ipv4Addr> = HashSet::new();
    for def in &defs {
        let rule = parse_definition(&def.definition)?;
        let addrs = enumerate(&rule);
        match def.kind_enum() {
            ScopeKind::Include => expected.extend(addrs),
            ScopeKind::Exclude => excluded.extend(addrs),
        }
    }
    let expected: HashSet<Ipv4Addr> = expected.difference(&excluded).copied().collect();

    let observed: HashSet<Ipv4Addr> = host_observations::list_by_project(pool, project_id)
        .await?
        .into_iter()
        .filter_map(|o| o.ip_address.parse::<Ipv4Addr>().ok())
        .collect();

    let mut expected_but_never_observed: Vec<String> =
        expected.difference(&observed).map(Ipv4Addr::to_string).collect();
    let mut observed_but_unexpected: Vec<String> = observed.difference(&expected).map(Ipv4Addr::to_string).collect();
    let mut observed_and_expected: Vec<String> = observed.intersection(&expected).map(Ipv4Addr::to_string).collect();

    expected_but_never_observed.sort_by(|a, b| ip_cmp(a, b));
    observed_but_unexpected.sort_by(|a, b| ip_cmp(a, b));
    observed_and_expected.sort_by(|a, b| ip_cmp(a, b));

    Ok(BaselineEvalReport { expected_but_never_observed, observed_but_unexpected, observed_and_expected })
}
