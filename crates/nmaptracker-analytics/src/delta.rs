//! Import delta (spec.md §4.6): what changed between two imports of the
//! same project.

use std::collections::{HashMap, HashSet};

use nmaptracker_db::repo::{host_observations, imports, port_observations};
use nmaptracker_models::error::{Result, TrackerError};
use nmaptracker_models::observation::PortObservation;
use sqlx::SqlitePool;

use crate::ordering::{exposure_cmp, ip_cmp};
use crate::types::{DeltaReport, ExposureKey, FingerprintChange, PortFingerprint, Preview};

pub const DELTA_PREVIEW_DEFAULT: usize = 50;
pub const DELTA_PREVIEW_CAP: usize = 500;

type ExposureMap = HashMap<(String, i64, String), PortObservation>;

fn exposure_key(obs: &PortObservation) -> (String, i64, String) {
    (obs.ip_address.clone(), obs.port_number, obs.protocol.clone())
}

fn trimmed(s: &Option<String>) -> &str {
    s.as_deref().map(str::trim).unwrap_or("")
}

fn fingerprint(obs: &PortObservation) -> PortFingerprint {
    PortFingerprint {
        service: obs.service.clone(),
        product: obs.product.clone(),
        version: obs.version.clone(),
        extra_info: obs.extra_info.clone(),
    }
}

fn fingerprint_changed(before: &PortObservation, after: &PortObservation) -> bool {
    trimmed(&before.service) != trimmed(&after.service)
        || trimmed(&before.product) != trimmed(&after.product)
        || trimmed(&before.version) != trimmed(&after.version)
        || trimmed(&before.extra_info) != trimmed(&after.extra_info)
}

pub async fn delta(
    pool: &SqlitePool,
    project_id: &str,
    base_id: &str,
    target_id: &str,
    preview_size: usize,
    include_lists: bool,
) -> Result<DeltaReport> {
    let preview_size = preview_size.min(DELTA_PREVIEW_CAP);

    let base_import = imports::get_by_id(pool, project_id, base_id)
        .await?
        .ok_or_else(|| TrackerError::ImportNotFound(base_id.to_string()))?;
    let target_import = imports::get_by_id(pool, project_id, target_id)
        .await?
        .ok_or_else(|| TrackerError::ImportNotFound(target_id.to_string()))?;

    let base_ips: HashSet<String> =
        host_observations::list_by_import(pool, &base_import.id).await?.into_iter().map(|o| o.ip_address).collect();
    let target_ips: HashSet<String> = host_observations::list_by_import(pool, &target_import.id)
        .await?
        .into_iter()
        .map(|o| o.ip_address)
        .collect();

    let mut net_new_hosts: Vec<String> = target_ips.difference(&base_ips).cloned().collect();
    let mut disappeared_hosts: Vec<String> = base_ips.difference(&target_ips).cloned().collect();
    net_new_hosts.sort_by(|a, b| ip_cmp(a, b));
    disappeared_hosts.sort_by(|a, b| ip_cmp(a, b));

    let base_exposures: ExposureMap = port_observations::list_exposures_by_import(pool, &base_import.id)
        .await?
        .into_iter()
        .map(|o| (exposure_key(&o), o))
        .collect();
    let target_exposures: ExposureMap = port_observations::list_exposures_by_import(pool, &target_import.id)
        .await?
        .into_iter()
        .map(|o| (exposure_key(&o), o))
        .collect();

    let to_exposure_key = |k: &(String, i64, String)| ExposureKey {
        ip_address: k.0.clone(),
        port_number: k.1,
        protocol: k.2.clone(),
    };

    let mut net_new_exposures: Vec<ExposureKey> =
        target_exposures.keys().filter(|k| !base_exposures.contains_key(*k)).map(to_exposure_key).collect();
    let mut disappeared_exposures: Vec<ExposureKey> =
        base_exposures.keys().filter(|k| !target_exposures.contains_key(*k)).map(to_exposure_key).collect();

    let key_tuple = |e: &ExposureKey| (e.ip_address.clone(), e.port_number, e.protocol.clone());
    net_new_exposures.sort_by(|a, b| {
        let (a, b) = (key_tuple(a), key_tuple(b));
        exposure_cmp((&a.0, a.1, &a.2), (&b.0, b.1, &b.2))
    });
    disappeared_exposures.sort_by(|a, b| {
        let (a, b) = (key_tuple(a), key_tuple(b));
        exposure_cmp((&a.0, a.1, &a.2), (&b.0, b.1, &b.2))
    });

    let mut changed_fingerprints: Vec<FingerprintChange> = target_exposures
        .iter()
        .filter_map(|(key, after)| {
            base_exposures.get(key).filter(|before| fingerprint_changed(before, after)).map(|before| FingerprintChange {
                ip_address: key.0.clone(),
                port_number: key.1,
                protocol: key.2.clone(),
                before: fingerprint(before),
                after: fingerprint(after),
            })
        })
        .collect();
    changed_fingerprints.sort_by(|a, b| {
        exposure_cmp((&a.ip_address, a.port_number, &a.protocol), (&b.ip_address, b.port_number, &b.protocol))
    });

    Ok(DeltaReport {
        net_new_hosts: Preview::new(net_new_hosts, preview_size, include_lists),
        disappeared_hosts: Preview::new(disappeared_hosts, preview_size, include_lists),
        net_new_open_exposures: Preview::new(net_new_exposures, preview_size, include_lists),
        disappeared_open_exposures: Preview::new(disappeared_exposures, preview_size, include_lists),
        changed_fingerprints: Preview::new(changed_fingerprints, preview_size, include_lists),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmaptracker_db::pool::open_test;
    use nmaptracker_db::repo::projects;
    use nmaptracker_models::import::ScanImport;
    use nmaptracker_models::observation::HostObservation;
    use nmaptracker_models::project::Project;

    async fn make_import(pool: &SqlitePool, project_id: &str, filename: &str) -> ScanImport {
        let import = ScanImport::new(project_id.to_string(), filename.to_string(), None);
        imports::insert_scan_import(pool, &import).await.unwrap();
        import
    }

    #[tokio::test]
    async fn test_delta_detects_new_host_new_exposure_and_fingerprint_change() {
        let pool = open_test().await.unwrap();
        let project = Project::new("Acme".to_string());
        projects::insert(&pool, &project).await.unwrap();

        let base = make_import(&pool, &project.id, "base.xml").await;
        let target = make_import(&pool, &project.id, "target.xml").await;

        let base_host_obs =
            HostObservation::new(base.id.clone(), project.id.clone(), "10.0.0.1".to_string(), None, true, "up".to_string());
        host_observations::insert(&pool, &base_host_obs).await.unwrap();
        let target_host_obs_1 =
            HostObservation::new(target.id.clone(), project.id.clone(), "10.0.0.1".to_string(), None, true, "up".to_string());
        host_observations::insert(&pool, &target_host_obs_1).await.unwrap();
        let target_host_obs_2 =
            HostObservation::new(target.id.clone(), project.id.clone(), "10.0.0.2".to_string(), None, true, "up".to_string());
        host_observations::insert(&pool, &target_host_obs_2).await.unwrap();

        let base_port = PortObservation::new(
            base.id.clone(),
            project.id.clone(),
            "10.0.0.1".to_string(),
            22,
            "tcp".to_string(),
            "open".to_string(),
            Some("ssh".to_string()),
            Some("7.0".to_string()),
            Some("OpenSSH".to_string()),
            None,
            None,
        );
        port_observations::insert(&pool, &base_port).await.unwrap();

        let target_port_changed = PortObservation::new(
            target.id.clone(),
            project.id.clone(),
            "10.0.0.1".to_string(),
            22,
            "tcp".to_string(),
            "open".to_string(),
            Some("ssh".to_string()),
            Some("8.2".to_string()),
            Some("OpenSSH".to_string()),
            None,
            None,
        );
        port_observations::insert(&pool, &target_port_changed).await.unwrap();

        let target_port_new = PortObservation::new(
            target.id.clone(),
            project.id.clone(),
            "10.0.0.2".to_string(),
            80,
            "tcp".to_string(),
            "open".to_string(),
            Some("http".to_string()),
            None,
            None,
            None,
            None,
        );
        port_observations::insert(&pool, &target_port_new).await.unwrap();

        let report = delta(&pool, &project.id, &base.id, &target.id, DELTA_PREVIEW_DEFAULT, true).await.unwrap();
        assert_eq!(report.net_new_hosts.count, 1);
        assert_eq!(report.net_new_hosts.items[0], "10.0.0.2");
        assert_eq!(report.disappeared_hosts.count, 0);
        assert_eq!(report.net_new_open_exposures.count, 1);
        assert_eq!(report.net_new_open_exposures.items[0].ip_address, "10.0.0.2");
        assert_eq!(report.changed_fingerprints.count, 1);
        assert_eq!(report.changed_fingerprints.items[0].before.version.as_deref(), Some("7.0"));
        assert_eq!(report.changed_fingerprints.items[0].after.version.as_deref(), Some("8.2"));
    }

    #[tokio::test]
    async fn test_delta_unknown_import_returns_import_not_found() {
        let pool = open_test().await.unwrap();
        let project = Project::new("Acme".to_string());
        projects::insert(&pool, &project).await.unwrap();
        let base = make_import(&pool, &project.id, "base.xml").await;

        let err = delta(&pool, &project.id, &base.id, "does-not-exist", DELTA_PREVIEW_DEFAULT, true).await.unwrap_err();
        assert!(matches!(err, TrackerError::ImportNotFound(_)));
    }
}
