//! Rolling daily snapshots.
//!
//! Snapshots live in a key space disjoint from the live document:
//! `auto-backup-<date>` holds one pretty-printed snapshot per calendar day,
//! `last-backup-date` marks the most recent successful run. At most
//! [`SNAPSHOT_RETENTION`] snapshots are kept; older ones are pruned first.
//! The daily run must never take the host down: storage failures degrade
//! to a skipped day and are retried on the next due cycle.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use vaadly_model::Document;

use crate::error::StoreError;
use crate::kv::KeyValueStore;
use crate::portability;

/// Marker key: ISO date of the most recent successful daily snapshot.
pub const LAST_BACKUP_KEY: &str = "last-backup-date";

/// Prefix of every stored snapshot key; the suffix is the snapshot date.
pub const SNAPSHOT_KEY_PREFIX: &str = "auto-backup-";

/// Default number of retained snapshots.
pub const SNAPSHOT_RETENTION: usize = 7;

/// One retained snapshot, as listed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotInfo {
    pub date: NaiveDate,
    pub size_bytes: usize,
    /// SHA-256 of the snapshot bytes, hex-encoded.
    pub digest: String,
}

fn snapshot_key(date: NaiveDate) -> String {
    format!("{SNAPSHOT_KEY_PREFIX}{date}")
}

/// True iff no daily snapshot has been taken for `today` yet.
pub fn is_backup_due(kv: &dyn KeyValueStore, today: NaiveDate) -> Result<bool, StoreError> {
    let marker = kv
        .get(LAST_BACKUP_KEY)?
        .map(|bytes| String::from_utf8_lossy(&bytes).to_string());
    Ok(marker.as_deref() != Some(today.to_string().as_str()))
}

pub fn last_backup_date(kv: &dyn KeyValueStore) -> Result<Option<NaiveDate>, StoreError> {
    Ok(kv
        .get(LAST_BACKUP_KEY)?
        .and_then(|bytes| String::from_utf8_lossy(&bytes).parse().ok()))
}

/// Take the daily snapshot if one is due. Returns whether a snapshot was
/// written. Never propagates a storage failure: a full or broken backend
/// downgrades the run to a no-op for the day.
pub fn run_daily_backup_if_due(
    kv: &mut dyn KeyValueStore,
    document: &Document,
    today: NaiveDate,
    retention: usize,
) -> bool {
    match is_backup_due(kv, today) {
        Ok(false) => return false,
        Ok(true) => {}
        Err(err) => {
            warn!(%err, "daily backup: could not read the backup marker, skipping");
            return false;
        }
    }
    if let Err(err) = write_snapshot(kv, document, today) {
        warn!(%err, "daily backup failed, will retry on the next due cycle");
        return false;
    }
    if let Err(err) = prune_old_snapshots(kv, retention) {
        warn!(%err, "pruning old snapshots failed");
    }
    debug!(%today, "daily backup written");
    true
}

/// Serialize and store one snapshot for `date`, updating the marker.
pub fn write_snapshot(
    kv: &mut dyn KeyValueStore,
    document: &Document,
    date: NaiveDate,
) -> Result<(), StoreError> {
    let bytes = portability::export_snapshot(document)?;
    kv.set(&snapshot_key(date), &bytes)?;
    kv.set(LAST_BACKUP_KEY, date.to_string().as_bytes())
}

/// The manual "download now" path: serialize the document, stamp the
/// marker, and hand the bytes to the caller for the import/export boundary.
pub fn force_backup(
    kv: &mut dyn KeyValueStore,
    document: &Document,
    today: NaiveDate,
) -> Result<Vec<u8>, StoreError> {
    let bytes = portability::export_snapshot(document)?;
    kv.set(LAST_BACKUP_KEY, today.to_string().as_bytes())?;
    Ok(bytes)
}

pub(crate) fn snapshot_keys(kv: &dyn KeyValueStore) -> Result<Vec<String>, StoreError> {
    kv.list_keys(SNAPSHOT_KEY_PREFIX)
}

/// Retained snapshots, newest first.
pub fn list_snapshots(kv: &dyn KeyValueStore) -> Result<Vec<SnapshotInfo>, StoreError> {
    let mut snapshots = Vec::new();
    for key in snapshot_keys(kv)? {
        let Ok(date) = key[SNAPSHOT_KEY_PREFIX.len()..].parse::<NaiveDate>() else {
            continue;
        };
        let Some(bytes) = kv.get(&key)? else { continue };
        snapshots.push(SnapshotInfo {
            date,
            size_bytes: bytes.len(),
            digest: format!("{:x}", Sha256::digest(&bytes)),
        });
    }
    snapshots.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(snapshots)
}

/// Raw bytes of one stored snapshot, if it exists.
pub fn get_snapshot(
    kv: &dyn KeyValueStore,
    date: NaiveDate,
) -> Result<Option<Vec<u8>>, StoreError> {
    kv.get(&snapshot_key(date))
}

/// Delete all but the `retention` newest snapshots. Returns how many were
/// removed.
pub fn prune_old_snapshots(
    kv: &mut dyn KeyValueStore,
    retention: usize,
) -> Result<usize, StoreError> {
    let snapshots = list_snapshots(kv)?;
    let mut removed = 0;
    for snapshot in snapshots.iter().skip(retention) {
        kv.remove(&snapshot_key(snapshot.date))?;
        removed += 1;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use crate::kv::MemoryKv;

    use super::*;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, n).unwrap()
    }

    #[test]
    fn backup_is_due_until_taken_then_due_again_next_day() {
        let mut kv = MemoryKv::new();
        let doc = Document::with_defaults();

        assert!(is_backup_due(&kv, day(1)).unwrap());
        assert!(run_daily_backup_if_due(&mut kv, &doc, day(1), SNAPSHOT_RETENTION));
        assert!(!is_backup_due(&kv, day(1)).unwrap());
        assert!(!run_daily_backup_if_due(&mut kv, &doc, day(1), SNAPSHOT_RETENTION));
        assert!(is_backup_due(&kv, day(2)).unwrap());
    }

    #[test]
    fn snapshots_are_listed_newest_first_with_size_and_digest() {
        let mut kv = MemoryKv::new();
        let doc = Document::with_defaults();
        write_snapshot(&mut kv, &doc, day(1)).unwrap();
        write_snapshot(&mut kv, &doc, day(3)).unwrap();
        write_snapshot(&mut kv, &doc, day(2)).unwrap();

        let listed = list_snapshots(&kv).unwrap();
        let dates: Vec<NaiveDate> = listed.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![day(3), day(2), day(1)]);
        assert!(listed.iter().all(|s| s.size_bytes > 0));
        assert!(listed.iter().all(|s| s.digest.len() == 64));
        // Same document, same bytes, same digest.
        assert_eq!(listed[0].digest, listed[1].digest);
    }

    #[test]
    fn pruning_keeps_only_the_newest_snapshots() {
        let mut kv = MemoryKv::new();
        let doc = Document::with_defaults();
        for n in 1..=10 {
            write_snapshot(&mut kv, &doc, day(n)).unwrap();
        }

        let removed = prune_old_snapshots(&mut kv, SNAPSHOT_RETENTION).unwrap();
        assert_eq!(removed, 3);

        let remaining = list_snapshots(&kv).unwrap();
        assert_eq!(remaining.len(), SNAPSHOT_RETENTION);
        assert_eq!(remaining[0].date, day(10));
        assert_eq!(remaining.last().unwrap().date, day(4));
        assert!(get_snapshot(&kv, day(3)).unwrap().is_none());
        assert!(get_snapshot(&kv, day(4)).unwrap().is_some());
    }

    #[test]
    fn daily_run_prunes_as_it_goes() {
        let mut kv = MemoryKv::new();
        let doc = Document::with_defaults();
        for n in 1..=9 {
            assert!(run_daily_backup_if_due(&mut kv, &doc, day(n), SNAPSHOT_RETENTION));
        }
        assert_eq!(list_snapshots(&kv).unwrap().len(), SNAPSHOT_RETENTION);
    }

    #[test]
    fn storage_failure_degrades_to_a_skipped_day() {
        let mut kv = MemoryKv::new();
        let doc = Document::with_defaults();
        kv.set_fail_writes(true);
        assert!(!run_daily_backup_if_due(&mut kv, &doc, day(1), SNAPSHOT_RETENTION));
        assert!(list_snapshots(&kv).unwrap().is_empty());

        // The marker was never written, so the next cycle retries.
        kv.set_fail_writes(false);
        assert!(run_daily_backup_if_due(&mut kv, &doc, day(1), SNAPSHOT_RETENTION));
    }

    #[test]
    fn force_backup_returns_bytes_and_stamps_the_marker() {
        let mut kv = MemoryKv::new();
        let doc = Document::with_defaults();
        let bytes = force_backup(&mut kv, &doc, day(5)).unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(last_backup_date(&kv).unwrap(), Some(day(5)));
        // Forcing does not add to the rolling history.
        assert!(list_snapshots(&kv).unwrap().is_empty());
    }

    #[test]
    fn stored_snapshot_round_trips_through_import() {
        let mut kv = MemoryKv::new();
        let mut doc = Document::with_defaults();
        doc.settings.title = "Snapshot me".to_string();
        write_snapshot(&mut kv, &doc, day(1)).unwrap();

        let bytes = get_snapshot(&kv, day(1)).unwrap().unwrap();
        let restored = portability::import_snapshot(&bytes).unwrap();
        assert_eq!(restored, doc);
    }
}
