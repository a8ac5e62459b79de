//! Partitions classified sites into the dashboard views.

use chrono::{DateTime, TimeZone};

use crate::columns::map_rows;
use crate::parse::parse_csv;
use crate::status::classify;
use crate::types::{FuelStatus, ProcessedSnapshot, SiteRecord, SnapshotCounts};

/// Classifies every site against `now` and builds the snapshot views.
///
/// Each view keeps source order. Overdue and today are merged into
/// `due_today`; tomorrow and after-tomorrow are never counted there.
pub fn process<Tz: TimeZone>(sites: Vec<SiteRecord>, now: &DateTime<Tz>) -> ProcessedSnapshot {
    let mut snapshot = ProcessedSnapshot::empty(now.date_naive());

    for site in &sites {
        if site.is_central() {
            snapshot.central_sites.push(site.clone());
        }

        match classify(&site.next_fueling_date, now) {
            FuelStatus::Overdue => {
                snapshot.overdue.push(site.clone());
                snapshot.due_today.push(site.clone());
            }
            FuelStatus::Today => {
                snapshot.scheduled_today.push(site.clone());
                snapshot.due_today.push(site.clone());
            }
            FuelStatus::Tomorrow => snapshot.due_tomorrow.push(site.clone()),
            FuelStatus::AfterTomorrow => snapshot.due_after_tomorrow.push(site.clone()),
            FuelStatus::Future => {}
        }
    }

    snapshot.counts = SnapshotCounts {
        total: sites.len(),
        central: snapshot.central_sites.len(),
        due_today: snapshot.due_today.len(),
        tomorrow: snapshot.due_tomorrow.len(),
        after_tomorrow: snapshot.due_after_tomorrow.len(),
        overdue: snapshot.overdue.len(),
    };
    snapshot.all_sites = sites;
    snapshot
}

/// Runs the full text -> snapshot pipeline on one CSV export.
pub fn ingest_csv<Tz: TimeZone>(text: &str, now: &DateTime<Tz>) -> ProcessedSnapshot {
    let rows = parse_csv(text);
    let sites = map_rows(&rows);
    tracing::debug!(rows = rows.len(), sites = sites.len(), "parsed sheet export");
    process(sites, now)
}
