//! Domain types shared by the ingestion pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One parsed CSV line: trimmed cells in source order.
pub type RawRow = Vec<String>;

/// A fleet site with its next scheduled refueling.
///
/// Field names on the wire match the dashboard front-end (`SiteName`,
/// `RegionName`, `lat`, `lng`, `NextFuelingPlan`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    #[serde(rename = "SiteName")]
    pub site_name: String,
    #[serde(rename = "RegionName")]
    pub region_name: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
    /// Date text exactly as it appears in the sheet.
    #[serde(rename = "NextFuelingPlan")]
    pub next_fueling_date: String,
}

impl SiteRecord {
    /// Case-insensitive "central" substring match on the region name.
    #[must_use]
    pub fn is_central(&self) -> bool {
        self.region_name.to_lowercase().contains("central")
    }
}

/// Where a site's fueling date falls relative to the reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FuelStatus {
    Overdue,
    Today,
    Tomorrow,
    AfterTomorrow,
    Future,
}

impl FuelStatus {
    /// Overdue and today both need a truck now.
    #[must_use]
    pub fn is_due(self) -> bool {
        matches!(self, FuelStatus::Overdue | FuelStatus::Today)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotCounts {
    pub total: usize,
    pub central: usize,
    /// Overdue plus today.
    pub due_today: usize,
    pub tomorrow: usize,
    pub after_tomorrow: usize,
    /// Subset of `due_today`.
    pub overdue: usize,
}

/// Immutable result of one ingestion cycle.
///
/// Every view is a stable subsequence of `all_sites`. `due_today` is the
/// union of `overdue` and `scheduled_today`; `central_sites` is independent
/// of the date buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedSnapshot {
    pub reference_date: NaiveDate,
    pub all_sites: Vec<SiteRecord>,
    pub central_sites: Vec<SiteRecord>,
    pub due_today: Vec<SiteRecord>,
    pub due_tomorrow: Vec<SiteRecord>,
    pub due_after_tomorrow: Vec<SiteRecord>,
    pub overdue: Vec<SiteRecord>,
    pub scheduled_today: Vec<SiteRecord>,
    pub counts: SnapshotCounts,
}

impl ProcessedSnapshot {
    /// A snapshot with no sites, used before the first successful fetch.
    #[must_use]
    pub fn empty(reference_date: NaiveDate) -> Self {
        Self {
            reference_date,
            all_sites: Vec::new(),
            central_sites: Vec::new(),
            due_today: Vec::new(),
            due_tomorrow: Vec::new(),
            due_after_tomorrow: Vec::new(),
            overdue: Vec::new(),
            scheduled_today: Vec::new(),
            counts: SnapshotCounts::default(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all_sites.is_empty()
    }
}
