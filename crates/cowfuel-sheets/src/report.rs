//! CSV report export built from a processed snapshot.

use std::io::Write;
use std::str::FromStr;

use crate::error::ReportError;
use crate::types::{ProcessedSnapshot, SiteRecord};

const REPORT_HEADER: [&str; 5] = [
    "SiteName",
    "RegionName",
    "NextFuelingPlan",
    "Latitude",
    "Longitude",
];

/// Which snapshot view a report is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Sites scheduled for exactly today.
    Today,
    /// Overdue sites.
    Pending,
    /// Overdue plus today.
    Due,
    All,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::Today,
        ReportKind::Pending,
        ReportKind::Due,
        ReportKind::All,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::Today => "today",
            ReportKind::Pending => "pending",
            ReportKind::Due => "due",
            ReportKind::All => "all",
        }
    }

    #[must_use]
    pub fn file_name(self) -> String {
        format!("fuel_{}.csv", self.as_str())
    }

    #[must_use]
    pub fn sites(self, snapshot: &ProcessedSnapshot) -> &[SiteRecord] {
        match self {
            ReportKind::Today => &snapshot.scheduled_today,
            ReportKind::Pending => &snapshot.overdue,
            ReportKind::Due => &snapshot.due_today,
            ReportKind::All => &snapshot.all_sites,
        }
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_end_matches(".csv");
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown report kind: {s}"))
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writes `sites` as CSV with a fixed header row.
///
/// # Errors
///
/// Returns [`ReportError`] if the writer fails.
pub fn write_report<W: Write>(writer: W, sites: &[SiteRecord]) -> Result<(), ReportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(REPORT_HEADER)?;
    for site in sites {
        let latitude = site.latitude.to_string();
        let longitude = site.longitude.to_string();
        csv.write_record([
            site.site_name.as_str(),
            site.region_name.as_str(),
            site.next_fueling_date.as_str(),
            latitude.as_str(),
            longitude.as_str(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Renders one report kind into memory.
///
/// # Errors
///
/// Returns [`ReportError`] if CSV encoding fails.
pub fn render_report(
    kind: ReportKind,
    snapshot: &ProcessedSnapshot,
) -> Result<Vec<u8>, ReportError> {
    let mut buf = Vec::new();
    write_report(&mut buf, kind.sites(snapshot))?;
    Ok(buf)
}
