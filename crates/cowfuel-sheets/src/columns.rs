//! Fixed-position column mapping from sheet rows to [`SiteRecord`]s.

use crate::types::{RawRow, SiteRecord};

/// Zero-based column offsets in the published fuel plan sheet.
///
/// These positions are a contract with the upstream spreadsheet layout
/// (columns B, D, L, M and AJ). Header text is never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub site_name: usize,
    pub region_name: usize,
    pub latitude: usize,
    pub longitude: usize,
    pub next_fueling_date: usize,
}

impl ColumnLayout {
    pub const FUEL_PLAN: ColumnLayout = ColumnLayout {
        site_name: 1,
        region_name: 3,
        latitude: 11,
        longitude: 12,
        next_fueling_date: 35,
    };
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self::FUEL_PLAN
    }
}

const UNKNOWN_REGION: &str = "Unknown";

/// Maps data rows to site records using [`ColumnLayout::FUEL_PLAN`].
///
/// The first row is a header and is always skipped. Rows without a site
/// name or fueling date, or with non-numeric coordinates, are dropped.
#[must_use]
pub fn map_rows(rows: &[RawRow]) -> Vec<SiteRecord> {
    map_rows_with_layout(rows, ColumnLayout::FUEL_PLAN)
}

#[must_use]
pub fn map_rows_with_layout(rows: &[RawRow], layout: ColumnLayout) -> Vec<SiteRecord> {
    let data_rows = rows.iter().skip(1);
    let sites: Vec<SiteRecord> = data_rows.filter_map(|row| map_row(row, layout)).collect();

    let dropped = rows.len().saturating_sub(1) - sites.len();
    if dropped > 0 {
        tracing::debug!(dropped, kept = sites.len(), "dropped incomplete sheet rows");
    }

    sites
}

fn map_row(row: &RawRow, layout: ColumnLayout) -> Option<SiteRecord> {
    let cell = |idx: usize| row.get(idx).map_or("", |c| c.trim());

    let site_name = cell(layout.site_name);
    let next_fueling_date = cell(layout.next_fueling_date);
    if site_name.is_empty() || next_fueling_date.is_empty() {
        return None;
    }

    let latitude = parse_coordinate(cell(layout.latitude))?;
    let longitude = parse_coordinate(cell(layout.longitude))?;

    let region = cell(layout.region_name);
    let region_name = if region.is_empty() {
        UNKNOWN_REGION
    } else {
        region
    };

    Some(SiteRecord {
        site_name: site_name.to_owned(),
        region_name: region_name.to_owned(),
        latitude,
        longitude,
        next_fueling_date: next_fueling_date.to_owned(),
    })
}

/// Blank cells count as `0`; anything else must be a finite number.
fn parse_coordinate(raw: &str) -> Option<f64> {
    let raw = if raw.is_empty() { "0" } else { raw };
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}
