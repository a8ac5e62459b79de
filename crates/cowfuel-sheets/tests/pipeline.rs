//! End-to-end pipeline scenarios: CSV text in, snapshot views out.

use chrono::{DateTime, Days, FixedOffset};

use cowfuel_sheets::{ingest_csv, FuelStatus};

fn now() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2026-10-17T11:45:00+03:00").expect("timestamp")
}

fn day_offset(days: u64) -> String {
    now()
        .date_naive()
        .checked_add_days(Days::new(days))
        .expect("date in range")
        .format("%Y-%m-%d")
        .to_string()
}

/// `"SiteName,X,Region,Y,..."` header padded to 36 columns, ending in
/// `NextFuelingPlan`.
fn header() -> String {
    let mut cells: Vec<String> = (0..36).map(|i| format!("Filler{i}")).collect();
    cells[1] = "SiteName".to_owned();
    cells[3] = "Region".to_owned();
    cells[35] = "NextFuelingPlan".to_owned();
    cells.join(",")
}

fn data_row(site: &str, region: &str, lat: &str, lng: &str, date: &str) -> String {
    let mut cells = vec![String::new(); 36];
    cells[0] = "row".to_owned();
    cells[1] = site.to_owned();
    cells[3] = format!("\"{region}\"");
    cells[11] = lat.to_owned();
    cells[12] = lng.to_owned();
    cells[35] = date.to_owned();
    cells.join(",")
}

fn sheet(rows: &[String]) -> String {
    let mut out = header();
    for row in rows {
        out.push_str("\r\n");
        out.push_str(row);
    }
    out
}

#[test]
fn central_site_due_today_appears_in_both_views() {
    let text = sheet(&[data_row("COW1", "Central Zone", "24.5", "46.7", &day_offset(0))]);
    let snap = ingest_csv(&text, &now());

    assert_eq!(snap.due_today.len(), 1);
    assert_eq!(snap.due_today[0].site_name, "COW1");
    assert!(snap.central_sites.iter().any(|s| s.site_name == "COW1"));
    assert_eq!(snap.counts.due_today, 1);
    assert_eq!(snap.counts.central, 1);
}

#[test]
fn non_numeric_latitude_row_is_excluded() {
    let text = sheet(&[
        data_row("COW1", "Central Zone", "24.5", "46.7", &day_offset(0)),
        data_row("COW2", "East", "abc", "46.7", &day_offset(0)),
    ]);
    let snap = ingest_csv(&text, &now());

    assert_eq!(snap.counts.total, 1);
    assert!(snap.all_sites.iter().all(|s| s.site_name != "COW2"));
}

#[test]
fn site_three_days_out_is_in_all_sites_only() {
    let text = sheet(&[data_row("COW9", "West", "21.4", "39.1", &day_offset(3))]);
    let snap = ingest_csv(&text, &now());

    assert_eq!(snap.all_sites.len(), 1);
    assert!(snap.due_today.is_empty());
    assert!(snap.due_tomorrow.is_empty());
    assert!(snap.due_after_tomorrow.is_empty());
}

#[test]
fn quoted_cells_with_commas_do_not_shift_columns() {
    let text = sheet(&[data_row("COW7", "Riyadh, Central", "24.7", "46.6", &day_offset(1))]);
    let snap = ingest_csv(&text, &now());

    assert_eq!(snap.all_sites[0].region_name, "Riyadh, Central");
    assert_eq!(snap.due_tomorrow.len(), 1);
    assert_eq!(snap.central_sites.len(), 1);
}

#[test]
fn mixed_sheet_counts_every_bucket() {
    let text = sheet(&[
        data_row("A", "Central", "1", "1", "2026-10-01"),
        data_row("B", "East", "1", "1", &day_offset(0)),
        data_row("C", "East", "1", "1", &day_offset(1)),
        data_row("D", "East", "1", "1", &day_offset(2)),
        data_row("E", "East", "1", "1", &day_offset(9)),
        data_row("F", "East", "1", "1", "soon"),
        data_row("", "East", "1", "1", &day_offset(0)),
    ]);
    let snap = ingest_csv(&text, &now());

    assert_eq!(snap.counts.total, 6);
    assert_eq!(snap.counts.due_today, 2);
    assert_eq!(snap.counts.overdue, 1);
    assert_eq!(snap.counts.tomorrow, 1);
    assert_eq!(snap.counts.after_tomorrow, 1);
    assert_eq!(snap.counts.central, 1);
    assert_eq!(
        cowfuel_sheets::classify(&snap.all_sites[5].next_fueling_date, &now()),
        FuelStatus::Future
    );
}
