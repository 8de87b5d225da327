//! Export naming.
//!
//! Files are named `{buildingId}_{architectId}_{routeId}_{YYYY-MM-DD}.json`.
//! When any identification field is blank the generic
//! `spatial-annotation-{date}.json` is used instead.

use crate::model::ProjectIdentification;
use chrono::NaiveDate;

/// Replace every non-alphanumeric character with `_`.
pub fn sanitize_identifier(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// File name for an export written on `date`.
pub fn export_filename(project_id: &ProjectIdentification, date: NaiveDate) -> String {
    let date = date.format("%Y-%m-%d");
    if !project_id.is_complete() {
        return format!("spatial-annotation-{date}.json");
    }
    format!(
        "{}_{}_{}_{date}.json",
        sanitize_identifier(&project_id.building_id),
        sanitize_identifier(&project_id.architect_id),
        sanitize_identifier(&project_id.route_id),
    )
}
