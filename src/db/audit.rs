//! Scan-audit row insertion.
//!
//! Writes are best-effort from the caller's perspective: the frame pipeline
//! logs and discards failures here rather than letting them delay a
//! response (see [`crate::pipeline`]).

use diesel::result::QueryResult;
use diesel_async::RunQueryDsl;

use super::connection::DbConnection;
use crate::models::NewScanAudit;

/// Insert one scan-audit row.
///
/// # Errors
/// Returns any error produced by the insertion query.
#[must_use = "handle the result"]
pub async fn record_scan(conn: &mut DbConnection, audit: &NewScanAudit<'_>) -> QueryResult<usize> {
    use crate::schema::scan_audits::dsl::scan_audits;
    diesel::insert_into(scan_audits).values(audit).execute(conn).await
}
