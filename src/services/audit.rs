//! Append-only audit log writer.
//!
//! Rows in `audit_log` are created exclusively by the write gate and never
//! updated or deleted afterwards.

use crate::db::models::{tables, NewAuditEntry};
use crate::schema;
use chrono::Utc;
use diesel::prelude::*;
use diesel::PgConnection;

/// Build an audit entry for a usage-record mutation attempt, stamped with
/// the wall-clock time of the decision.
pub fn entry(
    actor: &str,
    operation: &str,
    record_id: Option<i64>,
    status: &str,
    comment: &str,
) -> NewAuditEntry {
    NewAuditEntry {
        logged_at: Utc::now(),
        actor: actor.to_string(),
        affected_table: tables::USAGE_RECORDS.to_string(),
        operation: operation.to_string(),
        record_id,
        status: status.to_string(),
        comment: comment.to_string(),
    }
}

pub fn append(conn: &mut PgConnection, entry: &NewAuditEntry) -> QueryResult<usize> {
    use schema::audit_log::dsl as AL;

    diesel::insert_into(AL::audit_log).values(entry).execute(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::audit_status;

    #[test]
    fn entry_targets_usage_records() {
        let e = entry("meter-1", "INSERT", None, audit_status::ALLOWED, "ok");
        assert_eq!(e.affected_table, "usage_records");
        assert_eq!(e.actor, "meter-1");
        assert_eq!(e.operation, "INSERT");
        assert_eq!(e.record_id, None);
        assert_eq!(e.status, "ALLOWED");
        assert_eq!(e.comment, "ok");
    }
}
