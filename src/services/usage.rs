//! Gated mutations on usage records.
//!
//! All writes funnel through [`crate::gate::attempt_write`]; nothing else in
//! the program touches `usage_records` directly.

use crate::db::models::NewUsageRecord;
use crate::gate::{self, GateError, Operation, WriteAttempt};
use crate::schema;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::PgConnection;

pub fn record_usage(
    conn: &mut PgConnection,
    today: NaiveDate,
    actor: &str,
    row: &NewUsageRecord,
) -> Result<usize, GateError> {
    let attempt = WriteAttempt {
        actor,
        operation: Operation::Insert,
        record_id: None,
    };
    gate::attempt_write(conn, today, &attempt, |conn| {
        use schema::usage_records::dsl as UR;
        diesel::insert_into(UR::usage_records).values(row).execute(conn)
    })
}

pub fn correct_usage(
    conn: &mut PgConnection,
    today: NaiveDate,
    actor: &str,
    record_id: i64,
    energy_kwh: f64,
) -> Result<usize, GateError> {
    let attempt = WriteAttempt {
        actor,
        operation: Operation::Update,
        record_id: Some(record_id),
    };
    gate::attempt_write(conn, today, &attempt, move |conn| {
        use schema::usage_records::dsl as UR;
        diesel::update(UR::usage_records.filter(UR::id.eq(record_id)))
            .set(UR::energy_kwh.eq(energy_kwh))
            .execute(conn)
    })
}

pub fn delete_usage(
    conn: &mut PgConnection,
    today: NaiveDate,
    actor: &str,
    record_id: i64,
) -> Result<usize, GateError> {
    let attempt = WriteAttempt {
        actor,
        operation: Operation::Delete,
        record_id: Some(record_id),
    };
    gate::attempt_write(conn, today, &attempt, move |conn| {
        use schema::usage_records::dsl as UR;
        diesel::delete(UR::usage_records.filter(UR::id.eq(record_id))).execute(conn)
    })
}
