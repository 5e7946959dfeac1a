//! Write gate guarding mutations on usage records.
//!
//! Every insert/update/delete on `usage_records` goes through
//! [`attempt_write`]: the gate classifies the supplied date, rejects the
//! mutation on restricted days, and records the decision in `audit_log`.
//! The date is a parameter rather than an ambient clock so the rule can be
//! evaluated against any day under test.

use crate::calendar::{self, Restriction};
use crate::db::models::{audit_status, tables, Holiday, NewAuditEntry};
use crate::services::audit;
use chrono::NaiveDate;
use core::fmt;
use diesel::{Connection, PgConnection, QueryResult};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
        }
    }

    /// Parse an operation kind from text. Anything outside the three known
    /// kinds is a validation error and never reaches the audit log.
    pub fn parse(s: &str) -> Result<Self, GateError> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INSERT" => Ok(Operation::Insert),
            "UPDATE" => Ok(Operation::Update),
            "DELETE" => Ok(Operation::Delete),
            other => Err(GateError::Validation(format!(
                "unknown operation kind: {}",
                other
            ))),
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a mutation attempt was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeniedReason {
    Weekday,
    Holiday { name: String },
}

impl From<Restriction> for DeniedReason {
    fn from(value: Restriction) -> Self {
        match value {
            Restriction::Holiday { name } => DeniedReason::Holiday { name },
            Restriction::Weekday(_) => DeniedReason::Weekday,
        }
    }
}

impl Display for DeniedReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DeniedReason::Weekday => write!(f, "writes are only permitted on Saturday/Sunday"),
            DeniedReason::Holiday { name } => {
                write!(f, "writes are not permitted on holidays ({})", name)
            }
        }
    }
}

/// Errors surfaced by the gate.
#[derive(Debug)]
pub enum GateError {
    /// Malformed input to the gate; rejected before any audit write.
    Validation(String),
    /// The mutation fell on a restricted day. Expected and non-fatal.
    /// `audit_persisted` is false when the denial row could not be written;
    /// the denial itself stands either way.
    Denied {
        reason: DeniedReason,
        audit_persisted: bool,
    },
    /// Underlying store failure.
    Db(String),
}

impl Display for GateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GateError::Validation(s) => write!(f, "validation error: {}", s),
            GateError::Denied { reason, .. } => write!(f, "write denied: {}", reason),
            GateError::Db(s) => write!(f, "database error: {}", s),
        }
    }
}

impl Error for GateError {}

/// One evaluated mutation attempt: who, what kind, and (for updates and
/// deletes) which row.
#[derive(Debug, Clone)]
pub struct WriteAttempt<'a> {
    pub actor: &'a str,
    pub operation: Operation,
    pub record_id: Option<i64>,
}

/// Where decision audit rows go. The production sink is the `audit_log`
/// table; tests drive the gate with an in-memory sink.
trait AuditSink {
    fn append(&mut self, entry: &NewAuditEntry) -> QueryResult<usize>;
}

impl AuditSink for PgConnection {
    fn append(&mut self, entry: &NewAuditEntry) -> QueryResult<usize> {
        audit::append(self, entry)
    }
}

/// Outcome of the permission step, before any mutation runs.
#[derive(Debug, PartialEq, Eq)]
enum Decision {
    Allowed,
    Denied {
        reason: DeniedReason,
        audit_persisted: bool,
    },
}

/// Classify `today` and, when restricted, persist the single DENIED audit
/// row. The audit write failing downgrades nothing: the denial stands with
/// `audit_persisted: false`.
fn decide<S: AuditSink>(
    today: NaiveDate,
    holidays: &[Holiday],
    attempt: &WriteAttempt<'_>,
    sink: &mut S,
) -> Decision {
    match calendar::classify(today, holidays) {
        Some(restriction) => {
            let reason = DeniedReason::from(restriction);
            let audit_persisted = match sink.append(&denial_entry(attempt, &reason)) {
                Ok(_) => true,
                Err(e) => {
                    warn!(
                        "Gate: audit write failed for denied {} by {}: {}",
                        attempt.operation, attempt.actor, e
                    );
                    false
                }
            };
            Decision::Denied {
                reason,
                audit_persisted,
            }
        }
        None => Decision::Allowed,
    }
}

/// Evaluate the restriction rule for `today` and, if permitted, run `apply`.
///
/// Denied attempts persist exactly one DENIED audit row and return
/// [`GateError::Denied`]. Allowed attempts run the mutation in its own
/// transaction; the ALLOWED (or mutation-failure) audit row is appended
/// afterwards, and a failed audit append is only a warning — it never undoes
/// or reverses the permission decision.
pub fn attempt_write<F>(
    conn: &mut PgConnection,
    today: NaiveDate,
    attempt: &WriteAttempt<'_>,
    apply: F,
) -> Result<usize, GateError>
where
    F: FnOnce(&mut PgConnection) -> QueryResult<usize>,
{
    if attempt.actor.trim().is_empty() {
        return Err(GateError::Validation("actor must not be empty".to_string()));
    }

    let holidays = calendar::holidays_on(conn, today).map_err(GateError::Db)?;
    match decide(today, &holidays, attempt, conn) {
        Decision::Denied {
            reason,
            audit_persisted,
        } => Err(GateError::Denied {
            reason,
            audit_persisted,
        }),
        Decision::Allowed => {
            let applied = conn.transaction::<usize, diesel::result::Error, _>(apply);
            match applied {
                Ok(affected) => {
                    if let Err(e) = audit::append(conn, &applied_entry(attempt, affected)) {
                        warn!(
                            "Gate: audit write failed for applied {} by {}: {}",
                            attempt.operation, attempt.actor, e
                        );
                    }
                    Ok(affected)
                }
                Err(e) => {
                    // The permission was granted; record the mutation failure
                    // outside the rolled-back transaction.
                    if let Err(audit_err) = audit::append(conn, &failure_entry(attempt, &e)) {
                        warn!(
                            "Gate: audit write failed after {} error by {}: {}",
                            attempt.operation, attempt.actor, audit_err
                        );
                    }
                    Err(GateError::Db(format!(
                        "{} on {} failed: {}",
                        attempt.operation,
                        tables::USAGE_RECORDS,
                        e
                    )))
                }
            }
        }
    }
}

fn denial_entry(attempt: &WriteAttempt<'_>, reason: &DeniedReason) -> NewAuditEntry {
    audit::entry(
        attempt.actor,
        attempt.operation.as_str(),
        attempt.record_id,
        audit_status::DENIED,
        &reason.to_string(),
    )
}

fn applied_entry(attempt: &WriteAttempt<'_>, affected: usize) -> NewAuditEntry {
    audit::entry(
        attempt.actor,
        attempt.operation.as_str(),
        attempt.record_id,
        audit_status::ALLOWED,
        &format!("{} applied ({} row(s))", attempt.operation, affected),
    )
}

fn failure_entry(attempt: &WriteAttempt<'_>, error: &diesel::result::Error) -> NewAuditEntry {
    audit::entry(
        attempt.actor,
        attempt.operation.as_str(),
        attempt.record_id,
        audit_status::ALLOWED,
        &format!("{} failed: {}", attempt.operation, error),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn holiday(name: &str, date: NaiveDate) -> Holiday {
        Holiday {
            id: 1,
            name: name.to_string(),
            holiday_date: date,
            description: None,
        }
    }

    fn attempt(operation: Operation, record_id: Option<i64>) -> WriteAttempt<'static> {
        WriteAttempt {
            actor: "meter-1",
            operation,
            record_id,
        }
    }

    #[derive(Default)]
    struct MemorySink {
        entries: Vec<NewAuditEntry>,
    }

    impl AuditSink for MemorySink {
        fn append(&mut self, entry: &NewAuditEntry) -> QueryResult<usize> {
            self.entries.push(entry.clone());
            Ok(1)
        }
    }

    struct FailingSink;

    impl AuditSink for FailingSink {
        fn append(&mut self, _entry: &NewAuditEntry) -> QueryResult<usize> {
            Err(diesel::result::Error::AlreadyInTransaction)
        }
    }

    #[test]
    fn parses_known_operations_case_insensitively() {
        assert_eq!(Operation::parse("insert").unwrap(), Operation::Insert);
        assert_eq!(Operation::parse("UPDATE").unwrap(), Operation::Update);
        assert_eq!(Operation::parse(" delete ").unwrap(), Operation::Delete);
    }

    #[test]
    fn rejects_unknown_operation_kind() {
        let err = Operation::parse("MERGE").unwrap_err();
        assert!(matches!(err, GateError::Validation(_)));
        assert!(err.to_string().contains("unknown operation kind"));
    }

    #[test]
    fn denial_messages_distinguish_weekday_and_holiday() {
        assert_eq!(
            DeniedReason::Weekday.to_string(),
            "writes are only permitted on Saturday/Sunday"
        );
        let holiday = DeniedReason::Holiday {
            name: "Labour Day".to_string(),
        };
        assert_eq!(
            holiday.to_string(),
            "writes are not permitted on holidays (Labour Day)"
        );
    }

    #[test]
    fn weekday_denial_writes_exactly_one_denied_row() {
        // 2025-05-05 is a Monday
        let mut sink = MemorySink::default();
        let decision = decide(date(2025, 5, 5), &[], &attempt(Operation::Insert, None), &mut sink);

        assert_eq!(
            decision,
            Decision::Denied {
                reason: DeniedReason::Weekday,
                audit_persisted: true,
            }
        );
        assert_eq!(sink.entries.len(), 1);
        let entry = &sink.entries[0];
        assert_eq!(entry.status, audit_status::DENIED);
        assert_eq!(entry.comment, "writes are only permitted on Saturday/Sunday");
    }

    #[test]
    fn holiday_denial_reports_holiday_reason() {
        // 2025-05-01 is a Thursday and a listed holiday; the holiday wins
        let d = date(2025, 5, 1);
        let holidays = [holiday("Labour Day", d)];
        let mut sink = MemorySink::default();
        let decision = decide(d, &holidays, &attempt(Operation::Update, Some(42)), &mut sink);

        assert_eq!(
            decision,
            Decision::Denied {
                reason: DeniedReason::Holiday {
                    name: "Labour Day".to_string()
                },
                audit_persisted: true,
            }
        );
        assert_eq!(sink.entries.len(), 1);
        let entry = &sink.entries[0];
        assert_eq!(entry.status, audit_status::DENIED);
        assert_eq!(entry.record_id, Some(42));
        assert_eq!(entry.comment, "writes are not permitted on holidays (Labour Day)");
    }

    #[test]
    fn audit_failure_never_reverses_a_denial() {
        // 2025-05-06 is a Tuesday
        let decision = decide(
            date(2025, 5, 6),
            &[],
            &attempt(Operation::Delete, Some(7)),
            &mut FailingSink,
        );

        assert_eq!(
            decision,
            Decision::Denied {
                reason: DeniedReason::Weekday,
                audit_persisted: false,
            }
        );
    }

    #[test]
    fn saturday_attempt_is_allowed_with_no_denied_row() {
        // 2025-05-03 is a Saturday with no matching holiday
        let holidays = [holiday("Labour Day", date(2025, 5, 1))];
        let mut sink = MemorySink::default();
        let decision = decide(date(2025, 5, 3), &holidays, &attempt(Operation::Insert, None), &mut sink);

        assert_eq!(decision, Decision::Allowed);
        assert!(sink.entries.is_empty());
    }

    #[test]
    fn denial_entry_records_reason_and_status() {
        let attempt = WriteAttempt {
            actor: "meter-1",
            operation: Operation::Update,
            record_id: Some(42),
        };
        let entry = denial_entry(&attempt, &DeniedReason::Weekday);
        assert_eq!(entry.actor, "meter-1");
        assert_eq!(entry.affected_table, tables::USAGE_RECORDS);
        assert_eq!(entry.operation, "UPDATE");
        assert_eq!(entry.record_id, Some(42));
        assert_eq!(entry.status, audit_status::DENIED);
        assert_eq!(entry.comment, "writes are only permitted on Saturday/Sunday");
    }

    #[test]
    fn applied_entry_records_row_count() {
        let attempt = WriteAttempt {
            actor: "collector",
            operation: Operation::Insert,
            record_id: None,
        };
        let entry = applied_entry(&attempt, 1);
        assert_eq!(entry.status, audit_status::ALLOWED);
        assert_eq!(entry.record_id, None);
        assert_eq!(entry.comment, "INSERT applied (1 row(s))");
    }
}
