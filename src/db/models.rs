//! Diesel model structs representing application entities and the audit log.
//!
//! Important: Migrations set up the foreign keys and CHECK constraints; the
//! structs here only mirror the column layout.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema;

// Useful constants for standardizing `appliances.status` and audit columns.
pub mod appliance_status {
    pub const ON: &str = "ON";
    pub const OFF: &str = "OFF";
    pub const IDLE: &str = "IDLE";
}

pub mod audit_status {
    pub const ALLOWED: &str = "ALLOWED";
    pub const DENIED: &str = "DENIED";
}

pub mod tables {
    pub const USAGE_RECORDS: &str = "usage_records";
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::users)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::users)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::homes)]
#[diesel(belongs_to(User))]
pub struct Home {
    pub id: i64,
    pub user_id: i64,
    pub address: String,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::homes)]
pub struct NewHome {
    pub user_id: i64,
    pub address: String,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::appliances)]
#[diesel(belongs_to(Home))]
pub struct Appliance {
    pub id: i64,
    pub home_id: i64,
    pub appliance_type: String,
    pub brand: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::appliances)]
pub struct NewAppliance {
    pub home_id: i64,
    pub appliance_type: String,
    pub brand: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::usage_records)]
#[diesel(belongs_to(Appliance))]
pub struct UsageRecord {
    pub id: i64,
    pub appliance_id: i64,
    pub recorded_at: DateTime<Utc>,
    pub energy_kwh: f64,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::usage_records)]
pub struct NewUsageRecord {
    pub appliance_id: i64,
    pub recorded_at: DateTime<Utc>,
    pub energy_kwh: f64,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::holidays)]
pub struct Holiday {
    pub id: i64,
    pub name: String,
    pub holiday_date: NaiveDate,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::holidays)]
pub struct NewHoliday {
    pub name: String,
    pub holiday_date: NaiveDate,
    pub description: Option<String>,
}

// Append-only: rows are written by the gate and never touched again.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::audit_log)]
pub struct AuditEntry {
    pub id: i64,
    pub logged_at: DateTime<Utc>,
    pub actor: String,
    pub affected_table: String,
    pub operation: String,
    pub record_id: Option<i64>,
    pub status: String,
    pub comment: String,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::audit_log)]
pub struct NewAuditEntry {
    pub logged_at: DateTime<Utc>,
    pub actor: String,
    pub affected_table: String,
    pub operation: String,
    pub record_id: Option<i64>,
    pub status: String,
    pub comment: String,
}
