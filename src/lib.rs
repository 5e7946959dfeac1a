//! Smart-home energy monitoring with a restricted-day write gate.
//!
//! Usage records may only be written on unrestricted days (weekends that are
//! not listed holidays); every denied attempt is recorded in an append-only
//! audit log. The binary connects to Postgres, applies migrations, seeds the
//! holiday calendar plus demo entities, and runs a collection loop that
//! submits appliance readings through the gate.

pub mod calendar;
pub mod config;
pub mod db {
    pub mod models;
}
pub mod gate;
pub mod schema;
pub mod services {
    pub mod audit;
    pub mod collect;
    pub mod seed;
    pub mod usage;
}

use crate::config::Config;
use crate::services::{collect, seed};
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::info;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

fn apply_database_migrations(conn: &mut PgConnection) -> Result<(), String> {
    match conn.run_pending_migrations(MIGRATIONS) {
        Ok(applied) => {
            if applied.is_empty() {
                info!("Database schema is up to date; no migrations were applied");
            } else {
                let names = applied.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
                info!("Applied {} database migration(s): {}", applied.len(), names);
            }
            Ok(())
        }
        Err(e) => Err(format!("Applying database migrations failed: {}", e)),
    }
}

pub fn run() -> Result<(), String> {
    // 1) Load config
    let cfg = Config::from_env()?;
    info!(
        "Config loaded (seed_enabled={}, collect_enabled={}, collect_interval={}s, collect_actor={})",
        cfg.seed_enabled,
        cfg.collect_enabled,
        cfg.collect_interval.as_secs(),
        cfg.collect_actor
    );

    // 2) Connect DB
    let mut conn = PgConnection::establish(&cfg.database_url).map_err(|e| format!("DB connection failed: {}", e))?;
    info!("Connected to database");

    // 3) Apply pending database migrations
    apply_database_migrations(&mut conn)?;

    // 4) Seed demo entities and the holiday calendar
    if cfg.seed_enabled {
        seed::run(&mut conn)?;
    } else {
        info!("Seeding disabled via SEED_ENABLED={}", cfg.seed_enabled);
    }

    // 5) Report today's restriction status
    let today = Utc::now().date_naive();
    let holiday_dates: Vec<NaiveDate> = calendar::holidays_on(&mut conn, today)?
        .iter()
        .map(|h| h.holiday_date)
        .collect();
    if calendar::is_restricted_day(today, &holiday_dates) {
        info!("Today ({}) is a restricted day; usage writes will be denied", today);
    } else {
        info!("Today ({}) is unrestricted; usage writes are permitted", today);
    }

    // 6) Collection loop (steady cadence, every write through the gate)
    if cfg.collect_enabled {
        info!(
            "Starting collection loop: interval={}s, actor={}",
            cfg.collect_interval.as_secs(),
            cfg.collect_actor
        );
        collect::run_loop(&mut conn, &cfg.collect_actor, cfg.collect_interval)?;
    } else {
        info!("Collection loop disabled via COLLECT_ENABLED={}", cfg.collect_enabled);
    }

    Ok(())
}
