//! Steady-cadence usage collection.
//!
//! Each tick reads the appliances currently switched ON, draws a synthetic
//! energy reading per appliance, and submits it through the write gate with
//! the tick's calendar date. Denied readings are dropped and counted; a new
//! tick is a fresh attempt, never a retry.

use crate::db::models::{appliance_status, Appliance, NewUsageRecord};
use crate::gate::GateError;
use crate::schema;
use crate::services::usage;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use log::{info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickStats {
    pub recorded: usize,
    pub denied: usize,
}

pub fn run_loop(conn: &mut PgConnection, actor: &str, interval: Duration) -> Result<(), String> {
    let mut rng = SmallRng::seed_from_u64(0x57A7_7000_CAFE_F00Du64);
    loop {
        let tick_start = Instant::now();

        collect_once(conn, actor, Utc::now(), &mut rng)?;

        // Maintain steady cadence
        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
}

pub fn collect_once(
    conn: &mut PgConnection,
    actor: &str,
    now: DateTime<Utc>,
    rng: &mut SmallRng,
) -> Result<TickStats, String> {
    use schema::appliances::dsl as A;

    let active: Vec<Appliance> = A::appliances
        .filter(A::status.eq(appliance_status::ON))
        .select(Appliance::as_select())
        .load(conn)
        .map_err(|e| format!("fetch active appliances failed: {}", e))?;

    let today = now.date_naive();
    let mut stats = TickStats::default();
    for appliance in &active {
        let row = NewUsageRecord {
            appliance_id: appliance.id,
            recorded_at: now,
            energy_kwh: draw_energy_kwh(&appliance.appliance_type, rng),
        };
        match usage::record_usage(conn, today, actor, &row) {
            Ok(_) => stats.recorded += 1,
            Err(GateError::Denied {
                reason,
                audit_persisted,
            }) => {
                stats.denied += 1;
                info!(
                    "Collect: reading for appliance {} dropped: {}",
                    appliance.id, reason
                );
                if !audit_persisted {
                    warn!("Collect: denial for appliance {} was not audited", appliance.id);
                }
            }
            Err(e) => {
                return Err(format!("record usage for appliance {} failed: {}", appliance.id, e));
            }
        }
    }

    info!(
        "Collect: tick complete (active={}, recorded={}, denied={})",
        active.len(),
        stats.recorded,
        stats.denied
    );
    Ok(stats)
}

fn draw_energy_kwh(appliance_type: &str, rng: &mut SmallRng) -> f64 {
    let (base, jitter): (f64, f64) = match appliance_type {
        "FRIDGE" => (0.035, 0.010),
        "HEAT_PUMP" => (0.9, 0.35),
        "EV_CHARGER" => (2.4, 1.2),
        "WASHING_MACHINE" => (0.5, 0.3),
        "DISHWASHER" => (0.45, 0.2),
        _ => (0.12, 0.08),
    };
    (base + rng.random_range(-jitter..=jitter)).max(0.001)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    #[test]
    fn readings_are_positive() {
        let mut rng = rng();
        for appliance_type in ["FRIDGE", "HEAT_PUMP", "EV_CHARGER", "TOASTER"] {
            for _ in 0..100 {
                assert!(draw_energy_kwh(appliance_type, &mut rng) > 0.0);
            }
        }
    }

    #[test]
    fn readings_stay_within_appliance_band() {
        let mut rng = rng();
        for _ in 0..100 {
            let kwh = draw_energy_kwh("FRIDGE", &mut rng);
            assert!((0.025..=0.045).contains(&kwh));
        }
    }

    #[test]
    fn unknown_type_uses_fallback_band() {
        let mut rng = rng();
        for _ in 0..100 {
            let kwh = draw_energy_kwh("TOASTER", &mut rng);
            assert!((0.001..=0.2).contains(&kwh));
        }
    }
}
