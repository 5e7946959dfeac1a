//! Idempotent demo and reference data.
//!
//! Loads one demo user/home/appliance set plus the holiday calendar the
//! write gate checks against. Safe to run on every startup; everything is
//! upserted.

use crate::db::models::{appliance_status, NewAppliance, NewHoliday, NewHome, NewUser};
use crate::schema;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use log::info;

const DEMO_USER_NAME: &str = "Ada Watts";
const DEMO_USER_EMAIL: &str = "ada.watts@example.com";
const DEMO_HOME_ADDRESS: &str = "12 Kilowatt Close";
const DEMO_HOME_CITY: &str = "Townsville";

const APPLIANCES: [(&str, Option<&str>, &str); 5] = [
    ("FRIDGE", Some("Coolpoint"), appliance_status::ON),
    ("HEAT_PUMP", Some("Thermaflow"), appliance_status::ON),
    ("EV_CHARGER", Some("Voltly"), appliance_status::ON),
    ("WASHING_MACHINE", Some("Whirlaway"), appliance_status::IDLE),
    ("DISHWASHER", None, appliance_status::OFF),
];

// (name, YYYY-MM-DD, description)
const HOLIDAYS: [(&str, &str, Option<&str>); 5] = [
    ("New Year's Day", "2025-01-01", None),
    ("Easter Monday", "2025-04-21", None),
    ("Labour Day", "2025-05-01", Some("International Workers' Day")),
    ("Christmas Day", "2025-12-25", None),
    ("Boxing Day", "2025-12-26", None),
];

pub fn run(conn: &mut PgConnection) -> Result<(), String> {
    let user_id = ensure_user(conn)?;
    let home_id = ensure_home(conn, user_id)?;
    ensure_appliances(conn, home_id)?;
    let holidays = ensure_holidays(conn)?;
    info!(
        "Seed: demo data ready (user={}, home={}, appliances={}, holidays={})",
        user_id,
        home_id,
        APPLIANCES.len(),
        holidays
    );
    Ok(())
}

fn ensure_user(conn: &mut PgConnection) -> Result<i64, String> {
    use schema::users::dsl as U;

    let new_user = NewUser {
        name: DEMO_USER_NAME.to_string(),
        email: DEMO_USER_EMAIL.to_string(),
    };
    diesel::insert_into(U::users)
        .values(&new_user)
        .on_conflict(U::email)
        .do_update()
        .set((U::name.eq(new_user.name.clone()), U::updated_at.eq(Utc::now())))
        .execute(conn)
        .map_err(|e| format!("upsert user failed: {}", e))?;

    U::users
        .filter(U::email.eq(DEMO_USER_EMAIL))
        .select(U::id)
        .first(conn)
        .map_err(|e| format!("fetch user id failed: {}", e))
}

fn ensure_home(conn: &mut PgConnection, user_id: i64) -> Result<i64, String> {
    use schema::homes::dsl as H;

    let new_home = NewHome {
        user_id,
        address: DEMO_HOME_ADDRESS.to_string(),
        city: Some(DEMO_HOME_CITY.to_string()),
    };
    diesel::insert_into(H::homes)
        .values(&new_home)
        .on_conflict((H::user_id, H::address))
        .do_update()
        .set((H::city.eq(new_home.city.clone()), H::updated_at.eq(Utc::now())))
        .execute(conn)
        .map_err(|e| format!("upsert home failed: {}", e))?;

    H::homes
        .filter(H::user_id.eq(user_id).and(H::address.eq(DEMO_HOME_ADDRESS)))
        .select(H::id)
        .first(conn)
        .map_err(|e| format!("fetch home id failed: {}", e))
}

fn ensure_appliances(conn: &mut PgConnection, home_id: i64) -> Result<(), String> {
    use schema::appliances::dsl as A;

    for (appliance_type, brand, status) in APPLIANCES {
        let new_appliance = NewAppliance {
            home_id,
            appliance_type: appliance_type.to_string(),
            brand: brand.map(str::to_string),
            status: status.to_string(),
        };
        diesel::insert_into(A::appliances)
            .values(&new_appliance)
            .on_conflict((A::home_id, A::appliance_type))
            .do_update()
            .set((
                A::brand.eq(new_appliance.brand.clone()),
                A::status.eq(new_appliance.status.clone()),
                A::updated_at.eq(Utc::now()),
            ))
            .execute(conn)
            .map_err(|e| format!("upsert appliance {} failed: {}", appliance_type, e))?;
    }
    Ok(())
}

fn ensure_holidays(conn: &mut PgConnection) -> Result<usize, String> {
    use schema::holidays::dsl as H;

    for (name, date, description) in HOLIDAYS {
        let holiday_date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| format!("holiday {} has invalid date {}: {}", name, date, e))?;
        let new_holiday = NewHoliday {
            name: name.to_string(),
            holiday_date,
            description: description.map(str::to_string),
        };
        diesel::insert_into(H::holidays)
            .values(&new_holiday)
            .on_conflict(H::holiday_date)
            .do_update()
            .set((
                H::name.eq(new_holiday.name.clone()),
                H::description.eq(new_holiday.description.clone()),
            ))
            .execute(conn)
            .map_err(|e| format!("upsert holiday {} failed: {}", name, e))?;
    }
    Ok(HOLIDAYS.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holiday_calendar_parses() {
        for (name, date, _) in HOLIDAYS {
            assert!(
                NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok(),
                "bad date for {}",
                name
            );
        }
    }

    #[test]
    fn appliance_statuses_are_known_values() {
        for (_, _, status) in APPLIANCES {
            assert!(matches!(
                status,
                appliance_status::ON | appliance_status::OFF | appliance_status::IDLE
            ));
        }
    }
}
