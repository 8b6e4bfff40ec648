//! Business identifiers: patient record numbers and appointment codes.
//!
//! Every generator here reads and writes storage, so callers run them inside
//! an `Immediate` transaction together with the insert that consumes the
//! identifier. SQLite then serialises concurrent writers.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use crate::db::{self, DatabaseError};
use crate::error::ClinicError;
use crate::models::AppointmentCodeScheme;

const RECORD_PREFIX: &str = "RM";
const DAILY_PREFIX: &str = "A";
const POLI_PREFIX: &str = "APP";

/// Largest counter that fits the four-digit daily sequence.
const MAX_DAILY_COUNTER: i64 = 9999;

/// Width of the variant A disambiguator.
const POLI_DISAMBIGUATOR_MODULUS: u64 = 10_000_000_000;

/// Next record number for `date`: `RM` + `YYYYMMDD` + four-digit counter.
///
/// Running past 9999 in one day is a conflict, not a storage failure.
pub fn next_record_number(conn: &Connection, date: NaiveDate) -> Result<String, ClinicError> {
    let counter = db::increment_date_counter(conn, date)?;
    if counter > MAX_DAILY_COUNTER {
        return Err(ClinicError::Conflict(format!(
            "Daily record number sequence exhausted for {date}"
        )));
    }
    Ok(format_record_number(date, counter))
}

pub fn format_record_number(date: NaiveDate, counter: i64) -> String {
    format!("{RECORD_PREFIX}{}{counter:04}", date.format("%Y%m%d"))
}

/// Variant A: `APP-{POLI}-{YYYYMMDD}{10-digit disambiguator}`.
///
/// Uniqueness rests entirely on the disambiguator.
pub fn appointment_code_poli(poli: &str, date: NaiveDate, disambiguator: u64) -> String {
    let poli: String = poli
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_uppercase();
    format!(
        "{POLI_PREFIX}-{poli}-{}{:010}",
        date.format("%Y%m%d"),
        disambiguator % POLI_DISAMBIGUATOR_MODULUS
    )
}

/// Variant B: `A{YYYYMMDD}{4-digit counter}`, optionally followed by
/// `-{4 digits}` taken from a timestamp.
///
/// The counter continues from the highest code already stored for the date.
pub fn next_daily_appointment_code(
    conn: &Connection,
    date: NaiveDate,
    suffix: Option<u32>,
) -> Result<String, ClinicError> {
    let prefix = format!("{DAILY_PREFIX}{}", date.format("%Y%m%d"));
    let last = match db::get_max_code_with_prefix(conn, &prefix)? {
        Some(code) => parse_daily_counter(&code, &prefix)?,
        None => 0,
    };

    let next = last + 1;
    if next > MAX_DAILY_COUNTER {
        return Err(ClinicError::Conflict(format!(
            "Daily appointment code sequence exhausted for {date}"
        )));
    }

    Ok(match suffix {
        Some(s) => format!("{prefix}{next:04}-{:04}", s % 10_000),
        None => format!("{prefix}{next:04}"),
    })
}

fn parse_daily_counter(code: &str, prefix: &str) -> Result<i64, DatabaseError> {
    code.strip_prefix(prefix)
        .and_then(|rest| rest.get(..4))
        .and_then(|digits| digits.parse::<i64>().ok())
        .ok_or_else(|| {
            DatabaseError::ConstraintViolation(format!("malformed appointment code: {code}"))
        })
}

impl AppointmentCodeScheme {
    /// Generate a code for an appointment booked at `now`.
    pub fn next_code(
        &self,
        conn: &Connection,
        poli: &str,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<String, ClinicError> {
        let millis = now.and_utc().timestamp_millis().unsigned_abs();
        match self {
            AppointmentCodeScheme::Poli => {
                let mut disambiguator = millis;
                loop {
                    let code = appointment_code_poli(poli, date, disambiguator);
                    if db::get_appointment(conn, &code)?.is_none() {
                        return Ok(code);
                    }
                    disambiguator += 1;
                }
            }
            AppointmentCodeScheme::Daily => next_daily_appointment_code(conn, date, None),
            AppointmentCodeScheme::DailySuffixed => {
                next_daily_appointment_code(conn, date, Some((millis % 10_000) as u32))
            }
        }
    }
}
