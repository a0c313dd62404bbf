use std::collections::BTreeSet;
use std::path::Path;

use log::info;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use uuid::Uuid;

use crate::config::OpsConfig;
use crate::consolidation::GroupMerge;
use crate::error::StoreError;
use crate::migrations::ensure_schema;
use crate::models::{
    Booking, BookingId, BookingStatus, EnvironmentalReading, FlagStatus, NewBooking,
    PaymentStatus, SiteId,
};
use crate::storage::{BookingFilter, BookingStore};

const BOOKING_COLUMNS: &str =
    "id, site_id, dive_date_unix, end_date_unix, group_name, status, payment_status, notes";

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// SQLite-backed booking store. Each merge and multi-row delete runs in its
/// own transaction.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    /// Open `database_path` from the config, or an in-memory database when
    /// it is unset.
    pub fn from_config(config: &OpsConfig) -> Result<Self, StoreError> {
        match config.database_path.as_deref() {
            Some(path) => {
                info!("opening booking database at {path}");
                Self::open(path)
            }
            None => {
                info!("no database path configured, using in-memory SQLite");
                Self::open_in_memory()
            }
        }
    }

    fn with_connection(mut conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", true)?;
        ensure_schema(&mut conn)?;
        Ok(Self { conn })
    }

    fn touch(&self, sql: &str, id: &BookingId, value: &dyn ToSql) -> Result<(), StoreError> {
        let changed = self.conn.execute(sql, params![value, id.0])?;
        if changed == 0 {
            return Err(StoreError::BookingNotFound(id.clone()));
        }
        Ok(())
    }
}

fn parse_column<T>(idx: usize, raw: String, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            Box::new(StoreError::Backend(format!("unexpected value {raw:?}"))),
        )
    })
}

fn booking_from_row(row: &Row<'_>) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: BookingId(row.get(0)?),
        site_id: SiteId(row.get(1)?),
        dive_date_unix: row.get(2)?,
        end_date_unix: row.get(3)?,
        group_name: row.get(4)?,
        status: parse_column(5, row.get(5)?, BookingStatus::parse)?,
        payment_status: parse_column(6, row.get(6)?, PaymentStatus::parse)?,
        notes: row.get(7)?,
    })
}

fn reading_from_row(row: &Row<'_>) -> rusqlite::Result<EnvironmentalReading> {
    Ok(EnvironmentalReading {
        booking_id: BookingId(row.get(0)?),
        temperature_c: row.get(1)?,
        wind_speed_kmh: row.get(2)?,
        wave_height_m: row.get(3)?,
        tide_status: row.get(4)?,
        flag_status: parse_column(5, row.get(5)?, FlagStatus::parse)?,
        flag_reason: row.get(6)?,
        recorded_at_unix: row.get(7)?,
    })
}

/// Delete each distinct id once; a repeated id is not a missing one.
fn delete_all(conn: &Connection, ids: &[BookingId]) -> Result<(), StoreError> {
    let unique: BTreeSet<&BookingId> = ids.iter().collect();
    for id in unique {
        if conn.execute("DELETE FROM bookings WHERE id = ?1", params![id.0])? == 0 {
            return Err(StoreError::BookingNotFound(id.clone()));
        }
    }
    Ok(())
}

impl BookingStore for SqliteStore {
    fn create_booking(&mut self, booking: NewBooking) -> Result<Booking, StoreError> {
        let booking = booking.into_booking(BookingId(Uuid::new_v4().to_string()));
        self.conn.execute(
            "INSERT INTO bookings (id, site_id, dive_date_unix, end_date_unix, group_name, status, payment_status, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                booking.id.0,
                booking.site_id.0,
                booking.dive_date_unix,
                booking.end_date_unix,
                booking.group_name,
                booking.status.as_str(),
                booking.payment_status.as_str(),
                booking.notes,
            ],
        )?;
        Ok(booking)
    }

    fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings
             WHERE (?1 IS NULL OR site_id = ?1)
               AND (?2 = 0 OR end_date_unix IS NULL)
               AND (?3 = 0 OR group_name IS NOT NULL)
             ORDER BY dive_date_unix, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                filter.site_id.as_ref().map(|s| s.0.as_str()),
                filter.open_ended_only,
                filter.grouped_only,
            ],
            booking_from_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn load_booking(&self, id: &BookingId) -> Result<Option<Booking>, StoreError> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id.0], booking_from_row)
            .optional()?)
    }

    fn update_booking_end_date(
        &mut self,
        id: &BookingId,
        end_date_unix: Option<i64>,
    ) -> Result<(), StoreError> {
        self.touch(
            "UPDATE bookings SET end_date_unix = ?1 WHERE id = ?2",
            id,
            &end_date_unix,
        )
    }

    fn update_booking_status(
        &mut self,
        id: &BookingId,
        status: BookingStatus,
    ) -> Result<(), StoreError> {
        self.touch(
            "UPDATE bookings SET status = ?1 WHERE id = ?2",
            id,
            &status.as_str(),
        )
    }

    fn update_payment_status(
        &mut self,
        id: &BookingId,
        status: PaymentStatus,
    ) -> Result<(), StoreError> {
        self.touch(
            "UPDATE bookings SET payment_status = ?1 WHERE id = ?2",
            id,
            &status.as_str(),
        )
    }

    fn delete_bookings(&mut self, ids: &[BookingId]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        delete_all(&tx, ids)?;
        tx.commit()?;
        Ok(())
    }

    fn apply_merge(&mut self, merge: &GroupMerge) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE bookings SET end_date_unix = ?1 WHERE id = ?2",
            params![merge.end_date_unix, merge.keep.0],
        )?;
        if changed == 0 {
            return Err(StoreError::BookingNotFound(merge.keep.clone()));
        }
        delete_all(&tx, &merge.remove)?;
        tx.commit()?;
        Ok(())
    }

    fn upsert_reading(&mut self, reading: EnvironmentalReading) -> Result<(), StoreError> {
        if self.load_booking(&reading.booking_id)?.is_none() {
            return Err(StoreError::BookingNotFound(reading.booking_id));
        }
        self.conn.execute(
            "INSERT INTO environmental_readings
                (booking_id, temperature_c, wind_speed_kmh, wave_height_m, tide_status, flag_status, flag_reason, recorded_at_unix)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(booking_id) DO UPDATE SET
                temperature_c = excluded.temperature_c,
                wind_speed_kmh = excluded.wind_speed_kmh,
                wave_height_m = excluded.wave_height_m,
                tide_status = excluded.tide_status,
                flag_status = excluded.flag_status,
                flag_reason = excluded.flag_reason,
                recorded_at_unix = excluded.recorded_at_unix",
            params![
                reading.booking_id.0,
                reading.temperature_c,
                reading.wind_speed_kmh,
                reading.wave_height_m,
                reading.tide_status,
                reading.flag_status.as_str(),
                reading.flag_reason,
                reading.recorded_at_unix,
            ],
        )?;
        Ok(())
    }

    fn load_reading(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<EnvironmentalReading>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT booking_id, temperature_c, wind_speed_kmh, wave_height_m, tide_status, flag_status, flag_reason, recorded_at_unix
                 FROM environmental_readings WHERE booking_id = ?1",
                params![booking_id.0],
                reading_from_row,
            )
            .optional()?)
    }
}
