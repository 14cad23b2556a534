use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};

use super::store::CreateBookingError;
use crate::models::{Booking, BookingStatus, Service, ServiceStatus};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SERVICE_COLUMNS: &str =
    "id, user_id, title, description, category, price, availability, status, created_at, updated_at";

const BOOKING_COLUMNS: &str =
    "id, service_id, client_id, provider_id, date, slot, status, notes, created_at, updated_at";

// ── Services ──

pub fn insert_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, user_id, title, description, category, price, availability, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            service.id,
            service.user_id,
            service.title,
            service.description,
            service.category,
            service.price,
            service.availability,
            service.status.as_str(),
            service.created_at.format(TIMESTAMP_FORMAT).to_string(),
            service.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let result = conn.query_row(
        &format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1"),
        params![id],
        |row| Ok(parse_service_row(row)),
    );

    match result {
        Ok(service) => Ok(Some(service?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_services_for_user(conn: &Connection, user_id: &str) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE user_id = ?1 ORDER BY created_at DESC, id ASC"
    ))?;

    let rows = stmt.query_map(params![user_id], |row| Ok(parse_service_row(row)))?;

    let mut services = vec![];
    for row in rows {
        services.push(row??);
    }
    Ok(services)
}

/// Only the owner's row is touched; returns rows affected.
pub fn update_service_status(
    conn: &Connection,
    id: &str,
    status: ServiceStatus,
    user_id: &str,
    now: NaiveDateTime,
) -> anyhow::Result<usize> {
    let count = conn.execute(
        "UPDATE services SET status = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
        params![status.as_str(), now.format(TIMESTAMP_FORMAT).to_string(), id, user_id],
    )?;
    Ok(count)
}

/// Rewrites the editable columns of an owned service; returns rows affected.
pub fn update_service(conn: &Connection, service: &Service) -> anyhow::Result<usize> {
    let count = conn.execute(
        "UPDATE services
         SET title = ?1, description = ?2, category = ?3, price = ?4, availability = ?5, updated_at = ?6
         WHERE id = ?7 AND user_id = ?8",
        params![
            service.title,
            service.description,
            service.category,
            service.price,
            service.availability,
            service.updated_at.format(TIMESTAMP_FORMAT).to_string(),
            service.id,
            service.user_id,
        ],
    )?;
    Ok(count)
}

/// Removes an owned service together with its booking history, in one
/// transaction. Returns the number of services removed.
pub fn delete_service(conn: &Connection, id: &str, user_id: &str) -> anyhow::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM bookings
         WHERE service_id = ?1 AND EXISTS (SELECT 1 FROM services WHERE id = ?1 AND user_id = ?2)",
        params![id, user_id],
    )
    .context("failed to delete service bookings")?;
    let count = tx
        .execute(
            "DELETE FROM services WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )
        .context("failed to delete service")?;
    tx.commit()?;
    Ok(count)
}

fn parse_service_row(row: &rusqlite::Row) -> anyhow::Result<Service> {
    let status_str: String = row.get(7)?;
    let created_at_str: String = row.get(8)?;
    let updated_at_str: String = row.get(9)?;

    Ok(Service {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        price: row.get(5)?,
        availability: row.get(6)?,
        status: ServiceStatus::parse(&status_str)
            .ok_or_else(|| anyhow::anyhow!("unknown service status in database: {status_str}"))?,
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}

// ── Bookings ──

/// Inserts a booking. The partial unique index on active bookings is the
/// authority on slot occupancy, so a unique violation means the slot is taken.
pub fn insert_booking(conn: &Connection, booking: &Booking) -> Result<(), CreateBookingError> {
    let result = conn.execute(
        "INSERT INTO bookings (id, service_id, client_id, provider_id, date, slot, status, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            booking.id,
            booking.service_id,
            booking.client_id,
            booking.provider_id,
            booking.date.format(DATE_FORMAT).to_string(),
            booking.slot,
            booking.status.as_str(),
            booking.notes,
            booking.created_at.format(TIMESTAMP_FORMAT).to_string(),
            booking.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Err(CreateBookingError::SlotTaken)
        }
        Err(e) => Err(CreateBookingError::Store(
            anyhow::Error::new(e).context("failed to insert booking"),
        )),
    }
}

/// SQL list of the statuses that hold a slot, e.g. `'pending', 'accepted'`.
fn active_status_list() -> String {
    BookingStatus::ALL
        .iter()
        .filter(|s| s.is_active())
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_bookings_for_client(conn: &Connection, client_id: &str) -> anyhow::Result<Vec<Booking>> {
    collect_bookings(
        conn,
        &format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE client_id = ?1 ORDER BY date DESC, slot DESC"
        ),
        params![client_id],
    )
}

pub fn get_bookings_for_service(conn: &Connection, service_id: &str) -> anyhow::Result<Vec<Booking>> {
    collect_bookings(
        conn,
        &format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE service_id = ?1 ORDER BY date DESC, slot DESC"
        ),
        params![service_id],
    )
}

/// Pending and accepted bookings for one service over an inclusive date range.
pub fn get_active_bookings_between(
    conn: &Connection,
    service_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> anyhow::Result<Vec<Booking>> {
    let active = active_status_list();
    collect_bookings(
        conn,
        &format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings
             WHERE service_id = ?1 AND date >= ?2 AND date <= ?3 AND status IN ({active})
             ORDER BY date ASC, slot ASC"
        ),
        params![
            service_id,
            from.format(DATE_FORMAT).to_string(),
            to.format(DATE_FORMAT).to_string(),
        ],
    )
}

pub fn count_active_bookings_for_service(conn: &Connection, service_id: &str) -> anyhow::Result<usize> {
    let active = active_status_list();
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM bookings WHERE service_id = ?1 AND status IN ({active})"),
        params![service_id],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Conditioned write: matches the id, an actor who is the client or the
/// provider, and the status the caller validated against. Returns rows
/// affected, so zero means one of those no longer holds.
pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    expected: BookingStatus,
    status: BookingStatus,
    actor_id: &str,
    now: NaiveDateTime,
) -> anyhow::Result<usize> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2
         WHERE id = ?3 AND (client_id = ?4 OR provider_id = ?4) AND status = ?5",
        params![
            status.as_str(),
            now.format(TIMESTAMP_FORMAT).to_string(),
            id,
            actor_id,
            expected.as_str(),
        ],
    )?;
    Ok(count)
}

fn collect_bookings(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let date_str: String = row.get(4)?;
    let status_str: String = row.get(6)?;
    let created_at_str: String = row.get(8)?;
    let updated_at_str: String = row.get(9)?;

    let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
        .with_context(|| format!("booking {id} has malformed date: {date_str}"))?;
    let status = BookingStatus::parse(&status_str)
        .ok_or_else(|| anyhow::anyhow!("booking {id} has unknown status: {status_str}"))?;

    Ok(Booking {
        service_id: row.get(1)?,
        client_id: row.get(2)?,
        provider_id: row.get(3)?,
        date,
        slot: row.get(5)?,
        status,
        notes: row.get(7)?,
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
        id,
    })
}

fn parse_timestamp(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .with_context(|| format!("malformed timestamp in database: {s}"))
}
