use async_trait::async_trait;
use busline_core::{
    Booking, BookingError, BookingResult, BookingSeat, BookingStatus, BookingStore, Gender,
    PassengerDetails, Seat, SeatStatus, SeatType, TripDirectory, TripInfo, TripTransaction,
    UserDirectory,
};
use busline_shared::Masked;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::storage_err;

const SEAT_COLUMNS: &str = "id, trip_id, seat_number, seat_type, seat_status, is_booked, is_hold, hold_expiry, created_at, updated_at";
const BOOKING_COLUMNS: &str = "id, booking_code, user_id, trip_id, booking_date, total_amount, booking_status, passenger_count, special_requests, cancellation_reason, refund_amount, created_at, updated_at";
const BOOKING_SEAT_COLUMNS: &str = "id, booking_id, seat_id, seat_number, passenger_name, passenger_age, passenger_gender, seat_fare, created_at";

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct SeatRow {
    id: Uuid,
    trip_id: Uuid,
    seat_number: i32,
    seat_type: String,
    seat_status: String,
    is_booked: bool,
    is_hold: bool,
    hold_expiry: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SeatRow> for Seat {
    type Error = BookingError;

    fn try_from(row: SeatRow) -> Result<Self, Self::Error> {
        Ok(Seat {
            id: row.id,
            trip_id: row.trip_id,
            seat_number: to_u32(row.seat_number, "seat_number")?,
            seat_type: row.seat_type.parse::<SeatType>().map_err(BookingError::Storage)?,
            status: row.seat_status.parse::<SeatStatus>().map_err(BookingError::Storage)?,
            is_booked: row.is_booked,
            is_hold: row.is_hold,
            hold_expiry: row.hold_expiry,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    booking_code: String,
    user_id: Uuid,
    trip_id: Uuid,
    booking_date: DateTime<Utc>,
    total_amount: i64,
    booking_status: String,
    passenger_count: i32,
    special_requests: Option<String>,
    cancellation_reason: Option<String>,
    refund_amount: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct BookingSeatRow {
    id: Uuid,
    booking_id: Uuid,
    seat_id: Uuid,
    seat_number: i32,
    passenger_name: Option<String>,
    passenger_age: Option<i32>,
    passenger_gender: Option<String>,
    seat_fare: Option<i64>,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingSeatRow> for BookingSeat {
    type Error = BookingError;

    fn try_from(row: BookingSeatRow) -> Result<Self, Self::Error> {
        let passenger = match row.passenger_name {
            Some(name) => Some(PassengerDetails {
                name: Masked(name),
                age: row.passenger_age.map(|a| to_u32(a, "passenger_age")).transpose()?,
                gender: row
                    .passenger_gender
                    .map(|g| g.parse::<Gender>().map_err(BookingError::Storage))
                    .transpose()?,
            }),
            None => None,
        };

        Ok(BookingSeat {
            id: row.id,
            booking_id: row.booking_id,
            seat_id: row.seat_id,
            seat_number: to_u32(row.seat_number, "seat_number")?,
            passenger,
            seat_fare: row.seat_fare,
            created_at: row.created_at,
        })
    }
}

fn to_u32(value: i32, column: &str) -> BookingResult<u32> {
    u32::try_from(value).map_err(|_| BookingError::Storage(format!("negative {}: {}", column, value)))
}

fn to_i32(value: u32, column: &str) -> BookingResult<i32> {
    i32::try_from(value).map_err(|_| BookingError::Storage(format!("{} out of range: {}", column, value)))
}

/// Advisory lock key for a trip: the high 64 bits of its id
fn trip_lock_key(trip_id: Uuid) -> i64 {
    (trip_id.as_u128() >> 64) as i64
}

async fn load_booking(conn: &mut PgConnection, booking_id: Uuid) -> BookingResult<Option<Booking>> {
    let sql = format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS);
    let row: Option<BookingRow> = sqlx::query_as(&sql)
        .bind(booking_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(storage_err)?;

    match row {
        Some(row) => Ok(Some(assemble_booking(conn, row).await?)),
        None => Ok(None),
    }
}

async fn assemble_booking(conn: &mut PgConnection, row: BookingRow) -> BookingResult<Booking> {
    let sql = format!(
        "SELECT {} FROM booking_seats WHERE booking_id = $1 ORDER BY seat_number",
        BOOKING_SEAT_COLUMNS
    );
    let seat_rows: Vec<BookingSeatRow> = sqlx::query_as(&sql)
        .bind(row.id)
        .fetch_all(&mut *conn)
        .await
        .map_err(storage_err)?;

    let seats = seat_rows
        .into_iter()
        .map(BookingSeat::try_from)
        .collect::<BookingResult<Vec<_>>>()?;

    Ok(Booking {
        id: row.id,
        booking_code: row.booking_code,
        user_id: row.user_id,
        trip_id: row.trip_id,
        booking_date: row.booking_date,
        total_amount: row.total_amount,
        status: row.booking_status.parse::<BookingStatus>().map_err(BookingError::Storage)?,
        passenger_count: to_u32(row.passenger_count, "passenger_count")?,
        special_requests: row.special_requests,
        cancellation_reason: row.cancellation_reason,
        refund_amount: row.refund_amount,
        seats,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

async fn load_bookings(conn: &mut PgConnection, rows: Vec<BookingRow>) -> BookingResult<Vec<Booking>> {
    let mut bookings = Vec::with_capacity(rows.len());
    for row in rows {
        bookings.push(assemble_booking(conn, row).await?);
    }
    Ok(bookings)
}

pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn begin(&self, trip_id: Uuid) -> BookingResult<Box<dyn TripTransaction>> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        // Serializes every unit of work on this trip, including seat map
        // generation where there are no rows yet to lock. Released on
        // commit or rollback.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(trip_lock_key(trip_id))
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;

        Ok(Box::new(PgTripTransaction { trip_id, tx }))
    }

    async fn booking(&self, booking_id: Uuid) -> BookingResult<Option<Booking>> {
        let mut conn = self.pool.acquire().await.map_err(storage_err)?;
        load_booking(&mut *conn, booking_id).await
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> BookingResult<Vec<Booking>> {
        let mut conn = self.pool.acquire().await.map_err(storage_err)?;
        let sql = format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        );
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await
            .map_err(storage_err)?;
        load_bookings(&mut *conn, rows).await
    }

    async fn all_bookings(&self) -> BookingResult<Vec<Booking>> {
        let mut conn = self.pool.acquire().await.map_err(storage_err)?;
        let sql = format!("SELECT {} FROM bookings ORDER BY created_at DESC", BOOKING_COLUMNS);
        let rows: Vec<BookingRow> = sqlx::query_as(&sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(storage_err)?;
        load_bookings(&mut *conn, rows).await
    }

    async fn seats_for_trip(&self, trip_id: Uuid) -> BookingResult<Vec<Seat>> {
        let sql = format!("SELECT {} FROM seats WHERE trip_id = $1 ORDER BY seat_number", SEAT_COLUMNS);
        let rows: Vec<SeatRow> = sqlx::query_as(&sql)
            .bind(trip_id)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;
        rows.into_iter().map(Seat::try_from).collect()
    }
}

/// Postgres unit of work for one trip. Dropping it without `commit` rolls
/// the transaction back and releases the advisory lock.
pub struct PgTripTransaction {
    trip_id: Uuid,
    tx: Transaction<'static, Postgres>,
}

impl PgTripTransaction {
    async fn fetch_seats(&mut self, sql: &str, bind: SeatFilter<'_>) -> BookingResult<Vec<Seat>> {
        let query = sqlx::query_as::<_, SeatRow>(sql).bind(self.trip_id);
        let query = match bind {
            SeatFilter::All => query,
            SeatFilter::Numbers(numbers) => query.bind(numbers),
            SeatFilter::Ids(ids) => query.bind(ids),
        };
        let rows = query.fetch_all(&mut *self.tx).await.map_err(storage_err)?;
        rows.into_iter().map(Seat::try_from).collect()
    }
}

enum SeatFilter<'a> {
    All,
    Numbers(Vec<i32>),
    Ids(&'a [Uuid]),
}

#[async_trait]
impl TripTransaction for PgTripTransaction {
    fn trip_id(&self) -> Uuid {
        self.trip_id
    }

    async fn seats(&mut self) -> BookingResult<Vec<Seat>> {
        let sql = format!(
            "SELECT {} FROM seats WHERE trip_id = $1 ORDER BY seat_number FOR UPDATE",
            SEAT_COLUMNS
        );
        self.fetch_seats(&sql, SeatFilter::All).await
    }

    async fn insert_seats(&mut self, seats: &[Seat]) -> BookingResult<()> {
        for seat in seats {
            sqlx::query(
                r#"
                INSERT INTO seats (id, trip_id, seat_number, seat_type, seat_status, is_booked, is_hold, hold_expiry, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(seat.id)
            .bind(seat.trip_id)
            .bind(to_i32(seat.seat_number, "seat_number")?)
            .bind(seat.seat_type.as_str())
            .bind(seat.status.as_str())
            .bind(seat.is_booked)
            .bind(seat.is_hold)
            .bind(seat.hold_expiry)
            .bind(seat.created_at)
            .bind(seat.updated_at)
            .execute(&mut *self.tx)
            .await
            .map_err(storage_err)?;
        }
        debug!(trip_id = %self.trip_id, count = seats.len(), "Inserted seats");
        Ok(())
    }

    async fn seats_by_numbers(&mut self, numbers: &[u32]) -> BookingResult<Vec<Seat>> {
        let numbers = numbers
            .iter()
            .map(|n| to_i32(*n, "seat_number"))
            .collect::<BookingResult<Vec<i32>>>()?;
        let sql = format!(
            "SELECT {} FROM seats WHERE trip_id = $1 AND seat_number = ANY($2) ORDER BY seat_number FOR UPDATE",
            SEAT_COLUMNS
        );
        self.fetch_seats(&sql, SeatFilter::Numbers(numbers)).await
    }

    async fn seats_by_ids(&mut self, ids: &[Uuid]) -> BookingResult<Vec<Seat>> {
        let sql = format!(
            "SELECT {} FROM seats WHERE trip_id = $1 AND id = ANY($2) ORDER BY seat_number FOR UPDATE",
            SEAT_COLUMNS
        );
        self.fetch_seats(&sql, SeatFilter::Ids(ids)).await
    }

    async fn update_seat(&mut self, seat: &Seat) -> BookingResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE seats
            SET seat_status = $1, is_booked = $2, is_hold = $3, hold_expiry = $4, updated_at = $5
            WHERE id = $6 AND trip_id = $7
            "#,
        )
        .bind(seat.status.as_str())
        .bind(seat.is_booked)
        .bind(seat.is_hold)
        .bind(seat.hold_expiry)
        .bind(seat.updated_at)
        .bind(seat.id)
        .bind(self.trip_id)
        .execute(&mut *self.tx)
        .await
        .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            return Err(BookingError::NotFound(format!("Seat {} not found", seat.id)));
        }
        Ok(())
    }

    async fn insert_booking(&mut self, booking: &Booking) -> BookingResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, booking_code, user_id, trip_id, booking_date, total_amount, booking_status, passenger_count, special_requests, cancellation_reason, refund_amount, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.booking_code)
        .bind(booking.user_id)
        .bind(booking.trip_id)
        .bind(booking.booking_date)
        .bind(booking.total_amount)
        .bind(booking.status.as_str())
        .bind(to_i32(booking.passenger_count, "passenger_count")?)
        .bind(&booking.special_requests)
        .bind(&booking.cancellation_reason)
        .bind(booking.refund_amount)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(storage_err)?;

        for link in &booking.seats {
            let passenger = link.passenger.as_ref();
            sqlx::query(
                r#"
                INSERT INTO booking_seats (id, booking_id, seat_id, seat_number, passenger_name, passenger_age, passenger_gender, seat_fare, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(link.id)
            .bind(link.booking_id)
            .bind(link.seat_id)
            .bind(to_i32(link.seat_number, "seat_number")?)
            .bind(passenger.map(|p| p.name.as_inner().clone()))
            .bind(passenger.and_then(|p| p.age).map(|a| to_i32(a, "passenger_age")).transpose()?)
            .bind(passenger.and_then(|p| p.gender).map(|g| g.as_str()))
            .bind(link.seat_fare)
            .bind(link.created_at)
            .execute(&mut *self.tx)
            .await
            .map_err(storage_err)?;
        }
        Ok(())
    }

    async fn booking(&mut self, booking_id: Uuid) -> BookingResult<Option<Booking>> {
        load_booking(&mut *self.tx, booking_id).await
    }

    async fn update_booking(&mut self, booking: &Booking) -> BookingResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET booking_status = $1, cancellation_reason = $2, refund_amount = $3, updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(booking.status.as_str())
        .bind(&booking.cancellation_reason)
        .bind(booking.refund_amount)
        .bind(booking.updated_at)
        .bind(booking.id)
        .execute(&mut *self.tx)
        .await
        .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            return Err(BookingError::NotFound(format!("Booking {} not found", booking.id)));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> BookingResult<()> {
        let this = *self;
        this.tx.commit().await.map_err(storage_err)
    }
}

/// Trip and user lookups against the catalog and account tables
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TripDirectory for PgDirectory {
    async fn trip(&self, trip_id: Uuid) -> BookingResult<Option<TripInfo>> {
        let row: Option<(Uuid, Option<i32>)> = sqlx::query_as(
            r#"
            SELECT t.id, b.total_seats
            FROM trips t
            LEFT JOIN buses b ON b.id = t.bus_id
            WHERE t.id = $1
            "#,
        )
        .bind(trip_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        let Some((id, total_seats)) = row else {
            return Ok(None);
        };
        let bus_total_seats = match total_seats {
            Some(n) => Some(to_u32(n, "total_seats")?),
            None => None,
        };
        Ok(Some(TripInfo { id, bus_total_seats }))
    }
}

#[async_trait]
impl UserDirectory for PgDirectory {
    async fn user_exists(&self, user_id: Uuid) -> BookingResult<bool> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_lock_key_is_stable() {
        let trip_id = Uuid::new_v4();
        assert_eq!(trip_lock_key(trip_id), trip_lock_key(trip_id));
    }

    #[test]
    fn test_seat_row_conversion() {
        let now = Utc::now();
        let row = SeatRow {
            id: Uuid::new_v4(),
            trip_id: Uuid::new_v4(),
            seat_number: 3,
            seat_type: "WINDOW".to_string(),
            seat_status: "HOLD".to_string(),
            is_booked: false,
            is_hold: true,
            hold_expiry: Some(now),
            created_at: now,
            updated_at: now,
        };
        let seat = Seat::try_from(row).unwrap();
        assert_eq!(seat.seat_number, 3);
        assert_eq!(seat.status, SeatStatus::Hold);
        assert_eq!(seat.seat_type, SeatType::Window);
    }

    #[test]
    fn test_seat_row_rejects_negative_number() {
        let now = Utc::now();
        let row = SeatRow {
            id: Uuid::new_v4(),
            trip_id: Uuid::new_v4(),
            seat_number: -1,
            seat_type: "AISLE".to_string(),
            seat_status: "AVAILABLE".to_string(),
            is_booked: false,
            is_hold: false,
            hold_expiry: None,
            created_at: now,
            updated_at: now,
        };
        assert!(matches!(Seat::try_from(row), Err(BookingError::Storage(_))));
    }
}
