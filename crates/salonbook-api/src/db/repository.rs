//! PostgreSQL implementation of [`BookingRepository`].
//!
//! Each table stores the full record as a JSONB `document` plus the
//! columns the queries filter and lock on. Every write recomputes those
//! columns from the record, so the document is authoritative.
//!
//! Status updates and ratings run in one transaction that locks the
//! booking row (`SELECT .. FOR UPDATE`) and then, when a job slot or
//! rating is involved, the hairdresser row. Locks are always taken in
//! that order. The compare-and-swap checks run against the locked rows,
//! so two writers racing on the same booking serialize and the loser sees
//! [`RepositoryError::Conflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::postgres::PgPool;
use sqlx::{Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use salonbook_booking::{
    apply_job_slot, BookingQuery, BookingRepository, HairdresserPatch, Page, RepositoryError,
    SalonListing, SalonPatch, SortOrder,
};
use salonbook_core::{BookingId, HairdresserId, SalonId, Timestamp};
use salonbook_state::{ActorRole, Booking, BookingStatus, Hairdresser, Salon, StatusUpdate};

/// [`BookingRepository`] over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

type Tx<'c> = Transaction<'c, Postgres>;

/// Internal row type for document-only selects.
#[derive(sqlx::FromRow)]
struct DocumentRow {
    document: serde_json::Value,
}

/// Internal row type for the salon/owner join.
#[derive(sqlx::FromRow)]
struct SalonListingRow {
    salon: serde_json::Value,
    owner: serde_json::Value,
}

fn map_sqlx(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(db.message().to_string())
        }
        other => RepositoryError::Unavailable(other.to_string()),
    }
}

fn encode<T: Serialize>(entity: &'static str, value: &T) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(value)
        .map_err(|e| RepositoryError::Unavailable(format!("failed to encode {entity}: {e}")))
}

fn decode<T: DeserializeOwned>(
    entity: &'static str,
    document: serde_json::Value,
) -> Result<T, RepositoryError> {
    serde_json::from_value(document)
        .map_err(|e| RepositoryError::Unavailable(format!("corrupt {entity} document: {e}")))
}

fn utc(ts: Timestamp) -> DateTime<Utc> {
    *ts.as_datetime()
}

fn clamp_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

// -- Row locking and writes inside a transaction ------------------------------

async fn lock_booking(tx: &mut Tx<'_>, id: BookingId) -> Result<Booking, RepositoryError> {
    let row = sqlx::query_as::<_, DocumentRow>(
        "SELECT document FROM bookings WHERE id = $1 FOR UPDATE",
    )
    .bind(id.0)
    .fetch_optional(&mut **tx)
    .await
    .map_err(map_sqlx)?
    .ok_or_else(|| RepositoryError::not_found("booking", id))?;
    decode("booking", row.document)
}

async fn lock_hairdresser(tx: &mut Tx<'_>, id: HairdresserId) -> Result<Hairdresser, RepositoryError> {
    let row = sqlx::query_as::<_, DocumentRow>(
        "SELECT document FROM hairdressers WHERE id = $1 FOR UPDATE",
    )
    .bind(id.0)
    .fetch_optional(&mut **tx)
    .await
    .map_err(map_sqlx)?
    .ok_or_else(|| RepositoryError::not_found("hairdresser", id))?;
    decode("hairdresser", row.document)
}

async fn lock_salon(tx: &mut Tx<'_>, id: SalonId) -> Result<Salon, RepositoryError> {
    let row = sqlx::query_as::<_, DocumentRow>("SELECT document FROM salons WHERE id = $1 FOR UPDATE")
        .bind(id.0)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| RepositoryError::not_found("salon", id))?;
    decode("salon", row.document)
}

async fn save_booking(tx: &mut Tx<'_>, booking: &Booking) -> Result<(), RepositoryError> {
    let offered: Vec<Uuid> = booking.offered_to.iter().map(|h| h.0).collect();
    sqlx::query(
        "UPDATE bookings SET hairdresser_id = $2, offered_to = $3, status = $4, document = $5
         WHERE id = $1",
    )
    .bind(booking.id.0)
    .bind(booking.hairdresser_id.map(|h| h.0))
    .bind(&offered)
    .bind(booking.status.as_str())
    .bind(encode("booking", booking)?)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

async fn save_hairdresser(tx: &mut Tx<'_>, hairdresser: &Hairdresser) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE hairdressers SET is_available = $2, current_job_id = $3, document = $4
         WHERE id = $1",
    )
    .bind(hairdresser.id.0)
    .bind(hairdresser.is_available)
    .bind(hairdresser.current_job_id.map(|b| b.0))
    .bind(encode("hairdresser", hairdresser)?)
    .execute(&mut **tx)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

async fn save_salon(tx: &mut Tx<'_>, salon: &Salon) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE salons SET validated = $2, document = $3, updated_at = $4 WHERE id = $1")
        .bind(salon.id.0)
        .bind(salon.validated)
        .bind(encode("salon", salon)?)
        .bind(utc(salon.updated_at))
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx)?;
    Ok(())
}

// -- Booking list queries -----------------------------------------------------

fn push_filters(qb: &mut QueryBuilder<'static, Postgres>, query: &BookingQuery) {
    qb.push(" WHERE TRUE");
    match query.actor.role {
        ActorRole::Client => {
            qb.push(" AND client_id = ").push_bind(query.actor.id);
        }
        ActorRole::Hairdresser => {
            qb.push(" AND (hairdresser_id = ")
                .push_bind(query.actor.id)
                .push(" OR ")
                .push_bind(query.actor.id)
                .push(" = ANY(offered_to))");
        }
        ActorRole::Admin | ActorRole::System => {}
    }
    if let Some(status) = query.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
}

fn list_query(query: &BookingQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT document FROM bookings");
    push_filters(&mut qb, query);
    qb.push(match query.order {
        SortOrder::Asc => " ORDER BY scheduled_time ASC, id ASC",
        SortOrder::Desc => " ORDER BY scheduled_time DESC, id ASC",
    });
    qb.push(" LIMIT ").push_bind(clamp_i64(query.limit));
    qb.push(" OFFSET ").push_bind(clamp_i64(query.offset));
    qb
}

fn count_query(query: &BookingQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM bookings");
    push_filters(&mut qb, query);
    qb
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn create(&self, booking: Booking) -> Result<Booking, RepositoryError> {
        let offered: Vec<Uuid> = booking.offered_to.iter().map(|h| h.0).collect();
        sqlx::query(
            "INSERT INTO bookings (id, client_id, hairdresser_id, salon_id, offered_to, status,
                                   scheduled_time, document, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(booking.id.0)
        .bind(booking.client.client_id().map(|c| c.0))
        .bind(booking.hairdresser_id.map(|h| h.0))
        .bind(booking.salon_id.map(|s| s.0))
        .bind(&offered)
        .bind(booking.status.as_str())
        .bind(utc(booking.scheduled_time))
        .bind(encode("booking", &booking)?)
        .bind(utc(booking.created_at))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(booking)
    }

    async fn get_by_id(&self, id: BookingId) -> Result<Booking, RepositoryError> {
        let row = sqlx::query_as::<_, DocumentRow>("SELECT document FROM bookings WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .ok_or_else(|| RepositoryError::not_found("booking", id))?;
        decode("booking", row.document)
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<Booking, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let mut booking = lock_booking(&mut tx, update.booking_id).await?;
        if booking.status != update.from {
            return Err(RepositoryError::Conflict(format!(
                "expected status {}, found {}",
                update.from, booking.status
            )));
        }
        if let Some(reason) = update.stale_against(&booking) {
            return Err(RepositoryError::Conflict(reason));
        }
        if let Some(change) = update.job_slot {
            let mut hairdresser = lock_hairdresser(&mut tx, change.hairdresser_id()).await?;
            apply_job_slot(&mut hairdresser, change, booking.id)?;
            save_hairdresser(&mut tx, &hairdresser).await?;
        }
        update.apply(&mut booking);
        save_booking(&mut tx, &booking).await?;

        tx.commit().await.map_err(map_sqlx)?;
        Ok(booking)
    }

    async fn list_by_actor(&self, query: &BookingQuery) -> Result<Page<Booking>, RepositoryError> {
        let total: i64 = count_query(query)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
        let rows: Vec<DocumentRow> = list_query(query)
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        let items = rows
            .into_iter()
            .map(|r| decode("booking", r.document))
            .collect::<Result<Vec<Booking>, _>>()?;
        Ok(Page {
            items,
            total: usize::try_from(total).unwrap_or(0),
            offset: query.offset,
            limit: query.limit,
        })
    }

    async fn list_expiring(
        &self,
        cutoff: Timestamp,
        limit: usize,
    ) -> Result<Vec<Booking>, RepositoryError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT document FROM bookings
             WHERE status IN ($1, $2) AND scheduled_time < $3
             ORDER BY scheduled_time ASC, id ASC
             LIMIT $4",
        )
        .bind(BookingStatus::Pending.as_str())
        .bind(BookingStatus::Confirmed.as_str())
        .bind(utc(cutoff))
        .bind(clamp_i64(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.into_iter()
            .map(|r| decode("booking", r.document))
            .collect()
    }

    async fn record_rating(&self, id: BookingId, stars: u8) -> Result<Booking, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let mut booking = lock_booking(&mut tx, id).await?;
        if booking.status != BookingStatus::Completed {
            return Err(RepositoryError::Conflict(format!(
                "booking is {}, not completed",
                booking.status
            )));
        }
        if booking.rating.is_some() {
            return Err(RepositoryError::Conflict("booking already rated".into()));
        }
        if let Some(hid) = booking.hairdresser_id {
            let mut hairdresser = lock_hairdresser(&mut tx, hid).await?;
            hairdresser.record_rating(stars);
            save_hairdresser(&mut tx, &hairdresser).await?;
        }
        booking.rating = Some(stars);
        save_booking(&mut tx, &booking).await?;

        tx.commit().await.map_err(map_sqlx)?;
        Ok(booking)
    }

    async fn list_validated_salons(&self) -> Result<Vec<SalonListing>, RepositoryError> {
        let rows = sqlx::query_as::<_, SalonListingRow>(
            "SELECT s.document AS salon, h.document AS owner
             FROM salons s JOIN hairdressers h ON h.id = s.owner_id
             WHERE s.validated",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.into_iter()
            .map(|row| {
                let salon: Salon = decode("salon", row.salon)?;
                let owner: Hairdresser = decode("hairdresser", row.owner)?;
                Ok(SalonListing {
                    salon,
                    owner_rating: owner.average_rating,
                    owner_base_price: owner.base_price,
                })
            })
            .collect()
    }

    async fn list_available_hairdressers(&self) -> Result<Vec<Hairdresser>, RepositoryError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT document FROM hairdressers WHERE is_available AND current_job_id IS NULL",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        let mut available = Vec::with_capacity(rows.len());
        for row in rows {
            let hairdresser: Hairdresser = decode("hairdresser", row.document)?;
            if hairdresser.can_take_home_booking() {
                available.push(hairdresser);
            }
        }
        Ok(available)
    }

    async fn insert_hairdresser(
        &self,
        hairdresser: Hairdresser,
    ) -> Result<Hairdresser, RepositoryError> {
        sqlx::query(
            "INSERT INTO hairdressers (id, user_id, is_available, current_job_id, document, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(hairdresser.id.0)
        .bind(hairdresser.user_id.0)
        .bind(hairdresser.is_available)
        .bind(hairdresser.current_job_id.map(|b| b.0))
        .bind(encode("hairdresser", &hairdresser)?)
        .bind(utc(hairdresser.created_at))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(hairdresser)
    }

    async fn get_hairdresser(&self, id: HairdresserId) -> Result<Hairdresser, RepositoryError> {
        let row = sqlx::query_as::<_, DocumentRow>("SELECT document FROM hairdressers WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .ok_or_else(|| RepositoryError::not_found("hairdresser", id))?;
        decode("hairdresser", row.document)
    }

    async fn update_hairdresser(
        &self,
        id: HairdresserId,
        patch: &HairdresserPatch,
    ) -> Result<Hairdresser, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        let mut hairdresser = lock_hairdresser(&mut tx, id).await?;
        patch.apply(&mut hairdresser);
        save_hairdresser(&mut tx, &hairdresser).await?;
        tx.commit().await.map_err(map_sqlx)?;
        Ok(hairdresser)
    }

    async fn insert_salon(&self, salon: Salon) -> Result<Salon, RepositoryError> {
        sqlx::query(
            "INSERT INTO salons (id, owner_id, validated, document, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(salon.id.0)
        .bind(salon.owner.0)
        .bind(salon.validated)
        .bind(encode("salon", &salon)?)
        .bind(utc(salon.created_at))
        .bind(utc(salon.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match map_sqlx(e) {
            RepositoryError::Conflict(_) => {
                RepositoryError::Conflict(format!("{} already owns a salon", salon.owner))
            }
            other => other,
        })?;
        Ok(salon)
    }

    async fn get_salon(&self, id: SalonId) -> Result<Salon, RepositoryError> {
        let row = sqlx::query_as::<_, DocumentRow>("SELECT document FROM salons WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .ok_or_else(|| RepositoryError::not_found("salon", id))?;
        decode("salon", row.document)
    }

    async fn update_salon(&self, id: SalonId, patch: &SalonPatch) -> Result<Salon, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        let mut salon = lock_salon(&mut tx, id).await?;
        patch.apply(&mut salon);
        save_salon(&mut tx, &salon).await?;
        tx.commit().await.map_err(map_sqlx)?;
        Ok(salon)
    }
}
