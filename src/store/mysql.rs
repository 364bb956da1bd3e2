use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use uuid::Uuid;

use crate::model::punch::{NewPunch, PunchEvent, PunchRow};
use crate::store::{PunchStore, StoreError, StoreResult};

pub struct MySqlPunchStore {
    pool: MySqlPool,
}

impl MySqlPunchStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn decode_rows(rows: Vec<PunchRow>) -> StoreResult<Vec<PunchEvent>> {
    rows.into_iter()
        .map(|row| {
            let id = row.id.clone();
            PunchEvent::try_from(row).map_err(|e| StoreError::Decode {
                id,
                reason: e.to_string(),
            })
        })
        .collect()
}

#[async_trait]
impl PunchStore for MySqlPunchStore {
    async fn fetch_events(
        &self,
        user_id: u64,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<PunchEvent>> {
        let rows = sqlx::query_as::<_, PunchRow>(
            r#"
            SELECT id, user_id, kind, timestamp, latitude, longitude,
                   address_name, address_street, address_city
            FROM attendance_punches
            WHERE user_id = ?
            AND (? IS NULL OR timestamp >= ?)
            AND (? IS NULL OR timestamp < ?)
            ORDER BY timestamp DESC
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(from)
        .bind(to)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        decode_rows(rows)
    }

    async fn fetch_latest(&self, user_id: u64, limit: usize) -> StoreResult<Vec<PunchEvent>> {
        let rows = sqlx::query_as::<_, PunchRow>(
            r#"
            SELECT id, user_id, kind, timestamp, latitude, longitude,
                   address_name, address_street, address_city
            FROM attendance_punches
            WHERE user_id = ?
            ORDER BY timestamp DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit as u64)
        .fetch_all(&self.pool)
        .await?;

        decode_rows(rows)
    }

    async fn company_of(&self, user_id: u64) -> StoreResult<Option<String>> {
        let company = sqlx::query_scalar::<_, String>("SELECT company_code FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(company)
    }

    async fn append_event(&self, punch: NewPunch) -> StoreResult<PunchEvent> {
        let id = Uuid::new_v4().to_string();
        let address = punch.location.address.clone().unwrap_or_default();

        sqlx::query(
            r#"
            INSERT INTO attendance_punches
                (id, user_id, kind, timestamp, latitude, longitude,
                 address_name, address_street, address_city)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(punch.user_id)
        .bind(punch.kind.as_ref())
        .bind(punch.timestamp)
        .bind(punch.location.coords.latitude)
        .bind(punch.location.coords.longitude)
        .bind(address.name)
        .bind(address.street)
        .bind(address.city)
        .execute(&self.pool)
        .await?;

        tracing::debug!(punch_id = %id, user_id = punch.user_id, kind = %punch.kind, "Punch stored");

        Ok(PunchEvent {
            id,
            kind: punch.kind,
            timestamp: punch.timestamp,
            location: punch.location,
            user_id: punch.user_id,
        })
    }
}
