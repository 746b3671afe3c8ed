use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{FlowIntensity, PeriodRecord, SettingsRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("record not found")]
    NotFound,
    #[error("end date precedes the period start")]
    InvalidEndDate,
}

pub type DynStore = Arc<dyn CycleStore>;

/// Everything the handlers need from persistence. The predictor itself
/// never touches this; it only sees the records the handlers fetch.
#[async_trait]
pub trait CycleStore: Send + Sync {
    /// Periods sorted descending by start date, flow logs attached.
    async fn list_periods(&self, user_id: Uuid) -> Result<Vec<PeriodRecord>, StoreError>;

    /// Per-user settings, created lazily with defaults on first read.
    async fn get_settings(&self, user_id: Uuid) -> Result<SettingsRecord, StoreError>;

    async fn update_settings(
        &self,
        user_id: Uuid,
        settings: SettingsRecord,
    ) -> Result<(), StoreError>;

    async fn create_period(
        &self,
        user_id: Uuid,
        start_date: NaiveDate,
    ) -> Result<Uuid, StoreError>;

    /// Set the end date on the latest open period.
    async fn close_period(&self, user_id: Uuid, end_date: NaiveDate) -> Result<(), StoreError>;

    async fn delete_period(&self, user_id: Uuid, period_id: Uuid) -> Result<(), StoreError>;

    async fn log_flow(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        intensity: FlowIntensity,
    ) -> Result<(), StoreError>;
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CycleStore for PgStore {
    async fn list_periods(&self, user_id: Uuid) -> Result<Vec<PeriodRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, start_date, end_date FROM periods
             WHERE user_id = $1 ORDER BY start_date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut periods = Vec::with_capacity(rows.len());
        for row in rows {
            periods.push(PeriodRecord {
                id: row.try_get("id")?,
                start_date: row.try_get("start_date")?,
                end_date: row.try_get("end_date")?,
                flow_by_date: Default::default(),
            });
        }

        let flow_rows = sqlx::query(
            "SELECT logged_at, intensity FROM flow_logs
             WHERE user_id = $1 ORDER BY logged_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut flows = Vec::with_capacity(flow_rows.len());
        for row in flow_rows {
            let logged_at: NaiveDate = row.try_get("logged_at")?;
            let raw: String = row.try_get("intensity")?;
            match FlowIntensity::parse(&raw) {
                Some(intensity) => flows.push((logged_at, intensity)),
                None => tracing::warn!("⚠️ Unknown flow intensity {:?} on {}", raw, logged_at),
            }
        }

        attach_flow(&mut periods, flows);
        Ok(periods)
    }

    async fn get_settings(&self, user_id: Uuid) -> Result<SettingsRecord, StoreError> {
        let row = sqlx::query(
            "SELECT default_cycle_length, default_period_length
             FROM cycle_settings WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(SettingsRecord {
                default_cycle_length: row.try_get("default_cycle_length")?,
                default_period_length: row.try_get("default_period_length")?,
            });
        }

        let defaults = SettingsRecord::default();
        sqlx::query(
            "INSERT INTO cycle_settings (user_id, default_cycle_length, default_period_length)
             VALUES ($1, $2, $3) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(defaults.default_cycle_length)
        .bind(defaults.default_period_length)
        .execute(&self.pool)
        .await?;

        Ok(defaults)
    }

    async fn update_settings(
        &self,
        user_id: Uuid,
        settings: SettingsRecord,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO cycle_settings (user_id, default_cycle_length, default_period_length)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id) DO UPDATE SET
                 default_cycle_length = EXCLUDED.default_cycle_length,
                 default_period_length = EXCLUDED.default_period_length",
        )
        .bind(user_id)
        .bind(settings.default_cycle_length)
        .bind(settings.default_period_length)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_period(
        &self,
        user_id: Uuid,
        start_date: NaiveDate,
    ) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO periods (id, user_id, start_date) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(user_id)
            .bind(start_date)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn close_period(&self, user_id: Uuid, end_date: NaiveDate) -> Result<(), StoreError> {
        let row = sqlx::query(
            "SELECT id, start_date FROM periods
             WHERE user_id = $1 AND end_date IS NULL
             ORDER BY start_date DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        let start_date: NaiveDate = row.try_get("start_date")?;
        if end_date < start_date {
            return Err(StoreError::InvalidEndDate);
        }

        let id: Uuid = row.try_get("id")?;
        sqlx::query("UPDATE periods SET end_date = $1 WHERE id = $2")
            .bind(end_date)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_period(&self, user_id: Uuid, period_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM periods WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(period_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn log_flow(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        intensity: FlowIntensity,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO flow_logs (user_id, logged_at, intensity) VALUES ($1, $2, $3)
             ON CONFLICT (user_id, logged_at) DO UPDATE SET intensity = EXCLUDED.intensity",
        )
        .bind(user_id)
        .bind(date)
        .bind(intensity.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Attach each flow log to the period that covers its date. An open period
/// covers at most ten days from its start; logs outside any period are
/// left out of the assembled records.
pub(crate) fn attach_flow(periods: &mut [PeriodRecord], flows: Vec<(NaiveDate, FlowIntensity)>) {
    for (date, intensity) in flows {
        if let Some(period) = periods.iter_mut().find(|p| covers(p, date)) {
            period.flow_by_date.insert(date, intensity);
        }
    }
}

fn covers(period: &PeriodRecord, date: NaiveDate) -> bool {
    let end = period
        .end_date
        .unwrap_or(period.start_date + Duration::days(9));
    date >= period.start_date && date <= end
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn period(start: &str, end: Option<&str>) -> PeriodRecord {
        PeriodRecord {
            id: Uuid::new_v4(),
            start_date: date(start),
            end_date: end.map(date),
            flow_by_date: Default::default(),
        }
    }

    #[test]
    fn flow_attaches_to_covering_period() {
        let mut periods = vec![period("2026-03-01", Some("2026-03-05")), period("2026-02-01", None)];
        attach_flow(
            &mut periods,
            vec![
                (date("2026-03-02"), FlowIntensity::Heavy),
                (date("2026-02-03"), FlowIntensity::Light),
                // Outside both periods: Mar 5 ended the first, Feb 10 caps the open one.
                (date("2026-03-20"), FlowIntensity::Spotting),
            ],
        );
        assert_eq!(
            periods[0].flow_by_date.get(&date("2026-03-02")),
            Some(&FlowIntensity::Heavy)
        );
        assert_eq!(
            periods[1].flow_by_date.get(&date("2026-02-03")),
            Some(&FlowIntensity::Light)
        );
        assert_eq!(periods[0].flow_by_date.len(), 1);
        assert_eq!(periods[1].flow_by_date.len(), 1);
    }

    #[test]
    fn open_period_covers_ten_days_at_most() {
        let mut periods = vec![period("2026-03-01", None)];
        attach_flow(
            &mut periods,
            vec![
                (date("2026-03-10"), FlowIntensity::Spotting),
                (date("2026-03-11"), FlowIntensity::Spotting),
            ],
        );
        assert!(periods[0].flow_by_date.contains_key(&date("2026-03-10")));
        assert!(!periods[0].flow_by_date.contains_key(&date("2026-03-11")));
    }

    #[derive(Default)]
    struct MemoryStore {
        inner: Mutex<MemoryState>,
    }

    #[derive(Default)]
    struct MemoryState {
        periods: HashMap<Uuid, Vec<PeriodRecord>>,
        settings: HashMap<Uuid, SettingsRecord>,
        flows: HashMap<Uuid, Vec<(NaiveDate, FlowIntensity)>>,
    }

    #[async_trait]
    impl CycleStore for MemoryStore {
        async fn list_periods(&self, user_id: Uuid) -> Result<Vec<PeriodRecord>, StoreError> {
            let state = self.inner.lock().unwrap();
            let mut periods = state.periods.get(&user_id).cloned().unwrap_or_default();
            periods.sort_by(|a, b| b.start_date.cmp(&a.start_date));
            let flows = state.flows.get(&user_id).cloned().unwrap_or_default();
            attach_flow(&mut periods, flows);
            Ok(periods)
        }

        async fn get_settings(&self, user_id: Uuid) -> Result<SettingsRecord, StoreError> {
            let mut state = self.inner.lock().unwrap();
            Ok(state.settings.entry(user_id).or_default().clone())
        }

        async fn update_settings(
            &self,
            user_id: Uuid,
            settings: SettingsRecord,
        ) -> Result<(), StoreError> {
            self.inner.lock().unwrap().settings.insert(user_id, settings);
            Ok(())
        }

        async fn create_period(
            &self,
            user_id: Uuid,
            start_date: NaiveDate,
        ) -> Result<Uuid, StoreError> {
            let id = Uuid::new_v4();
            self.inner
                .lock()
                .unwrap()
                .periods
                .entry(user_id)
                .or_default()
                .push(PeriodRecord {
                    id,
                    start_date,
                    end_date: None,
                    flow_by_date: Default::default(),
                });
            Ok(id)
        }

        async fn close_period(
            &self,
            user_id: Uuid,
            end_date: NaiveDate,
        ) -> Result<(), StoreError> {
            let mut state = self.inner.lock().unwrap();
            let periods = state.periods.entry(user_id).or_default();
            periods.sort_by(|a, b| b.start_date.cmp(&a.start_date));
            let open = periods
                .iter_mut()
                .find(|p| p.end_date.is_none())
                .ok_or(StoreError::NotFound)?;
            if end_date < open.start_date {
                return Err(StoreError::InvalidEndDate);
            }
            open.end_date = Some(end_date);
            Ok(())
        }

        async fn delete_period(&self, user_id: Uuid, period_id: Uuid) -> Result<(), StoreError> {
            let mut state = self.inner.lock().unwrap();
            let periods = state.periods.entry(user_id).or_default();
            let before = periods.len();
            periods.retain(|p| p.id != period_id);
            if periods.len() == before {
                return Err(StoreError::NotFound);
            }
            Ok(())
        }

        async fn log_flow(
            &self,
            user_id: Uuid,
            date: NaiveDate,
            intensity: FlowIntensity,
        ) -> Result<(), StoreError> {
            let mut state = self.inner.lock().unwrap();
            let flows = state.flows.entry(user_id).or_default();
            flows.retain(|(d, _)| *d != date);
            flows.push((date, intensity));
            Ok(())
        }
    }

    #[tokio::test]
    async fn settings_default_lazily() {
        let store = MemoryStore::default();
        let user = Uuid::new_v4();
        let settings = store.get_settings(user).await.unwrap();
        assert_eq!(settings.default_cycle_length, 28);
        assert_eq!(settings.default_period_length, 5);
    }

    #[tokio::test]
    async fn period_lifecycle_through_the_trait() {
        let store = MemoryStore::default();
        let user = Uuid::new_v4();

        assert!(matches!(
            store.close_period(user, date("2026-03-05")).await,
            Err(StoreError::NotFound)
        ));

        let id = store.create_period(user, date("2026-03-01")).await.unwrap();
        store.log_flow(user, date("2026-03-02"), FlowIntensity::Medium).await.unwrap();

        assert!(matches!(
            store.close_period(user, date("2026-02-28")).await,
            Err(StoreError::InvalidEndDate)
        ));
        store.close_period(user, date("2026-03-05")).await.unwrap();

        let periods = store.list_periods(user).await.unwrap();
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].end_date, Some(date("2026-03-05")));
        assert_eq!(
            periods[0].flow_by_date.get(&date("2026-03-02")),
            Some(&FlowIntensity::Medium)
        );

        store.delete_period(user, id).await.unwrap();
        assert!(store.list_periods(user).await.unwrap().is_empty());
    }
}
