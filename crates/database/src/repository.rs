use crate::error::DbError;
use crate::store::{KpiStore, UpdateAck};
use async_trait::async_trait;
use core_types::{
    Competency, CoreError, IndicatorKey, IndicatorValue, Organization, RawMetricsRecord, ResultRecord,
    Variation,
};
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use std::collections::BTreeMap;

type IndicatorDocument = BTreeMap<IndicatorKey, IndicatorValue>;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn months(&self, table: Table, organization_id: i64, year: i32) -> Result<Vec<u32>, DbError> {
        let query = format!(
            "SELECT month FROM {} WHERE organization_id = $1 AND year = $2 ORDER BY month ASC",
            table.name()
        );
        let rows = sqlx::query(&query)
            .bind(organization_id)
            .bind(year)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<u32, DbError> {
                month_from_column(row.try_get("month")?)
            })
            .collect()
    }
}

/// The two competency-keyed tables.
#[derive(Debug, Clone, Copy)]
enum Table {
    RawMetrics,
    KpiResults,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::RawMetrics => "raw_metrics",
            Table::KpiResults => "kpi_results",
        }
    }
}

/// Months are stored as INTEGER; the CHECK constraint keeps them in 1..=12.
fn month_column(competency: &Competency) -> i32 {
    competency.month as i32
}

fn competency_from_row(row: &PgRow) -> Result<Competency, DbError> {
    let organization_id: i64 = row.try_get("organization_id")?;
    let year: i32 = row.try_get("year")?;
    let month = month_from_column(row.try_get("month")?)?;
    Ok(Competency::new(organization_id, year, month)?)
}

fn month_from_column(month: i32) -> Result<u32, DbError> {
    match u32::try_from(month) {
        Ok(month) if (1..=12).contains(&month) => Ok(month),
        _ => Err(DbError::InvalidRow(CoreError::InvalidInput(
            "month".to_string(),
            format!("stored month {month} is outside 1..=12"),
        ))),
    }
}

#[async_trait]
impl KpiStore for DbRepository {
    async fn fetch_metrics(
        &self,
        competency: Competency,
    ) -> Result<Option<RawMetricsRecord>, DbError> {
        let row = sqlx::query(
            "SELECT counters FROM raw_metrics WHERE organization_id = $1 AND year = $2 AND month = $3",
        )
        .bind(competency.organization_id)
        .bind(competency.year)
        .bind(month_column(&competency))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let counters: JsonValue = row.try_get("counters")?;
                Ok(Some(RawMetricsRecord::from_value(counters)?))
            }
            None => Ok(None),
        }
    }

    /// Uses `ON CONFLICT DO UPDATE` so a corrected upload replaces the previous row.
    async fn save_metrics(
        &self,
        competency: Competency,
        raw: &RawMetricsRecord,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO raw_metrics (organization_id, year, month, counters)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (organization_id, year, month)
            DO UPDATE SET counters = EXCLUDED.counters, submitted_at = now()
            "#,
        )
        .bind(competency.organization_id)
        .bind(competency.year)
        .bind(month_column(&competency))
        .bind(Json(raw))
        .execute(&self.pool)
        .await?;

        tracing::debug!(%competency, counters = raw.len(), "Raw metrics saved.");
        Ok(())
    }

    async fn fetch_result(&self, competency: Competency) -> Result<Option<ResultRecord>, DbError> {
        let row = sqlx::query(
            "SELECT indicators FROM kpi_results WHERE organization_id = $1 AND year = $2 AND month = $3",
        )
        .bind(competency.organization_id)
        .bind(competency.year)
        .bind(month_column(&competency))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let Json(indicators): Json<IndicatorDocument> = row.try_get("indicators")?;
                Ok(Some(ResultRecord::new(competency, indicators)))
            }
            None => Ok(None),
        }
    }

    /// Uses `ON CONFLICT DO NOTHING`: a second write for the same competency is
    /// reported as unacknowledged instead of replacing the stored document.
    async fn save_result(&self, record: &ResultRecord) -> Result<bool, DbError> {
        let competency = record.competency();
        let result = sqlx::query(
            r#"
            INSERT INTO kpi_results (organization_id, year, month, indicators)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (organization_id, year, month) DO NOTHING
            "#,
        )
        .bind(competency.organization_id)
        .bind(competency.year)
        .bind(month_column(&competency))
        .bind(Json(&record.indicators))
        .execute(&self.pool)
        .await?;

        let acknowledged = result.rows_affected() == 1;
        tracing::debug!(%competency, acknowledged, "Result document saved.");
        Ok(acknowledged)
    }

    /// Rewrites exactly one `variation` member through `jsonb_set`, leaving
    /// every value and stratification in the document untouched.
    async fn update_variation(
        &self,
        competency: Competency,
        key: IndicatorKey,
        variation: Variation,
    ) -> Result<UpdateAck, DbError> {
        let row = sqlx::query(
            r#"
            WITH target AS (
                SELECT organization_id, year, month,
                       indicators -> $4 -> 'variation' AS current_variation
                FROM kpi_results
                WHERE organization_id = $1 AND year = $2 AND month = $3
                  AND jsonb_exists(indicators, $4)
                FOR UPDATE
            ),
            updated AS (
                UPDATE kpi_results AS r
                SET indicators = jsonb_set(r.indicators, ARRAY[$4::text, 'variation'], $5::jsonb)
                FROM target AS t
                WHERE r.organization_id = t.organization_id
                  AND r.year = t.year
                  AND r.month = t.month
                  AND t.current_variation IS DISTINCT FROM $5::jsonb
                RETURNING 1
            )
            SELECT (SELECT COUNT(*) FROM target) AS matched,
                   (SELECT COUNT(*) FROM updated) AS modified
            "#,
        )
        .bind(competency.organization_id)
        .bind(competency.year)
        .bind(month_column(&competency))
        .bind(key.as_str())
        .bind(Json(variation))
        .fetch_one(&self.pool)
        .await?;

        let matched: i64 = row.try_get("matched")?;
        let modified: i64 = row.try_get("modified")?;
        Ok(UpdateAck::new(matched > 0, modified > 0))
    }

    async fn last_consolidation(&self, organization_id: i64) -> Result<Option<Competency>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT organization_id, year, month
            FROM kpi_results
            WHERE organization_id = $1
            ORDER BY year DESC, month DESC
            LIMIT 1
            "#,
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(competency_from_row).transpose()
    }

    async fn submitted_months(&self, organization_id: i64, year: i32) -> Result<Vec<u32>, DbError> {
        self.months(Table::RawMetrics, organization_id, year).await
    }

    async fn consolidated_months(
        &self,
        organization_id: i64,
        year: i32,
    ) -> Result<Vec<u32>, DbError> {
        self.months(Table::KpiResults, organization_id, year).await
    }

    async fn upsert_organization(&self, organization: &Organization) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO organizations (organization_id, name, active)
            VALUES ($1, $2, $3)
            ON CONFLICT (organization_id) DO UPDATE SET name = EXCLUDED.name, active = EXCLUDED.active
            "#,
        )
        .bind(organization.organization_id)
        .bind(&organization.name)
        .bind(organization.active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn active_organizations(&self) -> Result<Vec<Organization>, DbError> {
        let rows = sqlx::query(
            "SELECT organization_id, name, active FROM organizations WHERE active ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let organizations = rows
            .iter()
            .map(|row| -> Result<Organization, sqlx::Error> {
                Ok(Organization {
                    organization_id: row.try_get("organization_id")?,
                    name: row.try_get("name")?,
                    active: row.try_get("active")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(organizations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_month_outside_calendar_is_an_invalid_row() {
        assert_eq!(month_from_column(1).unwrap(), 1);
        assert_eq!(month_from_column(12).unwrap(), 12);
        for month in [-1, 0, 13] {
            assert!(matches!(
                month_from_column(month),
                Err(DbError::InvalidRow(CoreError::InvalidInput(field, _))) if field == "month"
            ));
        }
    }
}
