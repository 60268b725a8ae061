//! SQLite-backed telemetry sink, via `sqlx`'s connection pool so
//! concurrent writers from independent requests are handled without
//! extra locking in the Orchestrator.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use super::{TelemetryError, TelemetryEvent, TelemetrySink};

pub struct SqliteTelemetryCollector {
    pool: SqlitePool,
}

impl SqliteTelemetryCollector {
    /// Connects to `db_url` (e.g. `sqlite://telemetry.db` or
    /// `sqlite::memory:` for tests), creating the database file on first
    /// run, and ensures the `telemetry` table exists.
    ///
    /// The pool is kept to a single connection: SQLite serializes writers
    /// regardless, and a pool of independent connections would each see
    /// their own private database for `sqlite::memory:` URLs, leaving the
    /// `telemetry` table invisible to every connection but the one that
    /// created it.
    pub async fn connect(db_url: &str) -> Result<Self, TelemetryError> {
        let options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS telemetry (
                timestamp TEXT NOT NULL,
                request_id TEXT NOT NULL,
                strategy TEXT NOT NULL,
                provider TEXT,
                model TEXT,
                usage_input INTEGER,
                usage_output INTEGER,
                cost_estimated REAL,
                latency_ms REAL,
                guardrail_reason TEXT,
                guardrail_failed INTEGER NOT NULL,
                fallback_used INTEGER NOT NULL,
                provider_failed INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl TelemetrySink for SqliteTelemetryCollector {
    async fn capture(&self, event: TelemetryEvent) -> Result<(), TelemetryError> {
        sqlx::query(
            r#"
            INSERT INTO telemetry
                (timestamp, request_id, strategy, provider, model, usage_input,
                 usage_output, cost_estimated, latency_ms, guardrail_reason,
                 guardrail_failed, fallback_used, provider_failed)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.timestamp.to_rfc3339())
        .bind(&event.request_id)
        .bind(&event.strategy)
        .bind(&event.provider)
        .bind(&event.model)
        .bind(event.usage_input)
        .bind(event.usage_output)
        .bind(event.cost_estimated)
        .bind(event.latency_ms)
        .bind(&event.guardrail_reason)
        .bind(event.guardrail_failed)
        .bind(event.fallback_used)
        .bind(event.provider_failed)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query_all(&self) -> Result<Vec<TelemetryEvent>, TelemetryError> {
        let rows = sqlx::query(
            r#"
            SELECT timestamp, request_id, strategy, provider, model, usage_input,
                   usage_output, cost_estimated, latency_ms, guardrail_reason,
                   guardrail_failed, fallback_used, provider_failed
            FROM telemetry
            ORDER BY rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let events = rows
            .into_iter()
            .map(|row| {
                let timestamp: String = row.get("timestamp");
                TelemetryEvent {
                    timestamp: DateTime::parse_from_rfc3339(&timestamp)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|_| Utc::now()),
                    request_id: row.get("request_id"),
                    strategy: row.get("strategy"),
                    provider: row.get("provider"),
                    model: row.get("model"),
                    usage_input: row.get("usage_input"),
                    usage_output: row.get("usage_output"),
                    cost_estimated: row.get("cost_estimated"),
                    latency_ms: row.get("latency_ms"),
                    guardrail_reason: row.get("guardrail_reason"),
                    guardrail_failed: row.get("guardrail_failed"),
                    fallback_used: row.get("fallback_used"),
                    provider_failed: row.get("provider_failed"),
                }
            })
            .collect();

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn capture_then_query_all_round_trips() {
        let sink = SqliteTelemetryCollector::connect("sqlite::memory:")
            .await
            .unwrap();

        sink.capture(TelemetryEvent::guardrail_violation("req-1", "Forbidden keyword found: SSN"))
            .await
            .unwrap();
        sink.capture(TelemetryEvent::success(
            "req-2", "cost-first", "openai", "GPT-4o-mini", 10, 5, 0.001, 12.5, false,
        ))
        .await
        .unwrap();

        let events = sink.query_all().await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].guardrail_failed);
        assert_eq!(events[1].provider.as_deref(), Some("openai"));
    }

    #[tokio::test]
    async fn nullable_numeric_columns_are_null_not_zero() {
        let sink = SqliteTelemetryCollector::connect("sqlite::memory:")
            .await
            .unwrap();
        sink.capture(TelemetryEvent::provider_failure("req-3", "cost-first", "openai"))
            .await
            .unwrap();

        let events = sink.query_all().await.unwrap();
        assert!(events[0].usage_input.is_none());
        assert!(events[0].cost_estimated.is_none());
        assert!(events[0].latency_ms.is_none());
    }

    #[tokio::test]
    async fn concurrent_writers_all_land() {
        let sink = std::sync::Arc::new(
            SqliteTelemetryCollector::connect("sqlite::memory:")
                .await
                .unwrap(),
        );

        let mut handles = Vec::new();
        for i in 0..20 {
            let sink = sink.clone();
            handles.push(tokio::spawn(async move {
                sink.capture(TelemetryEvent::provider_failure(
                    format!("req-{i}"),
                    "cost-first",
                    "openai",
                ))
                .await
                .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let events = sink.query_all().await.unwrap();
        assert_eq!(events.len(), 20);
    }
}
