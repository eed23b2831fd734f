//! Trigger scheduling.
//!
//! The scheduler drives the poll → compute → emit cycle. Triggers run
//! strictly one at a time: the batch is fully materialized before any
//! aggregation starts, and every query is computed and emitted before the
//! next trigger may begin. Queries are processed in registry order but are
//! independent; a failed sink write for one never blocks its siblings.

use log::{error, info, warn};
use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::{interval, sleep, MissedTickBehavior};

use super::config::AnalyticsConfig;
use crate::orderstream::datasource::traits::{BatchSource, SinkWriter};
use crate::orderstream::datasource::types::SourceError;
use crate::orderstream::engine::{emit_rows, AggregationEngine, Batch, QueryRegistry, QueryState};

/// Lifecycle of the trigger loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    Idle,
    Polling,
    Computing,
    Emitting,
    Stopped,
}

/// Outcome of one trigger cycle.
#[derive(Debug, Clone)]
pub struct TriggerStats {
    pub batch_id: u64,
    pub records: usize,
    pub parse_errors: u64,
    pub queries_emitted: usize,
    pub queries_failed: usize,
    pub elapsed: Duration,
}

/// Trigger-level failures. Only raised after poll retries are exhausted;
/// everything below that is logged and survived.
#[derive(Debug)]
pub enum SchedulerError {
    Source(SourceError),
    RetriesExhausted { attempts: u32, last: SourceError },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::Source(e) => write!(f, "source failure: {}", e),
            SchedulerError::RetriesExhausted { attempts, last } => {
                write!(f, "source still failing after {} retries: {}", attempts, last)
            }
        }
    }
}

impl Error for SchedulerError {}

/// Sequential micro-batch trigger loop over one source and one sink.
pub struct TriggerScheduler {
    registry: QueryRegistry,
    /// Per-query running state, parallel to registry declaration order
    states: Vec<QueryState>,
    state: TriggerState,
    triggers_fired: u64,
    trigger_interval: Duration,
    max_poll_retries: u32,
    retry_backoff: Duration,
}

impl TriggerScheduler {
    pub fn new(registry: QueryRegistry, config: &AnalyticsConfig) -> Self {
        let states = (0..registry.len()).map(|_| QueryState::new()).collect();
        Self {
            registry,
            states,
            state: TriggerState::Idle,
            triggers_fired: 0,
            trigger_interval: config.trigger_interval,
            max_poll_retries: config.max_poll_retries,
            retry_backoff: config.retry_backoff,
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    pub fn triggers_fired(&self) -> u64 {
        self.triggers_fired
    }

    /// Run one poll → compute → emit cycle.
    pub async fn run_trigger(
        &mut self,
        source: &mut dyn BatchSource,
        sink: &mut dyn SinkWriter,
    ) -> Result<TriggerStats, SchedulerError> {
        let started = Instant::now();

        self.state = TriggerState::Polling;
        let batch = self.poll_with_retry(source).await?;

        self.state = TriggerState::Computing;
        let mut changed_keys = Vec::with_capacity(self.states.len());
        for (i, query) in self.registry.iter().enumerate() {
            changed_keys.push(AggregationEngine::apply(query, &mut self.states[i], &batch));
        }

        self.state = TriggerState::Emitting;
        let mut queries_emitted = 0;
        let mut queries_failed = 0;
        for (i, query) in self.registry.iter().enumerate() {
            let rows = emit_rows(query, &self.states[i], &batch, &changed_keys[i]);
            match sink.write(query.name, query.output_mode, &rows).await {
                Ok(()) => queries_emitted += 1,
                Err(e) => {
                    error!("{}", e);
                    queries_failed += 1;
                }
            }
        }

        // Commit failure is not fatal: the files stay staged in-process and
        // are replayed after a restart (at-least-once).
        if let Err(e) = source.commit().await {
            error!("Failed to commit batch {}: {}", batch.id, e);
        }

        self.state = TriggerState::Idle;
        self.triggers_fired += 1;

        let stats = TriggerStats {
            batch_id: batch.id,
            records: batch.len(),
            parse_errors: batch.parse_errors,
            queries_emitted,
            queries_failed,
            elapsed: started.elapsed(),
        };
        info!(
            "Trigger {}: batch {} ({} records, {} parse errors), emitted {}/{} queries in {:?}",
            self.triggers_fired,
            stats.batch_id,
            stats.records,
            stats.parse_errors,
            stats.queries_emitted,
            self.registry.len(),
            stats.elapsed
        );

        Ok(stats)
    }

    /// Poll the source, retrying with exponential backoff before escalating.
    async fn poll_with_retry(
        &mut self,
        source: &mut dyn BatchSource,
    ) -> Result<Batch, SchedulerError> {
        let mut attempt: u32 = 0;
        loop {
            match source.next_batch().await {
                Ok(batch) => return Ok(batch),
                Err(e) => {
                    if attempt >= self.max_poll_retries {
                        self.state = TriggerState::Stopped;
                        return Err(SchedulerError::RetriesExhausted { attempts: attempt, last: e });
                    }
                    attempt += 1;
                    let backoff = self.retry_backoff * 2u32.saturating_pow(attempt - 1);
                    warn!(
                        "Poll failed ({}); retry {}/{} in {:?}",
                        e, attempt, self.max_poll_retries, backoff
                    );
                    sleep(backoff).await;
                }
            }
        }
    }

    /// Trigger loop: fire on a fixed interval until the stop signal is
    /// observed. The signal is only checked at the idle boundary, so an
    /// in-flight trigger always completes and no query emits partial state.
    pub async fn run(
        &mut self,
        source: &mut dyn BatchSource,
        sink: &mut dyn SinkWriter,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), SchedulerError> {
        let mut ticker = interval(self.trigger_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                self.state = TriggerState::Stopped;
                info!(
                    "Stop signal observed at idle; scheduler stopped after {} triggers",
                    self.triggers_fired
                );
                return Ok(());
            }

            tokio::select! {
                _ = ticker.tick() => {
                    self.run_trigger(source, sink).await?;
                }
                _ = shutdown.changed() => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderstream::datasource::file::{FileSource, FileSourceConfig};
    use crate::orderstream::datasource::mock::MockSink;
    use crate::orderstream::engine::{FieldValue, OutputMode};
    use crate::orderstream::schema::{Schema, SchemaVariant};
    use async_trait::async_trait;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str =
        "order_id,client_id,client_name,product,quantity,price,order_date,status,total";

    struct DownSource;

    #[async_trait]
    impl BatchSource for DownSource {
        async fn next_batch(&mut self) -> Result<Batch, SourceError> {
            Err(SourceError::Unavailable("directory vanished".to_string()))
        }

        async fn commit(&mut self) -> Result<(), SourceError> {
            Ok(())
        }
    }

    fn test_config(dir: &TempDir) -> AnalyticsConfig {
        AnalyticsConfig::for_variant(SchemaVariant::V1)
            .with_data_dir(dir.path())
            .with_offset_log(dir.path().join("orders.offsets"))
            .with_trigger_interval(Duration::from_millis(10))
            .with_max_poll_retries(1)
            .with_retry_backoff(Duration::from_millis(1))
    }

    fn write_orders(dir: &TempDir, name: &str, rows: &[&str]) {
        let mut content = String::from(HEADER);
        for row in rows {
            content.push('\n');
            content.push_str(row);
        }
        content.push('\n');
        fs::write(dir.path().join(name), content).unwrap();
    }

    fn file_source(dir: &TempDir) -> FileSource {
        let config = FileSourceConfig::new(dir.path(), dir.path().join("orders.offsets"));
        FileSource::new(config, Schema::for_variant(SchemaVariant::V1)).unwrap()
    }

    #[tokio::test]
    async fn test_trigger_emits_all_seven_queries() {
        let dir = TempDir::new().unwrap();
        write_orders(
            &dir,
            "orders_001.csv",
            &["1,C1,Alice,Pen,10,2.5,2024-01-01,NEW,25.0"],
        );

        let config = test_config(&dir);
        let mut source = file_source(&dir);
        let mut sink = MockSink::new();
        let mut scheduler =
            TriggerScheduler::new(QueryRegistry::for_variant(SchemaVariant::V1), &config);

        let stats = scheduler.run_trigger(&mut source, &mut sink).await.unwrap();
        assert_eq!(stats.records, 1);
        assert_eq!(stats.queries_emitted, 7);
        assert_eq!(stats.queries_failed, 0);
        assert_eq!(sink.writes.len(), 7);
        assert_eq!(scheduler.state(), TriggerState::Idle);
        assert_eq!(scheduler.triggers_fired(), 1);

        let totals = &sink.writes_for("total_sales")[0].rows;
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].get("total_sales"), Some(&FieldValue::Float(25.0)));
        assert_eq!(totals[0].get("total_orders"), Some(&FieldValue::Integer(1)));
        assert_eq!(
            totals[0].get("avg_order_value"),
            Some(&FieldValue::Float(25.0))
        );
    }

    #[tokio::test]
    async fn test_empty_trigger_still_emits_complete_state() {
        let dir = TempDir::new().unwrap();
        write_orders(
            &dir,
            "orders_001.csv",
            &["1,C1,Alice,Pen,10,2.5,2024-01-01,NEW,25.0"],
        );

        let config = test_config(&dir);
        let mut source = file_source(&dir);
        let mut sink = MockSink::new();
        let mut scheduler =
            TriggerScheduler::new(QueryRegistry::for_variant(SchemaVariant::V1), &config);

        scheduler.run_trigger(&mut source, &mut sink).await.unwrap();
        let stats = scheduler.run_trigger(&mut source, &mut sink).await.unwrap();
        assert_eq!(stats.records, 0);

        // Complete-mode state re-emitted unchanged; Append emits nothing new.
        let totals = sink.writes_for("total_sales");
        assert_eq!(totals[1].rows, totals[0].rows);
        let raw = sink.writes_for("raw_orders");
        assert_eq!(raw[1].rows.len(), 0);
    }

    #[tokio::test]
    async fn test_sink_failure_skips_query_but_not_siblings() {
        let dir = TempDir::new().unwrap();
        write_orders(
            &dir,
            "orders_001.csv",
            &["1,C1,Alice,Pen,10,2.5,2024-01-01,NEW,25.0"],
        );

        let config = test_config(&dir);
        let mut source = file_source(&dir);
        let mut sink = MockSink::new().fail_query("total_sales");
        let mut scheduler =
            TriggerScheduler::new(QueryRegistry::for_variant(SchemaVariant::V1), &config);

        let stats = scheduler.run_trigger(&mut source, &mut sink).await.unwrap();
        assert_eq!(stats.queries_emitted, 6);
        assert_eq!(stats.queries_failed, 1);
        assert!(sink.writes_for("total_sales").is_empty());
        assert_eq!(sink.writes_for("sales_by_product").len(), 1);

        // The failure does not leak into the next trigger.
        let stats = scheduler.run_trigger(&mut source, &mut sink).await.unwrap();
        assert_eq!(stats.queries_failed, 1);
        assert_eq!(stats.queries_emitted, 6);
    }

    #[tokio::test]
    async fn test_append_mode_emits_only_new_rows() {
        let dir = TempDir::new().unwrap();
        write_orders(
            &dir,
            "orders_001.csv",
            &["1,C1,Alice,Pen,10,2.5,2024-01-01,NEW,25.0"],
        );

        let config = test_config(&dir);
        let mut source = file_source(&dir);
        let mut sink = MockSink::new();
        let mut scheduler =
            TriggerScheduler::new(QueryRegistry::for_variant(SchemaVariant::V1), &config);
        scheduler.run_trigger(&mut source, &mut sink).await.unwrap();

        write_orders(
            &dir,
            "orders_002.csv",
            &["2,C2,Bob,Desk,1,150.0,2024-01-02,NEW,150.0"],
        );
        scheduler.run_trigger(&mut source, &mut sink).await.unwrap();

        let high_value = sink.writes_for("high_value_orders");
        assert_eq!(high_value[0].rows.len(), 0);
        assert_eq!(high_value[1].rows.len(), 1);
        assert_eq!(high_value[1].mode, OutputMode::Append);
        assert_eq!(
            high_value[1].rows[0].get("total"),
            Some(&FieldValue::Float(150.0))
        );
    }

    #[tokio::test]
    async fn test_poll_retries_exhaust_to_fatal() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir).with_max_poll_retries(2);
        let mut source = DownSource;
        let mut sink = MockSink::new();
        let mut scheduler =
            TriggerScheduler::new(QueryRegistry::for_variant(SchemaVariant::V1), &config);

        let err = scheduler
            .run_trigger(&mut source, &mut sink)
            .await
            .unwrap_err();
        match err {
            SchedulerError::RetriesExhausted { attempts, .. } => assert_eq!(attempts, 2),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(scheduler.state(), TriggerState::Stopped);
        assert!(sink.writes.is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_signal() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let mut source = file_source(&dir);
        let mut sink = MockSink::new();
        let mut scheduler =
            TriggerScheduler::new(QueryRegistry::for_variant(SchemaVariant::V1), &config);

        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        scheduler.run(&mut source, &mut sink, rx).await.unwrap();
        assert_eq!(scheduler.state(), TriggerState::Stopped);
        assert_eq!(scheduler.triggers_fired(), 0);
    }
}
