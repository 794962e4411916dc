//! End-to-end tests for job execution.

use super::*;
use crate::aggregate::{GroupingAggregator, SizeAggregator, SortOrder};
use crate::component::{Component, FrameReader, FrameTransform, FrameWriter, Gate};
use crate::context::{CollectingListener, TransactionContext, TransformContext};
use crate::errors::{FramepipeError, Result};
use crate::frame::{Frame, Value};
use crate::stages::{CollectingWriter, FieldMapper, FrameVecReader, NotEmptyValidator, SetTransform};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Fails on one row, or on every row when `row` is `None`.
struct FailingTransform {
    row: Option<u64>,
}

impl Component for FailingTransform {
    fn name(&self) -> &str {
        "Failing"
    }
}

impl FrameTransform for FailingTransform {
    fn process(&mut self, _context: &TransformContext, transaction: &mut TransactionContext) -> Result<()> {
        if self.row.map_or(true, |row| row == transaction.row()) {
            return Err(FramepipeError::component("Failing", "boom"));
        }
        Ok(())
    }
}

/// A transform whose `close` always fails.
struct UnclosableTransform;

impl Component for UnclosableTransform {
    fn name(&self) -> &str {
        "Unclosable"
    }

    fn close(&mut self) -> Result<()> {
        Err(FramepipeError::component("Unclosable", "handle already released"))
    }
}

impl FrameTransform for UnclosableTransform {
    fn process(&mut self, _context: &TransformContext, _transaction: &mut TransactionContext) -> Result<()> {
        Ok(())
    }
}

/// A writer that records whether it was closed.
#[derive(Clone, Default)]
struct ClosingWriter {
    inner: CollectingWriter,
    closed: Arc<AtomicBool>,
}

impl Component for ClosingWriter {
    fn name(&self) -> &str {
        "ClosingWriter"
    }

    fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl FrameWriter for ClosingWriter {
    async fn write(&mut self, context: &TransformContext, transaction: &TransactionContext) -> Result<()> {
        self.inner.write(context, transaction).await
    }
}

/// A reader that never flags the last frame.
struct UnflaggedReader {
    frames: Vec<Frame>,
}

impl Component for UnflaggedReader {
    fn name(&self) -> &str {
        "Unflagged"
    }
}

#[async_trait]
impl FrameReader for UnflaggedReader {
    async fn read(
        &mut self,
        _context: &TransformContext,
        _transaction: &mut TransactionContext,
    ) -> Result<Option<Frame>> {
        Ok(self.frames.pop())
    }

    fn eof(&self) -> bool {
        self.frames.is_empty()
    }
}

fn trade(symbol: &str, price: i64, qty: i64) -> Frame {
    Frame::new()
        .with("Symbol", symbol)
        .with("Price", price)
        .with("Qty", qty)
}

fn field<'a>(frames: &'a [Frame], name: &str) -> Vec<&'a Value> {
    frames.iter().filter_map(|f| f.get(name)).collect()
}

#[tokio::test]
async fn test_record_flows_through_every_stage() {
    let writer = CollectingWriter::new();
    let reader = FrameVecReader::new(vec![trade("AAPL", 10, 3), trade("MSFT", 5, 4)]);
    let mut engine = TransformEngine::new(TransformContext::new("trades"), reader)
        .with_validator(NotEmptyValidator::new("Working.Symbol"), Gate::new())
        .with_transform(
            SetTransform::expression("Total", "Working.Price * Working.Qty").unwrap(),
            Gate::new(),
        )
        .with_mapper(
            FieldMapper::new()
                .with_field("Symbol", "Ticker")
                .with_field("Total", "Total"),
            Gate::new(),
        )
        .with_writer(writer.clone(), Gate::new());

    let summary = engine.run().await.unwrap();

    assert_eq!(summary.rows_read, 2);
    assert_eq!(summary.frames_written, 2);
    assert_eq!(summary.record_errors, 0);
    assert!(summary.succeeded());

    let frames = writer.frames();
    assert_eq!(frames[0], Frame::new().with("Ticker", "AAPL").with("Total", 30.0));
    assert_eq!(frames[1], Frame::new().with("Ticker", "MSFT").with("Total", 20.0));
    assert_eq!(engine.context().rows_processed(), 2);
    assert_eq!(engine.context().disposition().frame_count, 2);
}

#[tokio::test]
async fn test_invalid_records_are_counted_not_written() {
    let writer = CollectingWriter::new();
    let listener = Arc::new(CollectingListener::new());
    let reader = FrameVecReader::new(vec![trade("AAPL", 1, 1), trade("  ", 2, 2), trade("IBM", 3, 3)]);
    let context = TransformContext::new("trades").with_listener(listener.clone());
    let mut engine = TransformEngine::new(context, reader)
        .with_validator(NotEmptyValidator::new("Working.Symbol"), Gate::new())
        .with_writer(writer.clone(), Gate::new());

    let summary = engine.run().await.unwrap();

    assert_eq!(summary.validation_failures, 1);
    assert_eq!(summary.record_errors, 1);
    assert_eq!(summary.frames_written, 2);
    assert_eq!(field(&writer.frames(), "Symbol"), vec![&Value::from("AAPL"), &Value::from("IBM")]);

    let invalid = listener.events_named("record.invalid");
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0].row, Some(1));
    let errors = listener.events_named("error");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].detail.starts_with("Validation failed"));
}

#[tokio::test]
async fn test_later_transforms_see_transaction_error() {
    let writer = CollectingWriter::new();
    let reader = FrameVecReader::new(vec![trade("AAPL", 1, 1), trade("MSFT", 2, 2)]);
    let mut engine = TransformEngine::new(TransformContext::new("trades"), reader)
        .with_transform(FailingTransform { row: Some(1) }, Gate::new())
        .with_transform(
            SetTransform::value("Flagged", "yes"),
            Gate::new().with_condition("transactionError"),
        )
        .with_writer(writer.clone(), Gate::new());

    let summary = engine.run().await.unwrap();

    assert_eq!(summary.record_errors, 1);
    assert_eq!(summary.frames_written, 1);
    assert_eq!(writer.frames()[0].get("Flagged"), None);
    assert!(!engine.context().is_in_error());
}

#[tokio::test]
async fn test_halt_on_error_aborts_job() {
    let writer = ClosingWriter::default();
    let reader = FrameVecReader::new(vec![trade("AAPL", 1, 1), trade("MSFT", 2, 2), trade("IBM", 3, 3)]);
    let mut engine = TransformEngine::new(TransformContext::new("trades"), reader)
        .with_transform(
            FailingTransform { row: Some(1) },
            Gate::new().with_halt_on_error(true),
        )
        .with_writer(writer.clone(), Gate::new());

    let err = engine.run().await.unwrap_err();

    assert!(matches!(
        err,
        FramepipeError::JobHalted { ref job, ref component, .. } if job == "trades" && component == "Failing"
    ));
    assert_eq!(writer.inner.len(), 1);
    assert!(writer.closed.load(Ordering::SeqCst));
    assert!(engine.context().is_in_error());
    assert!(engine.context().disposition().is_in_error());
    assert_eq!(engine.context().disposition().frame_count, 1);
}

#[tokio::test]
async fn test_bad_condition_fails_open_and_still_closes() {
    let writer = ClosingWriter::default();
    let reader = FrameVecReader::new(vec![trade("AAPL", 1, 1)]);
    let mut engine = TransformEngine::new(TransformContext::new("trades"), reader)
        .with_transform(
            SetTransform::value("x", "1"),
            Gate::new().with_condition("Working.Price >"),
        )
        .with_writer(writer.clone(), Gate::new());

    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, FramepipeError::Parse(_)));
    assert!(writer.closed.load(Ordering::SeqCst));
    assert!(writer.inner.is_empty());
    assert_eq!(engine.context().rows_processed(), 0);
}

#[tokio::test]
async fn test_conditional_and_disabled_stages() {
    let writer = CollectingWriter::new();
    let reader = FrameVecReader::new(vec![trade("AAPL", 10, 1), trade("MSFT", 200, 1)]);
    let mut engine = TransformEngine::new(TransformContext::new("trades"), reader)
        .with_transform(
            SetTransform::value("Band", "high"),
            Gate::new().with_condition("Working.Price > 100"),
        )
        .with_transform(
            SetTransform::value("Skipped", "yes"),
            Gate::new().with_enabled(false),
        )
        .with_writer(writer.clone(), Gate::new());

    engine.run().await.unwrap();

    let frames = writer.frames();
    assert_eq!(frames[0].get("Band"), None);
    assert_eq!(frames[1].get("Band"), Some(&Value::from("high")));
    assert!(frames.iter().all(|f| f.get("Skipped").is_none()));
}

#[tokio::test]
async fn test_writer_gated_on_last_frame() {
    let writer = CollectingWriter::new();
    let reader = FrameVecReader::new(vec![trade("AAPL", 1, 1), trade("MSFT", 2, 2), trade("IBM", 3, 3)]);
    let mut engine = TransformEngine::new(TransformContext::new("trades"), reader)
        .with_writer(writer.clone(), Gate::new().with_condition("islast"));

    let summary = engine.run().await.unwrap();

    assert_eq!(summary.rows_read, 3);
    assert_eq!(summary.frames_written, 1);
    assert_eq!(field(&writer.frames(), "Symbol"), vec![&Value::from("IBM")]);
}

#[tokio::test]
async fn test_grouping_emits_on_last_frame() {
    let symbols = ["AAPL", "MSFT", "AAPL", "AAPL", "AAPL", "AAPL", "MSFT"];
    let frames = symbols
        .iter()
        .zip(1_i64..)
        .map(|(symbol, seq)| Frame::new().with("Symbol", *symbol).with("Seq", seq));
    let writer = CollectingWriter::new();
    let mut engine = TransformEngine::new(TransformContext::new("ticks"), FrameVecReader::new(frames))
        .with_aggregator(
            GroupingAggregator::new("Symbol")
                .with_limit(3)
                .with_order(SortOrder::Ascend),
            Gate::new(),
        )
        .with_writer(writer.clone(), Gate::new());

    let summary = engine.run().await.unwrap();

    let seqs: Vec<i64> = writer
        .frames()
        .iter()
        .filter_map(|f| match f.get("Seq") {
            Some(Value::Integer(i)) => Some(*i),
            _ => None,
        })
        .collect();
    assert_eq!(seqs, vec![4, 5, 6, 2, 7]);
    assert_eq!(summary.rows_read, 7);
    assert_eq!(summary.frames_written, 5);
}

#[tokio::test]
async fn test_errored_last_record_still_flushes() {
    let writer = CollectingWriter::new();
    let clean = CollectingWriter::new();
    let rejects = CollectingWriter::new();
    let reader = FrameVecReader::new(vec![trade("AAPL", 1, 1), trade("MSFT", 2, 2), trade("", 3, 3)]);
    let mut engine = TransformEngine::new(TransformContext::new("trades"), reader)
        .with_validator(NotEmptyValidator::new("Symbol"), Gate::new())
        .with_aggregator(SizeAggregator::new(Some(10)), Gate::new())
        .with_writer(writer.clone(), Gate::new())
        .with_writer(clean.clone(), Gate::new().with_condition("!transactionError"))
        .with_writer(rejects.clone(), Gate::new().with_condition("transactionError"));

    let summary = engine.run().await.unwrap();

    assert_eq!(summary.record_errors, 1);
    assert_eq!(
        field(&writer.frames(), "Symbol"),
        vec![&Value::from("AAPL"), &Value::from("MSFT")]
    );
    assert_eq!(clean.len(), 2);
    assert!(rejects.is_empty());
}

#[tokio::test]
async fn test_unflagged_reader_discards_buffered_frames() {
    let writer = CollectingWriter::new();
    let reader = UnflaggedReader {
        frames: vec![trade("AAPL", 1, 1), trade("MSFT", 2, 2)],
    };
    let mut engine = TransformEngine::new(TransformContext::new("trades"), reader)
        .with_aggregator(SizeAggregator::new(None), Gate::new())
        .with_writer(writer.clone(), Gate::new());

    let summary = engine.run().await.unwrap();

    assert_eq!(summary.rows_read, 2);
    assert_eq!(summary.frames_written, 0);
    assert!(writer.is_empty());
}

#[tokio::test]
async fn test_listener_event_order() {
    let listener = Arc::new(CollectingListener::new());
    let context = TransformContext::new("trades").with_listener(listener.clone());
    let reader = FrameVecReader::new(vec![trade("AAPL", 1, 1), trade("MSFT", 2, 2)]);
    let mut engine = TransformEngine::new(context, reader)
        .with_mapper(FieldMapper::new(), Gate::new())
        .with_writer(CollectingWriter::new(), Gate::new());

    engine.run().await.unwrap();

    let names: Vec<String> = listener.events().into_iter().map(|e| e.event).collect();
    let record = ["record.start", "record.read", "record.map", "record.write", "record.end"];
    let mut expected = vec!["job.start"];
    expected.extend(record);
    expected.extend(record);
    expected.push("job.end");
    assert_eq!(names, expected);
}

#[tokio::test]
async fn test_job_failure_visible_downstream() {
    let mut upstream = TransformEngine::new(
        TransformContext::new("load"),
        FrameVecReader::new(vec![trade("AAPL", 1, 1)]),
    )
    .with_transform(FailingTransform { row: None }, Gate::new().with_halt_on_error(true));
    assert!(upstream.run().await.is_err());

    let mut context = TransformContext::new("report");
    context.register_job("load", upstream.context());
    let writer = CollectingWriter::new();
    let mut downstream = TransformEngine::new(context, FrameVecReader::new(vec![Frame::new()]))
        .with_transform(
            SetTransform::value("Status", "upstream failed"),
            Gate::new().with_condition("jobFailure(load)"),
        )
        .with_transform(
            SetTransform::value("Healthy", "yes"),
            Gate::new().with_condition("jobSuccess(load)"),
        )
        .with_writer(writer.clone(), Gate::new());

    downstream.run().await.unwrap();

    let frame = &writer.frames()[0];
    assert_eq!(frame.get("Status"), Some(&Value::from("upstream failed")));
    assert_eq!(frame.get("Healthy"), None);
}

#[tokio::test]
async fn test_job_built_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "name": "notional",
            "symbols": {{ "desk": "EQ" }},
            "validators": [{{ "class": "NotEmpty", "Field": "Working.Symbol" }}],
            "transforms": [
                {{ "class": "Set", "Field": "Desk", "Value": "[#desk#]-desk" }},
                {{ "class": "Set", "Field": "Notional", "Expression": "Working.Price * Working.Qty",
                   "Condition": "Working.Qty > 0" }}
            ],
            "mapper": {{ "class": "FieldMapper",
                         "Fields": {{ "Symbol": "Ticker", "Desk": "Desk", "Notional": "Notional" }} }},
            "aggregators": [{{ "class": "Sort", "Field": "Notional", "Sort": "Descend" }}]
        }}"#
    )
    .unwrap();

    let config = JobConfig::from_file(file.path()).unwrap();
    let writer = CollectingWriter::new();
    let listener = Arc::new(CollectingListener::new());
    let reader = FrameVecReader::new(vec![
        trade("AAPL", 10, 2),
        trade("", 1, 1),
        trade("MSFT", 5, 10),
        trade("IBM", 7, 1),
    ]);
    let mut engine = JobBuilder::new(config)
        .with_writer(writer.clone())
        .with_listener(listener.clone())
        .build(reader)
        .unwrap();

    let summary = engine.run().await.unwrap();

    assert_eq!(summary.job_name, "notional");
    assert_eq!(summary.rows_read, 4);
    assert_eq!(summary.validation_failures, 1);
    assert_eq!(summary.frames_written, 3);

    let frames = writer.frames();
    assert_eq!(
        field(&frames, "Ticker"),
        vec![&Value::from("MSFT"), &Value::from("AAPL"), &Value::from("IBM")]
    );
    assert!(frames.iter().all(|f| f.get("Desk") == Some(&Value::from("EQ-desk"))));
    assert_eq!(listener.events_named("record.write").len(), 3);
}

#[tokio::test]
async fn test_close_failure_does_not_skip_later_stages() {
    let writer = ClosingWriter::default();
    let closed = writer.closed.clone();
    let reader = FrameVecReader::new(vec![trade("AAPL", 1, 1), trade("IBM", 2, 2)]);
    let mut engine = TransformEngine::new(TransformContext::new("trades"), reader)
        .with_transform(UnclosableTransform, Gate::new())
        .with_writer(writer.clone(), Gate::new());

    let summary = engine.run().await.unwrap();

    assert!(closed.load(Ordering::SeqCst));
    assert_eq!(summary.rows_read, 2);
    assert_eq!(summary.frames_written, 2);
    assert!(summary.succeeded());
    assert_eq!(writer.inner.len(), 2);
}
