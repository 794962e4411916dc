//! The record loop.

use super::JobSummary;
use crate::aggregate::FrameAggregator;
use crate::component::{
    Component, FrameMapper, FrameReader, FrameTransform, FrameValidator, FrameWriter, Gate, Gated,
};
use crate::context::{ContextListener, ContextScope, TransactionContext, TransformContext};
use crate::errors::{FramepipeError, Result};
use crate::frame::Frame;
use crate::observability::JobTimer;
use std::sync::Arc;
use tracing::{debug, error, info, warn, Instrument};

/// The stages of a job, in execution order.
struct Stages {
    reader: Box<dyn FrameReader>,
    validators: Vec<Gated<Box<dyn FrameValidator>>>,
    transforms: Vec<Gated<Box<dyn FrameTransform>>>,
    mapper: Option<Gated<Box<dyn FrameMapper>>>,
    aggregators: Vec<Gated<Box<dyn FrameAggregator>>>,
    writers: Vec<Gated<Box<dyn FrameWriter>>>,
}

impl Stages {
    fn components_mut(&mut self) -> Vec<&mut dyn Component> {
        let mut components: Vec<&mut dyn Component> = Vec::new();
        components.push(&mut self.reader);
        components.extend(self.validators.iter_mut().map(|s| s as &mut dyn Component));
        components.extend(self.transforms.iter_mut().map(|s| s as &mut dyn Component));
        components.extend(self.mapper.iter_mut().map(|s| s as &mut dyn Component));
        components.extend(self.aggregators.iter_mut().map(|s| s as &mut dyn Component));
        components.extend(self.writers.iter_mut().map(|s| s as &mut dyn Component));
        components
    }
}

/// Runs a job: reads every record and passes it through the stages.
///
/// Records are processed one at a time, end to end. Each record gets a
/// fresh [`TransactionContext`]; the [`TransformContext`] lives for the
/// whole job and is passed explicitly to every stage.
pub struct TransformEngine {
    context: TransformContext,
    stages: Stages,
}

impl TransformEngine {
    /// Creates an engine with a reader and no other stages.
    pub fn new(context: TransformContext, reader: impl FrameReader + 'static) -> Self {
        Self::with_boxed_reader(context, Box::new(reader))
    }

    /// Creates an engine from a boxed reader.
    #[must_use]
    pub fn with_boxed_reader(context: TransformContext, reader: Box<dyn FrameReader>) -> Self {
        Self {
            context,
            stages: Stages {
                reader,
                validators: Vec::new(),
                transforms: Vec::new(),
                mapper: None,
                aggregators: Vec::new(),
                writers: Vec::new(),
            },
        }
    }

    /// Adds a validator.
    #[must_use]
    pub fn with_validator(mut self, validator: impl FrameValidator + 'static, gate: Gate) -> Self {
        self.add_validator(Gated::new(Box::new(validator), gate));
        self
    }

    /// Adds a transform.
    #[must_use]
    pub fn with_transform(mut self, transform: impl FrameTransform + 'static, gate: Gate) -> Self {
        self.add_transform(Gated::new(Box::new(transform), gate));
        self
    }

    /// Sets the mapper.
    #[must_use]
    pub fn with_mapper(mut self, mapper: impl FrameMapper + 'static, gate: Gate) -> Self {
        self.set_mapper(Gated::new(Box::new(mapper), gate));
        self
    }

    /// Adds an aggregator.
    #[must_use]
    pub fn with_aggregator(mut self, aggregator: impl FrameAggregator + 'static, gate: Gate) -> Self {
        self.add_aggregator(Gated::new(Box::new(aggregator), gate));
        self
    }

    /// Adds a writer.
    #[must_use]
    pub fn with_writer(mut self, writer: impl FrameWriter + 'static, gate: Gate) -> Self {
        self.add_writer(Gated::new(Box::new(writer), gate));
        self
    }

    /// Adds a boxed validator.
    pub fn add_validator(&mut self, validator: Gated<Box<dyn FrameValidator>>) {
        self.stages.validators.push(validator);
    }

    /// Adds a boxed transform.
    pub fn add_transform(&mut self, transform: Gated<Box<dyn FrameTransform>>) {
        self.stages.transforms.push(transform);
    }

    /// Sets a boxed mapper.
    pub fn set_mapper(&mut self, mapper: Gated<Box<dyn FrameMapper>>) {
        self.stages.mapper = Some(mapper);
    }

    /// Adds a boxed aggregator.
    pub fn add_aggregator(&mut self, aggregator: Gated<Box<dyn FrameAggregator>>) {
        self.stages.aggregators.push(aggregator);
    }

    /// Adds a boxed writer.
    pub fn add_writer(&mut self, writer: Gated<Box<dyn FrameWriter>>) {
        self.stages.writers.push(writer);
    }

    /// Returns the job context.
    #[must_use]
    pub const fn context(&self) -> &TransformContext {
        &self.context
    }

    /// Returns the job context mutably.
    pub fn context_mut(&mut self) -> &mut TransformContext {
        &mut self.context
    }

    /// Runs the job to completion.
    ///
    /// Every stage is closed afterwards, including after a failed open.
    /// Returns an error when a stage fails to open, the reader fails, or a
    /// stage configured to halt on error fails; record-level failures are
    /// counted in the summary instead.
    pub async fn run(&mut self) -> Result<JobSummary> {
        let timer = JobTimer::start(self.context.job_name(), self.context.run_id());
        self.context.start();
        let mut summary = JobSummary::new(self.context.job_name(), self.context.run_id());
        info!(job = %self.context.job_name(), run_id = %self.context.run_id(), "Job started");
        for listener in self.context.listeners() {
            listener.on_start(ContextScope::Job(&self.context));
        }

        let outcome = match self.open_all() {
            Ok(()) => {
                self.process_records(&mut summary)
                    .instrument(timer.span().clone())
                    .await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = &outcome {
            let message = e.to_string();
            error!(job = %self.context.job_name(), error = %message, "Job failed");
            self.context.set_error(message.clone());
            for listener in self.context.listeners() {
                listener.on_error(ContextScope::Job(&self.context), &message);
            }
        }

        self.close_all();
        self.context.end();
        for listener in self.context.listeners() {
            listener.on_end(ContextScope::Job(&self.context));
        }

        summary.elapsed_ms = timer.elapsed_ms();
        summary.error = self.context.error_message().map(str::to_string);
        info!(
            job = %summary.job_name,
            rows_read = summary.rows_read,
            frames_written = summary.frames_written,
            record_errors = summary.record_errors,
            elapsed_ms = summary.elapsed_ms,
            "Job finished"
        );
        outcome.map(|()| summary)
    }

    fn open_all(&mut self) -> Result<()> {
        let context = &mut self.context;
        for stage in self.stages.components_mut() {
            if let Err(e) = stage.open(context) {
                error!(component = %stage.name(), error = %e, "Failed to open component");
                return Err(e);
            }
            debug!(component = %stage.name(), "Opened component");
        }
        Ok(())
    }

    fn close_all(&mut self) {
        for stage in self.stages.components_mut() {
            if let Err(e) = stage.close() {
                warn!(component = %stage.name(), error = %e, "Ignoring close failure");
            }
        }
    }

    async fn process_records(&mut self, summary: &mut JobSummary) -> Result<()> {
        let mut row = 0_u64;
        loop {
            let mut txn = TransactionContext::new(row);
            let Some(frame) = self.stages.reader.read(&self.context, &mut txn).await? else {
                if !self.stages.aggregators.is_empty() {
                    let buffered: usize = self
                        .stages
                        .aggregators
                        .iter()
                        .map(|a| a.inner().buffered())
                        .sum();
                    warn!(
                        job = %self.context.job_name(),
                        reader = %self.stages.reader.name(),
                        buffered,
                        "Reader ended without flagging the last frame; aggregated frames were not emitted"
                    );
                }
                return Ok(());
            };
            txn.set_source_frame(frame);
            summary.rows_read += 1;

            let outcome = self.process_record(&mut txn, summary).await;

            let listeners = fan_out(&self.context, &txn);
            if let Some(message) = txn.error_message() {
                summary.record_errors += 1;
                for listener in &listeners {
                    listener.on_error(ContextScope::Transaction(&txn), message);
                }
            }
            for listener in &listeners {
                listener.on_end(ContextScope::Transaction(&txn));
            }
            outcome?;

            self.context.increment_rows();
            if txn.is_last_frame() {
                debug!(job = %self.context.job_name(), row, "Last frame processed");
                return Ok(());
            }
            row += 1;
        }
    }

    async fn process_record(&mut self, txn: &mut TransactionContext, summary: &mut JobSummary) -> Result<()> {
        let job = self.context.job_name().to_string();
        let context = &self.context;
        for listener in fan_out(context, txn) {
            listener.on_start(ContextScope::Transaction(txn));
            listener.on_read(txn);
        }
        debug!(job = %job, row = txn.row(), last = txn.is_last_frame(), "Record read");

        for validator in &mut self.stages.validators {
            if !validator.permits(context, txn) {
                continue;
            }
            match validator.inner_mut().validate(context, txn) {
                Ok(true) => {}
                Ok(false) => {
                    let message = validator.inner().description();
                    summary.validation_failures += 1;
                    for listener in fan_out(context, txn) {
                        listener.on_validation_failed(txn, validator.name(), &message);
                    }
                    txn.set_error(format!("Validation failed: {message}"));
                }
                Err(e) => stage_failed(&job, txn, validator.name(), validator.gate().halt_on_error(), e)?,
            }
        }

        for transform in &mut self.stages.transforms {
            if !transform.permits(context, txn) {
                continue;
            }
            if let Err(e) = transform.inner_mut().process(context, txn) {
                stage_failed(&job, txn, transform.name(), transform.gate().halt_on_error(), e)?;
            }
        }

        if !txn.is_in_error() {
            if let Some(mapper) = self.stages.mapper.as_mut() {
                if mapper.permits(context, txn) {
                    match mapper.inner_mut().map(context, txn) {
                        Ok(()) => {
                            for listener in fan_out(context, txn) {
                                listener.on_map(txn);
                            }
                        }
                        Err(e) => stage_failed(&job, txn, mapper.name(), mapper.gate().halt_on_error(), e)?,
                    }
                }
            }
        }

        if self.stages.aggregators.is_empty() {
            if !txn.is_in_error() {
                let frame = txn.output_frame().clone();
                let failure =
                    write_frame(&mut self.stages.writers, context, txn, &frame, &job, summary).await?;
                if let Some(message) = failure {
                    txn.set_error(message);
                }
            }
            return Ok(());
        }

        // Errored records contribute nothing but still flush on the last frame.
        let mut frames = if txn.is_in_error() {
            Vec::new()
        } else {
            vec![txn.output_frame().clone()]
        };
        for aggregator in &mut self.stages.aggregators {
            frames = aggregator.aggregate(context, txn, frames);
        }
        for frame in frames {
            let out = txn.for_output(frame.clone());
            let failure =
                write_frame(&mut self.stages.writers, context, &out, &frame, &job, summary).await?;
            if let Some(message) = failure {
                txn.set_error(message);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for TransformEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformEngine")
            .field("job", &self.context.job_name())
            .field("reader", &self.stages.reader.name())
            .field("validators", &self.stages.validators.len())
            .field("transforms", &self.stages.transforms.len())
            .field("mapper", &self.stages.mapper.is_some())
            .field("aggregators", &self.stages.aggregators.len())
            .field("writers", &self.stages.writers.len())
            .finish()
    }
}

/// Job listeners followed by the record's own listeners.
fn fan_out(context: &TransformContext, txn: &TransactionContext) -> Vec<Arc<dyn ContextListener>> {
    context
        .listeners()
        .iter()
        .chain(txn.listeners())
        .cloned()
        .collect()
}

/// Records a stage failure on the transaction, or halts the job.
fn stage_failed(
    job: &str,
    txn: &mut TransactionContext,
    component: &str,
    halt: bool,
    error: FramepipeError,
) -> Result<()> {
    let message = error.to_string();
    txn.set_error(format!("{component}: {message}"));
    if halt {
        error!(job, component, row = txn.row(), error = %message, "Stage failed; halting job");
        return Err(FramepipeError::JobHalted {
            job: job.to_string(),
            component: component.to_string(),
            message,
        });
    }
    warn!(job, component, row = txn.row(), error = %message, "Stage failed; record marked in error");
    Ok(())
}

/// Hands one frame to every permitted writer.
///
/// Returns the failure message of a non-halting writer error so the caller
/// can mark the record in error.
async fn write_frame(
    writers: &mut [Gated<Box<dyn FrameWriter>>],
    context: &TransformContext,
    txn: &TransactionContext,
    frame: &Frame,
    job: &str,
    summary: &mut JobSummary,
) -> Result<Option<String>> {
    let mut written = false;
    let mut failure = None;
    for writer in writers.iter_mut() {
        if !writer.permits(context, txn) {
            continue;
        }
        match writer.inner_mut().write(context, txn).await {
            Ok(()) => {
                written = true;
                for listener in fan_out(context, txn) {
                    listener.on_write(txn, frame);
                }
            }
            Err(e) => {
                let message = e.to_string();
                if writer.gate().halt_on_error() {
                    error!(job, component = %writer.name(), error = %message, "Writer failed; halting job");
                    return Err(FramepipeError::JobHalted {
                        job: job.to_string(),
                        component: writer.name().to_string(),
                        message,
                    });
                }
                warn!(job, component = %writer.name(), row = txn.row(), error = %message, "Writer failed");
                failure = Some(format!("{}: {message}", writer.name()));
            }
        }
    }
    if written {
        summary.frames_written += 1;
    }
    Ok(failure)
}
