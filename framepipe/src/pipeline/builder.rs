//! Builds a runnable engine from a [`JobConfig`].

use super::{JobConfig, TransformEngine};
use crate::aggregate::{self, FrameAggregator};
use crate::component::{
    ConfigSection, FrameMapper, FrameReader, FrameTransform, FrameValidator, FrameWriter, Gate,
    Gated,
};
use crate::context::{ContextListener, TransformContext};
use crate::errors::{ConfigError, Result};
use crate::stages::{FieldMapper, NotEmptyValidator, SetTransform};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Creates a stage from its configuration section.
pub type Factory<T> = Box<dyn Fn(&ConfigSection) -> Result<Box<T>> + Send + Sync>;

/// Creates a validator from its section.
pub type ValidatorFactory = Factory<dyn FrameValidator>;
/// Creates a transform from its section.
pub type TransformFactory = Factory<dyn FrameTransform>;
/// Creates a mapper from its section.
pub type MapperFactory = Factory<dyn FrameMapper>;
/// Creates an aggregator from its section.
pub type AggregatorFactory = Factory<dyn FrameAggregator>;

/// Instantiates configured stages by class name.
///
/// Class names are matched case-insensitively. The built-in classes are
/// registered up front; custom classes are added with the `register_*`
/// methods and replace a built-in of the same name. Aggregator classes that
/// are not registered fall back to the built-in aggregator factory.
///
/// Readers and writers are supplied in code since they carry connections
/// rather than configuration.
pub struct JobBuilder {
    config: JobConfig,
    validators: HashMap<String, ValidatorFactory>,
    transforms: HashMap<String, TransformFactory>,
    mappers: HashMap<String, MapperFactory>,
    aggregators: HashMap<String, AggregatorFactory>,
    writers: Vec<Gated<Box<dyn FrameWriter>>>,
    listeners: Vec<Arc<dyn ContextListener>>,
}

impl JobBuilder {
    /// Creates a builder with the built-in stage classes registered.
    #[must_use]
    pub fn new(config: JobConfig) -> Self {
        let mut builder = Self {
            config,
            validators: HashMap::new(),
            transforms: HashMap::new(),
            mappers: HashMap::new(),
            aggregators: HashMap::new(),
            writers: Vec::new(),
            listeners: Vec::new(),
        };
        for class in ["NotEmpty", "NotEmptyValidator"] {
            builder.register_validator(class, not_empty);
        }
        for class in ["Set", "SetTransform"] {
            builder.register_transform(class, set_field);
        }
        for class in ["Mapper", "FieldMapper"] {
            builder.register_mapper(class, field_mapper);
        }
        builder
    }

    /// Returns the configuration being built.
    #[must_use]
    pub const fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Registers a validator class.
    pub fn register_validator<F>(&mut self, class: &str, factory: F)
    where
        F: Fn(&ConfigSection) -> Result<Box<dyn FrameValidator>> + Send + Sync + 'static,
    {
        self.validators
            .insert(class.to_ascii_lowercase(), Box::new(factory));
    }

    /// Registers a transform class.
    pub fn register_transform<F>(&mut self, class: &str, factory: F)
    where
        F: Fn(&ConfigSection) -> Result<Box<dyn FrameTransform>> + Send + Sync + 'static,
    {
        self.transforms
            .insert(class.to_ascii_lowercase(), Box::new(factory));
    }

    /// Registers a mapper class.
    pub fn register_mapper<F>(&mut self, class: &str, factory: F)
    where
        F: Fn(&ConfigSection) -> Result<Box<dyn FrameMapper>> + Send + Sync + 'static,
    {
        self.mappers
            .insert(class.to_ascii_lowercase(), Box::new(factory));
    }

    /// Registers an aggregator class.
    pub fn register_aggregator<F>(&mut self, class: &str, factory: F)
    where
        F: Fn(&ConfigSection) -> Result<Box<dyn FrameAggregator>> + Send + Sync + 'static,
    {
        self.aggregators
            .insert(class.to_ascii_lowercase(), Box::new(factory));
    }

    /// Adds an unconditional writer.
    #[must_use]
    pub fn with_writer(self, writer: impl FrameWriter + 'static) -> Self {
        self.with_gated_writer(writer, Gate::new())
    }

    /// Adds a writer behind a gate.
    #[must_use]
    pub fn with_gated_writer(mut self, writer: impl FrameWriter + 'static, gate: Gate) -> Self {
        self.writers.push(Gated::new(Box::new(writer), gate));
        self
    }

    /// Adds a job-wide listener.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn ContextListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Instantiates every configured stage and wires the engine.
    ///
    /// Fails on an unknown class, a missing `class` attribute or a stage
    /// whose own configuration is invalid. Conditions are compiled later,
    /// when the engine opens its stages.
    pub fn build(self, reader: impl FrameReader + 'static) -> Result<TransformEngine> {
        let mut context =
            TransformContext::new(self.config.name.clone()).with_symbols(self.config.symbol_table());
        for listener in self.listeners {
            context.add_listener(listener);
        }
        let mut engine = TransformEngine::new(context, reader);

        for section in &self.config.validators {
            let validator = instantiate(&self.validators, section)?;
            engine.add_validator(Gated::new(validator, Gate::from_config(section)?));
        }
        for section in &self.config.transforms {
            let transform = instantiate(&self.transforms, section)?;
            engine.add_transform(Gated::new(transform, Gate::from_config(section)?));
        }
        if let Some(section) = &self.config.mapper {
            let mapper = instantiate(&self.mappers, section)?;
            engine.set_mapper(Gated::new(mapper, Gate::from_config(section)?));
        }
        for section in &self.config.aggregators {
            let aggregator = match lookup(&self.aggregators, section)? {
                Some(factory) => factory(section)?,
                None => aggregate::from_config(section)?,
            };
            engine.add_aggregator(Gated::new(aggregator, Gate::from_config(section)?));
        }
        for writer in self.writers {
            engine.add_writer(writer);
        }
        Ok(engine)
    }
}

impl fmt::Debug for JobBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobBuilder")
            .field("job", &self.config.name)
            .field("validators", &self.validators.keys().collect::<Vec<_>>())
            .field("transforms", &self.transforms.keys().collect::<Vec<_>>())
            .field("mappers", &self.mappers.keys().collect::<Vec<_>>())
            .field("aggregators", &self.aggregators.keys().collect::<Vec<_>>())
            .field("writers", &self.writers.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

fn lookup<'a, T: ?Sized>(
    registry: &'a HashMap<String, Factory<T>>,
    section: &ConfigSection,
) -> Result<Option<&'a Factory<T>>> {
    let class = section
        .class()
        .ok_or_else(|| ConfigError::missing(section.label(), "class"))?;
    Ok(registry.get(&class.to_ascii_lowercase()))
}

fn instantiate<T: ?Sized>(registry: &HashMap<String, Factory<T>>, section: &ConfigSection) -> Result<Box<T>> {
    match lookup(registry, section)? {
        Some(factory) => factory(section),
        None => Err(ConfigError::UnknownClass(section.class().unwrap_or_default()).into()),
    }
}

fn not_empty(section: &ConfigSection) -> Result<Box<dyn FrameValidator>> {
    Ok(Box::new(NotEmptyValidator::from_config(section)?))
}

fn set_field(section: &ConfigSection) -> Result<Box<dyn FrameTransform>> {
    Ok(Box::new(SetTransform::from_config(section)?))
}

fn field_mapper(section: &ConfigSection) -> Result<Box<dyn FrameMapper>> {
    Ok(Box::new(FieldMapper::from_config(section)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::context::TransactionContext;
    use crate::errors::FramepipeError;
    use crate::stages::{CollectingWriter, FrameVecReader};
    use serde_json::json;

    struct AlwaysFalse;

    impl Component for AlwaysFalse {
        fn name(&self) -> &str {
            "AlwaysFalse"
        }
    }

    impl FrameValidator for AlwaysFalse {
        fn validate(&mut self, _context: &TransformContext, _transaction: &TransactionContext) -> Result<bool> {
            Ok(false)
        }

        fn description(&self) -> String {
            "never valid".to_string()
        }
    }

    fn section(value: serde_json::Value) -> ConfigSection {
        ConfigSection::from_value(value).unwrap()
    }

    #[test]
    fn test_unknown_class_is_rejected() {
        let mut config = JobConfig::new("job");
        config.validators.push(section(json!({ "class": "Checksum", "Field": "a" })));

        let err = JobBuilder::new(config)
            .build(FrameVecReader::default())
            .unwrap_err();
        assert!(matches!(
            err,
            FramepipeError::Config(ConfigError::UnknownClass(ref class)) if class == "Checksum"
        ));
    }

    #[test]
    fn test_missing_class_is_rejected() {
        let mut config = JobConfig::new("job");
        config.transforms.push(section(json!({ "name": "orphan", "Field": "a", "Value": "1" })));

        let err = JobBuilder::new(config)
            .build(FrameVecReader::default())
            .unwrap_err();
        assert!(matches!(
            err,
            FramepipeError::Config(ConfigError::MissingAttribute { ref attribute, .. }) if attribute == "class"
        ));
    }

    #[test]
    fn test_class_names_are_case_insensitive() {
        let mut config = JobConfig::new("job");
        config.validators.push(section(json!({ "class": "notempty", "Field": "a" })));
        config.aggregators.push(section(json!({ "class": "SIZEAGGREGATOR", "Limit": 2 })));

        assert!(JobBuilder::new(config).build(FrameVecReader::default()).is_ok());
    }

    #[tokio::test]
    async fn test_custom_validator_class() {
        let mut config = JobConfig::new("job");
        config.validators.push(section(json!({ "class": "AlwaysFalse" })));

        let writer = CollectingWriter::new();
        let mut builder = JobBuilder::new(config).with_writer(writer.clone());
        builder.register_validator("AlwaysFalse", |_| Ok(Box::new(AlwaysFalse) as Box<dyn FrameValidator>));

        let mut engine = builder
            .build(FrameVecReader::new(vec![crate::frame::Frame::new().with("a", 1)]))
            .unwrap();
        let summary = engine.run().await.unwrap();

        assert_eq!(summary.validation_failures, 1);
        assert!(writer.is_empty());
    }
}
