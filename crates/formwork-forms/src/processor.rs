//! The form processor
//!
//! A [`FormProcessor`] is built once and shared by every request handler. It
//! owns the configuration, the sanitization policy, the transformation and
//! rule registries, and the cache of compiled record schemas.

use crate::compile::{CompiledSchema, SchemaCache};
use crate::config::ProcessorConfig;
use crate::decode;
use crate::error::{ConfigurationError, ProcessingError, TransformFailure};
use crate::extract::{self, RawSubmission};
use crate::request::FormRequest;
use crate::schema::FormRecord;
use crate::transform::{self, TextTransform, Transform, TransformRegistry};
use crate::validate::{self, CustomRule, RuleRegistry};
use formwork_core::SanitizationPolicy;
use std::any::type_name;
use std::error::Error as _;
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

/// Runs the parse, decode, transform and validate stages for a record
///
/// # Examples
///
/// ```
/// use formwork_forms::{FormProcessor, FormRecord, RawSubmission, Schema};
///
/// #[derive(Debug, Default)]
/// struct Entry {
///     name: String,
///     value: i32,
/// }
///
/// impl FormRecord for Entry {
///     fn schema() -> Schema<Self> {
///         Schema::<Self>::builder()
///             .field("name", |e| &e.name, |e| &mut e.name, |f| {
///                 f.required().transform("trim").transform("sanitize")
///             })
///             .field("value", |e| &e.value, |e| &mut e.value, |f| f.gte(0).lte(100))
///             .build()
///     }
/// }
///
/// let processor = FormProcessor::builder().register::<Entry>().build().unwrap();
///
/// let submission = RawSubmission::from_urlencoded("name=++%3Cb%3EBob%3C%2Fb%3E++&value=42").unwrap();
/// let mut entry = Entry::default();
/// processor.process_submission(&mut entry, &submission).unwrap();
///
/// assert_eq!(entry.name, "Bob");
/// assert_eq!(entry.value, 42);
/// ```
pub struct FormProcessor {
	config: ProcessorConfig,
	policy: Arc<SanitizationPolicy>,
	transforms: TransformRegistry,
	rules: RuleRegistry,
	schemas: SchemaCache,
}

impl FormProcessor {
	/// Processor with the default configuration and the strict policy
	pub fn new() -> Result<Self, ConfigurationError> {
		Self::builder().build()
	}

	pub fn builder() -> FormProcessorBuilder {
		FormProcessorBuilder::default()
	}

	pub fn config(&self) -> &ProcessorConfig {
		&self.config
	}

	pub fn policy(&self) -> &SanitizationPolicy {
		&self.policy
	}

	pub fn transforms(&self) -> &TransformRegistry {
		&self.transforms
	}

	pub fn rules(&self) -> &RuleRegistry {
		&self.rules
	}

	/// Compiles and caches the schema of `T`
	///
	/// Registration is optional: an unregistered record type is compiled the
	/// first time it is processed.
	pub fn register<T: FormRecord>(&self) -> Result<(), ConfigurationError> {
		self.compiled::<T>().map(|_| ())
	}

	/// Populates `record` from `request`
	///
	/// On failure, fields the pipeline reached before the failing stage keep
	/// their new values. Use [`process_atomic`](Self::process_atomic) when
	/// the record must stay untouched on failure.
	pub async fn process<T, R>(&self, record: &mut T, request: &R) -> Result<(), ProcessingError>
	where
		T: FormRecord,
		R: FormRequest + ?Sized,
	{
		let span = tracing::debug_span!("form.process", record = type_name::<T>());
		async move {
			let schema = self.compiled::<T>().map_err(|e| failed("compile", e.into()))?;

			let submission = extract::extract(request, &self.config)
				.await
				.map_err(|e| failed("parse", e.into()))?;
			tracing::debug!(
				step = "parse",
				keys = submission.len(),
				values = submission.value_count(),
				"form stage completed"
			);

			self.run(&schema, record, &submission)
		}
		.instrument(span)
		.await
	}

	/// Runs the decode, transform and validate stages on pairs the caller
	/// already holds
	pub fn process_submission<T: FormRecord>(
		&self,
		record: &mut T,
		submission: &RawSubmission,
	) -> Result<(), ProcessingError> {
		let span = tracing::debug_span!("form.process", record = type_name::<T>());
		let _entered = span.enter();

		let schema = self.compiled::<T>().map_err(|e| failed("compile", e.into()))?;
		self.run(&schema, record, submission)
	}

	/// Like [`process`](Self::process), but leaves `record` untouched unless
	/// every stage succeeds
	pub async fn process_atomic<T, R>(&self, record: &mut T, request: &R) -> Result<(), ProcessingError>
	where
		T: FormRecord + Clone,
		R: FormRequest + ?Sized,
	{
		let mut draft = record.clone();
		self.process(&mut draft, request).await?;
		*record = draft;
		Ok(())
	}

	fn compiled<T: FormRecord>(&self) -> Result<Arc<CompiledSchema<T>>, ConfigurationError> {
		self.schemas
			.get_or_compile::<T, _>(|| CompiledSchema::compile(&self.transforms, &self.rules))
	}

	fn run<T>(
		&self,
		schema: &CompiledSchema<T>,
		record: &mut T,
		submission: &RawSubmission,
	) -> Result<(), ProcessingError> {
		decode::decode(schema, submission, record, &self.config)
			.map_err(|e| failed("decode", e.into()))?;
		tracing::debug!(step = "decode", "form stage completed");

		transform::apply(schema, record).map_err(|e| failed("transform", e.into()))?;
		tracing::debug!(step = "transform", "form stage completed");

		validate::validate(schema, record).map_err(|e| failed("validate", e.into()))?;
		tracing::debug!(step = "validate", "form stage completed");

		Ok(())
	}
}

impl fmt::Debug for FormProcessor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FormProcessor")
			.field("config", &self.config)
			.field("policy", &self.policy)
			.field("transforms", &self.transforms)
			.field("rules", &self.rules)
			.field("compiled_schemas", &self.schemas.len())
			.finish()
	}
}

fn failed(step: &'static str, error: ProcessingError) -> ProcessingError {
	match error.source() {
		Some(cause) => tracing::warn!(step, kind = %error.kind(), %cause, "form processing failed"),
		None => tracing::warn!(step, kind = %error.kind(), "form processing failed"),
	}
	error
}

type Registration = fn(&FormProcessor) -> Result<(), ConfigurationError>;

/// Builder for [`FormProcessor`]
#[derive(Default)]
pub struct FormProcessorBuilder {
	config: ProcessorConfig,
	policy: SanitizationPolicy,
	transforms: Vec<(String, Arc<dyn Transform>)>,
	rules: Vec<(String, Arc<dyn CustomRule>)>,
	registrations: Vec<Registration>,
}

impl FormProcessorBuilder {
	pub fn config(mut self, config: ProcessorConfig) -> Self {
		self.config = config;
		self
	}

	/// Policy used by the `sanitize` transformation
	pub fn policy(mut self, policy: SanitizationPolicy) -> Self {
		self.policy = policy;
		self
	}

	/// Registers a transformation; a built-in of the same name is replaced
	pub fn transform(mut self, name: impl Into<String>, transform: impl Transform + 'static) -> Self {
		self.transforms.push((name.into(), Arc::new(transform)));
		self
	}

	/// Registers a fallible text transformation
	pub fn text_transform<F>(self, name: impl Into<String>, func: F) -> Self
	where
		F: Fn(&str) -> Result<String, TransformFailure> + Send + Sync + 'static,
	{
		self.transform(name, TextTransform::new(func))
	}

	/// Registers a custom rule, referenced from schemas with
	/// [`FieldSpec::custom`](crate::FieldSpec::custom)
	pub fn rule(mut self, name: impl Into<String>, rule: impl CustomRule + 'static) -> Self {
		self.rules.push((name.into(), Arc::new(rule)));
		self
	}

	/// Compiles the schema of `T` during [`build`](Self::build)
	pub fn register<T: FormRecord>(mut self) -> Self {
		self.registrations.push(FormProcessor::register::<T>);
		self
	}

	pub fn build(self) -> Result<FormProcessor, ConfigurationError> {
		self.config.validate()?;
		self.policy.validate()?;

		let policy = Arc::new(self.policy);
		let mut transforms = TransformRegistry::with_builtins(Arc::clone(&policy));
		for (name, transform) in self.transforms {
			if name.is_empty() {
				return Err(ConfigurationError::EmptyRegistrationName);
			}
			transforms.insert(name, transform);
		}

		let mut rules = RuleRegistry::new();
		for (name, rule) in self.rules {
			if name.is_empty() {
				return Err(ConfigurationError::EmptyRegistrationName);
			}
			rules.insert(name, rule);
		}

		let processor = FormProcessor {
			config: self.config,
			policy,
			transforms,
			rules,
			schemas: SchemaCache::default(),
		};

		for register in self.registrations {
			register(&processor)?;
		}

		tracing::debug!(schemas = processor.schemas.len(), "form processor built");
		Ok(processor)
	}
}
