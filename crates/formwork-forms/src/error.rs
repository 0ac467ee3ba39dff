//! Error types for each pipeline stage
//!
//! Every stage has its own error enum. [`ProcessingError`] wraps exactly one
//! of them and exposes which stage failed through [`ProcessingError::kind`].

use crate::value::FieldKind;
use formwork_core::PolicyError;
use serde::Serialize;
use std::fmt;
use std::num::ParseIntError;
use std::time::Duration;

/// Error produced by a request body reader
pub type BodyError = Box<dyn std::error::Error + Send + Sync>;

/// The stage of the pipeline an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	Parsing,
	Decoding,
	Transforming,
	Validating,
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			ErrorKind::Parsing => "parsing",
			ErrorKind::Decoding => "decoding",
			ErrorKind::Transforming => "transforming",
			ErrorKind::Validating => "validating",
		})
	}
}

/// Error returned by [`FormProcessor::process`](crate::FormProcessor::process)
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
	#[error("error parsing form")]
	Parsing(#[from] ParseError),
	#[error("error decoding form")]
	Decoding(#[from] DecodeError),
	#[error("error modifying form")]
	Transforming(#[from] TransformError),
	#[error("error validating form")]
	Validating(#[from] ValidationError),
}

impl ProcessingError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			ProcessingError::Parsing(_) => ErrorKind::Parsing,
			ProcessingError::Decoding(_) => ErrorKind::Decoding,
			ProcessingError::Transforming(_) => ErrorKind::Transforming,
			ProcessingError::Validating(_) => ErrorKind::Validating,
		}
	}

	/// Violations of a failed validation; empty for every other error
	pub fn violations(&self) -> &[Violation] {
		match self {
			ProcessingError::Validating(error) => error.violations(),
			_ => &[],
		}
	}
}

/// Failure to read raw key/value pairs from a request
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
	#[error("unsupported content type {0:?}")]
	UnsupportedMediaType(String),
	#[error("request has a body but no content type")]
	MissingContentType,
	#[error("multipart boundary is missing or invalid")]
	MissingBoundary(#[source] multer::Error),
	#[error("malformed form body: {0}")]
	Malformed(String),
	#[error("failed to read multipart body")]
	Multipart(#[source] multer::Error),
	#[error("form body of {size} bytes exceeds the {limit} byte limit")]
	PayloadTooLarge { size: usize, limit: usize },
	#[error("form has more than {limit} fields")]
	TooManyFields { limit: usize },
	#[error("failed to read request body")]
	Body(#[source] BodyError),
	#[error("timed out after {0:?} reading request body")]
	Timeout(Duration),
}

/// A raw string that cannot be coerced to the field's type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoerceError {
	#[error("{value:?} is not a valid integer")]
	InvalidInteger {
		value: String,
		#[source]
		source: ParseIntError,
	},
	#[error("{value:?} is not a valid finite number")]
	InvalidFloat { value: String },
	#[error("{value:?} is not a valid boolean")]
	InvalidBool { value: String },
}

/// Failure to map raw pairs onto the record's fields
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
	#[error("field {field:?} (key {key:?}) could not be decoded")]
	Field {
		field: String,
		key: String,
		#[source]
		source: CoerceError,
	},
	#[error("unknown form key {0:?}")]
	UnknownKey(String),
	#[error("form schema is misconfigured")]
	Misconfigured(#[source] ConfigurationError),
}

impl DecodeError {
	/// Name of the field that failed to decode
	pub fn field(&self) -> Option<&str> {
		match self {
			DecodeError::Field { field, .. } => Some(field),
			_ => None,
		}
	}
}

/// Reason a transformation could not be applied to a value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransformFailure(String);

impl TransformFailure {
	pub fn new(message: impl Into<String>) -> Self {
		Self(message.into())
	}
}

/// Failure while mutating decoded fields
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
	#[error("transformation {transform:?} failed on field {field:?}")]
	Field {
		field: String,
		transform: String,
		#[source]
		source: TransformFailure,
	},
	#[error("form schema is misconfigured")]
	Misconfigured(#[source] ConfigurationError),
}

/// One failed rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
	/// Field name, or `_all` for record-level checks
	pub field: String,
	pub rule: String,
	pub message: String,
}

impl Violation {
	pub fn new(
		field: impl Into<String>,
		rule: impl Into<String>,
		message: impl Into<String>,
	) -> Self {
		Self {
			field: field.into(),
			rule: rule.into(),
			message: message.into(),
		}
	}
}

impl fmt::Display for Violation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {} ({})", self.field, self.message, self.rule)
	}
}

/// Violations in schema order, record-level checks last
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations(Vec<Violation>);

impl Violations {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, violation: Violation) {
		self.0.push(violation);
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
		self.0.iter()
	}

	pub fn as_slice(&self) -> &[Violation] {
		&self.0
	}

	/// Violations reported for one field
	pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Violation> {
		self.0.iter().filter(move |violation| violation.field == field)
	}

	/// `(field, rule)` pairs, handy for assertions and logs
	pub fn pairs(&self) -> Vec<(&str, &str)> {
		self.0
			.iter()
			.map(|violation| (violation.field.as_str(), violation.rule.as_str()))
			.collect()
	}
}

impl fmt::Display for Violations {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (index, violation) in self.0.iter().enumerate() {
			if index > 0 {
				f.write_str("; ")?;
			}
			write!(f, "{violation}")?;
		}
		Ok(())
	}
}

impl IntoIterator for Violations {
	type Item = Violation;
	type IntoIter = std::vec::IntoIter<Violation>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

impl<'a> IntoIterator for &'a Violations {
	type Item = &'a Violation;
	type IntoIter = std::slice::Iter<'a, Violation>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}

/// Failure of the validation stage
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
	#[error("{0}")]
	Failed(Violations),
	#[error("form schema is misconfigured")]
	Misconfigured(#[source] ConfigurationError),
}

impl ValidationError {
	pub fn violations(&self) -> &[Violation] {
		match self {
			ValidationError::Failed(violations) => violations.as_slice(),
			ValidationError::Misconfigured(_) => &[],
		}
	}
}

/// A processor or schema that cannot be used
///
/// Raised by [`FormProcessorBuilder::build`](crate::FormProcessorBuilder::build)
/// and [`FormProcessor::register`](crate::FormProcessor::register). A schema
/// that is first compiled while processing a request reports it wrapped in the
/// stage error that owns the faulty declaration.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigurationError {
	#[error("invalid processor configuration: {0}")]
	InvalidConfig(String),
	#[error("invalid sanitization policy")]
	Policy(#[from] PolicyError),
	#[error("transformation or rule registered with an empty name")]
	EmptyRegistrationName,
	#[error("field at position {0} has an empty name")]
	EmptyName(usize),
	#[error("wire key {key:?} is declared by more than one field")]
	DuplicateKey { key: String },
	#[error("default value of field {field:?} does not decode")]
	InvalidDefault {
		field: String,
		#[source]
		source: CoerceError,
	},
	#[error("field {field:?} references unregistered transformation {transform:?}")]
	UnknownTransformation { field: String, transform: String },
	#[error("transformation {transform:?} does not support {kind} field {field:?}")]
	UnsupportedTransformation {
		field: String,
		transform: String,
		kind: FieldKind,
	},
	#[error("rule {rule:?} does not support {kind} field {field:?}")]
	UnsupportedRule {
		field: String,
		rule: String,
		kind: FieldKind,
	},
	#[error("field {field:?} references unregistered rule {rule:?}")]
	UnknownRule { field: String, rule: String },
	#[error("invalid pattern for field {field:?}")]
	InvalidPattern {
		field: String,
		#[source]
		source: regex::Error,
	},
	#[error("check {rule:?} targets unknown field {field:?}")]
	UnknownField { field: String, rule: String },
	#[error("rule {rule:?} on field {field:?} has a bound that is not a finite number")]
	NonFiniteBound { field: String, rule: String },
}

impl ConfigurationError {
	/// The stage that owns the misconfigured declaration
	pub fn stage(&self) -> ErrorKind {
		match self {
			ConfigurationError::UnknownTransformation { .. }
			| ConfigurationError::UnsupportedTransformation { .. } => ErrorKind::Transforming,
			ConfigurationError::UnsupportedRule { .. }
			| ConfigurationError::UnknownRule { .. }
			| ConfigurationError::InvalidPattern { .. }
			| ConfigurationError::NonFiniteBound { .. }
			| ConfigurationError::UnknownField { .. } => ErrorKind::Validating,
			// Field declarations and processor-level settings belong to the
			// first stage that reads the schema.
			ConfigurationError::InvalidConfig(_)
			| ConfigurationError::Policy(_)
			| ConfigurationError::EmptyRegistrationName
			| ConfigurationError::EmptyName(_)
			| ConfigurationError::DuplicateKey { .. }
			| ConfigurationError::InvalidDefault { .. } => ErrorKind::Decoding,
		}
	}
}

impl From<ConfigurationError> for ProcessingError {
	fn from(error: ConfigurationError) -> Self {
		match error.stage() {
			ErrorKind::Transforming => TransformError::Misconfigured(error).into(),
			ErrorKind::Validating => ValidationError::Misconfigured(error).into(),
			ErrorKind::Parsing | ErrorKind::Decoding => DecodeError::Misconfigured(error).into(),
		}
	}
}
