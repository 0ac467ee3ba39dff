//! Typed form processing for formwork
//!
//! This crate turns an HTTP request into a populated, validated record:
//! - Extraction of urlencoded and multipart bodies, with size, field count
//!   and read timeout limits
//! - Decoding of raw strings into typed fields, with defaults and optional
//!   wire keys
//! - Named transformations such as trimming and HTML sanitization
//! - Declarative validation rules, custom rules and record-level checks
//! - Per-type schema compilation, cached and shared across requests

mod compile;
pub mod config;
mod decode;
pub mod error;
pub mod extract;
pub mod processor;
pub mod request;
pub mod schema;
pub mod transform;
pub mod validate;
pub mod value;

pub use config::{DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_FIELD_SIZE, DEFAULT_MAX_FIELDS, ProcessorConfig};
pub use error::{
	BodyError, CoerceError, ConfigurationError, DecodeError, ErrorKind, ParseError,
	ProcessingError, TransformError, TransformFailure, ValidationError, Violation, Violations,
};
pub use extract::{RawSubmission, extract};
pub use processor::{FormProcessor, FormProcessorBuilder};
pub use request::{FormRequest, collect_body};
pub use schema::{
	ALL_FIELDS_KEY, CheckMetadata, FieldDescriptor, FieldMetadata, FieldSpec, FormMetadata,
	FormRecord, RecordCheck, Rule, Schema, SchemaBuilder,
};
pub use transform::{Sanitize, TextTransform, Transform, TransformRegistry};
pub use validate::{CustomRule, REQUIRED_RULE, RuleFn, RuleRegistry};
pub use value::{DecodeValue, FieldKind, FieldValue, Scalar, ScalarKind};
