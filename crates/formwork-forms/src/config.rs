//! Processor configuration

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default maximum body size (10 MiB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Default maximum number of key/value pairs
pub const DEFAULT_MAX_FIELDS: usize = 1000;

/// Default maximum size of one multipart text part (1 MiB)
pub const DEFAULT_MAX_FIELD_SIZE: usize = 1024 * 1024;

/// Limits and switches of a [`FormProcessor`](crate::FormProcessor)
///
/// Missing keys fall back to their defaults, so the struct can be embedded in
/// an application settings file:
///
/// ```
/// use formwork_forms::ProcessorConfig;
///
/// let config: ProcessorConfig =
///     serde_json::from_str(r#"{"max_fields": 50, "read_timeout_ms": 2000}"#).unwrap();
/// assert_eq!(config.max_fields, 50);
/// assert_eq!(config.read_timeout(), Some(std::time::Duration::from_secs(2)));
/// assert!(!config.include_query);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
	/// Maximum body size in bytes
	pub max_body_size: usize,
	/// Maximum number of key/value pairs per submission
	pub max_fields: usize,
	/// Maximum size of one multipart text part in bytes
	pub max_field_size: usize,
	/// Deadline for reading the body, in milliseconds
	pub read_timeout_ms: Option<u64>,
	/// Also read pairs from the query string
	pub include_query: bool,
	/// Reject wire keys the schema does not declare
	pub deny_unknown_keys: bool,
}

impl Default for ProcessorConfig {
	fn default() -> Self {
		Self {
			max_body_size: DEFAULT_MAX_BODY_SIZE,
			max_fields: DEFAULT_MAX_FIELDS,
			max_field_size: DEFAULT_MAX_FIELD_SIZE,
			read_timeout_ms: None,
			include_query: false,
			deny_unknown_keys: false,
		}
	}
}

impl ProcessorConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_max_body_size(mut self, bytes: usize) -> Self {
		self.max_body_size = bytes;
		self
	}

	pub fn with_max_fields(mut self, fields: usize) -> Self {
		self.max_fields = fields;
		self
	}

	pub fn with_max_field_size(mut self, bytes: usize) -> Self {
		self.max_field_size = bytes;
		self
	}

	pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
		self.read_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
		self
	}

	pub fn with_include_query(mut self, include: bool) -> Self {
		self.include_query = include;
		self
	}

	pub fn with_deny_unknown_keys(mut self, deny: bool) -> Self {
		self.deny_unknown_keys = deny;
		self
	}

	pub fn read_timeout(&self) -> Option<Duration> {
		self.read_timeout_ms.map(Duration::from_millis)
	}

	/// Rejects limits that would refuse every submission
	pub fn validate(&self) -> Result<(), ConfigurationError> {
		let zero = [
			("max_body_size", self.max_body_size == 0),
			("max_fields", self.max_fields == 0),
			("max_field_size", self.max_field_size == 0),
			("read_timeout_ms", self.read_timeout_ms == Some(0)),
		];
		match zero.iter().find(|(_, is_zero)| *is_zero) {
			Some((name, _)) => Err(ConfigurationError::InvalidConfig(format!(
				"{name} must be greater than zero"
			))),
			None => Ok(()),
		}
	}
}
