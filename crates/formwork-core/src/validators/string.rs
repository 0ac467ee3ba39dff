//! String validators

use super::{ValidationError, ValidationResult, Validator};
use regex::Regex;
use std::sync::LazyLock;

// Local part per RFC 5322 atoms, domain made of dot-separated labels with at
// least one dot.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9]([A-Za-z0-9\-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9\-]{0,61}[A-Za-z0-9])?)+$",
	)
	.expect("EMAIL_REGEX: invalid regex pattern")
});

// HTTP/HTTPS URL pattern.
//
// Validates URLs with:
// - http or https scheme only
// - Valid domain labels (no leading/trailing hyphens)
// - Optional port number (1-5 digits)
// - Optional path, query string, and fragment
static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"^https?://[a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9\-]*[a-zA-Z0-9])?)*(:[0-9]{1,5})?(/[^\s?#]*)?(\?[^\s#]*)?(#[^\s]*)?$",
	)
	.expect("URL_REGEX: invalid regex pattern")
});

/// Minimum length validator
///
/// Lengths are counted in characters, not bytes.
#[derive(Debug, Clone)]
pub struct MinLengthValidator {
	min: usize,
}

impl MinLengthValidator {
	/// Creates a new MinLengthValidator with the specified minimum length.
	///
	/// # Examples
	///
	/// ```
	/// use formwork_core::validators::{MinLengthValidator, Validator};
	///
	/// let validator = MinLengthValidator::new(5);
	/// assert!(validator.validate("hello").is_ok());
	/// assert!(validator.validate("hi").is_err());
	/// ```
	pub fn new(min: usize) -> Self {
		Self { min }
	}

	/// Checks the number of items of a list
	pub fn validate_count(&self, count: usize) -> ValidationResult<()> {
		if count >= self.min {
			Ok(())
		} else {
			Err(ValidationError::TooFewItems {
				count,
				min: self.min,
			})
		}
	}
}

impl Validator<str> for MinLengthValidator {
	fn validate(&self, value: &str) -> ValidationResult<()> {
		let length = value.chars().count();
		if length >= self.min {
			Ok(())
		} else {
			Err(ValidationError::TooShort {
				length,
				min: self.min,
			})
		}
	}
}

/// Maximum length validator
///
/// Lengths are counted in characters, not bytes.
#[derive(Debug, Clone)]
pub struct MaxLengthValidator {
	max: usize,
}

impl MaxLengthValidator {
	/// Creates a new MaxLengthValidator with the specified maximum length.
	///
	/// # Examples
	///
	/// ```
	/// use formwork_core::validators::{MaxLengthValidator, Validator};
	///
	/// let validator = MaxLengthValidator::new(10);
	/// assert!(validator.validate("hello").is_ok());
	/// assert!(validator.validate("hello world!").is_err());
	/// ```
	pub fn new(max: usize) -> Self {
		Self { max }
	}

	/// Checks the number of items of a list
	pub fn validate_count(&self, count: usize) -> ValidationResult<()> {
		if count <= self.max {
			Ok(())
		} else {
			Err(ValidationError::TooManyItems {
				count,
				max: self.max,
			})
		}
	}
}

impl Validator<str> for MaxLengthValidator {
	fn validate(&self, value: &str) -> ValidationResult<()> {
		let length = value.chars().count();
		if length <= self.max {
			Ok(())
		} else {
			Err(ValidationError::TooLong {
				length,
				max: self.max,
			})
		}
	}
}

/// Regex validator
#[derive(Debug, Clone)]
pub struct RegexValidator {
	regex: Regex,
	message: String,
}

impl RegexValidator {
	/// Creates a new RegexValidator with the specified regex pattern.
	///
	/// # Examples
	///
	/// ```
	/// use formwork_core::validators::{RegexValidator, Validator};
	///
	/// let validator = RegexValidator::new(r"^\d{3}-\d{4}$").unwrap();
	/// assert!(validator.validate("123-4567").is_ok());
	/// assert!(validator.validate("invalid").is_err());
	/// ```
	pub fn new(pattern: &str) -> Result<Self, regex::Error> {
		Ok(Self {
			regex: Regex::new(pattern)?,
			message: format!("Value must match pattern: {}", pattern),
		})
	}

	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = message.into();
		self
	}

	pub fn pattern(&self) -> &str {
		self.regex.as_str()
	}
}

impl Validator<str> for RegexValidator {
	fn validate(&self, value: &str) -> ValidationResult<()> {
		if self.regex.is_match(value) {
			Ok(())
		} else {
			Err(ValidationError::PatternMismatch(self.message.clone()))
		}
	}
}

/// Email address validator
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailValidator;

impl EmailValidator {
	pub fn new() -> Self {
		Self
	}
}

impl Validator<str> for EmailValidator {
	fn validate(&self, value: &str) -> ValidationResult<()> {
		if value.len() <= 254 && EMAIL_REGEX.is_match(value) {
			Ok(())
		} else {
			Err(ValidationError::InvalidEmail(value.to_string()))
		}
	}
}

/// HTTP/HTTPS URL validator
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlValidator;

impl UrlValidator {
	pub fn new() -> Self {
		Self
	}
}

impl Validator<str> for UrlValidator {
	fn validate(&self, value: &str) -> ValidationResult<()> {
		if URL_REGEX.is_match(value) {
			Ok(())
		} else {
			Err(ValidationError::InvalidUrl(value.to_string()))
		}
	}
}

/// Accepts only one of a fixed set of strings
///
/// # Examples
///
/// ```
/// use formwork_core::validators::{ChoiceValidator, Validator};
///
/// let validator = ChoiceValidator::new(["red", "green"]);
/// assert!(validator.validate("red").is_ok());
/// assert!(validator.validate("blue").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ChoiceValidator {
	choices: Vec<String>,
}

impl ChoiceValidator {
	pub fn new<I, S>(choices: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			choices: choices.into_iter().map(Into::into).collect(),
		}
	}

	pub fn choices(&self) -> &[String] {
		&self.choices
	}
}

impl Validator<str> for ChoiceValidator {
	fn validate(&self, value: &str) -> ValidationResult<()> {
		if self.choices.iter().any(|choice| choice == value) {
			Ok(())
		} else {
			Err(ValidationError::InvalidChoice {
				value: value.to_string(),
			})
		}
	}
}
