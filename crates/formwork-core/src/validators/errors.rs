//! Validation error types

/// A single failed validation, rendered as a user-facing message
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
	#[error("Ensure this value is greater than or equal to {min}.")]
	TooSmall { value: String, min: String },
	#[error("Ensure this value is less than or equal to {max}.")]
	TooLarge { value: String, max: String },
	#[error("Ensure this value is greater than {min}.")]
	NotGreaterThan { value: String, min: String },
	#[error("Ensure this value is less than {max}.")]
	NotLessThan { value: String, max: String },
	#[error("Ensure this value has at least {min} characters (it has {length}).")]
	TooShort { length: usize, min: usize },
	#[error("Ensure this value has at most {max} characters (it has {length}).")]
	TooLong { length: usize, max: usize },
	#[error("Ensure this list has at least {min} items (it has {count}).")]
	TooFewItems { count: usize, min: usize },
	#[error("Ensure this list has at most {max} items (it has {count}).")]
	TooManyItems { count: usize, max: usize },
	#[error("Enter a valid email address.")]
	InvalidEmail(String),
	#[error("Enter a valid URL.")]
	InvalidUrl(String),
	#[error("{0}")]
	PatternMismatch(String),
	#[error("Select a valid choice. {value} is not one of the available choices.")]
	InvalidChoice { value: String },
	#[error("{0}")]
	Custom(String),
}

pub type ValidationResult<T> = Result<T, ValidationError>;
