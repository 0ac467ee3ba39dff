//! Numeric validators

use super::{ValidationError, ValidationResult, Validator};
use std::fmt::Display;

/// Lower bound validator
///
/// Inclusive by default (`gte`); [`exclusive`](Self::exclusive) turns it into
/// a strict bound (`gt`).
#[derive(Debug, Clone)]
pub struct MinValueValidator<T> {
	min: T,
	exclusive: bool,
}

impl<T> MinValueValidator<T> {
	/// Creates a new MinValueValidator with the specified minimum value.
	///
	/// # Examples
	///
	/// ```
	/// use formwork_core::validators::{MinValueValidator, Validator};
	///
	/// let validator = MinValueValidator::new(10);
	/// assert!(validator.validate(&15).is_ok());
	/// assert!(validator.validate(&10).is_ok());
	/// assert!(validator.validate(&5).is_err());
	/// ```
	pub fn new(min: T) -> Self {
		Self {
			min,
			exclusive: false,
		}
	}

	/// Rejects values equal to the bound.
	///
	/// # Examples
	///
	/// ```
	/// use formwork_core::validators::{MinValueValidator, Validator};
	///
	/// let validator = MinValueValidator::new(0).exclusive();
	/// assert!(validator.validate(&1).is_ok());
	/// assert!(validator.validate(&0).is_err());
	/// ```
	pub fn exclusive(mut self) -> Self {
		self.exclusive = true;
		self
	}
}

impl<T: PartialOrd + Display> Validator<T> for MinValueValidator<T> {
	fn validate(&self, value: &T) -> ValidationResult<()> {
		match (self.exclusive, value.partial_cmp(&self.min)) {
			(false, Some(ordering)) if ordering.is_ge() => Ok(()),
			(true, Some(ordering)) if ordering.is_gt() => Ok(()),
			(false, _) => Err(ValidationError::TooSmall {
				value: value.to_string(),
				min: self.min.to_string(),
			}),
			(true, _) => Err(ValidationError::NotGreaterThan {
				value: value.to_string(),
				min: self.min.to_string(),
			}),
		}
	}
}

/// Upper bound validator
///
/// Inclusive by default (`lte`); [`exclusive`](Self::exclusive) turns it into
/// a strict bound (`lt`).
#[derive(Debug, Clone)]
pub struct MaxValueValidator<T> {
	max: T,
	exclusive: bool,
}

impl<T> MaxValueValidator<T> {
	/// Creates a new MaxValueValidator with the specified maximum value.
	///
	/// # Examples
	///
	/// ```
	/// use formwork_core::validators::{MaxValueValidator, Validator};
	///
	/// let validator = MaxValueValidator::new(20);
	/// assert!(validator.validate(&15).is_ok());
	/// assert!(validator.validate(&25).is_err());
	/// ```
	pub fn new(max: T) -> Self {
		Self {
			max,
			exclusive: false,
		}
	}

	pub fn exclusive(mut self) -> Self {
		self.exclusive = true;
		self
	}
}

impl<T: PartialOrd + Display> Validator<T> for MaxValueValidator<T> {
	fn validate(&self, value: &T) -> ValidationResult<()> {
		match (self.exclusive, value.partial_cmp(&self.max)) {
			(false, Some(ordering)) if ordering.is_le() => Ok(()),
			(true, Some(ordering)) if ordering.is_lt() => Ok(()),
			(false, _) => Err(ValidationError::TooLarge {
				value: value.to_string(),
				max: self.max.to_string(),
			}),
			(true, _) => Err(ValidationError::NotLessThan {
				value: value.to_string(),
				max: self.max.to_string(),
			}),
		}
	}
}
