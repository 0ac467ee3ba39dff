//! Django-style value validators
//!
//! Each validator checks one property of a value and reports a
//! [`ValidationError`] whose message is suitable for showing to the person who
//! submitted the form.

pub mod errors;
pub mod number;
pub mod numeric;
pub mod string;

pub use errors::{ValidationError, ValidationResult};
pub use number::Number;
pub use numeric::{MaxValueValidator, MinValueValidator};
pub use string::{
	ChoiceValidator, EmailValidator, MaxLengthValidator, MinLengthValidator, RegexValidator,
	UrlValidator,
};

/// Trait for validators
pub trait Validator<T: ?Sized> {
	fn validate(&self, value: &T) -> ValidationResult<()>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_validators_compose_through_trait_objects() {
		let validators: Vec<Box<dyn Validator<str>>> = vec![
			Box::new(MinLengthValidator::new(3)),
			Box::new(MaxLengthValidator::new(20)),
			Box::new(EmailValidator::new()),
		];

		let check = |value: &str| validators.iter().all(|v| v.validate(value).is_ok());
		assert!(check("ann@example.com"));
		assert!(!check("a@b"));
		assert!(!check("someone.with.a.long.name@example.com"));
	}
}
