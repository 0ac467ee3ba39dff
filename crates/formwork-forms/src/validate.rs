//! Validation rules
//!
//! Every field's rules and every record-level check are evaluated; all
//! violations are reported together in schema order.

use crate::compile::CompiledSchema;
use crate::error::{ConfigurationError, ValidationError, Violation, Violations};
use crate::schema::Rule;
use crate::value::{FieldKind, FieldValue};
use formwork_core::validators::{
	ChoiceValidator, EmailValidator, MaxLengthValidator, MaxValueValidator, MinLengthValidator,
	MinValueValidator, RegexValidator, UrlValidator, Validator,
};
use formwork_core::{Number, ValidationResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Name violations of the `required` flag are reported under
pub const REQUIRED_RULE: &str = "required";

const REQUIRED_MESSAGE: &str = "This field is required.";

/// An application-defined rule referenced by name from a schema
pub trait CustomRule: Send + Sync {
	fn supports(&self, kind: FieldKind) -> bool;

	/// Returns the violation message on failure
	fn check(&self, value: &dyn FieldValue) -> Result<(), String>;
}

/// A [`CustomRule`] built from a kind filter and a closure
///
/// # Examples
///
/// ```
/// use formwork_forms::{CustomRule, FieldKind, FieldValue, RuleFn};
///
/// let even = RuleFn::new(FieldKind::is_numeric, |value: &dyn FieldValue| {
///     if value.numbers().iter().all(|n| n.as_f64() % 2.0 == 0.0) {
///         Ok(())
///     } else {
///         Err("Enter an even number.".to_string())
///     }
/// });
///
/// assert!(even.check(&4_u32).is_ok());
/// assert!(even.check(&5_u32).is_err());
/// ```
pub struct RuleFn<F> {
	supports: fn(FieldKind) -> bool,
	check: F,
}

impl<F> RuleFn<F>
where
	F: Fn(&dyn FieldValue) -> Result<(), String> + Send + Sync,
{
	pub fn new(supports: fn(FieldKind) -> bool, check: F) -> Self {
		Self { supports, check }
	}
}

impl<F> CustomRule for RuleFn<F>
where
	F: Fn(&dyn FieldValue) -> Result<(), String> + Send + Sync,
{
	fn supports(&self, kind: FieldKind) -> bool {
		(self.supports)(kind)
	}

	fn check(&self, value: &dyn FieldValue) -> Result<(), String> {
		(self.check)(value)
	}
}

/// Named custom rules available to schemas
#[derive(Clone, Default)]
pub struct RuleRegistry {
	rules: HashMap<String, Arc<dyn CustomRule>>,
}

impl RuleRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, name: impl Into<String>, rule: impl CustomRule + 'static) {
		self.insert(name, Arc::new(rule));
	}

	pub fn insert(&mut self, name: impl Into<String>, rule: Arc<dyn CustomRule>) {
		self.rules.insert(name.into(), rule);
	}

	pub fn get(&self, name: &str) -> Option<&Arc<dyn CustomRule>> {
		self.rules.get(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.rules.keys().map(String::as_str)
	}
}

impl fmt::Debug for RuleRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut names: Vec<&str> = self.names().collect();
		names.sort_unstable();
		f.debug_struct("RuleRegistry").field("rules", &names).finish()
	}
}

enum Check {
	Min(MinValueValidator<Number>),
	Max(MaxValueValidator<Number>),
	MinLength(MinLengthValidator),
	MaxLength(MaxLengthValidator),
	Email(EmailValidator),
	Url(UrlValidator),
	Pattern(RegexValidator),
	OneOf(ChoiceValidator),
	Custom(Arc<dyn CustomRule>),
}

/// A rule resolved against the registries, ready to evaluate
pub(crate) struct CompiledRule {
	name: String,
	check: Check,
}

impl CompiledRule {
	/// Resolves `rule` for a field of `kind`
	pub(crate) fn compile(
		field: &str,
		kind: FieldKind,
		rule: &Rule,
		registry: &RuleRegistry,
	) -> Result<Self, ConfigurationError> {
		let unsupported = || ConfigurationError::UnsupportedRule {
			field: field.to_string(),
			rule: rule.name().to_string(),
			kind,
		};

		let check = match rule {
			Rule::Gte(_) | Rule::Lte(_) | Rule::Gt(_) | Rule::Lt(_) if !kind.is_numeric() => {
				return Err(unsupported());
			}
			Rule::MinLength(_) | Rule::MaxLength(_) if !(kind.is_text() || kind.is_list()) => {
				return Err(unsupported());
			}
			Rule::Email | Rule::Url | Rule::Pattern(_) | Rule::OneOf(_) if !kind.is_text() => {
				return Err(unsupported());
			}
			Rule::Gte(bound) | Rule::Lte(bound) | Rule::Gt(bound) | Rule::Lt(bound)
				if !bound.is_finite() =>
			{
				return Err(ConfigurationError::NonFiniteBound {
					field: field.to_string(),
					rule: rule.name().to_string(),
				});
			}
			Rule::Gte(bound) => Check::Min(MinValueValidator::new(*bound)),
			Rule::Gt(bound) => Check::Min(MinValueValidator::new(*bound).exclusive()),
			Rule::Lte(bound) => Check::Max(MaxValueValidator::new(*bound)),
			Rule::Lt(bound) => Check::Max(MaxValueValidator::new(*bound).exclusive()),
			Rule::MinLength(length) => Check::MinLength(MinLengthValidator::new(*length)),
			Rule::MaxLength(length) => Check::MaxLength(MaxLengthValidator::new(*length)),
			Rule::Email => Check::Email(EmailValidator::new()),
			Rule::Url => Check::Url(UrlValidator::new()),
			Rule::Pattern(pattern) => {
				let validator = RegexValidator::new(pattern).map_err(|source| {
					ConfigurationError::InvalidPattern {
						field: field.to_string(),
						source,
					}
				})?;
				Check::Pattern(validator.with_message("Enter a valid value."))
			}
			Rule::OneOf(choices) => Check::OneOf(ChoiceValidator::new(choices.iter().cloned())),
			Rule::Custom(name) => {
				let custom = registry
					.get(name)
					.ok_or_else(|| ConfigurationError::UnknownRule {
						field: field.to_string(),
						rule: name.clone(),
					})?;
				if !custom.supports(kind) {
					return Err(unsupported());
				}
				Check::Custom(Arc::clone(custom))
			}
		};

		Ok(Self {
			name: rule.name().to_string(),
			check,
		})
	}

	pub(crate) fn name(&self) -> &str {
		&self.name
	}

	/// Checks every slot of `value`; the first failing slot sets the message
	pub(crate) fn evaluate(&self, value: &dyn FieldValue) -> Result<(), String> {
		let result = match &self.check {
			Check::Min(validator) => each(&value.numbers(), |n| validator.validate(n)),
			Check::Max(validator) => each(&value.numbers(), |n| validator.validate(n)),
			Check::MinLength(validator) => match value.kind() {
				FieldKind::List(_) => validator.validate_count(value.length().unwrap_or_default()),
				_ => each(&value.texts(), |text| validator.validate(*text)),
			},
			Check::MaxLength(validator) => match value.kind() {
				FieldKind::List(_) => validator.validate_count(value.length().unwrap_or_default()),
				_ => each(&value.texts(), |text| validator.validate(*text)),
			},
			Check::Email(validator) => each(&value.texts(), |text| validator.validate(*text)),
			Check::Url(validator) => each(&value.texts(), |text| validator.validate(*text)),
			Check::Pattern(validator) => each(&value.texts(), |text| validator.validate(*text)),
			Check::OneOf(validator) => each(&value.texts(), |text| validator.validate(*text)),
			Check::Custom(rule) => return rule.check(value),
		};
		result.map_err(|error| error.to_string())
	}
}

fn each<S>(slots: &[S], check: impl Fn(&S) -> ValidationResult<()>) -> ValidationResult<()> {
	slots.iter().try_for_each(check)
}

/// Evaluates every field rule and record check
pub(crate) fn validate<T>(schema: &CompiledSchema<T>, record: &T) -> Result<(), ValidationError> {
	let mut violations = Violations::new();

	for field in schema.fields() {
		let descriptor = field.descriptor();
		let spec = descriptor.spec();
		let value = descriptor.access().value(record);

		if value.is_zero() {
			if spec.is_required() {
				// Nothing else is meaningful for a missing value
				violations.push(Violation::new(descriptor.name(), REQUIRED_RULE, REQUIRED_MESSAGE));
				continue;
			}
			if spec.is_omit_empty() {
				continue;
			}
		}

		for rule in field.rules() {
			if let Err(message) = rule.evaluate(value) {
				violations.push(Violation::new(descriptor.name(), rule.name(), message));
			}
		}
	}

	for check in schema.checks() {
		if let Err(message) = check.run(record) {
			violations.push(Violation::new(check.field(), check.rule(), message));
		}
	}

	if violations.is_empty() {
		Ok(())
	} else {
		Err(ValidationError::Failed(violations))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ErrorKind;
	use crate::value::ScalarKind;
	use rstest::rstest;

	const TEXT: FieldKind = FieldKind::Scalar(ScalarKind::Text);
	const INTEGER: FieldKind = FieldKind::Scalar(ScalarKind::Integer);

	fn compiled(kind: FieldKind, rule: Rule) -> CompiledRule {
		CompiledRule::compile("field", kind, &rule, &RuleRegistry::new()).unwrap()
	}

	#[rstest]
	#[case(Rule::Gte(0.into()), 0, true)]
	#[case(Rule::Gte(0.into()), -1, false)]
	#[case(Rule::Gt(0.into()), 0, false)]
	#[case(Rule::Lte(100.into()), 100, true)]
	#[case(Rule::Lte(100.into()), 150, false)]
	#[case(Rule::Lt(100.into()), 99, true)]
	fn test_numeric_bounds(#[case] rule: Rule, #[case] value: i64, #[case] valid: bool) {
		assert_eq!(compiled(INTEGER, rule).evaluate(&value).is_ok(), valid);
	}

	#[test]
	fn test_bound_message() {
		let rule = compiled(INTEGER, Rule::Lte(100.into()));
		assert_eq!(
			rule.evaluate(&150_i32),
			Err("Ensure this value is less than or equal to 100.".to_string())
		);
	}

	#[test]
	fn test_rules_pass_on_absent_optional() {
		let rule = compiled(FieldKind::Optional(ScalarKind::Integer), Rule::Gte(10.into()));
		assert!(rule.evaluate(&None::<i32>).is_ok());
		assert!(rule.evaluate(&Some(3_i32)).is_err());

		let rule = compiled(FieldKind::Optional(ScalarKind::Text), Rule::Email);
		assert!(rule.evaluate(&None::<String>).is_ok());
	}

	#[test]
	fn test_length_counts_items_for_lists() {
		let rule = compiled(FieldKind::List(ScalarKind::Text), Rule::MaxLength(2));
		assert!(rule.evaluate(&vec!["long value".to_string(), "x".to_string()]).is_ok());
		assert!(
			rule.evaluate(&vec!["a".to_string(), "b".to_string(), "c".to_string()])
				.is_err()
		);
	}

	#[test]
	fn test_text_rules_check_each_list_item() {
		let rule = compiled(FieldKind::List(ScalarKind::Text), Rule::Email);
		let emails = vec!["a@example.com".to_string(), "nope".to_string()];
		assert_eq!(rule.evaluate(&emails), Err("Enter a valid email address.".to_string()));
	}

	#[rstest]
	#[case(TEXT, Rule::Gte(1.into()))]
	#[case(INTEGER, Rule::MinLength(1))]
	#[case(INTEGER, Rule::Email)]
	#[case(FieldKind::List(ScalarKind::Integer), Rule::Pattern("x".to_string()))]
	#[case(FieldKind::Scalar(ScalarKind::Boolean), Rule::OneOf(vec!["a".to_string()]))]
	fn test_unsupported_rule_kinds(#[case] kind: FieldKind, #[case] rule: Rule) {
		assert!(matches!(
			CompiledRule::compile("field", kind, &rule, &RuleRegistry::new()),
			Err(ConfigurationError::UnsupportedRule { .. })
		));
	}

	#[rstest]
	#[case(Rule::Gte(f64::NAN.into()))]
	#[case(Rule::Lte(f64::INFINITY.into()))]
	#[case(Rule::Lt(f32::NEG_INFINITY.into()))]
	fn test_non_finite_bounds_are_rejected(#[case] rule: Rule) {
		let error = CompiledRule::compile("price", INTEGER, &rule, &RuleRegistry::new())
			.err()
			.unwrap();
		assert!(matches!(
			error,
			ConfigurationError::NonFiniteBound { ref field, .. } if field == "price"
		));
		assert_eq!(error.stage(), ErrorKind::Validating);
	}

	#[test]
	fn test_bound_beyond_f64_precision() {
		let rule = compiled(INTEGER, Rule::Lte(9_007_199_254_740_992.0_f64.into()));
		assert!(rule.evaluate(&9_007_199_254_740_992_i64).is_ok());
		assert!(rule.evaluate(&9_007_199_254_740_993_i64).is_err());
	}

	#[test]
	fn test_invalid_pattern() {
		assert!(matches!(
			CompiledRule::compile(
				"code",
				TEXT,
				&Rule::Pattern("(".to_string()),
				&RuleRegistry::new()
			),
			Err(ConfigurationError::InvalidPattern { .. })
		));
	}

	#[test]
	fn test_custom_rule_resolution() {
		let mut registry = RuleRegistry::new();
		registry.register(
			"even",
			RuleFn::new(FieldKind::is_numeric, |value: &dyn FieldValue| {
				if value.numbers().iter().all(|n| n.as_f64() % 2.0 == 0.0) {
					Ok(())
				} else {
					Err("Enter an even number.".to_string())
				}
			}),
		);

		let rule = CompiledRule::compile("n", INTEGER, &Rule::Custom("even".to_string()), &registry)
			.unwrap();
		assert_eq!(rule.name(), "even");
		assert!(rule.evaluate(&4_i64).is_ok());
		assert_eq!(rule.evaluate(&5_i64), Err("Enter an even number.".to_string()));

		assert!(matches!(
			CompiledRule::compile("n", TEXT, &Rule::Custom("even".to_string()), &registry),
			Err(ConfigurationError::UnsupportedRule { .. })
		));
		assert!(matches!(
			CompiledRule::compile("n", INTEGER, &Rule::Custom("odd".to_string()), &registry),
			Err(ConfigurationError::UnknownRule { .. })
		));
	}

	#[test]
	fn test_pattern_and_choices() {
		let pattern = compiled(TEXT, Rule::Pattern(r"^[A-Z]{3}$".to_string()));
		assert!(pattern.evaluate(&"ABC".to_string()).is_ok());
		assert_eq!(
			pattern.evaluate(&"abc".to_string()),
			Err("Enter a valid value.".to_string())
		);

		let choice = compiled(TEXT, Rule::OneOf(vec!["red".to_string(), "green".to_string()]));
		assert!(choice.evaluate(&"green".to_string()).is_ok());
		assert!(choice.evaluate(&"blue".to_string()).is_err());
	}
}
