//! Field declarations

use formwork_core::Number;
use serde::Serialize;

/// A built-in or custom validation rule
///
/// `required` is not a rule of its own; it is the
/// [`FieldSpec::required`] flag, checked before any rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", content = "param", rename_all = "snake_case")]
pub enum Rule {
	Gte(Number),
	Lte(Number),
	Gt(Number),
	Lt(Number),
	MinLength(usize),
	MaxLength(usize),
	Email,
	Url,
	Pattern(String),
	OneOf(Vec<String>),
	Custom(String),
}

impl Rule {
	/// Name reported in violations
	pub fn name(&self) -> &str {
		match self {
			Rule::Gte(_) => "gte",
			Rule::Lte(_) => "lte",
			Rule::Gt(_) => "gt",
			Rule::Lt(_) => "lt",
			Rule::MinLength(_) => "min_length",
			Rule::MaxLength(_) => "max_length",
			Rule::Email => "email",
			Rule::Url => "url",
			Rule::Pattern(_) => "pattern",
			Rule::OneOf(_) => "one_of",
			Rule::Custom(name) => name.as_str(),
		}
	}
}

/// Declaration of one record field
///
/// # Examples
///
/// ```
/// use formwork_forms::{FieldSpec, Rule};
///
/// let spec = FieldSpec::new("age")
///     .key("user_age")
///     .required()
///     .gte(18)
///     .lte(130);
///
/// assert_eq!(spec.wire_key(), "user_age");
/// assert!(spec.is_required());
/// assert_eq!(spec.rules().len(), 2);
/// assert_eq!(spec.rules()[0], Rule::Gte(18.into()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
	name: String,
	key: Option<String>,
	required: bool,
	omit_empty: bool,
	transforms: Vec<String>,
	rules: Vec<Rule>,
	default: Option<String>,
}

impl FieldSpec {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			key: None,
			required: false,
			omit_empty: false,
			transforms: Vec::new(),
			rules: Vec::new(),
			default: None,
		}
	}

	/// Wire key the value is submitted under; defaults to the field name
	pub fn key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}

	/// The value must differ from its type's zero value
	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	/// Skip every rule while the value is zero
	pub fn omit_empty(mut self) -> Self {
		self.omit_empty = true;
		self
	}

	/// Raw value decoded when the key is absent from the submission
	pub fn default_value(mut self, raw: impl Into<String>) -> Self {
		self.default = Some(raw.into());
		self
	}

	/// Appends a transformation, applied in declaration order
	pub fn transform(mut self, name: impl Into<String>) -> Self {
		self.transforms.push(name.into());
		self
	}

	pub fn rule(mut self, rule: Rule) -> Self {
		self.rules.push(rule);
		self
	}

	pub fn gte(self, bound: impl Into<Number>) -> Self {
		self.rule(Rule::Gte(bound.into()))
	}

	pub fn lte(self, bound: impl Into<Number>) -> Self {
		self.rule(Rule::Lte(bound.into()))
	}

	pub fn gt(self, bound: impl Into<Number>) -> Self {
		self.rule(Rule::Gt(bound.into()))
	}

	pub fn lt(self, bound: impl Into<Number>) -> Self {
		self.rule(Rule::Lt(bound.into()))
	}

	pub fn min_length(self, length: usize) -> Self {
		self.rule(Rule::MinLength(length))
	}

	pub fn max_length(self, length: usize) -> Self {
		self.rule(Rule::MaxLength(length))
	}

	pub fn email(self) -> Self {
		self.rule(Rule::Email)
	}

	pub fn url(self) -> Self {
		self.rule(Rule::Url)
	}

	pub fn pattern(self, pattern: impl Into<String>) -> Self {
		self.rule(Rule::Pattern(pattern.into()))
	}

	pub fn one_of<I, S>(self, choices: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.rule(Rule::OneOf(choices.into_iter().map(Into::into).collect()))
	}

	/// A rule looked up by name in the processor's rule registry
	pub fn custom(self, name: impl Into<String>) -> Self {
		self.rule(Rule::Custom(name.into()))
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn wire_key(&self) -> &str {
		self.key.as_deref().unwrap_or(&self.name)
	}

	pub fn is_required(&self) -> bool {
		self.required
	}

	pub fn is_omit_empty(&self) -> bool {
		self.omit_empty
	}

	pub fn transforms(&self) -> &[String] {
		&self.transforms
	}

	pub fn rules(&self) -> &[Rule] {
		&self.rules
	}

	pub fn default_raw(&self) -> Option<&String> {
		self.default.as_ref()
	}

	/// Prefixes name and wire key with `prefix.`
	pub(crate) fn nest_under(mut self, prefix: &str) -> Self {
		let key = format!("{prefix}.{}", self.wire_key());
		self.name = format!("{prefix}.{}", self.name);
		self.key = Some(key);
		self
	}
}
