//! Field transformations
//!
//! Transformations mutate decoded values in place before validation. Each one
//! declares the field kinds it supports; the processor refuses a schema that
//! applies a transformation to a kind it does not support.

use crate::compile::CompiledSchema;
use crate::error::{TransformError, TransformFailure};
use crate::value::{FieldKind, FieldValue};
use formwork_core::SanitizationPolicy;
use formwork_core::security::escape_html;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An in-place mutation of a field value
pub trait Transform: Send + Sync {
	fn supports(&self, kind: FieldKind) -> bool;

	fn apply(&self, value: &mut dyn FieldValue) -> Result<(), TransformFailure>;
}

/// A transformation applied to every text slot of a text field
///
/// # Examples
///
/// ```
/// use formwork_forms::{TextTransform, Transform, TransformFailure};
///
/// let slug = TextTransform::new(|text: &str| {
///     if text.is_ascii() {
///         Ok(text.to_ascii_lowercase().replace(' ', "-"))
///     } else {
///         Err(TransformFailure::new("slug must be ASCII"))
///     }
/// });
///
/// let mut title = String::from("Hello World");
/// slug.apply(&mut title).unwrap();
/// assert_eq!(title, "hello-world");
/// ```
pub struct TextTransform<F> {
	func: F,
}

impl<F> TextTransform<F>
where
	F: Fn(&str) -> Result<String, TransformFailure> + Send + Sync,
{
	pub fn new(func: F) -> Self {
		Self { func }
	}
}

impl<F> Transform for TextTransform<F>
where
	F: Fn(&str) -> Result<String, TransformFailure> + Send + Sync,
{
	fn supports(&self, kind: FieldKind) -> bool {
		kind.is_text()
	}

	fn apply(&self, value: &mut dyn FieldValue) -> Result<(), TransformFailure> {
		for slot in value.texts_mut() {
			*slot = (self.func)(slot)?;
		}
		Ok(())
	}
}

/// Infallible text transformation from a plain function
struct TextFn(fn(&str) -> String);

impl Transform for TextFn {
	fn supports(&self, kind: FieldKind) -> bool {
		kind.is_text()
	}

	fn apply(&self, value: &mut dyn FieldValue) -> Result<(), TransformFailure> {
		for slot in value.texts_mut() {
			*slot = (self.0)(slot);
		}
		Ok(())
	}
}

/// Removes markup the processor's [`SanitizationPolicy`] does not allow
pub struct Sanitize {
	policy: Arc<SanitizationPolicy>,
}

impl Sanitize {
	pub fn new(policy: Arc<SanitizationPolicy>) -> Self {
		Self { policy }
	}
}

impl Transform for Sanitize {
	fn supports(&self, kind: FieldKind) -> bool {
		kind.is_text()
	}

	fn apply(&self, value: &mut dyn FieldValue) -> Result<(), TransformFailure> {
		for slot in value.texts_mut() {
			*slot = self.policy.sanitize(slot);
		}
		Ok(())
	}
}

fn collapse_whitespace(text: &str) -> String {
	text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Named transformations available to schemas
#[derive(Clone, Default)]
pub struct TransformRegistry {
	transforms: HashMap<String, Arc<dyn Transform>>,
}

impl TransformRegistry {
	/// An empty registry
	pub fn new() -> Self {
		Self::default()
	}

	/// Registry holding the built-in transformations:
	///
	/// | name | effect |
	/// |------|--------|
	/// | `trim`, `ltrim`, `rtrim` | strip surrounding whitespace |
	/// | `lowercase`, `uppercase` | case folding |
	/// | `collapse_whitespace` | trim and squeeze inner whitespace runs to one space |
	/// | `escape_html` | escape `& < > " '` |
	/// | `sanitize` | apply `policy` |
	pub fn with_builtins(policy: Arc<SanitizationPolicy>) -> Self {
		let mut registry = Self::new();
		registry.insert("trim", Arc::new(TextFn(|text| text.trim().to_string())));
		registry.insert("ltrim", Arc::new(TextFn(|text| text.trim_start().to_string())));
		registry.insert("rtrim", Arc::new(TextFn(|text| text.trim_end().to_string())));
		registry.insert("lowercase", Arc::new(TextFn(str::to_lowercase)));
		registry.insert("uppercase", Arc::new(TextFn(str::to_uppercase)));
		registry.insert("collapse_whitespace", Arc::new(TextFn(collapse_whitespace)));
		registry.insert("escape_html", Arc::new(TextFn(escape_html)));
		registry.insert("sanitize", Arc::new(Sanitize::new(policy)));
		registry
	}

	/// Registers a transformation, replacing any previous one of that name
	pub fn register(&mut self, name: impl Into<String>, transform: impl Transform + 'static) {
		self.insert(name, Arc::new(transform));
	}

	pub fn insert(&mut self, name: impl Into<String>, transform: Arc<dyn Transform>) {
		self.transforms.insert(name.into(), transform);
	}

	pub fn get(&self, name: &str) -> Option<&Arc<dyn Transform>> {
		self.transforms.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.transforms.contains_key(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.transforms.keys().map(String::as_str)
	}
}

impl fmt::Debug for TransformRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut names: Vec<&str> = self.names().collect();
		names.sort_unstable();
		f.debug_struct("TransformRegistry")
			.field("transforms", &names)
			.finish()
	}
}

/// Runs every declared transformation, field by field in schema order
pub(crate) fn apply<T>(schema: &CompiledSchema<T>, record: &mut T) -> Result<(), TransformError> {
	for field in schema.fields() {
		for (name, transform) in field.transforms() {
			let value = field.descriptor().access().value_mut(record);
			transform
				.apply(value)
				.map_err(|source| TransformError::Field {
					field: field.descriptor().name().to_string(),
					transform: name.clone(),
					source,
				})?;
		}
	}
	Ok(())
}
