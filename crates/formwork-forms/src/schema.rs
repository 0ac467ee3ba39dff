//! Record schemas
//!
//! A [`FormRecord`] describes its fields once through [`Schema::builder`]:
//! the wire key each field is submitted under, its transformations, its
//! rules, and any record-level checks. The processor compiles the schema the
//! first time the record type is used and reuses it for every request.
//!
//! ```
//! use formwork_forms::{FormRecord, Schema};
//!
//! #[derive(Default)]
//! struct Signup {
//!     name: String,
//!     age: u8,
//!     tags: Vec<String>,
//! }
//!
//! impl FormRecord for Signup {
//!     fn schema() -> Schema<Self> {
//!         Schema::<Self>::builder()
//!             .field("name", |s| &s.name, |s| &mut s.name, |f| {
//!                 f.required().transform("trim").transform("sanitize")
//!             })
//!             .field("age", |s| &s.age, |s| &mut s.age, |f| f.gte(18).lte(130))
//!             .field("tags", |s| &s.tags, |s| &mut s.tags, |f| f.key("tag").max_length(5))
//!             .build()
//!     }
//! }
//!
//! let schema = Signup::schema();
//! assert_eq!(schema.len(), 3);
//! assert_eq!(schema.field("tags").unwrap().spec().wire_key(), "tag");
//! ```

mod access;
pub mod field;
pub mod metadata;

pub use field::{FieldSpec, Rule};
pub use metadata::{CheckMetadata, FieldMetadata, FormMetadata};

use crate::value::{DecodeValue, FieldKind};
use access::{Accessor, FieldAccess, Nested};

/// Field key that record-level check violations are reported under
pub const ALL_FIELDS_KEY: &str = "_all";

/// A record that can be populated from form submissions
pub trait FormRecord: Send + Sized + 'static {
	fn schema() -> Schema<Self>;
}

type CheckFn<T> = Box<dyn Fn(&T) -> Result<(), String> + Send + Sync>;

/// One field of a schema: its declaration plus typed access to the record
pub struct FieldDescriptor<T> {
	spec: FieldSpec,
	access: Box<dyn FieldAccess<T>>,
}

impl<T> FieldDescriptor<T> {
	pub fn spec(&self) -> &FieldSpec {
		&self.spec
	}

	pub fn name(&self) -> &str {
		self.spec.name()
	}

	pub fn kind(&self) -> FieldKind {
		self.access.kind()
	}

	pub(crate) fn access(&self) -> &dyn FieldAccess<T> {
		self.access.as_ref()
	}
}

/// A record-level check
pub struct RecordCheck<T> {
	field: String,
	rule: String,
	check: CheckFn<T>,
}

impl<T> RecordCheck<T> {
	/// Field the violation is reported under, or [`ALL_FIELDS_KEY`]
	pub fn field(&self) -> &str {
		&self.field
	}

	pub fn rule(&self) -> &str {
		&self.rule
	}

	pub(crate) fn run(&self, record: &T) -> Result<(), String> {
		(self.check)(record)
	}
}

/// Ordered field descriptors and checks of a record type
pub struct Schema<T> {
	fields: Vec<FieldDescriptor<T>>,
	checks: Vec<RecordCheck<T>>,
}

impl<T: 'static> Schema<T> {
	pub fn builder() -> SchemaBuilder<T> {
		SchemaBuilder {
			fields: Vec::new(),
			checks: Vec::new(),
		}
	}

	pub fn fields(&self) -> &[FieldDescriptor<T>] {
		&self.fields
	}

	pub fn field(&self, name: &str) -> Option<&FieldDescriptor<T>> {
		self.fields.iter().find(|field| field.name() == name)
	}

	pub fn checks(&self) -> &[RecordCheck<T>] {
		&self.checks
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	/// Serializable description of the schema for client-side rendering
	pub fn metadata(&self) -> FormMetadata {
		FormMetadata::from_schema(self)
	}

	pub(crate) fn into_parts(self) -> (Vec<FieldDescriptor<T>>, Vec<RecordCheck<T>>) {
		(self.fields, self.checks)
	}
}

/// Builder for [`Schema`]
pub struct SchemaBuilder<T> {
	fields: Vec<FieldDescriptor<T>>,
	checks: Vec<RecordCheck<T>>,
}

impl<T: 'static> SchemaBuilder<T> {
	/// Declares a field
	///
	/// `get` and `get_mut` point at the field inside the record; `configure`
	/// receives a [`FieldSpec`] named `name` and returns the finished
	/// declaration.
	pub fn field<V, F>(
		mut self,
		name: &str,
		get: fn(&T) -> &V,
		get_mut: fn(&mut T) -> &mut V,
		configure: F,
	) -> Self
	where
		V: DecodeValue + 'static,
		F: FnOnce(FieldSpec) -> FieldSpec,
	{
		self.fields.push(FieldDescriptor {
			spec: configure(FieldSpec::new(name)),
			access: Box::new(Accessor::new(get, get_mut)),
		});
		self
	}

	/// Flattens the fields and checks of a nested record under `prefix`
	///
	/// A nested field `city` becomes `prefix.city`, submitted under the wire
	/// key `prefix.<key>`.
	pub fn nested<U: FormRecord>(
		mut self,
		prefix: &str,
		get: fn(&T) -> &U,
		get_mut: fn(&mut T) -> &mut U,
	) -> Self {
		let (fields, checks) = U::schema().into_parts();

		for field in fields {
			self.fields.push(FieldDescriptor {
				spec: field.spec.nest_under(prefix),
				access: Box::new(Nested::new(get, get_mut, field.access)),
			});
		}

		for check in checks {
			let field = if check.field == ALL_FIELDS_KEY {
				prefix.to_string()
			} else {
				format!("{prefix}.{}", check.field)
			};
			let inner = check.check;
			self.checks.push(RecordCheck {
				field,
				rule: check.rule,
				check: Box::new(move |record: &T| inner(get(record))),
			});
		}

		self
	}

	/// Adds a record-level check reported under [`ALL_FIELDS_KEY`]
	///
	/// The closure returns the violation message on failure.
	pub fn check<F>(self, rule: &str, check: F) -> Self
	where
		F: Fn(&T) -> Result<(), String> + Send + Sync + 'static,
	{
		self.check_field(ALL_FIELDS_KEY, rule, check)
	}

	/// Adds a record-level check reported under `field`
	pub fn check_field<F>(mut self, field: &str, rule: &str, check: F) -> Self
	where
		F: Fn(&T) -> Result<(), String> + Send + Sync + 'static,
	{
		self.checks.push(RecordCheck {
			field: field.to_string(),
			rule: rule.to_string(),
			check: Box::new(check),
		});
		self
	}

	pub fn build(self) -> Schema<T> {
		Schema {
			fields: self.fields,
			checks: self.checks,
		}
	}
}
