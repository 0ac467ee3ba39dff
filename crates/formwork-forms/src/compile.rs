//! Schema compilation and caching
//!
//! Compiling resolves transformation and rule names against the processor's
//! registries and checks every declaration once, so requests never meet a
//! misconfigured schema halfway through the pipeline.

use crate::error::ConfigurationError;
use crate::schema::{FieldDescriptor, FormRecord, RecordCheck};
use crate::transform::{Transform, TransformRegistry};
use crate::validate::{CompiledRule, RuleRegistry};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub(crate) struct CompiledField<T> {
	descriptor: FieldDescriptor<T>,
	transforms: Vec<(String, Arc<dyn Transform>)>,
	rules: Vec<CompiledRule>,
}

impl<T> CompiledField<T> {
	pub(crate) fn descriptor(&self) -> &FieldDescriptor<T> {
		&self.descriptor
	}

	pub(crate) fn transforms(&self) -> &[(String, Arc<dyn Transform>)] {
		&self.transforms
	}

	pub(crate) fn rules(&self) -> &[CompiledRule] {
		&self.rules
	}
}

pub(crate) struct CompiledSchema<T> {
	fields: Vec<CompiledField<T>>,
	checks: Vec<RecordCheck<T>>,
	keys: HashSet<String>,
}

impl<T: FormRecord> CompiledSchema<T> {
	pub(crate) fn compile(
		transforms: &TransformRegistry,
		rules: &RuleRegistry,
	) -> Result<Self, ConfigurationError> {
		let (descriptors, checks) = T::schema().into_parts();
		let mut keys = HashSet::with_capacity(descriptors.len());
		let mut fields = Vec::with_capacity(descriptors.len());

		for (position, descriptor) in descriptors.into_iter().enumerate() {
			let spec = descriptor.spec();
			let name = spec.name();
			let kind = descriptor.kind();

			if name.is_empty() || spec.wire_key().is_empty() {
				return Err(ConfigurationError::EmptyName(position));
			}
			if !keys.insert(spec.wire_key().to_string()) {
				return Err(ConfigurationError::DuplicateKey {
					key: spec.wire_key().to_string(),
				});
			}
			if let Some(default) = spec.default_raw() {
				descriptor
					.access()
					.check_raw(std::slice::from_ref(default))
					.map_err(|source| ConfigurationError::InvalidDefault {
						field: name.to_string(),
						source,
					})?;
			}

			let field_transforms = spec
				.transforms()
				.iter()
				.map(|transform_name| {
					let transform = transforms.get(transform_name).ok_or_else(|| {
						ConfigurationError::UnknownTransformation {
							field: name.to_string(),
							transform: transform_name.clone(),
						}
					})?;
					if !transform.supports(kind) {
						return Err(ConfigurationError::UnsupportedTransformation {
							field: name.to_string(),
							transform: transform_name.clone(),
							kind,
						});
					}
					Ok((transform_name.clone(), Arc::clone(transform)))
				})
				.collect::<Result<Vec<_>, _>>()?;

			let field_rules = spec
				.rules()
				.iter()
				.map(|rule| CompiledRule::compile(name, kind, rule, rules))
				.collect::<Result<Vec<_>, _>>()?;

			fields.push(CompiledField {
				descriptor,
				transforms: field_transforms,
				rules: field_rules,
			});
		}

		for check in &checks {
			let target = check.field();
			let known = target == crate::schema::ALL_FIELDS_KEY
				|| fields.iter().any(|field| {
					let field_name = field.descriptor.name();
					// Checks of a nested record report under its prefix
					field_name == target
						|| field_name
							.strip_prefix(target)
							.is_some_and(|rest| rest.starts_with('.'))
				});
			if !known {
				return Err(ConfigurationError::UnknownField {
					field: target.to_string(),
					rule: check.rule().to_string(),
				});
			}
		}

		Ok(Self {
			fields,
			checks,
			keys,
		})
	}
}

impl<T> CompiledSchema<T> {
	pub(crate) fn fields(&self) -> &[CompiledField<T>] {
		&self.fields
	}

	pub(crate) fn checks(&self) -> &[RecordCheck<T>] {
		&self.checks
	}

	pub(crate) fn knows_key(&self, key: &str) -> bool {
		self.keys.contains(key)
	}
}

type Entry<T> = Result<Arc<CompiledSchema<T>>, ConfigurationError>;

/// Compiled schemas by record type
///
/// Failed compilations are cached as well; a broken schema is reported the
/// same way on every request without being recompiled.
#[derive(Default)]
pub(crate) struct SchemaCache {
	entries: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl SchemaCache {
	pub(crate) fn get_or_compile<T, F>(&self, compile: F) -> Entry<T>
	where
		T: FormRecord,
		F: FnOnce() -> Result<CompiledSchema<T>, ConfigurationError>,
	{
		if let Some(entry) = self.lookup::<T>() {
			return entry;
		}

		let fresh: Arc<Entry<T>> = Arc::new(compile().map(Arc::new));
		self.entries
			.write()
			.entry(TypeId::of::<T>())
			.or_insert_with(|| Arc::clone(&fresh) as Arc<dyn Any + Send + Sync>);

		// Another thread may have stored its entry first; adopt it.
		self.lookup::<T>().unwrap_or_else(|| (*fresh).clone())
	}

	fn lookup<T: FormRecord>(&self) -> Option<Entry<T>> {
		let entry = self.entries.read().get(&TypeId::of::<T>()).cloned()?;
		entry
			.downcast::<Entry<T>>()
			.ok()
			.map(|entry| (*entry).clone())
	}

	pub(crate) fn len(&self) -> usize {
		self.entries.read().len()
	}
}
