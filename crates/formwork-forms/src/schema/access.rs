//! Typed field accessors behind a type-erased interface

use crate::error::CoerceError;
use crate::value::{DecodeValue, FieldKind, FieldValue};
use std::marker::PhantomData;

/// Reads, writes and decodes one field of a `T`
pub(crate) trait FieldAccess<T>: Send + Sync {
	fn kind(&self) -> FieldKind;

	/// Decodes `raw` into the field; a `None` decode keeps the current value
	fn decode_into(&self, record: &mut T, raw: &[String]) -> Result<(), CoerceError>;

	/// Decodes `raw` without touching a record
	fn check_raw(&self, raw: &[String]) -> Result<(), CoerceError>;

	fn value<'a>(&self, record: &'a T) -> &'a dyn FieldValue;

	fn value_mut<'a>(&self, record: &'a mut T) -> &'a mut dyn FieldValue;
}

/// Direct field of the record
pub(crate) struct Accessor<T, V> {
	get: fn(&T) -> &V,
	get_mut: fn(&mut T) -> &mut V,
	_value: PhantomData<fn() -> V>,
}

impl<T, V> Accessor<T, V> {
	pub(crate) fn new(get: fn(&T) -> &V, get_mut: fn(&mut T) -> &mut V) -> Self {
		Self {
			get,
			get_mut,
			_value: PhantomData,
		}
	}
}

impl<T: 'static, V: DecodeValue + 'static> FieldAccess<T> for Accessor<T, V> {
	fn kind(&self) -> FieldKind {
		V::KIND
	}

	fn decode_into(&self, record: &mut T, raw: &[String]) -> Result<(), CoerceError> {
		if let Some(value) = V::decode(raw)? {
			*(self.get_mut)(record) = value;
		}
		Ok(())
	}

	fn check_raw(&self, raw: &[String]) -> Result<(), CoerceError> {
		V::decode(raw).map(|_| ())
	}

	fn value<'a>(&self, record: &'a T) -> &'a dyn FieldValue {
		(self.get)(record)
	}

	fn value_mut<'a>(&self, record: &'a mut T) -> &'a mut dyn FieldValue {
		(self.get_mut)(record)
	}
}

/// Field of a nested record, reached through the parent's accessor
pub(crate) struct Nested<T, U> {
	get: fn(&T) -> &U,
	get_mut: fn(&mut T) -> &mut U,
	inner: Box<dyn FieldAccess<U>>,
}

impl<T, U> Nested<T, U> {
	pub(crate) fn new(
		get: fn(&T) -> &U,
		get_mut: fn(&mut T) -> &mut U,
		inner: Box<dyn FieldAccess<U>>,
	) -> Self {
		Self {
			get,
			get_mut,
			inner,
		}
	}
}

impl<T: 'static, U: 'static> FieldAccess<T> for Nested<T, U> {
	fn kind(&self) -> FieldKind {
		self.inner.kind()
	}

	fn decode_into(&self, record: &mut T, raw: &[String]) -> Result<(), CoerceError> {
		self.inner.decode_into((self.get_mut)(record), raw)
	}

	fn check_raw(&self, raw: &[String]) -> Result<(), CoerceError> {
		self.inner.check_raw(raw)
	}

	fn value<'a>(&self, record: &'a T) -> &'a dyn FieldValue {
		self.inner.value((self.get)(record))
	}

	fn value_mut<'a>(&self, record: &'a mut T) -> &'a mut dyn FieldValue {
		self.inner.value_mut((self.get_mut)(record))
	}
}
