//! Field value kinds and raw-string coercion
//!
//! A record field can be any [`Scalar`] type, an `Option` of one, or a `Vec`
//! of one. [`FieldValue`] is the type-erased view the transformer and the
//! validator work through; [`DecodeValue`] adds coercion from raw submitted
//! strings.

use crate::error::CoerceError;
use formwork_core::Number;
use serde::Serialize;
use std::fmt;

/// Kind of a single value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
	Text,
	Integer,
	Unsigned,
	Float,
	Boolean,
}

impl ScalarKind {
	pub fn is_numeric(self) -> bool {
		matches!(
			self,
			ScalarKind::Integer | ScalarKind::Unsigned | ScalarKind::Float
		)
	}
}

impl fmt::Display for ScalarKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			ScalarKind::Text => "text",
			ScalarKind::Integer => "integer",
			ScalarKind::Unsigned => "unsigned integer",
			ScalarKind::Float => "float",
			ScalarKind::Boolean => "boolean",
		})
	}
}

/// Shape and kind of a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "shape", content = "of", rename_all = "snake_case")]
pub enum FieldKind {
	Scalar(ScalarKind),
	Optional(ScalarKind),
	List(ScalarKind),
}

impl FieldKind {
	pub fn scalar(self) -> ScalarKind {
		match self {
			FieldKind::Scalar(kind) | FieldKind::Optional(kind) | FieldKind::List(kind) => kind,
		}
	}

	/// Whether the field holds text slots
	pub fn is_text(self) -> bool {
		self.scalar() == ScalarKind::Text
	}

	pub fn is_numeric(self) -> bool {
		self.scalar().is_numeric()
	}

	pub fn is_list(self) -> bool {
		matches!(self, FieldKind::List(_))
	}
}

impl fmt::Display for FieldKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FieldKind::Scalar(kind) => write!(f, "{kind}"),
			FieldKind::Optional(kind) => write!(f, "optional {kind}"),
			FieldKind::List(kind) => write!(f, "list of {kind}"),
		}
	}
}

/// Type-erased access to a field value
pub trait FieldValue: Send + Sync {
	fn kind(&self) -> FieldKind;

	/// `true` for the type's zero value: empty string, `0`, `false`, `None`,
	/// empty list
	fn is_zero(&self) -> bool;

	/// Every numeric slot of the value
	fn numbers(&self) -> Vec<Number>;

	/// Every text slot of the value
	fn texts(&self) -> Vec<&str>;

	fn texts_mut(&mut self) -> Vec<&mut String>;

	/// Characters of a text value, items of a list; `None` otherwise
	fn length(&self) -> Option<usize>;
}

/// A field value that can be decoded from raw submitted strings
pub trait DecodeValue: FieldValue + Sized {
	const KIND: FieldKind;

	/// Decodes every value submitted for the field's key, in order.
	///
	/// `Ok(None)` means the current value is kept.
	fn decode(raw: &[String]) -> Result<Option<Self>, CoerceError>;
}

/// A single value a field, an `Option` or a `Vec` can hold
pub trait Scalar: Sized + Send + Sync + 'static {
	const KIND: ScalarKind;

	fn parse_raw(raw: &str) -> Result<Self, CoerceError>;

	fn is_zero_value(&self) -> bool;

	fn as_number(&self) -> Option<Number> {
		None
	}

	fn as_text(&self) -> Option<&str> {
		None
	}

	fn as_text_mut(&mut self) -> Option<&mut String> {
		None
	}
}

impl Scalar for String {
	const KIND: ScalarKind = ScalarKind::Text;

	fn parse_raw(raw: &str) -> Result<Self, CoerceError> {
		Ok(raw.to_string())
	}

	fn is_zero_value(&self) -> bool {
		self.is_empty()
	}

	fn as_text(&self) -> Option<&str> {
		Some(self)
	}

	fn as_text_mut(&mut self) -> Option<&mut String> {
		Some(self)
	}
}

impl Scalar for bool {
	const KIND: ScalarKind = ScalarKind::Boolean;

	fn parse_raw(raw: &str) -> Result<Self, CoerceError> {
		match raw.to_ascii_lowercase().as_str() {
			"true" | "1" | "on" => Ok(true),
			"false" | "0" | "off" => Ok(false),
			_ => Err(CoerceError::InvalidBool {
				value: raw.to_string(),
			}),
		}
	}

	fn is_zero_value(&self) -> bool {
		!*self
	}
}

macro_rules! integer_scalar {
	($kind:ident => $($ty:ty),+) => {
		$(
			impl Scalar for $ty {
				const KIND: ScalarKind = ScalarKind::$kind;

				fn parse_raw(raw: &str) -> Result<Self, CoerceError> {
					raw.parse::<$ty>().map_err(|source| CoerceError::InvalidInteger {
						value: raw.to_string(),
						source,
					})
				}

				fn is_zero_value(&self) -> bool {
					*self == 0
				}

				fn as_number(&self) -> Option<Number> {
					Some(Number::from(*self))
				}
			}
		)+
	};
}

integer_scalar!(Integer => i8, i16, i32, i64);
integer_scalar!(Unsigned => u8, u16, u32, u64);

macro_rules! float_scalar {
	($($ty:ty),+) => {
		$(
			impl Scalar for $ty {
				const KIND: ScalarKind = ScalarKind::Float;

				fn parse_raw(raw: &str) -> Result<Self, CoerceError> {
					match raw.parse::<$ty>() {
						Ok(value) if value.is_finite() => Ok(value),
						_ => Err(CoerceError::InvalidFloat {
							value: raw.to_string(),
						}),
					}
				}

				fn is_zero_value(&self) -> bool {
					*self == 0.0
				}

				fn as_number(&self) -> Option<Number> {
					Some(Number::from(*self))
				}
			}
		)+
	};
}

float_scalar!(f32, f64);

fn count_chars(text: &str) -> usize {
	text.chars().count()
}

// Option<S> and Vec<S> get generic impls; the plain scalars are listed
// explicitly so the three families never overlap.
macro_rules! scalar_field_value {
	($($ty:ty),+) => {
		$(
			impl FieldValue for $ty {
				fn kind(&self) -> FieldKind {
					FieldKind::Scalar(<$ty as Scalar>::KIND)
				}

				fn is_zero(&self) -> bool {
					self.is_zero_value()
				}

				fn numbers(&self) -> Vec<Number> {
					self.as_number().into_iter().collect()
				}

				fn texts(&self) -> Vec<&str> {
					self.as_text().into_iter().collect()
				}

				fn texts_mut(&mut self) -> Vec<&mut String> {
					self.as_text_mut().into_iter().collect()
				}

				fn length(&self) -> Option<usize> {
					self.as_text().map(count_chars)
				}
			}

			impl DecodeValue for $ty {
				const KIND: FieldKind = FieldKind::Scalar(<$ty as Scalar>::KIND);

				fn decode(raw: &[String]) -> Result<Option<Self>, CoerceError> {
					let Some(last) = raw.last() else {
						return Ok(None);
					};
					if last.is_empty() && <$ty as Scalar>::KIND != ScalarKind::Text {
						return Ok(None);
					}
					<$ty as Scalar>::parse_raw(last).map(Some)
				}
			}
		)+
	};
}

scalar_field_value!(String, bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl<S: Scalar> FieldValue for Option<S> {
	fn kind(&self) -> FieldKind {
		FieldKind::Optional(S::KIND)
	}

	fn is_zero(&self) -> bool {
		self.is_none()
	}

	fn numbers(&self) -> Vec<Number> {
		self.as_ref().and_then(Scalar::as_number).into_iter().collect()
	}

	fn texts(&self) -> Vec<&str> {
		self.as_ref().and_then(Scalar::as_text).into_iter().collect()
	}

	fn texts_mut(&mut self) -> Vec<&mut String> {
		self.as_mut().and_then(Scalar::as_text_mut).into_iter().collect()
	}

	fn length(&self) -> Option<usize> {
		self.as_ref().and_then(Scalar::as_text).map(count_chars)
	}
}

impl<S: Scalar> DecodeValue for Option<S> {
	const KIND: FieldKind = FieldKind::Optional(S::KIND);

	fn decode(raw: &[String]) -> Result<Option<Self>, CoerceError> {
		let Some(last) = raw.last() else {
			return Ok(None);
		};
		if last.is_empty() && S::KIND != ScalarKind::Text {
			return Ok(Some(None));
		}
		S::parse_raw(last).map(|value| Some(Some(value)))
	}
}

impl<S: Scalar> FieldValue for Vec<S> {
	fn kind(&self) -> FieldKind {
		FieldKind::List(S::KIND)
	}

	fn is_zero(&self) -> bool {
		self.is_empty()
	}

	fn numbers(&self) -> Vec<Number> {
		self.iter().filter_map(Scalar::as_number).collect()
	}

	fn texts(&self) -> Vec<&str> {
		self.iter().filter_map(Scalar::as_text).collect()
	}

	fn texts_mut(&mut self) -> Vec<&mut String> {
		self.iter_mut().filter_map(Scalar::as_text_mut).collect()
	}

	fn length(&self) -> Option<usize> {
		Some(self.len())
	}
}

impl<S: Scalar> DecodeValue for Vec<S> {
	const KIND: FieldKind = FieldKind::List(S::KIND);

	fn decode(raw: &[String]) -> Result<Option<Self>, CoerceError> {
		raw.iter()
			.filter(|item| S::KIND == ScalarKind::Text || !item.is_empty())
			.map(|item| S::parse_raw(item))
			.collect::<Result<Vec<_>, _>>()
			.map(Some)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn raw(values: &[&str]) -> Vec<String> {
		values.iter().map(|value| value.to_string()).collect()
	}

	#[rstest]
	#[case(&["1", "2", "3"], Some(3))]
	#[case(&["7", ""], None)]
	#[case(&["+12"], Some(12))]
	fn test_integer_takes_last_value(#[case] values: &[&str], #[case] expected: Option<i32>) {
		assert_eq!(i32::decode(&raw(values)).unwrap(), expected);
	}

	#[rstest]
	#[case("abc")]
	#[case("1.5")]
	#[case(" 4")]
	#[case("300")]
	fn test_u8_rejects_invalid_or_out_of_range(#[case] value: &str) {
		assert!(matches!(
			u8::decode(&raw(&[value])),
			Err(CoerceError::InvalidInteger { .. })
		));
	}

	#[test]
	fn test_negative_for_unsigned_is_rejected() {
		assert!(u32::decode(&raw(&["-1"])).is_err());
	}

	#[rstest]
	#[case("true", true)]
	#[case("FALSE", false)]
	#[case("1", true)]
	#[case("0", false)]
	#[case("On", true)]
	#[case("off", false)]
	fn test_bool_spellings(#[case] value: &str, #[case] expected: bool) {
		assert_eq!(bool::decode(&raw(&[value])).unwrap(), Some(expected));
	}

	#[test]
	fn test_bool_rejects_other_words() {
		assert_eq!(
			bool::decode(&raw(&["yes"])),
			Err(CoerceError::InvalidBool {
				value: "yes".to_string()
			})
		);
	}

	#[rstest]
	#[case("NaN")]
	#[case("inf")]
	#[case("-infinity")]
	#[case("1e400")]
	#[case("one")]
	fn test_float_must_be_finite(#[case] value: &str) {
		assert!(matches!(
			f64::decode(&raw(&[value])),
			Err(CoerceError::InvalidFloat { .. })
		));
	}

	#[test]
	fn test_text_keeps_empty_strings() {
		assert_eq!(String::decode(&raw(&["x", ""])).unwrap(), Some(String::new()));
		assert_eq!(
			Option::<String>::decode(&raw(&[""])).unwrap(),
			Some(Some(String::new()))
		);
	}

	#[test]
	fn test_optional_number_empty_becomes_none() {
		assert_eq!(Option::<i64>::decode(&raw(&[""])).unwrap(), Some(None));
		assert_eq!(Option::<i64>::decode(&raw(&["-5"])).unwrap(), Some(Some(-5)));
	}

	#[test]
	fn test_list_skips_empty_non_text_items() {
		assert_eq!(
			Vec::<u16>::decode(&raw(&["1", "", "3"])).unwrap(),
			Some(vec![1, 3])
		);
		assert_eq!(
			Vec::<String>::decode(&raw(&["a", ""])).unwrap(),
			Some(vec!["a".to_string(), String::new()])
		);
		assert!(Vec::<u16>::decode(&raw(&["1", "x"])).is_err());
	}

	#[rstest]
	#[case(String::new().is_zero(), true)]
	#[case(0_u8.is_zero(), true)]
	#[case(0.0_f32.is_zero(), true)]
	#[case(false.is_zero(), true)]
	#[case(None::<i32>.is_zero(), true)]
	#[case(Vec::<String>::new().is_zero(), true)]
	#[case("x".to_string().is_zero(), false)]
	#[case((-1_i8).is_zero(), false)]
	#[case(Some(0_i32).is_zero(), false)]
	fn test_zero_values(#[case] is_zero: bool, #[case] expected: bool) {
		assert_eq!(is_zero, expected);
	}

	#[test]
	fn test_text_slots() {
		let mut tags = vec!["a".to_string(), "bc".to_string()];
		assert_eq!(tags.texts(), vec!["a", "bc"]);
		assert_eq!(tags.length(), Some(2));
		for slot in tags.texts_mut() {
			slot.push('!');
		}
		assert_eq!(tags, vec!["a!", "bc!"]);

		let mut nickname: Option<String> = None;
		assert!(nickname.texts_mut().is_empty());
		assert_eq!("héllo".to_string().length(), Some(5));
		assert_eq!(7_u8.length(), None);
	}

	#[test]
	fn test_numbers_are_widened() {
		assert_eq!(250_u8.numbers(), vec![Number::Uint(250)]);
		assert_eq!(Some(-3_i16).numbers(), vec![Number::Int(-3)]);
		assert_eq!(vec![1.5_f32, 2.0].numbers().len(), 2);
		assert!(None::<f64>.numbers().is_empty());
	}

	#[rstest]
	#[case(FieldKind::Scalar(ScalarKind::Text), "text")]
	#[case(FieldKind::Optional(ScalarKind::Integer), "optional integer")]
	#[case(FieldKind::List(ScalarKind::Unsigned), "list of unsigned integer")]
	fn test_kind_display(#[case] kind: FieldKind, #[case] expected: &str) {
		assert_eq!(kind.to_string(), expected);
	}
}
