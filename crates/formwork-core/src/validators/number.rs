//! Numeric values as seen by validators
//!
//! Form fields can hold any integer width or a float. [`Number`] carries the
//! value without narrowing it, and compares across representations so a bound
//! declared as `0` applies to a `u8`, an `i64` or an `f32` field alike.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum Number {
	Int(i64),
	Uint(u64),
	Float(f64),
}

impl Number {
	pub fn as_f64(self) -> f64 {
		match self {
			Number::Int(v) => v as f64,
			Number::Uint(v) => v as f64,
			Number::Float(v) => v,
		}
	}

	pub fn is_finite(self) -> bool {
		match self {
			Number::Float(v) => v.is_finite(),
			Number::Int(_) | Number::Uint(_) => true,
		}
	}

	fn as_i128(self) -> Option<i128> {
		match self {
			Number::Int(v) => Some(i128::from(v)),
			Number::Uint(v) => Some(i128::from(v)),
			Number::Float(_) => None,
		}
	}
}

impl PartialOrd for Number {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		match (self.as_i128(), other.as_i128()) {
			(Some(a), Some(b)) => Some(a.cmp(&b)),
			(Some(a), None) => cmp_int_float(a, other.as_f64()),
			(None, Some(b)) => cmp_int_float(b, self.as_f64()).map(Ordering::reverse),
			(None, None) => self.as_f64().partial_cmp(&other.as_f64()),
		}
	}
}

const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// Orders an integer against a float without rounding the integer
fn cmp_int_float(int: i128, float: f64) -> Option<Ordering> {
	if float.is_nan() {
		return None;
	}
	// Every i64 and u64 lies in [-2^63, 2^64).
	if float >= TWO_POW_64 {
		return Some(Ordering::Less);
	}
	if float < -TWO_POW_63 {
		return Some(Ordering::Greater);
	}
	let whole = float.trunc();
	let fraction = if float > whole {
		Ordering::Less
	} else if float < whole {
		Ordering::Greater
	} else {
		Ordering::Equal
	};
	Some(int.cmp(&(whole as i128)).then(fraction))
}

impl PartialEq for Number {
	fn eq(&self, other: &Self) -> bool {
		self.partial_cmp(other) == Some(Ordering::Equal)
	}
}

impl fmt::Display for Number {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Number::Int(v) => write!(f, "{v}"),
			Number::Uint(v) => write!(f, "{v}"),
			Number::Float(v) => write!(f, "{v}"),
		}
	}
}

macro_rules! number_from {
	($variant:ident => $($ty:ty),+) => {
		$(
			impl From<$ty> for Number {
				fn from(value: $ty) -> Self {
					Number::$variant(value.into())
				}
			}
		)+
	};
}

number_from!(Int => i8, i16, i32, i64);
number_from!(Uint => u8, u16, u32, u64);
number_from!(Float => f32, f64);

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	const TWO_POW_53: i64 = 1 << 53;

	#[rstest]
	#[case(Number::Int(-1), Number::Uint(0), Ordering::Less)]
	#[case(Number::Uint(u64::MAX), Number::Int(i64::MAX), Ordering::Greater)]
	#[case(Number::Int(100), Number::Float(100.0), Ordering::Equal)]
	#[case(Number::Float(0.5), Number::Uint(1), Ordering::Less)]
	#[case(Number::Int(7), Number::Int(7), Ordering::Equal)]
	fn test_cross_representation_ordering(
		#[case] a: Number,
		#[case] b: Number,
		#[case] expected: Ordering,
	) {
		assert_eq!(a.partial_cmp(&b), Some(expected));
	}

	#[rstest]
	#[case(Number::Int(TWO_POW_53 + 1), Number::Float(TWO_POW_53 as f64), Ordering::Greater)]
	#[case(Number::Float(TWO_POW_53 as f64), Number::Int(TWO_POW_53 + 1), Ordering::Less)]
	#[case(Number::Uint(u64::MAX), Number::Float(TWO_POW_64), Ordering::Less)]
	#[case(Number::Int(i64::MIN), Number::Float(-TWO_POW_63), Ordering::Equal)]
	#[case(Number::Int(2), Number::Float(2.5), Ordering::Less)]
	#[case(Number::Int(-3), Number::Float(-2.5), Ordering::Less)]
	#[case(Number::Int(-2), Number::Float(-2.5), Ordering::Greater)]
	#[case(Number::Int(0), Number::Float(-0.0), Ordering::Equal)]
	#[case(Number::Int(i64::MAX), Number::Float(f64::INFINITY), Ordering::Less)]
	#[case(Number::Int(i64::MIN), Number::Float(f64::NEG_INFINITY), Ordering::Greater)]
	fn test_integer_float_ordering_is_exact(
		#[case] a: Number,
		#[case] b: Number,
		#[case] expected: Ordering,
	) {
		assert_eq!(a.partial_cmp(&b), Some(expected));
	}

	#[test]
	fn test_nan_is_unordered() {
		assert_eq!(Number::Int(1).partial_cmp(&Number::Float(f64::NAN)), None);
		assert!(!Number::Float(f64::NAN).is_finite());
		assert!(Number::Uint(u64::MAX).is_finite());
	}

	#[test]
	fn test_display_drops_trailing_zero_fraction() {
		assert_eq!(Number::from(100.0_f64).to_string(), "100");
		assert_eq!(Number::from(2.5_f32).to_string(), "2.5");
		assert_eq!(Number::from(-3_i8).to_string(), "-3");
	}
}
