//! Serializable schema description
//!
//! Lets a client render a form and pre-check rules without access to the
//! record type. Server-side processing stays authoritative.

use super::{Rule, Schema};
use crate::value::FieldKind;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormMetadata {
	pub fields: Vec<FieldMetadata>,
	pub checks: Vec<CheckMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMetadata {
	pub name: String,
	pub key: String,
	pub kind: FieldKind,
	pub required: bool,
	#[serde(skip_serializing_if = "std::ops::Not::not")]
	pub omit_empty: bool,
	pub transforms: Vec<String>,
	pub rules: Vec<Rule>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckMetadata {
	pub field: String,
	pub rule: String,
}

impl FormMetadata {
	pub(crate) fn from_schema<T: 'static>(schema: &Schema<T>) -> Self {
		let fields = schema
			.fields()
			.iter()
			.map(|field| {
				let spec = field.spec();
				FieldMetadata {
					name: spec.name().to_string(),
					key: spec.wire_key().to_string(),
					kind: field.kind(),
					required: spec.is_required(),
					omit_empty: spec.is_omit_empty(),
					transforms: spec.transforms().to_vec(),
					rules: spec.rules().to_vec(),
					default: spec.default_raw().cloned(),
				}
			})
			.collect();

		let checks = schema
			.checks()
			.iter()
			.map(|check| CheckMetadata {
				field: check.field().to_string(),
				rule: check.rule().to_string(),
			})
			.collect();

		Self { fields, checks }
	}

	pub fn to_json(&self) -> serde_json::Result<String> {
		serde_json::to_string(self)
	}
}
