//! Field decoding
//!
//! Maps raw submitted strings onto the record's typed fields. The decoder
//! only writes fields; it never transforms or validates them.

use crate::compile::CompiledSchema;
use crate::config::ProcessorConfig;
use crate::error::DecodeError;
use crate::extract::RawSubmission;

/// Decodes `submission` into `record`, field by field in schema order
///
/// Stops at the first field that fails to decode. Fields decoded before it
/// keep their new values.
pub(crate) fn decode<T>(
	schema: &CompiledSchema<T>,
	submission: &RawSubmission,
	record: &mut T,
	config: &ProcessorConfig,
) -> Result<(), DecodeError> {
	if config.deny_unknown_keys
		&& let Some(key) = submission.keys().find(|key| !schema.knows_key(key))
	{
		return Err(DecodeError::UnknownKey(key.to_string()));
	}

	for field in schema.fields() {
		let descriptor = field.descriptor();
		let spec = descriptor.spec();
		let raw = match (submission.get(spec.wire_key()), spec.default_raw()) {
			(Some(values), _) => values,
			(None, Some(default)) => std::slice::from_ref(default),
			(None, None) => continue,
		};

		descriptor
			.access()
			.decode_into(record, raw)
			.map_err(|source| DecodeError::Field {
				field: descriptor.name().to_string(),
				key: spec.wire_key().to_string(),
				source,
			})?;
	}

	Ok(())
}
