//! Property tests for the processing pipeline

use formwork_forms::{ErrorKind, FormProcessor, FormRecord, RawSubmission, Schema};
use proptest::prelude::*;
use std::sync::LazyLock;

#[derive(Debug, Default)]
struct Profile {
	name: String,
	bio: String,
	score: i64,
}

impl FormRecord for Profile {
	fn schema() -> Schema<Self> {
		Schema::<Self>::builder()
			.field("name", |p| &p.name, |p| &mut p.name, |f| f.required())
			.field("bio", |p| &p.bio, |p| &mut p.bio, |f| f.transform("sanitize"))
			.field("score", |p| &p.score, |p| &mut p.score, |f| f.gte(-50).lte(50))
			.build()
	}
}

static PROCESSOR: LazyLock<FormProcessor> = LazyLock::new(|| {
	FormProcessor::builder()
		.register::<Profile>()
		.build()
		.expect("profile schema compiles")
});

fn run(pairs: &[(&str, String)]) -> (Profile, Result<(), formwork_forms::ProcessingError>) {
	let submission: RawSubmission = pairs.iter().cloned().collect();
	let mut profile = Profile::default();
	let result = PROCESSOR.process_submission(&mut profile, &submission);
	(profile, result)
}

fn markup() -> impl Strategy<Value = String> {
	prop::collection::vec(
		prop_oneof![
			"[a-zA-Z0-9 ]{0,8}",
			Just("<script>alert(1)</script>".to_string()),
			Just("<b>".to_string()),
			Just("</b>".to_string()),
			Just("<".to_string()),
			Just("<iframe src=x>".to_string()),
			Just("<!--".to_string()),
		],
		0..8,
	)
	.prop_map(|parts| parts.concat())
}

proptest! {
	#[test]
	fn prop_bounds_are_inclusive(score in -200_i64..200) {
		let (profile, result) = run(&[("name", "Bob".to_string()), ("score", score.to_string())]);

		prop_assert_eq!(profile.score, score);
		prop_assert_eq!(result.is_ok(), (-50..=50).contains(&score));
		if let Err(error) = result {
			prop_assert_eq!(error.violations().len(), 1);
			prop_assert_eq!(&error.violations()[0].field, "score");
		}
	}

	#[test]
	fn prop_non_numeric_integer_is_a_decode_error(raw in "[a-zA-Z_][a-zA-Z0-9_]{0,10}") {
		let (_, result) = run(&[("name", "Bob".to_string()), ("score", raw)]);

		let error = result.unwrap_err();
		prop_assert_eq!(error.kind(), ErrorKind::Decoding);
	}

	#[test]
	fn prop_missing_required_field_is_named(score in -50_i64..=50, bio in "[a-z ]{0,16}") {
		let (_, result) = run(&[("bio", bio), ("score", score.to_string())]);

		let error = result.unwrap_err();
		prop_assert_eq!(error.kind(), ErrorKind::Validating);
		prop_assert!(error.violations().iter().any(|v| v.field == "name" && v.rule == "required"));
	}

	#[test]
	fn prop_sanitized_fields_hold_no_markup(bio in markup()) {
		let (first, result) = run(&[("name", "Bob".to_string()), ("bio", bio)]);
		prop_assert!(result.is_ok());
		prop_assert!(!first.bio.contains('<'));

		let (second, _) = run(&[("name", "Bob".to_string()), ("bio", first.bio.clone())]);
		prop_assert_eq!(second.bio, first.bio);
	}
}
