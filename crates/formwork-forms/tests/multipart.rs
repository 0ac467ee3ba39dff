//! Multipart submissions through the full pipeline

use formwork_forms::{
	ErrorKind, FormProcessor, FormRecord, ParseError, ProcessingError, ProcessorConfig, Schema,
};
use formwork_http::{Method, MultipartBody, Request};
use rstest::rstest;

#[derive(Debug, Default)]
struct Signup {
	email: String,
	age: Option<u8>,
	tags: Vec<String>,
	agree: bool,
}

impl FormRecord for Signup {
	fn schema() -> Schema<Self> {
		Schema::<Self>::builder()
			.field("email", |s| &s.email, |s| &mut s.email, |f| {
				f.required().transform("trim").transform("lowercase").email()
			})
			.field("age", |s| &s.age, |s| &mut s.age, |f| f.gte(13))
			.field("tags", |s| &s.tags, |s| &mut s.tags, |f| {
				f.key("tag").transform("trim").max_length(3).one_of(["rust", "web", "forms"])
			})
			.field("agree", |s| &s.agree, |s| &mut s.agree, |f| f.required())
			.build()
	}
}

fn request(body: MultipartBody) -> Request {
	Request::builder()
		.method(Method::POST)
		.multipart(body)
		.build()
		.unwrap()
}

#[rstest]
#[tokio::test]
async fn test_text_parts_populate_record_and_files_are_skipped() {
	// Arrange
	let processor = FormProcessor::new().unwrap();
	let body = MultipartBody::new()
		.text("email", " Ann@Example.COM ")
		.text("age", "30")
		.text("tag", "rust")
		.file("avatar", "me.png", "image/png", vec![0x89, 0x50, 0x4e, 0x47])
		.text("tag", " web ")
		.text("agree", "on");
	let mut signup = Signup::default();

	// Act
	let result = processor.process(&mut signup, &request(body)).await;

	// Assert
	assert!(result.is_ok(), "{result:?}");
	assert_eq!(signup.email, "ann@example.com");
	assert_eq!(signup.age, Some(30));
	assert_eq!(signup.tags, ["rust", "web"]);
	assert!(signup.agree);
}

#[rstest]
#[tokio::test]
async fn test_list_and_optional_rules() {
	let processor = FormProcessor::new().unwrap();
	let body = MultipartBody::new()
		.text("email", "ann@example.com")
		.text("age", "")
		.text("tag", "rust")
		.text("tag", "go")
		.text("tag", "web")
		.text("tag", "forms")
		.text("agree", "true");
	let mut signup = Signup {
		age: Some(40),
		..Signup::default()
	};

	let error = processor.process(&mut signup, &request(body)).await.unwrap_err();

	assert_eq!(signup.age, None);
	let rules: Vec<(&str, &str)> = error
		.violations()
		.iter()
		.map(|v| (v.field.as_str(), v.rule.as_str()))
		.collect();
	assert_eq!(rules, [("tags", "max_length"), ("tags", "one_of")]);
}

#[rstest]
#[tokio::test]
async fn test_unchecked_box_fails_required() {
	let processor = FormProcessor::new().unwrap();
	let body = MultipartBody::new().text("email", "ann@example.com");
	let mut signup = Signup::default();

	let error = processor.process(&mut signup, &request(body)).await.unwrap_err();

	assert_eq!(error.kind(), ErrorKind::Validating);
	assert_eq!(error.violations().len(), 1);
	assert_eq!(error.violations()[0].field, "agree");
	assert_eq!(error.violations()[0].message, "This field is required.");
}

#[rstest]
#[tokio::test]
async fn test_part_larger_than_limit_is_a_parse_error() {
	let processor = FormProcessor::builder()
		.config(ProcessorConfig::new().with_max_field_size(8))
		.build()
		.unwrap();
	let body = MultipartBody::new().text("email", "someone.with.a.long.name@example.com");
	let mut signup = Signup::default();

	let error = processor.process(&mut signup, &request(body)).await.unwrap_err();

	assert!(matches!(
		error,
		ProcessingError::Parsing(ParseError::Multipart(_))
	));
	assert_eq!(error.to_string(), "error parsing form");
	assert!(signup.email.is_empty());
}

#[rstest]
#[tokio::test]
async fn test_too_many_parts() {
	let processor = FormProcessor::builder()
		.config(ProcessorConfig::new().with_max_fields(2))
		.build()
		.unwrap();
	let body = MultipartBody::new()
		.text("tag", "a")
		.text("tag", "b")
		.text("tag", "c");
	let mut signup = Signup::default();

	let error = processor.process(&mut signup, &request(body)).await.unwrap_err();

	assert!(matches!(
		error,
		ProcessingError::Parsing(ParseError::TooManyFields { limit: 2 })
	));
}
