//! Request extraction
//!
//! Reads the raw key/value pairs of a submission. Only `POST`, `PUT` and
//! `PATCH` bodies are read; the query string is read as well when
//! [`ProcessorConfig::include_query`] is set.

use crate::config::ProcessorConfig;
use crate::error::ParseError;
use crate::request::FormRequest;
use bytes::Bytes;
use futures_util::{future::ready, stream::once};
use http::Method;
use http::header::CONTENT_TYPE;
use indexmap::IndexMap;
use multer::{Constraints, Multipart, SizeLimit};
use percent_encoding::percent_decode_str;
use std::borrow::Cow;

const URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART: &str = "multipart/form-data";

/// Raw submitted values, keyed by wire key in first-seen order
///
/// # Examples
///
/// ```
/// use formwork_forms::RawSubmission;
///
/// let submission = RawSubmission::from_urlencoded("tag=a&name=Bob&tag=b").unwrap();
/// assert_eq!(submission.get("tag"), Some(&["a".to_string(), "b".to_string()][..]));
/// assert_eq!(submission.keys().collect::<Vec<_>>(), ["tag", "name"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSubmission {
	values: IndexMap<String, Vec<String>>,
}

impl RawSubmission {
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses an `application/x-www-form-urlencoded` string
	pub fn from_urlencoded(input: &str) -> Result<Self, ParseError> {
		let mut submission = Self::new();
		submission.extend_urlencoded(input)?;
		Ok(submission)
	}

	/// Appends a value to the key's list
	pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.values.entry(key.into()).or_default().push(value.into());
	}

	/// All values submitted for `key`, in order
	pub fn get(&self, key: &str) -> Option<&[String]> {
		self.values.get(key).map(Vec::as_slice)
	}

	/// The value a scalar field would decode: the last one
	pub fn last(&self, key: &str) -> Option<&str> {
		self.values
			.get(key)
			.and_then(|values| values.last())
			.map(String::as_str)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.values.contains_key(key)
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.values.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
		self.values
			.iter()
			.map(|(key, values)| (key.as_str(), values.as_slice()))
	}

	/// Number of distinct keys
	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	/// Number of key/value pairs
	pub fn value_count(&self) -> usize {
		self.values.values().map(Vec::len).sum()
	}

	fn extend_urlencoded(&mut self, input: &str) -> Result<(), ParseError> {
		check_percent_escapes(input)?;
		for pair in input.split('&').filter(|pair| !pair.is_empty()) {
			let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
			self.append(decode_component(key)?, decode_component(value)?);
		}
		Ok(())
	}
}

impl<K, V> FromIterator<(K, V)> for RawSubmission
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut submission = Self::new();
		for (key, value) in iter {
			submission.append(key, value);
		}
		submission
	}
}

/// Reads the raw pairs of a request
pub async fn extract<R>(request: &R, config: &ProcessorConfig) -> Result<RawSubmission, ParseError>
where
	R: FormRequest + ?Sized,
{
	let mut submission = RawSubmission::new();

	if config.include_query
		&& let Some(query) = request.query()
	{
		submission.extend_urlencoded(query)?;
		check_field_count(&submission, config)?;
	}

	if !carries_form_body(request.method()) {
		return Ok(submission);
	}

	let content_type = request
		.headers()
		.get(CONTENT_TYPE)
		.map(|value| {
			value
				.to_str()
				.map_err(|_| ParseError::Malformed("content type is not visible ASCII".to_string()))
		})
		.transpose()?;

	let body = read_body(request, config).await?;
	if body.len() > config.max_body_size {
		return Err(ParseError::PayloadTooLarge {
			size: body.len(),
			limit: config.max_body_size,
		});
	}

	match content_type {
		None if body.is_empty() => {}
		None => return Err(ParseError::MissingContentType),
		Some(content_type) => match media_type(content_type).as_str() {
			URLENCODED => {
				let text = std::str::from_utf8(&body)
					.map_err(|e| ParseError::Malformed(format!("body is not valid UTF-8: {e}")))?;
				submission.extend_urlencoded(text)?;
			}
			MULTIPART => extend_multipart(&mut submission, content_type, body, config).await?,
			other => return Err(ParseError::UnsupportedMediaType(other.to_string())),
		},
	}

	check_field_count(&submission, config)?;
	Ok(submission)
}

fn carries_form_body(method: &Method) -> bool {
	*method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

/// Lowercased media type without parameters
fn media_type(content_type: &str) -> String {
	content_type
		.split(';')
		.next()
		.unwrap_or_default()
		.trim()
		.to_ascii_lowercase()
}

async fn read_body<R>(request: &R, config: &ProcessorConfig) -> Result<Bytes, ParseError>
where
	R: FormRequest + ?Sized,
{
	let read = request.read_body(config.max_body_size);
	match config.read_timeout() {
		Some(limit) => tokio::time::timeout(limit, read)
			.await
			.map_err(|_| ParseError::Timeout(limit))?,
		None => read.await,
	}
}

async fn extend_multipart(
	submission: &mut RawSubmission,
	content_type: &str,
	body: Bytes,
	config: &ProcessorConfig,
) -> Result<(), ParseError> {
	let boundary = multer::parse_boundary(content_type).map_err(ParseError::MissingBoundary)?;
	let constraints = Constraints::new()
		.size_limit(SizeLimit::new().per_field(config.max_field_size as u64));
	let stream = once(ready(Ok::<_, std::io::Error>(body)));
	let mut multipart = Multipart::with_constraints(stream, boundary, constraints);

	while let Some(field) = multipart
		.next_field()
		.await
		.map_err(ParseError::Multipart)?
	{
		if let Some(file_name) = field.file_name() {
			tracing::trace!(field = ?field.name(), file_name, "skipping file part");
			continue;
		}
		let name = field
			.name()
			.ok_or_else(|| ParseError::Malformed("multipart part has no field name".to_string()))?
			.to_string();
		let bytes = field.bytes().await.map_err(ParseError::Multipart)?;
		let text = String::from_utf8(bytes.to_vec())
			.map_err(|e| ParseError::Malformed(format!("part {name:?} is not valid UTF-8: {e}")))?;
		submission.append(name, text);
		check_field_count(submission, config)?;
	}

	Ok(())
}

fn check_field_count(
	submission: &RawSubmission,
	config: &ProcessorConfig,
) -> Result<(), ParseError> {
	if submission.value_count() > config.max_fields {
		Err(ParseError::TooManyFields {
			limit: config.max_fields,
		})
	} else {
		Ok(())
	}
}

/// Every `%` must start a two-digit hex escape
fn check_percent_escapes(input: &str) -> Result<(), ParseError> {
	let bytes = input.as_bytes();
	let mut index = 0;
	while index < bytes.len() {
		if bytes[index] == b'%' {
			let escape = bytes.get(index + 1..index + 3);
			if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
				return Err(ParseError::Malformed(format!(
					"invalid percent escape at byte {index}"
				)));
			}
			index += 3;
		} else {
			index += 1;
		}
	}
	Ok(())
}

/// Decodes `+` and percent escapes into text that must be valid UTF-8
fn decode_component(raw: &str) -> Result<String, ParseError> {
	let spaced = raw.replace('+', " ");
	percent_decode_str(&spaced)
		.decode_utf8()
		.map(Cow::into_owned)
		.map_err(|e| ParseError::Malformed(format!("{raw:?} does not decode to valid UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
	use super::*;
	use formwork_http::{FormBody, MultipartBody, Request};
	use rstest::rstest;

	fn post(body: &'static str) -> Request {
		Request::builder()
			.method(Method::POST)
			.header("content-type", URLENCODED)
			.body(body)
			.build()
			.unwrap()
	}

	#[rstest]
	#[case("a=1&b=%20x")]
	#[case("")]
	#[case("plus+sign=%2B")]
	fn test_valid_percent_escapes(#[case] input: &str) {
		assert!(check_percent_escapes(input).is_ok());
	}

	#[rstest]
	#[case("a=%")]
	#[case("a=%2")]
	#[case("a=%zz")]
	#[case("%G1=x")]
	fn test_invalid_percent_escapes(#[case] input: &str) {
		assert!(matches!(
			RawSubmission::from_urlencoded(input),
			Err(ParseError::Malformed(_))
		));
	}

	#[rstest]
	#[case("application/x-www-form-urlencoded", URLENCODED)]
	#[case("Application/X-WWW-Form-Urlencoded; charset=UTF-8", URLENCODED)]
	#[case("multipart/form-data; boundary=x", MULTIPART)]
	#[case("  text/plain ", "text/plain")]
	fn test_media_type(#[case] content_type: &str, #[case] expected: &str) {
		assert_eq!(media_type(content_type), expected);
	}

	#[test]
	fn test_submission_keeps_repeated_values_in_order() {
		let submission: RawSubmission = [("tag", "a"), ("name", "Bob"), ("tag", "b")]
			.into_iter()
			.collect();
		assert_eq!(submission.len(), 2);
		assert_eq!(submission.value_count(), 3);
		assert_eq!(submission.last("tag"), Some("b"));
		assert!(submission.contains_key("name"));
		assert_eq!(
			submission.iter().map(|(key, _)| key).collect::<Vec<_>>(),
			["tag", "name"]
		);
	}

	#[tokio::test]
	async fn test_urlencoded_body() {
		let request = post("name=Bob+Smith&value=42&name=Ann");
		let submission = extract(&request, &ProcessorConfig::default()).await.unwrap();
		assert_eq!(submission.get("name").unwrap(), ["Bob Smith", "Ann"]);
		assert_eq!(submission.last("value"), Some("42"));
	}

	#[rstest]
	#[case(Method::GET)]
	#[case(Method::DELETE)]
	#[case(Method::HEAD)]
	#[tokio::test]
	async fn test_body_ignored_for_methods_without_form_body(#[case] method: Method) {
		let request = Request::builder()
			.method(method)
			.uri("/?q=1")
			.header("content-type", URLENCODED)
			.body("name=Bob")
			.build()
			.unwrap();
		let submission = extract(&request, &ProcessorConfig::default()).await.unwrap();
		assert!(submission.is_empty());
	}

	#[tokio::test]
	async fn test_query_pairs_come_first_when_enabled() {
		let request = Request::builder()
			.method(Method::PATCH)
			.uri("/items?name=query&page=2")
			.form(FormBody::new().field("name", "body"))
			.build()
			.unwrap();
		let config = ProcessorConfig::new().with_include_query(true);
		let submission = extract(&request, &config).await.unwrap();
		assert_eq!(submission.get("name").unwrap(), ["query", "body"]);
		assert_eq!(submission.last("page"), Some("2"));
	}

	#[tokio::test]
	async fn test_missing_content_type() {
		let empty = Request::builder().method(Method::POST).build().unwrap();
		assert!(extract(&empty, &ProcessorConfig::default()).await.unwrap().is_empty());

		let with_body = Request::builder()
			.method(Method::POST)
			.body("name=Bob")
			.build()
			.unwrap();
		assert!(matches!(
			extract(&with_body, &ProcessorConfig::default()).await,
			Err(ParseError::MissingContentType)
		));
	}

	#[tokio::test]
	async fn test_unsupported_media_type() {
		let request = Request::builder()
			.method(Method::POST)
			.header("content-type", "application/json")
			.body(r#"{"name":"Bob"}"#)
			.build()
			.unwrap();
		match extract(&request, &ProcessorConfig::default()).await {
			Err(ParseError::UnsupportedMediaType(media)) => assert_eq!(media, "application/json"),
			other => panic!("expected UnsupportedMediaType, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_invalid_utf8_is_malformed() {
		let request = Request::builder()
			.method(Method::POST)
			.header("content-type", URLENCODED)
			.body(&b"name=\xff\xfe"[..])
			.build()
			.unwrap();
		assert!(matches!(
			extract(&request, &ProcessorConfig::default()).await,
			Err(ParseError::Malformed(_))
		));
	}

	#[rstest]
	#[case("name=%FF")]
	#[case("name=%FF%FE")]
	#[case("%C3=x")]
	#[case("name=ok&bio=%E2%82")]
	fn test_escapes_decoding_to_invalid_utf8_are_malformed(#[case] input: &str) {
		assert!(matches!(
			RawSubmission::from_urlencoded(input),
			Err(ParseError::Malformed(_))
		));
	}

	#[rstest]
	#[case("name=J%C3%B6rg", "name", "Jörg")]
	#[case("a+b=c%2Bd+e", "a b", "c+d e")]
	#[case("flag", "flag", "")]
	#[case("&&note=%E2%82%AC&", "note", "€")]
	fn test_urlencoded_components(#[case] input: &str, #[case] key: &str, #[case] value: &str) {
		let submission = RawSubmission::from_urlencoded(input).unwrap();
		assert_eq!(submission.len(), 1);
		assert_eq!(submission.last(key), Some(value));
	}

	#[tokio::test]
	async fn test_multipart_part_with_invalid_utf8_is_malformed() {
		let body: &[u8] = b"--b\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nBob\r\n\
			--b\r\nContent-Disposition: form-data; name=\"bio\"\r\n\r\ncaf\xe9 \xff\r\n--b--\r\n";
		let request = Request::builder()
			.method(Method::POST)
			.header("content-type", "multipart/form-data; boundary=b")
			.body(body)
			.build()
			.unwrap();
		assert!(matches!(
			extract(&request, &ProcessorConfig::default()).await,
			Err(ParseError::Malformed(message)) if message.contains("bio")
		));
	}

	#[tokio::test]
	async fn test_body_size_limit() {
		let config = ProcessorConfig::new().with_max_body_size(8);
		assert!(matches!(
			extract(&post("name=Bobby+Tables"), &config).await,
			Err(ParseError::PayloadTooLarge { size: 17, limit: 8 })
		));
	}

	#[tokio::test]
	async fn test_field_count_limit() {
		let config = ProcessorConfig::new().with_max_fields(2);
		assert!(matches!(
			extract(&post("a=1&b=2&a=3"), &config).await,
			Err(ParseError::TooManyFields { limit: 2 })
		));
		assert!(extract(&post("a=1&b=2"), &config).await.is_ok());
	}

	#[tokio::test]
	async fn test_multipart_text_parts_and_skipped_files() {
		let request = Request::builder()
			.method(Method::POST)
			.multipart(
				MultipartBody::new()
					.text("name", "Bob")
					.file("avatar", "me.png", "image/png", &b"\x89PNG"[..])
					.text("tag", "a")
					.text("tag", "b"),
			)
			.build()
			.unwrap();
		let submission = extract(&request, &ProcessorConfig::default()).await.unwrap();
		assert_eq!(submission.keys().collect::<Vec<_>>(), ["name", "tag"]);
		assert_eq!(submission.get("tag").unwrap(), ["a", "b"]);
		assert!(!submission.contains_key("avatar"));
	}

	#[tokio::test]
	async fn test_multipart_without_boundary() {
		let request = Request::builder()
			.method(Method::POST)
			.header("content-type", "multipart/form-data")
			.body("--x\r\n")
			.build()
			.unwrap();
		assert!(matches!(
			extract(&request, &ProcessorConfig::default()).await,
			Err(ParseError::MissingBoundary(_))
		));
	}

	#[tokio::test]
	async fn test_multipart_part_size_limit() {
		let request = Request::builder()
			.method(Method::POST)
			.multipart(MultipartBody::new().text("bio", "x".repeat(64)))
			.build()
			.unwrap();
		let config = ProcessorConfig::new().with_max_field_size(16);
		assert!(matches!(
			extract(&request, &config).await,
			Err(ParseError::Multipart(_))
		));
	}

	#[tokio::test]
	async fn test_http_request_is_a_form_request() {
		let request = http::Request::builder()
			.method(Method::PUT)
			.header("content-type", URLENCODED)
			.body(Bytes::from_static(b"value=7"))
			.unwrap();
		let submission = extract(&request, &ProcessorConfig::default()).await.unwrap();
		assert_eq!(submission.last("value"), Some("7"));
	}
}
