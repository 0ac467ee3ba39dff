//! Encoded form payloads

use bytes::{BufMut, Bytes, BytesMut};

/// An `application/x-www-form-urlencoded` payload
///
/// # Examples
///
/// ```
/// use formwork_http::FormBody;
///
/// let body = FormBody::new().field("tag", "a").field("tag", "b c");
/// assert_eq!(body.encode(), "tag=a&tag=b+c");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormBody {
	pairs: Vec<(String, String)>,
}

impl FormBody {
	pub const CONTENT_TYPE: &'static str = "application/x-www-form-urlencoded";

	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a key/value pair; repeated keys are kept in order
	pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.pairs.push((key.into(), value.into()));
		self
	}

	pub fn encode(&self) -> String {
		// String pairs always serialize.
		serde_urlencoded::to_string(&self.pairs).unwrap_or_default()
	}

	pub fn into_bytes(self) -> Bytes {
		Bytes::from(self.encode())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
	Text {
		name: String,
		value: String,
	},
	File {
		name: String,
		file_name: String,
		content_type: String,
		data: Bytes,
	},
}

/// A `multipart/form-data` payload
///
/// # Examples
///
/// ```
/// use formwork_http::MultipartBody;
///
/// let body = MultipartBody::with_boundary("XyZ").text("name", "Bob");
/// assert_eq!(body.content_type(), "multipart/form-data; boundary=XyZ");
/// assert!(String::from_utf8_lossy(&body.into_bytes()).contains("name=\"name\""));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
	boundary: String,
	parts: Vec<Part>,
}

impl Default for MultipartBody {
	fn default() -> Self {
		Self::with_boundary("formwork-boundary-7MA4YWxkTrZu0gW")
	}
}

impl MultipartBody {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_boundary(boundary: impl Into<String>) -> Self {
		Self {
			boundary: boundary.into(),
			parts: Vec::new(),
		}
	}

	pub fn boundary(&self) -> &str {
		&self.boundary
	}

	/// Appends a plain text part
	pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.parts.push(Part::Text {
			name: name.into(),
			value: value.into(),
		});
		self
	}

	/// Appends a file part
	pub fn file(
		mut self,
		name: impl Into<String>,
		file_name: impl Into<String>,
		content_type: impl Into<String>,
		data: impl Into<Bytes>,
	) -> Self {
		self.parts.push(Part::File {
			name: name.into(),
			file_name: file_name.into(),
			content_type: content_type.into(),
			data: data.into(),
		});
		self
	}

	pub fn content_type(&self) -> String {
		format!("multipart/form-data; boundary={}", self.boundary)
	}

	pub fn into_bytes(self) -> Bytes {
		let mut out = BytesMut::new();
		for part in &self.parts {
			out.put_slice(format!("--{}\r\n", self.boundary).as_bytes());
			match part {
				Part::Text { name, value } => {
					out.put_slice(
						format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
					);
					out.put_slice(value.as_bytes());
				}
				Part::File {
					name,
					file_name,
					content_type,
					data,
				} => {
					out.put_slice(
						format!(
							"Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
						)
						.as_bytes(),
					);
					out.put_slice(data);
				}
			}
			out.put_slice(b"\r\n");
		}
		out.put_slice(format!("--{}--\r\n", self.boundary).as_bytes());
		out.freeze()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_form_body_encodes_reserved_characters() {
		let body = FormBody::new().field("q", "a+b=c&d").field("empty", "");
		assert_eq!(body.encode(), "q=a%2Bb%3Dc%26d&empty=");
	}

	#[test]
	fn test_empty_form_body() {
		assert_eq!(FormBody::new().encode(), "");
	}

	#[test]
	fn test_multipart_layout() {
		let body = MultipartBody::with_boundary("b")
			.text("name", "Bob")
			.file("avatar", "a.png", "image/png", &b"PNG"[..]);
		let encoded = String::from_utf8(body.into_bytes().to_vec()).unwrap();
		assert_eq!(
			encoded,
			"--b\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nBob\r\n\
			 --b\r\nContent-Disposition: form-data; name=\"avatar\"; filename=\"a.png\"\r\nContent-Type: image/png\r\n\r\nPNG\r\n\
			 --b--\r\n"
		);
	}
}
