//! HTTP request representation

use crate::body::{FormBody, MultipartBody};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Method, Uri, Version};
use std::net::SocketAddr;

/// Errors raised while building a [`Request`]
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
	#[error("invalid request URI {uri:?}")]
	InvalidUri {
		uri: String,
		#[source]
		source: http::uri::InvalidUri,
	},
	#[error("invalid header name {0:?}")]
	InvalidHeaderName(String),
	#[error("invalid value for header {0:?}")]
	InvalidHeaderValue(String),
}

/// An HTTP request with a fully buffered body
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub remote_addr: Option<SocketAddr>,
	body: Bytes,
}

impl Request {
	/// Starts building a request
	///
	/// # Examples
	///
	/// ```
	/// use formwork_http::{Method, Request};
	///
	/// let request = Request::builder()
	///     .method(Method::POST)
	///     .uri("/signup?ref=mail")
	///     .header("content-type", "application/x-www-form-urlencoded")
	///     .body("name=Bob")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.path(), "/signup");
	/// assert_eq!(request.query_string(), Some("ref=mail"));
	/// assert_eq!(request.body().as_ref(), b"name=Bob");
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	/// Builds a request from parts of an [`http::Request`] and its collected body
	pub fn from_parts(parts: http::request::Parts, body: Bytes) -> Self {
		Self {
			method: parts.method,
			uri: parts.uri,
			version: parts.version,
			headers: parts.headers,
			remote_addr: None,
			body,
		}
	}

	pub fn path(&self) -> &str {
		self.uri.path()
	}

	pub fn query_string(&self) -> Option<&str> {
		self.uri.query()
	}

	/// The `Content-Type` header, if present and valid ASCII
	pub fn content_type(&self) -> Option<&str> {
		self.headers
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
	}

	pub fn body(&self) -> &Bytes {
		&self.body
	}

	pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
		self.remote_addr = Some(addr);
		self
	}
}

impl From<http::Request<Bytes>> for Request {
	fn from(request: http::Request<Bytes>) -> Self {
		let (parts, body) = request.into_parts();
		Self::from_parts(parts, body)
	}
}

/// Builder for [`Request`]
///
/// Header and URI errors are collected and reported by [`build`](Self::build).
#[derive(Debug)]
pub struct RequestBuilder {
	method: Method,
	uri: String,
	version: Version,
	headers: HeaderMap,
	body: Bytes,
	remote_addr: Option<SocketAddr>,
	error: Option<RequestError>,
}

impl Default for RequestBuilder {
	fn default() -> Self {
		Self {
			method: Method::GET,
			uri: "/".to_string(),
			version: Version::HTTP_11,
			headers: HeaderMap::new(),
			body: Bytes::new(),
			remote_addr: None,
			error: None,
		}
	}
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = uri.into();
		self
	}

	pub fn version(mut self, version: Version) -> Self {
		self.version = version;
		self
	}

	/// Appends a header
	pub fn header(mut self, name: &str, value: &str) -> Self {
		if self.error.is_some() {
			return self;
		}
		let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
			self.error = Some(RequestError::InvalidHeaderName(name.to_string()));
			return self;
		};
		let Ok(header_value) = HeaderValue::from_str(value) else {
			self.error = Some(RequestError::InvalidHeaderValue(name.to_string()));
			return self;
		};
		self.headers.append(header_name, header_value);
		self
	}

	/// Replaces all headers
	pub fn headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;
		self
	}

	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Sets an `application/x-www-form-urlencoded` body and content type
	pub fn form(mut self, form: FormBody) -> Self {
		self.headers.insert(
			CONTENT_TYPE,
			HeaderValue::from_static(FormBody::CONTENT_TYPE),
		);
		self.body = form.into_bytes();
		self
	}

	/// Sets a `multipart/form-data` body and the matching content type
	pub fn multipart(mut self, multipart: MultipartBody) -> Self {
		match HeaderValue::from_str(&multipart.content_type()) {
			Ok(value) => {
				self.headers.insert(CONTENT_TYPE, value);
			}
			Err(_) if self.error.is_none() => {
				self.error = Some(RequestError::InvalidHeaderValue(CONTENT_TYPE.to_string()));
			}
			Err(_) => {}
		}
		self.body = multipart.into_bytes();
		self
	}

	pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
		self.remote_addr = Some(addr);
		self
	}

	pub fn build(self) -> Result<Request, RequestError> {
		if let Some(error) = self.error {
			return Err(error);
		}
		let uri = self
			.uri
			.parse::<Uri>()
			.map_err(|source| RequestError::InvalidUri {
				uri: self.uri.clone(),
				source,
			})?;

		Ok(Request {
			method: self.method,
			uri,
			version: self.version,
			headers: self.headers,
			remote_addr: self.remote_addr,
			body: self.body,
		})
	}
}
