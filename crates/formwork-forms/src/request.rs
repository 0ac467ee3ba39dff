//! Inbound request capability
//!
//! The extractor only needs the method, the headers, the query string and
//! the body. Any request type that can provide those can be processed.
//! Servers receiving a streamed body collect it with [`collect_body`], which
//! enforces the configured size limit and read deadline while reading.

use crate::config::ProcessorConfig;
use crate::error::{BodyError, ParseError};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Method};
use http_body::Body;
use http_body_util::BodyExt;
use std::pin::pin;

/// A request carrying a form submission
#[async_trait]
pub trait FormRequest: Send + Sync {
	fn method(&self) -> &Method;

	fn headers(&self) -> &HeaderMap;

	/// Raw query string without the leading `?`
	fn query(&self) -> Option<&str>;

	/// Reads the complete body, giving up with
	/// [`ParseError::PayloadTooLarge`] once more than `limit` bytes arrive
	async fn read_body(&self, limit: usize) -> Result<Bytes, ParseError>;
}

#[async_trait]
impl FormRequest for formwork_http::Request {
	fn method(&self) -> &Method {
		&self.method
	}

	fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	fn query(&self) -> Option<&str> {
		self.query_string()
	}

	async fn read_body(&self, limit: usize) -> Result<Bytes, ParseError> {
		buffered(self.body(), limit)
	}
}

#[async_trait]
impl FormRequest for http::Request<Bytes> {
	fn method(&self) -> &Method {
		http::Request::method(self)
	}

	fn headers(&self) -> &HeaderMap {
		http::Request::headers(self)
	}

	fn query(&self) -> Option<&str> {
		self.uri().query()
	}

	async fn read_body(&self, limit: usize) -> Result<Bytes, ParseError> {
		buffered(self.body(), limit)
	}
}

fn buffered(body: &Bytes, limit: usize) -> Result<Bytes, ParseError> {
	if body.len() > limit {
		return Err(ParseError::PayloadTooLarge {
			size: body.len(),
			limit,
		});
	}
	Ok(body.clone())
}

/// Collects a streamed body under the config's size limit and read timeout
///
/// Reading stops at the first frame that pushes the body past
/// [`ProcessorConfig::max_body_size`]; a body whose size hint already
/// exceeds it is rejected before any frame is read.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use formwork_forms::{ParseError, ProcessorConfig, collect_body};
/// use http_body_util::Full;
///
/// # let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// # runtime.block_on(async {
/// let config = ProcessorConfig::new().with_max_body_size(4);
/// let body = collect_body(Full::new(Bytes::from_static(b"a=1")), &config).await.unwrap();
/// assert_eq!(body, "a=1");
///
/// let error = collect_body(Full::new(Bytes::from_static(b"a=12345")), &config).await;
/// assert!(matches!(error, Err(ParseError::PayloadTooLarge { size: 7, limit: 4 })));
/// # });
/// ```
pub async fn collect_body<B>(body: B, config: &ProcessorConfig) -> Result<Bytes, ParseError>
where
	B: Body<Data = Bytes>,
	B::Error: Into<BodyError>,
{
	let read = read_limited(body, config.max_body_size);
	match config.read_timeout() {
		Some(limit) => tokio::time::timeout(limit, read)
			.await
			.map_err(|_| ParseError::Timeout(limit))?,
		None => read.await,
	}
}

async fn read_limited<B>(body: B, limit: usize) -> Result<Bytes, ParseError>
where
	B: Body<Data = Bytes>,
	B::Error: Into<BodyError>,
{
	let hinted = body.size_hint().lower();
	if hinted > limit as u64 {
		return Err(ParseError::PayloadTooLarge {
			size: usize::try_from(hinted).unwrap_or(usize::MAX),
			limit,
		});
	}

	let mut body = pin!(body);
	let mut buffer = BytesMut::new();
	while let Some(frame) = body.frame().await {
		let frame = frame.map_err(|e| ParseError::Body(e.into()))?;
		if let Ok(chunk) = frame.into_data() {
			let size = buffer.len() + chunk.len();
			if size > limit {
				return Err(ParseError::PayloadTooLarge { size, limit });
			}
			buffer.extend_from_slice(&chunk);
		}
	}
	Ok(buffer.freeze())
}

#[cfg(test)]
mod tests {
	use super::*;
	use futures_util::stream;
	use http_body::Frame;
	use http_body_util::StreamBody;
	use rstest::rstest;
	use std::time::Duration;

	type Chunk = Result<Frame<Bytes>, std::io::Error>;

	fn chunked(chunks: &[&'static str]) -> StreamBody<stream::Iter<std::vec::IntoIter<Chunk>>> {
		let frames: Vec<Chunk> = chunks
			.iter()
			.map(|chunk| Ok(Frame::data(Bytes::from_static(chunk.as_bytes()))))
			.collect();
		StreamBody::new(stream::iter(frames))
	}

	#[rstest]
	#[case(8, true)]
	#[case(7, false)]
	#[tokio::test]
	async fn test_buffered_body_limit(#[case] limit: usize, #[case] accepted: bool) {
		let request = formwork_http::Request::builder()
			.method(Method::POST)
			.body("name=Bob")
			.build()
			.unwrap();
		let result = request.read_body(limit).await;
		if accepted {
			assert_eq!(result.unwrap(), "name=Bob");
		} else {
			assert!(matches!(result, Err(ParseError::PayloadTooLarge { size: 8, limit: 7 })));
		}
	}

	#[tokio::test]
	async fn test_collect_chunked_body() {
		let body = collect_body(chunked(&["name=", "Bob", "&x=1"]), &ProcessorConfig::default())
			.await
			.unwrap();
		assert_eq!(body, "name=Bob&x=1");
	}

	#[tokio::test]
	async fn test_collect_stops_at_the_frame_crossing_the_limit() {
		let config = ProcessorConfig::new().with_max_body_size(10);
		let result = collect_body(chunked(&["name=", "Bobby", "&more"]), &config).await;
		assert!(matches!(
			result,
			Err(ParseError::PayloadTooLarge { size: 15, limit: 10 })
		));
	}

	#[tokio::test]
	async fn test_collect_stalled_body_times_out() {
		let config = ProcessorConfig::new().with_read_timeout(Duration::from_millis(20));
		let stalled = StreamBody::new(stream::pending::<Chunk>());
		assert!(matches!(
			collect_body(stalled, &config).await,
			Err(ParseError::Timeout(limit)) if limit == Duration::from_millis(20)
		));
	}

	#[tokio::test]
	async fn test_collect_surfaces_stream_errors() {
		let failing = StreamBody::new(stream::iter(vec![
			Ok(Frame::data(Bytes::from_static(b"name="))),
			Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
		]));
		assert!(matches!(
			collect_body(failing, &ProcessorConfig::default()).await,
			Err(ParseError::Body(_))
		));
	}
}
