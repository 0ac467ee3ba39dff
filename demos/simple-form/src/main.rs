//! Comment form server
//!
//! Run with `RUST_LOG=debug cargo run -p simple-form` and post a form:
//!
//! ```text
//! curl -d 'author=Ann&body=<b>Hi</b>&rating=4' http://127.0.0.1:3000/comments
//! ```

use bytes::Bytes;
use formwork::forms::{
	ConfigurationError, DecodeError, ParseError, TransformError, ValidationError,
};
use formwork::prelude::*;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper::{Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, Serialize)]
struct Comment {
	author: String,
	email: Option<String>,
	body: String,
	rating: u8,
	tags: Vec<String>,
}

impl FormRecord for Comment {
	fn schema() -> Schema<Self> {
		Schema::<Self>::builder()
			.field("author", |c| &c.author, |c| &mut c.author, |f| {
				f.required()
					.transform("trim")
					.transform("collapse_whitespace")
					.min_length(2)
					.max_length(40)
			})
			.field("email", |c| &c.email, |c| &mut c.email, |f| {
				f.omit_empty().transform("trim").transform("lowercase").email()
			})
			.field("body", |c| &c.body, |c| &mut c.body, |f| {
				f.required().transform("trim").transform("sanitize").max_length(2000)
			})
			.field("rating", |c| &c.rating, |c| &mut c.rating, |f| {
				f.default_value("3").gte(1).lte(5)
			})
			.field("tags", |c| &c.tags, |c| &mut c.tags, |f| {
				f.key("tag").transform("slug").max_length(5)
			})
			.build()
	}
}

fn slug(text: &str) -> Result<String, TransformFailure> {
	let slug = text
		.trim()
		.to_lowercase()
		.split_whitespace()
		.collect::<Vec<_>>()
		.join("-");
	if slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
		Ok(slug)
	} else {
		Err(TransformFailure::new("tags may only contain letters, digits and spaces"))
	}
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Reply<'a> {
	Accepted { comment: &'a Comment },
	Rejected { stage: ErrorKind, message: String, violations: &'a [formwork::Violation] },
}

struct CommentService {
	processor: Arc<FormProcessor>,
	remote_addr: SocketAddr,
}

impl Service<hyper::Request<Incoming>> for CommentService {
	type Response = Response<Full<Bytes>>;
	type Error = Box<dyn std::error::Error + Send + Sync>;
	type Future =
		Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let processor = Arc::clone(&self.processor);
		let remote_addr = self.remote_addr;

		Box::pin(async move {
			let (parts, body) = req.into_parts();
			if parts.uri.path() != "/comments" {
				return Ok(reply(StatusCode::NOT_FOUND, Bytes::new()));
			}

			let mut comment = Comment::default();
			let outcome = match collect_body(body, processor.config()).await {
				Ok(body) => {
					let request = Request::from_parts(parts, body).with_remote_addr(remote_addr);
					processor.process(&mut comment, &request).await
				}
				Err(error) => Err(ProcessingError::Parsing(error)),
			};

			let (status, payload) = match outcome {
				Ok(()) => {
					tracing::info!(author = %comment.author, %remote_addr, "comment accepted");
					let payload = serde_json::to_vec(&Reply::Accepted { comment: &comment })?;
					(StatusCode::CREATED, payload)
				}
				Err(error) => {
					let reply = Reply::Rejected {
						stage: error.kind(),
						message: error.to_string(),
						violations: error.violations(),
					};
					(status_for(&error), serde_json::to_vec(&reply)?)
				}
			};

			Ok(reply(status, Bytes::from(payload)))
		})
	}
}

fn status_for(error: &ProcessingError) -> StatusCode {
	match error {
		ProcessingError::Parsing(ParseError::UnsupportedMediaType(_)) => {
			StatusCode::UNSUPPORTED_MEDIA_TYPE
		}
		ProcessingError::Parsing(ParseError::PayloadTooLarge { .. }) => {
			StatusCode::PAYLOAD_TOO_LARGE
		}
		ProcessingError::Parsing(ParseError::Timeout(_)) => StatusCode::REQUEST_TIMEOUT,
		ProcessingError::Parsing(_)
		| ProcessingError::Decoding(DecodeError::Field { .. } | DecodeError::UnknownKey(_)) => {
			StatusCode::BAD_REQUEST
		}
		ProcessingError::Transforming(TransformError::Field { .. })
		| ProcessingError::Validating(ValidationError::Failed(_)) => {
			StatusCode::UNPROCESSABLE_ENTITY
		}
		ProcessingError::Decoding(DecodeError::Misconfigured(_))
		| ProcessingError::Transforming(TransformError::Misconfigured(_))
		| ProcessingError::Validating(ValidationError::Misconfigured(_)) => {
			StatusCode::INTERNAL_SERVER_ERROR
		}
	}
}

fn reply(status: StatusCode, body: Bytes) -> Response<Full<Bytes>> {
	let has_body = !body.is_empty();
	let mut response = Response::new(Full::new(body));
	*response.status_mut() = status;
	if has_body {
		response.headers_mut().insert(
			hyper::header::CONTENT_TYPE,
			hyper::header::HeaderValue::from_static("application/json"),
		);
	}
	response
}

async fn handle_connection(
	stream: TcpStream,
	remote_addr: SocketAddr,
	processor: Arc<FormProcessor>,
) -> Result<(), hyper::Error> {
	let service = CommentService {
		processor,
		remote_addr,
	};
	http1::Builder::new()
		.serve_connection(TokioIo::new(stream), service)
		.await
}

fn comment_processor() -> Result<FormProcessor, ConfigurationError> {
	FormProcessor::builder()
		.config(
			ProcessorConfig::new()
				.with_max_body_size(64 * 1024)
				.with_read_timeout(std::time::Duration::from_secs(5)),
		)
		.text_transform("slug", slug)
		.register::<Comment>()
		.build()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.init();

	let processor = Arc::new(comment_processor()?);

	let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
	let listener = TcpListener::bind(addr).await?;
	tracing::info!(%addr, "listening");

	loop {
		let (stream, remote_addr) = listener.accept().await?;
		let processor = Arc::clone(&processor);
		tokio::spawn(async move {
			if let Err(error) = handle_connection(stream, remote_addr, processor).await {
				tracing::warn!(%remote_addr, %error, "connection failed");
			}
		});
	}
}
