//! # formwork
//!
//! Typed form processing for Rust web services.
//!
//! A form submission is turned into a populated record in four stages:
//! the request body is **parsed** into raw pairs, the pairs are **decoded**
//! onto typed fields, named **transformations** clean the values, and
//! declarative **rules** validate the result. Each stage reports its own
//! error category so handlers can answer `400`, `415` or `422` without
//! inspecting messages.
//!
//! ## Feature Flags
//!
//! - `forms` (default) - The processing pipeline from `formwork-forms`
//!
//! The `core` and `http` modules are always available.
//!
//! ## Quick Example
//!
//! ```rust
//! # #[cfg(feature = "forms")]
//! # {
//! use formwork::prelude::*;
//!
//! #[derive(Debug, Default)]
//! struct Comment {
//!     author: String,
//!     body: String,
//!     rating: u8,
//! }
//!
//! impl FormRecord for Comment {
//!     fn schema() -> Schema<Self> {
//!         Schema::<Self>::builder()
//!             .field("author", |c| &c.author, |c| &mut c.author, |f| {
//!                 f.required().transform("trim").max_length(40)
//!             })
//!             .field("body", |c| &c.body, |c| &mut c.body, |f| {
//!                 f.transform("trim").transform("sanitize")
//!             })
//!             .field("rating", |c| &c.rating, |c| &mut c.rating, |f| f.gte(1).lte(5))
//!             .build()
//!     }
//! }
//!
//! let processor = FormProcessor::builder().register::<Comment>().build().unwrap();
//! let request = Request::builder()
//!     .method(Method::POST)
//!     .form(FormBody::new().field("author", " Ann ").field("body", "<i>Nice</i>").field("rating", "5"))
//!     .build()
//!     .unwrap();
//!
//! let mut comment = Comment::default();
//! let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! runtime.block_on(processor.process(&mut comment, &request)).unwrap();
//!
//! assert_eq!(comment.author, "Ann");
//! assert_eq!(comment.body, "Nice");
//! # }
//! ```

pub mod core;
#[cfg(feature = "forms")]
pub mod forms;
pub mod http;

// Re-export request types
pub use formwork_http::{FormBody, MultipartBody, Request, RequestBuilder, RequestError};

// Re-export the pipeline
#[cfg(feature = "forms")]
pub use formwork_forms::{
	ErrorKind, FieldSpec, FormProcessor, FormProcessorBuilder, FormRecord, ProcessingError,
	ProcessorConfig, RawSubmission, Rule, Schema, Violation, Violations, collect_body,
};

// Re-export security and validation building blocks
pub use formwork_core::{SanitizationPolicy, escape_html};

/// Prelude module for convenient imports
///
/// Import everything commonly needed with:
/// ```rust
/// use formwork::prelude::*;
/// ```
pub mod prelude {
	pub use crate::{FormBody, MultipartBody, Request, SanitizationPolicy};
	pub use formwork_http::Method;

	#[cfg(feature = "forms")]
	pub use crate::{
		ErrorKind, FieldSpec, FormProcessor, FormRecord, ProcessingError, ProcessorConfig,
		RawSubmission, Rule, Schema, collect_body,
	};
	#[cfg(feature = "forms")]
	pub use formwork_forms::{
		CustomRule, FieldKind, FieldValue, RuleFn, TextTransform, Transform, TransformFailure,
	};
}
