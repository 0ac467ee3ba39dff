//! Request type and body builders.
//!
//! # Examples
//!
//! ```rust
//! use formwork::http::{FormBody, Method, Request};
//!
//! let request = Request::builder()
//!     .method(Method::POST)
//!     .uri("/comments?draft=1")
//!     .form(FormBody::new().field("body", "Hello"))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(request.query_string(), Some("draft=1"));
//! assert_eq!(request.body().as_ref(), b"body=Hello");
//! ```

pub use formwork_http::*;
