//! Buffered HTTP request type for formwork
//!
//! Servers hand the form pipeline a [`Request`] whose body has already been
//! collected into memory. [`FormBody`] and [`MultipartBody`] build encoded
//! form payloads for clients and tests.

pub mod body;
pub mod request;

pub use body::{FormBody, MultipartBody};
pub use request::{Request, RequestBuilder, RequestError};

// Re-export the http types that appear in the public API
pub use bytes::Bytes;
pub use http::{HeaderMap, Method, Uri, Version};
