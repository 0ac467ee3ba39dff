//! HTML safety utilities
//!
//! Escaping for plain-text output and an allow-list sanitizer for untrusted
//! markup submitted through forms.

pub mod policy;
pub mod xss;

pub use policy::{PolicyError, SanitizationPolicy};
pub use xss::{escape_html, escape_html_attr};
