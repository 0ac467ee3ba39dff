//! Core building blocks for formwork
//!
//! This crate holds the pieces of the form pipeline that do not depend on
//! HTTP or on a particular record type:
//!
//! - [`security`]: HTML escaping and the allow-list [`SanitizationPolicy`]
//!   used by the `sanitize` transformation.
//! - [`validators`]: Django-style value validators (bounds, lengths, email,
//!   URL, patterns, choices) and the [`Number`] type numeric rules compare.
//!
//! [`SanitizationPolicy`]: security::SanitizationPolicy
//! [`Number`]: validators::Number

pub mod security;
pub mod validators;

pub use security::{PolicyError, SanitizationPolicy, escape_html};
pub use validators::{Number, ValidationError, ValidationResult, Validator};
