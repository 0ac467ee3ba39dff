//! Sanitization policies and value validators.
//!
//! # Examples
//!
//! ```rust
//! use formwork::core::validators::{MaxValueValidator, Validator};
//!
//! let validator = MaxValueValidator::new(100);
//! assert!(validator.validate(&42).is_ok());
//! assert!(validator.validate(&150).is_err());
//! ```

pub use formwork_core::*;
