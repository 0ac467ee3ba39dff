//! Allow-list HTML sanitization
//!
//! A [`SanitizationPolicy`] decides which elements survive sanitization.
//! Everything else is removed:
//!
//! - Tags outside the allow-list are dropped, but the text between them is kept.
//! - Elements such as `script` and `style` lose their content as well.
//! - Comments, doctypes and processing instructions are dropped.
//! - A `<` that does not open markup is emitted as `&lt;`.
//! - Surviving elements are re-emitted bare (`<b>`, `</b>`) with no attributes.
//!
//! Sanitizing an already sanitized string returns it unchanged.

use std::collections::BTreeSet;

const SKIP_CONTENT_ELEMENTS: &[&str] = &[
	"frameset", "iframe", "noembed", "noframes", "noscript", "object", "script", "style",
	"template", "title",
];

const BASIC_FORMATTING_ELEMENTS: &[&str] = &[
	"b", "br", "code", "em", "i", "mark", "p", "s", "small", "strong", "sub", "sup", "u",
];

/// Errors raised when a policy cannot be used
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
	#[error("element name {0:?} is not a valid HTML tag name")]
	InvalidElement(String),
	#[error("element {0:?} is both allowed and content-skipped")]
	Conflict(String),
}

/// Which markup survives sanitization
///
/// # Examples
///
/// ```
/// use formwork_core::security::SanitizationPolicy;
///
/// let strict = SanitizationPolicy::strict();
/// assert_eq!(strict.sanitize("Bob<script>alert(1)</script>"), "Bob");
/// assert_eq!(strict.sanitize("<b>bold</b> move"), "bold move");
///
/// let formatting = SanitizationPolicy::basic_formatting();
/// assert_eq!(formatting.sanitize(r#"<B onclick="x()">bold</B>"#), "<b>bold</b>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizationPolicy {
	allowed: BTreeSet<String>,
	skip_content: BTreeSet<String>,
}

impl Default for SanitizationPolicy {
	fn default() -> Self {
		Self::strict()
	}
}

impl SanitizationPolicy {
	/// Policy that keeps no markup at all, only text
	pub fn strict() -> Self {
		Self {
			allowed: BTreeSet::new(),
			skip_content: SKIP_CONTENT_ELEMENTS.iter().map(|name| name.to_string()).collect(),
		}
	}

	/// Strict policy plus inline formatting elements such as `b`, `i` and `br`
	pub fn basic_formatting() -> Self {
		Self::strict().allow_elements(BASIC_FORMATTING_ELEMENTS)
	}

	/// Adds elements to the allow-list. Names are case-insensitive.
	pub fn allow_elements<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.allowed
			.extend(names.into_iter().map(|name| name.as_ref().to_ascii_lowercase()));
		self
	}

	/// Adds elements whose content is dropped together with the element
	pub fn skip_content_of<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.skip_content
			.extend(names.into_iter().map(|name| name.as_ref().to_ascii_lowercase()));
		self
	}

	pub fn allows(&self, element: &str) -> bool {
		self.allowed.contains(&element.to_ascii_lowercase())
	}

	pub fn skips_content_of(&self, element: &str) -> bool {
		self.skip_content.contains(&element.to_ascii_lowercase())
	}

	pub fn allowed_elements(&self) -> impl Iterator<Item = &str> {
		self.allowed.iter().map(String::as_str)
	}

	/// Checks that every configured element name is a valid tag name and that
	/// no element is both allowed and content-skipped.
	pub fn validate(&self) -> Result<(), PolicyError> {
		for name in self.allowed.iter().chain(self.skip_content.iter()) {
			if !is_valid_element_name(name) {
				return Err(PolicyError::InvalidElement(name.clone()));
			}
		}
		if let Some(name) = self.allowed.intersection(&self.skip_content).next() {
			return Err(PolicyError::Conflict(name.clone()));
		}
		Ok(())
	}

	/// Removes all markup the policy does not allow
	pub fn sanitize(&self, input: &str) -> String {
		let mut out = String::with_capacity(input.len());
		let mut rest = input;

		while let Some(open) = rest.find('<') {
			out.push_str(&rest[..open]);
			let markup = &rest[open..];
			rest = match scan(markup) {
				Markup::Literal => {
					out.push_str("&lt;");
					&markup[1..]
				}
				Markup::Ignored(len) => &markup[len..],
				Markup::Start {
					name,
					self_closing,
					len,
				} => {
					let after = &markup[len..];
					if self.skip_content.contains(&name) {
						if self_closing {
							after
						} else {
							skip_element(after, &name)
						}
					} else {
						if self.allowed.contains(&name) {
							out.push('<');
							out.push_str(&name);
							out.push('>');
						}
						after
					}
				}
				Markup::End { name, len } => {
					if self.allowed.contains(&name) && !self.skip_content.contains(&name) {
						out.push_str("</");
						out.push_str(&name);
						out.push('>');
					}
					&markup[len..]
				}
				Markup::Unterminated => "",
			};
		}

		out.push_str(rest);
		out
	}

	/// Returns `true` when sanitizing `input` would leave it unchanged
	pub fn permits(&self, input: &str) -> bool {
		self.sanitize(input) == input
	}
}

fn is_valid_element_name(name: &str) -> bool {
	let mut chars = name.chars();
	match chars.next() {
		Some(first) if first.is_ascii_alphabetic() => {
			chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
		}
		_ => false,
	}
}

fn is_name_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '-' || c == ':'
}

/// A piece of markup starting at a `<`
#[derive(Debug, PartialEq, Eq)]
enum Markup {
	/// The `<` does not open markup
	Literal,
	/// Comment, doctype, processing instruction or bogus tag of the given byte length
	Ignored(usize),
	Start {
		name: String,
		self_closing: bool,
		len: usize,
	},
	End {
		name: String,
		len: usize,
	},
	/// Markup that is never closed; it swallows the rest of the input
	Unterminated,
}

fn scan(markup: &str) -> Markup {
	let bytes = markup.as_bytes();
	match bytes.get(1) {
		Some(b'!') => {
			if let Some(comment) = markup.strip_prefix("<!--") {
				match comment.find("-->") {
					Some(end) => Markup::Ignored(4 + end + 3),
					None => Markup::Unterminated,
				}
			} else {
				skip_to_close(markup, 2)
			}
		}
		Some(b'?') => skip_to_close(markup, 2),
		Some(b'/') => match bytes.get(2) {
			Some(b) if b.is_ascii_alphabetic() => {
				let (name, name_end) = tag_name(markup, 2);
				match tag_end(markup, name_end) {
					Some((len, _)) => Markup::End { name, len },
					None => Markup::Unterminated,
				}
			}
			Some(b'>') => Markup::Ignored(3),
			Some(_) => skip_to_close(markup, 2),
			None => Markup::Literal,
		},
		Some(b) if b.is_ascii_alphabetic() => {
			let (name, name_end) = tag_name(markup, 1);
			match tag_end(markup, name_end) {
				Some((len, self_closing)) => Markup::Start {
					name,
					self_closing,
					len,
				},
				None => Markup::Unterminated,
			}
		}
		_ => Markup::Literal,
	}
}

fn skip_to_close(markup: &str, from: usize) -> Markup {
	match markup[from..].find('>') {
		Some(offset) => Markup::Ignored(from + offset + 1),
		None => Markup::Unterminated,
	}
}

fn tag_name(markup: &str, start: usize) -> (String, usize) {
	let end = markup[start..]
		.find(|c: char| !is_name_char(c))
		.map_or(markup.len(), |offset| start + offset);
	(markup[start..end].to_ascii_lowercase(), end)
}

/// Finds the `>` closing a tag, ignoring any inside quoted attribute values.
/// Returns the byte length up to and including `>` and whether the tag is
/// self-closing.
fn tag_end(markup: &str, from: usize) -> Option<(usize, bool)> {
	let mut quote: Option<char> = None;
	let mut previous = None;

	for (offset, ch) in markup[from..].char_indices() {
		match quote {
			Some(open) if ch == open => quote = None,
			Some(_) => {}
			None => match ch {
				'"' | '\'' => quote = Some(ch),
				'>' => return Some((from + offset + 1, previous == Some('/'))),
				_ => {}
			},
		}
		previous = Some(ch);
	}

	None
}

/// Skips everything up to and including the end tag of `name`
fn skip_element<'a>(after: &'a str, name: &str) -> &'a str {
	let lower = after.to_ascii_lowercase();
	let needle = format!("</{name}");
	let mut from = 0;

	while let Some(found) = lower[from..].find(&needle) {
		let boundary = from + found + needle.len();
		match lower[boundary..].chars().next() {
			Some(c) if is_name_char(c) => from = boundary,
			_ => {
				return match tag_end(after, boundary) {
					Some((len, _)) => &after[len..],
					None => "",
				};
			}
		}
	}

	""
}
