//! XSS prevention utilities

/// Escape HTML special characters
///
/// # Examples
///
/// ```
/// use formwork_core::security::escape_html;
///
/// let input = "<script>alert('XSS')</script>";
/// let escaped = escape_html(input);
/// assert_eq!(escaped, "&lt;script&gt;alert(&#x27;XSS&#x27;)&lt;/script&gt;");
/// ```
pub fn escape_html(input: &str) -> String {
	let mut escaped = String::with_capacity(input.len());
	for ch in input.chars() {
		push_escaped(&mut escaped, ch);
	}
	escaped
}

/// Escape HTML attribute values
///
/// Same as [`escape_html`], and additionally encodes line breaks so a value
/// cannot spill across lines of generated markup.
///
/// # Examples
///
/// ```
/// use formwork_core::security::escape_html_attr;
///
/// let attr = "first\nsecond \"quoted\"";
/// assert_eq!(escape_html_attr(attr), "first&#10;second &quot;quoted&quot;");
/// ```
pub fn escape_html_attr(input: &str) -> String {
	let mut escaped = String::with_capacity(input.len());
	for ch in input.chars() {
		match ch {
			'\n' => escaped.push_str("&#10;"),
			'\r' => escaped.push_str("&#13;"),
			other => push_escaped(&mut escaped, other),
		}
	}
	escaped
}

fn push_escaped(out: &mut String, ch: char) {
	match ch {
		'&' => out.push_str("&amp;"),
		'<' => out.push_str("&lt;"),
		'>' => out.push_str("&gt;"),
		'"' => out.push_str("&quot;"),
		'\'' => out.push_str("&#x27;"),
		other => out.push(other),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("plain text", "plain text")]
	#[case("a & b", "a &amp; b")]
	#[case("<b>", "&lt;b&gt;")]
	#[case(r#"say "hi""#, "say &quot;hi&quot;")]
	#[case("it's", "it&#x27;s")]
	#[case("", "")]
	fn test_escape_html(#[case] input: &str, #[case] expected: &str) {
		assert_eq!(escape_html(input), expected);
	}

	#[test]
	fn test_escape_html_does_not_double_escape_markup_once_escaped() {
		// Escaping is not idempotent; the ampersand of an entity is escaped again.
		assert_eq!(escape_html("&lt;"), "&amp;lt;");
	}

	#[test]
	fn test_escape_html_attr_encodes_line_breaks() {
		assert_eq!(escape_html_attr("a\r\nb"), "a&#13;&#10;b");
		assert_eq!(escape_html_attr("<x>"), "&lt;x&gt;");
	}
}
