//! Scoped-name template engine
//!
//! Renders naming templates like `[local]_[hash:base64:6]` into concrete
//! class names. The hash token is a 128-bit MD5 digest of the style file's
//! content, so the generated name is stable for identical content and
//! differs (with overwhelming probability) when the content changes.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use md5::{Digest, Md5};

/// Default naming template applied when the caller does not configure one.
pub const DEFAULT_SCOPED_NAME: &str = "[local]_[hash:base64:6]";

/// Default digest truncation length when the template does not specify one.
pub const DEFAULT_HASH_LENGTH: usize = 6;

/// Encoding applied to the content digest before truncation.
///
/// Unrecognized format names in a template silently fall back to `Hex`;
/// a permissive template language beats failing a whole build over a typo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashFormat {
    /// Digest bytes mapped one-to-one onto U+0000..U+00FF
    Latin1,
    /// Lowercase hexadecimal
    #[default]
    Hex,
    /// Standard base64 alphabet with padding
    Base64,
}

impl HashFormat {
    /// Parse a format name from a template segment, falling back to `Hex`.
    pub fn parse(name: &str) -> Self {
        match name {
            "latin1" => HashFormat::Latin1,
            "base64" => HashFormat::Base64,
            _ => HashFormat::Hex,
        }
    }
}

/// One piece of a parsed naming template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateToken {
    /// Literal text copied through unchanged
    Literal(String),
    /// The `[local]` token - the class's original name
    Local,
    /// A `[hash...]` token - content digest in the given encoding/length
    Hash { format: HashFormat, length: usize },
}

/// Parse a naming template into typed tokens.
///
/// Recognizes at most one `[local]` and one `[hash...]` token (first
/// occurrence each); later duplicates and anything that does not parse as a
/// token stay literal text, including unterminated brackets.
pub fn parse_template(template: &str) -> Vec<TemplateToken> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut saw_local = false;
    let mut saw_hash = false;

    let mut rest = template;
    loop {
        let Some(open) = rest.find('[') else {
            literal.push_str(rest);
            break;
        };
        literal.push_str(&rest[..open]);
        let bracketed = &rest[open..];
        let Some(close) = bracketed.find(']') else {
            literal.push_str(bracketed);
            break;
        };
        let inner = &bracketed[1..close];
        let token_text = &bracketed[..=close];
        rest = &bracketed[close + 1..];

        let consumed = if inner == "local" {
            if saw_local {
                false
            } else {
                saw_local = true;
                flush_literal(&mut literal, &mut tokens);
                tokens.push(TemplateToken::Local);
                true
            }
        } else if let Some(token) = parse_hash_token(inner) {
            if saw_hash {
                false
            } else {
                saw_hash = true;
                flush_literal(&mut literal, &mut tokens);
                tokens.push(token);
                true
            }
        } else {
            false
        };

        if !consumed {
            literal.push_str(token_text);
        }
    }

    flush_literal(&mut literal, &mut tokens);
    tokens
}

fn flush_literal(literal: &mut String, tokens: &mut Vec<TemplateToken>) {
    if !literal.is_empty() {
        tokens.push(TemplateToken::Literal(std::mem::take(literal)));
    }
}

/// Parse the inside of a `[hash...]` bracket expression.
///
/// Accepts `hash`, `hash:<format>`, `hash:<length>`, `hash:<format>:<length>`
/// in any segment order: an all-digit segment sets the length (last wins),
/// any other segment names the encoding.
fn parse_hash_token(inner: &str) -> Option<TemplateToken> {
    let mut segments = inner.split(':');
    if segments.next() != Some("hash") {
        return None;
    }

    let mut format = HashFormat::default();
    let mut length = DEFAULT_HASH_LENGTH;
    for segment in segments {
        if segment.is_empty() {
            continue;
        }
        if segment.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = segment.parse() {
                length = n;
            }
        } else {
            format = HashFormat::parse(segment);
        }
    }

    Some(TemplateToken::Hash { format, length })
}

/// Compute the encoded, truncated content digest for a hash token.
///
/// A digest shorter than the requested length is returned whole - never
/// padded. Very short lengths raise the collision risk; that is the
/// caller's documented tradeoff.
pub fn hash_digest(content: &[u8], format: HashFormat, length: usize) -> String {
    let digest = Md5::digest(content);
    let encoded: String = match format {
        HashFormat::Hex => format!("{:x}", digest),
        HashFormat::Base64 => BASE64_STANDARD.encode(digest),
        HashFormat::Latin1 => digest.iter().map(|&b| char::from(b)).collect(),
    };
    if encoded.chars().count() < length {
        encoded
    } else {
        encoded.chars().take(length).collect()
    }
}

/// Render a naming template for one class.
///
/// Pure and deterministic: the same `(template, local, content)` triple
/// always yields the same name.
///
/// # Example
///
/// ```
/// use stylescope::template::render_scoped_name;
///
/// assert_eq!(render_scoped_name("[local]", "button", b"whatever"), "button");
/// assert_eq!(render_scoped_name("x_[local]_y", "button", b""), "x_button_y");
/// ```
pub fn render_scoped_name(template: &str, local: &str, content: &[u8]) -> String {
    let mut out = String::new();
    for token in parse_template(template) {
        match token {
            TemplateToken::Literal(text) => out.push_str(&text),
            TemplateToken::Local => out.push_str(local),
            TemplateToken::Hash { format, length } => {
                out.push_str(&hash_digest(content, format, length));
            }
        }
    }
    out
}
