//! Display strings (mod names, descriptions, option names) may carry HTML-like markup. Front-ends
//! that cannot render it, and anything comparing names, work on the plain text instead.

use std::{borrow::Cow, sync::LazyLock};

use regex::{Captures, Regex};

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^<>]*>").unwrap());

static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap());

/// Extracts plain text from markup-containing text. This is *not* input sanitisation.
///
/// Removes tags and decodes entities, `<b>&amp;</b>` becomes `&`. Unknown entities are left as
/// written.
pub fn to_plain_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['<', '&']) {
        return Cow::Borrowed(text);
    }

    let stripped = TAG.replace_all(text, "");
    let decoded = ENTITY.replace_all(&stripped, |caps: &Captures| {
        decode_entity(&caps[1]).map_or_else(|| caps[0].to_owned(), String::from)
    });

    Cow::Owned(decoded.into_owned())
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }

    if let Some(dec) = entity.strip_prefix('#') {
        return dec.parse().ok().and_then(char::from_u32);
    }

    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

/// The key mods are sorted by: plain text, trimmed, case-insensitive.
pub fn sort_key(name: &str) -> String {
    to_plain_text(name.trim()).trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_decodes_entities() {
        assert_eq!(to_plain_text("<b>&amp;</b>"), "&");
        assert_eq!(
            to_plain_text("<font color='#ffff00'>Incompatible</font> &lt;3 &#65;&#x42;"),
            "Incompatible <3 AB"
        );
        assert_eq!(to_plain_text("&bogus; stays"), "&bogus; stays");
    }

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(to_plain_text("Plain"), Cow::Borrowed("Plain")));
    }

    #[test]
    fn sort_key_ignores_case_and_markup() {
        assert_eq!(sort_key("  <i>Zebra</i> "), "zebra");
        assert_eq!(sort_key("apple"), sort_key("APPLE"));
    }
}
