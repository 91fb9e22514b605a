//! Slug derivation from article titles.

/// Derive a URL-safe slug from a title.
///
/// Mirrors the site's historical behavior: trim, lowercase, whitespace runs
/// become single hyphens, then every character outside ASCII word characters,
/// CJK ideographs (U+4E00..=U+9FA5), and `-` is dropped. Repeated hyphens are
/// collapsed and leading/trailing hyphens trimmed. Chinese titles keep their
/// characters verbatim rather than being transliterated.
pub fn derive(title: &str) -> String {
    let lowered = title.trim().to_lowercase();

    // Whitespace first, then the character filter, matching the original
    // replacement order so punctuation between words doesn't leave gaps.
    let mut out = String::with_capacity(lowered.len());
    let mut prev_space = false;
    for c in lowered.chars() {
        if c.is_whitespace() {
            if !prev_space {
                out.push('-');
            }
            prev_space = true;
        } else {
            prev_space = false;
            if keep(c) {
                out.push(c);
            }
        }
    }

    // Collapse runs of hyphens and trim the ends.
    let mut slug = String::with_capacity(out.len());
    let mut prev_hyphen = false;
    for c in out.chars() {
        if c == '-' {
            if !prev_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            prev_hyphen = true;
        } else {
            prev_hyphen = false;
            slug.push(c);
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Characters that survive derivation: ASCII word chars, CJK ideographs, `-`.
fn keep(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || ('\u{4e00}'..='\u{9fa5}').contains(&c)
}
