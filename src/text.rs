//! String helpers: slug derivation and excerpt truncation

/// Upper bound on slug length in bytes.
///
/// Slugs only ever contain ASCII, so this is also the character count.
pub const MAX_SLUG_LEN: usize = 200;

/// Derives a URL-safe slug from a title or name.
///
/// The input is lowercased, every maximal run of characters outside
/// `[a-z0-9]` becomes a single `-`, and leading/trailing hyphens are
/// stripped. The result is capped at [`MAX_SLUG_LEN`] bytes.
///
/// Total and pure: all-symbol input yields an empty string, which callers
/// must handle.
///
/// ```
/// use rulehub::text::slugify;
///
/// assert_eq!(slugify("React Hooks Expert"), "react-hooks-expert");
/// assert_eq!(slugify("Next.js"), "next-js");
/// assert_eq!(slugify("  --C++ / Rust--  "), "c-rust");
/// assert_eq!(slugify("!!!"), "");
/// ```
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len().min(MAX_SLUG_LEN));
    let mut pending_dash = false;

    for ch in input.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
            if out.len() >= MAX_SLUG_LEN {
                break;
            }
        } else {
            pending_dash = true;
        }
    }

    out.truncate(MAX_SLUG_LEN);
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Shortens `text` to at most `max_chars` characters, ending in `...` when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.truncate(out.trim_end().len());
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Hello  World"), "hello-world");
        assert_eq!(slugify("Rust Development"), "rust-development");
        assert_eq!(slugify("React Hooks Expert"), "react-hooks-expert");
        assert_eq!(slugify("Next.js"), "next-js");
        assert_eq!(slugify("NEXT.JS"), "next-js");
        assert_eq!(slugify("next js"), "next-js");
        assert_eq!(slugify("Test 123"), "test-123");
    }

    #[test]
    fn test_slugify_strips_edges() {
        assert_eq!(slugify("--hello--"), "hello");
        assert_eq!(slugify("  (TypeScript)  "), "typescript");
        assert_eq!(slugify("C++"), "c");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("   "), "");
        assert_eq!(slugify("日本語"), "");
    }

    #[test]
    fn test_slugify_non_ascii_letters_are_separators() {
        assert_eq!(slugify("Café Crème"), "caf-cr-me");
        assert_eq!(slugify("über fast"), "ber-fast");
    }

    #[test]
    fn test_slugify_is_idempotent() {
        let inputs = [
            "React Hooks Expert",
            "Next.js",
            "  --weird__input!!  ",
            "Café Crème",
            "a",
            "",
            "---",
            "Tailwind CSS / shadcn-ui",
            "UPPER lower 42",
        ];
        for input in inputs {
            let once = slugify(input);
            assert_eq!(slugify(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_slugify_caps_length() {
        let long = "word ".repeat(100);
        let slug = slugify(&long);
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
        assert_eq!(slugify(&slug), slug);

        let unbroken = "a".repeat(500);
        assert_eq!(slugify(&unbroken).len(), MAX_SLUG_LEN);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello World", 20), "Hello World");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Test", 4), "Test");
        assert_eq!(truncate("ééééé", 4), "é...");
    }
}
