/// Converts a camel-cased name into its hyphenated form.
///
/// Every ASCII uppercase letter becomes `-` followed by its lowercase form. A
/// leading uppercase letter therefore yields a leading hyphen.
pub fn to_kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Converts a hyphenated name into camel case.
///
/// Only a hyphen followed by an ASCII lowercase letter is folded; any other
/// hyphen is kept as-is.
pub fn to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '-'
            && let Some(next) = chars.peek().copied()
            && next.is_ascii_lowercase()
        {
            out.push(next.to_ascii_uppercase());
            chars.next();
            continue;
        }
        out.push(ch);
    }
    out
}
