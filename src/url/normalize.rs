use url::Url;

/// Returns true if a raw media source attribute is worth keeping
///
/// Rejects empty sources, inline `data:` URIs and SVG files (usually icons
/// and logos rather than content). Checks are case-insensitive.
///
/// # Examples
///
/// ```
/// use magpie::url::is_acceptable_source;
///
/// assert!(is_acceptable_source("/photos/cat.jpg"));
/// assert!(!is_acceptable_source("data:image/png;base64,AAAA"));
/// assert!(!is_acceptable_source("/icons/logo.SVG"));
/// assert!(!is_acceptable_source("   "));
/// ```
pub fn is_acceptable_source(src: &str) -> bool {
    let src = src.trim();
    if src.is_empty() {
        return false;
    }

    let lower = src.to_ascii_lowercase();
    !(lower.starts_with("data:") || lower.ends_with(".svg"))
}

/// Resolves a media source against the page it was found on
///
/// # Resolution Rules
///
/// 1. `http://` or `https://` sources are returned unchanged
/// 2. Protocol-relative sources (`//host/path`) get an `https:` prefix
/// 3. If the base URL does not parse, the source is returned unchanged
/// 4. Root-relative sources (`/path`) are joined to the base's scheme and host
/// 5. Anything else is resolved relative to the base URL
///
/// Never fails; the worst case is the trimmed source coming back as-is.
///
/// # Examples
///
/// ```
/// use magpie::url::normalize;
///
/// let base = "https://ex.com/gallery/page";
/// assert_eq!(normalize("/a.jpg", base), "https://ex.com/a.jpg");
/// assert_eq!(normalize("//cdn.ex.com/b.jpg", base), "https://cdn.ex.com/b.jpg");
/// assert_eq!(normalize("c.jpg", base), "https://ex.com/gallery/c.jpg");
/// ```
pub fn normalize(src: &str, base_url: &str) -> String {
    let src = src.trim();

    if has_http_scheme(src) {
        return src.to_string();
    }

    if src.starts_with("//") {
        return format!("https:{}", src);
    }

    let base = match Url::parse(base_url) {
        Ok(base) => base,
        Err(_) => return src.to_string(),
    };

    if src.starts_with('/') {
        let origin = base.origin();
        if origin.is_tuple() {
            return format!("{}{}", origin.ascii_serialization(), src);
        }
    }

    match base.join(src) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => src.to_string(),
    }
}

fn has_http_scheme(src: &str) -> bool {
    let prefix: String = src.chars().take(8).collect::<String>().to_ascii_lowercase();
    prefix.starts_with("http://") || prefix.starts_with("https://")
}
