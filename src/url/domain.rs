use url::Url;

/// Extracts the lowercase host from an absolute URL string
///
/// Returns `None` when the string does not parse or has no host.
///
/// # Examples
///
/// ```
/// use magpie::url::extract_host;
///
/// assert_eq!(
///     extract_host("https://WWW.YouTube.com/embed/abc"),
///     Some("www.youtube.com".to_string())
/// );
/// assert_eq!(extract_host("not a url"), None);
/// ```
pub fn extract_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .map(|host| host.to_lowercase())
}

/// Returns true if the URL's host contains any of the given needles
///
/// Substring matching lets `www.youtube.com` and `player.vimeo.com` match
/// their bare domains.
pub fn host_matches_any(url: &str, needles: &[&str]) -> bool {
    match extract_host(url) {
        Some(host) => needles.iter().any(|needle| host.contains(needle)),
        None => false,
    }
}
