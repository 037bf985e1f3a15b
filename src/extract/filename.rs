//! Turns media file names into readable titles

use url::Url;

/// Builds a readable title from the file name at the end of a media URL
///
/// `sunset-over_theBay.jpg` becomes `Sunset Over The Bay`. Returns `None`
/// when the result is too short (two characters or fewer) or only digits,
/// since names like `12.jpg` or `0042.png` carry no meaning.
///
/// # Examples
///
/// ```
/// use magpie::extract::clean_filename;
///
/// assert_eq!(
///     clean_filename("https://ex.com/img/sunset-over_theBay.jpg"),
///     Some("Sunset Over The Bay".to_string())
/// );
/// assert_eq!(clean_filename("https://ex.com/img/0042.png"), None);
/// ```
pub fn clean_filename(media_url: &str) -> Option<String> {
    let name = last_path_segment(media_url)?;
    let name = name.replace("%20", " ");

    let stem = match name.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => name.as_str(),
    };

    let spaced = split_camel_case(&stem.replace(['-', '_', '+'], " "));
    let title = spaced
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");

    let significant: String = title.chars().filter(|c| !c.is_whitespace()).collect();
    if title.chars().count() <= 2 || significant.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    Some(title)
}

fn last_path_segment(media_url: &str) -> Option<String> {
    if let Ok(url) = Url::parse(media_url) {
        return url
            .path_segments()?
            .filter(|segment| !segment.is_empty())
            .last()
            .map(str::to_string);
    }

    // Relative leftovers from an unparseable base
    let path = media_url.split(['?', '#']).next()?;
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Inserts a space at every lower-to-upper case boundary
fn split_camel_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    let mut prev: Option<char> = None;

    for c in input.chars() {
        if let Some(p) = prev {
            if c.is_uppercase() && (p.is_lowercase() || p.is_ascii_digit()) {
                out.push(' ');
            }
        }
        out.push(c);
        prev = Some(c);
    }

    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
