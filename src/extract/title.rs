//! Title inference for extracted media
//!
//! Each media kind has an ordered list of rules. A rule looks at the media
//! element, its surroundings and its URL and either proposes a title or
//! passes. The first non-blank proposal wins; when every rule passes the
//! kind's placeholder is used, so a title is never empty.

use crate::extract::filename::clean_filename;
use crate::extract::platform::{embed_title, VideoPlatform};
use scraper::{ElementRef, Selector};

const HEADING_SELECTOR: &str = "h1, h2, h3, h4, h5, h6";

/// Attributes carrying a caption on the element or its container
const DATA_ATTRIBUTES: &[&str] = &["data-title", "data-caption"];

/// Minimum alt text length (exclusive) for alt to double as a title;
/// shorter values are usually "img", "icon" or similar filler
const MIN_ALT_TITLE_CHARS: usize = 3;

/// What a title rule gets to look at
pub struct TitleContext<'a> {
    /// The element the media was found on (`<img>`, `<video>`, `<iframe>`)
    pub element: ElementRef<'a>,

    /// The normalized media URL
    pub media_url: &'a str,
}

/// A single step of a title cascade
pub type TitleRule = fn(&TitleContext<'_>) -> Option<String>;

pub const IMAGE_RULES: &[TitleRule] = &[
    title_attribute,
    long_alt_text,
    aria_label,
    figure_caption,
    nearby_heading,
    parent_data_attributes,
    filename,
];

pub const VIDEO_RULES: &[TitleRule] = &[
    title_attribute,
    aria_label,
    own_data_attributes,
    nearby_heading,
    parent_data_attributes,
    filename,
    platform_name,
];

/// Embed paths are opaque video IDs, so the filename rule is replaced by
/// one that reads the embed URL itself
pub const EMBED_RULES: &[TitleRule] = &[
    title_attribute,
    aria_label,
    own_data_attributes,
    nearby_heading,
    parent_data_attributes,
    embed_url,
    platform_name,
];

pub const IMAGE_FALLBACK: &str = "Image";
pub const VIDEO_FALLBACK: &str = "Video";
pub const EMBED_FALLBACK: &str = "Embedded Video";

/// Runs a rule cascade and returns the first non-blank title, trimmed
pub fn infer_title(rules: &[TitleRule], ctx: &TitleContext<'_>, fallback: &str) -> String {
    rules
        .iter()
        .find_map(|rule| non_blank(rule(ctx)))
        .unwrap_or_else(|| fallback.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn attribute(element: &ElementRef<'_>, name: &str) -> Option<String> {
    non_blank(element.value().attr(name).map(str::to_string))
}

/// Collapses the element's text content into single-spaced words
fn collapsed_text(element: &ElementRef<'_>) -> Option<String> {
    let text = element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    non_blank(Some(text))
}

fn parent_element<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.parent().and_then(ElementRef::wrap)
}

fn is_heading(element: &ElementRef<'_>) -> bool {
    matches!(
        element.value().name(),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
    )
}

/// Nearest heading among the element's preceding siblings
fn preceding_heading(element: &ElementRef<'_>) -> Option<String> {
    element
        .prev_siblings()
        .filter_map(ElementRef::wrap)
        .filter(is_heading)
        .find_map(|heading| collapsed_text(&heading))
}

pub fn title_attribute(ctx: &TitleContext<'_>) -> Option<String> {
    attribute(&ctx.element, "title")
}

pub fn long_alt_text(ctx: &TitleContext<'_>) -> Option<String> {
    attribute(&ctx.element, "alt").filter(|alt| alt.chars().count() > MIN_ALT_TITLE_CHARS)
}

pub fn aria_label(ctx: &TitleContext<'_>) -> Option<String> {
    attribute(&ctx.element, "aria-label")
}

/// Caption of the closest enclosing `<figure>`
pub fn figure_caption(ctx: &TitleContext<'_>) -> Option<String> {
    let figure = ctx
        .element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "figure")?;

    let selector = Selector::parse("figcaption").ok()?;
    figure
        .select(&selector)
        .find_map(|caption| collapsed_text(&caption))
}

/// A heading inside the element's container, else the nearest heading
/// preceding the element or its container
pub fn nearby_heading(ctx: &TitleContext<'_>) -> Option<String> {
    let parent = parent_element(&ctx.element);

    if let Some(parent) = parent.as_ref() {
        let selector = Selector::parse(HEADING_SELECTOR).ok()?;
        let inside = parent
            .select(&selector)
            .find_map(|heading| collapsed_text(&heading));
        if inside.is_some() {
            return inside;
        }
    }

    preceding_heading(&ctx.element).or_else(|| parent.as_ref().and_then(preceding_heading))
}

pub fn own_data_attributes(ctx: &TitleContext<'_>) -> Option<String> {
    DATA_ATTRIBUTES
        .iter()
        .find_map(|name| attribute(&ctx.element, name))
}

pub fn parent_data_attributes(ctx: &TitleContext<'_>) -> Option<String> {
    let parent = parent_element(&ctx.element)?;
    DATA_ATTRIBUTES
        .iter()
        .find_map(|name| attribute(&parent, name))
}

pub fn filename(ctx: &TitleContext<'_>) -> Option<String> {
    clean_filename(ctx.media_url)
}

pub fn embed_url(ctx: &TitleContext<'_>) -> Option<String> {
    embed_title(ctx.media_url)
}

pub fn platform_name(ctx: &TitleContext<'_>) -> Option<String> {
    VideoPlatform::from_url(ctx.media_url).map(|platform| platform.default_title())
}
