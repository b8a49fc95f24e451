//! Extraction of album records from scraped listing and detail pages.
//!
//! Lookups are best effort: anything the page does not expose is left empty,
//! and only a missing title or artist name makes a page unusable.

use crate::catalog::{Album, Artist, Track};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Maximum number of album links taken from one listing page.
pub const LINKS_LIMIT: usize = 10;

const TITLE_ANCHOR: &str = "Title:";
const YEAR_ANCHOR: &str = "Year:";

lazy_static! {
    static ref ANY: Selector = Selector::parse("*").expect("valid selector");
    static ref HREF: Selector = Selector::parse("[href]").expect("valid selector");
    static ref SPAN: Selector = Selector::parse("span").expect("valid selector");
    static ref LINK: Selector = Selector::parse("a").expect("valid selector");
    static ref ARTIST_NAME: Selector = Selector::parse("#artistname").expect("valid selector");
    static ref COVER: Selector =
        Selector::parse(r#"img[alt^="Download"]"#).expect("valid selector");
    static ref HEADING: Selector =
        Selector::parse("h1, h2, h3, h4, h5, h6").expect("valid selector");
}

/// Hrefs matching `link_pattern`, in document order, at most [`LINKS_LIMIT`].
pub fn list_album_links(listing_html: &str, link_pattern: &Regex) -> Vec<String> {
    let document = Html::parse_document(listing_html);
    document
        .select(&HREF)
        .filter_map(|el| el.value().attr("href"))
        .filter(|href| link_pattern.is_match(href))
        .take(LINKS_LIMIT)
        .map(str::to_string)
        .collect()
}

/// Build an album from a detail page. `None` when the page has no usable
/// title or artist name.
pub fn parse_album(detail_html: &str, track_link_pattern: &Regex) -> Option<Album> {
    let document = Html::parse_document(detail_html);

    let title = parse_title(&document)?;
    let artist_name = parse_artist_name(&document)?;
    let year = parse_year(&document);
    let image_url = document
        .select(&COVER)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string);
    let tracks = parse_tracks(&document, track_link_pattern);

    Some(
        Album::new(title, Some(Artist::new(artist_name, "")), year, tracks)
            .with_image_url(image_url),
    )
}

fn parse_title(document: &Html) -> Option<String> {
    let label = find_label(document, TITLE_ANCHOR)?;
    near_label(label, &SPAN, TITLE_ANCHOR)
        .or_else(|| label_remainder(label, TITLE_ANCHOR))
        .filter(|title| !title.is_empty())
}

fn parse_artist_name(document: &Html) -> Option<String> {
    let element = document.select(&ARTIST_NAME).next()?;
    let from_spans = element
        .select(&SPAN)
        .map(text_of)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let name = if from_spans.is_empty() {
        text_of(element)
    } else {
        from_spans
    };
    (!name.is_empty()).then_some(name)
}

fn parse_year(document: &Html) -> u32 {
    let Some(label) = find_label(document, YEAR_ANCHOR) else {
        return 0;
    };
    near_label(label, &LINK, YEAR_ANCHOR)
        .and_then(|text| first_number(&text))
        .or_else(|| label_remainder(label, YEAR_ANCHOR).and_then(|text| first_number(&text)))
        .unwrap_or(0)
}

fn parse_tracks(document: &Html, track_link_pattern: &Regex) -> Vec<Track> {
    document
        .select(&HREF)
        .filter(|el| {
            el.value()
                .attr("href")
                .is_some_and(|href| track_link_pattern.is_match(href))
        })
        .filter_map(|el| el.parent().and_then(ElementRef::wrap))
        .filter_map(|parent| parent.select(&HEADING).next())
        .map(text_of)
        .filter(|title| !title.is_empty())
        .map(Track::untimed)
        .collect()
}

const NON_CONTENT_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// First element whose own text (not its descendants') contains `anchor`.
/// Script and style bodies are not page text and never match.
fn find_label<'a>(document: &'a Html, anchor: &str) -> Option<ElementRef<'a>> {
    document
        .select(&ANY)
        .filter(|el| !is_non_content(*el))
        .find(|el| own_text(*el).contains(anchor))
}

fn is_non_content(element: ElementRef) -> bool {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .any(|el| NON_CONTENT_ELEMENTS.contains(&el.value().name()))
}

/// Text of the first `selector` match inside the label, else inside its
/// parent. Matches that contain the label itself are ignored.
fn near_label(label: ElementRef, selector: &Selector, anchor: &str) -> Option<String> {
    let pick = |scope: ElementRef| {
        scope
            .select(selector)
            .filter(|el| el.id() != label.id())
            .map(text_of)
            .find(|text| !text.is_empty() && !text.contains(anchor))
    };

    pick(label).or_else(|| label.parent().and_then(ElementRef::wrap).and_then(pick))
}

fn label_remainder(label: ElementRef, anchor: &str) -> Option<String> {
    let own = own_text(label);
    let (_, rest) = own.split_once(anchor)?;
    let rest = normalize_whitespace(rest);
    (!rest.is_empty()).then_some(rest)
}

fn first_number(text: &str) -> Option<u32> {
    text.split_whitespace()
        .find(|token| token.chars().all(|c| c.is_ascii_digit()))
        .and_then(|token| token.parse().ok())
}

fn own_text(element: ElementRef) -> String {
    element
        .children()
        .filter_map(|child| child.value().as_text().map(|t| (&**t).to_owned()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn text_of(element: ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
