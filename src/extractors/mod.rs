//! One extractor per venue, behind the [`VenueExtractor`] trait, plus the
//! small traversal engine they share: bounded ancestor walks from a candidate
//! title node to its enclosing event card.

pub mod academy_museum;
pub mod american_cinematheque;
pub mod new_beverly;
pub mod vidiots;
pub mod vista;

use crate::constants;
use crate::types::VenueExtractor;
use scraper::ElementRef;

/// Builds the extractor registered under `key`, if any.
pub fn create_extractor(key: &str) -> Option<Box<dyn VenueExtractor>> {
    match key {
        constants::VISTA => Some(Box::new(vista::VistaExtractor::new())),
        constants::NEW_BEVERLY => Some(Box::new(new_beverly::NewBeverlyExtractor::new())),
        constants::VIDIOTS => Some(Box::new(vidiots::VidiotsExtractor::new())),
        constants::ACADEMY_MUSEUM => Some(Box::new(academy_museum::AcademyMuseumExtractor::new())),
        constants::AMERICAN_CINEMATHEQUE => Some(Box::new(
            american_cinematheque::AmericanCinemathequeExtractor::new(),
        )),
        _ => None,
    }
}

pub(crate) fn parent_element(el: ElementRef) -> Option<ElementRef> {
    el.parent().and_then(ElementRef::wrap)
}

/// Climbs `levels` ancestor elements, stopping early at the document root.
/// Used by venues whose card sits at a known, fixed nesting depth.
pub(crate) fn ancestor(el: ElementRef, levels: usize) -> Option<ElementRef> {
    let mut current = parent_element(el)?;
    for _ in 1..levels {
        match parent_element(current) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    Some(current)
}

/// Walks up at most `max_depth` ancestors and returns the first one the
/// predicate accepts. Bounded iteration, never recursion.
pub(crate) fn find_container<'a, F>(
    start: ElementRef<'a>,
    max_depth: usize,
    accept: F,
) -> Option<ElementRef<'a>>
where
    F: Fn(ElementRef<'a>) -> bool,
{
    let mut current = parent_element(start)?;
    for _ in 0..max_depth {
        if accept(current) {
            return Some(current);
        }
        current = parent_element(current)?;
    }
    None
}

/// Nearest enclosing `<a href>` of a node, e.g. a title heading wrapped in
/// its event link.
pub(crate) fn enclosing_anchor(el: ElementRef) -> Option<String> {
    let mut current = parent_element(el);
    while let Some(element) = current {
        if element.value().name() == "a" {
            if let Some(href) = element.value().attr("href") {
                return Some(href.to_string());
            }
        }
        current = parent_element(element);
    }
    None
}

/// Element text with runs of whitespace collapsed, fragments joined without
/// separators. Matches how titles render on the page.
pub(crate) fn text_joined(el: ElementRef) -> String {
    collapse_ws(&el.text().collect::<String>())
}

/// Element text with a space between fragments; used when scanning card
/// text for dates and times that span child elements.
pub(crate) fn text_spaced(el: ElementRef) -> String {
    collapse_ws(&el.text().collect::<Vec<_>>().join(" "))
}

pub(crate) fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves venue-relative hrefs against the venue host.
pub(crate) fn absolutize(base: &str, href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{}{}", base, href)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn test_ancestor_climbs_fixed_levels() {
        let html = Html::parse_fragment(r#"<div id="card"><div><h4>Title</h4></div></div>"#);
        let h4 = Selector::parse("h4").unwrap();
        let heading = html.select(&h4).next().unwrap();

        let card = ancestor(heading, 2).unwrap();
        assert_eq!(card.value().attr("id"), Some("card"));
    }

    #[test]
    fn test_ancestor_stops_at_root() {
        let html = Html::parse_fragment("<p>x</p>");
        let p = Selector::parse("p").unwrap();
        let node = html.select(&p).next().unwrap();
        // asking for more levels than exist still yields the outermost element
        assert!(ancestor(node, 50).is_some());
    }

    #[test]
    fn test_find_container_bounded_walk() {
        let html = Html::parse_fragment(
            r#"<div class="far"><div class="hit">7:30 pm<span><em>x</em></span></div></div>"#,
        );
        let em = Selector::parse("em").unwrap();
        let start = html.select(&em).next().unwrap();

        let hit = find_container(start, 10, |el| text_spaced(el).contains("7:30")).unwrap();
        assert_eq!(hit.value().attr("class"), Some("hit"));

        // depth ceiling of 1 stops before the matching ancestor
        assert!(find_container(start, 1, |el| text_spaced(el).contains("7:30")).is_none());
    }

    #[test]
    fn test_enclosing_anchor() {
        let html = Html::parse_fragment(r#"<a href="/film/1"><span><h4>Title</h4></span></a>"#);
        let h4 = Selector::parse("h4").unwrap();
        let heading = html.select(&h4).next().unwrap();
        assert_eq!(enclosing_anchor(heading).as_deref(), Some("/film/1"));
    }

    #[test]
    fn test_absolutize() {
        assert_eq!(
            absolutize("https://example.com", "/tickets/5"),
            "https://example.com/tickets/5"
        );
        assert_eq!(
            absolutize("https://example.com", "https://other.org/x"),
            "https://other.org/x"
        );
    }
}
