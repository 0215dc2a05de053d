//! The Office/Candidates "candidates" cell: a flat run of check-mark images,
//! candidate links, text and line breaks. A check mark marks the next
//! candidate link as the winner.

use scraper::{ElementRef, Node};

use crate::dom;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellEvent {
    /// Winner check-mark image.
    Marker,
    Link { name: String, href: String, target: Option<String> },
    Text(String),
    /// Anything else (`br`, logos, wrappers). Leaves the state alone.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingMarker,
    MarkerSeen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellCandidate {
    pub name: String,
    pub url: String,
    pub is_winner: bool,
    pub is_incumbent: bool,
}

/// Events for the direct children of `cell`, in document order.
pub fn cell_events(cell: ElementRef<'_>) -> Vec<CellEvent> {
    cell.children()
        .map(|node| match node.value() {
            Node::Text(t) => CellEvent::Text(t.to_string()),
            Node::Element(e) => match e.name() {
                "img" if e.attr("alt").is_some_and(|a| a.to_lowercase().contains("check")) => CellEvent::Marker,
                "a" => {
                    let name = ElementRef::wrap(node).map(dom::text_of).unwrap_or_default();
                    CellEvent::Link {
                        name,
                        href: e.attr("href").unwrap_or("").to_string(),
                        target: e.attr("target").map(str::to_string),
                    }
                }
                _ => CellEvent::Other,
            },
            _ => CellEvent::Other,
        })
        .collect()
}

/// Run the winner state machine over one cell's events.
///
/// Survey and off-site links (`target=_blank`, `#Campaign_themes`) are skipped
/// without consuming a pending marker. Text directly after an emitted
/// candidate carrying `(i)` marks that candidate as the incumbent.
pub fn parse_cell(events: &[CellEvent], base_url: &str) -> Vec<CellCandidate> {
    let mut state = State::AwaitingMarker;
    let mut out: Vec<CellCandidate> = Vec::new();
    let mut just_emitted = false;

    for ev in events {
        match ev {
            CellEvent::Marker => {
                state = State::MarkerSeen;
                just_emitted = false;
            }
            CellEvent::Link { name, href, target } => {
                just_emitted = false;
                if target.as_deref() == Some("_blank") || href.contains("#Campaign_themes") { continue; }
                let name = name.trim().trim_end_matches('*').trim();
                if name.is_empty() { continue; }
                out.push(CellCandidate {
                    name: name.to_string(),
                    url: if href.is_empty() { String::new() } else { dom::absolute_url(base_url, href) },
                    is_winner: state == State::MarkerSeen,
                    is_incumbent: false,
                });
                state = State::AwaitingMarker;
                just_emitted = true;
            }
            CellEvent::Text(t) => {
                if just_emitted && t.contains("(i)") {
                    if let Some(last) = out.last_mut() { last.is_incumbent = true; }
                }
                just_emitted = false;
            }
            CellEvent::Other => just_emitted = false,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const BASE: &str = "https://ballotpedia.org";

    fn link(name: &str) -> CellEvent {
        CellEvent::Link { name: name.into(), href: format!("/{}", name.replace(' ', "_")), target: None }
    }

    #[test]
    fn marker_then_incumbent_then_plain() {
        let events = [CellEvent::Marker, link("Jane Doe"), CellEvent::Text(" (i)".into()), CellEvent::Other, link("John Smith")];
        let got = parse_cell(&events, BASE);
        assert_eq!(got.len(), 2);
        assert!(got[0].is_winner && got[0].is_incumbent);
        assert_eq!(got[0].url, "https://ballotpedia.org/Jane_Doe");
        assert!(!got[1].is_winner && !got[1].is_incumbent);
    }

    #[test]
    fn survey_links_keep_the_pending_marker() {
        let events = [
            CellEvent::Marker,
            CellEvent::Link { name: "Candidate Connection".into(), href: "/Survey".into(), target: Some("_blank".into()) },
            CellEvent::Link { name: "themes".into(), href: "/Jane#Campaign_themes".into(), target: None },
            CellEvent::Marker,
            link("Jane Doe*"),
            link(""),
        ];
        let got = parse_cell(&events, BASE);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].name, "Jane Doe");
        assert!(got[0].is_winner);
    }

    #[test]
    fn incumbent_text_must_follow_the_link() {
        let events = [link("A"), CellEvent::Other, CellEvent::Text("(i)".into())];
        assert!(!parse_cell(&events, BASE)[0].is_incumbent);
    }

    #[test]
    fn events_from_markup() {
        let doc = Html::parse_fragment(
            r#"<table><tr><td id="c"><img alt="Green check mark transparent.png"><a href="/Jane_Doe">Jane Doe</a> (i)<br><img alt="Candidate Connection"><a href="/John_Smith">John Smith</a></td></tr></table>"#,
        );
        let sel = dom::css("td#c").unwrap();
        let td = doc.select(&sel).next().unwrap();
        let events = cell_events(td);
        assert_eq!(events[0], CellEvent::Marker);
        assert!(matches!(&events[1], CellEvent::Link { name, .. } if name == "Jane Doe"));
        assert_eq!(events[2], CellEvent::Text(" (i)".into()));

        let got = parse_cell(&events, BASE);
        assert_eq!(got.len(), 2);
        assert!(got[0].is_winner && got[0].is_incumbent);
        assert!(!got[1].is_winner);
    }
}
