//! The event history (`VEOHistory.xml`).

use std::path::Path;

use tracing::debug;

use crate::IssueId;
use crate::Ledger;
use crate::Validated;
use crate::datetime::is_vers_date;
use crate::manifest::VERS_VERSION;
use crate::xml::Document;
use crate::xml::Element;
use crate::xml::Schema;

const WRONG_ROOT: IssueId = IssueId::new("History", "parse", 1);
const MISSING_VERSION: IssueId = IssueId::new("History", "parse", 2);
const UNEXPECTED_VERSION: IssueId = IssueId::new("History", "parse", 3);
const UNEXPECTED_ELEMENT: IssueId = IssueId::new("History", "parse", 4);
const EVENT_BAD_DATE: IssueId = IssueId::new("Event", "parse", 1);
const EVENT_MISSING_FIELD: IssueId = IssueId::new("Event", "parse", 2);

const LOCATION: &str = "VEOHistory.xml";

/// One preservation event.
#[derive(Debug, Clone)]
pub struct Event {
    /// `EventDateTime`, as written.
    pub date_time: Option<String>,
    /// `EventType`.
    pub event_type: Option<String>,
    /// `Initiator`.
    pub initiator: Option<String>,
    /// Every `Description`.
    pub descriptions: Vec<String>,
    /// Every `Error`.
    pub errors: Vec<String>,
    ledger: Ledger,
}

impl Event {
    fn from_subtree(seq: usize, depth: usize, subtree: &[Element]) -> Self {
        let mut event = Self {
            date_time: None,
            event_type: None,
            initiator: None,
            descriptions: Vec::new(),
            errors: Vec::new(),
            ledger: Ledger::new(format!("{LOCATION}/Event[{seq}]")),
        };
        for element in subtree.iter().filter(|e| e.depth == depth + 1) {
            let text = element.text.clone();
            match element.name.as_str() {
                "EventDateTime" => event.date_time = text,
                "EventType" => event.event_type = text,
                "Initiator" => event.initiator = text,
                "Description" => event.descriptions.extend(text),
                "Error" => event.errors.extend(text),
                _ => {}
            }
        }
        event.check();
        event
    }

    fn check(&mut self) {
        match self.date_time.as_deref() {
            Some(dt) if is_vers_date(dt) => {}
            Some(dt) => self.ledger.error(
                EVENT_BAD_DATE,
                format!("EventDateTime '{dt}' is not a valid date"),
            ),
            None => self.ledger.error(EVENT_BAD_DATE, "EventDateTime is missing"),
        }
        let missing: Vec<&str> = [("EventType", &self.event_type), ("Initiator", &self.initiator)]
            .into_iter()
            .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
            .map(|(name, _)| name)
            .collect();
        for name in missing {
            self.ledger
                .error(EVENT_MISSING_FIELD, format!("{name} is missing or empty"));
        }
    }
}

impl Validated for Event {
    fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}

/// A parsed event history.
#[derive(Debug)]
pub struct History {
    /// Declared `Version`.
    pub version: Option<String>,
    /// Events in document order.
    pub events: Vec<Event>,
    document: Ledger,
    ledger: Ledger,
}

impl History {
    /// Parses `path` against `schema`.
    ///
    /// Never fails; problems are recorded on the returned history.
    #[must_use]
    pub fn parse(path: &Path, schema: &Schema) -> Self {
        let mut doc = Document::new(LOCATION);
        let parsed = doc.parse(path, schema);
        Self::from_document(doc, parsed)
    }

    /// Parses history text already in memory.
    #[must_use]
    pub fn parse_str(text: &str, schema: &Schema) -> Self {
        let mut doc = Document::new(LOCATION);
        let parsed = doc.parse_str(text, schema);
        Self::from_document(doc, parsed)
    }

    fn from_document(mut doc: Document, parsed: bool) -> Self {
        let mut history = Self {
            version: None,
            events: Vec::new(),
            document: Ledger::new(LOCATION),
            ledger: Ledger::new(LOCATION),
        };
        if parsed {
            history.read(&mut doc);
        }
        history.document = doc.into_ledger();
        debug!(events = history.events.len(), "parsed history");
        history
    }

    fn read(&mut self, doc: &mut Document) {
        if !doc.tag_name_is("VEOHistory") {
            self.ledger
                .error(WRONG_ROOT, "root element is not vers:VEOHistory; history not read");
            return;
        }
        doc.advance();

        while let Some(element) = doc.current_element() {
            match element.name.as_str() {
                "Version" => self.version = element.text.clone(),
                "Event" => {
                    let event =
                        Event::from_subtree(self.events.len() + 1, element.depth, doc.subtree());
                    self.events.push(event);
                }
                other => self.ledger.error(
                    UNEXPECTED_ELEMENT,
                    format!("unexpected element '{other}' (line {})", element.line),
                ),
            }
            if !doc.skip_to_sibling() {
                break;
            }
        }

        match self.version.as_deref() {
            None => self.ledger.error(MISSING_VERSION, "vers:Version is missing"),
            Some(VERS_VERSION) => {}
            Some(v) => self.ledger.warning(
                UNEXPECTED_VERSION,
                format!("vers:Version is '{v}', expected '{VERS_VERSION}'"),
            ),
        }
    }
}

impl Validated for History {
    fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn children(&self) -> Vec<&dyn Validated> {
        std::iter::once(&self.document as &dyn Validated)
            .chain(self.events.iter().map(|e| e as &dyn Validated))
            .collect()
    }
}
