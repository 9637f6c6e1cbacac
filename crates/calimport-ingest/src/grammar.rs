//! The grammar-parser capability.
//!
//! The pipeline never walks iCalendar syntax itself. It asks a
//! [`GrammarParser`] for a tree of typed component/property nodes, either for
//! a whole calendar document or for a single vCard. The parser must say *why*
//! it failed: [`GrammarError::Rejected`] means the input is malformed and the
//! caller may recover, [`GrammarError::Internal`] means something else went
//! wrong and must not be swallowed.
//!
//! [`IcalendarGrammar`] is the production implementation, backed by the
//! `icalendar` crate's content-line parser.

use std::panic::{self, AssertUnwindSafe};
use std::sync::LazyLock;

use icalendar::parser::{Component, Property, read_calendar, unfold};
use regex::{Captures, Regex};
use thiserror::Error;

/// Matches each top-level calendar in a document.
static VCALENDAR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^(?i:BEGIN:VCALENDAR)[ \t]*$.*?^(?i:END:VCALENDAR)[ \t]*$")
        .expect("Invalid VCALENDAR regex")
});

/// Matches `BEGIN`/`END` component markers in any case.
static MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^(begin|end):([A-Za-z0-9-]+)[ \t]*$").expect("Invalid marker regex")
});

/// Why the grammar parser could not produce a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// The input is not a well-formed document.
    #[error("invalid icalendar file: {0}")]
    Rejected(String),

    /// The parser itself failed.
    #[error("grammar parser failure: {0}")]
    Internal(String),
}

/// A single property parameter, e.g. `TZID=Europe/Paris`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamNode {
    pub key: String,
    pub value: Option<String>,
}

/// One content line: name, parameters and raw value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyNode {
    pub name: String,
    pub params: Vec<ParamNode>,
    pub value: String,
}

impl PropertyNode {
    /// Creates a property without parameters.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            value: value.into(),
        }
    }

    /// Builder method to add a parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push(ParamNode {
            key: key.into(),
            value: Some(value.into()),
        });
        self
    }

    /// Returns the value of the first parameter named `key`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.key.eq_ignore_ascii_case(key))
            .and_then(|p| p.value.as_deref())
    }

    /// Serializes the property back to a single unfolded content line.
    pub fn to_line(&self) -> String {
        let mut line = self.name.clone();
        for param in &self.params {
            line.push(';');
            line.push_str(&param.key);
            if let Some(ref value) = param.value {
                line.push('=');
                line.push_str(value);
            }
        }
        line.push(':');
        line.push_str(&self.value);
        line
    }
}

/// A `BEGIN:<name>` ... `END:<name>` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentNode {
    pub name: String,
    pub properties: Vec<PropertyNode>,
    pub components: Vec<ComponentNode>,
}

impl ComponentNode {
    /// Creates an empty component.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            components: Vec::new(),
        }
    }

    /// Builder method to append a property.
    pub fn with_property(mut self, property: PropertyNode) -> Self {
        self.properties.push(property);
        self
    }

    /// Builder method to append a child component.
    pub fn with_component(mut self, component: ComponentNode) -> Self {
        self.components.push(component);
        self
    }

    /// Returns the first property named `name`.
    pub fn property(&self, name: &str) -> Option<&PropertyNode> {
        self.properties
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Returns the value of the first property named `name`.
    pub fn property_value(&self, name: &str) -> Option<&str> {
        self.property(name).map(|p| p.value.as_str())
    }

    /// Iterates over child components named `name`.
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ComponentNode> + 'a {
        self.components
            .iter()
            .filter(move |c| c.name.eq_ignore_ascii_case(name))
    }
}

/// One parsed `VCALENDAR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarTree {
    root: ComponentNode,
}

impl CalendarTree {
    /// Wraps a `VCALENDAR` component node.
    pub fn new(root: ComponentNode) -> Self {
        Self { root }
    }

    /// Returns the calendar-level component.
    pub fn root(&self) -> &ComponentNode {
        &self.root
    }

    /// Iterates over the calendar's `VEVENT` components in document order.
    pub fn events(&self) -> impl Iterator<Item = &ComponentNode> {
        self.root.children("VEVENT")
    }
}

/// One parsed vCard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VCardTree {
    properties: Vec<PropertyNode>,
}

impl VCardTree {
    /// Creates a vCard tree from its properties.
    pub fn new(properties: Vec<PropertyNode>) -> Self {
        Self { properties }
    }

    /// Serializes every property, extension properties included, to
    /// `KEY[;params]:VALUE` lines in document order.
    pub fn serialize_properties(&self) -> Vec<String> {
        self.properties.iter().map(PropertyNode::to_line).collect()
    }
}

/// Parses calendar and vCard text into typed trees.
pub trait GrammarParser: Send + Sync {
    /// Parses a document into its calendars.
    ///
    /// # Errors
    ///
    /// [`GrammarError::Rejected`] for malformed input, [`GrammarError::Internal`]
    /// for anything else.
    fn parse_calendar(&self, text: &str) -> Result<Vec<CalendarTree>, GrammarError>;

    /// Parses the first `VCARD` in `text`.
    ///
    /// # Errors
    ///
    /// Same split as [`GrammarParser::parse_calendar`].
    fn parse_vcard(&self, text: &str) -> Result<VCardTree, GrammarError>;
}

/// [`GrammarParser`] backed by the `icalendar` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcalendarGrammar;

impl IcalendarGrammar {
    /// Creates the parser.
    pub fn new() -> Self {
        Self
    }
}

impl GrammarParser for IcalendarGrammar {
    fn parse_calendar(&self, text: &str) -> Result<Vec<CalendarTree>, GrammarError> {
        let unfolded = unfold(text);
        if unfolded.trim().is_empty() {
            return Ok(Vec::new());
        }

        let regions: Vec<&str> = VCALENDAR_REGEX
            .find_iter(&unfolded)
            .map(|m| m.as_str())
            .collect();
        if regions.is_empty() {
            return Err(GrammarError::Rejected(
                "no VCALENDAR component found".to_string(),
            ));
        }

        regions
            .into_iter()
            .map(|region| {
                let region = upper_case_markers(region);
                let components = read_components(&format!("{region}\n"))?;
                Ok(CalendarTree::new(calendar_root(components)))
            })
            .collect()
    }

    fn parse_vcard(&self, text: &str) -> Result<VCardTree, GrammarError> {
        // The envelope keeps the vCard a child component however the
        // underlying parser treats a lone root.
        let enveloped = format!("BEGIN:VCALENDAR\n{}\nEND:VCALENDAR\n", unfold(text).trim());
        let components = read_components(&enveloped)?;

        components
            .iter()
            .chain(components.iter().flat_map(|c| c.components.iter()))
            .find(|c| c.name.eq_ignore_ascii_case("VCARD"))
            .map(|card| VCardTree::new(card.properties.clone()))
            .ok_or_else(|| GrammarError::Rejected("no VCARD component found".to_string()))
    }
}

/// Upper-cases component markers so `begin:vevent` reads as `BEGIN:VEVENT`.
fn upper_case_markers(region: &str) -> String {
    MARKER_REGEX
        .replace_all(region, |caps: &Captures| {
            format!(
                "{}:{}",
                caps[1].to_ascii_uppercase(),
                caps[2].to_ascii_uppercase()
            )
        })
        .into_owned()
}

/// Runs the `icalendar` parser over already-unfolded text.
///
/// Parser rejections become [`GrammarError::Rejected`]; a panic inside the
/// parser becomes [`GrammarError::Internal`].
fn read_components(text: &str) -> Result<Vec<ComponentNode>, GrammarError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        read_calendar(text).map(|calendar| {
            calendar
                .components
                .iter()
                .map(convert_component)
                .collect::<Vec<_>>()
        })
    }));

    match outcome {
        Ok(Ok(components)) => Ok(components),
        Ok(Err(message)) => Err(GrammarError::Rejected(message.to_string())),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "parser panicked".to_string());
            Err(GrammarError::Internal(message))
        }
    }
}

/// Picks the `VCALENDAR` node out of the parser output, or rebuilds one when
/// the parser already flattened the root away.
fn calendar_root(components: Vec<ComponentNode>) -> ComponentNode {
    let mut components = components;
    if let Some(index) = components
        .iter()
        .position(|c| c.name.eq_ignore_ascii_case("VCALENDAR"))
    {
        return components.swap_remove(index);
    }

    ComponentNode {
        name: "VCALENDAR".to_string(),
        properties: Vec::new(),
        components,
    }
}

fn convert_component(component: &Component<'_>) -> ComponentNode {
    ComponentNode {
        name: component.name.to_string(),
        properties: component.properties.iter().map(convert_property).collect(),
        components: component.components.iter().map(convert_component).collect(),
    }
}

fn convert_property(property: &Property<'_>) -> PropertyNode {
    PropertyNode {
        name: property.name.to_string(),
        params: property
            .params
            .iter()
            .map(|p| ParamNode {
                key: p.key.to_string(),
                value: p.val.as_ref().map(|v| v.to_string()),
            })
            .collect(),
        value: property.val.to_string(),
    }
}
