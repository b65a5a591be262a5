//! Block rule definitions
//!
//! A [`BlockRule`] names a block, gives the CSS selector for its root
//! elements, and lists the components to pull out of each matched root.

/// Sub-selector meaning "use the `href` attribute of the block root"
pub const HREF_SENTINEL: &str = "[href]";

/// Component names that carry a media source (`src` attribute)
const SOURCE_COMPONENT_NAMES: &[&str] = &[
    "image",
    "image url",
    "image src",
    "background image",
    "video",
    "video url",
    "video src",
    "iframe",
    "iframe url",
    "iframe src",
    "embed",
    "media",
];

/// Component names that carry a link target (`href` attribute)
const LINK_COMPONENT_NAMES: &[&str] = &[
    "link",
    "url",
    "href",
    "cta",
    "cta link",
    "button link",
    "download",
    "download link",
];

/// How a component's value is read from its target element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExtractionKind {
    /// Whitespace-collapsed text content
    Text,
    /// Value of the named attribute, resolved to an absolute URL when it is
    /// a site-relative path
    Attribute(String),
}

impl ExtractionKind {
    /// Parses an explicit `extract` field from the mapping
    ///
    /// `"text"` (any case) selects text; anything else names an attribute.
    pub fn from_field(field: &str) -> Option<Self> {
        let field = field.trim();
        if field.is_empty() {
            return None;
        }
        if field.eq_ignore_ascii_case("text") {
            Some(Self::Text)
        } else {
            Some(Self::Attribute(field.to_ascii_lowercase()))
        }
    }

    /// Infers the kind from a component name using the fixed name lists
    pub fn infer_from_name(component_name: &str) -> Self {
        let name = component_name.trim().to_ascii_lowercase();
        if SOURCE_COMPONENT_NAMES.contains(&name.as_str()) {
            Self::Attribute("src".to_string())
        } else if LINK_COMPONENT_NAMES.contains(&name.as_str()) {
            Self::Attribute("href".to_string())
        } else {
            Self::Text
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text)
    }
}

/// Where a component's value lives relative to the block root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComponentTarget {
    /// The root element itself (empty or `*` sub-selector)
    Root,
    /// The root's `href` attribute (the `[href]` sentinel)
    HrefSentinel,
    /// The first descendant of the root matching this selector
    Descendant(String),
}

impl ComponentTarget {
    pub fn from_selector(selector: &str) -> Self {
        match selector.trim() {
            "" | "*" => Self::Root,
            HREF_SENTINEL => Self::HrefSentinel,
            other => Self::Descendant(other.to_string()),
        }
    }
}

/// One named component of a block rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRule {
    pub name: String,
    pub target: ComponentTarget,
    pub kind: ExtractionKind,
}

impl ComponentRule {
    /// Builds a component, resolving its extraction kind
    ///
    /// Precedence: the `[href]` sentinel always reads `href`; an explicit
    /// kind comes next; otherwise the kind is inferred from the name.
    pub fn new(name: &str, selector: &str, explicit: Option<ExtractionKind>) -> Self {
        let target = ComponentTarget::from_selector(selector);
        let kind = match (&target, explicit) {
            (ComponentTarget::HrefSentinel, _) => ExtractionKind::Attribute("href".to_string()),
            (_, Some(kind)) => kind,
            (_, None) => ExtractionKind::infer_from_name(name),
        };

        Self {
            name: name.to_string(),
            target,
            kind,
        }
    }
}

/// One entry in the mapping configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRule {
    /// Rule name; the part before any `:` is the block family
    pub name: String,

    /// CSS selector identifying candidate root elements
    pub selector: String,

    /// Components in mapping order
    pub components: Vec<ComponentRule>,
}

impl BlockRule {
    pub fn new(name: &str, selector: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
            components: Vec::new(),
        }
    }

    /// Adds a component whose kind is inferred from its name or sentinel
    pub fn with_component(mut self, name: &str, selector: &str) -> Self {
        self.components.push(ComponentRule::new(name, selector, None));
        self
    }

    /// Adds a component with an explicit extraction kind
    pub fn with_component_kind(mut self, name: &str, selector: &str, kind: ExtractionKind) -> Self {
        self.components
            .push(ComponentRule::new(name, selector, Some(kind)));
        self
    }

    /// The block family: the rule name up to the first `:`
    pub fn family(&self) -> &str {
        self.name.split(':').next().unwrap_or(&self.name).trim()
    }
}
