//! Mapping-driven block extraction
//!
//! Extraction runs as an explicit ownership pass over one parsed page:
//!
//! 1. **Candidates**: every rule's selector is evaluated, producing candidate
//!    roots ranked by rule order and then document order.
//! 2. **Reduction**: a single pass assigns ownership. A candidate is dropped
//!    when it, or one of its ancestors, is already owned; otherwise it
//!    becomes a block instance and claims itself plus all descendants.
//! 3. **Components**: each owned instance gets its instance ID and its
//!    component values are read, resolved and scored.

use crate::extract::{element_text, normalize_whitespace, parse_selector};
use crate::mapping::{BlockRule, ComponentRule, ComponentTarget, ExtractionKind, MappingLoader};
use crate::readability;
use crate::state::ContentRow;
use crate::url::resolve_component_value;
use crate::SelectorError;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use url::Url;

/// One matched occurrence of a block rule on one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInstance {
    pub block_name: String,
    pub family: String,
    /// 1-based, scoped to the family within one page
    pub sequence_number: usize,
    /// `"{family}-{sequence_number}"`
    pub instance_id: String,
}

/// Everything block extraction produced for one page
#[derive(Debug, Clone, Default)]
pub struct BlockExtraction {
    pub rows: Vec<ContentRow>,
    pub instances: Vec<BlockInstance>,
    /// Rules skipped because a selector could not be parsed
    pub errors: Vec<SelectorError>,
}

/// A rule with its selectors parsed
struct CompiledRule<'r> {
    rule: &'r BlockRule,
    root: Selector,
    components: Vec<CompiledComponent<'r>>,
}

struct CompiledComponent<'r> {
    component: &'r ComponentRule,
    /// Present only for descendant targets
    selector: Option<Selector>,
}

/// Applies an ordered rule set to parsed documents
pub struct BlockExtractor<'r> {
    compiled: Vec<CompiledRule<'r>>,
    errors: Vec<SelectorError>,
}

impl<'r> BlockExtractor<'r> {
    /// Prepares the rules of a loaded mapping
    pub fn new(mapping: &'r MappingLoader) -> Self {
        Self::from_rules(mapping.rules())
    }

    /// Prepares a rule slice
    ///
    /// A rule whose root selector or any component selector fails to parse
    /// is left out and reported with every extraction.
    pub fn from_rules(rules: &'r [BlockRule]) -> Self {
        let mut compiled = Vec::with_capacity(rules.len());
        let mut errors = Vec::new();

        for rule in rules {
            match compile_rule(rule) {
                Ok(rule) => compiled.push(rule),
                Err(error) => {
                    tracing::warn!("{}", error);
                    errors.push(error);
                }
            }
        }

        Self { compiled, errors }
    }

    /// Extracts all block instances and their component rows from a page
    pub fn extract(&self, document: &Html, page_url: &Url) -> BlockExtraction {
        let candidates = self.candidates(document);
        let owned = reduce_ownership(candidates);

        let mut counters: HashMap<&str, usize> = HashMap::new();
        let mut extraction = BlockExtraction {
            errors: self.errors.clone(),
            ..Default::default()
        };

        for (compiled, root) in owned {
            let family = compiled.rule.family();
            let counter = counters.entry(family).or_insert(0);
            *counter += 1;

            let instance = BlockInstance {
                block_name: compiled.rule.name.clone(),
                family: family.to_string(),
                sequence_number: *counter,
                instance_id: format!("{}-{}", family, counter),
            };

            for component in &compiled.components {
                if let Some(row) = extract_component(component, root, &instance, page_url) {
                    extraction.rows.push(row);
                }
            }

            extraction.instances.push(instance);
        }

        tracing::debug!(
            "Extracted {} block instances ({} rows) from {}",
            extraction.instances.len(),
            extraction.rows.len(),
            page_url
        );

        extraction
    }

    /// Candidate roots in rule order, then document order
    fn candidates<'a, 'd>(
        &'a self,
        document: &'d Html,
    ) -> Vec<(&'a CompiledRule<'r>, ElementRef<'d>)> {
        self.compiled
            .iter()
            .flat_map(|compiled| {
                document
                    .select(&compiled.root)
                    .map(move |element| (compiled, element))
            })
            .collect()
    }
}

/// Extracts blocks with a one-off extractor over `rules`
pub fn extract_blocks(document: &Html, page_url: &Url, rules: &[BlockRule]) -> BlockExtraction {
    BlockExtractor::from_rules(rules).extract(document, page_url)
}

fn compile_rule(rule: &BlockRule) -> Result<CompiledRule<'_>, SelectorError> {
    let selector_error = |selector: &str, message: String| SelectorError {
        rule: rule.name.clone(),
        selector: selector.to_string(),
        message,
    };

    let root = parse_selector(&rule.selector).map_err(|e| selector_error(&rule.selector, e))?;

    let mut components = Vec::with_capacity(rule.components.len());
    for component in &rule.components {
        let selector = match &component.target {
            ComponentTarget::Descendant(selector) => {
                Some(parse_selector(selector).map_err(|e| selector_error(selector, e))?)
            }
            ComponentTarget::Root | ComponentTarget::HrefSentinel => None,
        };
        components.push(CompiledComponent {
            component,
            selector,
        });
    }

    Ok(CompiledRule {
        rule,
        root,
        components,
    })
}

/// Single reduction pass assigning each element to at most one instance
///
/// Candidates claim their subtree in ranked order. A candidate is skipped
/// only when it sits inside an earlier claim, so a later rule matching the
/// ancestor of an owned block still becomes an instance.
fn reduce_ownership<'d, T>(candidates: Vec<(T, ElementRef<'d>)>) -> Vec<(T, ElementRef<'d>)> {
    let mut claimed = HashSet::new();
    let mut owned = Vec::new();

    for (rule, element) in candidates {
        let suppressed = claimed.contains(&element.id())
            || element.ancestors().any(|ancestor| claimed.contains(&ancestor.id()));
        if suppressed {
            continue;
        }

        claimed.extend(element.descendants().map(|node| node.id()));
        owned.push((rule, element));
    }

    owned
}

fn extract_component(
    compiled: &CompiledComponent,
    root: ElementRef,
    instance: &BlockInstance,
    page_url: &Url,
) -> Option<ContentRow> {
    let component = compiled.component;

    let target = match &compiled.selector {
        Some(selector) => root
            .select(selector)
            .find(|element| element.id() != root.id())?,
        None => root,
    };

    let value = match &component.kind {
        ExtractionKind::Text => element_text(&target),
        ExtractionKind::Attribute(name) => {
            resolve_component_value(target.value().attr(name)?, page_url)
        }
    };

    if value.is_empty() {
        return None;
    }

    let score = if component.kind.is_text() {
        readability::score(&value)
    } else {
        None
    };

    Some(ContentRow {
        url: page_url.to_string(),
        block_name: instance.block_name.clone(),
        instance_id: instance.instance_id.clone(),
        component_name: component.name.clone(),
        value,
        source_element_tag: target.value().name().to_string(),
        css_classes: normalize_whitespace(target.value().attr("class").unwrap_or_default()),
        readability_score: score.map(|s| s.reading_ease),
        grade_level: score.map(|s| s.grade_level),
    })
}
