//! Schema-driven item extraction
//!
//! Turns raw markup into [`ExtractedItem`]s by evaluating an
//! [`ExtractionSchema`]: container selector, optional item selector and an
//! ordered list of field selectors.

use scraper::{ElementRef, Html, Selector};

use crate::models::{ExtractedItem, ExtractionSchema, FieldKind, FieldSpec};
use crate::parser::transform::TransformRegistry;
use crate::utils::error::ParseError;

/// Compile a CSS selector, keeping the offending text in the error
pub fn compile_selector(selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|e| ParseError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// A field with its selector compiled
#[derive(Debug)]
struct CompiledField {
    spec: FieldSpec,
    selector: Selector,
}

/// Extractor with all schema selectors compiled once
///
/// Building the extractor is the only fallible selector step; running it
/// against markup performs no I/O.
#[derive(Debug)]
pub struct Extractor {
    container: Selector,
    item: Option<Selector>,
    fields: Vec<CompiledField>,
    transforms: TransformRegistry,
}

impl Extractor {
    /// Compile a schema using the built-in transforms
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidSelector` if any selector does not compile
    pub fn new(schema: &ExtractionSchema) -> Result<Self, ParseError> {
        Self::with_transforms(schema, TransformRegistry::builtin().clone())
    }

    /// Compile a schema with a custom transform table
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidSelector` if any selector does not compile
    pub fn with_transforms(
        schema: &ExtractionSchema,
        transforms: TransformRegistry,
    ) -> Result<Self, ParseError> {
        let container = compile_selector(&schema.container)?;
        let item = schema.item_selector().map(compile_selector).transpose()?;
        let fields = schema
            .fields
            .iter()
            .map(|spec| {
                Ok(CompiledField {
                    spec: spec.clone(),
                    selector: compile_selector(&spec.selector)?,
                })
            })
            .collect::<Result<Vec<_>, ParseError>>()?;

        Ok(Self {
            container,
            item,
            fields,
            transforms,
        })
    }

    /// Extract all items from the markup in document order
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MalformedMarkup` for a blank document
    pub fn extract(&self, markup: &str) -> Result<Vec<ExtractedItem>, ParseError> {
        if markup.trim().is_empty() {
            return Err(ParseError::MalformedMarkup("document is empty".to_string()));
        }

        let document = Html::parse_document(markup);
        let mut items = Vec::new();

        for container in document.select(&self.container) {
            match &self.item {
                Some(item_selector) => {
                    for root in container.select(item_selector) {
                        items.extend(self.extract_item(root));
                    }
                }
                None => items.extend(self.extract_item(container)),
            }
        }

        tracing::trace!(items = items.len(), "Extraction finished");
        Ok(items)
    }

    /// Evaluate every field against one item root; `None` if nothing matched
    fn extract_item(&self, root: ElementRef<'_>) -> Option<ExtractedItem> {
        let mut item = ExtractedItem::new();

        for field in &self.fields {
            if let Some(value) = self.extract_field(root, field) {
                item.insert(field.spec.name.clone(), value);
            }
        }

        (!item.is_empty()).then_some(item)
    }

    fn extract_field(&self, root: ElementRef<'_>, field: &CompiledField) -> Option<String> {
        let element = root.select(&field.selector).next()?;

        let raw = match field.spec.kind {
            FieldKind::Attribute => element.value().attr(field.spec.attribute_name())?.to_string(),
            FieldKind::Text => element.text().collect::<String>().trim().to_string(),
        };

        Some(match field.spec.transform.as_deref() {
            Some(name) if !name.is_empty() => self.transforms.apply(name, raw),
            _ => raw,
        })
    }
}

/// Compile the schema and extract items in one call
///
/// # Errors
///
/// Returns `ParseError` for invalid selectors or a blank document
pub fn extract(markup: &str, schema: &ExtractionSchema) -> Result<Vec<ExtractedItem>, ParseError> {
    Extractor::new(schema)?.extract(markup)
}
