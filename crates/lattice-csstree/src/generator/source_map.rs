//! Source map mappings for generated CSS.
//!
//! The generator reports mappings through [`SourceMapSink`]; building the
//! actual `.map` file is left to whatever implements it. Only at-rules,
//! selectors and declarations are tracked.

use serde::Serialize;

use crate::ast::Node;

/// A line/column pair in a source map. Lines are 1-based, columns 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MapPosition {
    pub line: usize,
    pub column: usize,
}

/// A single mapping. Closing mappings carry only the generated position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mapping {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<MapPosition>,
    pub generated: MapPosition,
}

/// Receiver of mappings produced during generation.
pub trait SourceMapSink {
    fn add_mapping(&mut self, mapping: Mapping);
}

/// Sink that keeps every mapping in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappingCollector {
    pub mappings: Vec<Mapping>,
}

impl MappingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Mappings as a JSON array.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!(self.mappings)
    }
}

impl SourceMapSink for MappingCollector {
    fn add_mapping(&mut self, mapping: Mapping) {
        self.mappings.push(mapping);
    }
}

fn is_tracked(node: &Node) -> bool {
    matches!(node, Node::Atrule(_) | Node::Selector(_) | Node::Declaration(_))
}

/// Follows the generated cursor and turns node boundaries into mappings.
pub(crate) struct Tracker<'m> {
    sink: &'m mut dyn SourceMapSink,
    generated: MapPosition,
    original: Option<MapPosition>,
    active: bool,
    activated: MapPosition,
}

impl<'m> Tracker<'m> {
    pub(crate) fn new(sink: &'m mut dyn SourceMapSink) -> Self {
        let start = MapPosition { line: 1, column: 0 };
        Self {
            sink,
            generated: start,
            original: None,
            active: false,
            activated: start,
        }
    }

    pub(crate) fn advance(&mut self, chunk: &str) {
        for ch in chunk.chars() {
            if ch == '\n' {
                self.generated.line += 1;
                self.generated.column = 0;
            } else {
                self.generated.column += 1;
            }
        }
    }

    pub(crate) fn enter(&mut self, node: &Node) {
        if !is_tracked(node) {
            return;
        }
        let Some(loc) = node.loc() else {
            return;
        };

        let original = MapPosition {
            line: loc.start.line,
            column: loc.start.column.saturating_sub(1),
        };
        if self.original == Some(original) {
            return;
        }
        self.original = Some(original);

        if self.active {
            self.active = false;
            if self.generated != self.activated {
                self.close(self.activated);
            }
        }

        self.active = true;
        self.sink.add_mapping(Mapping {
            source: Some(loc.source.clone()),
            original: Some(original),
            generated: self.generated,
        });
    }

    pub(crate) fn leave(&mut self, node: &Node) {
        if self.active && is_tracked(node) {
            self.activated = self.generated;
        }
    }

    pub(crate) fn finish(&mut self) {
        if self.active {
            self.close(self.activated);
        }
    }

    fn close(&mut self, generated: MapPosition) {
        self.sink.add_mapping(Mapping {
            source: None,
            original: None,
            generated,
        });
    }
}
