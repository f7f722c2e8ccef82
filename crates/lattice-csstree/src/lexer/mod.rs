//! Grammar dictionary and value matching.
//!
//! A [`Lexer`] holds the definition syntax of properties, types and
//! at-rules, and matches parsed values against it:
//!
//! ```ignore
//! use lattice_csstree::lexer::Lexer;
//! use lattice_csstree::parser::{parse, Context, ParseOptions};
//!
//! let value = parse("1px solid red", &ParseOptions::new().context(Context::Value))?;
//! let result = Lexer::default_lexer().match_property("border", &value);
//! assert!(result.is_match());
//! ```
//!
//! Grammar text is parsed on first use and cached per entry. A lexer never
//! changes after construction; [`Lexer::fork`] builds a new one.

mod generic;
mod matching;
pub mod names;
mod search;
mod trace;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::OnceLock;

use serde::Deserialize;
use serde_json::{json, Map, Value as JsonValue};
use tracing::{debug, warn};

use crate::ast::Node;
use crate::definition_syntax::{self, GenerateSyntaxOptions, SyntaxNode};
use crate::error::{Error, MatchError, Result, SyntaxParseError, SyntaxReferenceError};
use crate::logging::targets;

pub use generic::GenericPredicate;
pub use search::ValueFragment;
pub use trace::{MatchResult, MatchTree, TraceEntry};

use matching::match_value;

static DEFAULT_SYNTAXES: &str = include_str!("../../data/syntaxes.json");

/// Where an entry's grammar comes from.
#[derive(Debug, Clone)]
pub enum SyntaxSource {
    /// Value definition syntax text.
    Definition(String),
    /// A built-in or registered predicate.
    Generic(GenericPredicate),
}

/// A named grammar with its parse cached on first use.
#[derive(Debug, Clone)]
pub struct SyntaxEntry {
    name: String,
    source: SyntaxSource,
    parsed: OnceLock<std::result::Result<SyntaxNode, SyntaxParseError>>,
}

impl SyntaxEntry {
    fn new(name: impl Into<String>, source: SyntaxSource) -> Self {
        Self {
            name: name.into(),
            source,
            parsed: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &SyntaxSource {
        &self.source
    }

    pub fn is_generic(&self) -> bool {
        matches!(self.source, SyntaxSource::Generic(_))
    }

    /// The parsed grammar, or `None` for generic entries.
    pub fn syntax(&self) -> Option<std::result::Result<&SyntaxNode, &SyntaxParseError>> {
        let SyntaxSource::Definition(text) = &self.source else {
            return None;
        };

        let parsed = self.parsed.get_or_init(|| {
            debug!(target: targets::LEXER, name = %self.name, "parsing grammar entry");
            definition_syntax::parse(text)
        });

        Some(parsed.as_ref())
    }

    /// Canonical grammar text, falling back to the source text when it
    /// does not parse.
    fn text(&self) -> Option<String> {
        match (self.syntax()?, &self.source) {
            (Ok(syntax), _) => Some(definition_syntax::generate(syntax, &GenerateSyntaxOptions::default())),
            (Err(_), SyntaxSource::Definition(text)) => Some(text.clone()),
            (Err(_), SyntaxSource::Generic(_)) => None,
        }
    }
}

/// Prelude and descriptor grammars of an at-rule.
#[derive(Debug, Clone)]
pub struct AtruleEntry {
    pub name: String,
    /// `None` when the at-rule takes no prelude.
    pub prelude: Option<SyntaxEntry>,
    pub descriptors: BTreeMap<String, SyntaxEntry>,
}

/// At-rule grammars as found in a dictionary file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AtruleConfig {
    pub prelude: Option<String>,
    pub descriptors: Option<BTreeMap<String, String>>,
}

/// Grammar dictionary used to build or fork a [`Lexer`].
///
/// The JSON form has `types`, `properties` and `atrules` maps; generic
/// predicates can only be added in code.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LexerConfig {
    pub types: BTreeMap<String, String>,
    pub properties: BTreeMap<String, String>,
    pub atrules: BTreeMap<String, AtruleConfig>,
    #[serde(skip)]
    pub generics: BTreeMap<String, GenericPredicate>,
}

impl LexerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a dictionary from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json_str(&json)
    }

    pub fn type_syntax(mut self, name: impl Into<String>, syntax: impl Into<String>) -> Self {
        self.types.insert(name.into(), syntax.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>, syntax: impl Into<String>) -> Self {
        self.properties.insert(name.into(), syntax.into());
        self
    }

    pub fn atrule(mut self, name: impl Into<String>, atrule: AtruleConfig) -> Self {
        self.atrules.insert(name.into(), atrule);
        self
    }

    /// Register a type matched by `predicate` instead of a grammar.
    pub fn generic(mut self, name: impl Into<String>, predicate: GenericPredicate) -> Self {
        self.generics.insert(name.into(), predicate);
        self
    }
}

/// Type and property names whose grammar refers to something missing or
/// unparsable, directly or through other entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrokenReferences {
    pub types: Vec<String>,
    pub properties: Vec<String>,
    /// At-rules whose prelude or descriptors are broken.
    pub atrules: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ReferenceKind {
    Type,
    Property,
}

/// Grammar dictionary with value matching.
#[derive(Debug, Clone, Default)]
pub struct Lexer {
    types: BTreeMap<String, SyntaxEntry>,
    properties: BTreeMap<String, SyntaxEntry>,
    atrules: BTreeMap<String, AtruleEntry>,
}

impl Lexer {
    /// A lexer with the built-in generic types plus `config`.
    pub fn new(config: LexerConfig) -> Self {
        let mut lexer = Self::default();

        for (name, predicate) in generic::GENERICS {
            lexer.add_type(name, SyntaxSource::Generic(*predicate));
        }
        lexer.apply(config);

        lexer
    }

    /// Shared lexer over the embedded dictionary.
    pub fn default_lexer() -> &'static Lexer {
        static DEFAULT: OnceLock<Lexer> = OnceLock::new();

        DEFAULT.get_or_init(|| match LexerConfig::from_json_str(DEFAULT_SYNTAXES) {
            Ok(config) => Lexer::new(config),
            Err(error) => {
                warn!(target: targets::LEXER, %error, "embedded syntax dictionary is invalid");
                Lexer::new(LexerConfig::default())
            }
        })
    }

    /// A new lexer with the entries of `config` added to or replacing this
    /// lexer's entries.
    pub fn fork(&self, config: LexerConfig) -> Lexer {
        let mut lexer = self.clone();
        lexer.apply(config);
        lexer
    }

    fn apply(&mut self, config: LexerConfig) {
        for (name, predicate) in config.generics {
            self.add_type(&name, SyntaxSource::Generic(predicate));
        }
        for (name, syntax) in config.types {
            self.add_type(&name, SyntaxSource::Definition(syntax));
        }
        for (name, syntax) in config.properties {
            self.properties
                .insert(name.clone(), SyntaxEntry::new(name, SyntaxSource::Definition(syntax)));
        }
        for (name, atrule) in config.atrules {
            self.add_atrule(name, atrule);
        }
    }

    fn add_type(&mut self, name: &str, source: SyntaxSource) {
        self.types.insert(name.to_string(), SyntaxEntry::new(name, source));
    }

    fn add_atrule(&mut self, name: String, config: AtruleConfig) {
        let entry = self.atrules.entry(name.clone()).or_insert_with(|| AtruleEntry {
            name: name.clone(),
            prelude: None,
            descriptors: BTreeMap::new(),
        });

        if let Some(prelude) = config.prelude {
            entry.prelude = Some(SyntaxEntry::new(name.as_str(), SyntaxSource::Definition(prelude)));
        }
        for (descriptor, syntax) in config.descriptors.unwrap_or_default() {
            entry.descriptors.insert(
                descriptor.clone(),
                SyntaxEntry::new(descriptor, SyntaxSource::Definition(syntax)),
            );
        }
    }

    pub fn get_type(&self, name: &str) -> Option<&SyntaxEntry> {
        self.types.get(name)
    }

    /// Property entry by its exact dictionary name.
    pub(crate) fn property_entry(&self, name: &str) -> Option<&SyntaxEntry> {
        self.properties.get(name)
    }

    /// Property entry for `name`, ignoring case and hacks, and falling back
    /// from a vendor-prefixed name to the unprefixed one.
    pub fn get_property(&self, name: &str) -> Option<&SyntaxEntry> {
        let property = names::property(name);
        if property.custom {
            return None;
        }

        self.properties.get(&property.name).or_else(|| {
            if property.vendor.is_empty() {
                None
            } else {
                self.properties.get(&property.basename)
            }
        })
    }

    /// At-rule entry for `name`, with or without the leading `@`.
    pub fn get_atrule(&self, name: &str) -> Option<&AtruleEntry> {
        let keyword = names::keyword(name.strip_prefix('@').unwrap_or(name));

        self.atrules.get(&keyword.name).or_else(|| {
            if keyword.vendor.is_empty() {
                None
            } else {
                self.atrules.get(&keyword.basename)
            }
        })
    }

    pub fn get_atrule_descriptor(&self, atrule: &str, descriptor: &str) -> Option<&SyntaxEntry> {
        let atrule = self.get_atrule(atrule)?;
        let keyword = names::keyword(descriptor);

        atrule
            .descriptors
            .get(&keyword.name)
            .or_else(|| atrule.descriptors.get(&keyword.basename))
    }

    pub fn check_property_name(&self, name: &str) -> std::result::Result<(), SyntaxReferenceError> {
        if names::is_custom_property(name) || self.get_property(name).is_some() {
            Ok(())
        } else {
            Err(SyntaxReferenceError::new("Unknown property", name))
        }
    }

    pub fn check_atrule_name(&self, name: &str) -> std::result::Result<(), SyntaxReferenceError> {
        match self.get_atrule(name) {
            Some(_) => Ok(()),
            None => Err(SyntaxReferenceError::new(
                "Unknown at-rule",
                format!("@{}", name.strip_prefix('@').unwrap_or(name)),
            )),
        }
    }

    pub fn check_atrule_descriptor_name(
        &self,
        atrule: &str,
        descriptor: &str,
    ) -> std::result::Result<(), SyntaxReferenceError> {
        self.check_atrule_name(atrule)?;

        match self.get_atrule_descriptor(atrule, descriptor) {
            Some(_) => Ok(()),
            None => Err(SyntaxReferenceError::new("Unknown at-rule descriptor", descriptor)),
        }
    }

    /// Match a declaration value against the grammar of `name`. Custom
    /// properties are not matched: the result has neither a match nor an
    /// error.
    pub fn match_property<'a>(&self, name: &str, value: &'a Node) -> MatchResult<'a> {
        if names::is_custom_property(name) {
            return MatchResult::default();
        }

        match self.get_property(name) {
            Some(entry) => self.match_entry(entry, "Property", value),
            None => MatchResult::failed(SyntaxReferenceError::new("Unknown property", name).into()),
        }
    }

    pub fn match_type<'a>(&self, name: &str, value: &'a Node) -> MatchResult<'a> {
        match self.get_type(name) {
            Some(entry) => self.match_entry(entry, "Type", value),
            None => MatchResult::failed(SyntaxReferenceError::new("Unknown type", name).into()),
        }
    }

    /// Match the value of a `Declaration` node against its property.
    pub fn match_declaration<'a>(&self, declaration: &'a Node) -> MatchResult<'a> {
        match declaration {
            Node::Declaration(node) => self.match_property(&node.property, &node.value),
            other => MatchResult::failed(SyntaxReferenceError::new("Not a Declaration node", other.kind()).into()),
        }
    }

    /// Match an at-rule prelude. An at-rule without a prelude grammar only
    /// accepts an empty prelude.
    pub fn match_atrule_prelude<'a>(&self, name: &str, prelude: &'a Node) -> MatchResult<'a> {
        if let Err(error) = self.check_atrule_name(name) {
            return MatchResult::failed(error.into());
        }
        let Some(atrule) = self.get_atrule(name) else {
            return MatchResult::default();
        };

        match &atrule.prelude {
            Some(entry) => self.match_entry(entry, "AtrulePrelude", prelude),
            None if is_empty_value(prelude) => MatchResult::default(),
            None => MatchResult::failed(
                SyntaxReferenceError::new("Prelude is not allowed for at-rule", format!("@{}", atrule.name)).into(),
            ),
        }
    }

    pub fn match_atrule_descriptor<'a>(&self, atrule: &str, descriptor: &str, value: &'a Node) -> MatchResult<'a> {
        if let Err(error) = self.check_atrule_descriptor_name(atrule, descriptor) {
            return MatchResult::failed(error.into());
        }

        match self.get_atrule_descriptor(atrule, descriptor) {
            Some(entry) => self.match_entry(entry, "Descriptor", value),
            None => MatchResult::default(),
        }
    }

    /// Runs of nodes in `value` matched through the `kind` (`Type` or
    /// `Property`) term `name` when matching `value` against `property`.
    pub fn find_value_fragments<'a>(
        &self,
        property: &str,
        value: &'a Node,
        kind: &str,
        name: &str,
    ) -> Vec<ValueFragment<'a>> {
        let result = self.match_property(property, value);
        search::match_fragments(value, &result, kind, name)
    }

    pub fn find_declaration_value_fragments<'a>(
        &self,
        declaration: &'a Node,
        kind: &str,
        name: &str,
    ) -> Vec<ValueFragment<'a>> {
        let Node::Declaration(node) = declaration else {
            return Vec::new();
        };

        let result = self.match_declaration(declaration);
        search::match_fragments(&node.value, &result, kind, name)
    }

    /// Fragments of every declaration in `ast`, in source order.
    pub fn find_all_fragments<'a>(&self, ast: &'a Node, kind: &str, name: &str) -> Vec<ValueFragment<'a>> {
        search::declarations(ast)
            .into_iter()
            .flat_map(|declaration| self.find_declaration_value_fragments(declaration, kind, name))
            .collect()
    }

    /// Match `value` against a grammar tree.
    pub fn match_syntax<'a>(&self, syntax: &SyntaxNode, value: &'a Node) -> MatchResult<'a> {
        match_value(self, syntax, "Value", None, value)
    }

    fn match_entry<'a>(&self, entry: &SyntaxEntry, kind: &'static str, value: &'a Node) -> MatchResult<'a> {
        match entry.syntax() {
            Some(Ok(syntax)) => match_value(self, syntax, kind, Some(entry.name()), value),
            Some(Err(error)) => MatchResult::failed(MatchError::from(error.clone())),
            // generic types match through a reference to themselves
            None => {
                let syntax = SyntaxNode::Type {
                    name: entry.name().to_string(),
                    range: None,
                };
                match_value(self, &syntax, "Value", None, value)
            }
        }
    }

    /// Report entries whose grammar refers, directly or transitively, to a
    /// missing or unparsable entry. `None` when every reference resolves.
    pub fn validate(&self) -> Option<BrokenReferences> {
        let mut memo = BTreeMap::new();
        let mut broken = BrokenReferences::default();

        for name in self.types.keys() {
            if self.is_broken(ReferenceKind::Type, name, &mut memo) {
                broken.types.push(name.clone());
            }
        }
        for name in self.properties.keys() {
            if self.is_broken(ReferenceKind::Property, name, &mut memo) {
                broken.properties.push(name.clone());
            }
        }
        for (name, atrule) in &self.atrules {
            let entries = atrule.prelude.iter().chain(atrule.descriptors.values());
            let mut entries_broken = false;
            for entry in entries {
                entries_broken |= self.entry_is_broken(entry, &mut memo);
            }
            if entries_broken {
                broken.atrules.push(name.clone());
            }
        }

        if broken == BrokenReferences::default() {
            return None;
        }

        for name in &broken.types {
            warn!(target: targets::LEXER, name = %name, "type has broken references");
        }
        for name in &broken.properties {
            warn!(target: targets::LEXER, name = %name, "property has broken references");
        }
        for name in &broken.atrules {
            warn!(target: targets::LEXER, name = %name, "at-rule has broken references");
        }

        Some(broken)
    }

    fn is_broken(&self, kind: ReferenceKind, name: &str, memo: &mut BTreeMap<(ReferenceKind, String), bool>) -> bool {
        let key = (kind, name.to_string());
        if let Some(&broken) = memo.get(&key) {
            return broken;
        }

        // cycles resolve to "not broken" while the entry is being checked
        memo.insert(key.clone(), false);

        let entry = match kind {
            ReferenceKind::Type => self.types.get(name),
            ReferenceKind::Property => self.properties.get(name),
        };
        let broken = match entry {
            Some(entry) => self.entry_is_broken(entry, memo),
            None => true,
        };

        memo.insert(key, broken);
        broken
    }

    fn entry_is_broken(&self, entry: &SyntaxEntry, memo: &mut BTreeMap<(ReferenceKind, String), bool>) -> bool {
        let syntax = match entry.syntax() {
            None => return false,
            Some(Err(_)) => return true,
            Some(Ok(syntax)) => syntax,
        };

        let mut references = BTreeSet::new();
        definition_syntax::walk(
            syntax,
            |node| match node {
                SyntaxNode::Type { name, .. } => {
                    references.insert((ReferenceKind::Type, name.clone()));
                }
                SyntaxNode::Property { name } => {
                    references.insert((ReferenceKind::Property, name.clone()));
                }
                _ => {}
            },
            |_| {},
        );

        let mut broken = false;
        for (kind, name) in references {
            broken |= self.is_broken(kind, &name, memo);
        }
        broken
    }

    /// The dictionary as JSON, with grammars in canonical form.
    pub fn dump(&self) -> JsonValue {
        let types: Map<String, JsonValue> = self
            .types
            .iter()
            .filter_map(|(name, entry)| Some((name.clone(), JsonValue::String(entry.text()?))))
            .collect();
        let properties: Map<String, JsonValue> = self
            .properties
            .iter()
            .filter_map(|(name, entry)| Some((name.clone(), JsonValue::String(entry.text()?))))
            .collect();
        let atrules: Map<String, JsonValue> = self
            .atrules
            .iter()
            .map(|(name, atrule)| {
                let descriptors: Map<String, JsonValue> = atrule
                    .descriptors
                    .iter()
                    .filter_map(|(name, entry)| Some((name.clone(), JsonValue::String(entry.text()?))))
                    .collect();
                let descriptors = if descriptors.is_empty() {
                    JsonValue::Null
                } else {
                    JsonValue::Object(descriptors)
                };
                let value = json!({
                    "prelude": atrule.prelude.as_ref().and_then(SyntaxEntry::text),
                    "descriptors": descriptors,
                });
                (name.clone(), value)
            })
            .collect();

        json!({
            "generic": self.types.values().any(SyntaxEntry::is_generic),
            "types": types,
            "properties": properties,
            "atrules": atrules,
        })
    }
}

static_assertions::assert_impl_all!(Lexer: Send, Sync);

fn is_empty_value(node: &Node) -> bool {
    node.children()
        .is_some_and(|children| children.iter().all(Node::is_white_space_or_comment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatchErrorKind;
    use crate::parser::{parse, Context, ParseOptions};
    use crate::generator::generate;
    use std::io::Write;

    fn value(source: &str) -> Node {
        parse(source, &ParseOptions::new().context(Context::Value)).unwrap()
    }

    fn prelude(atrule: &str, source: &str) -> Node {
        parse(source, &ParseOptions::new().context(Context::AtrulePrelude).atrule(atrule)).unwrap()
    }

    fn lexer() -> &'static Lexer {
        Lexer::default_lexer()
    }

    #[test]
    fn color_keyword_matches() {
        let red = value("red");
        let result = lexer().match_property("color", &red);

        assert!(result.is_match(), "{:?}", result.error);
        let node = red.children().unwrap().iter().next().unwrap();
        assert!(result.is_type(node, "color"));
        assert!(result.is_type(node, "named-color"));
        assert!(result.is_property(node, "color"));
        assert!(result.is_keyword(node));
    }

    #[test]
    fn number_is_not_a_color() {
        let number = value("123");
        let error = lexer().match_property("color", &number).error.unwrap();

        assert_eq!(error.kind, MatchErrorKind::Mismatch);
        assert_eq!(error.raw_message, "Mismatch");
        assert_eq!(error.mismatch_offset, 0);
        assert_eq!(error.mismatch_length, 3);
        assert!(error.message.starts_with("Mismatch\n  syntax: <color>\n   value: 123\n"));
    }

    #[test]
    fn css_wide_keywords_match_every_property() {
        for property in lexer().properties.keys() {
            for keyword in ["initial", "inherit", "unset", "revert", "revert-layer", "INHERIT"] {
                let keyword_value = value(keyword);
                assert!(
                    lexer().match_property(property, &keyword_value).is_match(),
                    "{property}: {keyword}"
                );
            }
        }
    }

    #[test]
    fn var_makes_any_value_valid() {
        assert!(lexer().match_property("width", &value("var(--x)")).is_match());
        assert!(lexer().match_property("margin", &value("1px calc(var(--gap) * 2) foo")).is_match());
    }

    #[test]
    fn vendor_and_hack_prefixes_fall_back() {
        let width = value("10px");

        assert!(lexer().match_property("-moz-width", &width).is_match());
        assert!(lexer().match_property("_width", &width).is_match());
        assert!(lexer().match_property("*WIDTH", &width).is_match());
        assert!(lexer().get_property("-webkit-zoom").is_some());
    }

    #[test]
    fn custom_properties_are_not_matched() {
        let custom = value("1px solid");
        let result = lexer().match_property("--anything", &custom);

        assert!(!result.is_match());
        assert!(result.error.is_none());
        assert!(lexer().check_property_name("--anything").is_ok());
    }

    #[test]
    fn unknown_names_are_reference_errors() {
        let error = lexer().match_property("colour", &value("red")).error.unwrap();
        assert_eq!(error.kind, MatchErrorKind::Reference);
        assert_eq!(error.message, "Unknown property `colour`");

        let error = lexer().match_type("colour", &value("red")).error.unwrap();
        assert_eq!(error.message, "Unknown type `colour`");

        assert_eq!(
            lexer().check_atrule_name("@nope").unwrap_err().to_string(),
            "Unknown at-rule `@nope`"
        );
    }

    #[test]
    fn shorthand_properties() {
        assert!(lexer().match_property("border", &value("1px solid red")).is_match());
        assert!(lexer().match_property("border", &value("red dashed")).is_match());
        assert!(lexer().match_property("margin", &value("0 auto")).is_match());
        assert!(!lexer().match_property("margin", &value("1px 2px 3px 4px 5px")).is_match());
        assert!(lexer().match_property("box-shadow", &value("1px 2px red, inset 0 0 3px #000")).is_match());
        assert!(lexer().match_property("font-weight", &value("400")).is_match());
        assert!(!lexer().match_property("font-weight", &value("1001")).is_match());
        assert!(lexer().match_property("background-color", &value("rgb(1, 2, 3)")).is_match());
        assert!(lexer().match_property("transform", &value("translateX(10px) rotate(45deg)")).is_match());
    }

    #[test]
    fn match_types_and_syntax() {
        let length = value("10px");
        let result = lexer().match_type("length", &length);
        let node = length.children().unwrap().iter().next().unwrap();

        assert!(result.is_match());
        assert!(result.is_type(node, "length"));
        assert!(lexer().match_type("length-percentage", &value("5%")).is_match());

        let syntax = definition_syntax::parse("<length> | auto").unwrap();
        assert!(lexer().match_syntax(&syntax, &value("auto")).is_match());
        assert!(!lexer().match_syntax(&syntax, &value("none")).is_match());
    }

    #[test]
    fn declarations_are_matched_by_property() {
        let declaration = parse("color: red", &ParseOptions::new().context(Context::Declaration)).unwrap();
        assert!(lexer().match_declaration(&declaration).is_match());

        let declaration = parse("color: 10px", &ParseOptions::new().context(Context::Declaration)).unwrap();
        assert!(!lexer().match_declaration(&declaration).is_match());

        let error = lexer().match_declaration(&value("red")).error.unwrap();
        assert_eq!(error.message, "Not a Declaration node `Value`");
    }

    #[test]
    fn atrule_preludes_and_descriptors() {
        let media = prelude("media", "screen and (min-width: 100px)");
        assert!(lexer().match_atrule_prelude("media", &media).is_match());
        assert!(lexer().match_atrule_prelude("@-webkit-media", &media).is_match());

        let keyframes = prelude("keyframes", "fade-in");
        assert!(lexer().match_atrule_prelude("keyframes", &keyframes).is_match());

        let supports = prelude("supports", "(display: grid) and (gap: 1px)");
        assert!(lexer().match_atrule_prelude("supports", &supports).is_match());

        let font_face = prelude("font-face", "x");
        let error = lexer().match_atrule_prelude("font-face", &font_face).error.unwrap();
        assert_eq!(error.message, "Prelude is not allowed for at-rule `@font-face`");

        let display = value("swap");
        assert!(lexer().match_atrule_descriptor("font-face", "font-display", &display).is_match());
        let error = lexer()
            .match_atrule_descriptor("font-face", "color", &display)
            .error
            .unwrap();
        assert_eq!(error.message, "Unknown at-rule descriptor `color`");
    }

    #[test]
    fn embedded_dictionary_has_no_broken_references() {
        assert_eq!(lexer().validate(), None);
    }

    #[test]
    fn validate_reports_transitive_breakage() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let lexer = Lexer::new(
            LexerConfig::new()
                .type_syntax("a", "<b> | x")
                .type_syntax("b", "<missing>")
                .type_syntax("c", "<a>")
                .type_syntax("bad", "[ x")
                .property("p", "<c>")
                .property("q", "<length>"),
        );
        let broken = lexer.validate().unwrap();

        assert_eq!(broken.types, ["a", "b", "bad", "c"]);
        assert_eq!(broken.properties, ["p"]);
        assert!(broken.atrules.is_empty());
    }

    #[test]
    fn fork_overrides_without_touching_the_base() {
        fn two_words(nodes: &[&Node], _range: Option<&definition_syntax::Range>) -> usize {
            match nodes {
                [Node::Identifier(_), Node::WhiteSpace(_), Node::Identifier(_), ..] => 3,
                _ => 0,
            }
        }

        let base = lexer();
        let forked = base.fork(
            LexerConfig::new()
                .property("color", "<two-words> | red")
                .generic("two-words", two_words)
                .property("my-prop", "<color>#"),
        );

        assert!(forked.match_property("color", &value("foo bar")).is_match());
        assert!(!forked.match_property("color", &value("blue")).is_match());
        assert!(base.match_property("color", &value("blue")).is_match());
        assert!(base.get_property("my-prop").is_none());

        let pair = value("a b");
        let result = forked.match_type("two-words", &pair);
        assert!(result.is_match());
    }

    #[test]
    fn config_loads_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "types": {{ "size": "small | large" }},
                "properties": {{ "box-size": "<size> <length>?" }},
                "atrules": {{ "box": {{ "prelude": "<size>", "descriptors": {{ "x": "<integer>" }} }} }}
            }}"#
        )
        .unwrap();

        let config = LexerConfig::from_file(file.path()).unwrap();
        let lexer = Lexer::new(config);

        assert!(lexer.match_property("box-size", &value("large 1px")).is_match());
        assert!(lexer.match_atrule_descriptor("box", "x", &value("3")).is_match());
        assert_eq!(lexer.validate(), None);

        let missing = LexerConfig::from_file(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(Error::Io { .. })));
        assert!(matches!(LexerConfig::from_json_str("{"), Err(Error::Json(_))));
    }

    #[test]
    fn dictionary_grammars_round_trip() {
        let lexer = lexer();
        let atrule_entries = lexer
            .atrules
            .values()
            .flat_map(|atrule| atrule.prelude.iter().chain(atrule.descriptors.values()));
        let entries = lexer.types.values().chain(lexer.properties.values()).chain(atrule_entries);

        let mut checked = 0;
        for entry in entries {
            let SyntaxSource::Definition(source) = entry.source() else {
                continue;
            };
            let ast = definition_syntax::parse(source).unwrap();
            let text = definition_syntax::generate(&ast, &GenerateSyntaxOptions::default());

            assert_eq!(definition_syntax::parse(&text).unwrap(), ast, "{}: {source} -> {text}", entry.name());
            checked += 1;
        }
        assert!(checked > 100);
    }

    #[test]
    fn hacked_keywords_match() {
        assert!(lexer().match_property("color", &value("red\\9")).is_match());
        assert!(lexer().match_property("color", &value("red\\0")).is_match());
        assert!(lexer().match_property("color", &value("red \\9")).is_match());
    }

    fn fragment_texts(fragments: &[ValueFragment<'_>]) -> Vec<String> {
        fragments
            .iter()
            .map(|fragment| fragment.nodes.iter().map(|node| generate(node)).collect())
            .collect()
    }

    fn declaration(source: &str) -> Node {
        parse(source, &ParseOptions::new().context(Context::Declaration)).unwrap()
    }

    #[test]
    fn value_fragments_by_type() {
        let border = declaration("border: 1px solid red");
        let Node::Declaration(node) = &border else {
            panic!("not a declaration");
        };
        let fragments = lexer().find_value_fragments(&node.property, &node.value, "Type", "color");
        assert_eq!(fragment_texts(&fragments), ["red"]);

        let font = declaration("font: 10px Arial, Courier new, Times new roman");
        let Node::Declaration(node) = &font else {
            panic!("not a declaration");
        };
        let fragments = lexer().find_value_fragments(&node.property, &node.value, "Type", "family-name");
        assert_eq!(fragment_texts(&fragments), ["Arial", "Courier new", "Times new roman"]);
    }

    #[test]
    fn declaration_value_fragments() {
        let border = declaration("border: 1px solid red");
        let fragments = lexer().find_declaration_value_fragments(&border, "Type", "color");
        assert_eq!(fragment_texts(&fragments), ["red"]);

        let font = declaration("font: 10px Arial, Courier new, Times new roman");
        let fragments = lexer().find_declaration_value_fragments(&font, "Type", "family-name");
        assert_eq!(fragment_texts(&fragments), ["Arial", "Courier new", "Times new roman"]);

        let not_a_declaration = value("red");
        let fragments = lexer().find_declaration_value_fragments(&not_a_declaration, "Type", "color");
        assert!(fragments.is_empty());
    }

    #[test]
    fn all_fragments_in_a_stylesheet() {
        let ast = parse(
            "foo { border: 1px solid red; } bar { color: rgba(1,2,3,4); border-color: #123 rgb(1,2,3) }",
            &ParseOptions::new(),
        )
        .unwrap();
        let fragments = lexer().find_all_fragments(&ast, "Type", "color");

        assert_eq!(fragment_texts(&fragments), ["red", "rgba(1,2,3,4)", "#123", "rgb(1,2,3)"]);
    }

    #[test]
    fn dump_lists_canonical_grammars() {
        let lexer = Lexer::new(LexerConfig::new().property("p", "a{1,}").type_syntax("t", "<p-x>{0,1}"));
        let dump = lexer.dump();

        assert_eq!(dump["generic"], true);
        assert_eq!(dump["properties"]["p"], "a+");
        assert_eq!(dump["types"]["t"], "<p-x>?");
        assert!(dump["types"].get("length").is_none());
    }
}
