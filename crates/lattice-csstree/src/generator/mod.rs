//! CSS text generation from a CST.
//!
//! The generator walks a [`Node`] and emits tokens. Before each token it
//! consults the adjacency table of the selected [`GenerateMode`] and inserts
//! a single space only where the two tokens would otherwise fuse when read
//! back, so the output is compact yet parses to the same tree.
//!
//! # Example
//!
//! ```
//! use lattice_csstree::generator::generate;
//! use lattice_csstree::parser::{parse, ParseOptions};
//!
//! let ast = parse(".a  >  b { color : red }", &ParseOptions::new()).unwrap();
//! assert_eq!(generate(&ast), ".a>b{color:red}");
//! ```

mod node;
mod source_map;
mod token_before;

use tracing::{debug, trace};

use crate::ast::Node;
use crate::list::List;
use crate::logging::targets;
use crate::tokenizer::{tokenize, TokenType};

pub use source_map::{MapPosition, Mapping, MappingCollector, SourceMapSink};

use source_map::Tracker;

const REVERSE_SOLIDUS: char = '\\';

/// Which whitespace insertion table to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerateMode {
    /// Only the pairs CSS Syntax requires.
    #[default]
    Spec,
    /// Additional separators for consumers with older tokenizers.
    Safe,
}

/// Options for [`generate_with`].
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub mode: GenerateMode,
    /// Collect source map mappings alongside the text.
    pub source_map: bool,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: GenerateMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn source_map(mut self, enabled: bool) -> Self {
        self.source_map = enabled;
        self
    }
}

/// Output of [`generate_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub css: String,
    /// Present when [`GenerateOptions::source_map`] was set.
    pub map: Option<MappingCollector>,
}

/// Wraps the text generated for each node.
///
/// Called bottom-up: the text passed for a node already contains the
/// decorated text of its children.
pub trait Decorator {
    fn decorate(&mut self, node: &Node, text: String) -> String;
}

impl<F> Decorator for F
where
    F: FnMut(&Node, String) -> String,
{
    fn decorate(&mut self, node: &Node, text: String) -> String {
        self(node, text)
    }
}

/// Emission state shared by the per-node generators.
pub struct Generator<'g> {
    mode: GenerateMode,
    output: String,
    prev_code: u32,
    decorator: Option<&'g mut dyn Decorator>,
    tracker: Option<Tracker<'g>>,
}

impl<'g> Generator<'g> {
    fn new(mode: GenerateMode) -> Self {
        Self {
            mode,
            output: String::new(),
            prev_code: 0,
            decorator: None,
            tracker: None,
        }
    }

    /// Append text as is, without touching adjacency state.
    pub fn chunk(&mut self, text: &str) {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.advance(text);
        }
        self.output.push_str(text);
    }

    /// Emit a token, preceded by a space when it would fuse with the
    /// previous one.
    pub fn token(&mut self, token: TokenType, value: &str) {
        if token_before::is_white_space_required(self.mode, self.prev_code, token, value) {
            self.chunk(" ");
        }
        self.prev_code = token_before::token_code(token, value);
        self.chunk(value);

        // an escape must not swallow whatever follows
        if token == TokenType::Delim && value.starts_with(REVERSE_SOLIDUS) {
            self.chunk("\n");
            self.prev_code = TokenType::WhiteSpace as u32;
        }
    }

    /// Re-tokenize `text` and emit every token it contains.
    pub fn tokenize(&mut self, text: &str) {
        tokenize(text, |token, start, end| self.token(token, &text[start..end]));
    }

    /// Generate a child node.
    pub fn node(&mut self, node: &Node) {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.enter(node);
        }

        if self.decorator.is_some() {
            let outer = std::mem::take(&mut self.output);
            self.generate_node(node);
            let inner = std::mem::replace(&mut self.output, outer);
            if let Some(decorator) = self.decorator.as_deref_mut() {
                let text = decorator.decorate(node, inner);
                self.output.push_str(&text);
            }
        } else {
            self.generate_node(node);
        }

        if let Some(tracker) = self.tracker.as_mut() {
            tracker.leave(node);
        }
    }

    /// Generate every node of `list`, calling `delimiter` with the previous
    /// node between consecutive items.
    pub fn children<F>(&mut self, list: &List<Node>, mut delimiter: F)
    where
        F: FnMut(&mut Self, &Node),
    {
        let mut prev: Option<&Node> = None;

        for item in list.iter() {
            if let Some(prev) = prev {
                delimiter(self, prev);
            }
            self.node(item);
            prev = Some(item);
        }
    }

    /// Generate every node of `list` without delimiters.
    pub fn each(&mut self, list: &List<Node>) {
        self.children(list, |_, _| {});
    }

    fn finish(mut self) -> String {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.finish();
        }
        self.output
    }
}

/// Serialize `node` using the spec adjacency table.
pub fn generate(node: &Node) -> String {
    let mut generator = Generator::new(GenerateMode::Spec);
    generator.node(node);
    generator.finish()
}

/// Serialize `node` with explicit options.
pub fn generate_with(node: &Node, options: &GenerateOptions) -> Generated {
    trace!(target: targets::GENERATOR, kind = node.kind(), mode = ?options.mode, "generate");

    if !options.source_map {
        let mut generator = Generator::new(options.mode);
        generator.node(node);
        return Generated {
            css: generator.finish(),
            map: None,
        };
    }

    let mut collector = MappingCollector::new();
    let css = generate_into(node, options.mode, &mut collector);

    Generated {
        css,
        map: Some(collector),
    }
}

/// Serialize `node`, reporting source map mappings to `sink`.
pub fn generate_with_source_map(node: &Node, sink: &mut dyn SourceMapSink) -> String {
    generate_into(node, GenerateMode::Spec, sink)
}

/// Serialize `node`, passing the text of every node through `decorator`.
pub fn generate_decorated(node: &Node, options: &GenerateOptions, decorator: &mut dyn Decorator) -> String {
    let mut generator = Generator::new(options.mode);
    generator.decorator = Some(decorator);
    generator.node(node);
    generator.finish()
}

fn generate_into(node: &Node, mode: GenerateMode, sink: &mut dyn SourceMapSink) -> String {
    let mut generator = Generator::new(mode);
    generator.tracker = Some(Tracker::new(sink));
    generator.node(node);
    let css = generator.finish();

    debug!(target: targets::GENERATOR, length = css.len(), "generated with source map");
    css
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, Context, ParseOptions};

    fn round_trip(source: &str) -> String {
        generate(&parse(source, &ParseOptions::new()).unwrap())
    }

    fn value(source: &str) -> String {
        let ast = parse(source, &ParseOptions::new().context(Context::Value)).unwrap();
        generate(&ast)
    }

    #[test]
    fn stylesheet_is_compacted() {
        assert_eq!(round_trip(".a  >  b { color : red ; }"), ".a>b{color:red}");
        assert_eq!(round_trip("a b, c { top: 0; left: 1px }"), "a b,c{top:0;left:1px}");
    }

    #[test]
    fn identifiers_keep_a_separator() {
        assert_eq!(value("1px solid red"), "1px solid red");
        assert_eq!(value("a(1) b"), "a(1) b");
        assert_eq!(value("1 -2"), "1 -2");
    }

    #[test]
    fn atrules_and_important() {
        assert_eq!(
            round_trip("@media screen and (min-width: 100px) { a { color: red !important } }"),
            "@media screen and (min-width:100px){a{color:red!important}}"
        );
        assert_eq!(round_trip("@import url(foo.css);"), "@import url(foo.css);");
        assert_eq!(round_trip("a { color: red ! ie }"), "a{color:red!ie}");
    }

    #[test]
    fn strings_and_urls_are_reencoded() {
        assert_eq!(value("'a\"b'"), "\"a\\\"b\"");
        assert_eq!(value("url( 'a b' )"), "url(a\\ b)");
    }

    #[test]
    fn selectors_round_trip() {
        let source = "a#id.cls[href^=\"x\" i]:not(.b, .c)::before :nth-child(2n+1 of .d)";
        let output = round_trip(&format!("{source}{{}}"));

        assert_eq!(
            output,
            "a#id.cls[href^=\"x\"i]:not(.b,.c)::before :nth-child(2n+1 of.d){}"
        );
        assert_eq!(round_trip(&output), output);
    }

    #[test]
    fn an_plus_b_is_canonical() {
        assert_eq!(round_trip(":nth-child(+n){}"), ":nth-child(n){}");
        assert_eq!(round_trip(":nth-child(-n + 3){}"), ":nth-child(-n+3){}");
        assert_eq!(round_trip(":nth-child( 2n - 1 ){}"), ":nth-child(2n-1){}");
        assert_eq!(round_trip(":nth-child(5){}"), ":nth-child(5){}");
    }

    #[test]
    fn safe_mode_adds_separators() {
        let ast = parse("a{margin:calc(1px)auto}", &ParseOptions::new()).unwrap();
        let spec = generate_with(&ast, &GenerateOptions::new()).css;
        let safe = generate_with(&ast, &GenerateOptions::new().mode(GenerateMode::Safe)).css;

        assert_eq!(spec, "a{margin:calc(1px)auto}");
        assert_eq!(safe, "a{margin:calc(1px) auto}");
    }

    #[test]
    fn reparsing_generated_text_is_stable() {
        let sources = [
            "a{width:calc(100% - 10px)}",
            "@font-face{font-family:x;src:url(a.woff) format(\"woff\")}",
            "a{grid-area:1/2/3}",
            "a{margin:-1px -2px}",
            "a:hover>b~c+d{}",
            "@supports (display:grid) and (not (display:inline-grid)){a{float:none}}",
        ];

        for source in sources {
            let mut first = parse(source, &ParseOptions::new()).unwrap();
            let mut second = parse(&generate(&first), &ParseOptions::new()).unwrap();
            first.strip_locations();
            second.strip_locations();
            assert_eq!(first, second, "{source}");
        }
    }

    #[test]
    fn source_map_tracks_declarations() {
        let options = ParseOptions::new().positions(true).filename("a.css");
        let ast = parse("a {\n  color: red;\n}", &options).unwrap();

        let generated = generate_with(&ast, &GenerateOptions::new().source_map(true));
        let map = generated.map.unwrap();

        assert_eq!(generated.css, "a{color:red}");
        let originals: Vec<_> = map
            .mappings
            .iter()
            .filter_map(|mapping| mapping.original.map(|pos| (pos.line, pos.column)))
            .collect();
        assert_eq!(originals, [(1, 0), (2, 2)]);
        assert_eq!(map.mappings[0].source.as_deref(), Some("a.css"));
        assert_eq!(map.mappings.last().map(|mapping| mapping.generated.column), Some(11));
    }

    #[test]
    fn decorator_wraps_node_text() {
        let ast = parse("a{color:red}", &ParseOptions::new()).unwrap();
        let mut decorate = |node: &Node, text: String| match node {
            Node::Declaration(_) => format!("[{text}]"),
            _ => text,
        };

        let output = generate_decorated(&ast, &GenerateOptions::new(), &mut decorate);
        assert_eq!(output, "a{[color:red]}");
    }

    #[test]
    fn escaped_delim_is_followed_by_newline() {
        let mut generator = Generator::new(GenerateMode::Spec);
        generator.token(TokenType::Delim, "\\");
        generator.token(TokenType::Ident, "a");

        assert_eq!(generator.finish(), "\\\na");
    }
}
