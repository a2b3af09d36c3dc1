//! Incremental reparses through the orchestrator must produce the same tree
//! as parsing the final text from scratch.

use std::sync::{Arc, Mutex};

use tree_cache::document::{DocumentSource, TextEdit};
use tree_cache::syntax::ParseKind;
use tree_cache::{DocumentStore, ParseOrchestrator, TreeCacheSettings, TreeSitterEngine};
use tree_sitter::{Node, Parser, Point, Tree};
use url::Url;

#[derive(Debug, PartialEq)]
struct NodeShape {
    kind: String,
    start: Point,
    end: Point,
    bytes: std::ops::Range<usize>,
}

fn shape(tree: &Tree) -> Vec<NodeShape> {
    fn walk(node: Node<'_>, out: &mut Vec<NodeShape>) {
        out.push(NodeShape {
            kind: node.kind().to_string(),
            start: node.start_position(),
            end: node.end_position(),
            bytes: node.byte_range(),
        });
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            walk(child, out);
        }
    }

    let mut out = Vec::new();
    walk(tree.root_node(), &mut out);
    out
}

fn fresh_parse(text: &str) -> Tree {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_rust::LANGUAGE.into())
        .unwrap();
    parser.parse(text, None).unwrap()
}

struct Fixture {
    store: Arc<DocumentStore>,
    orchestrator: ParseOrchestrator<TreeSitterEngine, DocumentStore>,
    kinds: Arc<Mutex<Vec<ParseKind>>>,
    uri: Url,
}

impl Fixture {
    fn new(text: &str) -> Self {
        let store = Arc::new(DocumentStore::new());
        let orchestrator = ParseOrchestrator::new(
            TreeSitterEngine::rust().unwrap(),
            store.clone(),
            &TreeCacheSettings::default(),
        );

        let kinds = Arc::new(Mutex::new(Vec::new()));
        let recorded = kinds.clone();
        orchestrator.on_parse_completed(move |event| {
            recorded.lock().unwrap().push(event.kind);
        });

        let uri = Url::parse("file:///workspace/src/lib.rs").unwrap();
        store.open(uri.clone(), 1, text).unwrap();
        Self {
            store,
            orchestrator,
            kinds,
            uri,
        }
    }

    /// Apply edits as one notification and forward it to the orchestrator.
    fn edit(&self, version: i32, edits: &[TextEdit]) {
        let mut events = self.store.subscribe();
        self.store.apply_edits(&self.uri, version, edits).unwrap();
        let event = events.try_recv().unwrap();
        self.orchestrator.handle_event(&event);
    }

    fn text(&self) -> String {
        self.store.snapshot(&self.uri).unwrap().into_text()
    }

    fn tree_shape(&self) -> Vec<NodeShape> {
        let doc = self.store.snapshot(&self.uri).unwrap();
        let tree = self.orchestrator.get_tree_for_document(&doc).unwrap();
        shape(&tree)
    }

    fn kinds(&self) -> Vec<ParseKind> {
        self.kinds.lock().unwrap().clone()
    }
}

#[test]
fn test_single_insertion_matches_fresh_parse() {
    let fixture = Fixture::new("fn main() {\n    let x = 1;\n}\n");
    fixture.tree_shape();

    // Insert a second statement after `let x = 1;`
    fixture.edit(2, &[TextEdit::insert(26, "\n    let y = x + 2;")]);

    assert_eq!(fixture.tree_shape(), shape(&fresh_parse(&fixture.text())));
    assert_eq!(fixture.kinds(), vec![ParseKind::Fresh, ParseKind::Incremental]);
}

#[test]
fn test_multiline_replacement_and_deletion() {
    let original = "\
struct Point {
    x: i32,
    y: i32,
}

fn origin() -> Point {
    Point { x: 0, y: 0 }
}
";
    let fixture = Fixture::new(original);
    fixture.tree_shape();

    let old_fields = "    x: i32,\n    y: i32,\n";
    let new_fields = "    x: i32,\n    y: i32,\n    z: i32,\n";
    let old_body = "Point { x: 0, y: 0 }";
    let new_body = "Point { x: 0, y: 0, z: 0 }";
    let fields = original.find(old_fields).unwrap();
    let body = original.find(old_body).unwrap();
    fixture.edit(
        2,
        &[
            // Later edit first: offsets stay valid for the earlier one
            TextEdit::new(body, old_body.len(), new_body),
            TextEdit::new(fields, old_fields.len(), new_fields),
        ],
    );
    assert_eq!(fixture.tree_shape(), shape(&fresh_parse(&fixture.text())));

    // Remove the whole function
    let text = fixture.text();
    let function = text.find("\nfn origin").unwrap();
    fixture.edit(3, &[TextEdit::delete(function, text.len() - function)]);
    assert_eq!(fixture.tree_shape(), shape(&fresh_parse(&fixture.text())));

    assert_eq!(
        fixture.kinds(),
        vec![ParseKind::Fresh, ParseKind::Incremental, ParseKind::Incremental]
    );
}

#[test]
fn test_multibyte_edit_matches_fresh_parse() {
    let original = "const GREETING: &str = \"あいう\";\nfn main() {}\n";
    let fixture = Fixture::new(original);
    fixture.tree_shape();

    let start = original.find("あいう").unwrap();
    fixture.edit(2, &[TextEdit::new(start, "あいう".len(), "こんにちは, 世界")]);

    assert_eq!(fixture.tree_shape(), shape(&fresh_parse(&fixture.text())));
}

#[test]
fn test_two_notifications_equal_one_batch() {
    let original = "fn a() {}\n";
    let one_by_one = Fixture::new(original);
    let batched = Fixture::new(original);
    one_by_one.tree_shape();
    batched.tree_shape();

    one_by_one.edit(2, &[TextEdit::insert(10, "fn b() {}\n")]);
    one_by_one.edit(3, &[TextEdit::insert(20, "fn c() {}\n")]);
    batched.edit(
        2,
        &[
            TextEdit::insert(10, "fn b() {}\n"),
            TextEdit::insert(20, "fn c() {}\n"),
        ],
    );

    assert_eq!(one_by_one.text(), batched.text());
    assert_eq!(one_by_one.tree_shape(), batched.tree_shape());
    assert_eq!(batched.tree_shape(), shape(&fresh_parse(&batched.text())));
}

#[test]
fn test_edit_into_broken_syntax_and_back() {
    let fixture = Fixture::new("fn main() {\n    let x = 1;\n}\n");
    fixture.tree_shape();

    // `let x = 1;` -> `let x = ;`
    fixture.edit(2, &[TextEdit::delete(24, 1)]);
    fixture.tree_shape();
    assert!(fresh_parse(&fixture.text()).root_node().has_error());

    fixture.edit(3, &[TextEdit::insert(24, "42")]);
    assert_eq!(fixture.tree_shape(), shape(&fresh_parse(&fixture.text())));
    assert!(!fresh_parse(&fixture.text()).root_node().has_error());
}
