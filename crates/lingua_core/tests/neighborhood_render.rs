use lingua_core::graph::layout::{force_layout, LayoutConfig};
use lingua_core::graph::neighborhood::{neighborhood, NeighborhoodNode, RefDirection};
use lingua_core::{Document, GraphRenderer, PngRenderer, SvgRenderer};
use serde_json::json;

fn fixture(value: serde_json::Value) -> Document {
    serde_json::from_value(value).unwrap()
}

fn foo_bar() -> Document {
    fixture(json!({
        "meta": {},
        "layers": [{
            "id": "1",
            "alias": "core",
            "concepts": [
                {"id": "1.1", "term": "foo", "refs": ["1.2"]},
                {"id": "1.2", "term": "bar", "refs": ["1.1"]}
            ]
        }]
    }))
}

#[test]
fn mutual_reference_yields_both_nodes_and_opposite_edges() {
    let graph = neighborhood(&foo_bar(), "1.1");

    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(
        graph.nodes.get("1.1"),
        Some(&NeighborhoodNode {
            label: "foo".to_string(),
            is_focal: true
        })
    );
    assert_eq!(
        graph.nodes.get("1.2"),
        Some(&NeighborhoodNode {
            label: "bar".to_string(),
            is_focal: false
        })
    );
    assert!(graph.has_edge("1.1", "1.2"));
    assert!(graph.has_edge("1.2", "1.1"));
    assert_eq!(graph.edges.len(), 2);
    assert_eq!(graph.focal_id(), Some("1.1"));
}

#[test]
fn missing_focal_yields_empty_graph() {
    let graph = neighborhood(&foo_bar(), "9.9");
    assert!(graph.is_empty());
    assert!(graph.edges.is_empty());
}

#[test]
fn asymmetric_refs_are_found_from_both_sides() {
    let doc = fixture(json!({
        "layers": [{
            "id": "1",
            "alias": "core",
            "concepts": [
                {"id": "1.1", "term": "focal", "refs": ["1.2"]},
                {"id": "1.2", "term": "out"},
                {"id": "1.3", "term": "in", "refs": ["1.1"]},
                {"id": "1.4", "term": "unrelated", "refs": ["1.2"]}
            ]
        }]
    }));

    let graph = neighborhood(&doc, "1.1");
    let ids: Vec<&str> = graph.nodes.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["1.1", "1.2", "1.3"]);

    let outgoing: Vec<_> = graph
        .edges
        .iter()
        .filter(|edge| edge.direction == RefDirection::Outgoing)
        .collect();
    assert_eq!(outgoing.len(), 1);
    assert_eq!(outgoing[0].to, "1.2");
    assert!(graph.has_edge("1.3", "1.1"));
    assert!(!graph.has_edge("1.1", "1.3"));
}

#[test]
fn layout_is_deterministic_for_the_same_graph() {
    let doc = fixture(json!({
        "layers": [{
            "id": "1",
            "alias": "core",
            "concepts": [
                {"id": "1.1", "term": "hub", "refs": ["1.2", "1.3", "1.4"]},
                {"id": "1.2", "term": "a", "refs": ["1.1"]},
                {"id": "1.3", "term": "b", "refs": ["1.1"]},
                {"id": "1.4", "term": "c", "refs": ["1.1"]}
            ]
        }]
    }));
    let graph = neighborhood(&doc, "1.1");
    let config = LayoutConfig::default();

    let first = force_layout(&graph, &config);
    let second = force_layout(&graph, &config);
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
}

#[test]
fn png_renderer_emits_png_bytes_deterministically() {
    let graph = neighborhood(&foo_bar(), "1.1");
    let renderer = PngRenderer::new(LayoutConfig {
        width: 200,
        height: 160,
        ..LayoutConfig::default()
    });

    let image = renderer.render(&graph).unwrap();
    assert_eq!(image.media_type, "image/png");
    assert_eq!(&image.bytes[..8], b"\x89PNG\r\n\x1a\n");
    assert_eq!(renderer.render(&graph).unwrap(), image);
}

#[test]
fn svg_renderer_labels_every_node() {
    let graph = neighborhood(&foo_bar(), "1.2");
    let image = SvgRenderer::default().render(&graph).unwrap();
    let text = String::from_utf8(image.bytes).unwrap();

    assert_eq!(image.media_type, "image/svg+xml");
    assert!(text.starts_with("<svg"));
    assert!(text.contains(">foo<"));
    assert!(text.contains(">bar<"));
    assert_eq!(text.matches("marker-end").count(), 2);
}
