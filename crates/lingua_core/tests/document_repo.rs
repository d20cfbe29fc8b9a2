use lingua_core::model::document::{Axis, AxisRole, ConceptExtra, RepresentationType};
use lingua_core::service::concept_store::NewConcept;
use lingua_core::{ConceptStore, Document, DocumentRepository, JsonDocumentRepository, RepoError};
use serde_json::json;

#[test]
fn missing_file_bootstraps_empty_document_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("glossary.json");
    let repo = JsonDocumentRepository::new(&path);

    let doc = repo.load().unwrap();
    assert_eq!(doc, Document::new());
    assert!(path.exists());

    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, json!({"meta": {}, "layers": []}));
}

#[test]
fn save_then_load_roundtrips_mutator_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glossary.json");
    let mut store = ConceptStore::open(JsonDocumentRepository::new(&path)).unwrap();

    store.ensure_layer("core", Some(3), Some("base terms")).unwrap();
    store
        .add_concept(NewConcept {
            layer_alias: "core".to_string(),
            term: "hot".to_string(),
            definition: "high temperature".to_string(),
            extra: ConceptExtra {
                representation_type: Some(RepresentationType::State),
                axes: vec![Axis {
                    axis: "temperature".to_string(),
                    role: AxisRole::A,
                    dual_term: "cold".to_string(),
                }],
                tags: vec!["physics".to_string()],
                refs: Vec::new(),
            },
            link_terms: vec!["cold".to_string()],
            ..NewConcept::default()
        })
        .unwrap();

    let reloaded = JsonDocumentRepository::new(&path).load().unwrap();
    assert_eq!(&reloaded, store.document());
    assert_eq!(reloaded.concept_count(), 2);
}

#[test]
fn optional_fields_default_when_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glossary.json");
    std::fs::write(
        &path,
        json!({
            "layers": [{"id": "1", "alias": "core", "concepts": [{"id": "1.1", "term": "foo"}]}]
        })
        .to_string(),
    )
    .unwrap();

    let doc = JsonDocumentRepository::new(&path).load().unwrap();
    assert!(doc.meta.is_empty());
    let layer = doc.layer("1").unwrap();
    assert_eq!(layer.level, 1);
    assert!(layer.description.is_empty());
    let (_, concept) = doc.find_concept("1.1").unwrap();
    assert!(concept.definition.is_empty());
    assert!(concept.refs.is_empty());
    assert_eq!(concept.representation_type, None);
    assert!(concept.axes.is_empty() && concept.tags.is_empty());
}

#[test]
fn meta_is_preserved_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glossary.json");
    std::fs::write(
        &path,
        json!({"meta": {"owner": "me", "v": [1, 2]}, "layers": []}).to_string(),
    )
    .unwrap();

    let repo = JsonDocumentRepository::new(&path);
    let doc = repo.load().unwrap();
    repo.save(&doc).unwrap();
    let again = repo.load().unwrap();
    assert_eq!(again.meta.get("owner"), Some(&json!("me")));
    assert_eq!(again.meta.get("v"), Some(&json!([1, 2])));
}

#[test]
fn malformed_file_fails_loudly_and_is_left_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glossary.json");
    std::fs::write(&path, "{ \"layers\": [ oops").unwrap();

    let err = JsonDocumentRepository::new(&path).load().unwrap_err();
    assert!(matches!(err, RepoError::Malformed { .. }));
    assert!(err.to_string().contains("glossary.json"));
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "{ \"layers\": [ oops"
    );

    let store_err = ConceptStore::open(JsonDocumentRepository::new(&path)).err();
    assert!(store_err.is_some());
}

#[test]
fn save_replaces_file_without_leaving_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glossary.json");
    let mut store = ConceptStore::open(JsonDocumentRepository::new(&path)).unwrap();
    store.ensure_layer("a", None, None).unwrap();
    store.ensure_layer("b", None, None).unwrap();

    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("glossary.json")]);
    assert_eq!(
        JsonDocumentRepository::new(&path).load().unwrap().layers.len(),
        2
    );
}

#[test]
fn unknown_keys_survive_a_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glossary.json");
    std::fs::write(
        &path,
        json!({
            "meta": {},
            "schema": 2,
            "layers": [{
                "id": "1",
                "alias": "core",
                "color": "red",
                "concepts": [
                    {"id": "1.1", "term": "foo", "examples": ["x"]},
                    {"id": "1.2", "term": "bar"}
                ]
            }]
        })
        .to_string(),
    )
    .unwrap();

    let mut store = ConceptStore::open(JsonDocumentRepository::new(&path)).unwrap();
    assert!(store.link_symmetric("1.1", "1.2").unwrap());

    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk["schema"], json!(2));
    assert_eq!(on_disk["layers"][0]["color"], json!("red"));
    assert_eq!(on_disk["layers"][0]["concepts"][0]["examples"], json!(["x"]));
    assert_eq!(on_disk["layers"][0]["concepts"][0]["refs"], json!(["1.2"]));
}

#[test]
fn non_canonical_enum_values_load_and_are_not_lost() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glossary.json");
    std::fs::write(
        &path,
        json!({
            "layers": [{
                "id": "1",
                "alias": "core",
                "concepts": [
                    {
                        "id": "1.1",
                        "term": "hot",
                        "representation_type": "State",
                        "axes": [{"axis": "temperature", "role": "a", "dual_term": "cold"}]
                    },
                    {"id": "1.2", "term": "calm", "representation_type": "mood"}
                ]
            }]
        })
        .to_string(),
    )
    .unwrap();

    let repo = JsonDocumentRepository::new(&path);
    let doc = repo.load().unwrap();
    let (_, hot) = doc.find_concept("1.1").unwrap();
    assert_eq!(hot.representation_type, Some(RepresentationType::State));
    assert_eq!(hot.axes[0].role, AxisRole::A);
    let (_, calm) = doc.find_concept("1.2").unwrap();
    assert_eq!(calm.representation_type, None);

    let mut store = ConceptStore::open(repo).unwrap();
    store.delete_concept("1.1").unwrap();
    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        on_disk["layers"][0]["concepts"][0]["representation_type"],
        json!("mood")
    );
}
