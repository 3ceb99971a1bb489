//! Integration tests for PyIndex.
//!
//! These tests run the whole pipeline: walk, extract, assemble, export.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use pyindex::{
    EntityExtractor, EntityKind, EntityStore, ExportDocumentsUseCase, ExportOptions,
    FailureReason, InMemoryEntityStore, IndexCodebaseUseCase, IndexOptions, JsonIndexFile,
    TreeSitterExtractor,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sample_codebase() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let root = dir.path();

    write(root, "README.md", "# Sample project\n");
    write(root, "a.py", "def helper():\n    return 1\n");
    write(root, "b.py", "def helper():\n    return 2\n");
    write(
        root,
        "calc.py",
        "def add(x, y):\n    return x + y\n\n\ndef calc():\n    add(1, 2)\n    return add(3, 4)\n",
    );
    write(root, "scripts/run.py", "import sys\n\nmode = sys.argv[1]\nprint(mode)\n");
    write(root, "broken.py", "def broken(:\n    pass\n");
    write(
        root,
        "pkg/inventory.py",
        include_str!("fixtures/sample_python.py"),
    );

    dir
}

async fn index(dir: &TempDir) -> pyindex::IndexOutcome {
    IndexCodebaseUseCase::new(Arc::new(TreeSitterExtractor::new()))
        .execute(
            dir.path().to_str().unwrap(),
            &IndexOptions::new().with_concurrency(4),
            &CancellationToken::new(),
        )
        .await
        .expect("Indexing failed")
}

#[tokio::test]
async fn test_index_codebase_end_to_end() {
    let dir = sample_codebase();
    let outcome = index(&dir).await;
    let codebase = &outcome.index;

    assert_eq!(codebase.overview, "# Sample project\n");
    assert_eq!(outcome.report.files_discovered, 6);
    assert_eq!(outcome.report.files_processed, 6);
    assert_eq!(codebase.file_count(), 6);

    // Same local name, same line, different files.
    let a = codebase.file("a.py").unwrap().find_entity("a.py::helper").unwrap();
    let b = codebase.file("b.py").unwrap().find_entity("b.py::helper").unwrap();
    assert_eq!(a.start_line(), b.start_line());
    assert_ne!(a, b);

    // Call multiplicity.
    let calc_file = codebase.file("calc.py").unwrap();
    let calc = calc_file.find_entity("calc.py::calc").unwrap();
    assert_eq!(calc.calls(), ["add", "add"]);
    assert_eq!(calc_file.referenced_by["add"], vec!["calc.py", "calc.py"]);
    assert_eq!(calc_file.entity_count(), 2);

    // Script fallback.
    let script_file = codebase.file("scripts/run.py").unwrap();
    assert_eq!(script_file.entity_count(), 1);
    let script = &script_file.entities[0];
    assert_eq!(script.kind(), EntityKind::Script);
    assert_eq!((script.start_line(), script.end_line()), (1, 4));
    assert_eq!(script_file.global_variables, vec!["mode"]);

    // Parse failure isolation.
    assert!(codebase.file("broken.py").unwrap().is_empty());
    assert_eq!(outcome.report.failures.len(), 1);
    assert!(matches!(
        outcome.report.failures[0].reason(),
        FailureReason::Parse(_)
    ));
    assert_eq!(codebase.empty_files(), vec!["broken.py"]);
}

#[tokio::test]
async fn test_fixture_inventory() {
    let dir = sample_codebase();
    let outcome = index(&dir).await;
    let file = outcome.index.file("pkg/inventory.py").unwrap();

    let inventory = file.find_entity("pkg/inventory.py::Inventory").unwrap();
    assert_eq!(inventory.kind(), EntityKind::Class);
    assert_eq!(inventory.methods(), ["Inventory.__init__", "Inventory.add"]);
    assert_eq!(inventory.docstring(), Some("Tracks item counts."));

    let snapshot = file.find_entity("pkg/inventory.py::Snapshot").unwrap();
    assert_eq!(snapshot.methods(), ["Snapshot.freeze"]);

    let validate = file.find_entity("pkg/inventory.py::validate").unwrap();
    assert_eq!(validate.docstring(), Some("Every count must be positive."));
    assert_eq!(validate.calls(), ["ValueError", "len"]);

    let export = file.find_entity("pkg/inventory.py::export").unwrap();
    assert_eq!(export.calls(), ["persist", "persist"]);

    assert_eq!(
        file.imports,
        vec!["json", "collections.defaultdict", "storage.save"]
    );
    assert_eq!(file.imported_functions["save"], "storage");
    assert_eq!(file.global_variables, vec!["DEFAULT_LIMIT"]);
    assert_eq!(
        file.class_methods["Inventory.add"],
        "pkg/inventory.py::Inventory"
    );

    // Two classes, three methods, two module-level functions.
    assert_eq!(file.count_kind(EntityKind::Class), 2);
    assert_eq!(file.count_kind(EntityKind::Function), 5);

    let persist_refs = &outcome.index.references["persist"];
    assert_eq!(persist_refs.len(), 2);
}

#[tokio::test]
async fn test_indexing_is_deterministic() {
    let dir = sample_codebase();
    let first = index(&dir).await;
    let second = index(&dir).await;

    assert_eq!(first.index, second.index);
}

#[tokio::test]
async fn test_index_file_and_export_round_trip() {
    let dir = sample_codebase();
    let outcome = index(&dir).await;

    let out_dir = TempDir::new().unwrap();
    let index_file = JsonIndexFile::new(out_dir.path().join("parsed_code.json"));
    index_file.write(&outcome.index).await.unwrap();
    let loaded = index_file.read().await.unwrap();
    assert_eq!(loaded, outcome.index);

    let store = Arc::new(InMemoryEntityStore::new());
    let use_case = ExportDocumentsUseCase::new(store.clone());
    let report = use_case
        .execute(&loaded, &ExportOptions::new().with_batch_size(4))
        .await
        .unwrap();

    let expected = loaded.entity_count() as u64 + 1;
    assert_eq!(report.documents, expected);
    assert_eq!(report.batches, expected.div_ceil(4));
    assert_eq!(store.count().await.unwrap(), expected);
    assert!(store.get("README").await.is_some());

    // Exporting again yields the same ids.
    let again = use_case.execute(&loaded, &ExportOptions::new()).await.unwrap();
    assert_eq!(again.documents, expected);
    assert_eq!(store.count().await.unwrap(), expected);
}

#[test]
fn test_extractor_reports_python() {
    let extractor = TreeSitterExtractor::new();
    assert_eq!(extractor.language(), pyindex::Language::Python);
}
