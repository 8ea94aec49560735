//! Filesystem-backed collaborators and their in-memory stand-ins.

use std::path::Path;

use apim_ci::fakes::MemoryDocumentWriter;
use apim_ci::{
    generate, serialize, ActionKind, ArtifactVersionReader, CollaboratorError, DocumentWriter,
    EnvironmentFacts, FsDocumentWriter, GeneratorConfig, GeneratorContext, PomVersionReader,
};

#[test]
fn fs_writer_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join(".circleci/generated/dynamicConfig.yml");

    FsDocumentWriter
        .write("version: 2.1\n", &destination)
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(&destination).unwrap(),
        "version: 2.1\n"
    );
}

#[test]
fn fs_writer_overwrites_existing_document() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("dynamicConfig.yml");
    std::fs::write(&destination, "stale").unwrap();

    FsDocumentWriter.write("fresh", &destination).unwrap();
    assert_eq!(std::fs::read_to_string(&destination).unwrap(), "fresh");
}

#[test]
fn fs_writer_reports_destination_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "file, not a directory").unwrap();
    let destination = blocker.join("dynamicConfig.yml");

    let err = FsDocumentWriter.write("x", &destination).unwrap_err();
    assert!(matches!(err, CollaboratorError::Write { .. }));
}

#[test]
fn pom_reader_reads_revision_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let pom = dir.path().join("pom.xml");
    std::fs::write(
        &pom,
        "<project>\n  <properties>\n    <revision>4.5.1</revision>\n  </properties>\n</project>\n",
    )
    .unwrap();

    assert_eq!(PomVersionReader.read_version(&pom), Some("4.5.1".to_string()));
}

#[test]
fn pom_reader_missing_file_yields_none() {
    assert_eq!(
        PomVersionReader.read_version(Path::new("/nonexistent/apim/pom.xml")),
        None
    );
}

#[test]
fn full_release_uses_version_from_pom() {
    let dir = tempfile::tempdir().unwrap();
    let pom = dir.path().join("pom.xml");
    std::fs::write(&pom, "<revision>4.5.1-rc.2</revision>").unwrap();

    let facts = EnvironmentFacts::new(ActionKind::FullRelease, "5f0c2a91d3e4b7")
        .with_branch("4.5.x")
        .with_base_branch("4.5.x")
        .with_version("4.5.0")
        .with_artifact_version_file_path(&pom);
    let config = GeneratorConfig::default();
    let pipeline = generate(&facts, &GeneratorContext::new(&config, &PomVersionReader)).unwrap();

    let document = serialize(&pipeline).unwrap();
    assert!(document.contains("gh release create 4.5.1-rc.2"));
    assert!(!document.contains("4.5.0"));
}

#[test]
fn memory_writer_keeps_documents_per_destination() {
    let writer = MemoryDocumentWriter::new();
    assert!(writer.is_empty());

    writer.write("a", Path::new("first.yml")).unwrap();
    writer.write("b", Path::new("second.yml")).unwrap();
    writer.write("c", Path::new("first.yml")).unwrap();

    assert_eq!(writer.len(), 2);
    assert_eq!(writer.get(Path::new("first.yml")).as_deref(), Some("c"));
    assert_eq!(writer.get(Path::new("missing.yml")), None);
}
