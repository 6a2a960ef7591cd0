use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use myst_analysis::completion::completion_items;
use myst_analysis::document::{FileSystemSource, Position, Range, TextDocument};
use myst_analysis::go_to_definition::goto_definition;
use myst_analysis::patterns::PatternKind;
use myst_analysis::project::{project_definitions, project_references, ProjectScope};
use myst_analysis::references::find_references;
use myst_analysis::workspace::{IndexSettings, Workspace};
use tempfile::tempdir;

const FIGURES: &str = "# Figures\n\n```{figure-md} fig-tree\n![tree](tree.png)\n```\n";
const INDEX: &str = "(intro)=\n{#intro}\n\nSee {numref}`fig-tree` for details.\n";
const CHAPTER: &str = "Back to [the start](intro).\n\n:::{figure-md} fig-leaf\n:::\n";

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create dir");
    }
    fs::write(path, text).expect("write file");
}

fn sphinx_project(root: &Path) {
    write(root, "conf.py", "project = 'demo'\n");
    write(root, "figures/tree.md", FIGURES);
    write(root, "index.md", INDEX);
    write(root, "part/chapter.md", CHAPTER);
    write(root, "_static/notes.txt", "{#not-markdown}\n");
}

#[tokio::test]
async fn figure_reference_round_trip() {
    let temp = tempdir().expect("temp dir");
    let root = temp.path();
    sphinx_project(root);

    let settings = IndexSettings::default();
    let workspace = Workspace::new(&FileSystemSource, &settings);
    let index = TextDocument::new(root.join("index.md"), INDEX);

    let target = goto_definition(&workspace, &index, Position::new(3, 16))
        .await
        .expect("fig-tree resolves");
    assert_eq!(target.path, root.join("figures/tree.md"));
    assert_eq!(target.range, Range::on_line(2, 15, 23));
    assert_eq!(target.kind, PatternKind::FigureMdBackticks);

    let figures = TextDocument::new(root.join("figures/tree.md"), FIGURES);
    let references = find_references(&workspace, &figures, Position::new(2, 18), false).await;
    assert_eq!(references.len(), 1);
    assert_eq!(references[0].path, root.join("index.md"));
    assert_eq!(references[0].range, Range::on_line(3, 13, 21));
}

#[tokio::test]
async fn project_maps_cover_every_markdown_file() {
    let temp = tempdir().expect("temp dir");
    let root = temp.path();
    sphinx_project(root);

    let project = project_definitions(root, &FileSystemSource).await;
    let identifiers: BTreeSet<_> = project.definitions.keys().map(String::as_str).collect();
    assert_eq!(identifiers, BTreeSet::from(["fig-leaf", "fig-tree", "intro"]));
    assert!(project.duplicates.is_empty());

    let references = project_references(root, &FileSystemSource).await;
    assert_eq!(references["fig-tree"].len(), 1);
    assert_eq!(references["intro"].len(), 1);
    assert_eq!(references["intro"][0].path, root.join("part/chapter.md"));
}

#[tokio::test]
async fn nested_document_finds_root_marker() {
    let temp = tempdir().expect("temp dir");
    let root = temp.path();
    sphinx_project(root);

    let settings = IndexSettings::default();
    let workspace = Workspace::new(&FileSystemSource, &settings);
    let chapter = TextDocument::new(root.join("part/chapter.md"), CHAPTER);

    assert_eq!(
        workspace.scope(&chapter).await,
        ProjectScope::Rooted(root.to_path_buf())
    );
    let target = goto_definition(&workspace, &chapter, Position::new(0, 21))
        .await
        .expect("intro resolves");
    assert_eq!(target.path, root.join("index.md"));
    assert_eq!(target.range, Range::on_line(1, 2, 7));
}

#[tokio::test]
async fn completion_offers_project_identifiers() {
    let temp = tempdir().expect("temp dir");
    let root = temp.path();
    sphinx_project(root);
    let draft = "Compare {numref}`";
    write(root, "draft.md", draft);

    let settings = IndexSettings::default();
    let workspace = Workspace::new(&FileSystemSource, &settings);
    let document = TextDocument::new(root.join("draft.md"), draft);
    let position = Position::new(0, draft.chars().count());

    let items = completion_items(&workspace, &document, position, Some("`"))
        .await
        .expect("applicable");
    let labels: BTreeSet<_> = items.iter().map(|item| item.label.as_str()).collect();
    let expected = workspace.definitions(&document).await;
    let expected: BTreeSet<_> = expected.keys().map(String::as_str).collect();
    assert_eq!(labels, expected);
    assert_eq!(labels.len(), 3);
}

#[tokio::test]
async fn document_outside_project_is_indexed_alone() {
    let temp = tempdir().expect("temp dir");
    let root = temp.path();
    write(root, "other.md", "{#elsewhere}\n");
    let text = "{#local}\n[x](elsewhere) [y](local)\n";
    write(root, "loose.md", text);

    let settings = IndexSettings {
        marker_file: "myst-test-marker-that-does-not-exist".into(),
    };
    let workspace = Workspace::new(&FileSystemSource, &settings);
    let document = TextDocument::new(root.join("loose.md"), text);

    assert_eq!(workspace.scope(&document).await, ProjectScope::SingleDocument);
    assert!(goto_definition(&workspace, &document, Position::new(1, 6))
        .await
        .is_none());
    let local = goto_definition(&workspace, &document, Position::new(1, 21))
        .await
        .expect("local resolves");
    assert_eq!(local.range, Range::on_line(0, 2, 7));
}
