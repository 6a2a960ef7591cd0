use std::collections::HashSet;

use crate::document::{Position, TextDocument};
use crate::symbols::SymbolLocation;
use crate::workspace::Workspace;

/// Finds every reference to the identifier under the caret.
///
/// With `include_declaration`, the definition site (if any) is listed first.
pub async fn find_references(
    workspace: &Workspace<'_>,
    document: &TextDocument,
    position: Position,
    include_declaration: bool,
) -> Vec<SymbolLocation> {
    let mut locations = Vec::new();
    if include_declaration {
        locations.extend(workspace.definition_at(document, position).await);
    }
    locations.extend(workspace.references_at(document, position).await);
    dedup_locations(&mut locations);
    locations
}

fn dedup_locations(locations: &mut Vec<SymbolLocation>) {
    let mut seen = HashSet::new();
    locations.retain(|location| seen.insert((location.path.clone(), location.range)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{FileSystemSource, Range};
    use crate::patterns::PatternKind;
    use crate::workspace::IndexSettings;
    use std::fs;
    use tempfile::tempdir;

    const SOURCE: &str = r#":name: tbl-data

First {numref}`tbl-data`.
Second [table](tbl-data) and {numref}`tbl-data`.
"#;

    fn isolated() -> IndexSettings {
        IndexSettings {
            marker_file: "no-such-marker.cfg".into(),
        }
    }

    #[tokio::test]
    async fn finds_references_from_usage() {
        let settings = isolated();
        let workspace = Workspace::new(&FileSystemSource, &settings);
        let document = TextDocument::new("/nowhere/doc.md", SOURCE);
        let locations = find_references(&workspace, &document, Position::new(2, 16), false).await;
        assert_eq!(locations.len(), 3);
        assert!(locations
            .iter()
            .all(|location| location.kind != PatternKind::NameDirective));
    }

    #[tokio::test]
    async fn finds_references_from_definition() {
        let settings = isolated();
        let workspace = Workspace::new(&FileSystemSource, &settings);
        let document = TextDocument::new("/nowhere/doc.md", SOURCE);
        let locations = find_references(&workspace, &document, Position::new(0, 9), false).await;
        assert_eq!(locations.len(), 3);
    }

    #[tokio::test]
    async fn includes_declaration_when_requested() {
        let settings = isolated();
        let workspace = Workspace::new(&FileSystemSource, &settings);
        let document = TextDocument::new("/nowhere/doc.md", SOURCE);
        let locations = find_references(&workspace, &document, Position::new(0, 9), true).await;
        assert_eq!(locations.len(), 4);
        assert_eq!(locations[0].kind, PatternKind::NameDirective);
        assert_eq!(locations[0].range, Range::on_line(0, 7, 15));
    }

    #[tokio::test]
    async fn unreferenced_identifier_is_empty() {
        let settings = isolated();
        let workspace = Workspace::new(&FileSystemSource, &settings);
        let document = TextDocument::new("/nowhere/doc.md", "{#lonely}\n");
        assert!(find_references(&workspace, &document, Position::new(0, 3), false)
            .await
            .is_empty());
        assert!(find_references(&workspace, &document, Position::new(4, 0), true)
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn merges_references_across_files() {
        let temp = tempdir().expect("temp dir");
        let root = temp.path();
        fs::write(root.join("conf.py"), "").unwrap();
        fs::write(root.join("a.md"), "{numref}`x` then {numref}`x`\n").unwrap();
        fs::write(root.join("b.md"), "[x](x)\n").unwrap();

        let settings = IndexSettings::default();
        let workspace = Workspace::new(&FileSystemSource, &settings);
        let document = TextDocument::new(root.join("b.md"), "[x](x)\n");
        let locations = find_references(&workspace, &document, Position::new(0, 4), false).await;
        assert_eq!(locations.len(), 3);
    }
}
