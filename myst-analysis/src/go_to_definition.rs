use crate::document::{Position, TextDocument};
use crate::symbols::SymbolLocation;
use crate::workspace::Workspace;

/// Resolves the identifier under the caret to its definition site.
///
/// The caret does not need to sit inside a reference construct; any
/// identifier-shaped word is looked up, so jumping from a definition to
/// itself also works.
pub async fn goto_definition(
    workspace: &Workspace<'_>,
    document: &TextDocument,
    position: Position,
) -> Option<SymbolLocation> {
    workspace.definition_at(document, position).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{FileSystemSource, Range};
    use crate::test_support::position_of;
    use crate::workspace::IndexSettings;
    use std::fs;
    use tempfile::tempdir;

    const SOURCE: &str = r#"{#intro}

```{figure-md} fig-tree
```

See {numref}`fig-tree` and [back](intro) or {numref}`missing`.
"#;

    #[tokio::test]
    async fn resolves_within_single_document() {
        let settings = IndexSettings {
            marker_file: "no-such-marker.cfg".into(),
        };
        let workspace = Workspace::new(&FileSystemSource, &settings);
        let document = TextDocument::new("/nowhere/chapter.md", SOURCE);

        let location = goto_definition(&workspace, &document, position_of(SOURCE, "fig-tree`"))
            .await
            .expect("definition found");
        assert_eq!(location.range, Range::on_line(2, 15, 23));

        let location = goto_definition(&workspace, &document, position_of(SOURCE, "intro)"))
            .await
            .expect("definition found");
        assert_eq!(location.range, Range::on_line(0, 2, 7));
    }

    #[tokio::test]
    async fn unknown_or_missing_word_is_none() {
        let settings = IndexSettings {
            marker_file: "no-such-marker.cfg".into(),
        };
        let workspace = Workspace::new(&FileSystemSource, &settings);
        let document = TextDocument::new("/nowhere/chapter.md", SOURCE);

        assert!(goto_definition(&workspace, &document, position_of(SOURCE, "missing"))
            .await
            .is_none());
        assert!(goto_definition(&workspace, &document, Position::new(1, 0))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn resolves_across_project_files() {
        let temp = tempdir().expect("temp dir");
        let root = temp.path();
        fs::write(root.join("conf.py"), "").unwrap();
        fs::create_dir_all(root.join("figures")).unwrap();
        fs::write(root.join("figures/tree.md"), "```{figure-md} fig-tree\n```\n").unwrap();
        let text = "See {numref}`fig-tree`.\n";
        fs::write(root.join("index.md"), text).unwrap();

        let settings = IndexSettings::default();
        let workspace = Workspace::new(&FileSystemSource, &settings);
        let document = TextDocument::new(root.join("index.md"), text);
        let location = goto_definition(&workspace, &document, Position::new(0, 15))
            .await
            .expect("definition found");
        assert_eq!(location.path, root.join("figures/tree.md"));
        assert_eq!(location.range, Range::on_line(0, 15, 23));
    }
}
