use delivcheck_core::ArchiveEntry;
use delivcheck_rules::{FolderNode, FolderTree};
use serde::Serialize;

/// Paths found missing (and, reserved, unexpected) when diffing trees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructureDiff {
    pub missing_paths: Vec<String>,
    /// Never populated: unexpected entries do not fail a structure rule.
    pub extra_paths: Vec<String>,
}

impl StructureDiff {
    pub fn is_satisfied(&self) -> bool {
        self.missing_paths.is_empty()
    }
}

/// Build the tree described by archive entry paths.
///
/// Empty segments are dropped. The last segment is a file unless the path
/// ends with `/`; when a name is seen both as a file and as a folder, the
/// last entry wins.
pub fn build_actual_tree(entries: &[ArchiveEntry]) -> FolderTree {
    let mut root = FolderTree::new();
    for entry in entries {
        let segments: Vec<&str> = entry
            .path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();
        let Some((last, parents)) = segments.split_last() else {
            continue;
        };

        let mut current = &mut root;
        for segment in parents {
            current = current.folder_mut(segment);
        }
        if entry.path.ends_with('/') {
            current.folder_mut(last);
        } else {
            current.insert(*last, FolderNode::File);
        }
    }
    root
}

/// Report every expected path absent from `actual`.
pub fn compare_structures(expected: &FolderTree, actual: &FolderTree) -> StructureDiff {
    let mut diff = StructureDiff::default();
    collect_missing(expected, Some(actual), "", &mut diff);
    diff
}

fn collect_missing(
    expected: &FolderTree,
    actual: Option<&FolderTree>,
    prefix: &str,
    diff: &mut StructureDiff,
) {
    for (name, expected_node) in expected.iter() {
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}/{name}")
        };
        let actual_node = actual.and_then(|tree| tree.get(name));
        match (expected_node, actual_node) {
            (_, None) => diff.missing_paths.push(path),
            (FolderNode::Folder(_), Some(FolderNode::File)) => diff.missing_paths.push(path),
            (FolderNode::Folder(expected_children), Some(FolderNode::Folder(actual_children))) => {
                collect_missing(expected_children, Some(actual_children), &path, diff);
            }
            (FolderNode::File, Some(_)) => {}
        }
    }
}
