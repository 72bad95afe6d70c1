use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Marker used for file leaves in the mapping form.
pub const FILE_MARKER: &str = "file";

/// Errors raised while parsing an expected structure document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("invalid json: {0}")]
    Json(String),
    #[error("invalid node at '{path}': {reason}")]
    Node { path: String, reason: String },
}

/// A file leaf or a nested folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderNode {
    File,
    Folder(FolderTree),
}

impl FolderNode {
    pub fn is_file(&self) -> bool {
        matches!(self, FolderNode::File)
    }
}

/// Ordered mapping from entry name to node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderTree {
    children: Vec<(String, FolderNode)>,
}

impl FolderTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FolderNode)> {
        self.children.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn get(&self, name: &str) -> Option<&FolderNode> {
        self.children
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, node)| node)
    }

    /// Set `name` to `node`, keeping the original position when replacing.
    pub fn insert(&mut self, name: impl Into<String>, node: FolderNode) {
        let name = name.into();
        match self.children.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = node,
            None => self.children.push((name, node)),
        }
    }

    /// Folder stored under `name`, created or turned from a file into a folder.
    pub fn folder_mut(&mut self, name: &str) -> &mut FolderTree {
        let idx = match self.children.iter().position(|(key, _)| key == name) {
            Some(idx) => {
                if self.children[idx].1.is_file() {
                    self.children[idx].1 = FolderNode::Folder(FolderTree::new());
                }
                idx
            }
            None => {
                self.children
                    .push((name.to_string(), FolderNode::Folder(FolderTree::new())));
                self.children.len() - 1
            }
        };
        match &mut self.children[idx].1 {
            FolderNode::Folder(tree) => tree,
            FolderNode::File => unreachable!("entry was converted to a folder above"),
        }
    }

    /// Builder helper for declaring a file leaf.
    pub fn with_file(mut self, name: impl Into<String>) -> Self {
        self.insert(name, FolderNode::File);
        self
    }

    /// Builder helper for declaring a sub-folder.
    pub fn with_folder(mut self, name: impl Into<String>, tree: FolderTree) -> Self {
        self.insert(name, FolderNode::Folder(tree));
        self
    }

    /// Parse either the mapping form (`name -> "file" | mapping`) or a list
    /// of `{name, is_folder, children}` nodes.
    pub fn from_value(value: &Value) -> Result<FolderTree, StructureError> {
        parse_value(value, "")
    }

    /// Mapping form of the tree.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for (name, node) in &self.children {
            let value = match node {
                FolderNode::File => Value::String(FILE_MARKER.to_string()),
                FolderNode::Folder(tree) => tree.to_value(),
            };
            map.insert(name.clone(), value);
        }
        Value::Object(map)
    }
}

impl Serialize for FolderTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.children.len()))?;
        for (name, node) in &self.children {
            match node {
                FolderNode::File => map.serialize_entry(name, FILE_MARKER)?,
                FolderNode::Folder(tree) => map.serialize_entry(name, tree)?,
            }
        }
        map.end()
    }
}

fn parse_value(value: &Value, path: &str) -> Result<FolderTree, StructureError> {
    match value {
        Value::Object(map) => parse_mapping(map, path),
        Value::Array(nodes) => parse_nodes(nodes, path),
        _ => Err(node_error(path, "expected an object or a list of nodes")),
    }
}

fn parse_mapping(map: &Map<String, Value>, path: &str) -> Result<FolderTree, StructureError> {
    let mut tree = FolderTree::new();
    for (name, value) in map {
        let child_path = join(path, name);
        if name.is_empty() {
            return Err(node_error(&child_path, "empty entry name"));
        }
        let node = match value {
            Value::String(marker) if marker == FILE_MARKER => FolderNode::File,
            Value::String(marker) => {
                return Err(node_error(
                    &child_path,
                    &format!("unknown marker '{marker}', expected '{FILE_MARKER}'"),
                ));
            }
            Value::Object(_) | Value::Array(_) => {
                FolderNode::Folder(parse_value(value, &child_path)?)
            }
            _ => return Err(node_error(&child_path, "expected \"file\" or a nested folder")),
        };
        tree.insert(name.clone(), node);
    }
    Ok(tree)
}

fn parse_nodes(nodes: &[Value], path: &str) -> Result<FolderTree, StructureError> {
    let mut tree = FolderTree::new();
    for (idx, node) in nodes.iter().enumerate() {
        let index_path = join(path, &idx.to_string());
        let object = node
            .as_object()
            .ok_or_else(|| node_error(&index_path, "expected a node object"))?;
        let name = object
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| node_error(&index_path, "node requires a non-empty name"))?;

        // Optional nodes do not constrain the archive.
        if object.get("required").and_then(Value::as_bool) == Some(false) {
            continue;
        }

        let children = match object.get("children") {
            None | Some(Value::Null) => None,
            Some(Value::Array(children)) => Some(children.as_slice()),
            Some(_) => return Err(node_error(&join(path, name), "children must be a list")),
        };
        let flagged_folder = object
            .get("is_folder")
            .or_else(|| object.get("isFolder"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
            || object.get("type").and_then(Value::as_str) == Some("folder");

        let child_path = join(path, name);
        let node = if flagged_folder || children.is_some_and(|c| !c.is_empty()) {
            FolderNode::Folder(parse_nodes(children.unwrap_or(&[]), &child_path)?)
        } else {
            FolderNode::File
        };
        tree.insert(name, node);
    }
    Ok(tree)
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

fn node_error(path: &str, reason: &str) -> StructureError {
    StructureError::Node {
        path: if path.is_empty() { "/".to_string() } else { path.to_string() },
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_mapping_form_in_declaration_order() {
        let value = json!({
            "src": {"index.js": "file", "utils": {"helper.js": "file"}},
            "package.json": "file",
            "README.md": "file"
        });
        let tree = FolderTree::from_value(&value).expect("parse");
        let names: Vec<_> = tree.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["src", "package.json", "README.md"]);
        match tree.get("src") {
            Some(FolderNode::Folder(src)) => {
                assert_eq!(src.get("index.js"), Some(&FolderNode::File));
                assert!(matches!(src.get("utils"), Some(FolderNode::Folder(_))));
            }
            other => panic!("unexpected src node: {other:?}"),
        }
    }

    #[test]
    fn parses_node_list_form() {
        let value = json!([
            {"name": "src", "isFolder": true, "children": [{"name": "main.rs", "isFolder": false}]},
            {"name": "docs", "type": "folder", "required": false},
            {"name": "Cargo.toml", "type": "file"}
        ]);
        let tree = FolderTree::from_value(&value).expect("parse");
        let expected = FolderTree::new()
            .with_folder("src", FolderTree::new().with_file("main.rs"))
            .with_file("Cargo.toml");
        assert_eq!(tree, expected);
    }

    #[test]
    fn rejects_unknown_markers_and_scalars() {
        let err = FolderTree::from_value(&json!({"src": {"a.rs": "dir"}})).unwrap_err();
        assert_eq!(
            err,
            StructureError::Node {
                path: "src/a.rs".to_string(),
                reason: "unknown marker 'dir', expected 'file'".to_string(),
            }
        );
        assert!(FolderTree::from_value(&json!("file")).is_err());
        assert!(FolderTree::from_value(&json!({"a": 1})).is_err());
    }

    #[test]
    fn folder_mut_reclassifies_files() {
        let mut tree = FolderTree::new().with_file("build");
        tree.folder_mut("build").insert("out.txt", FolderNode::File);
        assert_eq!(
            tree,
            FolderTree::new().with_folder("build", FolderTree::new().with_file("out.txt"))
        );
    }

    #[test]
    fn serializes_to_mapping_form() {
        let tree = FolderTree::new()
            .with_folder("src", FolderTree::new().with_file("lib.rs"))
            .with_file("README.md");
        let encoded = serde_json::to_value(&tree).expect("serialize");
        assert_eq!(encoded, json!({"src": {"lib.rs": "file"}, "README.md": "file"}));
        assert_eq!(encoded, tree.to_value());
    }
}
