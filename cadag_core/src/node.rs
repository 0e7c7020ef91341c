//! Source nodes: the files and directories handed to the importer.

use crate::error::{Error, Result};
use crate::object::validate_name;
use std::collections::BTreeMap;

/// A file or directory to import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A regular file.
    File(FileNode),
    /// A directory of named children.
    Directory(DirNode),
}

impl Node {
    /// Create a file node from raw bytes.
    pub fn file(data: impl Into<Vec<u8>>) -> Self {
        Node::File(FileNode::new(data))
    }

    /// Logical size in bytes: file length, or the sum over all files below a directory.
    pub fn size(&self) -> u64 {
        match self {
            Node::File(file) => file.size(),
            Node::Directory(dir) => dir.entries().map(|(_, child)| child.size()).sum(),
        }
    }
}

/// File content held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    data: Vec<u8>,
}

impl FileNode {
    /// Create a file from raw bytes.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// Raw file content.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Logical size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// A directory whose children enumerate in bytewise name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirNode {
    children: BTreeMap<String, Node>,
}

impl DirNode {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a named child.
    pub fn insert(&mut self, name: impl Into<String>, node: Node) -> Result<()> {
        let name = name.into();
        validate_name(&name)?;
        self.children.insert(name, node);
        Ok(())
    }

    /// Builder-style [`DirNode::insert`].
    pub fn with(mut self, name: impl Into<String>, node: Node) -> Result<Self> {
        self.insert(name, node)?;
        Ok(self)
    }

    /// Look up a child by name.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    /// Children in deterministic order.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = (&str, &Node)> {
        self.children.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the directory has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Insert a file at a `/`-separated path, creating intermediate directories.
    pub fn insert_path(&mut self, path: &str, data: impl Into<Vec<u8>>) -> Result<()> {
        let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let file_name = segments
            .pop()
            .ok_or_else(|| Error::invalid_name(format!("Empty file path: {:?}", path)))?;

        self.dir_at_mut(&segments)?.insert(file_name, Node::file(data))
    }

    /// Create a (possibly empty) directory at a `/`-separated path.
    pub fn create_dir_path(&mut self, path: &str) -> Result<()> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.dir_at_mut(&segments).map(|_| ())
    }

    fn dir_at_mut(&mut self, segments: &[&str]) -> Result<&mut DirNode> {
        let mut dir = self;
        for segment in segments {
            validate_name(segment)?;
            let child = dir
                .children
                .entry(segment.to_string())
                .or_insert_with(|| Node::Directory(DirNode::new()));
            dir = match child {
                Node::Directory(sub) => sub,
                Node::File(_) => {
                    return Err(Error::invalid_name(format!(
                        "{} is a file, not a directory",
                        segment
                    )));
                }
            };
        }
        Ok(dir)
    }
}

impl From<DirNode> for Node {
    fn from(dir: DirNode) -> Self {
        Node::Directory(dir)
    }
}

impl From<FileNode> for Node {
    fn from(file: FileNode) -> Self {
        Node::File(file)
    }
}
