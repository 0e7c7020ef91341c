//! Directory objects.
//!
//! Directories are encoded bottom-up: every child is stored before the
//! directory that links to it. The walk keeps its own stack of open
//! directories, so hierarchy depth does not grow the call stack.

use crate::backend::ObjectStore;
use crate::dag::{MerkleDag, Stored};
use crate::error::{Error, Result};
use crate::node::{DirNode, Node};
use crate::object::{Link, Object};
use tracing::trace;

/// A directory whose children are still being stored.
struct Frame<'n> {
    name: Option<&'n str>,
    entries: Box<dyn Iterator<Item = (&'n str, &'n Node)> + 'n>,
    links: Vec<Link>,
}

impl<'n> Frame<'n> {
    fn new(name: Option<&'n str>, dir: &'n DirNode) -> Self {
        Self {
            name,
            entries: Box::new(dir.entries()),
            links: Vec::with_capacity(dir.len()),
        }
    }
}

impl<S: ObjectStore + ?Sized> MerkleDag<'_, S> {
    /// Store a directory tree and return the key of its root directory object.
    pub(crate) fn store_directory(&self, root: &DirNode) -> Result<Stored> {
        let mut stack = vec![Frame::new(None, root)];
        let mut finished = None;

        while let Some(frame) = stack.last_mut() {
            match frame.entries.next() {
                Some((name, Node::File(file))) => {
                    let stored = self.store_file(file.bytes())?;
                    frame
                        .links
                        .push(Link::named(name, stored.key, stored.size)?);
                }
                Some((name, Node::Directory(dir))) => {
                    stack.push(Frame::new(Some(name), dir));
                }
                None => {
                    let links = std::mem::take(&mut frame.links);
                    let name = frame.name;
                    stack.pop();

                    let object = Object::directory(links)?;
                    let size = object.logical_size();
                    let key = self.store.put_object(&object)?;
                    trace!(
                        key = %key,
                        name = name.unwrap_or("/"),
                        entries = object.links().len(),
                        "stored directory"
                    );

                    match (stack.last_mut(), name) {
                        (Some(parent), Some(name)) => {
                            parent.links.push(Link::named(name, key, size)?);
                        }
                        _ => finished = Some(Stored { key, size }),
                    }
                }
            }
        }

        finished.ok_or_else(|| Error::malformed("directory walk produced no root"))
    }
}
