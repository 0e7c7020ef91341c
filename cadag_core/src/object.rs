//! Canonical object encoding.
//!
//! Every object in the DAG is serialized with a fixed field order so that
//! identical objects always produce identical bytes, and therefore identical
//! content keys. All integers are little-endian:
//!
//! ```text
//! 0x00  4   "MDAG" magic
//! 0x04  1   version (u8) = 1
//! 0x05  1   kind: 1=blob, 2=list, 3=directory
//! 0x06  2   reserved (must be 0)
//! 0x08  4   link_count (u32)
//!       per link:
//!       32  hash
//!       8   size (u64, logical bytes below the link)
//!       1   name flag: 0=absent, 1=present
//!       2   name_len (u16)      } only when the
//!       N   name (UTF-8)        } flag is 1
//! ..    8   data_len (u64)
//! ..    N   data
//! ```
//!
//! The format is part of the durable contract: changing it changes every
//! content key computed so far.

use crate::error::{Error, Result};
use crate::hash::{HASH_SIZE, Hash};

/// Magic bytes at the start of every encoded object.
pub const MAGIC: &[u8; 4] = b"MDAG";

/// Current canonical encoding version.
pub const VERSION: u8 = 1;

/// Size of the fixed object header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Maximum length of a link name in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// Smallest possible encoded link (hash + size + absent-name flag).
const MIN_LINK_SIZE: usize = HASH_SIZE + 8 + 1;

/// Object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Raw bytes, no links.
    Blob = 1,
    /// Interior node of a chunk tree: unnamed links, no data.
    List = 2,
    /// Directory: named links sorted by name, no data.
    Directory = 3,
}

impl ObjectKind {
    /// Convert to byte representation.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse from byte representation.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(ObjectKind::Blob),
            2 => Ok(ObjectKind::List),
            3 => Ok(ObjectKind::Directory),
            _ => Err(Error::malformed(format!("Invalid object kind: {}", value))),
        }
    }

    /// Get the string name of this object kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::List => "list",
            ObjectKind::Directory => "directory",
        }
    }
}

/// A reference from a parent object to an already-stored child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Entry name; present only for directory entries.
    pub name: Option<String>,
    /// Content key of the child object.
    pub hash: Hash,
    /// Logical (decoded) byte length of the subtree behind this link.
    pub size: u64,
}

impl Link {
    /// Create an unnamed link, as used between chunk-tree nodes.
    pub fn chunk(hash: Hash, size: u64) -> Self {
        Self {
            name: None,
            hash,
            size,
        }
    }

    /// Create a named directory entry link.
    pub fn named(name: impl Into<String>, hash: Hash, size: u64) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name: Some(name),
            hash,
            size,
        })
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.hash.as_bytes());
        buf.extend_from_slice(&self.size.to_le_bytes());
        match &self.name {
            None => buf.push(0),
            Some(name) => {
                buf.push(1);
                buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
                buf.extend_from_slice(name.as_bytes());
            }
        }
    }

    fn decode_from(decoder: &mut Decoder<'_>) -> Result<Self> {
        let hash_bytes: [u8; HASH_SIZE] = decoder
            .take(HASH_SIZE)?
            .try_into()
            .map_err(|_| Error::malformed("Failed to parse link hash"))?;
        let hash = Hash::from_bytes(hash_bytes);
        let size = decoder.u64()?;

        let name = match decoder.u8()? {
            0 => None,
            1 => {
                let len = decoder.u16()? as usize;
                let raw = decoder.take(len)?;
                let name = std::str::from_utf8(raw)
                    .map_err(|e| Error::malformed(format!("Invalid UTF-8 in link name: {}", e)))?
                    .to_string();
                validate_name(&name).map_err(|e| Error::malformed(e.to_string()))?;
                Some(name)
            }
            flag => {
                return Err(Error::malformed(format!("Invalid name flag: {}", flag)));
            }
        };

        Ok(Self { name, hash, size })
    }
}

/// Validate a directory entry name.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_name("Name cannot be empty"));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(Error::invalid_name(format!(
            "Name too long: {} bytes (max {})",
            name.len(),
            MAX_NAME_LEN
        )));
    }

    if name.contains('\0') {
        return Err(Error::invalid_name("Name cannot contain null bytes"));
    }

    if name.contains('/') {
        return Err(Error::invalid_name(format!(
            "Name cannot contain '/': {}",
            name
        )));
    }

    Ok(())
}

/// An immutable DAG object: a blob, a chunk-tree list node, or a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    kind: ObjectKind,
    links: Vec<Link>,
    data: Vec<u8>,
}

impl Object {
    /// Create a blob holding raw bytes.
    pub fn blob(data: Vec<u8>) -> Self {
        Self {
            kind: ObjectKind::Blob,
            links: Vec::new(),
            data,
        }
    }

    /// Create a chunk-tree list node. Links keep their byte order.
    pub fn list(links: Vec<Link>) -> Result<Self> {
        check_list_links(&links)?;
        total_link_size(&links)?;
        Ok(Self {
            kind: ObjectKind::List,
            links,
            data: Vec::new(),
        })
    }

    /// Create a directory node. Links are sorted by name (bytewise).
    pub fn directory(mut links: Vec<Link>) -> Result<Self> {
        links.sort_by(|a, b| link_name(a).as_bytes().cmp(link_name(b).as_bytes()));
        check_directory_links(&links).map_err(|e| match e {
            Error::Malformed { reason } => Error::invalid_name(reason),
            other => other,
        })?;
        total_link_size(&links)?;
        Ok(Self {
            kind: ObjectKind::Directory,
            links,
            data: Vec::new(),
        })
    }

    /// The object kind.
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Ordered links to child objects.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Raw data (non-empty only for blobs).
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the object, returning its data.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Whether this object is a leaf blob.
    pub fn is_blob(&self) -> bool {
        self.kind == ObjectKind::Blob
    }

    /// Logical byte length of the content this object materializes to.
    pub fn logical_size(&self) -> u64 {
        match self.kind {
            ObjectKind::Blob => self.data.len() as u64,
            ObjectKind::List | ObjectKind::Directory => self
                .links
                .iter()
                .fold(0u64, |total, link| total.saturating_add(link.size)),
        }
    }

    /// Find a link by name.
    pub fn find_link(&self, name: &str) -> Option<&Link> {
        self.links
            .iter()
            .find(|link| link.name.as_deref() == Some(name))
    }

    /// Encode the object to its canonical byte form.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            HEADER_SIZE + 4 + self.links.len() * (MIN_LINK_SIZE + 2) + 8 + self.data.len(),
        );

        // Header
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.push(self.kind.to_u8());
        buf.extend_from_slice(&[0u8; 2]);

        // Links
        buf.extend_from_slice(&(self.links.len() as u32).to_le_bytes());
        for link in &self.links {
            link.encode_into(&mut buf);
        }

        // Data
        buf.extend_from_slice(&(self.data.len() as u64).to_le_bytes());
        buf.extend_from_slice(&self.data);

        buf
    }

    /// Decode an object from its canonical byte form.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut decoder = Decoder::new(bytes);

        let magic = decoder.take(4)?;
        if magic != MAGIC {
            return Err(Error::malformed(format!(
                "Invalid magic: expected {:?}, got {:?}",
                MAGIC, magic
            )));
        }

        let version = decoder.u8()?;
        if version != VERSION {
            return Err(Error::malformed(format!(
                "Unsupported version: {} (expected {})",
                version, VERSION
            )));
        }

        let kind = ObjectKind::from_u8(decoder.u8()?)?;

        if decoder.take(2)? != [0u8, 0u8] {
            return Err(Error::malformed("Reserved bytes must be 0"));
        }

        let link_count = decoder.u32()? as usize;
        let mut links = Vec::with_capacity(link_count.min(decoder.remaining() / MIN_LINK_SIZE));
        for _ in 0..link_count {
            links.push(Link::decode_from(&mut decoder)?);
        }

        let data_len = usize::try_from(decoder.u64()?)
            .map_err(|_| Error::malformed("Data length does not fit in memory"))?;
        let data = decoder.take(data_len)?.to_vec();

        if decoder.remaining() != 0 {
            return Err(Error::malformed(format!(
                "{} trailing bytes after object",
                decoder.remaining()
            )));
        }

        match kind {
            ObjectKind::Blob => {
                if !links.is_empty() {
                    return Err(Error::malformed("Blob cannot have links"));
                }
            }
            ObjectKind::List => {
                check_no_data(&data, kind)?;
                check_list_links(&links)?;
                total_link_size(&links)?;
            }
            ObjectKind::Directory => {
                check_no_data(&data, kind)?;
                check_directory_links(&links)?;
                total_link_size(&links)?;
            }
        }

        Ok(Self { kind, links, data })
    }

    /// Content key of this object: SHA-256 of its canonical encoding.
    pub fn content_key(&self) -> Hash {
        Hash::digest(&self.encode())
    }
}

fn link_name(link: &Link) -> &str {
    link.name.as_deref().unwrap_or("")
}

fn check_no_data(data: &[u8], kind: ObjectKind) -> Result<()> {
    if data.is_empty() {
        Ok(())
    } else {
        Err(Error::malformed(format!(
            "A {} object cannot carry data",
            kind.as_str()
        )))
    }
}

fn check_list_links(links: &[Link]) -> Result<()> {
    if links.is_empty() {
        return Err(Error::malformed("List node must have at least one link"));
    }
    if links.iter().any(|l| l.name.is_some()) {
        return Err(Error::malformed("List node links cannot be named"));
    }
    Ok(())
}

/// Sum of link sizes, which must fit in `u64`.
fn total_link_size(links: &[Link]) -> Result<u64> {
    links.iter().try_fold(0u64, |total, link| {
        total
            .checked_add(link.size)
            .ok_or_else(|| Error::malformed("Link sizes overflow u64"))
    })
}

/// Directory links must all be named and strictly ascending by name bytes.
fn check_directory_links(links: &[Link]) -> Result<()> {
    for link in links {
        match &link.name {
            Some(name) => validate_name(name).map_err(|e| Error::malformed(e.to_string()))?,
            None => return Err(Error::malformed("Directory link is missing a name")),
        }
    }

    for pair in links.windows(2) {
        let (a, b) = (link_name(&pair[0]), link_name(&pair[1]));
        if a.as_bytes() >= b.as_bytes() {
            return Err(Error::malformed(format!(
                "Directory entries out of order or duplicated: {:?} then {:?}",
                a, b
            )));
        }
    }

    Ok(())
}

/// Bounds-checked reader over an encoded object.
struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::malformed(format!(
                "Unexpected end of input: need {} bytes at offset {}, have {}",
                n,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let mut bytes = [0u8; 2];
        bytes.copy_from_slice(self.take(2)?);
        Ok(u16::from_le_bytes(bytes))
    }

    fn u32(&mut self) -> Result<u32> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(bytes))
    }

    fn u64(&mut self) -> Result<u64> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_directory() -> Object {
        Object::directory(vec![
            Link::named("b.txt", Hash::digest(b"b"), 1).unwrap(),
            Link::named("a.txt", Hash::digest(b"a"), 2).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_object_kind_conversions() {
        assert_eq!(ObjectKind::Blob.to_u8(), 1);
        assert_eq!(ObjectKind::List.to_u8(), 2);
        assert_eq!(ObjectKind::Directory.to_u8(), 3);

        assert_eq!(ObjectKind::from_u8(3).unwrap(), ObjectKind::Directory);
        assert!(ObjectKind::from_u8(0).is_err());
        assert!(ObjectKind::from_u8(4).is_err());
    }

    #[test]
    fn test_blob_layout() {
        let encoded = Object::blob(b"hi".to_vec()).encode();

        assert_eq!(&encoded[0..4], MAGIC);
        assert_eq!(encoded[4], VERSION);
        assert_eq!(encoded[5], ObjectKind::Blob.to_u8());
        assert_eq!(&encoded[8..12], &0u32.to_le_bytes());
        assert_eq!(&encoded[12..20], &2u64.to_le_bytes());
        assert_eq!(&encoded[20..], b"hi");
    }

    #[test]
    fn test_empty_blob_decodes() {
        let blob = Object::blob(Vec::new());
        let decoded = Object::decode(&blob.encode()).unwrap();
        assert!(decoded.is_blob());
        assert!(decoded.data().is_empty());
        assert_eq!(decoded.logical_size(), 0);
    }

    #[test]
    fn test_absent_and_empty_are_distinct() {
        // An empty blob and an empty directory must never share a key
        let blob = Object::blob(Vec::new());
        let dir = Object::directory(Vec::new()).unwrap();
        assert_ne!(blob.content_key(), dir.content_key());
    }

    #[test]
    fn test_directory_sorted_by_name() {
        let dir = sample_directory();
        let names: Vec<_> = dir.links().iter().map(link_name).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert_eq!(dir.logical_size(), 3);

        let decoded = Object::decode(&dir.encode()).unwrap();
        assert_eq!(decoded, dir);
        assert_eq!(decoded.find_link("b.txt").unwrap().size, 1);
        assert!(decoded.find_link("c.txt").is_none());
    }

    #[test]
    fn test_directory_rejects_duplicates() {
        let hash = Hash::digest(b"x");
        let result = Object::directory(vec![
            Link::named("same", hash, 1).unwrap(),
            Link::named("same", hash, 1).unwrap(),
        ]);
        assert!(matches!(result, Err(Error::InvalidName { .. })));
    }

    #[test]
    fn test_list_requires_unnamed_links() {
        assert!(Object::list(Vec::new()).is_err());

        let named = Link::named("x", Hash::digest(b"x"), 1).unwrap();
        assert!(Object::list(vec![named]).is_err());

        let list = Object::list(vec![Link::chunk(Hash::digest(b"x"), 1)]).unwrap();
        assert_eq!(list.kind(), ObjectKind::List);
    }

    #[test]
    fn test_list_shape_errors_are_malformed() {
        assert!(matches!(
            Object::list(Vec::new()),
            Err(Error::Malformed { .. })
        ));

        let named = Link::named("x", Hash::digest(b"x"), 1).unwrap();
        assert!(matches!(
            Object::list(vec![named]),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_overflowing_link_sizes_rejected() {
        let hash = Hash::digest(b"x");
        let result = Object::list(vec![Link::chunk(hash, u64::MAX), Link::chunk(hash, 4)]);
        assert!(matches!(result, Err(Error::Malformed { .. })));

        let result = Object::directory(vec![
            Link::named("a", hash, u64::MAX).unwrap(),
            Link::named("b", hash, 1).unwrap(),
        ]);
        assert!(matches!(result, Err(Error::Malformed { .. })));

        // Largest total that still fits
        let list = Object::list(vec![Link::chunk(hash, u64::MAX - 4), Link::chunk(hash, 4)])
            .unwrap();
        assert_eq!(list.logical_size(), u64::MAX);
    }

    #[test]
    fn test_decode_rejects_overflowing_link_sizes() {
        let hash = Hash::digest(b"x");
        let list = Object::list(vec![Link::chunk(hash, u64::MAX - 3), Link::chunk(hash, 3)])
            .unwrap();
        let mut bytes = list.encode();

        // Second link's size field: header, count, first link, then its hash
        let offset = HEADER_SIZE + 4 + MIN_LINK_SIZE + 32;
        bytes[offset..offset + 8].copy_from_slice(&4u64.to_le_bytes());

        assert!(matches!(
            Object::decode(&bytes),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_name_validation() {
        let hash = Hash::digest(b"test");
        assert!(Link::named("", hash, 0).is_err());
        assert!(Link::named("a".repeat(256), hash, 0).is_err());
        assert!(Link::named("a\0b", hash, 0).is_err());
        assert!(Link::named("a/b", hash, 0).is_err());
        assert!(Link::named("a".repeat(255), hash, 0).is_ok());
    }

    #[test]
    fn test_decode_invalid_magic() {
        let mut encoded = Object::blob(b"x".to_vec()).encode();
        encoded[0..4].copy_from_slice(b"XXXX");
        assert!(matches!(
            Object::decode(&encoded),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_decode_invalid_version() {
        let mut encoded = Object::blob(b"x".to_vec()).encode();
        encoded[4] = 99;
        assert!(matches!(
            Object::decode(&encoded),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_decode_reserved_nonzero() {
        let mut encoded = Object::blob(b"x".to_vec()).encode();
        encoded[6] = 1;
        assert!(Object::decode(&encoded).is_err());
    }

    #[test]
    fn test_decode_trailing_bytes() {
        let mut encoded = Object::blob(b"x".to_vec()).encode();
        encoded.push(0);
        assert!(matches!(
            Object::decode(&encoded),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_decode_truncated() {
        let encoded = sample_directory().encode();
        for len in [0, 3, HEADER_SIZE, HEADER_SIZE + 10, encoded.len() - 1] {
            assert!(
                matches!(
                    Object::decode(&encoded[..len]),
                    Err(Error::Malformed { .. })
                ),
                "truncation to {} bytes should be malformed",
                len
            );
        }
    }

    #[test]
    fn test_decode_blob_with_links_rejected() {
        let mut encoded = Object::list(vec![Link::chunk(Hash::digest(b"x"), 1)])
            .unwrap()
            .encode();
        encoded[5] = ObjectKind::Blob.to_u8();
        assert!(matches!(
            Object::decode(&encoded),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_decode_unsorted_directory_rejected() {
        // Hand-assemble a directory with entries in the wrong order
        let mut buf = Vec::new();
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&[VERSION, ObjectKind::Directory.to_u8(), 0, 0]);
        buf.extend_from_slice(&2u32.to_le_bytes());
        for name in ["b", "a"] {
            Link::named(name, Hash::digest(name.as_bytes()), 1)
                .unwrap()
                .encode_into(&mut buf);
        }
        buf.extend_from_slice(&0u64.to_le_bytes());

        assert!(matches!(Object::decode(&buf), Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_decode_huge_link_count_is_malformed() {
        let mut buf = Vec::new();
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&[VERSION, ObjectKind::List.to_u8(), 0, 0]);
        buf.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(Object::decode(&buf), Err(Error::Malformed { .. })));
    }

    use proptest::prelude::*;

    fn arb_entry_name() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9._-]{1,64}"
    }

    fn arb_hash() -> impl Strategy<Value = Hash> {
        prop::array::uniform32(any::<u8>()).prop_map(Hash::from_bytes)
    }

    fn arb_object() -> impl Strategy<Value = Object> {
        prop_oneof![
            prop::collection::vec(any::<u8>(), 0..512).prop_map(Object::blob),
            prop::collection::vec((arb_hash(), any::<u64>()), 1..16).prop_map(|links| {
                Object::list(links.into_iter().map(|(h, s)| Link::chunk(h, s)).collect())
                    .unwrap()
            }),
            prop::collection::btree_map(arb_entry_name(), (arb_hash(), any::<u64>()), 0..16)
                .prop_map(|entries| {
                    Object::directory(
                        entries
                            .into_iter()
                            .map(|(name, (h, s))| Link::named(name, h, s).unwrap())
                            .collect(),
                    )
                    .unwrap()
                }),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            max_shrink_iters: 10000,
            ..ProptestConfig::default()
        })]

        /// Decoding then re-encoding reproduces the exact bytes
        #[test]
        fn prop_encoding_is_canonical(object in arb_object()) {
            let encoded = object.encode();
            let decoded = Object::decode(&encoded)?;
            prop_assert_eq!(decoded.encode(), encoded);
            prop_assert_eq!(decoded, object);
        }

        /// Directory keys do not depend on the order links are supplied in
        #[test]
        fn prop_directory_order_independent(
            entries in prop::collection::btree_map(arb_entry_name(), arb_hash(), 1..20)
        ) {
            let links: Vec<Link> = entries
                .iter()
                .map(|(name, hash)| Link::named(name.clone(), *hash, 1).unwrap())
                .collect();
            let mut reversed = links.clone();
            reversed.reverse();

            let a = Object::directory(links)?;
            let b = Object::directory(reversed)?;
            prop_assert_eq!(a.content_key(), b.content_key());
        }

        /// Arbitrary bytes never panic the decoder
        #[test]
        fn prop_decode_arbitrary_bytes(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
            let _ = Object::decode(&bytes);
        }
    }
}
