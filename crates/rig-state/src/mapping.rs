//! Flat, dot separated interface to nested section trees.
//!
//! Callers address leaves through dotted keys such as `"sim.grid.width"`
//! while storage stays a hierarchy of insertion-ordered sections, one per
//! path segment.

use indexmap::map::Entry;
use indexmap::IndexMap;
use rig_core::errors::{ErrorInfo, RigError};

/// Separates hierarchy levels inside a logical key.
pub const SECTION_SEPARATOR: char = '.';

/// Reserved by the backing container for group nesting; never valid inside
/// a key segment.
pub const RESERVED_GROUP_CHAR: char = '/';

/// A tree node: either a stored leaf or a nested section.
#[derive(Debug, Clone, PartialEq)]
pub enum Node<T> {
    /// A stored leaf value.
    Leaf(T),
    /// A nested, insertion-ordered section.
    Section(Section<T>),
}

/// Insertion-ordered container of named child nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Section<T> {
    entries: IndexMap<String, Node<T>>,
}

impl<T> Section<T> {
    fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Iterates over direct children in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node<T>)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    /// Number of direct children (leaves and subsections).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the section has no children.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits and validates a logical key into its path segments.
pub fn split_key(key: &str) -> Result<Vec<&str>, RigError> {
    if key.is_empty() {
        return Err(RigError::MalformedKey(ErrorInfo::new(
            "mapping.empty_key",
            "key must not be empty",
        )));
    }
    let segments: Vec<&str> = key.split(SECTION_SEPARATOR).collect();
    for segment in &segments {
        if segment.is_empty() {
            return Err(RigError::MalformedKey(
                ErrorInfo::new("mapping.empty_segment", "key contains an empty segment")
                    .with_context("key", key.to_string()),
            ));
        }
        if segment.contains(RESERVED_GROUP_CHAR) {
            return Err(RigError::MalformedKey(
                ErrorInfo::new(
                    "mapping.reserved_character",
                    "key segment contains a character reserved by the backing store",
                )
                .with_context("key", key.to_string())
                .with_context("segment", segment.to_string()),
            ));
        }
    }
    Ok(segments)
}

/// Flat mutable mapping over a hierarchy of nested sections.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchicalMapping<T> {
    base: Section<T>,
}

impl<T> HierarchicalMapping<T> {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self {
            base: Section::new(),
        }
    }

    /// The root section.
    pub fn base(&self) -> &Section<T> {
        &self.base
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.base = Section::new();
    }

    fn missing_section(key: &str, segment: &str) -> RigError {
        RigError::NotFound(
            ErrorInfo::new("mapping.missing_section", "section does not exist")
                .with_context("key", key.to_string())
                .with_context("segment", segment.to_string()),
        )
    }

    fn missing_key(key: &str) -> RigError {
        RigError::NotFound(
            ErrorInfo::new("mapping.missing_key", "key does not exist")
                .with_context("key", key.to_string()),
        )
    }

    fn section_conflict(key: &str, segment: &str) -> RigError {
        RigError::MalformedKey(
            ErrorInfo::new(
                "mapping.section_conflict",
                "key collides with an existing entry of the other kind",
            )
            .with_context("key", key.to_string())
            .with_context("conflict", segment.to_string()),
        )
    }

    /// Walks down to the parent section of `key`'s final segment.
    fn descend<'a>(&'a self, key: &str) -> Result<(&'a Section<T>, String), RigError> {
        let segments = split_key(key)?;
        let (last, sections) = segments.split_last().expect("validated key is non-empty");
        let mut section = &self.base;
        for segment in sections {
            section = match section.entries.get(*segment) {
                Some(Node::Section(next)) => next,
                _ => return Err(Self::missing_section(key, segment)),
            };
        }
        Ok((section, (*last).to_string()))
    }

    fn descend_mut<'a>(&'a mut self, key: &str) -> Result<(&'a mut Section<T>, String), RigError> {
        let segments = split_key(key)?;
        let (last, sections) = segments.split_last().expect("validated key is non-empty");
        let mut section = &mut self.base;
        for segment in sections {
            section = match section.entries.get_mut(*segment) {
                Some(Node::Section(next)) => next,
                _ => return Err(Self::missing_section(key, segment)),
            };
        }
        Ok((section, (*last).to_string()))
    }

    /// Walks down to the parent section, creating missing intermediates.
    fn descend_create<'a>(
        &'a mut self,
        key: &str,
    ) -> Result<(&'a mut Section<T>, String), RigError> {
        let segments = split_key(key)?;
        let (last, sections) = segments.split_last().expect("validated key is non-empty");
        let mut section = &mut self.base;
        for segment in sections {
            let node = section
                .entries
                .entry((*segment).to_string())
                .or_insert_with(|| Node::Section(Section::new()));
            section = match node {
                Node::Section(next) => next,
                Node::Leaf(_) => return Err(Self::section_conflict(key, segment)),
            };
        }
        Ok((section, (*last).to_string()))
    }

    /// Returns the leaf stored under `key`.
    pub fn get(&self, key: &str) -> Result<&T, RigError> {
        let (section, leaf) = self.descend(key)?;
        match section.entries.get(&leaf) {
            Some(Node::Leaf(value)) => Ok(value),
            _ => Err(Self::missing_key(key)),
        }
    }

    /// Returns a mutable reference to the leaf stored under `key`.
    pub fn get_mut(&mut self, key: &str) -> Result<&mut T, RigError> {
        let (section, leaf) = self.descend_mut(key)?;
        match section.entries.get_mut(&leaf) {
            Some(Node::Leaf(value)) => Ok(value),
            _ => Err(Self::missing_key(key)),
        }
    }

    /// Returns the section stored under `prefix`.
    pub fn section(&self, prefix: &str) -> Result<&Section<T>, RigError> {
        let (section, leaf) = self.descend(prefix)?;
        match section.entries.get(&leaf) {
            Some(Node::Section(sub)) => Ok(sub),
            _ => Err(Self::missing_key(prefix)),
        }
    }

    /// Stores `value` under `key`, creating intermediate sections.
    ///
    /// Storing a leaf where a section already exists (or descending through
    /// an existing leaf) is a [`RigError::MalformedKey`] conflict.
    pub fn set(&mut self, key: &str, value: T) -> Result<(), RigError> {
        let (section, leaf) = self.descend_create(key)?;
        match section.entries.entry(leaf) {
            Entry::Occupied(mut occupied) => match occupied.get_mut() {
                Node::Leaf(existing) => {
                    *existing = value;
                    Ok(())
                }
                Node::Section(_) => {
                    let conflict = occupied.key().clone();
                    Err(Self::section_conflict(key, &conflict))
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(Node::Leaf(value));
                Ok(())
            }
        }
    }

    /// Removes and returns the leaf stored under `key`.
    pub fn remove(&mut self, key: &str) -> Result<T, RigError> {
        let (section, leaf) = self.descend_mut(key)?;
        if !matches!(section.entries.get(&leaf), Some(Node::Leaf(_))) {
            return Err(Self::missing_key(key));
        }
        match section.entries.shift_remove(&leaf) {
            Some(Node::Leaf(value)) => Ok(value),
            _ => unreachable!("checked leaf entry"),
        }
    }

    /// True when a leaf exists under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_ok()
    }

    /// Lazy depth-first pre-order iterator over full dotted leaf paths, in
    /// section insertion order. Each call starts a fresh traversal.
    pub fn keys(&self) -> Keys<'_, T> {
        Keys {
            stack: vec![(self.base.entries.iter(), String::new())],
        }
    }

    /// Number of stored leaves.
    pub fn len(&self) -> usize {
        self.keys().count()
    }

    /// True when no leaves are stored.
    pub fn is_empty(&self) -> bool {
        self.keys().next().is_none()
    }

    /// Returns the stored value, or stores and returns `default`.
    pub fn get_or_set(&mut self, key: &str, default: T) -> Result<&T, RigError> {
        if !self.contains(key) {
            self.set(key, default)?;
        }
        self.get(key)
    }
}

impl<T: Clone> HierarchicalMapping<T> {
    /// Copies in every key of `other` not already present; existing values
    /// take precedence.
    pub fn merge(&mut self, other: &HierarchicalMapping<T>) -> Result<(), RigError> {
        for key in other.keys() {
            if !self.contains(&key) {
                let value = other.get(&key)?.clone();
                self.set(&key, value)?;
            }
        }
        Ok(())
    }
}

impl<T> Default for HierarchicalMapping<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator state for [`HierarchicalMapping::keys`].
pub struct Keys<'a, T> {
    stack: Vec<(indexmap::map::Iter<'a, String, Node<T>>, String)>,
}

impl<T> Iterator for Keys<'_, T> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while let Some((mut iter, prefix)) = self.stack.pop() {
            if let Some((key, node)) = iter.next() {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}{SECTION_SEPARATOR}{key}")
                };
                self.stack.push((iter, prefix));
                match node {
                    Node::Leaf(_) => return Some(path),
                    Node::Section(section) => self.stack.push((section.entries.iter(), path)),
                }
            }
        }
        None
    }
}
