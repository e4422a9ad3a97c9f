//! Dotted paths into a template tree (`Resources.X.Properties.List.0.Key`).

use std::fmt;

/// One step of a [`NodePath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Path from the document root to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePath {
    segments: Vec<Segment>,
}

impl NodePath {
    /// Parse a dotted path. All-digit segments are list indices.
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| match s.parse::<usize>() {
                Ok(index) => Segment::Index(index),
                Err(_) => Segment::Key(s.to_string()),
            })
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Extend the path by one segment.
    pub fn join(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Split off the last segment.
    pub fn split_last(&self) -> Option<(NodePath, &Segment)> {
        let (last, parent) = self.segments.split_last()?;
        Some((Self { segments: parent.to_vec() }, last))
    }

    /// The first `len` segments.
    pub fn prefix(&self, len: usize) -> Self {
        Self { segments: self.segments.iter().take(len).cloned().collect() }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl From<&str> for NodePath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}
