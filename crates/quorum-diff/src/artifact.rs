//! Source artifacts under comparison
//!
//! A [`SourceArtifact`] is one producer's rendering of a task. It is created
//! by the caller and never mutated by the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which producer an artifact came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ArtifactLabel {
    /// First producer
    A,
    /// Second producer
    B,
}

impl ArtifactLabel {
    /// Label as a short string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactLabel::A => "A",
            ArtifactLabel::B => "B",
        }
    }
}

impl fmt::Display for ArtifactLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labeled piece of source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceArtifact {
    label: ArtifactLabel,
    path: Option<String>,
    content: String,
}

impl SourceArtifact {
    /// Create artifact with label and content
    #[inline]
    #[must_use]
    pub fn new(label: ArtifactLabel, content: impl Into<String>) -> Self {
        Self {
            label,
            path: None,
            content: content.into(),
        }
    }

    /// Create artifact for producer A
    #[inline]
    #[must_use]
    pub fn a(content: impl Into<String>) -> Self {
        Self::new(ArtifactLabel::A, content)
    }

    /// Create artifact for producer B
    #[inline]
    #[must_use]
    pub fn b(content: impl Into<String>) -> Self {
        Self::new(ArtifactLabel::B, content)
    }

    /// With originating path (informational only, never read)
    #[inline]
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Producer label
    #[inline]
    #[must_use]
    pub fn label(&self) -> ArtifactLabel {
        self.label
    }

    /// Originating path, if the caller supplied one
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Source text
    #[inline]
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// True when the text holds nothing but whitespace
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Blake3 hex digest of the content
    #[must_use]
    pub fn digest(&self) -> String {
        blake3::hash(self.content.as_bytes()).to_hex().to_string()
    }

    /// Reference recorded in reports
    #[must_use]
    pub fn reference(&self) -> ArtifactRef {
        ArtifactRef {
            label: self.label,
            path: self.path.clone(),
            digest: self.digest(),
        }
    }
}

/// Identifies an artifact inside a report without carrying its text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Producer label
    pub label: ArtifactLabel,
    /// Originating path, if known
    pub path: Option<String>,
    /// Blake3 hex digest of the content
    pub digest: String,
}

impl ArtifactRef {
    /// First 16 hex chars of the digest
    #[inline]
    #[must_use]
    pub fn short_digest(&self) -> &str {
        self.digest.get(..16).unwrap_or(&self.digest)
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}:{}@{}", self.label, path, self.short_digest()),
            None => write!(f, "{}@{}", self.label, self.short_digest()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection() {
        assert!(SourceArtifact::a("").is_blank());
        assert!(SourceArtifact::a("  \n\t\n").is_blank());
        assert!(!SourceArtifact::a("pass").is_blank());
    }

    #[test]
    fn digest_is_content_addressed() {
        let a = SourceArtifact::a("def f(): pass");
        let b = SourceArtifact::b("def f(): pass").with_path("b.py");
        let c = SourceArtifact::b("def g(): pass");

        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
        assert_eq!(a.digest().len(), 64);
    }

    #[test]
    fn reference_display() {
        let artifact = SourceArtifact::b("x = 1").with_path("render_b.py");
        let reference = artifact.reference();

        assert_eq!(reference.label, ArtifactLabel::B);
        assert_eq!(reference.short_digest().len(), 16);
        assert!(reference.to_string().starts_with("B:render_b.py@"));
    }

    #[test]
    fn label_serializes_as_letter() {
        let json = serde_json::to_string(&ArtifactLabel::A).unwrap();
        assert_eq!(json, "\"A\"");
    }
}
