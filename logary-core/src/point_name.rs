use std::fmt;

/// An ordered sequence of non-empty path segments naming a logger or a
/// message's origin, e.g. `["MyApp", "Db", "Query"]`.
///
/// Equality is elementwise; ordering is lexicographic by segment, which
/// makes `PointName` usable as a key in ordered maps (the internal logger
/// names used throughout the registry rely on this).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointName(Vec<String>);

impl PointName {
    /// Builds a `PointName` from an ordered list of segments.
    ///
    /// # Panics
    ///
    /// Panics if any segment is empty, or if no segments are given.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        assert!(!segments.is_empty(), "PointName must have at least one segment");
        assert!(
            segments.iter().all(|s| !s.is_empty()),
            "PointName segments must be non-empty"
        );
        PointName(segments)
    }

    /// Returns the segments making up this name.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns a new `PointName` with `child` appended as the final segment.
    pub fn join(&self, child: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(child.into());
        PointName(segments)
    }

    /// Renders the name as a dot-separated string, e.g. `"MyApp.Db.Query"`.
    pub fn as_dotted(&self) -> String {
        self.0.join(".")
    }
}

impl fmt::Display for PointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_dotted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_lexicographic() {
        let a = PointName::new(["app", "a"]);
        let b = PointName::new(["app", "b"]);
        assert!(a < b);
    }

    #[test]
    fn join_appends() {
        let base = PointName::new(["Logary"]);
        let child = base.join("Registry");
        assert_eq!(child.segments(), &["Logary".to_string(), "Registry".to_string()]);
        assert_eq!(child.as_dotted(), "Logary.Registry");
    }

    #[test]
    #[should_panic]
    fn rejects_empty_segment() {
        PointName::new(["app", ""]);
    }
}
