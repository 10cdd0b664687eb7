//! Breadcrumb path carried by every traversal branch

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered category labels from the catalogue root down to a listing
///
/// Labels are trimmed and non-empty, and no two adjacent labels are equal.
/// Both invariants are upheld by [`CategoryPath::extend`], the only way to
/// grow a path. Paths are plain owned values: cloning one for a child task
/// never shares state with the parent or with sibling branches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CategoryPath(Vec<String>);

impl CategoryPath {
    /// Creates an empty path
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the path with `label` appended
    ///
    /// The path is returned unchanged when the trimmed label is empty or
    /// equal to the current last segment, so a category page whose heading
    /// repeats its parent's does not duplicate the breadcrumb.
    ///
    /// ```
    /// use catalog_sweep::state::CategoryPath;
    ///
    /// let path = CategoryPath::new().extend("Tools").extend(" Tools ").extend("Drills");
    /// assert_eq!(path.render(" > "), "Tools > Drills");
    /// ```
    #[must_use]
    pub fn extend(mut self, label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || self.last() == Some(label) {
            return self;
        }
        self.0.push(label.to_string());
        self
    }

    /// Joins the segments with `delimiter`
    pub fn render(&self, delimiter: &str) -> String {
        self.0.join(delimiter)
    }

    /// Splits rendered text on `delimiter` and rebuilds the path through
    /// [`CategoryPath::extend`], dropping repeated segments
    pub fn parse(text: &str, delimiter: &str) -> Self {
        text.split(delimiter)
            .fold(Self::new(), |path, segment| path.extend(segment))
    }

    /// Last segment, if any
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for CategoryPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |path, label| path.extend(label.as_ref()))
    }
}

impl fmt::Display for CategoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(" > "))
    }
}

// Deserialization goes through `extend` so files written by hand or by older
// tools cannot smuggle in a path that breaks the invariants.
impl<'de> Deserialize<'de> for CategoryPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let labels = Vec::<String>::deserialize(deserializer)?;
        Ok(labels.into_iter().collect())
    }
}
