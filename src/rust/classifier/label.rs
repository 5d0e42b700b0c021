use std::fmt;
use serde::{Deserialize, Serialize};

/// A department tag produced by the trained model, e.g. `"Transito"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepartmentLabel(String);

impl DepartmentLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DepartmentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DepartmentLabel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for DepartmentLabel {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for DepartmentLabel {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// The closed, versioned set of labels a loaded model can emit.
///
/// Label order is the model's own class order; score ties resolve toward
/// the earlier label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    version: Option<String>,
    labels: Vec<DepartmentLabel>,
}

impl Vocabulary {
    /// Builds a vocabulary, rejecting empty, blank or repeated labels.
    pub fn new<I, S>(version: Option<String>, labels: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen: Vec<DepartmentLabel> = Vec::new();
        for label in labels {
            let label = label.into();
            if label.trim().is_empty() {
                return Err("department labels cannot be empty".into());
            }
            let label = DepartmentLabel(label);
            if seen.contains(&label) {
                return Err(format!("duplicate department label '{}'", label));
            }
            seen.push(label);
        }
        if seen.is_empty() {
            return Err("model declares no department labels".into());
        }
        Ok(Self { version, labels: seen })
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DepartmentLabel> {
        self.labels.get(index)
    }

    pub fn contains(&self, label: &DepartmentLabel) -> bool {
        self.labels.contains(label)
    }

    /// Looks up a label by name, for callers filtering complaints by department.
    pub fn find(&self, name: &str) -> Option<&DepartmentLabel> {
        self.labels.iter().find(|label| label.as_str() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DepartmentLabel> {
        self.labels.iter()
    }
}
