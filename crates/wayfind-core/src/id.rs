use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for element IDs: fast comparisons, low memory.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A lightweight, interned identifier shared by nodes, corridors and
/// journey edges. Internally a `Spur` index: 4 bytes, Copy, Eq, Hash in O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(Spur);

impl ElementId {
    /// Intern a string as an ElementId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        ElementId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Deterministic journey-edge id for a consecutive `(from, to)` pair.
    pub fn edge_between(from: ElementId, to: ElementId) -> Self {
        Self::intern(&format!("{}-{}", from.as_str(), to.as_str()))
    }

    /// Smallest `"{prefix}{n}"` (n ≥ 1) for which `taken` returns false.
    pub fn first_free(prefix: &str, taken: impl Fn(&str) -> bool) -> Self {
        let mut n: u64 = 1;
        loop {
            let candidate = format!("{prefix}{n}");
            if !taken(&candidate) {
                return Self::intern(&candidate);
            }
            n += 1;
        }
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self::intern(s)
    }
}

impl Serialize for ElementId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ElementId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ElementId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = ElementId::intern("DP1");
        let b = ElementId::intern("DP1");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "DP1");
    }

    #[test]
    fn edge_id_joins_with_dash() {
        let id = ElementId::edge_between("E1".into(), "C1".into());
        assert_eq!(id.as_str(), "E1-C1");
    }

    #[test]
    fn first_free_skips_taken_numbers() {
        let taken = ["AD1", "AD2", "AD4"];
        let id = ElementId::first_free("AD", |s| taken.contains(&s));
        assert_eq!(id.as_str(), "AD3");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ElementId::intern("C7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"C7\"");
        let back: ElementId = serde_json::from_str("\"C7\"").unwrap();
        assert_eq!(back, id);
    }
}
