//! Tab classification
//!
//! Every tab and every group carries one of three kinds, and the kind on a
//! group must equal the space collection the group is stored in.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabKind {
    /// Ordinary tab in the main strip
    Primary,
    /// Pinned tab, kept at the top of the space
    Pinned,
    /// Favorite tab, shared bookmark-like slot
    Favorite,
}

impl TabKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TabKind::Primary => "primary",
            TabKind::Pinned => "pinned",
            TabKind::Favorite => "favorite",
        }
    }
}

impl std::fmt::Display for TabKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TabKind {
    type Err = crate::TabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "primary" => Ok(TabKind::Primary),
            "pinned" => Ok(TabKind::Pinned),
            "favorite" => Ok(TabKind::Favorite),
            other => Err(crate::TabError::UnknownKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_roundtrip() {
        for kind in [TabKind::Primary, TabKind::Pinned, TabKind::Favorite] {
            assert_eq!(TabKind::from_str(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(TabKind::from_str("archived").is_err());
    }
}
