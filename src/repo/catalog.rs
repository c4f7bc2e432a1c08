//! Table catalog view: what the store currently holds for the log table family.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::error::RepositoryError;

/// Physical kind of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// Routing root of a partitioned table (holds no rows itself)
    PartitionedRoot,
    /// Ordinary table, i.e. a physical partition
    Partition,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::PartitionedRoot => "partitioned table",
            TableKind::Partition => "table",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableKind {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "partitioned table" => Ok(TableKind::PartitionedRoot),
            "table" => Ok(TableKind::Partition),
            other => Err(RepositoryError::UnexpectedCatalog(format!(
                "unknown table kind '{other}'"
            ))),
        }
    }
}

/// One row of the catalog view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub kind: TableKind,
    pub owner: String,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, kind: TableKind, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            owner: owner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parses_catalog_labels() {
        assert_eq!(
            "partitioned table".parse::<TableKind>().unwrap(),
            TableKind::PartitionedRoot
        );
        assert_eq!("table".parse::<TableKind>().unwrap(), TableKind::Partition);
        assert!("view".parse::<TableKind>().is_err());
    }

    #[test]
    fn test_kind_display_matches_label() {
        for kind in [TableKind::PartitionedRoot, TableKind::Partition] {
            assert_eq!(kind.to_string().parse::<TableKind>().unwrap(), kind);
        }
    }
}
