//! Positional retention: keep the first and the last table by name
//!
//! Names sort chronologically (see `partitions`), so the first name is the
//! base table and the last one is the newest partition. Everything in
//! between is dropped. Retention is purely positional: an empty or very old
//! table survives as long as it holds one of the two reserved positions.
use std::collections::BTreeSet;

use tracing::debug;

use super::catalog::{CatalogEntry, TableKind};

/// Outcome of planning a prune over one catalog snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrunePlan {
    /// Tables exempt from pruning (one member when first == last)
    pub reserved: BTreeSet<String>,
    /// Tables to drop, in ascending name order
    pub drop: Vec<String>,
}

/// Decide which tables to drop.
///
/// A partitioned root is never dropped, even outside the reserved positions,
/// since dropping it would take every partition with it.
pub fn plan_prune(entries: &[CatalogEntry]) -> PrunePlan {
    let mut sorted: Vec<&CatalogEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted.dedup_by(|a, b| a.name == b.name);

    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return PrunePlan::default();
    };

    let reserved: BTreeSet<String> = [first.name.clone(), last.name.clone()].into();

    let drop = sorted
        .iter()
        .filter(|entry| !reserved.contains(&entry.name))
        .filter(|entry| {
            if entry.kind == TableKind::PartitionedRoot {
                debug!(table = %entry.name, "Skipping partitioned root");
                return false;
            }
            true
        })
        .map(|entry| entry.name.clone())
        .collect();

    PrunePlan { reserved, drop }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(names: &[&str]) -> Vec<CatalogEntry> {
        names
            .iter()
            .map(|name| {
                let kind = if *name == "log" {
                    TableKind::PartitionedRoot
                } else {
                    TableKind::Partition
                };
                CatalogEntry::new(*name, kind, "postgres")
            })
            .collect()
    }

    #[test]
    fn test_drops_everything_between_base_and_newest() {
        let plan = plan_prune(&catalog(&["log", "log_202401010900", "log_202401011000"]));

        assert_eq!(plan.drop, vec!["log_202401010900"]);
        assert_eq!(
            plan.reserved,
            BTreeSet::from(["log".to_string(), "log_202401011000".to_string()])
        );
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let plan = plan_prune(&catalog(&[
            "log_202401011000",
            "log_202401010905",
            "log",
            "log_202401010900",
            "log_202312312359",
        ]));

        assert_eq!(
            plan.drop,
            vec!["log_202312312359", "log_202401010900", "log_202401010905"]
        );
        assert!(plan.reserved.contains("log_202401011000"));
    }

    #[test]
    fn test_base_table_only_is_a_no_op() {
        let plan = plan_prune(&catalog(&["log"]));

        assert!(plan.drop.is_empty());
        assert_eq!(plan.reserved, BTreeSet::from(["log".to_string()]));
    }

    #[test]
    fn test_base_and_one_partition_is_a_no_op() {
        let plan = plan_prune(&catalog(&["log", "log_202401011000"]));

        assert!(plan.drop.is_empty());
        assert_eq!(plan.reserved.len(), 2);
    }

    #[test]
    fn test_empty_catalog() {
        assert_eq!(plan_prune(&[]), PrunePlan::default());
    }

    #[test]
    fn test_never_drops_first_or_last() {
        let names: Vec<String> = (0..20).map(|i| format!("log_2024010109{i:02}")).collect();

        for len in 1..=names.len() {
            let mut entries = catalog(&["log"]);
            entries.extend(
                names[..len]
                    .iter()
                    .map(|n| CatalogEntry::new(n.as_str(), TableKind::Partition, "postgres")),
            );

            let plan = plan_prune(&entries);
            let newest = &names[len - 1];

            assert!(!plan.drop.iter().any(|t| t == "log"));
            assert!(!plan.drop.contains(newest));
            assert_eq!(plan.drop.len(), len - 1);
        }
    }

    #[test]
    fn test_second_plan_over_survivors_drops_nothing() {
        let first = plan_prune(&catalog(&[
            "log",
            "log_202401010900",
            "log_202401010901",
            "log_202401011000",
        ]));
        let survivors: Vec<String> = first.reserved.iter().cloned().collect();
        let survivors: Vec<&str> = survivors.iter().map(String::as_str).collect();

        let second = plan_prune(&catalog(&survivors));
        assert!(second.drop.is_empty());
    }

    #[test]
    fn test_partitioned_root_is_never_dropped() {
        let entries = vec![
            CatalogEntry::new("a_root", TableKind::Partition, "postgres"),
            CatalogEntry::new("log", TableKind::PartitionedRoot, "postgres"),
            CatalogEntry::new("log_202401011000", TableKind::Partition, "postgres"),
        ];

        let plan = plan_prune(&entries);
        assert!(plan.drop.is_empty());
    }
}
