use crate::classify::Category;
use crate::tree::FileNode;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::AddAssign;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub file_count: u64,
    pub total_bytes: u64,
}

impl AddAssign for CategoryStats {
    fn add_assign(&mut self, rhs: Self) {
        self.file_count += rhs.file_count;
        self.total_bytes = self.total_bytes.saturating_add(rhs.total_bytes);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub by_category: BTreeMap<Category, CategoryStats>,
    pub total: CategoryStats,
}

impl Statistics {
    fn single(category: Category, size_bytes: u64) -> Self {
        let stats = CategoryStats {
            file_count: 1,
            total_bytes: size_bytes,
        };
        let mut by_category = BTreeMap::new();
        by_category.insert(category, stats);
        Statistics {
            by_category,
            total: stats,
        }
    }

    /// Combines two tallies. Addition per key, so the result does not depend
    /// on which subtree was visited first.
    pub fn merge(mut self, other: Statistics) -> Statistics {
        for (category, stats) in other.by_category {
            *self.by_category.entry(category).or_default() += stats;
        }
        self.total += other.total;
        self
    }

    /// Tally for one category; zero when nothing was counted.
    pub fn get(&self, category: Category) -> CategoryStats {
        self.by_category.get(&category).copied().unwrap_or_default()
    }

    pub fn file_count(&self) -> u64 {
        self.total.file_count
    }

    pub fn total_bytes(&self) -> u64 {
        self.total.total_bytes
    }
}

/// Post-order tally of every non-ignored file under `tree`. Directories add
/// nothing themselves.
pub fn aggregate(tree: &FileNode) -> Statistics {
    if !tree.is_directory {
        if tree.category == Category::Ignored {
            return Statistics::default();
        }
        return Statistics::single(tree.category, tree.size_bytes);
    }
    tree.children
        .iter()
        .map(aggregate)
        .fold(Statistics::default(), Statistics::merge)
}
