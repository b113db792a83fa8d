//! Human-readable dumps of model hierarchies.

use std::fmt::Write;

use hugetree_core::TreeFormatOptions;

use super::algorithms::is_expanded;
use super::handle::ItemHandle;
use super::traits::{ItemModel, StateFilter};

/// Debug utility for visualizing the visible part of a model.
///
/// ```
/// use hugetree::model::{ModelTreeDebug, TreeModel};
/// use hugetree_core::{TreeFormatOptions, TreeStyle};
///
/// let tree: TreeModel<String> = TreeModel::new();
/// let a = tree.append(None, "a".to_string()).unwrap();
/// tree.append(Some(a), "a1".to_string());
/// tree.append(None, "b".to_string());
///
/// let debug = ModelTreeDebug::with_options(
///     TreeFormatOptions::default().with_style(TreeStyle::Ascii),
/// );
/// assert_eq!(debug.format(&tree, None), "(root)\n+-- a\n|  `-- a1\n`-- b\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModelTreeDebug {
    options: TreeFormatOptions,
}

impl ModelTreeDebug {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Formats the whole visible hierarchy.
    pub fn format<M: ItemModel + ?Sized>(&self, model: &M, filter: Option<&dyn StateFilter>) -> String {
        self.format_subtree(model, model.root(), filter)
    }

    /// Formats the visible subtree below `item`.
    pub fn format_subtree<M: ItemModel + ?Sized>(
        &self,
        model: &M,
        item: ItemHandle,
        filter: Option<&dyn StateFilter>,
    ) -> String {
        let mut output = String::new();
        if item.is_invalid() {
            output.push_str("(invalid)\n");
            return output;
        }

        let mut stack = vec![Line::Item {
            item,
            lineage: Vec::new(),
        }];
        while let Some(line) = stack.pop() {
            let (item, lineage) = match line {
                Line::Item { item, lineage } => (item, lineage),
                Line::More { lineage, hidden } => {
                    output.push_str(&self.options.prefix(&lineage));
                    let _ = writeln!(output, "... ({hidden} more)");
                    continue;
                }
            };

            output.push_str(&self.options.prefix(&lineage));
            self.write_label(model, item, filter, &mut output);
            output.push('\n');

            let depth = lineage.len();
            if self.options.max_depth.is_some_and(|max| depth >= max) || !is_expanded(filter, item) {
                continue;
            }
            let count = model.child_count(item) as usize;
            let shown = self.options.max_children.map_or(count, |max| count.min(max));
            let below = |is_last: bool| {
                let mut next = lineage.clone();
                next.push(is_last);
                next
            };
            if shown < count {
                stack.push(Line::More {
                    lineage: below(true),
                    hidden: count - shown,
                });
            }
            for i in (0..shown).rev() {
                stack.push(Line::Item {
                    item: model.child(item, i as u32),
                    lineage: below(i + 1 == count),
                });
            }
        }
        output
    }

    fn write_label<M: ItemModel + ?Sized>(
        &self,
        model: &M,
        item: ItemHandle,
        filter: Option<&dyn StateFilter>,
        output: &mut String,
    ) {
        if item.is_root() {
            output.push_str("(root)");
        } else {
            match model.value(item, 0).to_string() {
                text if text.is_empty() => output.push_str("(empty)"),
                text => output.push_str(&text),
            }
        }
        if self.options.show_handles {
            let _ = write!(
                output,
                " [id={} row={} col={}]",
                item.id(),
                item.row(),
                item.column()
            );
        }
        if self.options.show_ranks
            && let Some(rank) = model.item_rank(item, filter)
        {
            let _ = write!(output, " #{rank}");
        }
    }
}

/// One pending output line; `lineage` records which ancestors were the
/// last child of their parent.
enum Line {
    Item { item: ItemHandle, lineage: Vec<bool> },
    More { lineage: Vec<bool>, hidden: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TreeStates;
    use crate::model::test_support::CountingTree;
    use hugetree_core::TreeStyle;

    fn sample() -> CountingTree {
        CountingTree::from_edges(&[(0, 1), (0, 2), (1, 3), (1, 4), (2, 5), (4, 6)])
    }

    fn ascii() -> TreeFormatOptions {
        TreeFormatOptions::default().with_style(TreeStyle::Ascii)
    }

    #[test]
    fn test_format_full_tree() {
        let tree = sample();
        let text = ModelTreeDebug::with_options(ascii()).format(&tree, None);
        let expected = "\
(root)
+-- item-1
|  +-- item-3
|  `-- item-4
|     `-- item-6
`-- item-2
   `-- item-5
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_collapsed_items_hide_children() {
        let tree = sample();
        let states = TreeStates::new();
        let text = ModelTreeDebug::with_options(ascii()).format(&tree, Some(&states));
        assert_eq!(text, "(root)\n+-- item-1\n`-- item-2\n");
    }

    #[test]
    fn test_limits() {
        let tree = sample();
        let options = ascii().with_max_depth(1).with_max_children(Some(1));
        let text = ModelTreeDebug::with_options(options).format(&tree, None);
        assert_eq!(text, "(root)\n+-- item-1\n`-- ... (1 more)\n");
    }

    #[test]
    fn test_detailed() {
        let tree = sample();
        let text = ModelTreeDebug::with_options(TreeFormatOptions::detailed().with_max_depth(1))
            .format_subtree(&tree, tree.item(2), None);
        assert_eq!(text, "item-2 [id=2 row=0 col=0] #5\n\u{2514}\u{2500}\u{2500} item-5 [id=5 row=0 col=0] #6\n");
    }

    #[test]
    fn test_invalid() {
        let tree = sample();
        assert_eq!(ModelTreeDebug::new().format_subtree(&tree, ItemHandle::invalid(), None), "(invalid)\n");
    }
}
