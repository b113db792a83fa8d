//! Browse a large virtual hierarchy through a filter and a sort proxy.
//!
//! Run with: cargo run -p hugetree --example browse
//! Set `RUST_LOG=hugetree=trace` to watch cache and state events.

use hugetree::model::{
    FilterProxyModel, ItemHandle, ItemModel, ItemValue, ListModel, ModelTreeDebug, SearchOptions,
    SortProxyModel, SortSpec, StateTracker, TreeModel, TreePath, TreeStates, VirtualSource,
};
use hugetree::{Result, TreeFormatOptions};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // A flat list of two billion generated rows.
    let list = ListModel::new(VirtualSource::new(2_000_000_000, 1, |row, _| {
        ItemValue::from(format!("row {row}"))
    }));
    let middle = list.find_item(1_000_000_000, None, ItemHandle::invalid(), 0);
    println!(
        "rank 1e9 -> {} (rank {:?})",
        list.value(middle, 0),
        list.item_rank(middle, None)
    );

    // A small editable tree, sorted descending and then filtered.
    let tree: TreeModel<String> = TreeModel::new();
    for dir in ["src", "docs", "tests"] {
        if let Some(key) = tree.append(None, dir.to_string()) {
            for file in ["a.rs", "b.md", "c.rs"] {
                tree.append(Some(key), format!("{dir}/{file}"));
            }
        }
    }

    let sorted = SortProxyModel::with_master(Box::new(tree));
    sorted.sort(&SortSpec::by(0, true));
    let mut filtered = FilterProxyModel::with_master(Box::new(sorted));
    filtered.push_filter(0, |value: &ItemValue| !value.to_string().ends_with(".md"));

    let mut states = TreeStates::new();
    let first = filtered.child(filtered.root(), 0);
    states.expand(first, true);
    states.select_subtree(&filtered, first, true);

    let debug = ModelTreeDebug::with_options(TreeFormatOptions::default().with_max_depth(2));
    print!("{}", debug.format(&filtered, Some(&states)));
    println!("selected: {}", states.selected_items().len());

    let matcher = SearchOptions::new("docs/c").compile()?;
    let found = filtered.find_first(&matcher, None);
    if let Some(path) = TreePath::build(&filtered, found) {
        println!("{} is at {path}", filtered.value(found, 0));
    }
    Ok(())
}
