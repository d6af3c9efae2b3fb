//! Generic labeled tree used to present results.

use std::cmp::Ordering;
use std::fmt;

use compact_str::CompactString;
use indexmap::IndexMap;
use serde::Serialize;

/// Ordered key/value labels attached to a node.
pub type Labels = IndexMap<CompactString, String>;

/// Renders one node as a single display line.
pub type FormatFn<V> = fn(&V, &Labels) -> String;

/// A node carrying a value, labels and a display callback.
#[derive(Clone, Serialize)]
pub struct LabeledTree<V> {
    value: V,
    labels: Labels,
    #[serde(skip)]
    format: FormatFn<V>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<LabeledTree<V>>,
}

impl<V> LabeledTree<V> {
    /// Create a childless node.
    pub fn new<K, S>(
        value: V,
        labels: impl IntoIterator<Item = (K, S)>,
        format: FormatFn<V>,
    ) -> Self
    where
        K: Into<CompactString>,
        S: Into<String>,
    {
        Self {
            value,
            labels: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            format,
            children: Vec::new(),
        }
    }

    /// Append already-built children.
    pub fn extend_children(&mut self, children: impl IntoIterator<Item = LabeledTree<V>>) {
        self.children.extend(children);
    }

    /// Value carried by this node.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// All labels, in insertion order.
    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Label value by key.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Direct children.
    pub fn children(&self) -> &[LabeledTree<V>] {
        &self.children
    }

    /// Number of nodes in this subtree, this one included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(LabeledTree::node_count).sum::<usize>()
    }

    /// This node's display line.
    pub fn line(&self) -> String {
        (self.format)(&self.value, &self.labels)
    }

    /// Sort children at every level.
    pub fn sort_by<F>(&mut self, compare: &mut F)
    where
        F: FnMut(&LabeledTree<V>, &LabeledTree<V>) -> Ordering,
    {
        self.children.sort_by(|a, b| compare(a, b));
        for child in &mut self.children {
            child.sort_by(compare);
        }
    }

    /// Indented outline, two spaces per level.
    ///
    /// `max_depth` limits how deep children are printed and `max_children`
    /// how many are printed per node; hidden siblings are summarised.
    pub fn render(&self, max_depth: Option<usize>, max_children: Option<usize>) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0, max_depth.unwrap_or(usize::MAX), max_children);
        out
    }

    fn render_into(
        &self,
        out: &mut String,
        depth: usize,
        max_depth: usize,
        max_children: Option<usize>,
    ) {
        let indent = "  ".repeat(depth);
        out.push_str(&indent);
        out.push_str(&self.line());
        out.push('\n');

        if depth >= max_depth {
            return;
        }

        let shown = max_children.unwrap_or(self.children.len());
        for child in self.children.iter().take(shown) {
            child.render_into(out, depth + 1, max_depth, max_children);
        }

        let remaining = self.children.len().saturating_sub(shown);
        if remaining > 0 {
            out.push_str(&format!("{indent}  ... and {remaining} more\n"));
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for LabeledTree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabeledTree")
            .field("value", &self.value)
            .field("labels", &self.labels)
            .field("children", &self.children)
            .finish()
    }
}

impl<V> fmt::Display for LabeledTree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(None, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(value: &u32, labels: &Labels) -> String {
        match labels.get("name") {
            Some(name) => format!("{name}={value}"),
            None => value.to_string(),
        }
    }

    fn node(value: u32, name: &str) -> LabeledTree<u32> {
        LabeledTree::new(value, [("name", name)], plain)
    }

    #[test]
    fn test_render_outline() {
        let mut top = node(3, "top");
        let mut mid = node(2, "mid");
        mid.extend_children([node(1, "leaf")]);
        top.extend_children([mid, node(0, "empty")]);

        assert_eq!(top.node_count(), 4);
        assert_eq!(top.label("name"), Some("top"));
        assert_eq!(top.render(None, None), "top=3\n  mid=2\n    leaf=1\n  empty=0\n");
        assert_eq!(top.render(Some(0), None), "top=3\n");
    }

    #[test]
    fn test_render_truncates_children() {
        let mut top = node(0, "top");
        top.extend_children((1..=4).map(|i| node(i, "c")));

        let rendered = top.render(None, Some(2));
        assert!(rendered.ends_with("  ... and 2 more\n"));
        assert_eq!(rendered.lines().count(), 4);
    }

    #[test]
    fn test_sort_recurses() {
        let mut top = node(0, "top");
        let mut inner = node(1, "inner");
        inner.extend_children([node(1, "a"), node(9, "b")]);
        top.extend_children([node(5, "x"), inner]);

        top.sort_by(&mut |a: &LabeledTree<u32>, b: &LabeledTree<u32>| b.value().cmp(a.value()));
        assert_eq!(*top.children()[0].value(), 5);
        assert_eq!(*top.children()[1].children()[0].value(), 9);
    }
}
