use serde::Serialize;
use serde_json::Value;

use crate::tree::{ParseTree, is_auxiliary_terminal_symbol};

/// A drawing-oriented tree: a label and any number of children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub label: String,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(label: impl Into<String>) -> TreeNode {
        TreeNode {
            label: label.into(),
            children: Vec::new(),
        }
    }

    /// Reads a tree written as nested JSON arrays.
    ///
    /// A string is a leaf, an array is its head label followed by its children.
    /// Anything else is turned into a leaf labelled with its JSON text.
    pub fn normalize(value: &Value) -> TreeNode {
        match value {
            Value::String(s) => TreeNode::leaf(s.as_str()),
            Value::Array(items) => match items.split_first() {
                Some((head, rest)) => TreeNode {
                    label: label_of(head),
                    children: rest.iter().map(TreeNode::normalize).collect(),
                },
                None => TreeNode::leaf(""),
            },
            other => TreeNode::leaf(other.to_string()),
        }
    }

    /// Replaces every terminal placeholder with exactly one child by that child.
    pub fn collapse_auxiliary(self) -> TreeNode {
        let TreeNode { label, children } = self;
        let mut children: Vec<TreeNode> = children
            .into_iter()
            .map(TreeNode::collapse_auxiliary)
            .collect();
        if children.len() == 1 && is_auxiliary_terminal_symbol(&label) {
            if let Some(only) = children.pop() {
                return only;
            }
        }
        TreeNode { label, children }
    }

    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(TreeNode::depth).max().unwrap_or(0)
    }
}

fn label_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl From<&ParseTree> for TreeNode {
    fn from(tree: &ParseTree) -> Self {
        match tree {
            ParseTree::Empty { symbol } => TreeNode::leaf(symbol.as_str()),
            ParseTree::Leaf { symbol, terminal } => TreeNode {
                label: symbol.clone(),
                children: vec![TreeNode::leaf(terminal.as_str())],
            },
            ParseTree::Branch {
                symbol,
                left,
                right,
            } => TreeNode {
                label: symbol.clone(),
                children: vec![TreeNode::from(&**left), TreeNode::from(&**right)],
            },
        }
    }
}

/// Geometry used by [`layout_tree`], in scene units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutConfig {
    pub node_diameter: f64,
    /// Horizontal gap between neighbouring subtrees.
    pub sibling_spacing: f64,
    /// Vertical distance between the centers of two levels.
    pub level_spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            node_diameter: 56.0,
            sibling_spacing: 18.0,
            level_spacing: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
    pub label: String,
    /// Center of the node.
    pub x: f64,
    pub y: f64,
    pub depth: usize,
    pub parent: Option<usize>,
}

/// Node centers in pre-order, so a parent always comes before its children,
/// plus the `(parent, child)` index pairs to draw as edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeLayout {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<(usize, usize)>,
    pub width: f64,
    pub height: f64,
}

fn subtree_width(node: &TreeNode, config: &LayoutConfig) -> f64 {
    if node.children.is_empty() {
        return config.node_diameter;
    }
    children_width(&node.children, config).max(config.node_diameter)
}

fn children_width(children: &[TreeNode], config: &LayoutConfig) -> f64 {
    let widths: f64 = children.iter().map(|c| subtree_width(c, config)).sum();
    #[allow(clippy::cast_precision_loss)]
    let gaps = children.len().saturating_sub(1) as f64 * config.sibling_spacing;
    widths + gaps
}

/// Places every node of `root` so that each parent sits centered over its children.
///
/// Placeholders are collapsed first. Each subtree gets a horizontal slot as wide as
/// its children need, and never narrower than one node.
pub fn layout_tree(root: &TreeNode, config: &LayoutConfig) -> TreeLayout {
    let root = root.clone().collapse_auxiliary();
    let radius = config.node_diameter / 2.0;
    let width = subtree_width(&root, config);
    #[allow(clippy::cast_precision_loss)]
    let height = config.node_diameter + (root.depth() - 1) as f64 * config.level_spacing;

    let mut layout = TreeLayout {
        nodes: Vec::new(),
        edges: Vec::new(),
        width,
        height,
    };
    place(&root, width / 2.0, radius, 0, None, config, &mut layout);
    layout
}

fn place(
    node: &TreeNode,
    x: f64,
    y: f64,
    depth: usize,
    parent: Option<usize>,
    config: &LayoutConfig,
    layout: &mut TreeLayout,
) {
    let index = layout.nodes.len();
    layout.nodes.push(PositionedNode {
        label: node.label.clone(),
        x,
        y,
        depth,
        parent,
    });
    if let Some(parent) = parent {
        layout.edges.push((parent, index));
    }

    let mut left = x - children_width(&node.children, config) / 2.0;
    for child in &node.children {
        let w = subtree_width(child, config);
        place(
            child,
            left + w / 2.0,
            y + config.level_spacing,
            depth + 1,
            Some(index),
            config,
            layout,
        );
        left += w + config.sibling_spacing;
    }
}
