use crate::ParseTree;
use display_tree::{AsTree, DisplayTree, Style};
use std::fmt::Formatter;

const EPSILON: &str = "ε";

impl DisplayTree for ParseTree {
    fn fmt(&self, f: &mut Formatter, style: Style) -> std::fmt::Result {
        let indentation = style.indentation as usize - 1;
        let horizontal_bar = format!("{:indentation$}", style.char_set.horizontal);

        writeln!(f, "{}", style.leaf_style.apply(self.symbol()))?;

        match self {
            ParseTree::Empty { .. } => write!(
                f,
                "{}",
                style.branch_style.apply(&format!(
                    "{}{horizontal_bar} {EPSILON}",
                    style.char_set.end_connector
                ))
            ),
            ParseTree::Leaf { terminal, .. } => write!(
                f,
                "{}",
                style.branch_style.apply(&format!(
                    "{}{horizontal_bar} '{}'",
                    style.char_set.end_connector,
                    terminal.escape_debug()
                ))
            ),
            ParseTree::Branch { left, right, .. } => {
                let lines = child_lines(style, &[&**left, &**right]);
                write!(f, "{}", lines.join("\n"))
            }
        }
    }
}

/// Hangs each child's rendering off a connector, the last one off an end connector.
fn child_lines(style: Style, children: &[&ParseTree]) -> Vec<String> {
    let indentation = style.indentation as usize - 1;
    let horizontal_bar = format!("{:indentation$}", style.char_set.horizontal);
    let spacer = " ".repeat(horizontal_bar.chars().count() + 1);
    let vertical = style
        .branch_style
        .apply(&style.char_set.vertical.to_string());
    let last = children.len().saturating_sub(1);

    let mut out = Vec::new();
    for (n, child) in children.iter().enumerate() {
        let (connector, continued) = if n < last {
            (style.char_set.connector, vertical.as_str())
        } else {
            (style.char_set.end_connector, " ")
        };
        let block = AsTree::with_style(*child, style).to_string();
        for (line_no, line) in block.lines().enumerate() {
            if line_no == 0 {
                let lead = style
                    .branch_style
                    .apply(&format!("{connector}{horizontal_bar} "));
                out.push(format!("{lead}{line}"));
            } else {
                out.push(format!("{continued}{spacer}{line}"));
            }
        }
    }
    out
}

/// Box-drawing rendering of a derivation, placeholders included.
pub fn render_tree_fancy(tree: &ParseTree) -> String {
    AsTree::new(tree).to_string()
}

#[cfg(test)]
mod test {
    use super::render_tree_fancy;
    use crate::{
        ParseTree,
        tree::test::{branch, leaf},
    };

    #[test]
    fn two_leaves() {
        let tree = branch("S", leaf("A", "a"), leaf("B", "b"));
        insta::assert_snapshot!(render_tree_fancy(&tree), @r"
        S
        ├─ A
        │  └─ 'a'
        └─ B
           └─ 'b'
        ");
    }

    #[test]
    fn nested_branches() {
        let tree = branch(
            "S0",
            leaf("T_0", "a"),
            branch("X_5_0", branch("S", leaf("T_0", "a"), leaf("T_1", "b")), leaf("T_1", "b")),
        );
        insta::assert_snapshot!(render_tree_fancy(&tree), @r"
        S0
        ├─ T_0
        │  └─ 'a'
        └─ X_5_0
           ├─ S
           │  ├─ T_0
           │  │  └─ 'a'
           │  └─ T_1
           │     └─ 'b'
           └─ T_1
              └─ 'b'
        ");
    }

    #[test]
    fn empty_derivation() {
        let tree = ParseTree::Empty {
            symbol: "S0".to_owned(),
        };
        insta::assert_snapshot!(render_tree_fancy(&tree), @r"
        S0
        └─ ε
        ");
    }
}
