//! Directory tree rendering from scanned paths.

use std::collections::BTreeMap;

#[derive(Default)]
struct Node {
    children: BTreeMap<String, Node>,
    /// Set when any path continues below this segment, even past `max_depth`
    dir: bool,
}

impl Node {
    fn is_dir(&self) -> bool {
        self.dir || !self.children.is_empty()
    }
}

/// Render repo-relative `paths` as a box-drawing tree, `max_depth` path
/// segments deep. Deeper segments are folded into their ancestor.
pub fn render_tree<'a>(root_name: &str, paths: impl IntoIterator<Item = &'a str>, max_depth: usize) -> String {
    let mut root = Node::default();
    for path in paths {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut node = &mut root;
        for (depth, segment) in segments.iter().enumerate().take(max_depth) {
            node = node.children.entry(segment.to_string()).or_default();
            if depth + 1 < segments.len() {
                node.dir = true;
            }
        }
    }

    let mut lines = vec![format!("{root_name}/")];
    walk_tree(&root, "", &mut lines);
    lines.join("\n")
}

fn walk_tree(node: &Node, prefix: &str, lines: &mut Vec<String>) {
    let mut entries: Vec<(&String, &Node)> = node.children.iter().collect();
    // Directories first, then files, each alphabetical.
    entries.sort_by(|a, b| b.1.is_dir().cmp(&a.1.is_dir()).then_with(|| a.0.cmp(b.0)));

    let total_entries = entries.len();
    for (idx, (name, child)) in entries.into_iter().enumerate() {
        let is_last = idx == total_entries - 1;
        let connector = if is_last { "└── " } else { "├── " };

        if child.is_dir() {
            lines.push(format!("{prefix}{connector}{name}/"));
            let extension = if is_last { "    " } else { "│   " };
            walk_tree(child, &format!("{prefix}{extension}"), lines);
        } else {
            lines.push(format!("{prefix}{connector}{name}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_tree_orders_dirs_before_files() {
        let tree = render_tree("demo", ["src/b.js", "index.js", "src/a.js", "lib/util.ts"], 3);
        let expected = "demo/
├── lib/
│   └── util.ts
├── src/
│   ├── a.js
│   └── b.js
└── index.js";
        similar_asserts::assert_eq!(tree, expected);
    }

    #[test]
    fn test_render_tree_limits_depth() {
        let tree = render_tree("demo", ["a/b/c/d/e.js"], 3);
        let expected = "demo/
└── a/
    └── b/
        └── c/";
        similar_asserts::assert_eq!(tree, expected);
    }

    #[test]
    fn test_render_tree_empty() {
        assert_eq!(render_tree("demo", std::iter::empty(), 3), "demo/");
    }
}
