//! Text rendering utilities for hierarchy paths, trees and error messages.
//!
//! Provides helpers to format container chains, type names,
//! and helpful suggestions in diagnostic output.

/// Separator placed between container names in a hierarchy path.
pub const PATH_SEPARATOR: &str = " → ";

/// Renders a chain of names as a readable path.
///
/// # Examples
/// ```
/// use arbor_support::rendering::render_chain;
///
/// let chain = vec!["Global", "Dungeon", "Floor1"];
/// assert_eq!(render_chain(&chain), "Global → Dungeon → Floor1");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(PATH_SEPARATOR)
}

/// Appends one segment to an already rendered path.
///
/// ```
/// use arbor_support::rendering::extend_path;
///
/// assert_eq!(extend_path("Global → Dungeon", "Floor1"), "Global → Dungeon → Floor1");
/// ```
pub fn extend_path(prefix: &str, segment: &str) -> String {
    let mut path = String::with_capacity(prefix.len() + PATH_SEPARATOR.len() + segment.len());
    path.push_str(prefix);
    path.push_str(PATH_SEPARATOR);
    path.push_str(segment);
    path
}

/// A node of a rendered hierarchy.
#[derive(Debug, Clone, Default)]
pub struct TreeNode {
    /// Text printed for this node
    pub label: String,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), children: Vec::new() }
    }

    pub fn with_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }
}

/// Renders a hierarchy as an indented tree.
///
/// ```text
/// Global
/// ├── MainMenu
/// └── Dungeon
///     ├── Floor1
///     └── Floor2
/// ```
pub fn render_tree(root: &TreeNode) -> String {
    let mut out = String::new();
    out.push_str(&root.label);
    out.push('\n');
    render_children(&root.children, "", &mut out);
    out
}

fn render_children(children: &[TreeNode], prefix: &str, out: &mut String) {
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        out.push_str(prefix);
        out.push_str(if last { "└── " } else { "├── " });
        out.push_str(&child.label);
        out.push('\n');

        let nested = format!("{prefix}{}", if last { "    " } else { "│   " });
        render_children(&child.children, &nested, out);
    }
}

/// Shortens a fully qualified type name for display.
///
/// ```
/// use arbor_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("my_game::scenes::dungeon::LootTable");
/// assert_eq!(short, "LootTable");
///
/// let short = shorten_type_name("alloc::sync::Arc<dyn my_game::audio::AudioManager>");
/// assert_eq!(short, "Arc<dyn AudioManager>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut current_segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                current_segment.clear();
            }
            '<' | '>' | ',' | ' ' => {
                result.push_str(&current_segment);
                result.push(ch);
                current_segment.clear();
            }
            _ => current_segment.push(ch),
        }
    }

    result.push_str(&current_segment);
    result
}

/// Generates "did you mean?" suggestions from the registered type names.
///
/// Substring matches rank above short-name matches, which rank above
/// a shared prefix of three or more characters.
pub fn suggest_similar(
    requested: &str,
    available: &[&str],
    max_suggestions: usize,
) -> Vec<String> {
    let requested_lower = requested.to_lowercase();
    let requested_short = shorten_type_name(requested).to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter(|&&name| name != requested)
        .filter_map(|&name| {
            let name_lower = name.to_lowercase();
            let name_short = shorten_type_name(name).to_lowercase();

            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((name, 100));
            }

            if name_short.contains(&requested_short) || requested_short.contains(&name_short) {
                return Some((name, 80));
            }

            let common = name_short
                .chars()
                .zip(requested_short.chars())
                .take_while(|(a, b)| a == b)
                .count();

            (common >= 3).then_some((name, common * 10))
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}
