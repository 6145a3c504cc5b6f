//! Block tables for template inheritance
//!
//! A table maps block names to bodies in declaration order. Merging is
//! left-biased and produces a new table: an incoming body replaces the base
//! body of the same name, with its `{{ super() }}` markers replaced by that
//! base body first.

use super::blocks::all_block_spans;
use super::helpers::replace_super;
use super::tokenize::tokenize;
use crate::template::whitespace::dedent;

/// A block body and the directory of the template that declared it
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Block {
    pub body: String,
    /// Relative references inside the body resolve from here
    pub dir: String,
}

/// Ordered block name → body mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct BlockTable {
    entries: Vec<(String, Block)>,
}

impl BlockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract the blocks of a template, nested ones included
    ///
    /// A nested block stays inside its parent's body as well, so an override
    /// of either name applies wherever the block is rendered. A name declared
    /// twice keeps its first position and its last body.
    pub fn extract(source: &str, dir: &str, dedent_bodies: bool) -> Self {
        let tokens = tokenize(source);
        let mut table = Self::new();
        for span in all_block_spans(&tokens) {
            let raw = &source[span.body];
            let body = if dedent_bodies {
                dedent(raw)
            } else {
                raw.to_string()
            };
            table.insert(
                span.name,
                Block {
                    body,
                    dir: dir.to_string(),
                },
            );
        }
        table
    }

    pub fn get(&self, name: &str) -> Option<&Block> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, block)| block)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or replace (a replaced entry keeps its position)
    pub fn insert(&mut self, name: String, block: Block) {
        match self.entries.iter_mut().find(|(entry, _)| *entry == name) {
            Some((_, existing)) => *existing = block,
            None => self.entries.push((name, block)),
        }
    }

    /// Overlay `other` onto this table, last wins, no `super()` resolution
    pub fn extend(&mut self, other: BlockTable) {
        for (name, block) in other.entries {
            self.insert(name, block);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Block)> {
        self.entries.iter().map(|(name, block)| (name.as_str(), block))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Merge `incoming` over `base`, resolving `super()` against `base`
pub(crate) fn merge_with_super(incoming: &BlockTable, base: &BlockTable) -> BlockTable {
    let mut merged = base.clone();
    for (name, block) in incoming.iter() {
        let parent_body = base.get(name).map(|b| b.body.as_str()).unwrap_or("");
        merged.insert(
            name.to_string(),
            Block {
                body: replace_super(&block.body, parent_body),
                dir: block.dir.clone(),
            },
        );
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &str)]) -> BlockTable {
        let mut table = BlockTable::new();
        for (name, body) in entries {
            table.insert(
                name.to_string(),
                Block {
                    body: body.to_string(),
                    dir: "/t".to_string(),
                },
            );
        }
        table
    }

    fn bodies(table: &BlockTable) -> Vec<(&str, &str)> {
        table.iter().map(|(n, b)| (n, b.body.as_str())).collect()
    }

    #[test]
    fn test_extract_top_level_blocks_dedented() {
        let source = "{% block head %}\n    Title\n{% endblock %}x{% block body %}B{% endblock body %}";
        let table = BlockTable::extract(source, "/t", true);
        assert_eq!(bodies(&table), vec![("head", "Title"), ("body", "B")]);
        assert_eq!(table.get("head").map(|b| b.dir.as_str()), Some("/t"));
    }

    #[test]
    fn test_extract_includes_nested_blocks() {
        let source = "{% block outer %}a{% block inner %}b{% endblock %}c{% endblock %}";
        let table = BlockTable::extract(source, "", false);
        assert_eq!(
            bodies(&table),
            vec![
                ("outer", "a{% block inner %}b{% endblock %}c"),
                ("inner", "b")
            ]
        );
    }

    #[test]
    fn test_extract_skips_unclosed_block() {
        let table = BlockTable::extract("{% block a %}never closed", "", true);
        assert!(table.is_empty());
    }

    #[test]
    fn test_merge_is_left_biased_and_resolves_super() {
        let base = table(&[("a", "PARENT"), ("b", "keep")]);
        let incoming = table(&[("a", "X{{ super() }}Y"), ("c", "[{{super()}}]")]);
        let merged = merge_with_super(&incoming, &base);
        assert_eq!(
            bodies(&merged),
            vec![("a", "XPARENTY"), ("b", "keep"), ("c", "[]")]
        );
        // Inputs untouched
        assert_eq!(bodies(&base), vec![("a", "PARENT"), ("b", "keep")]);
        assert_eq!(incoming.len(), 2);
    }

    #[test]
    fn test_extend_is_last_wins_without_super() {
        let mut collected = table(&[("a", "first")]);
        collected.extend(table(&[("a", "second {{ super() }}")]));
        assert_eq!(bodies(&collected), vec![("a", "second {{ super() }}")]);
        assert!(collected.contains("a"));
    }
}
