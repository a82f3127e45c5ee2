use std::collections::HashMap;

use crate::{
    api::{Comment, CommentId},
    SortMode,
};

/// A comment with its replies. Built fresh from the flat list on every read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TreeNode {
    pub comment: Comment,

    /// Direct replies, in ascending creation order
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn find_in<'a>(nodes: &'a [TreeNode], id: &CommentId) -> Option<&'a TreeNode> {
        for n in nodes {
            if n.comment.id == *id {
                return Some(n);
            }
            if let Some(res) = TreeNode::find_in(&n.children, id) {
                return Some(res);
            }
        }
        None
    }

    /// Visits every node depth-first, in display order, along with its depth
    pub fn walk<'a, F>(nodes: &'a [TreeNode], f: &mut F)
    where
        F: FnMut(usize, &'a TreeNode),
    {
        fn walk_at<'a, F: FnMut(usize, &'a TreeNode)>(nodes: &'a [TreeNode], depth: usize, f: &mut F) {
            for n in nodes {
                f(depth, n);
                walk_at(&n.children, depth + 1, f);
            }
        }
        walk_at(nodes, 0, f)
    }

    /// Number of nodes in this subtree, including self
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(|c| c.subtree_len()).sum::<usize>()
    }
}

/// Turns the flat comment list into a forest.
///
/// Every comment appears exactly once: comments whose parent is missing from the
/// list become roots, and so do comments caught in a parent cycle. Each level is
/// ordered by ascending creation date (ties keep input order), then `sort`, if
/// any, reorders the roots.
pub fn build_tree(comments: &[Comment], sort: Option<SortMode>) -> Vec<TreeNode> {
    let mut index = HashMap::with_capacity(comments.len());
    for (i, c) in comments.iter().enumerate() {
        index.entry(&c.id).or_insert(i);
    }

    let mut children = vec![Vec::new(); comments.len()];
    let mut roots = Vec::new();
    for (i, c) in comments.iter().enumerate() {
        match c.parent_id.as_ref().map(|p| index.get(p)) {
            None => roots.push(i),
            Some(Some(&p)) if p != i => children[p].push(i),
            Some(_) => {
                tracing::debug!(id = %c.id, parent = ?c.parent_id, "orphan comment shown as top-level");
                roots.push(i);
            }
        }
    }

    let mut placed = vec![false; comments.len()];
    let mut forest = Vec::with_capacity(roots.len());
    for i in roots {
        forest.push(attach(comments, &children, &mut placed, i));
    }
    // Anything still unplaced hangs off a parent cycle, unreachable from any root
    for i in 0..comments.len() {
        if !placed[i] {
            tracing::warn!(id = %comments[i].id, "comment is part of a parent cycle, shown as top-level");
            forest.push(attach(comments, &children, &mut placed, i));
        }
    }

    sort_by_creation(&mut forest);
    if let Some(sort) = sort {
        sort.sort_roots(&mut forest);
    }
    forest
}

fn attach(comments: &[Comment], children: &[Vec<usize>], placed: &mut [bool], i: usize) -> TreeNode {
    placed[i] = true;
    let mut node = TreeNode {
        comment: comments[i].clone(),
        children: Vec::with_capacity(children[i].len()),
    };
    for &c in &children[i] {
        if !placed[c] {
            node.children.push(attach(comments, children, placed, c));
        }
    }
    node
}

fn sort_by_creation(nodes: &mut [TreeNode]) {
    nodes.sort_by_key(|n| n.comment.created_at);
    for n in nodes.iter_mut() {
        sort_by_creation(&mut n.children);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::comment;

    fn ids(nodes: &[TreeNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.comment.id.as_str()).collect()
    }

    #[test]
    fn cardinality_is_preserved() {
        bolero::check!()
            .with_type::<Vec<(u8, Option<u8>, u8, u8)>>()
            .cloned()
            .for_each(|entries| {
                // ids are taken modulo 16 so that duplicates, cycles and dangling
                // parents all show up
                let comments = entries
                    .iter()
                    .map(|(id, parent, minute, upvotes)| {
                        let id = format!("c{}", id % 16);
                        let parent = parent.map(|p| format!("c{}", p % 24));
                        comment(&id, parent.as_deref(), *minute as i64, *upvotes as u32)
                    })
                    .collect::<Vec<_>>();
                let mut expected = comments.iter().map(|c| c.id.clone()).collect::<Vec<_>>();
                expected.sort();
                for sort in [None, Some(SortMode::Top), Some(SortMode::New), Some(SortMode::MostReplies)] {
                    let forest = build_tree(&comments, sort);
                    let mut placed = Vec::new();
                    TreeNode::walk(&forest, &mut |_, n| placed.push(n.comment.id.clone()));
                    placed.sort();
                    assert_eq!(placed, expected);
                }
            });
    }

    #[test]
    fn dangling_and_null_parents_are_roots() {
        let comments = vec![
            comment("a", None, 0, 0),
            comment("b", Some("gone"), 1, 0),
            comment("c", Some("a"), 2, 0),
        ];
        let forest = build_tree(&comments, None);
        assert_eq!(ids(&forest), vec!["a", "b"]);
        assert_eq!(ids(&forest[0].children), vec!["c"]);
    }

    #[test]
    fn input_need_not_be_topological() {
        let comments = vec![
            comment("grandchild", Some("child"), 3, 0),
            comment("child", Some("root"), 2, 0),
            comment("root", None, 1, 0),
        ];
        let forest = build_tree(&comments, None);
        assert_eq!(ids(&forest), vec!["root"]);
        assert_eq!(ids(&forest[0].children), vec!["child"]);
        assert_eq!(ids(&forest[0].children[0].children), vec!["grandchild"]);
    }

    #[test]
    fn baseline_is_ascending_creation_at_every_depth() {
        let comments = vec![
            comment("r2", None, 20, 9),
            comment("r1", None, 10, 0),
            comment("r3", None, 10, 0),
            comment("c2", Some("r1"), 15, 0),
            comment("c1", Some("r1"), 12, 5),
            comment("c3", Some("r1"), 15, 0),
        ];
        let forest = build_tree(&comments, None);
        // r1 and r3 tie on creation date and keep input order
        assert_eq!(ids(&forest), vec!["r1", "r3", "r2"]);
        assert_eq!(ids(&forest[0].children), vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn top_orders_roots_by_upvotes() {
        let comments = vec![
            comment("a", None, 0, 1),
            comment("b", None, 1, 7),
            comment("c", None, 2, 1),
            comment("d", None, 3, 4),
        ];
        let forest = build_tree(&comments, Some(SortMode::Top));
        assert_eq!(ids(&forest), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn new_orders_roots_by_descending_creation_only() {
        let comments = vec![
            comment("a", None, 0, 0),
            comment("b", None, 5, 0),
            comment("c", None, 5, 0),
            comment("a2", Some("a"), 9, 0),
            comment("a1", Some("a"), 7, 0),
        ];
        let forest = build_tree(&comments, Some(SortMode::New));
        assert_eq!(ids(&forest), vec!["b", "c", "a"]);
        // replies stay in creation order
        assert_eq!(ids(&forest[2].children), vec!["a1", "a2"]);
    }

    #[test]
    fn most_replies_orders_roots_by_direct_children() {
        let comments = vec![
            comment("a", None, 0, 0),
            comment("b", None, 1, 0),
            comment("c", None, 2, 0),
            comment("b1", Some("b"), 3, 0),
            comment("b2", Some("b"), 4, 0),
            comment("c1", Some("c"), 5, 0),
            // grandchildren do not count
            comment("c1a", Some("c1"), 6, 0),
            comment("c1b", Some("c1"), 7, 0),
            comment("c1c", Some("c1"), 8, 0),
        ];
        let forest = build_tree(&comments, Some(SortMode::MostReplies));
        assert_eq!(ids(&forest), vec!["b", "c", "a"]);
    }

    #[test]
    fn most_replies_ties_keep_creation_order() {
        // y comes first in the input but was created after x
        let comments = vec![
            comment("y", None, 1, 0),
            comment("x", None, 0, 0),
            comment("z", None, 2, 0),
            comment("y1", Some("y"), 3, 0),
            comment("x1", Some("x"), 4, 0),
            comment("z1", Some("z"), 5, 0),
            comment("z2", Some("z"), 6, 0),
        ];
        let forest = build_tree(&comments, Some(SortMode::MostReplies));
        assert_eq!(ids(&forest), vec!["z", "x", "y"]);
    }

    #[test]
    fn top_sort_scenario() {
        let comments = vec![
            comment("a", None, 0, 2),
            comment("b", Some("a"), 1, 5),
            comment("c", Some("missing"), 2, 1),
        ];
        let forest = build_tree(&comments, Some(SortMode::Top));
        assert_eq!(ids(&forest), vec!["a", "c"]);
        assert_eq!(ids(&forest[0].children), vec!["b"]);
        assert!(forest[1].children.is_empty());
    }

    #[test]
    fn cycles_and_self_parents_are_not_lost() {
        let comments = vec![
            comment("x", Some("y"), 0, 0),
            comment("y", Some("x"), 1, 0),
            comment("z", Some("z"), 2, 0),
        ];
        let forest = build_tree(&comments, None);
        assert_eq!(ids(&forest), vec!["x", "z"]);
        assert_eq!(ids(&forest[0].children), vec!["y"]);
    }

    #[test]
    fn input_is_untouched() {
        let comments = vec![comment("b", None, 5, 0), comment("a", None, 0, 3)];
        let before = comments.clone();
        let _ = build_tree(&comments, Some(SortMode::Top));
        assert_eq!(comments, before);
    }

    #[test]
    fn find_and_walk() {
        let comments = vec![
            comment("a", None, 0, 0),
            comment("b", Some("a"), 1, 0),
            comment("c", Some("b"), 2, 0),
            comment("d", None, 3, 0),
        ];
        let forest = build_tree(&comments, None);
        assert_eq!(
            TreeNode::find_in(&forest, &CommentId::from("c")).map(|n| n.comment.text.as_str()),
            Some("text of c")
        );
        assert!(TreeNode::find_in(&forest, &CommentId::from("nope")).is_none());
        let mut visited = Vec::new();
        TreeNode::walk(&forest, &mut |depth, n| visited.push((depth, n.comment.id.as_str())));
        assert_eq!(visited, vec![(0, "a"), (1, "b"), (2, "c"), (0, "d")]);
    }
}
