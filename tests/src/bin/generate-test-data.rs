//! Prints a random comment thread as a persisted snapshot, ready to be dropped
//! in a state directory as `natter-comments.json`

use std::collections::HashSet;

use anyhow::Context;
use chrono::{Duration, Utc};
use natter_api::{Author, AuthorId, Comment, CommentId, Uuid};
use natter_client::{build_tree, Snapshot, SortMode, TreeNode};
use rand::Rng;

const NUM_USERS: usize = 5;
const NUM_COMMENTS: usize = 60;

// chance for a comment to answer an earlier one
const REPLY_PROBABILITY: f64 = 0.6;
const UPVOTED_PROBABILITY: f64 = 0.2;
const MAX_UPVOTES: u32 = 40;

const MIN_WORDS: usize = 4;
const MAX_WORDS: usize = 40;

// comments are spread over this many minutes before now
const THREAD_SPAN_MINUTES: i64 = 60 * 24 * 90;

fn gen_author(i: usize) -> Author {
    let name = lipsum::lipsum_words(2);
    Author {
        id: AuthorId(format!("user-{i}")),
        name,
        avatar: None,
    }
}

fn main() -> anyhow::Result<()> {
    let mut rng = rand::thread_rng();

    let authors = (0..NUM_USERS).map(gen_author).collect::<Vec<_>>();

    // Sorted offsets, so that replies are always younger than what they answer
    let mut offsets = (0..NUM_COMMENTS)
        .map(|_| rng.gen_range(0..THREAD_SPAN_MINUTES))
        .collect::<Vec<_>>();
    offsets.sort_unstable_by(|a, b| b.cmp(a));
    let now = Utc::now();

    let mut comments: Vec<Comment> = Vec::with_capacity(NUM_COMMENTS);
    for minutes_ago in offsets {
        let parent_id = match !comments.is_empty() && rng.gen_bool(REPLY_PROBABILITY) {
            true => Some(comments[rng.gen_range(0..comments.len())].id.clone()),
            false => None,
        };
        let author = authors[rng.gen_range(0..authors.len())].clone();
        comments.push(Comment {
            id: CommentId(Uuid::new_v4().to_string()),
            parent_id,
            text: lipsum::lipsum_words(rng.gen_range(MIN_WORDS..=MAX_WORDS)),
            upvote_count: rng.gen_range(0..=MAX_UPVOTES),
            created_at: now - Duration::minutes(minutes_ago),
            author_id: author.id.clone(),
            author: Some(author),
        });
    }

    let upvoted = comments
        .iter()
        .filter(|c| c.upvote_count > 0 && rng.gen_bool(UPVOTED_PROBABILITY))
        .map(|c| c.id.clone())
        .collect::<HashSet<_>>();

    let tree = build_tree(&comments, None);
    let placed = tree.iter().map(TreeNode::subtree_len).sum::<usize>();
    anyhow::ensure!(
        placed == comments.len(),
        "generated thread lost comments: {placed} placed out of {}",
        comments.len()
    );

    let snapshot = Snapshot::capture(&comments, &upvoted, SortMode::default());
    let json = serde_json::to_string_pretty(&snapshot).context("serializing snapshot")?;
    println!("{json}");
    eprintln!(
        "generated {} comments in {} threads, {} upvoted",
        comments.len(),
        tree.len(),
        upvoted.len()
    );
    Ok(())
}
