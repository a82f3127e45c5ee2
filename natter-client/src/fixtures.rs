use chrono::{Duration, TimeZone, Utc};

use crate::api::{Author, AuthorId, Comment, CommentId, Time};

pub fn at(minute: i64) -> Time {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute)
}

pub fn comment(id: &str, parent: Option<&str>, minute: i64, upvotes: u32) -> Comment {
    Comment {
        id: CommentId::from(id),
        parent_id: parent.map(CommentId::from),
        text: format!("text of {id}"),
        upvote_count: upvotes,
        created_at: at(minute),
        author_id: AuthorId(String::from("u-test")),
        author: Some(Author {
            id: AuthorId(String::from("u-test")),
            name: String::from("Tess"),
            avatar: None,
        }),
    }
}
