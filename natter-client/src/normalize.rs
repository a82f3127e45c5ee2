use crate::api::{Author, AuthorId, Comment, CommentId, RawAuthor, RawComment};

/// A server comment converted to the canonical shape, along with the server's
/// "has the current user upvoted this" flag
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Normalized {
    pub comment: Comment,
    pub has_upvoted: bool,
}

/// The single conversion point from server payloads to `Comment`
pub fn normalize(raw: RawComment) -> Normalized {
    let parent_id = raw
        .parent_id
        .filter(|p| !p.is_empty())
        .map(CommentId);
    let upvote_count = clamp_count(raw.upvote_count.unwrap_or(0));
    let author_id = raw
        .author_id
        .filter(|a| !a.is_empty())
        .or_else(|| raw.author.as_ref().and_then(|a| a.id.clone()))
        .map(AuthorId)
        .unwrap_or_else(AuthorId::unknown);
    let author = raw.author.map(|a| normalize_author(a, &author_id));
    Normalized {
        comment: Comment {
            id: CommentId(raw.id),
            parent_id,
            text: raw.text,
            upvote_count,
            created_at: raw.created_at,
            author_id,
            author,
        },
        has_upvoted: raw.has_upvoted,
    }
}

pub fn normalize_author(raw: RawAuthor, fallback_id: &AuthorId) -> Author {
    Author {
        id: raw.id.map(AuthorId).unwrap_or_else(|| fallback_id.clone()),
        name: raw
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| String::from("Unknown")),
        avatar: raw.avatar.filter(|a| !a.is_empty()),
    }
}

pub(crate) fn clamp_count(count: i64) -> u32 {
    u32::try_from(count.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::at;

    fn raw(id: &str) -> RawComment {
        RawComment {
            id: id.to_string(),
            parent_id: None,
            text: String::from("hi"),
            upvote_count: Some(2),
            created_at: at(0),
            author_id: Some(String::from("u1")),
            author: Some(RawAuthor {
                id: Some(String::from("u1")),
                name: Some(String::from("Ada")),
                avatar: Some(String::from("https://example.org/ada.png")),
            }),
            has_upvoted: true,
        }
    }

    #[test]
    fn full_payload() {
        let n = normalize(raw("a"));
        assert!(n.has_upvoted);
        assert_eq!(n.comment.id, CommentId::from("a"));
        assert_eq!(n.comment.upvote_count, 2);
        assert_eq!(n.comment.author_id, AuthorId(String::from("u1")));
        let author = n.comment.author.unwrap();
        assert_eq!(author.name, "Ada");
        assert_eq!(author.avatar.as_deref(), Some("https://example.org/ada.png"));
    }

    #[test]
    fn empty_parent_is_top_level() {
        let mut r = raw("a");
        r.parent_id = Some(String::new());
        assert_eq!(normalize(r).comment.parent_id, None);

        let mut r = raw("b");
        r.parent_id = Some(String::from("a"));
        assert_eq!(normalize(r).comment.parent_id, Some(CommentId::from("a")));
    }

    #[test]
    fn counts_are_clamped() {
        let mut r = raw("a");
        r.upvote_count = Some(-3);
        assert_eq!(normalize(r).comment.upvote_count, 0);
        let mut r = raw("a");
        r.upvote_count = None;
        assert_eq!(normalize(r).comment.upvote_count, 0);
        assert_eq!(clamp_count(i64::MAX), u32::MAX);
    }

    #[test]
    fn author_fallbacks() {
        let mut r = raw("a");
        r.author_id = None;
        r.author = Some(RawAuthor {
            id: Some(String::from("u9")),
            name: None,
            avatar: Some(String::new()),
        });
        let c = normalize(r).comment;
        assert_eq!(c.author_id, AuthorId(String::from("u9")));
        let author = c.author.unwrap();
        assert_eq!(author.name, "Unknown");
        assert_eq!(author.avatar, None);

        let mut r = raw("b");
        r.author_id = None;
        r.author = None;
        let c = normalize(r).comment;
        assert_eq!(c.author_id, AuthorId::unknown());
        assert!(c.author.is_none());
    }
}
