use std::{cmp::Reverse, fmt, str::FromStr};

use crate::TreeNode;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortMode {
    #[default]
    Top,
    New,
    #[serde(alias = "replies")]
    MostReplies,
}

impl SortMode {
    pub const ALL: [SortMode; 3] = [SortMode::Top, SortMode::New, SortMode::MostReplies];

    /// Reorders top-level nodes only. Sorts are stable, so ties keep the
    /// ascending-creation order the nodes come in with.
    pub fn sort_roots(&self, roots: &mut [TreeNode]) {
        match self {
            SortMode::Top => roots.sort_by_key(|n| Reverse(n.comment.upvote_count)),
            SortMode::New => roots.sort_by_key(|n| Reverse(n.comment.created_at)),
            SortMode::MostReplies => roots.sort_by_key(|n| Reverse(n.children.len())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortMode::Top => "Top",
            SortMode::New => "New",
            SortMode::MostReplies => "Most Replies",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortMode::Top => "top",
            SortMode::New => "new",
            SortMode::MostReplies => "mostReplies",
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown sort mode {0:?}, expected one of top, new, most-replies")]
pub struct UnknownSortMode(String);

impl FromStr for SortMode {
    type Err = UnknownSortMode;

    fn from_str(s: &str) -> Result<SortMode, UnknownSortMode> {
        match s {
            "top" => Ok(SortMode::Top),
            "new" => Ok(SortMode::New),
            "mostReplies" | "most-replies" | "replies" => Ok(SortMode::MostReplies),
            _ => Err(UnknownSortMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_agree() {
        for m in SortMode::ALL {
            assert_eq!(m.to_string().parse::<SortMode>().unwrap(), m);
        }
        assert_eq!("most-replies".parse::<SortMode>().unwrap(), SortMode::MostReplies);
        assert!("hot".parse::<SortMode>().is_err());
    }

    #[test]
    fn serde_names() {
        assert_eq!(
            serde_json::to_string(&SortMode::MostReplies).unwrap(),
            r#""mostReplies""#
        );
        assert_eq!(
            serde_json::from_str::<SortMode>(r#""replies""#).unwrap(),
            SortMode::MostReplies
        );
        assert_eq!(SortMode::default(), SortMode::Top);
    }
}
