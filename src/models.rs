// Board entities, request payloads and response shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A submitted idea as stored on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub idea_id: String,
    #[serde(default)]
    pub author: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// One endorsement of an idea; (idea_id, voter) is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: String,
    pub idea_id: String,
    pub voter: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIdea {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub idea_id: String,
    #[serde(default)]
    pub author: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVote {
    pub idea_id: String,
    #[serde(default)]
    pub voter: Option<String>,
}

/// Vote record as written to the store, after the voter identity is resolved.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct VoteRecord<'a> {
    pub idea_id: &'a str,
    pub voter: &'a str,
}

/// Query string of `GET /api/ideas`. Unrecognized values are tolerated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdeaListQuery {
    pub period: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Week,
    Month,
}

impl Period {
    /// `week` or `month`; anything else means no time window.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw {
            Some("week") => Some(Period::Week),
            Some("month") => Some(Period::Month),
            _ => None,
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            Period::Week => 7,
            Period::Month => 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdeaSort {
    #[default]
    Votes,
    Comments,
}

impl IdeaSort {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("comments") => IdeaSort::Comments,
            _ => IdeaSort::Votes,
        }
    }
}

/// Listing entry: the idea plus its (possibly windowed) activity counts.
#[derive(Debug, Clone, Serialize)]
pub struct IdeaSummary {
    #[serde(flatten)]
    pub idea: Idea,
    pub votes: u64,
    pub comments: u64,
}

/// Single-idea view with every comment, newest first, and the all-time vote count.
#[derive(Debug, Clone, Serialize)]
pub struct IdeaDetail {
    #[serde(flatten)]
    pub idea: Idea,
    pub comments_list: Vec<Comment>,
    pub votes: u64,
}
