use serde_json::json;
use tracing::{debug, info};

use crate::{
    error::AppResult,
    infrastructure::{
        document_store::{Collection, DocumentFilter, DocumentStore},
        persistence::create_document,
    },
};

/// Fields covered by the one-vote-per-voter constraint.
pub const VOTE_UNIQUE_FIELDS: [&str; 2] = ["idea_id", "voter"];

/// (title, description, author, tags, link)
const SAMPLE_IDEAS: [(&str, &str, &str, [&str; 2], &str); 3] = [
    (
        "AI-Powered Code Reviewer",
        "An agent that reviews PRs and suggests fixes.",
        "Alex",
        ["AI", "DevTools"],
        "https://example.com/code-reviewer",
    ),
    (
        "Fitness Buddy Chat",
        "A chat app with a fitness coach agent.",
        "Sam",
        ["Health", "Chatbot"],
        "https://example.com/fitness-buddy",
    ),
    (
        "Travel Plan Optimizer",
        "Smart itinerary planning using constraints.",
        "Jamie",
        ["Travel", "Planner"],
        "https://example.com/travel-optimizer",
    ),
];

/// (sample idea index, author, content)
const SAMPLE_COMMENTS: [(usize, &str, &str); 3] = [
    (0, "Maya", "Love this!"),
    (0, "Ravi", "Would use at work."),
    (1, "Chris", "Nice concept."),
];

/// Votes per sample idea, cast by `user_0`, `user_1`, ...
const SAMPLE_VOTE_COUNTS: [usize; 3] = [5, 3, 8];

/// Startup initialization: seed an empty board, then make sure votes are unique per voter.
pub async fn initialize_store(store: &dyn DocumentStore) -> AppResult<()> {
    seed_data(store).await?;
    ensure_vote_index(store).await;
    Ok(())
}

/// Insert the sample board unless any idea already exists.
/// Returns whether anything was written.
pub async fn seed_data(store: &dyn DocumentStore) -> AppResult<bool> {
    let existing = store.count(Collection::Idea, &DocumentFilter::new()).await?;
    if existing > 0 {
        debug!("Found {} ideas, skipping seed data", existing);
        return Ok(false);
    }

    let mut idea_ids = Vec::with_capacity(SAMPLE_IDEAS.len());
    for (title, description, author, tags, link) in SAMPLE_IDEAS {
        let idea = json!({
            "title": title,
            "description": description,
            "author": author,
            "tags": tags,
            "link": link,
        });
        idea_ids.push(create_document(store, Collection::Idea, &idea).await?);
    }

    for (idea_index, author, content) in SAMPLE_COMMENTS {
        let comment = json!({
            "idea_id": idea_ids[idea_index],
            "author": author,
            "content": content,
        });
        create_document(store, Collection::Comment, &comment).await?;
    }

    for (idea_id, votes) in idea_ids.iter().zip(SAMPLE_VOTE_COUNTS) {
        for n in 0..votes {
            let vote = json!({ "idea_id": idea_id, "voter": format!("user_{}", n) });
            create_document(store, Collection::Vote, &vote).await?;
        }
    }

    info!(
        "Seeded {} ideas, {} comments and {} votes",
        idea_ids.len(),
        SAMPLE_COMMENTS.len(),
        SAMPLE_VOTE_COUNTS.iter().sum::<usize>()
    );
    Ok(true)
}

/// Create the (idea_id, voter) unique index. Failures are treated as "already exists".
pub async fn ensure_vote_index(store: &dyn DocumentStore) {
    if let Err(e) = store
        .ensure_unique_index(Collection::Vote, &VOTE_UNIQUE_FIELDS)
        .await
    {
        debug!("Vote uniqueness index not created: {}", e);
    }
}
