// IdeaService - board operations over the document store
// Listing aggregates per-idea vote/comment counts; votes are unique per (idea, voter)

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    error::{AppError, AppResult},
    infrastructure::{
        document_store::{Collection, DocumentFilter, DocumentOrder, DocumentStore},
        persistence::{create_document, get_documents},
        serialization::decode_doc,
    },
    models::{
        Comment, Idea, IdeaDetail, IdeaSort, IdeaSummary, NewComment, NewIdea, NewVote, Period,
        Vote, VoteRecord,
    },
};

const IDEA_NOT_FOUND: &str = "Idea not found";
const ALREADY_VOTED: &str = "Already voted";

/// Lower bound on `created_at` for a listing window, or `None` for all time.
pub fn get_time_filter(period: Option<Period>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    period.map(|period| now - Duration::days(period.days()))
}

/// Prefix `https://` to links without an http(s) scheme. Empty links are left alone.
pub fn normalize_link(link: Option<String>) -> Option<String> {
    link.map(|link| {
        if link.is_empty() || link.starts_with("http://") || link.starts_with("https://") {
            link
        } else {
            format!("https://{}", link)
        }
    })
}

/// The explicit voter when one was given, otherwise the caller's address.
pub fn resolve_voter(voter: Option<String>, client_addr: Option<String>) -> Option<String> {
    voter
        .filter(|voter| !voter.is_empty())
        .or(client_addr.filter(|addr| !addr.is_empty()))
}

/// Stable descending sort; equal counts keep listing order.
pub fn sort_summaries(summaries: &mut [IdeaSummary], sort: IdeaSort) {
    match sort {
        IdeaSort::Votes => summaries.sort_by(|a, b| b.votes.cmp(&a.votes)),
        IdeaSort::Comments => summaries.sort_by(|a, b| b.comments.cmp(&a.comments)),
    }
}

#[derive(Clone)]
pub struct IdeaService {
    store: Arc<dyn DocumentStore>,
}

impl IdeaService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub async fn list_ideas(
        &self,
        period: Option<Period>,
        sort: IdeaSort,
    ) -> AppResult<Vec<IdeaSummary>> {
        let since = get_time_filter(period, Utc::now());
        let ideas = get_documents(self.store.as_ref(), Collection::Idea).await?;

        let mut summaries = Vec::with_capacity(ideas.len());
        for doc in ideas {
            let idea: Idea = decode_doc(doc)?;
            let filter = DocumentFilter::new()
                .field_eq("idea_id", idea.id.as_str())
                .created_since(since);

            let votes = self.store.count(Collection::Vote, &filter).await?;
            let comments = self.store.count(Collection::Comment, &filter).await?;
            summaries.push(IdeaSummary {
                idea,
                votes,
                comments,
            });
        }

        sort_summaries(&mut summaries, sort);
        Ok(summaries)
    }

    pub async fn get_idea(&self, idea_id: &str) -> AppResult<IdeaDetail> {
        let idea = self.require_idea(idea_id).await?;
        let filter = DocumentFilter::new().field_eq("idea_id", idea_id);

        let comments_list = self
            .store
            .find(Collection::Comment, &filter, DocumentOrder::NewestFirst)
            .await?
            .into_iter()
            .map(decode_doc::<Comment>)
            .collect::<AppResult<Vec<_>>>()?;
        let votes = self.store.count(Collection::Vote, &filter).await?;

        Ok(IdeaDetail {
            idea,
            comments_list,
            votes,
        })
    }

    pub async fn create_idea(&self, mut payload: NewIdea) -> AppResult<Idea> {
        payload.link = normalize_link(payload.link);

        let id = create_document(self.store.as_ref(), Collection::Idea, &payload).await?;
        info!("Created idea {} ({})", id, payload.title);
        self.fetch(Collection::Idea, &id).await
    }

    pub async fn add_comment(&self, payload: NewComment) -> AppResult<Comment> {
        self.require_idea(&payload.idea_id).await?;

        let id = create_document(self.store.as_ref(), Collection::Comment, &payload).await?;
        info!("Added comment {} on idea {}", id, payload.idea_id);
        self.fetch(Collection::Comment, &id).await
    }

    /// Record one vote. The pre-insert lookup is a fast path only; the store's
    /// (idea_id, voter) unique index settles concurrent duplicates.
    pub async fn add_vote(&self, payload: NewVote, client_addr: Option<String>) -> AppResult<Vote> {
        self.require_idea(&payload.idea_id).await?;

        let voter = resolve_voter(payload.voter, client_addr)
            .ok_or_else(|| AppError::BadRequest("Missing voter identity".to_string()))?;

        let existing = DocumentFilter::new()
            .field_eq("idea_id", payload.idea_id.as_str())
            .field_eq("voter", voter.as_str());
        if self.store.find_one(Collection::Vote, &existing).await?.is_some() {
            warn!("Duplicate vote by {} on idea {}", voter, payload.idea_id);
            return Err(AppError::Conflict(ALREADY_VOTED.to_string()));
        }

        let record = VoteRecord {
            idea_id: &payload.idea_id,
            voter: &voter,
        };
        let id = match create_document(self.store.as_ref(), Collection::Vote, &record).await {
            Ok(id) => id,
            Err(AppError::UniqueViolation(_)) => {
                warn!("Concurrent duplicate vote by {} on idea {}", voter, payload.idea_id);
                return Err(AppError::Conflict(ALREADY_VOTED.to_string()));
            }
            Err(e) => return Err(e),
        };

        info!("Recorded vote {} on idea {}", id, payload.idea_id);
        self.fetch(Collection::Vote, &id).await
    }

    async fn require_idea(&self, idea_id: &str) -> AppResult<Idea> {
        match self.store.find_by_id(Collection::Idea, idea_id).await? {
            Some(doc) => decode_doc(doc),
            None => Err(AppError::NotFound(IDEA_NOT_FOUND.to_string())),
        }
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        collection: Collection,
        id: &str,
    ) -> AppResult<T> {
        match self.store.find_by_id(collection, id).await? {
            Some(doc) => decode_doc(doc),
            None => Err(AppError::Internal(format!(
                "{} {} vanished after insert",
                collection, id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::document_store::StoredDocument;
    use crate::infrastructure::sqlite_document_store::SqliteDocumentStore;
    use async_trait::async_trait;
    use serde_json::{json, Map, Value};

    async fn service() -> IdeaService {
        let store = SqliteDocumentStore::new_in_memory().await.unwrap();
        store
            .ensure_unique_index(Collection::Vote, &["idea_id", "voter"])
            .await
            .unwrap();
        IdeaService::new(Arc::new(store))
    }

    fn new_idea(title: &str) -> NewIdea {
        NewIdea {
            title: title.to_string(),
            description: format!("{} description", title),
            author: None,
            link: None,
            tags: vec![],
        }
    }

    fn summary(id: &str, votes: u64, comments: u64) -> IdeaSummary {
        IdeaSummary {
            idea: Idea {
                id: id.to_string(),
                title: id.to_string(),
                description: String::new(),
                author: None,
                link: None,
                tags: vec![],
                created_at: Utc::now(),
            },
            votes,
            comments,
        }
    }

    #[test]
    fn test_normalize_link() {
        assert_eq!(
            normalize_link(Some("example.com/x".into())).as_deref(),
            Some("https://example.com/x")
        );
        assert_eq!(
            normalize_link(Some("http://example.com".into())).as_deref(),
            Some("http://example.com")
        );
        assert_eq!(
            normalize_link(Some("https://example.com".into())).as_deref(),
            Some("https://example.com")
        );
        assert_eq!(normalize_link(Some(String::new())).as_deref(), Some(""));
        assert_eq!(normalize_link(None), None);
    }

    #[test]
    fn test_time_filter() {
        let now = Utc::now();
        assert_eq!(get_time_filter(Some(Period::Week), now), Some(now - Duration::days(7)));
        assert_eq!(get_time_filter(Some(Period::Month), now), Some(now - Duration::days(30)));
        assert_eq!(get_time_filter(None, now), None);
    }

    #[test]
    fn test_resolve_voter() {
        assert_eq!(
            resolve_voter(Some("alice".into()), Some("10.0.0.1".into())).as_deref(),
            Some("alice")
        );
        assert_eq!(
            resolve_voter(Some(String::new()), Some("10.0.0.1".into())).as_deref(),
            Some("10.0.0.1")
        );
        assert_eq!(resolve_voter(None, None), None);
    }

    #[test]
    fn test_sort_is_stable_and_descending() {
        let mut summaries = vec![summary("a", 1, 5), summary("b", 3, 0), summary("c", 3, 2)];

        sort_summaries(&mut summaries, IdeaSort::Votes);
        let ids: Vec<&str> = summaries.iter().map(|s| s.idea.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);

        sort_summaries(&mut summaries, IdeaSort::Comments);
        let ids: Vec<&str> = summaries.iter().map(|s| s.idea.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[tokio::test]
    async fn test_create_idea_normalizes_link() {
        let service = service().await;
        let mut payload = new_idea("Linked");
        payload.link = Some("example.org".into());
        payload.tags = vec!["Tools".into()];

        let idea = service.create_idea(payload).await.unwrap();
        assert_eq!(idea.link.as_deref(), Some("https://example.org"));
        assert_eq!(idea.tags, vec!["Tools"]);
        assert!(!idea.id.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_vote_conflicts() {
        let service = service().await;
        let idea = service.create_idea(new_idea("Votable")).await.unwrap();

        let vote = NewVote {
            idea_id: idea.id.clone(),
            voter: Some("alice".into()),
        };
        let first = service.add_vote(vote.clone(), None).await.unwrap();
        assert_eq!(first.voter, "alice");

        let err = service.add_vote(vote, None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let detail = service.get_idea(&idea.id).await.unwrap();
        assert_eq!(detail.votes, 1);
    }

    #[tokio::test]
    async fn test_store_constraint_rejects_raced_vote() {
        let service = service().await;
        let idea = service.create_idea(new_idea("Raced")).await.unwrap();

        // A vote that slipped in after the existence check would have run
        service
            .store()
            .insert(
                Collection::Vote,
                json!({"idea_id": idea.id, "voter": "bob"})
                    .as_object()
                    .cloned()
                    .unwrap(),
                Utc::now(),
            )
            .await
            .unwrap();

        let record = VoteRecord {
            idea_id: &idea.id,
            voter: "bob",
        };
        let err = create_document(service.store().as_ref(), Collection::Vote, &record)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UniqueViolation(_)));
    }

    // Delegates to SQLite but never sees an existing vote, as when two requests race
    struct StaleReadStore(SqliteDocumentStore);

    #[async_trait]
    impl DocumentStore for StaleReadStore {
        async fn insert(
            &self,
            collection: Collection,
            fields: Map<String, Value>,
            created_at: DateTime<Utc>,
        ) -> AppResult<String> {
            self.0.insert(collection, fields, created_at).await
        }
        async fn find_by_id(
            &self,
            collection: Collection,
            id: &str,
        ) -> AppResult<Option<StoredDocument>> {
            self.0.find_by_id(collection, id).await
        }
        async fn find(
            &self,
            collection: Collection,
            filter: &DocumentFilter,
            order: DocumentOrder,
        ) -> AppResult<Vec<StoredDocument>> {
            self.0.find(collection, filter, order).await
        }
        async fn find_one(
            &self,
            _: Collection,
            _: &DocumentFilter,
        ) -> AppResult<Option<StoredDocument>> {
            Ok(None)
        }
        async fn count(&self, collection: Collection, filter: &DocumentFilter) -> AppResult<u64> {
            self.0.count(collection, filter).await
        }
        async fn ensure_unique_index(
            &self,
            collection: Collection,
            fields: &[&str],
        ) -> AppResult<()> {
            self.0.ensure_unique_index(collection, fields).await
        }
        async fn ping(&self) -> AppResult<()> {
            self.0.ping().await
        }
        async fn list_collections(&self) -> AppResult<Vec<String>> {
            self.0.list_collections().await
        }
        fn database_name(&self) -> &str {
            self.0.database_name()
        }
    }

    #[tokio::test]
    async fn test_add_vote_maps_constraint_violation_to_conflict() {
        let sqlite = SqliteDocumentStore::new_in_memory().await.unwrap();
        sqlite
            .ensure_unique_index(Collection::Vote, &["idea_id", "voter"])
            .await
            .unwrap();
        let service = IdeaService::new(Arc::new(StaleReadStore(sqlite)));
        let idea = service.create_idea(new_idea("Contested")).await.unwrap();

        let vote = NewVote {
            idea_id: idea.id.clone(),
            voter: Some("carol".into()),
        };
        service.add_vote(vote.clone(), None).await.unwrap();

        let err = service.add_vote(vote, None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref msg) if msg == "Already voted"));
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);

        let votes = service
            .store()
            .count(
                Collection::Vote,
                &DocumentFilter::new().field_eq("idea_id", idea.id.as_str()),
            )
            .await
            .unwrap();
        assert_eq!(votes, 1);
    }

    #[tokio::test]
    async fn test_vote_falls_back_to_client_address() {
        let service = service().await;
        let idea = service.create_idea(new_idea("Anonymous")).await.unwrap();

        let vote = service
            .add_vote(
                NewVote {
                    idea_id: idea.id.clone(),
                    voter: None,
                },
                Some("192.0.2.7".into()),
            )
            .await
            .unwrap();
        assert_eq!(vote.voter, "192.0.2.7");

        let err = service
            .add_vote(
                NewVote {
                    idea_id: idea.id,
                    voter: None,
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_unknown_idea_is_not_found() {
        let service = service().await;

        let err = service
            .add_comment(NewComment {
                idea_id: "nope".into(),
                author: None,
                content: "hello".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service
            .add_vote(
                NewVote {
                    idea_id: "nope".into(),
                    voter: Some("alice".into()),
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let filter = DocumentFilter::new();
        assert_eq!(service.store().count(Collection::Comment, &filter).await.unwrap(), 0);
        assert_eq!(service.store().count(Collection::Vote, &filter).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_applies_time_window() {
        let service = service().await;
        let idea = service.create_idea(new_idea("Windowed")).await.unwrap();
        let now = Utc::now();

        for (voter, age_days) in [("fresh", 1), ("recent", 20), ("old", 45)] {
            service
                .store()
                .insert(
                    Collection::Vote,
                    json!({"idea_id": idea.id, "voter": voter})
                        .as_object()
                        .cloned()
                        .unwrap(),
                    now - Duration::days(age_days),
                )
                .await
                .unwrap();
        }
        service
            .store()
            .insert(
                Collection::Comment,
                json!({"idea_id": idea.id, "content": "stale"})
                    .as_object()
                    .cloned()
                    .unwrap(),
                now - Duration::days(10),
            )
            .await
            .unwrap();

        let all = service.list_ideas(None, IdeaSort::Votes).await.unwrap();
        assert_eq!((all[0].votes, all[0].comments), (3, 1));

        let month = service.list_ideas(Some(Period::Month), IdeaSort::Votes).await.unwrap();
        assert_eq!((month[0].votes, month[0].comments), (2, 1));

        let week = service.list_ideas(Some(Period::Week), IdeaSort::Votes).await.unwrap();
        assert_eq!((week[0].votes, week[0].comments), (1, 0));

        // The detail view is never windowed
        assert_eq!(service.get_idea(&idea.id).await.unwrap().votes, 3);
    }

    #[tokio::test]
    async fn test_detail_lists_comments_newest_first() {
        let service = service().await;
        let idea = service.create_idea(new_idea("Discussed")).await.unwrap();
        let now = Utc::now();

        for (content, age_minutes) in [("oldest", 30), ("newest", 1), ("middle", 10)] {
            service
                .store()
                .insert(
                    Collection::Comment,
                    json!({"idea_id": idea.id, "content": content})
                        .as_object()
                        .cloned()
                        .unwrap(),
                    now - Duration::minutes(age_minutes),
                )
                .await
                .unwrap();
        }

        let detail = service.get_idea(&idea.id).await.unwrap();
        let contents: Vec<&str> = detail.comments_list.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["newest", "middle", "oldest"]);
        assert!(matches!(
            service.get_idea("missing").await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
