use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use natter_api::{
    AuthorId, Comment, CommentId, Error, NewComment, PostId, RawAuthor, RawComment, RemoteApi,
    Time, UpvoteToggle,
};
use parking_lot::Mutex;
use tokio::sync::oneshot;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Endpoint {
    Fetch,
    Create,
    Toggle,
}

/// In-memory comment service for tests.
///
/// Requests can be made to fail (`fail_next`) or be held until the test
/// releases them (`hold_next`), which is how out-of-order completions are
/// reproduced.
pub struct MockServer(Mutex<ServerState>);

#[derive(Default)]
struct ServerState {
    users: HashMap<AuthorId, RawAuthor>,
    comments: Vec<StoredComment>,
    next_id: u64,
    clock: Option<Time>,
    failures: HashMap<Endpoint, usize>,
    holds: HashMap<Endpoint, VecDeque<oneshot::Receiver<()>>>,
    requests: HashMap<Endpoint, usize>,
}

#[derive(Debug)]
struct StoredComment {
    post_id: PostId,
    id: CommentId,
    parent_id: Option<CommentId>,
    text: String,
    created_at: Time,
    author_id: AuthorId,
    // votes from sessions the mock does not know about
    anonymous_upvotes: u32,
    upvoters: HashSet<AuthorId>,
}

impl StoredComment {
    fn upvote_count(&self) -> u32 {
        self.anonymous_upvotes + self.upvoters.len() as u32
    }
}

/// Releases a held request when `release` is called; dropping it instead makes
/// the request fail like a dropped connection
pub struct Gate(oneshot::Sender<()>);

impl Gate {
    pub fn release(self) {
        // the request may already have been abandoned, which is fine
        let _ = self.0.send(());
    }
}

impl MockServer {
    pub fn new() -> Arc<MockServer> {
        Arc::new(MockServer(Mutex::new(ServerState::default())))
    }

    pub fn add_user(&self, id: &str, name: &str) {
        self.0.lock().users.insert(
            AuthorId(id.to_string()),
            RawAuthor {
                id: Some(id.to_string()),
                name: Some(name.to_string()),
                avatar: Some(format!("https://avatars.example.org/{id}.png")),
            },
        );
    }

    /// Inserts an existing comment. `c.upvote_count` includes the votes of `upvoted_by`.
    pub fn seed(&self, post: &PostId, c: Comment, upvoted_by: &[&str]) {
        let upvoters = upvoted_by
            .iter()
            .map(|u| AuthorId(u.to_string()))
            .collect::<HashSet<_>>();
        self.0.lock().comments.push(StoredComment {
            post_id: post.clone(),
            id: c.id,
            parent_id: c.parent_id,
            text: c.text,
            created_at: c.created_at,
            author_id: c.author_id,
            anonymous_upvotes: c.upvote_count.saturating_sub(upvoters.len() as u32),
            upvoters,
        });
    }

    /// Pins the creation date of the next created comment; each creation then
    /// advances the clock by one minute
    pub fn set_clock(&self, t: Time) {
        self.0.lock().clock = Some(t);
    }

    pub fn fail_next(&self, endpoint: Endpoint) {
        *self.0.lock().failures.entry(endpoint).or_insert(0) += 1;
    }

    pub fn hold_next(&self, endpoint: Endpoint) -> Gate {
        let (send, recv) = oneshot::channel();
        self.0
            .lock()
            .holds
            .entry(endpoint)
            .or_insert_with(VecDeque::new)
            .push_back(recv);
        Gate(send)
    }

    pub fn request_count(&self, endpoint: Endpoint) -> usize {
        self.0.lock().requests.get(&endpoint).copied().unwrap_or(0)
    }

    pub fn upvote_count(&self, id: &CommentId) -> Option<u32> {
        let state = self.0.lock();
        state
            .comments
            .iter()
            .find(|c| c.id == *id)
            .map(|c| c.upvote_count())
    }

    pub fn comment_ids(&self, post: &PostId) -> Vec<CommentId> {
        let state = self.0.lock();
        state
            .comments
            .iter()
            .filter(|c| c.post_id == *post)
            .map(|c| c.id.clone())
            .collect()
    }

    /// Client acting as `user`, or anonymously with None
    pub fn client(self: &Arc<Self>, user: Option<&str>) -> MockClient {
        MockClient {
            server: self.clone(),
            user: user.map(|u| AuthorId(u.to_string())),
        }
    }

    async fn begin(&self, endpoint: Endpoint) -> Result<(), Error> {
        let hold = {
            let mut state = self.0.lock();
            *state.requests.entry(endpoint).or_insert(0) += 1;
            state.holds.get_mut(&endpoint).and_then(|h| h.pop_front())
        };
        if let Some(hold) = hold {
            hold.await
                .map_err(|_| Error::Network(String::from("connection reset by peer")))?;
        }
        let mut state = self.0.lock();
        if let Some(failures) = state.failures.get_mut(&endpoint) {
            if *failures > 0 {
                *failures -= 1;
                return Err(Error::Server {
                    status: 500,
                    message: String::from("injected failure"),
                });
            }
        }
        Ok(())
    }
}

impl ServerState {
    fn to_raw(&self, c: &StoredComment, viewer: &Option<AuthorId>) -> RawComment {
        RawComment {
            id: c.id.0.clone(),
            parent_id: c.parent_id.as_ref().map(|p| p.0.clone()),
            text: c.text.clone(),
            upvote_count: Some(c.upvote_count() as i64),
            created_at: c.created_at,
            author_id: Some(c.author_id.0.clone()),
            author: self.users.get(&c.author_id).cloned(),
            has_upvoted: viewer.as_ref().map_or(false, |v| c.upvoters.contains(v)),
        }
    }

    fn now(&mut self) -> Time {
        match &mut self.clock {
            Some(t) => {
                let now = *t;
                *t = now + Duration::minutes(1);
                now
            }
            None => Utc::now(),
        }
    }
}

pub struct MockClient {
    server: Arc<MockServer>,
    user: Option<AuthorId>,
}

impl MockClient {
    fn require_user(&self) -> Result<AuthorId, Error> {
        self.user.clone().ok_or(Error::Server {
            status: 401,
            message: String::from("authentication required"),
        })
    }
}

#[async_trait(?Send)]
impl RemoteApi for MockClient {
    async fn fetch_comments(&self, post: &PostId) -> Result<Vec<RawComment>, Error> {
        self.server.begin(Endpoint::Fetch).await?;
        let state = self.server.0.lock();
        Ok(state
            .comments
            .iter()
            .filter(|c| c.post_id == *post)
            .map(|c| state.to_raw(c, &self.user))
            .collect())
    }

    async fn create_comment(&self, new: &NewComment) -> Result<RawComment, Error> {
        self.server.begin(Endpoint::Create).await?;
        let user = self.require_user()?;
        if new.text.trim().is_empty() {
            return Err(Error::Server {
                status: 400,
                message: String::from("text is required"),
            });
        }
        let mut state = self.server.0.lock();
        if let Some(parent) = &new.parent_id {
            if !state
                .comments
                .iter()
                .any(|c| c.id == *parent && c.post_id == new.post_id)
            {
                return Err(Error::Server {
                    status: 404,
                    message: format!("parent comment {parent} not found"),
                });
            }
        }
        state.next_id += 1;
        let created_at = state.now();
        let stored = StoredComment {
            post_id: new.post_id.clone(),
            id: CommentId(format!("srv{:06}", state.next_id)),
            parent_id: new.parent_id.clone(),
            text: new.text.clone(),
            created_at,
            author_id: user,
            anonymous_upvotes: 0,
            upvoters: HashSet::new(),
        };
        let raw = state.to_raw(&stored, &self.user);
        state.comments.push(stored);
        Ok(raw)
    }

    async fn toggle_upvote(&self, id: &CommentId) -> Result<UpvoteToggle, Error> {
        self.server.begin(Endpoint::Toggle).await?;
        let user = self.require_user()?;
        let mut state = self.server.0.lock();
        let c = state
            .comments
            .iter_mut()
            .find(|c| c.id == *id)
            .ok_or_else(|| Error::Server {
                status: 404,
                message: format!("comment {id} not found"),
            })?;
        let has_upvoted = if c.upvoters.remove(&user) {
            false
        } else {
            c.upvoters.insert(user);
            true
        };
        Ok(UpvoteToggle {
            upvote_count: c.upvote_count() as i64,
            has_upvoted: Some(has_upvoted),
        })
    }
}
