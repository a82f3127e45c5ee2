use std::{cell::RefCell, collections::HashSet};

use chrono::Utc;

use crate::{
    api::{Author, Comment, CommentId, Error, ErrorKind, NewComment, PostId, RemoteApi},
    build_tree,
    normalize::{clamp_count, normalize, Normalized},
    optimistic::optimistic,
    Session, Snapshot, SnapshotSlot, SortMode, TreeNode,
};

/// A recoverable failure to show to the user
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notice {
    pub kind: ErrorKind,
    pub message: &'static str,
    pub error: Error,
}

#[derive(Debug, Default)]
struct State {
    post_id: Option<PostId>,
    comments: Vec<Comment>,
    upvoted: HashSet<CommentId>,
    sort_mode: SortMode,
    loading: bool,

    // bumped by each fetch, so that responses to superseded fetches can be told apart
    fetch_seq: u64,
    pending_upvotes: HashSet<CommentId>,
    notices: Vec<Notice>,
}

impl State {
    fn comment_mut(&mut self, id: &CommentId) -> Option<&mut Comment> {
        self.comments.iter_mut().find(|c| c.id == *id)
    }

    fn set_upvoted(&mut self, id: &CommentId, upvoted: bool) {
        if upvoted {
            self.upvoted.insert(id.clone());
        } else {
            self.upvoted.remove(id);
        }
    }

    fn notify(&mut self, message: &'static str, error: Error) {
        self.notices.push(Notice {
            kind: error.kind(),
            message,
            error,
        });
    }

    /// Puts the server's copy of a created comment in the slot of its provisional entry.
    ///
    /// If a fetch replaced the list in the meantime, the comment is only added
    /// back when that list is still the one of `post`.
    fn commit_created(&mut self, post: &PostId, temp_id: &CommentId, created: Normalized) {
        let id = created.comment.id.clone();
        let temp = self.comments.iter().position(|c| c.id == *temp_id);
        if temp.is_none() && self.post_id.as_ref() != Some(post) {
            tracing::debug!(%post, %id, "created comment belongs to a post no longer shown");
            return;
        }
        self.set_upvoted(&id, created.has_upvoted);
        let existing = self.comments.iter().position(|c| c.id == id);
        match (temp, existing) {
            (Some(t), None) => self.comments[t] = created.comment,
            (Some(t), Some(e)) => {
                // a fetch already brought the server copy in
                self.comments[e] = created.comment;
                self.comments.remove(t);
            }
            (None, Some(e)) => self.comments[e] = created.comment,
            (None, None) => {
                // the provisional entry was dropped by a fetch that raced the creation
                self.comments.push(created.comment);
            }
        }
    }

    /// Whether `id` is still shown as part of the post a mutation started on.
    /// A store restored from a snapshot does not know its post until the first fetch.
    fn still_shows(&self, post: &Option<PostId>, id: &CommentId) -> bool {
        (post.is_none() || self.post_id == *post) && self.comments.iter().any(|c| c.id == *id)
    }
}

/// Owner of the comment list, the upvote membership set and the sort mode.
///
/// All mutations are async and only suspend on the remote call; state is kept
/// in a `RefCell` that is never borrowed across an await, so several mutations
/// can be in flight at once on a single-threaded executor.
pub struct CommentStore<A, S> {
    api: A,
    session: S,
    slot: Option<Box<dyn SnapshotSlot>>,
    state: RefCell<State>,
}

impl<A: RemoteApi, S: Session> CommentStore<A, S> {
    /// Empty store without persistence
    pub fn new(api: A, session: S) -> CommentStore<A, S> {
        CommentStore {
            api,
            session,
            slot: None,
            state: RefCell::new(State::default()),
        }
    }

    /// Restores the store from `slot`, which is then written after every committed change.
    /// An unreadable snapshot is logged and ignored.
    pub fn load(api: A, session: S, slot: impl SnapshotSlot + 'static) -> CommentStore<A, S> {
        let snapshot = match slot.read() {
            Ok(s) => s.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(%err, "ignoring unreadable comment snapshot");
                Snapshot::default()
            }
        };
        let state = State {
            upvoted: snapshot.upvoted_set(),
            comments: snapshot.comments,
            sort_mode: snapshot.sort_mode,
            ..State::default()
        };
        tracing::debug!(
            comments = state.comments.len(),
            upvoted = state.upvoted.len(),
            "restored comment snapshot"
        );
        CommentStore {
            api,
            session,
            slot: Some(Box::new(slot)),
            state: RefCell::new(state),
        }
    }

    pub fn save(&self) -> Result<(), Error> {
        let Some(slot) = &self.slot else {
            return Ok(());
        };
        let snapshot = {
            let st = self.state.borrow();
            Snapshot::capture(&st.comments, &st.upvoted, st.sort_mode)
        };
        slot.write(&snapshot)
    }

    fn autosave(&self) {
        if let Err(err) = self.save() {
            tracing::warn!(%err, "failed saving comment snapshot");
        }
    }

    /// Replaces the comment list and membership set with the server's view of `post`.
    ///
    /// On failure the previous state is kept. A response arriving after a newer
    /// fetch was started is discarded: the state is left to the newer fetch, and
    /// only the outcome of the request itself is returned.
    pub async fn fetch_for_post(&self, post: &PostId) -> Result<(), Error> {
        let seq = {
            let mut st = self.state.borrow_mut();
            st.fetch_seq += 1;
            st.loading = true;
            st.fetch_seq
        };
        let res = self.api.fetch_comments(post).await;

        let mut st = self.state.borrow_mut();
        if st.fetch_seq != seq {
            tracing::debug!(%post, ok = res.is_ok(), "discarding response to superseded fetch");
            return res.map(|_| ());
        }
        st.loading = false;
        match res {
            Ok(raw) => {
                let mut comments = Vec::with_capacity(raw.len());
                let mut upvoted = HashSet::new();
                for n in raw.into_iter().map(normalize) {
                    if n.has_upvoted {
                        upvoted.insert(n.comment.id.clone());
                    }
                    comments.push(n.comment);
                }
                tracing::debug!(%post, comments = comments.len(), "fetched comments");
                st.comments = comments;
                st.upvoted = upvoted;
                st.post_id = Some(post.clone());
                drop(st);
                self.autosave();
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%post, %err, "failed to load comments");
                st.notify("Failed to load comments", err.clone());
                Err(err)
            }
        }
    }

    /// Posts a comment, showing it immediately under a temporary id.
    ///
    /// Returns the id the server assigned. On failure the provisional entry is
    /// removed again.
    pub async fn add(&self, new: NewComment) -> Result<CommentId, Error> {
        let text = new.text.trim();
        if text.is_empty() {
            return Err(Error::EmptyText);
        }
        let request = NewComment {
            text: text.to_string(),
            ..new
        };

        let temp_id = {
            let st = self.state.borrow();
            loop {
                let id = CommentId::temporary();
                if !st.comments.iter().any(|c| c.id == id) {
                    break id;
                }
            }
        };
        let author = self.session.current_author().unwrap_or_else(|| {
            tracing::warn!("adding a comment without an authenticated session");
            Author::unknown()
        });
        let provisional = Comment {
            id: temp_id.clone(),
            parent_id: request.parent_id.clone(),
            text: request.text.clone(),
            upvote_count: 0,
            created_at: Utc::now(),
            author_id: author.id.clone(),
            author: Some(author),
        };

        let res = optimistic(
            &self.state,
            "add",
            |_| temp_id.clone(),
            |st| st.comments.push(provisional),
            self.api.create_comment(&request),
            |st, raw| {
                let created = normalize(raw);
                let id = created.comment.id.clone();
                st.commit_created(&request.post_id, &temp_id, created);
                id
            },
            |st, temp_id| st.comments.retain(|c| c.id != temp_id),
        )
        .await;

        match res {
            Ok(id) => {
                self.autosave();
                Ok(id)
            }
            Err(err) => {
                self.state
                    .borrow_mut()
                    .notify("Could not post your comment", err.clone());
                Err(err)
            }
        }
    }

    /// Toggles the current user's upvote on `id`: removes it if the membership
    /// set has it, adds it otherwise. The server's answer overrides the local guess.
    ///
    /// Only one toggle per comment may be in flight; overlapping calls are rejected.
    pub async fn upvote(&self, id: &CommentId) -> Result<(), Error> {
        let (post, was_upvoted) = {
            let st = self.state.borrow();
            if id.is_temporary() {
                return Err(Error::ProvisionalComment(id.clone()));
            }
            if !st.comments.iter().any(|c| c.id == *id) {
                return Err(Error::UnknownComment(id.clone()));
            }
            if st.pending_upvotes.contains(id) {
                return Err(Error::UpvoteInFlight(id.clone()));
            }
            (st.post_id.clone(), st.upvoted.contains(id))
        };

        let res = optimistic(
            &self.state,
            "upvote",
            |st| st.comments.iter().find(|c| c.id == *id).map(|c| c.upvote_count),
            |st| {
                st.pending_upvotes.insert(id.clone());
                st.set_upvoted(id, !was_upvoted);
                if let Some(c) = st.comment_mut(id) {
                    c.upvote_count = match was_upvoted {
                        true => c.upvote_count.saturating_sub(1),
                        false => c.upvote_count.saturating_add(1),
                    };
                }
            },
            self.api.toggle_upvote(id),
            |st, toggle| {
                st.pending_upvotes.remove(id);
                if !st.still_shows(&post, id) {
                    tracing::debug!(%id, "upvote answer for a comment no longer shown");
                    return;
                }
                st.set_upvoted(id, toggle.has_upvoted.unwrap_or(!was_upvoted));
                if let Some(c) = st.comment_mut(id) {
                    c.upvote_count = clamp_count(toggle.upvote_count);
                }
            },
            |st, count| {
                st.pending_upvotes.remove(id);
                if !st.still_shows(&post, id) {
                    return;
                }
                st.set_upvoted(id, was_upvoted);
                if let (Some(c), Some(count)) = (st.comment_mut(id), count) {
                    c.upvote_count = count;
                }
            },
        )
        .await;

        match res {
            Ok(()) => {
                self.autosave();
                Ok(())
            }
            Err(err) => {
                self.state
                    .borrow_mut()
                    .notify("Failed to upvote", err.clone());
                Err(err)
            }
        }
    }

    pub fn set_sort(&self, mode: SortMode) {
        self.state.borrow_mut().sort_mode = mode;
        self.autosave();
    }

    /// The comment forest under the current sort mode
    pub fn tree(&self) -> Vec<TreeNode> {
        let st = self.state.borrow();
        build_tree(&st.comments, Some(st.sort_mode))
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.state.borrow().comments.clone()
    }

    pub fn has_upvoted(&self, id: &CommentId) -> bool {
        self.state.borrow().upvoted.contains(id)
    }

    pub fn upvoted_ids(&self) -> HashSet<CommentId> {
        self.state.borrow().upvoted.clone()
    }

    pub fn is_upvote_pending(&self, id: &CommentId) -> bool {
        self.state.borrow().pending_upvotes.contains(id)
    }

    pub fn sort_mode(&self) -> SortMode {
        self.state.borrow().sort_mode
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Post of the last successful fetch
    pub fn post_id(&self) -> Option<PostId> {
        self.state.borrow().post_id.clone()
    }

    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.state.borrow_mut().notices)
    }
}
