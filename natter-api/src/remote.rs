use async_trait::async_trait;

use crate::{CommentId, Error, NewComment, PostId, RawComment, UpvoteToggle};

/// The remote comment service, as seen by the client.
///
/// Implementations only carry requests and responses: authentication headers,
/// marshaling and transport errors are their business, and every failure must
/// come back as `Error::Network` or `Error::Server`.
#[async_trait(?Send)]
pub trait RemoteApi {
    /// `GET /comments?postId=…`
    async fn fetch_comments(&self, post: &PostId) -> Result<Vec<RawComment>, Error>;

    /// `POST /comments`
    async fn create_comment(&self, comment: &NewComment) -> Result<RawComment, Error>;

    /// `POST /comments/{id}/upvoteToggle`
    async fn toggle_upvote(&self, id: &CommentId) -> Result<UpvoteToggle, Error>;
}

#[async_trait(?Send)]
impl<T: RemoteApi + ?Sized> RemoteApi for &T {
    async fn fetch_comments(&self, post: &PostId) -> Result<Vec<RawComment>, Error> {
        (**self).fetch_comments(post).await
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<RawComment, Error> {
        (**self).create_comment(comment).await
    }

    async fn toggle_upvote(&self, id: &CommentId) -> Result<UpvoteToggle, Error> {
        (**self).toggle_upvote(id).await
    }
}
