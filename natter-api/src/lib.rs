use chrono::Utc;

pub use uuid::Uuid;
pub type Time = chrono::DateTime<Utc>;

mod auth;
pub use auth::{AuthToken, LoginRequest, LoginResponse};

mod comment;
pub use comment::{Comment, CommentId, NewComment, PostId, RawComment, UpvoteToggle, TEMP_ID_PREFIX};

mod error;
pub use error::{Error, ErrorKind};

mod remote;
pub use remote::RemoteApi;

mod user;
pub use user::{Author, AuthorId, RawAuthor};
