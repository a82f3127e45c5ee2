use async_trait::async_trait;
use natter_api::{
    AuthToken, CommentId, Error, LoginRequest, LoginResponse, NewComment, PostId, RawComment,
    RemoteApi, UpvoteToggle,
};
use reqwest::Method;
use serde::de::DeserializeOwned;

/// `RemoteApi` over HTTP, with bearer authentication when a token is known
pub struct HttpApi {
    client: reqwest::Client,
    host: String,
    token: Option<AuthToken>,
}

impl HttpApi {
    pub fn new(host: &str, token: Option<AuthToken>) -> HttpApi {
        HttpApi {
            client: reqwest::Client::new(),
            host: host.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let req = self.client.request(method, format!("{}{}", self.host, path));
        match &self.token {
            Some(tok) => req.bearer_auth(&tok.0),
            None => req,
        }
    }

    pub async fn login(&self, login: &LoginRequest) -> Result<LoginResponse, Error> {
        login.validate()?;
        let resp = self
            .request(Method::POST, "/auth/login")
            .json(login)
            .send()
            .await
            .map_err(network)?;
        parse(resp).await
    }
}

fn network(e: reqwest::Error) -> Error {
    Error::Network(e.to_string())
}

async fn parse<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status().as_u16();
    let body = resp.bytes().await.map_err(network)?;
    if !(200..300).contains(&status) {
        return Err(Error::from_response(status, &body));
    }
    serde_json::from_slice(&body).map_err(|e| Error::Server {
        status,
        message: format!("malformed response body: {e}"),
    })
}

#[async_trait(?Send)]
impl RemoteApi for HttpApi {
    async fn fetch_comments(&self, post: &PostId) -> Result<Vec<RawComment>, Error> {
        tracing::debug!(%post, "fetching comments");
        let resp = self
            .request(Method::GET, "/comments")
            .query(&[("postId", &post.0)])
            .send()
            .await
            .map_err(network)?;
        parse(resp).await
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<RawComment, Error> {
        let resp = self
            .request(Method::POST, "/comments")
            .json(comment)
            .send()
            .await
            .map_err(network)?;
        parse(resp).await
    }

    async fn toggle_upvote(&self, id: &CommentId) -> Result<UpvoteToggle, Error> {
        let resp = self
            .request(Method::POST, &format!("/comments/{id}/upvoteToggle"))
            .send()
            .await
            .map_err(network)?;
        parse(resp).await
    }
}
