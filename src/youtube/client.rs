use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header::CONTENT_LENGTH, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::domain::{CommentPage, VideoPage};

use super::{
    auth::AuthProvider,
    error::ApiError,
    types::{ChannelResource, CommentThread, ErrorEnvelope, ListResponse, PlaylistItem},
    CommentSource, ModerationSink, ModerationStatus, MAX_COMMENT_RESULTS, MAX_PLAYLIST_RESULTS,
};

const COMMENTS_DISABLED: &str = "commentsDisabled";

#[derive(Clone)]
pub struct YoutubeClient {
    http: Client,
    api_base: String,
    auth: Arc<dyn AuthProvider>,
}

impl YoutubeClient {
    pub fn new(http: Client, api_base: &str, auth: Arc<dyn AuthProvider>) -> Result<Self, ApiError> {
        let api_base = api_base.trim_end_matches('/').to_string();
        Url::parse(&api_base)?;
        Ok(Self {
            http,
            api_base,
            auth,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!("{}/{}", self.api_base, path))?)
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let token = self.auth.obtain_token().await?;
        let response = request.bearer_auth(token.secret()).send().await?;
        check_status(response).await
    }

    async fn get_json<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let request = self.http.get(self.endpoint(path)?).query(query);
        let response = self.authorized(request).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(parse_error(status, &body))
}

fn parse_error(status: StatusCode, body: &str) -> ApiError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => ApiError::Status {
            status: status.as_u16(),
            reason: envelope
                .error
                .errors
                .into_iter()
                .find_map(|detail| detail.reason),
            message: envelope.error.message,
        },
        Err(_) => ApiError::Status {
            status: status.as_u16(),
            reason: None,
            message: body.chars().take(200).collect(),
        },
    }
}

#[async_trait]
impl CommentSource for YoutubeClient {
    async fn uploads_playlist(&self, channel_id: &str) -> Result<String, ApiError> {
        let response: ListResponse<ChannelResource> = self
            .get_json(
                "channels",
                &[("part", "contentDetails"), ("id", channel_id)],
            )
            .await?;
        response
            .items
            .into_iter()
            .next()
            .and_then(ChannelResource::uploads_playlist)
            .ok_or_else(|| ApiError::ChannelNotFound(channel_id.to_string()))
    }

    async fn playlist_videos(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<VideoPage, ApiError> {
        let max_results = MAX_PLAYLIST_RESULTS.to_string();
        let mut query = vec![
            ("part", "snippet"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }
        let response: ListResponse<PlaylistItem> = self.get_json("playlistItems", &query).await?;
        Ok(VideoPage {
            videos: response
                .items
                .into_iter()
                .filter_map(PlaylistItem::into_video)
                .collect(),
            next_page_token: response.next_page_token,
        })
    }

    async fn comment_threads(
        &self,
        video_id: &str,
        page_token: Option<&str>,
    ) -> Result<CommentPage, ApiError> {
        let max_results = MAX_COMMENT_RESULTS.to_string();
        let mut query = vec![
            ("part", "snippet"),
            ("videoId", video_id),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }
        let response: ListResponse<CommentThread> =
            match self.get_json("commentThreads", &query).await {
                Ok(response) => response,
                Err(err) if err.reason() == Some(COMMENTS_DISABLED) => {
                    return Err(ApiError::CommentsDisabled {
                        video_id: video_id.to_string(),
                    })
                }
                Err(err) => return Err(err),
            };
        Ok(CommentPage {
            comments: response
                .items
                .into_iter()
                .map(|thread| thread.into_comment(video_id))
                .collect(),
            next_page_token: response.next_page_token,
        })
    }
}

#[async_trait]
impl ModerationSink for YoutubeClient {
    async fn set_moderation_status(
        &self,
        ids: &[String],
        status: ModerationStatus,
    ) -> Result<(), ApiError> {
        let request = self.moderation_request(ids, status)?;
        self.authorized(request).await?;
        Ok(())
    }

    async fn delete_comment(&self, id: &str) -> Result<(), ApiError> {
        let request = self.delete_request(id)?;
        self.authorized(request).await?;
        Ok(())
    }
}

impl YoutubeClient {
    /// One call moderates the whole batch: ids are comma-joined into `id`.
    fn moderation_request(
        &self,
        ids: &[String],
        status: ModerationStatus,
    ) -> Result<RequestBuilder, ApiError> {
        let joined = ids.join(",");
        Ok(self
            .http
            .post(self.endpoint("comments/setModerationStatus")?)
            .query(&[("id", joined.as_str()), ("moderationStatus", status.as_str())])
            .header(CONTENT_LENGTH, 0))
    }

    fn delete_request(&self, id: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self
            .http
            .delete(self.endpoint("comments")?)
            .query(&[("id", id)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube::{auth::AccessToken, AuthError};

    struct NoAuth;

    #[async_trait]
    impl AuthProvider for NoAuth {
        async fn obtain_token(&self) -> Result<AccessToken, AuthError> {
            Err(AuthError::Prompt("not used".into()))
        }
    }

    #[test]
    fn extracts_reason_from_error_body() {
        let body = r#"{"error": {"code": 403, "message": "The video identified by the videoId parameter has disabled comments.",
            "errors": [{"message": "disabled", "domain": "youtube.commentThread", "reason": "commentsDisabled"}]}}"#;
        let err = parse_error(StatusCode::FORBIDDEN, body);
        assert_eq!(err.reason(), Some(COMMENTS_DISABLED));
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn keeps_raw_body_when_not_json() {
        let err = parse_error(StatusCode::BAD_GATEWAY, "upstream unavailable");
        match err {
            ApiError::Status {
                status,
                reason,
                message,
            } => {
                assert_eq!(status, 502);
                assert_eq!(reason, None);
                assert_eq!(message, "upstream unavailable");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn endpoints_join_onto_api_base() {
        let client =
            YoutubeClient::new(Client::new(), "http://localhost:9000/youtube/v3/", Arc::new(NoAuth))
                .unwrap();
        assert_eq!(
            client.endpoint("comments/setModerationStatus").unwrap().as_str(),
            "http://localhost:9000/youtube/v3/comments/setModerationStatus"
        );
        assert!(YoutubeClient::new(Client::new(), "not a url", Arc::new(NoAuth)).is_err());
    }

    fn client() -> YoutubeClient {
        YoutubeClient::new(
            Client::new(),
            "https://www.googleapis.com/youtube/v3",
            Arc::new(NoAuth),
        )
        .unwrap()
    }

    fn query(request: &reqwest::Request) -> Vec<(String, String)> {
        request.url().query_pairs().into_owned().collect()
    }

    #[test]
    fn moderation_batch_is_one_post_with_joined_ids() {
        let ids = vec!["c1".to_string(), "c2".to_string(), "c3".to_string()];
        let request = client()
            .moderation_request(&ids, ModerationStatus::Rejected)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().path(), "/youtube/v3/comments/setModerationStatus");
        assert_eq!(
            query(&request),
            vec![
                ("id".to_string(), "c1,c2,c3".to_string()),
                ("moderationStatus".to_string(), "rejected".to_string()),
            ]
        );
        assert_eq!(request.headers()[CONTENT_LENGTH], "0");

        let held = client()
            .moderation_request(&ids[..1], ModerationStatus::HeldForReview)
            .unwrap()
            .build()
            .unwrap();
        assert!(query(&held).contains(&("moderationStatus".into(), "heldForReview".into())));
    }

    #[test]
    fn delete_targets_a_single_comment() {
        let request = client().delete_request("c9").unwrap().build().unwrap();
        assert_eq!(request.method(), reqwest::Method::DELETE);
        assert_eq!(request.url().path(), "/youtube/v3/comments");
        assert_eq!(query(&request), vec![("id".to_string(), "c9".to_string())]);
    }
}
