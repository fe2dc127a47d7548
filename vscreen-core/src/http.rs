//! HTTP client for the screening API

use crate::api::ScreeningApi;
use crate::artifact::Artifact;
use crate::config::ClientConfig;
use crate::error::{ScreeningError, ScreeningResult};
use crate::model::{Invite, InviteId, ResolvedToken, Tag, Token, UploadAck, Video, VideoId};
use crate::wire;
use async_trait::async_trait;
use reqwest::{multipart, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Serialize)]
struct CreateInviteRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct TagRequest {
    tag: Tag,
}

/// HTTP client for the screening API
///
/// # Example
///
/// ```rust,no_run
/// use vscreen_core::{ClientConfig, HttpScreeningClient, ScreeningApi};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpScreeningClient::new(ClientConfig::default())?;
/// let invite = client.create_invite("candidate@example.com").await?;
/// let invites = client.list_invites().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpScreeningClient {
    config: ClientConfig,
    client: Client,
}

impl HttpScreeningClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> ScreeningResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_root(), path)
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> ScreeningResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }
        Ok(response.json::<T>().await?)
    }
}

fn status_error(status: StatusCode) -> ScreeningError {
    ScreeningError::from_status(status.as_u16(), status.canonical_reason().unwrap_or(""))
}

#[async_trait]
impl ScreeningApi for HttpScreeningClient {
    async fn create_invite(&self, email: &str) -> ScreeningResult<Invite> {
        let response = self
            .client
            .post(self.url("/invites"))
            .json(&CreateInviteRequest { email })
            .send()
            .await?;

        let record: Value = self.handle_response(response).await?;
        wire::decode_invite(&record).ok_or_else(|| ScreeningError::Transport {
            status: None,
            message: "invite response has no usable identifier or token".to_string(),
        })
    }

    async fn list_invites(&self) -> ScreeningResult<Vec<Invite>> {
        let response = self.client.get(self.url("/invites")).send().await?;
        let records: Vec<Value> = self.handle_response(response).await?;
        Ok(wire::decode_invites(records))
    }

    async fn resolve_token(&self, token: &Token) -> ScreeningResult<ResolvedToken> {
        let url = self.url(&format!("/invites/{}", urlencoding::encode(token.as_str())));
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            debug!("Token {:?} rejected with {}", token, response.status());
            return Err(ScreeningError::InvalidToken);
        }

        // the body is informational; an empty or odd body still means "valid"
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body).unwrap_or_default())
    }

    async fn latest_video(&self, invite_id: &InviteId) -> ScreeningResult<Video> {
        let url = self.url(&format!(
            "/invites/{}/videos/latest",
            urlencoding::encode(invite_id.as_str())
        ));
        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    async fn list_videos(&self, invite_id: &InviteId) -> ScreeningResult<Vec<Video>> {
        let response = self
            .client
            .get(self.url("/videos"))
            .query(&[("inviteId", invite_id.as_str())])
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn upload(&self, token: &Token, artifact: &Artifact) -> ScreeningResult<VideoId> {
        let part = multipart::Part::stream_with_length(artifact.data().clone(), artifact.len() as u64)
            .file_name(artifact.file_name())
            .mime_str(artifact.content_type())?;
        let form = multipart::Form::new().part("file", part);

        let url = self.url(&format!("/upload/{}", urlencoding::encode(token.as_str())));
        info!(
            "Uploading {} ({} bytes) for token {:?}",
            artifact.file_name(),
            artifact.len(),
            token
        );
        let response = self.client.post(url).multipart(form).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                warn!("Upload rejected: token {:?} is not live", token);
                Err(ScreeningError::InvalidToken)
            }
            _ => {
                let ack: UploadAck = self.handle_response(response).await?;
                Ok(ack.video_id)
            }
        }
    }

    async fn get_video(&self, video_id: &VideoId) -> ScreeningResult<Video> {
        let url = self.url(&format!("/videos/{}", urlencoding::encode(video_id.as_str())));
        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    async fn set_tag(&self, video_id: &VideoId, tag: Tag) -> ScreeningResult<Video> {
        let url = self.url(&format!("/videos/{}/tag", urlencoding::encode(video_id.as_str())));
        let response = self
            .client
            .post(url)
            .json(&TagRequest { tag })
            .send()
            .await?;
        self.handle_response(response).await
    }

    fn stream_url(&self, video_id: &VideoId) -> String {
        self.url(&format!(
            "/videos/{}/stream",
            urlencoding::encode(video_id.as_str())
        ))
    }
}
