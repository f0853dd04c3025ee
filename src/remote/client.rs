// SPDX-License-Identifier: MPL-2.0

use crate::config::USER_AGENT;
use crate::feed::FeedError;
use crate::model::{Cursor, FeedPage, ItemId, ItemKind, LikeAck, ProfileId};
use crate::remote::FeedBackend;
use crate::remote::wire::{
    ErrorBody, ImpressionRequest, LikeRequest, LikeResponse, PageResponse, SaveRequest,
};
use crate::state::FeedSettings;
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// [`FeedBackend`] over the feed service's JSON API.
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: Url,
    auth_token: Option<String>,
    page_size: u32,
}

impl HttpBackend {
    pub fn new(settings: &FeedSettings) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FeedError::Network(e.to_string()))?;

        // A trailing slash makes `Url::join` append instead of replacing
        // the last path segment.
        let mut base = settings.service_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| FeedError::InvalidOperation(format!("invalid service url: {e}")))?;

        Ok(Self {
            http,
            base_url,
            auth_token: settings.auth_token.clone(),
            page_size: settings.page_size,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, FeedError> {
        self.base_url
            .join(path)
            .map_err(|e| FeedError::InvalidOperation(format!("invalid endpoint {path}: {e}")))
    }

    fn item_path(item: ItemId) -> String {
        match item.kind() {
            ItemKind::Publication => format!("publications/{}", item.raw()),
            ItemKind::Advertisement => format!("ads/{}", item.raw()),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, FeedError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or(body);
        Err(error_for_status(status, message))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, FeedError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| FeedError::InvalidResponse(e.to_string()))
    }
}

/// Map a non-success HTTP status onto the engine's error taxonomy.
fn error_for_status(status: StatusCode, message: String) -> FeedError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FeedError::Auth(message),
        StatusCode::NOT_FOUND => FeedError::NotFound(message),
        StatusCode::CONFLICT => FeedError::Conflict(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            FeedError::InvalidOperation(message)
        }
        _ => FeedError::Server {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl FeedBackend for HttpBackend {
    async fn fetch_feed_page(
        &self,
        viewer: ProfileId,
        cursor: Option<&Cursor>,
    ) -> Result<FeedPage, FeedError> {
        let mut url = self.endpoint("feed")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("profile_id", &viewer.to_string());
            query.append_pair("limit", &self.page_size.to_string());
            if let Some(cursor) = cursor {
                query.append_pair("cursor", cursor.as_str());
            }
        }

        debug!(viewer, cursor = ?cursor, "fetching feed page");
        let response = self.send(self.http.get(url)).await?;
        let page: PageResponse = Self::decode(response).await?;
        Ok(page.into())
    }

    async fn set_like(
        &self,
        item: ItemId,
        viewer: ProfileId,
        liked: bool,
    ) -> Result<LikeAck, FeedError> {
        if item.kind() != ItemKind::Publication {
            return Err(FeedError::InvalidOperation(format!(
                "{item} cannot be liked"
            )));
        }
        let url = self.endpoint(&format!("{}/like", Self::item_path(item)))?;
        let body = LikeRequest {
            profile_id: viewer,
            liked,
        };

        let response = self.send(self.http.put(url).json(&body)).await?;
        // An empty body is a valid acknowledgement without a count.
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(LikeAck::default());
        }
        let ack: LikeResponse = serde_json::from_slice(&bytes)
            .map_err(|e| FeedError::InvalidResponse(e.to_string()))?;
        Ok(LikeAck {
            like_count: ack.like_count,
        })
    }

    async fn set_saved(
        &self,
        item: ItemId,
        viewer: ProfileId,
        saved: bool,
    ) -> Result<(), FeedError> {
        let url = self.endpoint(&format!("{}/save", Self::item_path(item)))?;
        let body = SaveRequest {
            profile_id: viewer,
            saved,
        };
        self.send(self.http.put(url).json(&body)).await?;
        Ok(())
    }

    async fn report_impression(&self, ad: ItemId, viewer: ProfileId) -> Result<(), FeedError> {
        let url = self.endpoint(&format!("{}/impressions", Self::item_path(ad)))?;
        let body = ImpressionRequest { profile_id: viewer };
        self.send(self.http.post(url).json(&body)).await?;
        Ok(())
    }
}
