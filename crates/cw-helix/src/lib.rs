//! Twitch Helix client for chatwatch.
//!
//! Provides the live presence source: the chatters currently connected to a
//! channel's chat, read from `GET /helix/chat/chatters` with cursor
//! pagination. Requires a user access token with the
//! `moderator:read:chatters` scope for the channel.

use std::fmt;
use std::time::Duration;

use cw_core::{FetchError, Identity, PresenceSnapshot, PresenceSource};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const HELIX_API_URL: &str = "https://api.twitch.tv/helix";
/// Largest page the chatters endpoint serves.
const CHATTERS_PAGE_SIZE: &str = "1000";
/// Upper bound on pages per fetch, in case the API keeps returning a cursor.
const MAX_PAGES: usize = 200;

/// Helix client errors.
#[derive(Debug, Error)]
pub enum HelixError {
    /// A client id or token was empty.
    #[error("invalid credentials: {reason}")]
    InvalidCredentials { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The token was rejected (HTTP 401).
    #[error("access token rejected: {message}")]
    Unauthorized { message: String },
    /// API returned another error response.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// No user exists with the given login.
    #[error("channel not found: {0}")]
    UnknownChannel(String),
}

impl From<HelixError> for FetchError {
    fn from(err: HelixError) -> Self {
        match err {
            HelixError::Unauthorized { .. } => Self::Unauthorized,
            other => Self::Transient(other.to_string()),
        }
    }
}

/// Helix API client.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    client_id: String,
    access_token: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("client_id", &self.client_id)
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client with the default timeout.
    pub fn new(
        client_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, HelixError> {
        Self::with_timeout(client_id, access_token, DEFAULT_TIMEOUT)
    }

    /// Creates a client whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if either credential is empty or whitespace-only,
    /// or if the HTTP client fails to build.
    pub fn with_timeout(
        client_id: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, HelixError> {
        let client_id = client_id.into();
        let access_token = access_token.into();

        if client_id.trim().is_empty() {
            return Err(HelixError::InvalidCredentials {
                reason: "client id cannot be empty",
            });
        }
        if access_token.trim().is_empty() {
            return Err(HelixError::InvalidCredentials {
                reason: "access token cannot be empty",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(HelixError::ClientBuild)?;

        Ok(Self {
            http,
            client_id,
            access_token: access_token.trim_start_matches("oauth:").to_string(),
        })
    }

    /// Resolves a channel login to its broadcaster id.
    pub async fn user_id(&self, login: &str) -> Result<String, HelixError> {
        let login = login.trim().to_lowercase();
        let body = self.get("users", &[("login", login.as_str())]).await?;
        parse_user_id(&body)?.ok_or(HelixError::UnknownChannel(login))
    }

    /// Every chatter currently in the broadcaster's chat.
    ///
    /// Follows the pagination cursor until the API stops returning one.
    pub async fn chatters(
        &self,
        broadcaster_id: &str,
        moderator_id: &str,
    ) -> Result<PresenceSnapshot, HelixError> {
        collect_chatters(|cursor| async move {
            let mut query = vec![
                ("broadcaster_id", broadcaster_id),
                ("moderator_id", moderator_id),
                ("first", CHATTERS_PAGE_SIZE),
            ];
            if let Some(after) = cursor.as_deref() {
                query.push(("after", after));
            }
            self.get("chat/chatters", &query).await
        })
        .await
    }

    async fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<String, HelixError> {
        let response = self
            .http
            .get(format!("{HELIX_API_URL}/{endpoint}"))
            .header("Client-Id", &self.client_id)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        check_status(status, &body)?;
        Ok(body)
    }
}

/// The presence source backed by one channel's chatter list.
#[derive(Debug, Clone)]
pub struct HelixPresence {
    client: Client,
    broadcaster_id: String,
}

impl HelixPresence {
    /// Polls `broadcaster_id`'s chat as the broadcaster themselves.
    pub fn new(client: Client, broadcaster_id: impl Into<String>) -> Self {
        Self {
            client,
            broadcaster_id: broadcaster_id.into(),
        }
    }
}

impl PresenceSource for HelixPresence {
    async fn fetch(&self) -> Result<PresenceSnapshot, FetchError> {
        self.client
            .chatters(&self.broadcaster_id, &self.broadcaster_id)
            .await
            .map_err(FetchError::from)
    }
}

/// Drains a paginated chatter list, one `fetch_page(cursor)` call per page.
///
/// A list that is still paginating after [`MAX_PAGES`] is an error, never a
/// partial snapshot.
async fn collect_chatters<F, Fut>(mut fetch_page: F) -> Result<PresenceSnapshot, HelixError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<String, HelixError>>,
{
    let mut snapshot = PresenceSnapshot::new();
    let mut cursor: Option<String> = None;

    for page in 0..MAX_PAGES {
        let body = fetch_page(cursor.take()).await?;
        let (logins, next) = parse_chatters_page(&body)?;
        tracing::trace!(page, count = logins.len(), "fetched chatters page");
        snapshot.extend(logins);

        match next {
            Some(next) if !next.is_empty() => cursor = Some(next),
            _ => return Ok(snapshot),
        }
    }

    tracing::warn!(pages = MAX_PAGES, "chatters pagination did not terminate");
    Err(HelixError::InvalidResponse(format!(
        "chatters pagination did not terminate after {MAX_PAGES} pages"
    )))
}

fn check_status(status: StatusCode, body: &str) -> Result<(), HelixError> {
    if status.is_success() {
        return Ok(());
    }
    let message = parse_api_error(body).unwrap_or_else(|| body.trim().to_string());
    if status == StatusCode::UNAUTHORIZED {
        return Err(HelixError::Unauthorized { message });
    }
    Err(HelixError::Api {
        status: status.as_u16(),
        message,
    })
}

fn parse_api_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        message: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| payload.message)
        .filter(|message| !message.is_empty())
}

fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, HelixError> {
    serde_json::from_str(body).map_err(|err| HelixError::InvalidResponse(err.to_string()))
}

fn parse_chatters_page(body: &str) -> Result<(Vec<Identity>, Option<String>), HelixError> {
    #[derive(Deserialize)]
    struct Page {
        data: Vec<Chatter>,
        #[serde(default)]
        pagination: Pagination,
    }

    #[derive(Deserialize)]
    struct Chatter {
        user_login: String,
    }

    #[derive(Default, Deserialize)]
    struct Pagination {
        cursor: Option<String>,
    }

    let page: Page = parse_json(body)?;
    let logins = page
        .data
        .into_iter()
        .filter_map(|chatter| match Identity::new(chatter.user_login) {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::debug!(error = %e, "skipping chatter with empty login");
                None
            }
        })
        .collect();
    Ok((logins, page.pagination.cursor))
}

fn parse_user_id(body: &str) -> Result<Option<String>, HelixError> {
    #[derive(Deserialize)]
    struct Users {
        data: Vec<User>,
    }

    #[derive(Deserialize)]
    struct User {
        id: String,
    }

    let users: Users = parse_json(body)?;
    Ok(users.data.into_iter().next().map(|user| user.id))
}
