use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{classify_status, ApiError};
use crate::session::{Credentials, SessionStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub emoji: String,
    pub count: u32,
    #[serde(default)]
    pub users: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub channel_id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub username: String,
    pub content: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub replies_to: Option<i64>,
    #[serde(default)]
    pub reply_count: u32,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChannelUnread {
    pub channel_id: i64,
    #[serde(default)]
    pub channel_name: String,
    pub unread_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub struct Profile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Deserialize)]
struct AuthResponse {
    auth_token: String,
    username: String,
}

#[derive(Deserialize)]
struct ReactionsResponse {
    reactions: Vec<Reaction>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// HTTP gateway to the Belay backend.
///
/// Every authenticated call is routed through one send path that attaches
/// the bearer credential from the session store and classifies failures.
/// A 401 clears the credential before the error surfaces; with no credential
/// held, authenticated calls fail locally without touching the network.
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(base_url: &str, session: SessionStore) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, ApiError> {
        match self.session.token() {
            Some(token) => Ok(req.bearer_auth(token)),
            None => Err(ApiError::Unauthorized),
        }
    }

    async fn finish(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let message = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .map(|b| b.message)
            .filter(|m| !m.is_empty());
        let err = classify_status(status.as_u16(), message)
            .unwrap_or(ApiError::Server(status.as_u16()));
        if err.is_auth_failure() && self.session.clear() {
            tracing::warn!("session rejected by server, credential cleared");
        }
        Err(err)
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        resp.json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    // Auth

    pub async fn login(&self, username: &str, password: &str) -> Result<Credentials, ApiError> {
        let req = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": password }));
        let resp = self.finish(req).await?;
        let auth: AuthResponse = Self::decode(resp).await?;
        self.install(auth)
    }

    pub async fn signup(&self, username: &str, password: &str) -> Result<Credentials, ApiError> {
        let req = self
            .http
            .post(self.url("/api/auth/signup"))
            .json(&json!({ "username": username, "password": password }));
        let resp = self.finish(req).await?;
        let auth: AuthResponse = Self::decode(resp).await?;
        self.install(auth)
    }

    fn install(&self, auth: AuthResponse) -> Result<Credentials, ApiError> {
        let creds = Credentials {
            auth_token: auth.auth_token,
            username: auth.username,
        };
        if let Err(e) = self.session.replace(creds.clone()) {
            tracing::warn!("could not persist session: {}", e);
        }
        Ok(creds)
    }

    /// Tell the server goodbye and drop the local credential either way.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = match self.authed(self.http.post(self.url("/api/auth/logout"))) {
            Ok(req) => self.finish(req).await.map(|_| ()),
            Err(e) => Err(e),
        };
        self.session.clear();
        result
    }

    pub async fn profile(&self) -> Result<Profile, ApiError> {
        let req = self.authed(self.http.get(self.url("/api/auth/profile")))?;
        let resp = self.finish(req).await?;
        Self::decode(resp).await
    }

    // Channels

    pub async fn channels(&self) -> Result<Vec<Channel>, ApiError> {
        let req = self.authed(self.http.get(self.url("/api/channels")))?;
        let resp = self.finish(req).await?;
        Self::decode(resp).await
    }

    pub async fn create_channel(&self, name: &str) -> Result<Channel, ApiError> {
        let req = self
            .authed(self.http.post(self.url("/api/channels")))?
            .json(&json!({ "name": name }));
        let resp = self.finish(req).await?;
        Self::decode(resp).await
    }

    pub async fn rename_channel(&self, channel_id: i64, name: &str) -> Result<Channel, ApiError> {
        let req = self
            .authed(
                self.http
                    .put(self.url(&format!("/api/channels/{}", channel_id))),
            )?
            .json(&json!({ "name": name }));
        let resp = self.finish(req).await?;
        Self::decode(resp).await
    }

    pub async fn delete_channel(&self, channel_id: i64) -> Result<(), ApiError> {
        let req = self.authed(
            self.http
                .delete(self.url(&format!("/api/channels/{}", channel_id))),
        )?;
        self.finish(req).await?;
        Ok(())
    }

    pub async fn unread_counts(&self) -> Result<Vec<ChannelUnread>, ApiError> {
        let req = self.authed(self.http.get(self.url("/api/channels/unread")))?;
        let resp = self.finish(req).await?;
        Self::decode(resp).await
    }

    pub async fn mark_channel_read(&self, channel_id: i64) -> Result<(), ApiError> {
        let req = self.authed(
            self.http
                .post(self.url(&format!("/api/channels/{}/read", channel_id))),
        )?;
        self.finish(req).await?;
        Ok(())
    }

    // Messages

    /// Top-level messages for a channel, newest first as the server sends them.
    pub async fn messages(&self, channel_id: i64) -> Result<Vec<Message>, ApiError> {
        let req = self.authed(
            self.http
                .get(self.url(&format!("/api/channels/{}/messages", channel_id))),
        )?;
        let resp = self.finish(req).await?;
        Self::decode(resp).await
    }

    pub async fn send_message(&self, channel_id: i64, content: &str) -> Result<Message, ApiError> {
        let req = self
            .authed(
                self.http
                    .post(self.url(&format!("/api/channels/{}/messages", channel_id))),
            )?
            .json(&json!({ "content": content }));
        let resp = self.finish(req).await?;
        Self::decode(resp).await
    }

    /// Replies to a message, oldest first as the server sends them.
    pub async fn replies(&self, message_id: i64) -> Result<Vec<Message>, ApiError> {
        let req = self.authed(
            self.http
                .get(self.url(&format!("/api/messages/{}/replies", message_id))),
        )?;
        let resp = self.finish(req).await?;
        Self::decode(resp).await
    }

    pub async fn send_reply(&self, message_id: i64, content: &str) -> Result<Message, ApiError> {
        let req = self
            .authed(
                self.http
                    .post(self.url(&format!("/api/messages/{}/replies", message_id))),
            )?
            .json(&json!({ "content": content }));
        let resp = self.finish(req).await?;
        Self::decode(resp).await
    }

    // Reactions. The server returns the full reaction set for the message;
    // local state takes it wholesale, never counting client-side.

    pub async fn add_reaction(
        &self,
        message_id: i64,
        emoji: &str,
    ) -> Result<Vec<Reaction>, ApiError> {
        let req = self
            .authed(
                self.http
                    .post(self.url(&format!("/api/messages/{}/reactions", message_id))),
            )?
            .json(&json!({ "emoji": emoji }));
        let resp = self.finish(req).await?;
        let body: ReactionsResponse = Self::decode(resp).await?;
        Ok(body.reactions)
    }

    pub async fn remove_reaction(
        &self,
        message_id: i64,
        emoji: &str,
    ) -> Result<Vec<Reaction>, ApiError> {
        let req = self
            .authed(
                self.http
                    .delete(self.url(&format!("/api/messages/{}/reactions", message_id))),
            )?
            .json(&json!({ "emoji": emoji }));
        let resp = self.finish(req).await?;
        let body: ReactionsResponse = Self::decode(resp).await?;
        Ok(body.reactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_defaults_for_sparse_payload() {
        // The list endpoint omits reactions; replies omit reply_count.
        let msg: Message = serde_json::from_str(
            r#"{
                "id": 3,
                "channel_id": 7,
                "user_id": 1,
                "username": "alice",
                "content": "hello",
                "created_at": "2024-03-01 12:00:00",
                "replies_to": null,
                "reply_count": 2
            }"#,
        )
        .unwrap();
        assert!(msg.reactions.is_empty());
        assert_eq!(msg.reply_count, 2);
        assert_eq!(msg.replies_to, None);
    }

    #[test]
    fn test_reaction_users_optional() {
        let r: Reaction = serde_json::from_str(r#"{"emoji": "👍", "count": 2}"#).unwrap();
        assert_eq!(r.count, 2);
        assert!(r.users.is_empty());
    }

    #[test]
    fn test_no_credential_fails_locally() {
        let session = SessionStore::open(
            std::env::temp_dir().join(format!("belay_api_test_{}.json", std::process::id())),
        );
        session.clear();
        let client = ApiClient::new("http://127.0.0.1:5000/", session);
        let err = client.authed(client.http.get(client.url("/api/channels")));
        assert!(matches!(err, Err(ApiError::Unauthorized)));
    }
}
