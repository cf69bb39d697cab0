// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! REST access to a bulletin server.
//!
//! The same client talks to the own server and to every peer server. Each
//! instance carries its own credentials and re-authenticates once when the
//! server rejects an expired token.

use albina_domain::{
    Bulletin, BulletinId, BulletinStatus, CheckCode, RegionCode, RegionDayStatus, format_date,
    parse_date,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use time::Date;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::ClientError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Operations of the bulletin server used by the editor.
#[async_trait]
pub trait BulletinApi: Send + Sync {
    /// Name of the server, used in logs and as working-set key.
    fn name(&self) -> &str;

    /// Bulletins of `date` touching any of `regions`.
    async fn edit_bulletins(
        &self,
        date: Date,
        regions: &[RegionCode],
    ) -> Result<Vec<Bulletin>, ClientError>;

    /// Replaces the bulletins of `region` on `date`; returns them with ids.
    async fn save_bulletins(
        &self,
        date: Date,
        region: &RegionCode,
        bulletins: &[Bulletin],
    ) -> Result<Vec<Bulletin>, ClientError>;

    /// Deletes one bulletin of `region` on `date`.
    async fn delete_bulletin(
        &self,
        date: Date,
        region: &RegionCode,
        id: &BulletinId,
    ) -> Result<BulletinStatus, ClientError>;

    /// Reopens a submitted or published day.
    async fn start_update(
        &self,
        date: Date,
        region: &RegionCode,
    ) -> Result<BulletinStatus, ClientError>;

    /// Submits the bulletins of `region` on `date`.
    async fn submit(&self, date: Date, region: &RegionCode)
    -> Result<BulletinStatus, ClientError>;

    /// Publishes the bulletins of `region` on `date`.
    async fn publish(
        &self,
        date: Date,
        region: &RegionCode,
        change: bool,
    ) -> Result<BulletinStatus, ClientError>;

    /// Runs the day check of `region` on `date`.
    async fn check(&self, date: Date, region: &RegionCode) -> Result<Vec<CheckCode>, ClientError>;

    /// Statuses of `region` between two days, inclusive.
    async fn internal_status(
        &self,
        start: Date,
        end: Date,
        region: &RegionCode,
    ) -> Result<Vec<RegionDayStatus>, ClientError>;

    /// Days on which someone is drawing a new area of `region`.
    async fn locked_regions(&self, region: &RegionCode) -> Result<Vec<Date>, ClientError>;
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Successful login as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginReply {
    /// Bearer token.
    pub access_token: String,
    /// The forecaster.
    pub username: String,
    /// Name shown as bulletin author.
    pub display_name: String,
    /// The region the session acts for.
    pub region: RegionCode,
    /// Roles of the forecaster.
    pub roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StatusReply {
    status: BulletinStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    message: String,
}

/// A bulletin server reached over HTTP.
pub struct HttpBulletinApi {
    name: String,
    base_url: String,
    username: String,
    password: String,
    client: Client,
    token: RwLock<Option<String>>,
}

impl HttpBulletinApi {
    /// Creates a client for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the HTTP client cannot be built.
    pub fn new(
        name: &str,
        base_url: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, ClientError> {
        let client: Client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
            client,
            token: RwLock::new(None),
        })
    }

    /// Logs in and stores the session token.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` if the credentials are rejected.
    pub async fn login(&self) -> Result<LoginReply, ClientError> {
        let response: Response = self
            .client
            .post(self.url("/authentication"))
            .json(&LoginRequest {
                username: &self.username,
                password: &self.password,
            })
            .send()
            .await?;
        let reply: LoginReply = parse_response(response).await?;

        *self.token.write().await = Some(reply.access_token.clone());
        info!(server = %self.name, username = %reply.username, region = %reply.region, "Logged in");
        Ok(reply)
    }

    /// The current bearer token, if logged in.
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn current_token(&self) -> Result<String, ClientError> {
        if let Some(token) = self.token.read().await.clone() {
            return Ok(token);
        }
        Ok(self.login().await?.access_token)
    }

    /// Sends a request, logging in again once if the token was rejected.
    async fn send<T, F>(&self, build: F) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let token: String = self.current_token().await?;
        let response: Response = build(&self.client).bearer_auth(&token).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(server = %self.name, "Session rejected, logging in again");
            let token: String = self.login().await?.access_token;
            let retried: Response = build(&self.client).bearer_auth(&token).send().await?;
            return parse_response(retried).await;
        }

        parse_response(response).await
    }

    fn day_query(date: Date, region: &RegionCode) -> [(&'static str, String); 2] {
        [
            ("date", format_date(date)),
            ("region", region.as_str().to_string()),
        ]
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status: StatusCode = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let message: String = match response.json::<ErrorReply>().await {
        Ok(reply) => reply.message,
        Err(_) => status.to_string(),
    };
    debug!(status = status.as_u16(), %message, "Request failed");

    if status == StatusCode::CONFLICT {
        return Err(ClientError::Conflict(message));
    }
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl BulletinApi for HttpBulletinApi {
    fn name(&self) -> &str {
        &self.name
    }

    async fn edit_bulletins(
        &self,
        date: Date,
        regions: &[RegionCode],
    ) -> Result<Vec<Bulletin>, ClientError> {
        let url: String = self.url("/bulletins/edit");
        let joined: String = regions
            .iter()
            .map(RegionCode::as_str)
            .collect::<Vec<&str>>()
            .join(",");
        self.send(|client| {
            client
                .get(&url)
                .query(&[("date", format_date(date)), ("regions", joined.clone())])
        })
        .await
    }

    async fn save_bulletins(
        &self,
        date: Date,
        region: &RegionCode,
        bulletins: &[Bulletin],
    ) -> Result<Vec<Bulletin>, ClientError> {
        let url: String = self.url("/bulletins");
        let query = Self::day_query(date, region);
        self.send(|client| client.post(&url).query(&query).json(bulletins))
            .await
    }

    async fn delete_bulletin(
        &self,
        date: Date,
        region: &RegionCode,
        id: &BulletinId,
    ) -> Result<BulletinStatus, ClientError> {
        let url: String = self.url("/bulletins/delete");
        let query = Self::day_query(date, region);
        let reply: StatusReply = self
            .send(|client| {
                client
                    .post(&url)
                    .query(&query)
                    .query(&[("id", id.as_str())])
            })
            .await?;
        Ok(reply.status)
    }

    async fn start_update(
        &self,
        date: Date,
        region: &RegionCode,
    ) -> Result<BulletinStatus, ClientError> {
        let url: String = self.url("/bulletins/update");
        let query = Self::day_query(date, region);
        let reply: StatusReply = self.send(|client| client.post(&url).query(&query)).await?;
        Ok(reply.status)
    }

    async fn submit(
        &self,
        date: Date,
        region: &RegionCode,
    ) -> Result<BulletinStatus, ClientError> {
        let url: String = self.url("/bulletins/submit");
        let query = Self::day_query(date, region);
        let reply: StatusReply = self.send(|client| client.post(&url).query(&query)).await?;
        Ok(reply.status)
    }

    async fn publish(
        &self,
        date: Date,
        region: &RegionCode,
        change: bool,
    ) -> Result<BulletinStatus, ClientError> {
        let url: String = self.url("/bulletins/publish");
        let query = Self::day_query(date, region);
        let reply: StatusReply = self
            .send(|client| {
                client
                    .post(&url)
                    .query(&query)
                    .query(&[("change", change)])
            })
            .await?;
        Ok(reply.status)
    }

    async fn check(&self, date: Date, region: &RegionCode) -> Result<Vec<CheckCode>, ClientError> {
        let url: String = self.url("/bulletins/check");
        let query = Self::day_query(date, region);
        self.send(|client| client.get(&url).query(&query)).await
    }

    async fn internal_status(
        &self,
        start: Date,
        end: Date,
        region: &RegionCode,
    ) -> Result<Vec<RegionDayStatus>, ClientError> {
        let url: String = self.url("/bulletins/status/internal");
        let query: [(&str, String); 3] = [
            ("startDate", format_date(start)),
            ("endDate", format_date(end)),
            ("region", region.as_str().to_string()),
        ];
        self.send(|client| client.get(&url).query(&query)).await
    }

    async fn locked_regions(&self, region: &RegionCode) -> Result<Vec<Date>, ClientError> {
        let url: String = self.url("/regions/locked");
        let dates: Vec<String> = self
            .send(|client| client.get(&url).query(&[("region", region.as_str())]))
            .await?;
        dates
            .iter()
            .map(|d| parse_date(d).map_err(ClientError::from))
            .collect()
    }
}
