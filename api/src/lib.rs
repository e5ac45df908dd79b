#![deny(clippy::all)]
mod error;
pub mod pipeline;
pub mod resources;
pub mod retry;
pub mod stream;

use log::debug;
use once_cell::sync::Lazy;
use reqwest::{
    blocking::{Client as HttpClient, RequestBuilder, Response as HttpResponse},
    header::{self, HeaderMap, HeaderValue},
    Proxy,
};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use url::Url;

use crate::resources::user::IdHolder;

pub use crate::{
    error::{Error, Result},
    pipeline::{FollowerSource, Pipeline, PipelineConfig, Truncation},
    resources::{
        follower::{Cursor, FollowerIdPage, FollowerPage},
        user::{Id as UserId, ScreenName, User},
    },
    retry::RetryConfig,
    stream::{CancellationToken, Stream},
};

/// The API refuses user lookups of more ids than this in a single request.
pub const MAX_LOOKUP_BATCH_SIZE: usize = 100;

/// Number of followers requested per page of `followers/list`.
pub const FOLLOWER_PAGE_SIZE: u32 = 200;

/// Number of ids requested per page of `followers/ids`.
pub const FOLLOWER_ID_PAGE_SIZE: u32 = 5000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token(pub String);

pub struct Config {
    pub endpoint: Url,
    pub token: Token,
    pub accept_invalid_certificates: bool,
    pub proxy: Option<Url>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoint: DEFAULT_ENDPOINT.clone(),
            token: Token("".to_owned()),
            accept_invalid_certificates: false,
            proxy: None,
        }
    }
}

#[derive(Debug)]
pub struct Client {
    endpoints: Endpoints,
    http_client: HttpClient,
    headers: HeaderMap,
}

#[derive(Serialize)]
struct GetFollowersQuery<'a> {
    screen_name: &'a str,
    count: u32,
    skip_status: bool,
    cursor: &'a str,
}

#[derive(Serialize)]
struct GetFollowerIdsQuery<'a> {
    screen_name: &'a str,
    count: u32,
    cursor: &'a str,
}

#[derive(Serialize)]
struct LookupByScreenNameQuery<'a> {
    screen_name: &'a str,
    include_entities: &'static str,
}

#[derive(Serialize)]
struct LookupByIdsForm {
    user_id: String,
}

impl Client {
    /// Create a new API client.
    pub fn new(config: Config) -> Result<Client> {
        let http_client = build_http_client(&config)?;
        let headers = build_headers(&config)?;
        let endpoints = Endpoints::new(&config.endpoint)?;
        Ok(Client {
            endpoints,
            http_client,
            headers,
        })
    }

    /// Get one page of the followers of an account, with their screen names.
    pub fn get_follower_page(
        &self,
        screen_name: &ScreenName,
        cursor: &Cursor,
    ) -> Result<FollowerPage> {
        self.get_query(
            self.endpoints.followers_list.clone(),
            &GetFollowersQuery {
                screen_name: &screen_name.0,
                count: FOLLOWER_PAGE_SIZE,
                skip_status: true,
                cursor: &cursor.0,
            },
        )
    }

    /// Get one page of the ids of the followers of an account.
    pub fn get_follower_id_page(
        &self,
        screen_name: &ScreenName,
        cursor: &Cursor,
    ) -> Result<FollowerIdPage> {
        self.get_query(
            self.endpoints.followers_ids.clone(),
            &GetFollowerIdsQuery {
                screen_name: &screen_name.0,
                count: FOLLOWER_ID_PAGE_SIZE,
                cursor: &cursor.0,
            },
        )
    }

    /// Look up users by id. At most `MAX_LOOKUP_BATCH_SIZE` ids may be passed at once.
    pub fn lookup_users(&self, ids: &[UserId]) -> Result<Vec<User>> {
        if ids.len() > MAX_LOOKUP_BATCH_SIZE {
            return Err(Error::BatchTooLarge {
                requested: ids.len(),
                limit: MAX_LOOKUP_BATCH_SIZE,
            });
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.post_form(
            self.endpoints.users_lookup.clone(),
            &LookupByIdsForm {
                user_id: id_list_form(ids),
            },
        )
    }

    /// Get the numeric id of the account with the given screen name.
    pub fn get_user_id(&self, screen_name: &ScreenName) -> Result<UserId> {
        let users: Vec<IdHolder> = self.get_query(
            self.endpoints.users_lookup.clone(),
            &LookupByScreenNameQuery {
                screen_name: &screen_name.0,
                include_entities: "id",
            },
        )?;
        users
            .into_iter()
            .next()
            .map(|user| user.id)
            .ok_or_else(|| Error::UnknownUser {
                screen_name: screen_name.0.clone(),
            })
    }

    fn get_query<QueryT, SuccessT>(&self, url: Url, query: &QueryT) -> Result<SuccessT>
    where
        QueryT: Serialize,
        SuccessT: DeserializeOwned,
    {
        debug!("Attempting GET `{}`", url);
        self.send(
            "GET",
            self.http_client
                .get(url)
                .headers(self.headers.clone())
                .query(query),
        )
    }

    fn post_form<FormT, SuccessT>(&self, url: Url, form: &FormT) -> Result<SuccessT>
    where
        FormT: Serialize,
        SuccessT: DeserializeOwned,
    {
        debug!("Attempting POST `{}`", url);
        self.send(
            "POST",
            self.http_client
                .post(url)
                .headers(self.headers.clone())
                .form(form),
        )
    }

    fn send<SuccessT>(&self, method: &str, request: RequestBuilder) -> Result<SuccessT>
    where
        SuccessT: DeserializeOwned,
    {
        let http_response = request.send().map_err(|source| Error::ReqwestError {
            source,
            message: format!("{method} operation failed."),
        })?;
        into_result(http_response)
    }
}

fn into_result<SuccessT>(http_response: HttpResponse) -> Result<SuccessT>
where
    SuccessT: DeserializeOwned,
{
    let status_code = http_response.status();
    if status_code.is_success() {
        http_response.json().map_err(Error::BadJsonResponse)
    } else {
        let message = http_response
            .text()
            .map_err(|source| Error::ReqwestError {
                source,
                message: format!("Could not read error response with status {status_code}."),
            })?;
        Err(Error::Api {
            status_code,
            message,
        })
    }
}

impl FollowerSource for Client {
    fn follower_page(&self, screen_name: &ScreenName, cursor: &Cursor) -> Result<FollowerPage> {
        self.get_follower_page(screen_name, cursor)
    }

    fn follower_id_page(
        &self,
        screen_name: &ScreenName,
        cursor: &Cursor,
    ) -> Result<FollowerIdPage> {
        self.get_follower_id_page(screen_name, cursor)
    }

    fn lookup_screen_names(&self, ids: &[UserId]) -> Result<Vec<ScreenName>> {
        Ok(self
            .lookup_users(ids)?
            .into_iter()
            .map(|user| user.screen_name)
            .collect())
    }
}

#[derive(Debug)]
struct Endpoints {
    followers_list: Url,
    followers_ids: Url,
    users_lookup: Url,
}

fn construct_endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut endpoint = base.clone();

    let mut endpoint_segments = endpoint
        .path_segments_mut()
        .map_err(|_| Error::BadEndpoint {
            endpoint: base.clone(),
        })?;

    endpoint_segments.pop_if_empty();
    for segment in segments {
        endpoint_segments.push(segment);
    }

    drop(endpoint_segments);

    Ok(endpoint)
}

impl Endpoints {
    pub fn new(base: &Url) -> Result<Self> {
        let followers_list = construct_endpoint(base, &["followers", "list.json"])?;
        let followers_ids = construct_endpoint(base, &["followers", "ids.json"])?;
        let users_lookup = construct_endpoint(base, &["users", "lookup.json"])?;

        Ok(Endpoints {
            followers_list,
            followers_ids,
            users_lookup,
        })
    }
}

const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 120;

fn build_http_client(config: &Config) -> Result<HttpClient> {
    let mut builder = HttpClient::builder()
        .danger_accept_invalid_certs(config.accept_invalid_certificates)
        .timeout(Some(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS)));

    if let Some(proxy) = config.proxy.clone() {
        builder = builder.proxy(Proxy::all(proxy).map_err(Error::BuildHttpClient)?);
    }
    builder.build().map_err(Error::BuildHttpClient)
}

fn build_headers(config: &Config) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", &config.token.0)).map_err(|_| {
            Error::BadToken {
                token: config.token.0.clone(),
            }
        })?,
    );
    Ok(headers)
}

fn id_list_form(ids: &[UserId]) -> String {
    // The lookup endpoint takes a single comma separated list: "1,2,3"
    ids.iter()
        .map(|id| id.0.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub static DEFAULT_ENDPOINT: Lazy<Url> =
    Lazy::new(|| Url::parse("https://api.twitter.com/1.1").expect("Default URL is well-formed"));
