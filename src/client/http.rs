use std::time::Duration;

use reqwest::{Method, StatusCode};
use url::Url;

use crate::error::HttpError;

/// Default deadline of a single request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Authentication attached to every request of a client.
#[derive(Clone)]
pub enum Auth {
	None,
	Basic {
		username: String,
		password: String,
	},
	/// Sent as `<header>: <token_name> <token>`.
	Token {
		header: String,
		token_name: String,
		token: String,
	},
}

impl Auth {
	pub fn bearer(token: impl Into<String>) -> Self {
		Self::Token {
			header: "Authorization".into(),
			token_name: "Bearer".into(),
			token: token.into(),
		}
	}

	fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
		match self {
			Self::None => request,
			Self::Basic { username, password } => request.basic_auth(username, Some(password)),
			Self::Token { header, token_name, token } => request.header(header.as_str(), format!("{token_name} {token}")),
		}
	}
}

impl std::fmt::Debug for Auth {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::None => f.write_str("None"),
			Self::Basic { username, .. } => f.debug_struct("Basic")
				.field("username", username)
				.field("password", &"[REDACTED]")
				.finish(),
			Self::Token { header, token_name, .. } => f.debug_struct("Token")
				.field("header", header)
				.field("token_name", token_name)
				.field("token", &"[REDACTED]")
				.finish(),
		}
	}
}

/// JSON over HTTP against a single API root.
#[derive(Debug, Clone)]
pub struct HttpClient {
	client: reqwest::Client,
	api_root: String,
	auth: Auth,
	headers: Vec<(String, String)>,
}

impl HttpClient {
	pub fn new(api_root: &str, auth: Auth, timeout: Duration) -> Result<Self, HttpError> {
		let api_root = api_root.trim_end_matches('/').to_string();
		Url::parse(&api_root)
			.map_err(|source| HttpError::InvalidUrl { url: api_root.clone(), source })?;

		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(HttpError::ClientBuild)?;

		Ok(Self {
			client,
			api_root,
			auth,
			headers: Vec::new(),
		})
	}

	/// Add a header sent with every request.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}

	/// Build an absolute URL from a path relative to the API root.
	pub fn url(&self, relative_url: &str, query: &[(&str, &str)]) -> Result<Url, HttpError> {
		let url = format!("{}/{}", self.api_root, relative_url.trim_start_matches('/'));
		let mut url = Url::parse(&url)
			.map_err(|source| HttpError::InvalidUrl { url: url.clone(), source })?;
		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query);
		}
		Ok(url)
	}

	pub async fn get<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, HttpError> {
		let response = self.send(Method::GET, url.clone(), None::<&()>).await?;
		decode(Method::GET, &url, response).await
	}

	pub async fn post<B, T>(&self, url: Url, body: &B) -> Result<T, HttpError>
	where
		B: serde::Serialize + ?Sized,
		T: serde::de::DeserializeOwned,
	{
		let response = self.send(Method::POST, url.clone(), Some(body)).await?;
		decode(Method::POST, &url, response).await
	}

	/// POST a JSON body, only checking the response status.
	pub async fn post_ignore_response<B>(&self, url: Url, body: &B) -> Result<(), HttpError>
	where
		B: serde::Serialize + ?Sized,
	{
		self.send(Method::POST, url, Some(body)).await?;
		Ok(())
	}

	async fn send<B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<reqwest::Response, HttpError>
	where
		B: serde::Serialize + ?Sized,
	{
		log::debug!("{} {}", method, url);

		let mut request = self.auth.apply(self.client.request(method.clone(), url.clone()));
		for (name, value) in &self.headers {
			request = request.header(name.as_str(), value.as_str());
		}
		if let Some(body) = body {
			request = request.json(body);
		}

		let response = request
			.send()
			.await
			.map_err(|source| HttpError::Send { method: method.clone(), url: url.to_string(), source })?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(HttpError::Status { method, url: url.to_string(), status, body });
		}

		Ok(response)
	}
}

async fn decode<T: serde::de::DeserializeOwned>(method: Method, url: &Url, response: reqwest::Response) -> Result<T, HttpError> {
	response
		.json()
		.await
		.map_err(|source| HttpError::Decode { method, url: url.to_string(), source })
}

/// True when the status indicates that the requested resource does not exist.
pub fn is_not_found(error: &HttpError) -> bool {
	matches!(error, HttpError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
}
