use crate::{config::Config, CLIENT};
use log::{debug, info, warn};
use reqwest::{Client, Request, Url};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::lookup_host;

#[derive(Clone, Debug, Error)]
pub enum SearchError {
	#[error("search request failed: {0}")]
	Transport(Arc<reqwest::Error>)
}

impl From<reqwest::Error> for SearchError {
	fn from(err: reqwest::Error) -> Self {
		Self::Transport(Arc::new(err))
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Connectivity {
	#[default]
	Unknown,
	Online,
	Offline
}

/// Talks to a MediaWiki `api.php`, asking for pages whose title starts with the
/// search term together with a thumbnail of each page.
#[derive(Clone, Debug)]
pub struct SearchClient {
	endpoint: Url,
	limit: u32
}

impl SearchClient {
	pub fn new(config: &Config) -> Self {
		Self {
			endpoint: config.endpoint.clone(),
			limit: config.result_limit
		}
	}

	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// `width` is the thumbnail size in pixels the server should scale to.
	pub fn request(&self, client: &Client, term: &str, width: u32) -> reqwest::Result<Request> {
		let width = width.to_string();
		let limit = self.limit.to_string();
		client
			.get(self.endpoint.clone())
			.query(&[
				("action", "query"),
				("format", "json"),
				("prop", "pageimages"),
				("piprop", "thumbnail"),
				("pithumbsize", width.as_str()),
				("pilimit", limit.as_str()),
				("generator", "prefixsearch"),
				("gpssearch", term),
				("gpslimit", limit.as_str())
			])
			.build()
	}

	/// Fire a single search and return the raw body. Non 2xx status codes count as failure.
	pub async fn search(self, term: String, width: u32) -> Result<String, SearchError> {
		info!("search for {term:?}");
		let request = self.request(&CLIENT, &term, width)?;
		let body = CLIENT
			.execute(request)
			.await?
			.error_for_status()?
			.text()
			.await?;
		debug!("search for {term:?} returned {} bytes", body.len());
		Ok(body)
	}

	/// Check if the endpoint host can be resolved at all.
	pub async fn probe(self) -> Connectivity {
		let Some(host) = self.endpoint.host_str() else {
			return Connectivity::Offline;
		};
		let port = self.endpoint.port_or_known_default().unwrap_or(443);
		match lookup_host((host, port)).await {
			Ok(mut addrs) => {
				if addrs.next().is_some() {
					Connectivity::Online
				} else {
					warn!("{host:?} resolved to no address");
					Connectivity::Offline
				}
			},
			Err(err) => {
				warn!("failed to resolve {host:?}: {err}");
				Connectivity::Offline
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	#[test]
	fn request_carries_term_and_width() {
		let api = SearchClient::new(&Config::default());
		let request = api.request(&Client::new(), "red panda", 1080).unwrap();
		assert_eq!(request.method(), reqwest::Method::GET);
		assert_eq!(request.url().host_str(), Some("en.wikipedia.org"));
		assert_eq!(request.url().path(), "/w/api.php");
		let query: HashMap<_, _> = request.url().query_pairs().into_owned().collect();
		assert_eq!(query["gpssearch"], "red panda");
		assert_eq!(query["pithumbsize"], "1080");
		assert_eq!(query["pilimit"], "50");
		assert_eq!(query["generator"], "prefixsearch");
		assert_eq!(query["format"], "json");
	}

	#[tokio::test]
	async fn localhost_is_online() {
		let config = Config::from_toml("endpoint = \"http://localhost:8080/api.php\"").unwrap();
		assert_eq!(SearchClient::new(&config).probe().await, Connectivity::Online);
	}

	#[tokio::test]
	async fn endpoint_without_host_is_offline() {
		let api = SearchClient {
			endpoint: Url::parse("data:text/plain,hello").unwrap(),
			limit: 1
		};
		assert_eq!(api.probe().await, Connectivity::Offline);
	}

	#[test]
	fn request_keeps_endpoint_query() {
		let config = Config::from_toml("endpoint = \"http://localhost:8080/api.php?origin=*\"\nresult_limit = 10").unwrap();
		let api = SearchClient::new(&config);
		let request = api.request(&Client::new(), "abc", 300).unwrap();
		let query: HashMap<_, _> = request.url().query_pairs().into_owned().collect();
		assert_eq!(query["origin"], "*");
		assert_eq!(query["gpslimit"], "10");
		assert_eq!(request.url().port(), Some(8080));
	}
}
