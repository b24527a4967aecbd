use crate::record::ImageRecord;
use log::warn;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
	#[error("response is not valid json: {0}")]
	Json(#[from] serde_json::Error),
	#[error("unexpected response shape: {0}")]
	Shape(String)
}

#[derive(Debug, Deserialize)]
struct Page {
	title: String,
	thumbnail: Option<Thumbnail>
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
	source: String
}

/// Turn a search response into records, in the order the server listed the pages.
///
/// A document without `query` (or a `query` without `pages`) is a search without hits
/// and yields an empty list.
pub fn parse(body: &str) -> Result<Vec<ImageRecord>, ParseError> {
	let document: Value = serde_json::from_str(body)?;
	let Some(query) = document.get("query") else {
		return Ok(Vec::new());
	};
	let Some(pages) = as_object(query, "query")?.get("pages") else {
		return Ok(Vec::new());
	};
	as_object(pages, "pages")?
		.iter()
		.map(|(id, page)| to_record(id, page))
		.collect()
}

fn as_object<'a>(value: &'a Value, name: &str) -> Result<&'a Map<String, Value>, ParseError> {
	value
		.as_object()
		.ok_or_else(|| ParseError::Shape(format!("`{name}` is not an object")))
}

fn to_record(id: &str, page: &Value) -> Result<ImageRecord, ParseError> {
	let page = Page::deserialize(page)
		.map_err(|err| ParseError::Shape(format!("page {id:?}: {err}")))?;
	let url = page
		.thumbnail
		.and_then(|thumbnail| match Url::parse(&thumbnail.source) {
			Ok(url) => Some(url),
			Err(err) => {
				warn!("ignore thumbnail {:?} of page {id:?}: {err}", thumbnail.source);
				None
			}
		});
	Ok(ImageRecord::new(page.title, url))
}
