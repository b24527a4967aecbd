use reqwest::Url;

/// One search hit: page title and, if the page has one, its thumbnail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRecord {
	pub title: String,
	pub url: Option<Url>
}

impl ImageRecord {
	pub fn new(title: impl Into<String>, url: Option<Url>) -> Self {
		Self {
			title: title.into(),
			url
		}
	}
}
