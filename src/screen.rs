use crate::{
	api::{Connectivity, SearchError},
	components::{
		grid::{visible_range, ResultList},
		top_bar
	},
	config::Config,
	parser
};
use log::{debug, error, info, warn};
use std::time::Instant;

/// What the screen currently shows below the search bar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
	#[default]
	Idle,
	Loading,
	Results,
	Empty,
	Error
}

impl Phase {
	pub fn show_progress(self) -> bool {
		self == Phase::Loading
	}

	pub fn show_empty_text(self) -> bool {
		matches!(self, Phase::Empty | Phase::Error)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
	Portrait,
	Landscape
}

impl Orientation {
	pub fn of(width: f32, height: f32) -> Self {
		if height > width {
			Orientation::Portrait
		} else {
			Orientation::Landscape
		}
	}
}

/// Identifies a search request. Only the answer to the latest request is shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchRequest {
	pub token: RequestToken,
	pub term: String,
	/// thumbnail width in pixels
	pub width: u32
}

#[derive(Debug)]
pub struct SearchScreen {
	query: String,
	phase: Phase,
	list: ResultList,
	latest: Option<RequestToken>,
	next_token: u64,
	connectivity: Connectivity,
	width: f32,
	height: f32,
	scroll_y: f32,
	/// height of the result grid, once it reported it
	viewport_height: Option<f32>,
	min_query_len: usize,
	portrait_columns: usize,
	landscape_columns: usize
}

impl SearchScreen {
	pub fn new(config: &Config) -> Self {
		Self {
			query: String::new(),
			phase: Phase::Idle,
			list: ResultList::default(),
			latest: None,
			next_token: 0,
			connectivity: Connectivity::Unknown,
			width: config.window_width as f32,
			height: config.window_height as f32,
			scroll_y: 0.0,
			viewport_height: None,
			min_query_len: config.min_query_len,
			portrait_columns: config.portrait_columns,
			landscape_columns: config.landscape_columns
		}
	}

	pub fn query(&self) -> &str {
		&self.query
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn list(&self) -> &ResultList {
		&self.list
	}

	pub fn list_mut(&mut self) -> &mut ResultList {
		&mut self.list
	}

	pub fn connectivity(&self) -> Connectivity {
		self.connectivity
	}

	pub fn orientation(&self) -> Orientation {
		Orientation::of(self.width, self.height)
	}

	pub fn columns(&self) -> usize {
		match self.orientation() {
			Orientation::Portrait => self.portrait_columns,
			Orientation::Landscape => self.landscape_columns
		}
	}

	/// The text field changed.
	/// Returns the request to issue, if the trimmed text is long enough.
	pub fn input(&mut self, text: String) -> Option<SearchRequest> {
		self.query = text;
		self.start_search()
	}

	/// Result of the startup connectivity check.
	/// Going online starts a search for text typed while the check was running.
	pub fn set_connectivity(&mut self, connectivity: Connectivity) -> Option<SearchRequest> {
		info!("connectivity: {connectivity:?}");
		self.connectivity = connectivity;
		self.start_search()
	}

	fn start_search(&mut self) -> Option<SearchRequest> {
		let term = self.query.trim();
		if term.chars().count() <= self.min_query_len {
			return None;
		}
		if self.connectivity != Connectivity::Online {
			debug!("not online, skip search for {term:?}");
			return None;
		}
		let term = term.to_owned();
		let token = RequestToken(self.next_token);
		self.next_token += 1;
		self.latest = Some(token);
		self.phase = Phase::Loading;
		self.list = ResultList::default();
		self.scroll_y = 0.0;
		Some(SearchRequest {
			token,
			term,
			width: self.width.max(1.0).round() as u32
		})
	}

	/// A search finished. Answers to outdated requests are dropped and `false` is returned.
	pub fn complete(
		&mut self,
		token: RequestToken,
		result: Result<String, SearchError>,
		now: Instant
	) -> bool {
		if self.latest != Some(token) {
			debug!("drop stale response {token:?}");
			return false;
		}
		self.latest = None;
		match result {
			Ok(body) => {
				let records = parser::parse(&body).unwrap_or_else(|err| {
					warn!("{err}");
					Vec::new()
				});
				info!("search finished with {} results", records.len());
				if records.is_empty() {
					self.phase = Phase::Empty;
				} else {
					self.phase = Phase::Results;
					self.list = ResultList::new(records);
					self.reveal(now);
				}
			},
			Err(err) => {
				error!("{err}");
				self.phase = Phase::Error;
			}
		}
		true
	}

	/// Window size changed. Switches between portrait and landscape columns, results stay.
	pub fn resize(&mut self, width: f32, height: f32, now: Instant) {
		let before = self.orientation();
		if let Some(viewport_height) = &mut self.viewport_height {
			*viewport_height = (*viewport_height + height - self.height).max(0.0);
		}
		self.width = width;
		self.height = height;
		if before != self.orientation() {
			info!(
				"orientation changed to {:?}, {} columns",
				self.orientation(),
				self.columns()
			);
		}
		self.reveal(now);
	}

	pub fn scrolled(&mut self, scroll_y: f32, viewport_height: f32, now: Instant) {
		self.scroll_y = scroll_y;
		self.viewport_height = Some(viewport_height);
		self.reveal(now);
	}

	fn reveal(&mut self, now: Instant) {
		let viewport_height = self
			.viewport_height
			.unwrap_or(self.height - top_bar::HEIGHT);
		let visible = visible_range(
			self.scroll_y,
			viewport_height,
			self.columns(),
			self.list.records().len()
		);
		self.list.reveal(visible, now);
	}
}
