use crate::{cache::Cacher, record::ImageRecord, Element, Message};
use iced::{
	theme,
	widget::{button, column, container, row, scrollable, text, Image, Space},
	ContentFit, Length, Padding
};
use rustc_hash::FxHashMap;
use std::{
	ops::Range,
	time::{Duration, Instant}
};

pub const CELL_HEIGHT: f32 = 220.0;
pub const SPACING: f32 = 8.0;
pub const GRID_PADDING: f32 = 8.0;
pub const SLIDE_DISTANCE: f32 = 48.0;
pub const ENTRANCE_DURATION: Duration = Duration::from_millis(400);

pub fn results_id() -> scrollable::Id {
	scrollable::Id::new("results")
}

/// The records of one search, laid out as grid.
///
/// Every cell slides in from below the first time it becomes visible.
/// `watermark` remembers the highest index that already did so,
/// so scrolling back and forth does not animate a cell twice.
/// A new search creates a new list, which starts without watermark.
#[derive(Debug, Default)]
pub struct ResultList {
	records: Vec<ImageRecord>,
	watermark: Option<usize>,
	/// start time of running entrance animations
	entrances: FxHashMap<usize, Instant>
}

impl ResultList {
	pub fn new(records: Vec<ImageRecord>) -> Self {
		Self {
			records,
			..Default::default()
		}
	}

	pub fn records(&self) -> &[ImageRecord] {
		&self.records
	}

	#[cfg(test)]
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	#[cfg(test)]
	pub fn watermark(&self) -> Option<usize> {
		self.watermark
	}

	/// Start the entrance of all cells inside `visible`, which are above the watermark.
	/// Return if any animation was started.
	pub fn reveal(&mut self, visible: Range<usize>, now: Instant) -> bool {
		let start = self
			.watermark
			.map_or(0, |watermark| watermark + 1)
			.max(visible.start);
		let end = visible.end.min(self.records.len());
		if start >= end {
			return false;
		}
		for index in start..end {
			self.entrances.insert(index, now);
		}
		self.watermark = Some(end - 1);
		true
	}

	/// Vertical offset of cell `index`, going from [`SLIDE_DISTANCE`] to zero.
	pub fn entrance_offset(&self, index: usize, now: Instant) -> f32 {
		let Some(start) = self.entrances.get(&index) else {
			return 0.0;
		};
		let progress = now.saturating_duration_since(*start).as_secs_f32()
			/ ENTRANCE_DURATION.as_secs_f32();
		let progress = progress.clamp(0.0, 1.0);
		// ease out cubic
		let eased = 1.0 - (1.0 - progress).powi(3);
		SLIDE_DISTANCE * (1.0 - eased)
	}

	pub fn is_animating(&self, now: Instant) -> bool {
		self.entrances
			.values()
			.any(|start| now.saturating_duration_since(*start) < ENTRANCE_DURATION)
	}

	/// forget finished animations
	pub fn settle(&mut self, now: Instant) {
		self.entrances
			.retain(|_, start| now.saturating_duration_since(*start) < ENTRANCE_DURATION);
	}

	pub fn view<'a>(&'a self, columns: usize, cache: &Cacher, now: Instant) -> Element<'a> {
		let columns = columns.max(1);
		let mut cells = self
			.records
			.iter()
			.enumerate()
			.map(|(index, record)| self.cell(index, record, cache, now))
			.peekable();
		let mut rows: Vec<Element> = Vec::new();
		while cells.peek().is_some() {
			let mut cells_row: Vec<Element> = cells.by_ref().take(columns).collect();
			while cells_row.len() < columns {
				cells_row.push(Space::with_width(Length::FillPortion(1)).into());
			}
			rows.push(row(cells_row).spacing(SPACING).into());
		}
		scrollable(column(rows).spacing(SPACING).padding(GRID_PADDING as u16))
			.id(results_id())
			.on_scroll(Message::Scrolled)
			.height(Length::Fill)
			.into()
	}

	fn cell<'a>(
		&self,
		index: usize,
		record: &'a ImageRecord,
		cache: &Cacher,
		now: Instant
	) -> Element<'a> {
		let picture = Image::new(cache.handle_or_placeholder(record.url.as_ref()))
			.width(Length::Fill)
			.height(Length::Fill)
			.content_fit(ContentFit::Cover);
		let content = column!(picture, text(&record.title).size(14)).spacing(4);
		let cell = button(content)
			.style(theme::Button::Text)
			.padding(4)
			.width(Length::Fill)
			.height(Length::Fill)
			.on_press(Message::OpenImage(record.url.clone()));
		let offset = self.entrance_offset(index, now);
		container(cell)
			.padding(Padding {
				top: offset,
				right: 0.0,
				bottom: 0.0,
				left: 0.0
			})
			.width(Length::FillPortion(1))
			.height(Length::Fixed(CELL_HEIGHT))
			.into()
	}
}

/// Indices of the cells in all rows touching the viewport.
pub fn visible_range(scroll_y: f32, viewport_height: f32, columns: usize, len: usize) -> Range<usize> {
	let columns = columns.max(1);
	let row_height = CELL_HEIGHT + SPACING;
	let top = scroll_y.max(0.0);
	let bottom = top + viewport_height.max(0.0);
	// row `i` covers GRID_PADDING + i * row_height .. + CELL_HEIGHT
	let first_row = ((top - GRID_PADDING - CELL_HEIGHT) / row_height).floor() + 1.0;
	let last_row = ((bottom - GRID_PADDING) / row_height).ceil();
	let start = (first_row.max(0.0) as usize * columns).min(len);
	let end = (last_row.max(0.0) as usize * columns).min(len);
	start..end
}

#[cfg(test)]
mod tests {
	use super::*;

	fn list(len: usize) -> ResultList {
		ResultList::new(
			(0..len)
				.map(|i| ImageRecord::new(format!("page {i}"), None))
				.collect()
		)
	}

	#[test]
	fn first_reveal_animates_visible_cells() {
		let now = Instant::now();
		let mut list = list(10);
		assert_eq!(list.watermark(), None);
		assert!(list.reveal(0..4, now));
		assert_eq!(list.watermark(), Some(3));
		for index in 0..4 {
			assert_eq!(list.entrance_offset(index, now), SLIDE_DISTANCE);
		}
		assert_eq!(list.entrance_offset(4, now), 0.0);
		assert!(list.is_animating(now));
	}

	#[test]
	fn seen_cells_do_not_animate_again() {
		let start = Instant::now();
		let mut list = list(10);
		list.reveal(0..4, start);
		let later = start + ENTRANCE_DURATION * 2;
		list.settle(later);
		assert!(!list.is_animating(later));
		// scroll down a bit: only the new row animates
		assert!(list.reveal(2..6, later));
		assert_eq!(list.watermark(), Some(5));
		assert_eq!(list.entrance_offset(2, later), 0.0);
		assert_eq!(list.entrance_offset(3, later), 0.0);
		assert_eq!(list.entrance_offset(4, later), SLIDE_DISTANCE);
		// and back up: nothing
		assert!(!list.reveal(0..4, later));
		assert_eq!(list.watermark(), Some(5));
	}

	#[test]
	fn reveal_is_clamped_to_len() {
		let now = Instant::now();
		let mut list = list(3);
		assert!(list.reveal(0..8, now));
		assert_eq!(list.watermark(), Some(2));
		assert!(!list.reveal(0..8, now));
		let mut empty = ResultList::default();
		assert!(!empty.reveal(0..8, now));
		assert_eq!(empty.watermark(), None);
	}

	#[test]
	fn offset_shrinks_over_time() {
		let start = Instant::now();
		let mut list = list(1);
		list.reveal(0..1, start);
		let half = list.entrance_offset(0, start + ENTRANCE_DURATION / 2);
		assert!(half > 0.0 && half < SLIDE_DISTANCE);
		assert_eq!(list.entrance_offset(0, start + ENTRANCE_DURATION), 0.0);
	}

	#[test]
	fn visible_rows() {
		let row_height = CELL_HEIGHT + SPACING;
		assert_eq!(visible_range(0.0, row_height * 2.0, 2, 100), 0..4);
		assert_eq!(visible_range(0.0, row_height * 2.5, 3, 100), 0..9);
		assert_eq!(visible_range(row_height * 10.0, row_height, 3, 100), 30..33);
		assert_eq!(visible_range(0.0, 10_000.0, 2, 5), 0..5);
		// the padding pushes the third row out of a viewport of exactly two rows
		assert_eq!(visible_range(0.0, row_height * 2.0 + GRID_PADDING, 2, 100), 0..4);
		assert_eq!(visible_range(0.0, row_height * 2.0 + GRID_PADDING + 1.0, 2, 100), 0..6);
		// a row scrolled fully out at the top is skipped
		assert_eq!(visible_range(GRID_PADDING + CELL_HEIGHT, row_height, 2, 100), 2..4);
		assert_eq!(visible_range(0.0, 500.0, 2, 0), 0..0);
	}
}
