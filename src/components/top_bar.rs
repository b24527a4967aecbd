use crate::{api::Connectivity, App, Element, Message, EM};
use iced::{
	theme,
	widget::{column, container, progress_bar, text, text_input, Space},
	Alignment, Length
};
use std::time::Duration;

const PROGRESS_CYCLE: Duration = Duration::from_millis(1200);
/// rough height of the bar without notice, used until the grid reports its real size
pub const HEIGHT: f32 = 64.0;

/// moving bar while a search runs
fn progress(app: &App) -> Element<'_> {
	let elapsed = app
		.loading_since
		.map(|since| app.now.saturating_duration_since(since))
		.unwrap_or_default();
	let value = (elapsed.as_secs_f32() % PROGRESS_CYCLE.as_secs_f32()) / PROGRESS_CYCLE.as_secs_f32();
	progress_bar(0.0..=1.0, value)
		.height(Length::Fixed(4.0))
		.into()
}

pub fn view(app: &App) -> Element<'_> {
	let phase = app.screen.phase();
	let placeholder = match app.screen.connectivity() {
		Connectivity::Offline => "Offline",
		_ => "Search images"
	};
	let search = text_input(placeholder, app.screen.query())
		.on_input(Message::Search)
		.padding(EM / 2)
		.size(18);
	let status: Element = if phase.show_progress() {
		progress(app)
	} else {
		Space::with_height(Length::Fixed(4.0)).into()
	};
	let mut bar = column!(search, status).spacing(EM / 4);
	if let Some((notice, _)) = &app.notice {
		bar = bar.push(
			container(text(notice))
				.style(theme::Container::Box)
				.padding(EM / 2)
				.width(Length::Fill)
		);
	}
	if phase.show_empty_text() {
		bar = bar.push(
			container(text("No images found").size(20))
				.width(Length::Fill)
				.padding(EM)
				.center_x()
		);
	}
	bar.align_items(Alignment::Center)
		.padding(EM / 2)
		.into()
}

