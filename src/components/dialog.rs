use crate::{cache::Cacher, Element, Message};
use iced::{
	theme,
	widget::{button, container, Image},
	ContentFit, Length
};
use reqwest::Url;

/// Full window view of a single image. Clicking it (or Escape) closes it again.
#[derive(Clone, Debug)]
pub struct ImageDialog {
	url: Option<Url>
}

impl ImageDialog {
	pub fn new(url: Option<Url>) -> Self {
		Self { url }
	}

	pub fn url(&self) -> Option<&Url> {
		self.url.as_ref()
	}

	pub fn view(&self, cache: &Cacher) -> Element<'_> {
		let picture = Image::new(cache.handle_or_placeholder(self.url()))
			.width(Length::Fill)
			.height(Length::Fill)
			.content_fit(ContentFit::Contain);
		let surface = button(picture)
			.style(theme::Button::Text)
			.padding(0)
			.width(Length::Fill)
			.height(Length::Fill)
			.on_press(Message::CloseImage);
		container(surface)
			.width(Length::Fill)
			.height(Length::Fill)
			.center_x()
			.center_y()
			.into()
	}
}
