mod api;
mod cache;
mod components;
mod config;
mod parser;
mod record;
mod screen;

use api::{Connectivity, SearchClient, SearchError};
use cache::Cacher;
use components::{dialog::ImageDialog, grid, top_bar};
use config::Config;
use directories::ProjectDirs;
use iced::{
	event, executor, keyboard, subscription, time,
	widget::{column, image::Handle, scrollable, Space},
	window, Application, Command, Event, Length, Settings, Subscription, Theme
};
use log::{error, info};
use once_cell::sync::Lazy;
use reqwest::{Client, Url};
use screen::{Phase, RequestToken, SearchRequest, SearchScreen};
use std::{
	sync::Arc,
	time::{Duration, Instant}
};

const CARGO_PKG_NAME: &str = env!("CARGO_PKG_NAME");
const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const EM: u16 = 16;
const FRAME: Duration = Duration::from_millis(16);
const NOTICE_DURATION: Duration = Duration::from_secs(4);
const PLACEHOLDER_SIZE: u32 = 64;

pub static CLIENT: Lazy<Client> = Lazy::new(|| {
	Client::builder()
		.user_agent(format!("{CARGO_PKG_NAME}/{CARGO_PKG_VERSION}"))
		.build()
		.unwrap_or_else(|err| {
			error!("failed to build http client: {err}");
			Client::new()
		})
});
pub static DIRS: Lazy<Option<ProjectDirs>> = Lazy::new(|| ProjectDirs::from("", "", CARGO_PKG_NAME));
/// grey square, shown while an image loads or if it is not available
pub static PLACEHOLDER: Lazy<Handle> = Lazy::new(|| {
	let pixels = [0x9e, 0x9e, 0x9e, 0xff].repeat((PLACEHOLDER_SIZE * PLACEHOLDER_SIZE) as usize);
	Handle::from_pixels(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, pixels)
});

pub type Element<'a> = iced::Element<'a, Message, iced::Renderer<Theme>>;

pub struct App {
	api: SearchClient,
	screen: SearchScreen,
	img_cache: Cacher,
	dialog: Option<ImageDialog>,
	notice: Option<(String, Instant)>,
	loading_since: Option<Instant>,
	now: Instant
}

#[derive(Debug, Clone)]
pub enum Message {
	Search(String),
	SearchDone(RequestToken, Result<String, SearchError>),
	Connectivity(Connectivity),
	ImageLoaded(Arc<Url>, Result<Handle, String>),
	Scrolled(scrollable::Viewport),
	OpenImage(Option<Url>),
	CloseImage,
	Resized(u32, u32),
	Tick(Instant)
}

impl App {
	fn search(&mut self, request: SearchRequest) -> Command<Message> {
		self.loading_since = Some(self.now);
		let token = request.token;
		Command::batch([
			scrollable::snap_to(grid::results_id(), scrollable::RelativeOffset::START),
			Command::perform(
				self.api.clone().search(request.term, request.width),
				move |res| Message::SearchDone(token, res)
			)
		])
	}

	fn load_thumbnails(&mut self) -> Command<Message> {
		let commands: Vec<_> = self
			.screen
			.list()
			.records()
			.iter()
			.filter_map(|record| record.url.as_ref())
			.filter_map(|url| self.img_cache.request(url))
			.collect();
		self.img_cache.cache_replacement();
		Command::batch(commands)
	}

	fn busy(&self) -> bool {
		self.screen.phase() == Phase::Loading
			|| self.screen.list().is_animating(self.now)
			|| self.notice.is_some()
	}
}

impl Application for App {
	type Executor = executor::Default;
	type Flags = Config;
	type Message = Message;
	type Theme = Theme;

	fn new(config: Self::Flags) -> (Self, Command<Self::Message>) {
		let api = SearchClient::new(&config);
		let app = App {
			screen: SearchScreen::new(&config),
			img_cache: Cacher::new(config.image_cache_size),
			dialog: None,
			notice: None,
			loading_since: None,
			now: Instant::now(),
			api
		};
		info!("probe {:?}", app.api.endpoint().as_str());
		let probe = Command::perform(app.api.clone().probe(), Message::Connectivity);
		(app, probe)
	}

	fn title(&self) -> String {
		CARGO_PKG_NAME.to_owned()
	}

	fn update(&mut self, message: Self::Message) -> Command<Self::Message> {
		self.now = Instant::now();
		match message {
			Message::Search(text) => match self.screen.input(text) {
				Some(request) => self.search(request),
				None => Command::none()
			},
			Message::SearchDone(token, res) => {
				if self.screen.complete(token, res, self.now) {
					self.loading_since = None;
					self.load_thumbnails()
				} else {
					Command::none()
				}
			},
			Message::Connectivity(connectivity) => {
				if connectivity == Connectivity::Offline {
					self.notice = Some(("No internet connection".to_owned(), self.now));
				}
				match self.screen.set_connectivity(connectivity) {
					Some(request) => self.search(request),
					None => Command::none()
				}
			},
			Message::ImageLoaded(url, res) => {
				self.img_cache.callback(url, res);
				self.img_cache.cache_replacement();
				Command::none()
			},
			Message::Scrolled(viewport) => {
				self.screen.scrolled(
					viewport.absolute_offset().y,
					viewport.bounds().height,
					self.now
				);
				Command::none()
			},
			Message::OpenImage(url) => {
				let command = url
					.as_ref()
					.and_then(|url| self.img_cache.request(url))
					.unwrap_or_else(Command::none);
				self.dialog = Some(ImageDialog::new(url));
				command
			},
			Message::CloseImage => {
				self.dialog = None;
				Command::none()
			},
			Message::Resized(width, height) => {
				self.screen.resize(width as f32, height as f32, self.now);
				Command::none()
			},
			Message::Tick(now) => {
				self.now = now;
				self.screen.list_mut().settle(now);
				if self
					.notice
					.as_ref()
					.is_some_and(|(_, since)| now.saturating_duration_since(*since) >= NOTICE_DURATION)
				{
					self.notice = None;
				}
				Command::none()
			}
		}
	}

	fn view(&self) -> Element<'_> {
		if let Some(dialog) = &self.dialog {
			return dialog.view(&self.img_cache);
		}
		let body: Element = if self.screen.phase() == Phase::Results {
			self.screen
				.list()
				.view(self.screen.columns(), &self.img_cache, self.now)
		} else {
			Space::with_height(Length::Fill).into()
		};
		column!(top_bar::view(self), body).into()
	}

	fn theme(&self) -> Self::Theme {
		Theme::Dark
	}

	fn subscription(&self) -> Subscription<Self::Message> {
		let events = subscription::events_with(on_event);
		if self.busy() {
			Subscription::batch([events, time::every(FRAME).map(Message::Tick)])
		} else {
			events
		}
	}
}

fn on_event(event: Event, _status: event::Status) -> Option<Message> {
	match event {
		Event::Window(window::Event::Resized { width, height }) => Some(Message::Resized(width, height)),
		Event::Keyboard(keyboard::Event::KeyPressed {
			key_code: keyboard::KeyCode::Escape,
			..
		}) => Some(Message::CloseImage),
		_ => None
	}
}

fn main() -> anyhow::Result<()> {
	my_env_logger_style::builder()
		.filter(Some("wgpu_core"), log::LevelFilter::Warn)
		.filter(Some("wgpu_hal"), log::LevelFilter::Warn)
		.filter(Some("iced_wgpu"), log::LevelFilter::Warn)
		.init();
	let config = Config::load()?;
	let window = window::Settings {
		size: (config.window_width, config.window_height),
		..Default::default()
	};
	App::run(Settings {
		window,
		..Settings::with_flags(config)
	})?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	const CAT_AND_DOG: &str = r#"{"query":{"pages":{"1":{"title":"Cat","thumbnail":{"source":"http://x/cat.jpg"}},"2":{"title":"Dog"}}}}"#;

	fn app() -> App {
		App::new(Config::default()).0
	}

	fn app_with_results() -> App {
		let mut app = app();
		let _ = app.update(Message::Connectivity(Connectivity::Online));
		let request = app.screen.input("cat".to_owned()).unwrap();
		let _ = app.update(Message::SearchDone(request.token, Ok(CAT_AND_DOG.to_owned())));
		assert_eq!(app.screen.phase(), Phase::Results);
		app
	}

	#[test]
	fn offline_notice_expires() {
		let mut app = app();
		let _ = app.update(Message::Connectivity(Connectivity::Offline));
		let since = app.notice.as_ref().map(|(_, since)| *since).unwrap();
		assert!(app.busy());

		let _ = app.update(Message::Search("abcdef".to_owned()));
		assert_eq!(app.screen.phase(), Phase::Idle);

		let _ = app.update(Message::Tick(since + NOTICE_DURATION - Duration::from_millis(1)));
		assert!(app.notice.is_some());
		let _ = app.update(Message::Tick(since + NOTICE_DURATION));
		assert!(app.notice.is_none());
	}

	#[test]
	fn online_has_no_notice() {
		let mut app = app();
		let _ = app.update(Message::Connectivity(Connectivity::Online));
		assert!(app.notice.is_none());
	}

	#[test]
	fn dialog_opens_and_closes() {
		let mut app = app_with_results();
		let url = app.screen.list().records()[0].url.clone();
		assert!(url.is_some());
		let _ = app.update(Message::OpenImage(url.clone()));
		assert_eq!(app.dialog.as_ref().and_then(ImageDialog::url), url.as_ref());
		let _ = app.update(Message::CloseImage);
		assert!(app.dialog.is_none());
		// closing again is harmless
		let _ = app.update(Message::CloseImage);
		assert!(app.dialog.is_none());
	}

	#[test]
	fn dialog_without_thumbnail() {
		let mut app = app_with_results();
		let _ = app.update(Message::OpenImage(None));
		assert!(app.dialog.is_some());
		assert!(app.dialog.as_ref().and_then(ImageDialog::url).is_none());
	}

	#[test]
	fn escape_and_resize_events() {
		let escape = Event::Keyboard(keyboard::Event::KeyPressed {
			key_code: keyboard::KeyCode::Escape,
			modifiers: keyboard::Modifiers::empty()
		});
		assert!(matches!(
			on_event(escape, event::Status::Ignored),
			Some(Message::CloseImage)
		));
		let other = Event::Keyboard(keyboard::Event::KeyPressed {
			key_code: keyboard::KeyCode::A,
			modifiers: keyboard::Modifiers::empty()
		});
		assert!(on_event(other, event::Status::Ignored).is_none());
		let resized = Event::Window(window::Event::Resized {
			width: 600,
			height: 900
		});
		assert!(matches!(
			on_event(resized, event::Status::Ignored),
			Some(Message::Resized(600, 900))
		));
	}

	#[test]
	fn resize_keeps_results() {
		let mut app = app_with_results();
		let _ = app.update(Message::Resized(600, 900));
		assert_eq!(app.screen.columns(), 2);
		let _ = app.update(Message::Resized(900, 600));
		assert_eq!(app.screen.columns(), 3);
		assert_eq!(app.screen.phase(), Phase::Results);
		let titles: Vec<_> = app
			.screen
			.list()
			.records()
			.iter()
			.map(|record| record.title.as_str())
			.collect();
		assert_eq!(titles, ["Cat", "Dog"]);
	}
}
