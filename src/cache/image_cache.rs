use crate::{Message, CLIENT, PLACEHOLDER};
use anyhow::Context;
use iced::{widget::image::Handle, Command};
use log::{error, info};
use parking_lot::Mutex;
use reqwest::Url;
use rustc_hash::FxHashMap;
use std::{collections::BTreeMap, ops::Deref, sync::Arc};

#[derive(Debug)]
enum CacheState {
	Present(Handle),
	Loading,
	Failed
}

#[derive(Debug)]
/// Keep decoded images in memory.
/// If full the least recently used images will be removed.
/// A removed image is downloaded again the next time it is requested.
pub struct Cacher {
	inner: Mutex<InnerCache>,
	max_size: usize
}

#[derive(Debug, Default)]
/// Since [`App::view`] has only readonly access, touching the access time
/// happens behind a Mutex.
/// So [`Cacher::get()`] returns a copy of the handle, which is cheap since [`Handle`] use [`Arc`] intern.
struct InnerCache {
	/// maps the key to (last_acess_time, value)
	data: FxHashMap<Arc<Url>, (u64, CacheState)>,
	/// maps the last acess time to the key used in the HashMap
	last_acess: BTreeMap<u64, Arc<Url>>,
	time: u64
}

impl InnerCache {
	fn touch(&mut self, url: &Url) -> Option<&CacheState> {
		let (time, state) = self.data.get_mut(url)?;
		if let Some(key) = self.last_acess.remove(time) {
			self.last_acess.insert(self.time, key);
		}
		*time = self.time;
		self.time += 1;
		Some(state)
	}
}

impl Cacher {
	pub fn new(max_size: usize) -> Self {
		Self {
			inner: Default::default(),
			max_size
		}
	}

	pub fn get(&self, url: &Url) -> Option<Handle> {
		match self.inner.lock().touch(url) {
			Some(CacheState::Present(handle)) => Some(handle.to_owned()),
			_ => None
		}
	}

	/// image of `url`, or the placeholder while loading, after a failure or without url
	pub fn handle_or_placeholder(&self, url: Option<&Url>) -> Handle {
		url.and_then(|url| self.get(url))
			.unwrap_or_else(|| PLACEHOLDER.deref().clone())
	}

	/// Start downloading `url`, unless it is already present, loading or has failed before.
	pub fn request(&mut self, url: &Url) -> Option<Command<Message>> {
		let inner = self.inner.get_mut();
		if inner.touch(url).is_some() {
			return None;
		}
		let url = Arc::new(url.to_owned());
		inner.last_acess.insert(inner.time, url.clone());
		inner
			.data
			.insert(url.clone(), (inner.time, CacheState::Loading));
		inner.time += 1;
		Some(Command::perform(download(url.clone()), move |res| {
			Message::ImageLoaded(url, res.map_err(|err| format!("{err:#}")))
		}))
	}

	/// Store the result of a download.
	/// Should be called when [`Message::ImageLoaded`] was send
	pub fn callback(&mut self, url: Arc<Url>, result: Result<Handle, String>) {
		let inner = self.inner.get_mut();
		// if `None` the data was removed from cache, before loading finish
		if let Some((_time, value)) = inner.data.get_mut(url.deref()) {
			*value = match result {
				Ok(handle) => CacheState::Present(handle),
				Err(err) => {
					error!("{err}");
					CacheState::Failed
				}
			};
		}
	}

	pub fn cache_replacement(&mut self) {
		let inner = self.inner.get_mut();
		while inner.last_acess.len() > self.max_size {
			// remove oldest element from cache
			let key = inner.last_acess.pop_first().map(|(_i, key)| key);
			if let Some(key) = key {
				inner.data.remove(&key);
			}
		}
	}

	#[cfg(test)]
	fn len(&self) -> usize {
		self.inner.lock().data.len()
	}
}

async fn download(url: Arc<Url>) -> anyhow::Result<Handle> {
	info!("download {:?}", url.as_str());
	let bytes = CLIENT
		.get(url.deref().clone())
		.send()
		.await?
		.error_for_status()?
		.bytes()
		.await
		.with_context(|| format!("failed to download {:?}", url.as_str()))?;
	Ok(Handle::from_memory(bytes.to_vec()))
}
