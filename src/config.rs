use crate::DIRS;
use log::info;
use reqwest::Url;
use serde::{Deserialize, Deserializer};
use std::{fs, io, path::PathBuf};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read {path:?}: {source}")]
	Io { path: PathBuf, source: io::Error },
	#[error("failed to parse config: {0}")]
	Toml(#[from] toml::de::Error),
	#[error("invalid value for {key}: {reason}")]
	Invalid { key: &'static str, reason: String }
}

/// User settings, read from `config.toml` inside the config dir.
/// Every key is optional.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	#[serde(deserialize_with = "deserialize_url")]
	pub endpoint: Url,
	/// search starts once the trimmed input is longer than this
	pub min_query_len: usize,
	/// maximum number of pages per search
	pub result_limit: u32,
	pub portrait_columns: usize,
	pub landscape_columns: usize,
	/// decoded images kept in memory
	pub image_cache_size: usize,
	pub window_width: u32,
	pub window_height: u32
}

impl Default for Config {
	fn default() -> Self {
		Self {
			endpoint: Url::parse(DEFAULT_ENDPOINT).unwrap(),
			min_query_len: 2,
			result_limit: 50,
			portrait_columns: 2,
			landscape_columns: 3,
			image_cache_size: 500,
			window_width: 1024,
			window_height: 768
		}
	}
}

fn deserialize_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
	D: Deserializer<'de>
{
	let text = String::deserialize(deserializer)?;
	Url::parse(&text).map_err(serde::de::Error::custom)
}

pub fn config_file() -> Option<PathBuf> {
	DIRS.as_ref().map(|dirs| dirs.config_dir().join("config.toml"))
}

impl Config {
	/// Load the config file. A missing file (or a system without a config dir) gives the defaults.
	pub fn load() -> Result<Self, ConfigError> {
		let Some(path) = config_file() else {
			return Ok(Self::default());
		};
		match fs::read_to_string(&path) {
			Ok(text) => {
				info!("load config from {path:?}");
				Self::from_toml(&text)
			},
			Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
			Err(source) => Err(ConfigError::Io { path, source })
		}
	}

	pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.endpoint.host_str().is_none() {
			return Err(ConfigError::Invalid {
				key: "endpoint",
				reason: format!("{:?} has no host", self.endpoint.as_str())
			});
		}
		for (key, value) in [
			("portrait_columns", self.portrait_columns),
			("landscape_columns", self.landscape_columns),
			("image_cache_size", self.image_cache_size)
		] {
			if value == 0 {
				return Err(ConfigError::Invalid {
					key,
					reason: "must be at least 1".to_owned()
				});
			}
		}
		if self.result_limit == 0 || self.result_limit > 50 {
			// pageimages serves at most 50 thumbnails per request
			return Err(ConfigError::Invalid {
				key: "result_limit",
				reason: format!("{} is not in 1..=50", self.result_limit)
			});
		}
		if self.image_cache_size < self.result_limit as usize {
			// a full page of thumbnails must fit, or some are evicted while still loading
			return Err(ConfigError::Invalid {
				key: "image_cache_size",
				reason: format!(
					"{} is smaller than result_limit {}",
					self.image_cache_size, self.result_limit
				)
			});
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_file_is_default() {
		assert_eq!(Config::from_toml("").unwrap(), Config::default());
	}

	#[test]
	fn partial_file_keeps_other_defaults() {
		let config = Config::from_toml(
			r#"
			endpoint = "https://de.wikipedia.org/w/api.php"
			landscape_columns = 4
			"#
		)
		.unwrap();
		assert_eq!(config.endpoint.host_str(), Some("de.wikipedia.org"));
		assert_eq!(config.landscape_columns, 4);
		assert_eq!(config.portrait_columns, 2);
		assert_eq!(config.min_query_len, 2);
	}

	#[test]
	fn rejects_bad_values() {
		assert!(matches!(
			Config::from_toml("portrait_columns = 0"),
			Err(ConfigError::Invalid {
				key: "portrait_columns",
				..
			})
		));
		assert!(matches!(
			Config::from_toml("result_limit = 51"),
			Err(ConfigError::Invalid {
				key: "result_limit",
				..
			})
		));
		assert!(matches!(
			Config::from_toml("image_cache_size = 2\nresult_limit = 3"),
			Err(ConfigError::Invalid {
				key: "image_cache_size",
				..
			})
		));
		assert!(Config::from_toml("image_cache_size = 3\nresult_limit = 3").is_ok());
		assert!(matches!(
			Config::from_toml("endpoint = \"nope\""),
			Err(ConfigError::Toml(_))
		));
		assert!(matches!(
			Config::from_toml("colour = \"red\""),
			Err(ConfigError::Toml(_))
		));
	}
}
