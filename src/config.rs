//! Application configuration.
//!
//! Values are resolved with priority: config.toml > environment (.env) > default.

use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::path::PathBuf;

// ==================== Scheduling Constants ====================

/// Highest proficiency rung. A card reaching it leaves the schedule.
pub const MAX_LEVEL: i64 = 5;

/// Rung a card drops to after a wrong answer (the mistakes pool).
pub const MISTAKE_LEVEL: i64 = 0;

/// Materials returned per page of a listing.
pub const MATERIALS_PAGE_SIZE: i64 = 20;

// ==================== Defaults ====================

pub const DEFAULT_DATABASE_PATH: &str = "data/deckwise.db";
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
  database: Option<DatabaseSection>,
  server: Option<ServerSection>,
  schedule: Option<ScheduleSection>,
}

#[derive(Debug, Deserialize)]
struct DatabaseSection {
  path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
  addr: Option<String>,
  port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct ScheduleSection {
  utc_offset_minutes: Option<i32>,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
  pub database_path: PathBuf,
  pub server_addr: String,
  pub server_port: u16,
  /// Offset that defines the learner's calendar day.
  pub day_offset: FixedOffset,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
      server_addr: DEFAULT_SERVER_ADDR.to_string(),
      server_port: DEFAULT_SERVER_PORT,
      day_offset: utc(),
    }
  }
}

impl AppConfig {
  /// Full server bind address
  pub fn bind_addr(&self) -> String {
    format!("{}:{}", self.server_addr, self.server_port)
  }
}

pub fn utc() -> FixedOffset {
  Utc.fix()
}

/// Load configuration from `config.toml` in the working directory, then the
/// environment, then defaults.
pub fn load() -> AppConfig {
  let _ = dotenvy::dotenv();

  let file = match std::fs::read_to_string("config.toml") {
    Ok(contents) => parse_file_config(&contents),
    Err(_) => FileConfig::default(),
  };

  resolve(file, |key| std::env::var(key).ok())
}

fn parse_file_config(contents: &str) -> FileConfig {
  match toml::from_str::<FileConfig>(contents) {
    Ok(config) => config,
    Err(e) => {
      tracing::warn!("Ignoring malformed config.toml: {}", e);
      FileConfig::default()
    }
  }
}

fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> AppConfig {
  let mut config = AppConfig::default();

  // Database path
  if let Some(path) = file.database.and_then(|db| db.path) {
    tracing::info!("Using database from config.toml: {}", path);
    config.database_path = PathBuf::from(path);
  } else if let Some(path) = env("DATABASE_PATH") {
    tracing::info!("Using database from DATABASE_PATH env: {}", path);
    config.database_path = PathBuf::from(path);
  } else {
    tracing::info!(
      "Using default database path: {}",
      config.database_path.display()
    );
  }

  // Server
  let (file_addr, file_port) = match file.server {
    Some(server) => (server.addr, server.port),
    None => (None, None),
  };
  if let Some(addr) = file_addr.or_else(|| env("SERVER_ADDR")) {
    config.server_addr = addr;
  }
  if let Some(port) = file_port {
    config.server_port = port;
  } else if let Some(raw) = env("SERVER_PORT") {
    match raw.parse::<u16>() {
      Ok(port) => config.server_port = port,
      Err(_) => tracing::warn!("Invalid SERVER_PORT '{}', using {}", raw, DEFAULT_SERVER_PORT),
    }
  }

  // Calendar day offset
  let minutes = match file.schedule.and_then(|s| s.utc_offset_minutes) {
    Some(minutes) => Some(minutes),
    None => env("UTC_OFFSET_MINUTES").and_then(|raw| match raw.parse::<i32>() {
      Ok(minutes) => Some(minutes),
      Err(_) => {
        tracing::warn!("Invalid UTC_OFFSET_MINUTES '{}', using UTC", raw);
        None
      }
    }),
  };
  if let Some(minutes) = minutes {
    match minutes.checked_mul(60).and_then(FixedOffset::east_opt) {
      Some(offset) => config.day_offset = offset,
      None => tracing::warn!("UTC offset of {} minutes is out of range, using UTC", minutes),
    }
  }

  config
}
