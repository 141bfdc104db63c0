//! Event file loading
//!
//! Event files hold a parse-event stream serialized as JSON or YAML, either as a bare list
//! or as an object with an `events` list. A directory is loaded as the concatenation of its
//! event files in file name order.

use crate::events::ParseEvent;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// Serialization format of an event file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFormat {
    Json,
    Yaml,
}

impl EventFormat {
    /// Pick the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for anything other than `.json`, `.yaml` or `.yml`.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(Error::UnsupportedFormat(path.display().to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EventFile {
    List(Vec<ParseEvent>),
    Document { events: Vec<ParseEvent> },
}

impl From<EventFile> for Vec<ParseEvent> {
    fn from(file: EventFile) -> Self {
        match file {
            EventFile::List(events) | EventFile::Document { events } => events,
        }
    }
}

/// Parse an event stream from text.
///
/// # Errors
///
/// Returns [`Error::InvalidFormat`] naming `origin` when the text is not a valid event file.
pub fn parse_events(content: &str, format: EventFormat, origin: &str) -> Result<Vec<ParseEvent>> {
    let file: EventFile = match format {
        EventFormat::Json => serde_json::from_str(content)
            .map_err(|e| Error::invalid_format(origin, format!("JSON parse error: {e}")))?,
        EventFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|e| Error::invalid_format(origin, format!("YAML parse error: {e}")))?,
    };
    let events: Vec<ParseEvent> = file.into();
    trace!(origin, count = events.len(), "parsed events");
    Ok(events)
}

/// Load events from a file, or from every event file in a directory.
///
/// # Errors
///
/// Returns an error when a file cannot be read or parsed, or when `path` is a file with an
/// unsupported extension.
pub fn load_events(path: &Path) -> Result<Vec<ParseEvent>> {
    if path.is_dir() {
        let files = event_files_in(path)?;
        info!(directory = %path.display(), files = files.len(), "loading event directory");
        let mut events = Vec::new();
        for file in files {
            events.extend(load_file(&file)?);
        }
        Ok(events)
    } else {
        load_file(path)
    }
}

fn load_file(path: &Path) -> Result<Vec<ParseEvent>> {
    let format = EventFormat::from_path(path)?;
    debug!(file = %path.display(), ?format, "loading event file");
    let content = std::fs::read_to_string(path).map_err(|e| Error::io("read", path, &e))?;
    parse_events(&content, format, &path.display().to_string())
}

fn event_files_in(directory: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(directory).map_err(|e| Error::io("list", directory, &e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::io("list", directory, &e))?.path();
        if path.is_file() && EventFormat::from_path(&path).is_ok() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
