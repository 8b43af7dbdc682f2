//! Serialization of merged run configurations.
//!
//! The native format is the block-structured input deck:
//!
//! ```text
//! begin:control
//!   nx = 256
//!   t_end = 1.5e-12
//! end:control
//! ```
//!
//! Blocks carrying a `name` entry are keyed by it, so repeated
//! `begin:species` blocks become `species:<name>:<key>` paths. YAML and
//! canonical JSON are available for templates that need deeper nesting than
//! a deck can express.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use deckscan_core::errors::{ErrorInfo, ScanError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::serde::to_canonical_json_bytes;

/// File format used to persist per-run configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeckFormat {
    /// `begin:block` / `end:block` input deck.
    #[default]
    Deck,
    /// YAML document.
    Yaml,
    /// Key-sorted, pretty printed JSON.
    Json,
}

impl DeckFormat {
    /// Picks the format from a file extension, falling back to [`DeckFormat::Deck`].
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => DeckFormat::Yaml,
            Some("json") => DeckFormat::Json,
            _ => DeckFormat::Deck,
        }
    }

    /// Name of the configuration file written into each run directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            DeckFormat::Deck => "input.deck",
            DeckFormat::Yaml => "input.yaml",
            DeckFormat::Json => "input.json",
        }
    }

    /// Renders `config` into bytes.
    pub fn to_bytes(&self, config: &Value) -> Result<Vec<u8>, ScanError> {
        match self {
            DeckFormat::Deck => render_deck(config).map(String::into_bytes),
            DeckFormat::Yaml => serde_yaml::to_string(config)
                .map(String::into_bytes)
                .map_err(|err| serde_error("yaml-serialize", err)),
            DeckFormat::Json => to_canonical_json_bytes(config),
        }
    }

    /// Parses a configuration from raw bytes.
    pub fn from_bytes(&self, bytes: &[u8]) -> Result<Value, ScanError> {
        match self {
            DeckFormat::Deck => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|err| serde_error("deck-utf8", err))?;
                parse_deck(text)
            }
            DeckFormat::Yaml => {
                serde_yaml::from_slice(bytes).map_err(|err| serde_error("yaml-deserialize", err))
            }
            DeckFormat::Json => {
                serde_json::from_slice(bytes).map_err(|err| serde_error("json-deserialize", err))
            }
        }
    }

    /// Serializes `config` into an open sink.
    pub fn write(&self, config: &Value, sink: &mut dyn Write) -> Result<(), ScanError> {
        let bytes = self.to_bytes(config)?;
        sink.write_all(&bytes)
            .and_then(|_| sink.flush())
            .map_err(|err| ScanError::Io(ErrorInfo::new("config-write", err.to_string())))
    }

    /// Parses a configuration from a readable source.
    pub fn read(&self, source: &mut dyn Read) -> Result<Value, ScanError> {
        let mut bytes = Vec::new();
        source
            .read_to_end(&mut bytes)
            .map_err(|err| ScanError::Io(ErrorInfo::new("config-read", err.to_string())))?;
        self.from_bytes(&bytes)
    }

    /// Reads and parses the configuration file at `path`.
    pub fn read_file(&self, path: &Path) -> Result<Value, ScanError> {
        let bytes = fs::read(path).map_err(|err| ScanError::io("config-read", path, err))?;
        self.from_bytes(&bytes).map_err(|err| match err {
            ScanError::Serde(info) => ScanError::Serde(info.with_path(path)),
            other => other,
        })
    }
}

fn serde_error(code: &str, err: impl ToString) -> ScanError {
    ScanError::Serde(ErrorInfo::new(code, err.to_string()))
}

/// Entry that keys a block among its repeats, as in `species:electron:charge`.
const NAME_KEY: &str = "name";

fn deck_error(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
}

/// Renders a mapping of blocks as deck text.
///
/// A block whose values are all mappings is a set of named blocks: each child
/// is written as its own `begin:<block>` with a leading `name = <child>` entry.
pub fn render_deck(config: &Value) -> Result<String, ScanError> {
    let blocks = config.as_object().ok_or_else(|| {
        ScanError::Serde(deck_error(
            "deck-root-not-mapping",
            "deck root must be a mapping of blocks",
        ))
    })?;
    let mut text = String::new();
    for (name, block) in blocks {
        check_token(name, "block")?;
        let entries = block.as_object().ok_or_else(|| {
            ScanError::Serde(
                deck_error("deck-block-not-mapping", "deck blocks must be mappings")
                    .with_context("block", name.clone()),
            )
        })?;
        if !entries.is_empty() && entries.values().all(Value::is_object) {
            let named = entries
                .iter()
                .filter_map(|(child, fields)| Some((child, fields.as_object()?)));
            for (child, fields) in named {
                push_block(&mut text, name, Some(child.as_str()), fields)?;
            }
        } else {
            push_block(&mut text, name, None, entries)?;
        }
    }
    Ok(text)
}

fn push_block(
    text: &mut String,
    block: &str,
    child: Option<&str>,
    entries: &Map<String, Value>,
) -> Result<(), ScanError> {
    let context = |info: ErrorInfo| {
        let info = info.with_context("block", block.to_string());
        match child {
            Some(child) => info.with_context("name", child.to_string()),
            None => info,
        }
    };
    if entries.contains_key(NAME_KEY) {
        return Err(ScanError::Serde(context(
            deck_error("deck-name-entry", "`name` entries select a named block")
                .with_hint("nest the block under its name, e.g. `species: {electron: {...}}`"),
        )));
    }
    if !text.is_empty() {
        text.push('\n');
    }
    text.push_str(&format!("begin:{block}\n"));
    if let Some(child) = child {
        if child.is_empty() {
            return Err(ScanError::Serde(context(deck_error(
                "deck-invalid-string",
                "block names cannot be empty",
            ))));
        }
        let rendered = render_scalar(&Value::String(child.to_string()))
            .map_err(|info| ScanError::Serde(context(info)))?;
        text.push_str(&format!("  {NAME_KEY} = {rendered}\n"));
    }
    for (key, value) in entries {
        check_token(key, "key")?;
        let rendered = render_scalar(value)
            .map_err(|info| ScanError::Serde(context(info).with_context("key", key.clone())))?;
        text.push_str(&format!("  {key} = {rendered}\n"));
    }
    text.push_str(&format!("end:{block}\n"));
    Ok(())
}

fn check_token(token: &str, what: &str) -> Result<(), ScanError> {
    let invalid = token.trim().is_empty()
        || token.trim() != token
        || token.contains(['=', '#', ':', '\n']);
    if invalid {
        return Err(ScanError::Serde(
            deck_error("deck-invalid-name", "name cannot be written to a deck")
                .with_context(what, token.to_string()),
        ));
    }
    Ok(())
}

fn render_scalar(value: &Value) -> Result<String, ErrorInfo> {
    match value {
        Value::Bool(true) => Ok("T".to_string()),
        Value::Bool(false) => Ok("F".to_string()),
        Value::Number(number) => match number.as_f64() {
            // Debug keeps a decimal point or exponent so floats read back as floats.
            Some(float) if number.is_f64() => Ok(format!("{float:?}")),
            _ => Ok(number.to_string()),
        },
        Value::String(text) if text.contains(['#', '\n']) || text.trim() != text => Err(
            deck_error("deck-invalid-string", "string cannot be written to a deck"),
        ),
        Value::String(text) => Ok(text.clone()),
        Value::Null => Err(deck_error("deck-null", "null values are not representable")),
        Value::Array(_) | Value::Object(_) => Err(deck_error(
            "deck-nested-value",
            "deck entries must be scalars",
        )),
    }
}

/// Parses deck text into a mapping of blocks.
///
/// A block carrying a `name` entry is stored under that name,
/// `{"species": {"electron": {...}, "proton": {...}}}`, so repeated blocks stay
/// distinct. An unnamed block may appear only once.
pub fn parse_deck(text: &str) -> Result<Value, ScanError> {
    let mut root = Map::new();
    let mut open: Option<(String, Map<String, Value>)> = None;
    for (idx, raw) in text.lines().enumerate() {
        let line_no = (idx + 1).to_string();
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let parse_error =
            |code: &str, message: &str| deck_error(code, message).with_context("line", line_no.clone());
        if let Some(name) = line.strip_prefix("begin:") {
            if let Some((current, _)) = &open {
                return Err(ScanError::Serde(
                    parse_error("deck-nested-block", "block opened inside another block")
                        .with_context("block", current.clone()),
                ));
            }
            open = Some((name.trim().to_string(), Map::new()));
        } else if let Some(name) = line.strip_prefix("end:") {
            match open.take() {
                Some((current, entries)) if current == name.trim() => {
                    insert_block(&mut root, current, entries)
                        .map_err(|info| ScanError::Serde(info.with_context("line", line_no.clone())))?;
                }
                Some((current, _)) => {
                    return Err(ScanError::Serde(
                        parse_error("deck-block-mismatch", "end does not match begin")
                            .with_context("block", current),
                    ));
                }
                None => {
                    return Err(ScanError::Serde(parse_error(
                        "deck-stray-end",
                        "end without a matching begin",
                    )));
                }
            }
        } else {
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| {
                    ScanError::Serde(parse_error("deck-missing-equals", "expected `key = value`"))
                })?;
            let (_, entries) = open
                .as_mut()
                .ok_or_else(|| {
                    ScanError::Serde(parse_error("deck-key-outside-block", "entry outside any block"))
                })?;
            let (key, value) = (key.trim(), value.trim());
            let value = match key {
                NAME_KEY => Value::String(value.to_string()),
                _ => parse_scalar(value),
            };
            entries.insert(key.to_string(), value);
        }
    }
    if let Some((current, _)) = open {
        return Err(ScanError::Serde(
            deck_error("deck-unterminated-block", "block is never closed")
                .with_context("block", current),
        ));
    }
    Ok(Value::Object(root))
}

fn insert_block(
    root: &mut Map<String, Value>,
    block: String,
    mut entries: Map<String, Value>,
) -> Result<(), ErrorInfo> {
    let Some(name) = entries.remove(NAME_KEY) else {
        if root.contains_key(&block) {
            return Err(deck_error("deck-repeated-block", "unnamed block appears more than once")
                .with_context("block", block)
                .with_hint("give repeated blocks distinct `name` entries"));
        }
        root.insert(block, Value::Object(entries));
        return Ok(());
    };
    let name = match name {
        Value::String(text) => text,
        other => other.to_string(),
    };
    if name.is_empty() {
        return Err(deck_error("deck-invalid-string", "block names cannot be empty")
            .with_context("block", block));
    }
    let slot = root
        .entry(block.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    let named = match slot.as_object_mut() {
        Some(named) if named.values().all(Value::is_object) => named,
        _ => {
            return Err(deck_error("deck-repeated-block", "named and unnamed blocks share a name")
                .with_context("block", block));
        }
    };
    if named.contains_key(&name) {
        return Err(deck_error("deck-duplicate-name", "two blocks carry the same name")
            .with_context("block", block)
            .with_context("name", name));
    }
    named.insert(name, Value::Object(entries));
    Ok(())
}

fn parse_scalar(text: &str) -> Value {
    match text {
        "T" | "true" => return Value::Bool(true),
        "F" | "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(int) = text.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(uint) = text.parse::<u64>() {
        return Value::from(uint);
    }
    match text.parse::<f64>() {
        Ok(float) if float.is_finite() => Value::from(float),
        _ => Value::String(text.to_string()),
    }
}
