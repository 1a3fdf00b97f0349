use std::collections::BTreeMap;
use std::str::FromStr;

use log::{error, info, warn};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::color::Color;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::hardware;
use crate::strip::{NO_PRESET, OnOff, Strip, StripStatus};

/// Request understood by the strip endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Status,
    On,
    Off,
    Toggle,
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "status" => Ok(Self::Status),
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "toggle" => Ok(Self::Toggle),
            _ => Err(Error::UnsupportedRequest(s.to_string())),
        }
    }
}

/// One entry of a batch response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Status(StripStatus),
    Missing { error: &'static str },
}

impl BatchEntry {
    pub const MISSING: Self = Self::Missing {
        error: "strip_not_found",
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StripList {
    pub strips: BTreeMap<String, StripStatus>,
}

/// Interpret a remote `state` argument.
///
/// Booleans map directly; strings accept `on`/`off`/`true`/`false` in any
/// case. Anything else is unparsed.
pub fn parse_state(state: &Value) -> Option<OnOff> {
    match state {
        Value::Bool(true) => Some(OnOff::On),
        Value::Bool(false) => Some(OnOff::Off),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "on" | "true" => Some(OnOff::On),
            "off" | "false" => Some(OnOff::Off),
            _ => None,
        },
        _ => None,
    }
}

/// Parse per-pixel colors from a host `color_data` array.
///
/// Entries are either channel dictionaries (`{"R": .., "G": ..}`) or
/// positional `[r, g, b, w]` lists; missing channels are 0.
fn parse_color_data(entries: &[Value]) -> Vec<Color> {
    let channel = |entry: &Value, letter: &str, position: usize| {
        let value = match entry {
            Value::Object(map) => map.get(letter),
            Value::Array(list) => list.get(position),
            _ => None,
        };
        value.and_then(Value::as_f64).unwrap_or(0.0)
    };

    entries
        .iter()
        .map(|entry| {
            Color::new(
                channel(entry, "R", 0),
                channel(entry, "G", 1),
                channel(entry, "B", 2),
                channel(entry, "W", 3),
            )
        })
        .collect()
}

/// Fans HTTP and RPC calls out to strips by name.
///
/// Every operation holds the strip's lock across buffer mutation and the
/// driver call, so concurrent callers are serialized per strip.
#[derive(Debug, Default)]
pub struct StripManager {
    strips: BTreeMap<String, Mutex<Strip>>,
}

impl StripManager {
    pub fn new(strips: impl IntoIterator<Item = Strip>) -> Self {
        Self {
            strips: strips
                .into_iter()
                .map(|strip| (strip.name().to_string(), Mutex::new(strip)))
                .collect(),
        }
    }

    /// Open a driver for every configured strip.
    pub fn from_config(config: &Config) -> Result<Self> {
        info!(
            "loading strips: {:?}",
            config.strips.keys().collect::<Vec<_>>()
        );
        let strips = config
            .strips
            .iter()
            .map(|(name, strip_config)| {
                let driver =
                    hardware::open(name, strip_config).map_err(|source| Error::Driver {
                        strip: name.clone(),
                        source,
                    })?;
                Ok(Strip::new(name.as_str(), strip_config, driver))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(strips))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.strips.keys().map(String::as_str)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.strips.contains_key(name)
    }

    fn strip(&self, name: &str) -> Result<&Mutex<Strip>> {
        self.strips
            .get(name)
            .ok_or_else(|| Error::StripNotFound(name.to_string()))
    }

    /// Bring every strip to its initial state. Failures are logged only.
    pub async fn initialize_all(&self) {
        for (name, strip) in &self.strips {
            if let Err(e) = strip.lock().await.initialize() {
                error!("failed to initialize strip {name}: {e}");
            }
        }
    }

    pub async fn list_strips(&self) -> StripList {
        let mut strips = BTreeMap::new();
        for (name, strip) in &self.strips {
            strips.insert(name.clone(), strip.lock().await.status());
        }
        StripList { strips }
    }

    /// Remote method: switch a strip on or off.
    ///
    /// `preset` is ignored when turning off. An unparsed state without a
    /// preset, or an unknown strip, is logged and ignored.
    pub async fn set_state(&self, strip: &str, state: &Value, preset: i32) -> Result<()> {
        let status = parse_state(state);
        if status.is_none() && preset == NO_PRESET {
            info!("Invalid state received but no preset passed: {state}");
            return Ok(());
        }

        let Ok(strip) = self.strip(strip) else {
            info!("Unknown strip: {strip}");
            return Ok(());
        };

        let mut strip = strip.lock().await;
        match status {
            Some(OnOff::Off) => strip.turn_off(),
            _ => strip.turn_on(preset),
        }
    }

    /// Remote method: set one pixel (1-based) or all pixels.
    ///
    /// A negative `index` means all pixels. An unknown strip is logged and
    /// ignored.
    pub async fn set_pixel(
        &self,
        strip: &str,
        color: Color,
        index: Option<i64>,
        transmit: bool,
    ) -> Result<()> {
        let Ok(strip) = self.strip(strip) else {
            info!("Unknown strip: {strip}");
            return Ok(());
        };

        let index = index
            .filter(|i| *i >= 0)
            .map(|i| usize::try_from(i).unwrap_or(usize::MAX));
        strip.lock().await.set_pixel(color, index, transmit)
    }

    /// Status of a single strip.
    pub async fn strip_status(&self, name: &str) -> Result<StripStatus> {
        Ok(self.strip(name)?.lock().await.status())
    }

    /// Apply `on`, `off` or `toggle` to a single strip.
    pub async fn strip_action(&self, name: &str, action: &str, preset: i32) -> Result<StripStatus> {
        let strip = self.strip(name)?;
        let action = match action.parse::<Action>() {
            Ok(action @ (Action::On | Action::Off | Action::Toggle)) => action,
            _ => return Err(Error::InvalidAction(action.to_ascii_lowercase())),
        };
        let mut strip = strip.lock().await;
        process_request(&mut strip, action, preset)
    }

    /// Apply `action` to each named strip.
    ///
    /// Unknown names are reported inline and do not abort the batch.
    pub async fn batch_request<S: AsRef<str>>(
        &self,
        names: &[S],
        action: Action,
    ) -> Result<BTreeMap<String, BatchEntry>> {
        if names.is_empty() {
            return Err(Error::NoArguments);
        }

        let mut result = BTreeMap::new();
        for name in names {
            let name = name.as_ref();
            let entry = match self.strips.get(name) {
                Some(strip) => {
                    let mut strip = strip.lock().await;
                    BatchEntry::Status(process_request(&mut strip, action, NO_PRESET)?)
                }
                None => BatchEntry::MISSING,
            };
            result.insert(name.to_string(), entry);
        }
        Ok(result)
    }

    /// Mirror `neopixel <name>` color data from a host status snapshot.
    ///
    /// A failing strip does not stop the others; the first error is returned.
    pub async fn handle_status_update(&self, snapshot: &Value) -> Result<()> {
        let Some(objects) = snapshot.as_object() else {
            warn!("ignoring status update that is not an object");
            return Ok(());
        };

        let mut first_error = None;
        for (name, strip) in &self.strips {
            let color_data = objects
                .get(&format!("neopixel {name}"))
                .and_then(|object| object.get("color_data"))
                .and_then(Value::as_array);
            let Some(entries) = color_data else {
                continue;
            };

            let colors = parse_color_data(entries);
            if let Err(e) = strip.lock().await.apply_color_data(&colors) {
                warn!("failed to mirror status update on strip {name}: {e}");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub async fn close(&self) {
        for strip in self.strips.values() {
            strip.lock().await.close();
        }
    }
}

fn process_request(strip: &mut Strip, action: Action, preset: i32) -> Result<StripStatus> {
    let action = match action {
        Action::Status => return Ok(strip.status()),
        Action::Toggle if strip.onoff() == OnOff::Off => Action::On,
        Action::Toggle => Action::Off,
        other => other,
    };

    match action {
        Action::On => strip.turn_on(preset)?,
        _ => strip.turn_off()?,
    }
    Ok(strip.status())
}
