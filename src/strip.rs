use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::StripDriver;
use crate::color::{Color, PixelBuffer};
use crate::command::{SegmentPixels, StripCommand};
use crate::config::StripConfig;
use crate::error::{Error, Result};

/// Preset value meaning "no preset".
pub const NO_PRESET: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnOff {
    On,
    Off,
}

/// Status snapshot reported to HTTP and RPC callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripStatus {
    pub strip: String,
    pub status: OnOff,
    pub chain_count: usize,
    pub preset: i32,
    pub error: Option<String>,
}

/// A named run of addressable LEDs and the state last applied to it.
pub struct Strip {
    name: String,
    initial_color: Color,
    initial_preset: i32,
    pixels: PixelBuffer,
    onoff: OnOff,
    preset: i32,
    error: Option<String>,
    /// Next single-pixel transmit must carry the whole chain.
    send_full_chain_data: bool,
    driver: Box<dyn StripDriver>,
}

impl Strip {
    /// Create a strip in the off state with a black buffer.
    pub fn new(name: impl Into<String>, config: &StripConfig, driver: Box<dyn StripDriver>) -> Self {
        Self {
            name: name.into(),
            initial_color: config.initial_color(),
            initial_preset: config.initial_preset,
            pixels: PixelBuffer::new(config.chain_count, config.color_order.component_size()),
            onoff: OnOff::Off,
            preset: config.initial_preset,
            error: None,
            send_full_chain_data: true,
            driver,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn onoff(&self) -> OnOff {
        self.onoff
    }

    #[inline]
    pub fn preset(&self) -> i32 {
        self.preset
    }

    #[inline]
    pub fn chain_count(&self) -> usize {
        self.pixels.chain_count()
    }

    #[inline]
    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Last driver error, cleared by the next successful command.
    #[inline]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn status(&self) -> StripStatus {
        StripStatus {
            strip: self.name.clone(),
            status: self.onoff,
            chain_count: self.chain_count(),
            preset: self.preset,
            error: self.error.clone(),
        }
    }

    /// Reset to the configured initial color or preset and turn on.
    pub fn initialize(&mut self) -> Result<()> {
        self.send_full_chain_data = true;
        self.onoff = OnOff::On;
        self.preset = self.initial_preset;

        if self.initial_preset >= 0 {
            self.write_color(self.initial_color, None)?;
            self.turn_on(self.initial_preset)
        } else {
            self.set_pixel(self.initial_color, None, true)
        }
    }

    /// Turn on with `preset`, or reinitialize when `preset` is negative.
    pub fn turn_on(&mut self, preset: i32) -> Result<()> {
        debug!("{}: on PRESET={preset}", self.name);
        self.onoff = OnOff::On;
        if preset < 0 {
            return self.initialize();
        }

        self.send_full_chain_data = true;
        self.preset = preset;
        self.send(&StripCommand::On { preset })
    }

    /// Turn off and clear the buffer.
    pub fn turn_off(&mut self) -> Result<()> {
        debug!("{}: off", self.name);
        self.onoff = OnOff::Off;
        self.pixels.clear();
        // A single-pixel update after this must resend everything, not just
        // that pixel.
        self.send_full_chain_data = true;
        self.send(&StripCommand::Off)
    }

    /// Set one pixel (1-based `index`) or all of them, optionally transmitting.
    pub fn set_pixel(&mut self, color: Color, index: Option<usize>, transmit: bool) -> Result<()> {
        debug!(
            "{}: R={} G={} B={} W={} INDEX={index:?} TRANSMIT={transmit}",
            self.name, color.red, color.green, color.blue, color.white
        );
        self.write_color(color, index)?;

        if !transmit {
            self.send_full_chain_data = true;
            return Ok(());
        }

        self.preset = NO_PRESET;
        let segment = match index {
            None => SegmentPixels::Range {
                start: 0,
                stop: self.chain_count(),
                color: self.pixel_vec(0),
            },
            Some(_) if self.send_full_chain_data => self.full_chain(),
            Some(index) => SegmentPixels::Single {
                offset: index - 1,
                color: self.pixel_vec(index - 1),
            },
        };

        let command = StripCommand::Pixels(segment);
        self.send(&command)?;
        // The controller now matches the buffer.
        self.send_full_chain_data = false;

        if self.onoff == OnOff::Off {
            // Controllers coming out of off ignore the first per-pixel update
            // (or apply the wrong brightness), so it goes out twice.
            self.onoff = OnOff::On;
            self.send(&command)?;
        }
        Ok(())
    }

    /// Mirror per-pixel colors reported by the printer host.
    ///
    /// Entries beyond the chain are ignored. The whole chain is transmitted
    /// if the strip is on.
    pub fn apply_color_data(&mut self, colors: &[Color]) -> Result<()> {
        for (offset, color) in colors.iter().take(self.chain_count()).enumerate() {
            self.pixels.set(offset, *color);
        }
        self.send_full_chain_data = true;

        if self.onoff == OnOff::Off {
            return Ok(());
        }
        let command = StripCommand::Pixels(self.full_chain());
        self.send(&command)?;
        self.send_full_chain_data = false;
        Ok(())
    }

    pub fn close(&mut self) {
        self.driver.close();
    }

    fn write_color(&mut self, color: Color, index: Option<usize>) -> Result<()> {
        match index {
            None => {
                self.pixels.fill(color);
                Ok(())
            }
            Some(index) => {
                if index == 0 || !self.pixels.set(index - 1, color) {
                    return Err(Error::PixelOutOfRange {
                        strip: self.name.clone(),
                        index,
                        chain_count: self.chain_count(),
                    });
                }
                Ok(())
            }
        }
    }

    fn pixel_vec(&self, offset: usize) -> Vec<u8> {
        self.pixels.pixel(offset).map(<[u8]>::to_vec).unwrap_or_default()
    }

    fn full_chain(&self) -> SegmentPixels {
        SegmentPixels::Full(self.pixels.pixels().map(<[u8]>::to_vec).collect())
    }

    fn send(&mut self, command: &StripCommand) -> Result<()> {
        match self.driver.send(command, &self.pixels) {
            Ok(()) => {
                self.error = None;
                Ok(())
            }
            Err(source) => {
                let err = Error::Driver {
                    strip: self.name.clone(),
                    source,
                };
                error!("{err}");
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for Strip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strip")
            .field("name", &self.name)
            .field("onoff", &self.onoff)
            .field("preset", &self.preset)
            .field("chain_count", &self.chain_count())
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
