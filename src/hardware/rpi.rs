use ws281x::Strip;

use super::DriverError;
use crate::StripDriver;
use crate::color::{ColorOrder, PixelBuffer};
use crate::command::StripCommand;
use crate::config::StripConfig;

/// WS281x strip driven through rpi_ws281x (PWM/PCM + DMA).
///
/// The strip is rendered from the pixel buffer on every command. Presets
/// belong to networked controllers, so an `On` command renders the current
/// buffer; `Off` renders black.
pub struct Ws281xDriver {
    handle: ws281x::handle::Handle,
}

// SAFETY: rpi_ws281x keeps no thread-local state; the handle is only touched
// through `&mut self`, which the owning strip's mutex serializes.
unsafe impl Send for Ws281xDriver {}

/// rpi_ws281x strip type for a color order.
///
/// The library only knows RGB permutations with white, if any, last.
fn strip_type(order: &ColorOrder) -> Option<Strip> {
    let strip = match order.to_string().as_str() {
        "RGB" => Strip::RGB,
        "RBG" => Strip::RBG,
        "GRB" => Strip::GRB,
        "GBR" => Strip::GBR,
        "BRG" => Strip::BRG,
        "BGR" => Strip::BGR,
        "RGBW" => Strip::RGBW,
        "RBGW" => Strip::RBGW,
        "GRBW" => Strip::GRBW,
        "GBRW" => Strip::GBRW,
        "BRGW" => Strip::BRGW,
        "BGRW" => Strip::BGRW,
        _ => return None,
    };
    Some(strip)
}

/// Pack a logical RGB(W) pixel as `0xWWRRGGBB`.
///
/// rpi_ws281x reorders the components for the configured strip type.
fn pack(pixel: &[u8]) -> u32 {
    let component = |index: usize| pixel.get(index).copied().unwrap_or(0);
    u32::from_be_bytes([component(3), component(0), component(1), component(2)])
}

impl Ws281xDriver {
    pub fn new(config: &StripConfig) -> Result<Self, DriverError> {
        let strip = strip_type(&config.color_order).ok_or_else(|| {
            DriverError::Init(format!(
                "color order {} is not supported by rpi_ws281x",
                config.color_order
            ))
        })?;

        let channel = ws281x::channel::new()
            .pin(config.pin)
            .count(config.chain_count)
            .brightness(i32::from(config.brightness))
            .strip(strip)
            .build()
            .map_err(|e| DriverError::Init(format!("{e:?}")))?;

        let handle = ws281x::handle::new()
            .dma(config.dma)
            .channel(0, channel)
            .build()
            .map_err(|e| DriverError::Init(format!("{e:?}")))?;

        Ok(Self { handle })
    }
}

impl StripDriver for Ws281xDriver {
    fn send(&mut self, command: &StripCommand, pixels: &PixelBuffer) -> Result<(), DriverError> {
        log::debug!("ws281x: {}", command.to_json());
        if let StripCommand::On { preset } = command {
            log::debug!("ws281x: preset {preset} not playable locally, rendering buffer");
        }

        let words: Vec<u32> = match command {
            StripCommand::Off => vec![0; pixels.chain_count()],
            _ => pixels.pixels().map(pack).collect(),
        };

        for (led, word) in self
            .handle
            .channel_mut(0)
            .leds_mut()
            .iter_mut()
            .zip(words)
        {
            *led = word;
        }

        self.handle
            .render()
            .map_err(|e| DriverError::Update(format!("{e:?}")))?;
        self.handle
            .wait()
            .map_err(|e| DriverError::Update(format!("{e:?}")))
    }
}
