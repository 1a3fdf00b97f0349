pub mod api;
pub mod color;
pub mod command;
pub mod config;
pub mod error;
pub mod hardware;
pub mod manager;
pub mod strip;

pub use error::{Error, Result};

/// Trait for pushing strip commands to LED hardware.
///
/// Abstracts over the local WS281x driver (Raspberry Pi) and the in-memory
/// mock, providing a uniform interface for [`strip::Strip`].
pub trait StripDriver: Send {
    /// Apply `command` to the strip.
    ///
    /// `pixels` is the strip's buffer after the command's state change, so
    /// drivers that render locally can ignore the segment payload and draw
    /// the whole chain.
    fn send(
        &mut self,
        command: &command::StripCommand,
        pixels: &color::PixelBuffer,
    ) -> Result<(), hardware::DriverError>;

    /// Release hardware resources at shutdown.
    fn close(&mut self) {}
}
