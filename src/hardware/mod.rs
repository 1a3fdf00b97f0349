mod mock;

#[cfg(feature = "rpi")]
mod rpi;

pub use mock::MockDriver;

#[cfg(feature = "rpi")]
pub use rpi::Ws281xDriver;

use crate::StripDriver;
use crate::config::{DriverKind, StripConfig};

/// Error types for LED driver operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    #[error("LED driver initialization failed: {0}")]
    Init(String),
    #[error("LED update failed: {0}")]
    Update(String),
}

/// Open the driver a strip is configured for.
pub fn open(name: &str, config: &StripConfig) -> Result<Box<dyn StripDriver>, DriverError> {
    match config.driver {
        DriverKind::Mock => {
            log::info!("strip {name}: using in-memory driver");
            Ok(Box::new(MockDriver::new()))
        }
        #[cfg(feature = "rpi")]
        DriverKind::Ws281x => {
            log::info!(
                "strip {name}: ws281x on GPIO {} (dma {}, {} pixels)",
                config.pin,
                config.dma,
                config.chain_count
            );
            Ok(Box::new(Ws281xDriver::new(config)?))
        }
        #[cfg(not(feature = "rpi"))]
        DriverKind::Ws281x => Err(DriverError::Init(
            "ws281x support not compiled in (enable the `rpi` feature)".to_string(),
        )),
    }
}
