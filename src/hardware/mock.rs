use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::DriverError;
use crate::StripDriver;
use crate::color::PixelBuffer;
use crate::command::StripCommand;

#[derive(Debug, Default)]
struct Recorded {
    commands: Vec<StripCommand>,
    frame: Vec<u8>,
    fail_next: Option<String>,
    closed: bool,
}

/// In-memory driver for development hosts and tests.
///
/// Records every command it accepts and renders frames the way a local
/// strip would: black when off, the strip's buffer otherwise. Clones share
/// the same recording, so a test can keep a handle while the strip owns
/// the boxed driver.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    inner: Arc<Mutex<Recorded>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands accepted so far, oldest first.
    pub fn commands(&self) -> Vec<StripCommand> {
        self.state().commands.clone()
    }

    /// Last rendered frame.
    pub fn frame(&self) -> Vec<u8> {
        self.state().frame.clone()
    }

    /// Make the next send fail with `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.state().fail_next = Some(message.into());
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    fn state(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StripDriver for MockDriver {
    fn send(&mut self, command: &StripCommand, pixels: &PixelBuffer) -> Result<(), DriverError> {
        log::debug!("mock: {}", command.to_json());
        let mut state = self.state();
        if let Some(message) = state.fail_next.take() {
            return Err(DriverError::Update(message));
        }

        state.frame = match command {
            StripCommand::Off => vec![0; pixels.as_bytes().len()],
            _ => pixels.as_bytes().to_vec(),
        };
        state.commands.push(command.clone());
        Ok(())
    }

    fn close(&mut self) {
        self.state().closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn test_mock_driver_empty_on_creation() {
        let driver = MockDriver::new();
        assert!(driver.commands().is_empty());
        assert!(driver.frame().is_empty());
        assert!(!driver.is_closed());
    }

    #[test]
    fn test_mock_driver_renders_buffer_then_black_on_off() {
        let mut driver = MockDriver::new();
        let mut pixels = PixelBuffer::new(2, 3);
        pixels.fill(Color::new(1.0, 0.0, 0.0, 0.0));

        driver.send(&StripCommand::On { preset: 1 }, &pixels).unwrap();
        assert_eq!(driver.frame(), vec![255, 0, 0, 255, 0, 0]);

        driver.send(&StripCommand::Off, &pixels).unwrap();
        assert_eq!(driver.frame(), vec![0; 6]);
        assert_eq!(driver.commands().len(), 2);
    }

    #[test]
    fn test_mock_driver_clones_share_recording() {
        let handle = MockDriver::new();
        let mut boxed: Box<dyn StripDriver> = Box::new(handle.clone());
        boxed.send(&StripCommand::Off, &PixelBuffer::new(1, 4)).unwrap();
        boxed.close();

        assert_eq!(handle.commands(), vec![StripCommand::Off]);
        assert!(handle.is_closed());
    }

    #[test]
    fn test_mock_driver_fail_next_fails_once() {
        let mut driver = MockDriver::new();
        let pixels = PixelBuffer::new(1, 4);
        driver.fail_next("bus fault");

        assert_eq!(
            driver.send(&StripCommand::Off, &pixels),
            Err(DriverError::Update("bus fault".to_string()))
        );
        assert!(driver.commands().is_empty());
        assert!(driver.send(&StripCommand::Off, &pixels).is_ok());
    }
}
