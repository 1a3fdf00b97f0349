use serde_json::{Value, json};

/// Pixel payload of a segment update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentPixels {
    /// Pixels `start..stop` all set to one color.
    Range {
        start: usize,
        stop: usize,
        color: Vec<u8>,
    },
    /// The whole chain, pixel by pixel.
    Full(Vec<Vec<u8>>),
    /// One pixel at a zero-based offset.
    Single { offset: usize, color: Vec<u8> },
}

/// Command a strip issues to its driver.
///
/// Mirrors the JSON state protocol of networked LED controllers, so a
/// driver can either forward [`StripCommand::to_json`] verbatim or
/// interpret the command against the strip's pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StripCommand {
    /// Power on and play a controller preset.
    On { preset: i32 },
    /// Power off.
    Off,
    /// Power on with explicit pixel colors.
    Pixels(SegmentPixels),
}

impl StripCommand {
    /// Render as controller JSON state.
    pub fn to_json(&self) -> Value {
        match self {
            Self::On { preset } => json!({ "on": true, "ps": preset }),
            Self::Off => json!({ "on": false }),
            Self::Pixels(pixels) => {
                let data = match pixels {
                    SegmentPixels::Range { start, stop, color } => json!([start, stop, color]),
                    SegmentPixels::Full(colors) => json!(colors),
                    SegmentPixels::Single { offset, color } => json!([offset, color]),
                };
                json!({
                    "on": true,
                    "tt": 0,
                    "bri": 255,
                    "seg": { "bri": 255, "i": data },
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_carries_preset() {
        let cmd = StripCommand::On { preset: 3 };
        assert_eq!(cmd.to_json(), json!({ "on": true, "ps": 3 }));
    }

    #[test]
    fn off_is_bare() {
        assert_eq!(StripCommand::Off.to_json(), json!({ "on": false }));
    }

    #[test]
    fn range_segment() {
        let cmd = StripCommand::Pixels(SegmentPixels::Range {
            start: 0,
            stop: 10,
            color: vec![255, 0, 0, 0],
        });
        assert_eq!(
            cmd.to_json(),
            json!({
                "on": true,
                "tt": 0,
                "bri": 255,
                "seg": { "bri": 255, "i": [0, 10, [255, 0, 0, 0]] },
            })
        );
    }

    #[test]
    fn full_segment_lists_every_pixel() {
        let cmd = StripCommand::Pixels(SegmentPixels::Full(vec![
            vec![1, 2, 3],
            vec![4, 5, 6],
        ]));
        assert_eq!(cmd.to_json()["seg"]["i"], json!([[1, 2, 3], [4, 5, 6]]));
    }

    #[test]
    fn single_segment_uses_zero_based_offset() {
        let cmd = StripCommand::Pixels(SegmentPixels::Single {
            offset: 4,
            color: vec![0, 0, 255],
        });
        assert_eq!(cmd.to_json()["seg"]["i"], json!([4, [0, 0, 255]]));
    }
}
