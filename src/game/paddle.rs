//! Paddle input from an ultrasonic distance sensor
//!
//! Line format written by the sensor board:
//! - `<number>`: hand distance in centimetres (`23`, `23.5`)
//! - `T:1` / `T:0`: trigger pressed / released

use super::controller::MessageListener;
use crate::config::PaddleConfig;
use std::str::FromStr;
use tracing::debug;

/// One parsed sensor line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorReading {
    Distance(f32),
    Trigger(bool),
}

impl FromStr for SensorReading {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(state) = s.strip_prefix("T:").or_else(|| s.strip_prefix("t:")) {
            return match state.trim() {
                "1" => Ok(Self::Trigger(true)),
                "0" => Ok(Self::Trigger(false)),
                _ => Err(()),
            };
        }
        match s.parse::<f32>() {
            Ok(d) if d.is_finite() => Ok(Self::Distance(d)),
            _ => Err(()),
        }
    }
}

/// Game-facing paddle state
#[derive(Debug, Clone)]
pub struct PaddleInput {
    config: PaddleConfig,
    movement_force: f32,
    triggered: bool,
    connected: bool,
    last_distance: Option<f32>,
    ignored_lines: u64,
}

impl PaddleInput {
    pub fn new(config: PaddleConfig) -> Self {
        Self {
            config,
            movement_force: 0.0,
            triggered: false,
            connected: false,
            last_distance: None,
            ignored_lines: 0,
        }
    }

    /// Signed force to apply to the paddle this frame
    pub fn movement_force(&self) -> f32 {
        self.movement_force
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Last accepted distance (cm)
    pub fn last_distance(&self) -> Option<f32> {
        self.last_distance
    }

    /// Lines that were unparseable or out of the valid range
    pub fn ignored_lines(&self) -> u64 {
        self.ignored_lines
    }

    /// Map a distance to force, or `None` for an out-of-range reading
    pub fn force_for_distance(&self, distance_cm: f32) -> Option<f32> {
        let cfg = &self.config;
        if distance_cm < cfg.min_valid_cm || distance_cm > cfg.max_valid_cm {
            return None;
        }
        let offset = (distance_cm - cfg.neutral_cm) / cfg.range_cm;
        Some(offset.clamp(-1.0, 1.0) * cfg.max_force)
    }

    /// Apply one reading
    pub fn apply(&mut self, reading: SensorReading) {
        match reading {
            SensorReading::Distance(d) => match self.force_for_distance(d) {
                Some(force) => {
                    self.movement_force = force;
                    self.last_distance = Some(d);
                }
                None => {
                    self.ignored_lines += 1;
                    debug!("Distance out of range: {}", d);
                }
            },
            SensorReading::Trigger(state) => self.triggered = state,
        }
    }

    fn reset(&mut self) {
        self.movement_force = 0.0;
        self.triggered = false;
        self.last_distance = None;
    }
}

impl Default for PaddleInput {
    fn default() -> Self {
        Self::new(PaddleConfig::default())
    }
}

impl MessageListener for PaddleInput {
    fn on_message_arrived(&mut self, line: &str) {
        match line.parse::<SensorReading>() {
            Ok(reading) => self.apply(reading),
            Err(()) => {
                self.ignored_lines += 1;
                debug!("Ignoring sensor line: {:?}", line);
            }
        }
    }

    fn on_connection_event(&mut self, connected: bool) {
        self.connected = connected;
        if !connected {
            self.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_distance() {
        assert_eq!("23".parse::<SensorReading>(), Ok(SensorReading::Distance(23.0)));
        assert_eq!(" 12.5 ".parse::<SensorReading>(), Ok(SensorReading::Distance(12.5)));
    }

    #[test]
    fn test_parse_trigger() {
        assert_eq!("T:1".parse::<SensorReading>(), Ok(SensorReading::Trigger(true)));
        assert_eq!("t:0".parse::<SensorReading>(), Ok(SensorReading::Trigger(false)));
        assert_eq!("T:2".parse::<SensorReading>(), Err(()));
    }

    #[test]
    fn test_parse_garbage() {
        assert!("hello".parse::<SensorReading>().is_err());
        assert!("".parse::<SensorReading>().is_err());
        assert!("NaN".parse::<SensorReading>().is_err());
        assert!("inf".parse::<SensorReading>().is_err());
    }

    #[test]
    fn test_force_mapping() {
        let paddle = PaddleInput::default();
        // neutral 30cm, range 20cm, max force 10
        assert_eq!(paddle.force_for_distance(30.0), Some(0.0));
        assert_eq!(paddle.force_for_distance(40.0), Some(5.0));
        assert_eq!(paddle.force_for_distance(20.0), Some(-5.0));
        assert_eq!(paddle.force_for_distance(100.0), Some(10.0));
        assert_eq!(paddle.force_for_distance(5.0), Some(-10.0));
        assert_eq!(paddle.force_for_distance(1.0), None);
        assert_eq!(paddle.force_for_distance(500.0), None);
    }

    #[test]
    fn test_listener_updates_state() {
        let mut paddle = PaddleInput::default();
        paddle.on_connection_event(true);
        paddle.on_message_arrived("40");
        paddle.on_message_arrived("T:1");

        assert!(paddle.is_connected());
        assert_eq!(paddle.movement_force(), 5.0);
        assert_eq!(paddle.last_distance(), Some(40.0));
        assert!(paddle.is_triggered());
    }

    #[test]
    fn test_out_of_range_keeps_previous_force() {
        let mut paddle = PaddleInput::default();
        paddle.on_message_arrived("40");
        paddle.on_message_arrived("0");
        paddle.on_message_arrived("noise");

        assert_eq!(paddle.movement_force(), 5.0);
        assert_eq!(paddle.ignored_lines(), 2);
    }

    #[test]
    fn test_disconnect_resets_state() {
        let mut paddle = PaddleInput::default();
        paddle.on_connection_event(true);
        paddle.on_message_arrived("50");
        paddle.on_message_arrived("T:1");
        paddle.on_connection_event(false);

        assert!(!paddle.is_connected());
        assert_eq!(paddle.movement_force(), 0.0);
        assert!(!paddle.is_triggered());
        assert_eq!(paddle.last_distance(), None);
    }
}
