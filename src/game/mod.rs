//! Game side of the bridge
//!
//! - `SerialController` polls the bridge once per frame and dispatches to a
//!   `MessageListener`
//! - `PaddleInput` turns sensor lines into paddle force and trigger state
//! - `run_frame_loop` drives the controller at a fixed tick rate

pub mod controller;
pub mod frame;
pub mod paddle;

pub use controller::{MessageListener, SerialController};
pub use frame::run_frame_loop;
pub use paddle::{PaddleInput, SensorReading};
