//! Mock connector and port for driving the serial worker without hardware

#![allow(dead_code)]

use paddle_bridge::error::{BridgeError, Result};
use paddle_bridge::transport::Connector;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Read poll interval of the mock port (stands in for the serial read timeout)
const MOCK_READ_TIMEOUT: Duration = Duration::from_millis(5);

/// Scripted behaviour of the next `read()` call
pub enum Step {
    Data(Vec<u8>),
    /// Fatal I/O error
    Fail,
    /// Zero-byte read
    Eof,
}

/// In-memory port fed through a channel
pub struct MockPort {
    rx: mpsc::Receiver<Step>,
    written: Arc<Mutex<Vec<u8>>>,
    released: Arc<AtomicBool>,
    broken_writes: Arc<AtomicBool>,
}

/// Test-side handle of a `MockPort`
#[derive(Clone)]
pub struct PortHandle {
    tx: mpsc::Sender<Step>,
    written: Arc<Mutex<Vec<u8>>>,
    released: Arc<AtomicBool>,
    broken_writes: Arc<AtomicBool>,
}

pub fn mock_port() -> (MockPort, PortHandle) {
    let (tx, rx) = mpsc::channel();
    let written = Arc::new(Mutex::new(Vec::new()));
    let released = Arc::new(AtomicBool::new(false));
    let broken_writes = Arc::new(AtomicBool::new(false));
    (
        MockPort {
            rx,
            written: written.clone(),
            released: released.clone(),
            broken_writes: broken_writes.clone(),
        },
        PortHandle {
            tx,
            written,
            released,
            broken_writes,
        },
    )
}

impl PortHandle {
    pub fn send(&self, data: &str) {
        let _ = self.tx.send(Step::Data(data.as_bytes().to_vec()));
    }

    pub fn fail(&self) {
        let _ = self.tx.send(Step::Fail);
    }

    pub fn eof(&self) {
        let _ = self.tx.send(Step::Eof);
    }

    /// Make every later `write()` fail
    pub fn break_writes(&self) {
        self.broken_writes.store(true, Ordering::SeqCst);
    }

    pub fn written(&self) -> String {
        String::from_utf8_lossy(&self.written.lock().unwrap()).into_owned()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl Read for MockPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.rx.recv_timeout(MOCK_READ_TIMEOUT) {
            Ok(Step::Data(data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Ok(n)
            }
            Ok(Step::Fail) => Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged")),
            Ok(Step::Eof) => Ok(0),
            Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "no data")),
        }
    }
}

impl Write for MockPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.broken_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "write failed"));
        }
        self.written.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for MockPort {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Connector handing out scripted ports; fails once the script is exhausted
pub struct MockConnector {
    script: VecDeque<Option<MockPort>>,
    attempts: Arc<Mutex<Vec<Instant>>>,
}

impl MockConnector {
    /// `None` entries make that attempt fail
    pub fn new(script: Vec<Option<MockPort>>) -> Self {
        Self {
            script: script.into(),
            attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn single(port: MockPort) -> Self {
        Self::new(vec![Some(port)])
    }

    pub fn always_failing() -> Self {
        Self::new(Vec::new())
    }

    /// Instants of every `connect()` call
    pub fn attempts(&self) -> Arc<Mutex<Vec<Instant>>> {
        self.attempts.clone()
    }
}

impl Connector for MockConnector {
    type Port = MockPort;

    fn connect(&mut self) -> Result<MockPort> {
        self.attempts.lock().unwrap().push(Instant::now());
        match self.script.pop_front() {
            Some(Some(port)) => Ok(port),
            _ => Err(BridgeError::NoDeviceFound),
        }
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

/// Poll `condition` until true or `timeout` elapses
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}
