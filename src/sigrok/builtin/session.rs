//! Session of the built-in backend.
//!
//! The event loop polls every attached device in turn until none of them
//! has data left. Packets are fanned out to the registered callbacks in
//! registration order.

use crate::sigrok::{DatafeedCallback, Device, Packet, PacketSink, Session};
use crate::utils::error::{SrError, SrResult};
use log::debug;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct Feed {
    callbacks: RefCell<Vec<Box<dyn DatafeedCallback>>>,
}

impl PacketSink for Feed {
    fn send(&self, packet: &Packet) -> SrResult<()> {
        for callback in self.callbacks.borrow_mut().iter_mut() {
            callback.run(packet)?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct BuiltinSession {
    devices: Vec<Rc<dyn Device>>,
    feed: Rc<Feed>,
    running: bool,
}

impl BuiltinSession {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Session for BuiltinSession {
    fn add_device(&mut self, device: Rc<dyn Device>) {
        let sink: Rc<dyn PacketSink> = self.feed.clone();
        device.attach(sink);
        self.devices.push(device);
    }

    fn add_callback(&mut self, callback: Box<dyn DatafeedCallback>) {
        self.feed.callbacks.borrow_mut().push(callback);
    }

    fn start(&mut self) -> SrResult<()> {
        debug!("Starting session with {} device(s)", self.devices.len());
        for device in &self.devices {
            device.start()?;
        }
        self.running = true;
        Ok(())
    }

    fn run(&mut self) -> SrResult<()> {
        if !self.running {
            return Err(SrError::SessionNotRunning);
        }

        let mut polls: u64 = 0;
        while self.running {
            let mut active = false;
            for device in &self.devices {
                active |= device.poll()?;
            }
            polls += 1;
            if !active {
                break;
            }
        }

        debug!("Session finished after {} poll rounds", polls);
        self.running = false;
        Ok(())
    }

    fn stop(&mut self) -> SrResult<()> {
        debug!("Stopping session");
        self.running = false;
        Ok(())
    }
}
