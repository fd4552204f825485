//! Report injection: one keyboard report per tick.
//!
//! A polling producer. Each tick checks whether the device is up and
//! its keyboard endpoint is ready, and if so submits a report with a
//! single key held. There is no acknowledgement from the host; if it is
//! not polling, reports are overwritten or dropped by the engine.

use crate::engine::{InEndpoint, UsbDevice};
use crate::hid::keyboard::KeyboardReport;
use crate::service::HandleSlot;

/// What happened on one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Device handle not yet published.
    NotReady,
    /// Device up but the endpoint is not available.
    NoEndpoint,
    /// Report handed to the endpoint buffer.
    Submitted,
}

pub struct ReportInjector {
    endpoint_index: u8,
    report: [u8; crate::hid::keyboard::KEYBOARD_REPORT_SIZE],
    submitted: u32,
}

impl ReportInjector {
    /// Injector holding `keycode` down on the endpoint with logical
    /// index `endpoint_index`.
    pub const fn new(endpoint_index: u8, keycode: u8) -> Self {
        Self {
            endpoint_index,
            report: KeyboardReport::single_key(keycode).to_bytes(),
            submitted: 0,
        }
    }

    /// Reports submitted so far.
    pub fn submitted(&self) -> u32 {
        self.submitted
    }

    /// Run one tick. Never blocks.
    pub fn tick<D: UsbDevice>(&mut self, slot: &HandleSlot<D>) -> TickOutcome {
        let Some(&device) = slot.try_get() else {
            debug!("inject: device not ready");
            return TickOutcome::NotReady;
        };
        let Some(endpoint) = device.endpoint(self.endpoint_index) else {
            debug!("inject: endpoint {} unavailable", self.endpoint_index);
            return TickOutcome::NoEndpoint;
        };

        endpoint.submit_report(&self.report);
        self.submitted = self.submitted.wrapping_add(1);
        info!("keyboard pressed!");
        TickOutcome::Submitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::keyboard::KEY_A;
    use std::sync::Mutex;
    use std::vec::Vec;

    #[derive(Default)]
    struct RecordingEndpoint {
        reports: Mutex<Vec<Vec<u8>>>,
    }

    impl InEndpoint for RecordingEndpoint {
        fn submit_report(&self, report: &[u8]) {
            self.reports.lock().unwrap().push(report.to_vec());
        }
    }

    struct Device {
        keyboard: Option<RecordingEndpoint>,
    }

    impl UsbDevice for Device {
        type Endpoint = RecordingEndpoint;

        fn endpoint(&self, index: u8) -> Option<&RecordingEndpoint> {
            match index {
                1 => self.keyboard.as_ref(),
                _ => None,
            }
        }
    }

    fn leak<T>(v: T) -> &'static T {
        Box::leak(Box::new(v))
    }

    #[test]
    fn unset_handle_is_a_noop() {
        let slot: &HandleSlot<Device> = leak(HandleSlot::new());
        let mut injector = ReportInjector::new(1, KEY_A);
        for _ in 0..5 {
            assert_eq!(injector.tick(slot), TickOutcome::NotReady);
        }
        assert_eq!(injector.submitted(), 0);
    }

    #[test]
    fn missing_endpoint_skips_tick() {
        let slot = leak(HandleSlot::new());
        assert!(slot.init(leak(Device { keyboard: None })).is_ok());
        let mut injector = ReportInjector::new(1, KEY_A);
        assert_eq!(injector.tick(slot), TickOutcome::NoEndpoint);
        assert_eq!(injector.submitted(), 0);
    }

    #[test]
    fn ready_device_receives_single_key_report() {
        let slot = leak(HandleSlot::new());
        let device = leak(Device {
            keyboard: Some(RecordingEndpoint::default()),
        });
        assert!(slot.init(device).is_ok());

        let mut injector = ReportInjector::new(1, KEY_A);
        assert_eq!(injector.tick(slot), TickOutcome::Submitted);
        assert_eq!(injector.tick(slot), TickOutcome::Submitted);

        let reports = device.keyboard.as_ref().unwrap().reports.lock().unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0], [0, 0, KEY_A, 0, 0, 0, 0, 0]);
        assert_eq!(injector.submitted(), 2);
    }

    #[test]
    fn wrong_endpoint_index_never_submits() {
        let slot = leak(HandleSlot::new());
        let device = leak(Device {
            keyboard: Some(RecordingEndpoint::default()),
        });
        assert!(slot.init(device).is_ok());

        let mut injector = ReportInjector::new(2, KEY_A);
        assert_eq!(injector.tick(slot), TickOutcome::NoEndpoint);
        assert!(device.keyboard.as_ref().unwrap().reports.lock().unwrap().is_empty());
    }

    #[test]
    fn publication_from_another_core_is_picked_up() {
        let slot: &'static HandleSlot<Device> = leak(HandleSlot::new());
        let device = leak(Device {
            keyboard: Some(RecordingEndpoint::default()),
        });

        let reader = std::thread::spawn(move || {
            let mut injector = ReportInjector::new(1, KEY_A);
            while injector.tick(slot) == TickOutcome::NotReady {
                std::thread::yield_now();
            }
            injector.submitted()
        });
        assert!(slot.init(device).is_ok());

        assert_eq!(reader.join().unwrap(), 1);
        assert_eq!(device.keyboard.as_ref().unwrap().reports.lock().unwrap().len(), 1);
    }
}
