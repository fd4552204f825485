//! Device service: owns the engine lifecycle.
//!
//! ```text
//! Uninitialized ──start()──▶ Initializing ──ok──▶ Servicing (loops forever)
//!                                  │
//!                                  └──err──▶ Faulted
//! ```
//!
//! On success the running device is published into the shared
//! [`HandleSlot`]; on failure nothing is published and the error goes
//! back to the caller, which treats it as fatal.

use embassy_sync::once_lock::OnceLock;

use crate::descriptor::DescriptorSet;
use crate::engine::UsbDeviceEngine;
use crate::error::Error;

/// Write-once slot the running device is published into.
///
/// Readers on the other core poll it with `try_get`, which never blocks.
pub type HandleSlot<D> = OnceLock<&'static D>;

/// Lifecycle of the device service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServiceState {
    Uninitialized,
    Initializing,
    Servicing,
    Faulted,
}

pub struct DeviceService<E: UsbDeviceEngine> {
    engine: E,
    slot: &'static HandleSlot<E::Device>,
    device: Option<&'static E::Device>,
    state: ServiceState,
}

impl<E: UsbDeviceEngine> DeviceService<E> {
    pub fn new(engine: E, slot: &'static HandleSlot<E::Device>) -> Self {
        Self {
            engine,
            slot,
            device: None,
            state: ServiceState::Uninitialized,
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Initialise the engine and publish the device.
    ///
    /// Only valid from `Uninitialized`. Once running, calling it again
    /// returns the published device without touching the engine; once
    /// faulted it keeps failing with `AlreadyPublished`.
    pub fn start(
        &mut self,
        config: &E::Config,
        descriptors: &'static DescriptorSet,
    ) -> Result<&'static E::Device, Error> {
        match self.state {
            ServiceState::Uninitialized => {}
            ServiceState::Servicing => return self.device.ok_or(Error::AlreadyPublished),
            ServiceState::Initializing | ServiceState::Faulted => {
                return Err(Error::AlreadyPublished)
            }
        }

        self.state = ServiceState::Initializing;
        info!(
            "USB engine init: {} interfaces, {} config bytes",
            descriptors.configuration.num_interfaces(),
            descriptors.configuration.as_bytes().len()
        );

        let device = match self.engine.init(config, descriptors) {
            Ok(device) => device,
            Err(e) => {
                error!("USB engine init failed: {}", e);
                self.state = ServiceState::Faulted;
                return Err(e);
            }
        };

        if self.slot.init(device).is_err() {
            error!("USB device handle already published");
            self.state = ServiceState::Faulted;
            return Err(Error::AlreadyPublished);
        }

        self.device = Some(device);
        self.state = ServiceState::Servicing;
        info!("USB engine running, device handle published");
        Ok(device)
    }

    /// One pass of engine servicing. No-op unless `Servicing`.
    pub fn service_once(&mut self) {
        if let Some(device) = self.device {
            self.engine.service(device);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{InEndpoint, UsbDevice};
    use crate::error::EngineInitError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullEndpoint;

    impl InEndpoint for NullEndpoint {
        fn submit_report(&self, _report: &[u8]) {}
    }

    #[derive(Debug)]
    struct FakeDevice {
        serviced: AtomicUsize,
    }

    impl UsbDevice for FakeDevice {
        type Endpoint = NullEndpoint;

        fn endpoint(&self, _index: u8) -> Option<&NullEndpoint> {
            None
        }
    }

    struct FakeEngine {
        fail: Option<EngineInitError>,
        inits: usize,
    }

    impl UsbDeviceEngine for FakeEngine {
        type Config = ();
        type Device = FakeDevice;

        fn init(
            &mut self,
            _config: &(),
            _descriptors: &'static DescriptorSet,
        ) -> Result<&'static FakeDevice, Error> {
            self.inits += 1;
            match self.fail {
                Some(e) => Err(e.into()),
                None => Ok(Box::leak(Box::new(FakeDevice {
                    serviced: AtomicUsize::new(0),
                }))),
            }
        }

        fn service(&mut self, device: &FakeDevice) {
            device.serviced.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn descriptors() -> &'static DescriptorSet {
        Box::leak(Box::new(DescriptorSet::composite().unwrap()))
    }

    fn slot() -> &'static HandleSlot<FakeDevice> {
        Box::leak(Box::new(HandleSlot::new()))
    }

    #[test]
    fn successful_start_publishes_and_services() {
        let slot = slot();
        let mut service = DeviceService::new(FakeEngine { fail: None, inits: 0 }, slot);
        assert_eq!(service.state(), ServiceState::Uninitialized);

        let device = service.start(&(), descriptors()).unwrap();
        assert_eq!(service.state(), ServiceState::Servicing);
        assert!(core::ptr::eq(*slot.try_get().unwrap(), device));

        for _ in 0..3 {
            service.service_once();
        }
        assert_eq!(device.serviced.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn failed_start_is_fatal_and_publishes_nothing() {
        let slot = slot();
        let engine = FakeEngine {
            fail: Some(EngineInitError::PeripheralBusy),
            inits: 0,
        };
        let mut service = DeviceService::new(engine, slot);

        let err = service.start(&(), descriptors()).unwrap_err();
        assert_eq!(err, Error::EngineInit(EngineInitError::PeripheralBusy));
        assert_eq!(service.state(), ServiceState::Faulted);
        assert!(slot.try_get().is_none());

        // Servicing a faulted service never reaches the engine.
        service.service_once();
        assert!(service.start(&(), descriptors()).is_err());
        assert_eq!(service.engine.inits, 1);
    }

    #[test]
    fn service_before_start_is_noop() {
        let mut service = DeviceService::new(FakeEngine { fail: None, inits: 0 }, slot());
        service.service_once();
        assert_eq!(service.state(), ServiceState::Uninitialized);
        assert_eq!(service.engine.inits, 0);
    }

    #[test]
    fn restart_returns_existing_device() {
        let mut service = DeviceService::new(FakeEngine { fail: None, inits: 0 }, slot());
        let first = service.start(&(), descriptors()).unwrap();
        let second = service.start(&(), descriptors()).unwrap();
        assert!(core::ptr::eq(first, second));
        assert_eq!(service.engine.inits, 1);
    }

    #[test]
    fn occupied_slot_faults_the_service() {
        static SQUATTER: FakeDevice = FakeDevice {
            serviced: AtomicUsize::new(0),
        };
        let slot = slot();
        assert!(slot.init(&SQUATTER).is_ok());

        let mut service = DeviceService::new(FakeEngine { fail: None, inits: 0 }, slot);
        assert_eq!(
            service.start(&(), descriptors()).unwrap_err(),
            Error::AlreadyPublished
        );
        assert_eq!(service.state(), ServiceState::Faulted);
        assert!(core::ptr::eq(*slot.try_get().unwrap(), &SQUATTER));
    }
}
