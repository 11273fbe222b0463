//! Radio stack trait for abstraction and testability
//!
//! This trait defines the narrow set of primitives the gauge service needs
//! from a BLE host stack, allowing the real `trouble-host` adapter to be
//! swapped with a mock for testing.

use crate::gatt::table::{AttributeHandles, ServiceDefinition};
use crate::gatt::types::{AttrHandle, ConnHandle};
use core::fmt;

/// Errors reported by the radio stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// The attribute table could not be built
    RegistrationFailed,
    /// Handle does not name an attribute this service owns
    InvalidHandle,
    /// Value does not fit the attribute's storage
    ValueTooLong,
    /// Notification could not be queued or sent
    NotifyFailed,
    /// Advertising could not be started
    AdvertiseFailed,
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            RadioError::RegistrationFailed => "service registration failed",
            RadioError::InvalidHandle => "invalid attribute handle",
            RadioError::ValueTooLong => "value too long for attribute",
            RadioError::NotifyFailed => "notification failed",
            RadioError::AdvertiseFailed => "advertising failed",
        };
        f.write_str(msg)
    }
}

/// Abstract BLE host interface
///
/// All operations complete without suspending; implementations that need to
/// do asynchronous work queue it and return.
pub trait RadioStack {
    /// Build the attribute table for `service` and return its handles
    ///
    /// Called exactly once. Description descriptors are populated from the
    /// definition's labels.
    fn register_service(
        &mut self,
        service: &ServiceDefinition,
    ) -> Result<AttributeHandles, RadioError>;

    /// Overwrite the cached value of an attribute
    fn write_attribute(&mut self, handle: AttrHandle, value: &[u8]) -> Result<(), RadioError>;

    /// Copy the cached value of an attribute into `buf`, returning its length
    fn read_attribute(&mut self, handle: AttrHandle, buf: &mut [u8]) -> Result<usize, RadioError>;

    /// Ask a connected central to re-read `handle`
    fn notify(&mut self, conn: ConnHandle, handle: AttrHandle) -> Result<(), RadioError>;

    /// (Re)start connectable advertising with raw AD payload
    fn advertise(&mut self, interval_us: u32, adv_data: &[u8]) -> Result<(), RadioError>;
}

#[cfg(test)]
pub mod mock {
    //! Mock radio stack for testing

    use super::*;
    use crate::config::ble::MAX_ADV_DATA_LEN;
    use core::cell::RefCell;
    use heapless::{FnvIndexMap, Vec};
    use trouble_host::prelude::CharacteristicProp;

    /// Largest attribute value the mock stores
    pub const MOCK_VALUE_LEN: usize = 64;

    type Value = Vec<u8, MOCK_VALUE_LEN>;

    /// Recorded advertise call
    #[derive(Debug, Clone, PartialEq)]
    pub struct Advertisement {
        pub interval_us: u32,
        pub data: Vec<u8, MAX_ADV_DATA_LEN>,
    }

    /// Mock radio stack for unit testing
    ///
    /// Assigns handles the way a real attribute table does: service
    /// declaration first, then per characteristic a declaration, the value,
    /// a CCCD when notifiable, and the user description.
    pub struct MockRadio {
        /// Attribute values by handle
        table: RefCell<FnvIndexMap<AttrHandle, Value, 32>>,
        /// Record of notifications in the order requested
        notifications: RefCell<Vec<(ConnHandle, AttrHandle), 64>>,
        /// Record of advertise calls
        advertisements: RefCell<Vec<Advertisement, 16>>,
        /// Record of every attribute write (handle, value)
        writes: RefCell<Vec<(AttrHandle, Value), 64>>,
        /// Number of register_service calls
        registrations: RefCell<usize>,
        /// Fail the next registration
        fail_registration: RefCell<bool>,
        /// Error to return on the next attribute write
        next_write_error: RefCell<Option<RadioError>>,
        /// Error to return on the next attribute read
        next_read_error: RefCell<Option<RadioError>>,
        /// Connection whose notifications always fail
        failing_conn: RefCell<Option<ConnHandle>>,
    }

    impl MockRadio {
        /// Create a new mock radio
        pub fn new() -> Self {
            Self {
                table: RefCell::new(FnvIndexMap::new()),
                notifications: RefCell::new(Vec::new()),
                advertisements: RefCell::new(Vec::new()),
                writes: RefCell::new(Vec::new()),
                registrations: RefCell::new(0),
                fail_registration: RefCell::new(false),
                next_write_error: RefCell::new(None),
                next_read_error: RefCell::new(None),
                failing_conn: RefCell::new(None),
            }
        }

        /// Make the next register_service() call fail
        pub fn fail_registration(&self) {
            *self.fail_registration.borrow_mut() = true;
        }

        /// Set an error to be returned by the next write_attribute() call
        pub fn set_next_write_error(&self, error: RadioError) {
            *self.next_write_error.borrow_mut() = Some(error);
        }

        /// Set an error to be returned by the next read_attribute() call
        pub fn set_next_read_error(&self, error: RadioError) {
            *self.next_read_error.borrow_mut() = Some(error);
        }

        /// Make every notification to `conn` fail
        pub fn fail_notifications_to(&self, conn: ConnHandle) {
            *self.failing_conn.borrow_mut() = Some(conn);
        }

        /// Simulate a central writing `value`; the stack stores it before raising the event
        pub fn central_write(&self, handle: AttrHandle, value: &[u8]) {
            let value = Value::from_slice(value).unwrap();
            self.table.borrow_mut().insert(handle, value).unwrap();
        }

        /// Current value of an attribute
        pub fn value(&self, handle: AttrHandle) -> Option<Value> {
            self.table.borrow().get(&handle).cloned()
        }

        /// Current value of an attribute as text
        pub fn text(&self, handle: AttrHandle) -> std::string::String {
            let value = self.value(handle).unwrap_or_default();
            std::string::String::from_utf8(value.to_vec()).unwrap()
        }

        /// Get all notifications
        pub fn get_notifications(&self) -> Vec<(ConnHandle, AttrHandle), 64> {
            self.notifications.borrow().clone()
        }

        /// Get all advertise calls
        pub fn get_advertisements(&self) -> Vec<Advertisement, 16> {
            self.advertisements.borrow().clone()
        }

        /// Get all attribute writes
        pub fn get_writes(&self) -> Vec<(AttrHandle, Value), 64> {
            self.writes.borrow().clone()
        }

        /// Number of register_service calls
        pub fn registrations(&self) -> usize {
            *self.registrations.borrow()
        }

        /// Forget recorded notifications, advertisements and writes
        pub fn clear_history(&self) {
            self.notifications.borrow_mut().clear();
            self.advertisements.borrow_mut().clear();
            self.writes.borrow_mut().clear();
        }
    }

    impl Default for MockRadio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RadioStack for MockRadio {
        fn register_service(
            &mut self,
            service: &ServiceDefinition,
        ) -> Result<AttributeHandles, RadioError> {
            *self.registrations.borrow_mut() += 1;
            if core::mem::take(&mut *self.fail_registration.borrow_mut()) {
                return Err(RadioError::RegistrationFailed);
            }

            let mut table = self.table.borrow_mut();
            let mut ordered = [0; 8];
            // Handle 1 is the service declaration
            let mut next: AttrHandle = 2;

            for (i, definition) in service.characteristics.iter().enumerate() {
                let value = next + 1;
                next += 2;
                if definition.has(CharacteristicProp::Notify) {
                    next += 1;
                }
                let description = next;
                next += 1;

                let label = Value::from_slice(definition.description.as_bytes())
                    .map_err(|_| RadioError::ValueTooLong)?;
                table
                    .insert(value, Value::new())
                    .map_err(|_| RadioError::RegistrationFailed)?;
                table
                    .insert(description, label)
                    .map_err(|_| RadioError::RegistrationFailed)?;

                ordered[i * 2] = value;
                ordered[i * 2 + 1] = description;
            }

            Ok(AttributeHandles::from_ordered(ordered))
        }

        fn write_attribute(&mut self, handle: AttrHandle, value: &[u8]) -> Result<(), RadioError> {
            if let Some(error) = self.next_write_error.borrow_mut().take() {
                return Err(error);
            }

            let mut table = self.table.borrow_mut();
            let slot = table.get_mut(&handle).ok_or(RadioError::InvalidHandle)?;
            let value = Value::from_slice(value).map_err(|_| RadioError::ValueTooLong)?;
            *slot = value.clone();
            let _ = self.writes.borrow_mut().push((handle, value));
            Ok(())
        }

        fn read_attribute(&mut self, handle: AttrHandle, buf: &mut [u8]) -> Result<usize, RadioError> {
            if let Some(error) = self.next_read_error.borrow_mut().take() {
                return Err(error);
            }

            let table = self.table.borrow();
            let value = table.get(&handle).ok_or(RadioError::InvalidHandle)?;
            if value.len() > buf.len() {
                return Err(RadioError::ValueTooLong);
            }
            buf[..value.len()].copy_from_slice(value);
            Ok(value.len())
        }

        fn notify(&mut self, conn: ConnHandle, handle: AttrHandle) -> Result<(), RadioError> {
            if *self.failing_conn.borrow() == Some(conn) {
                return Err(RadioError::NotifyFailed);
            }
            if !self.table.borrow().contains_key(&handle) {
                return Err(RadioError::InvalidHandle);
            }
            let _ = self.notifications.borrow_mut().push((conn, handle));
            Ok(())
        }

        fn advertise(&mut self, interval_us: u32, adv_data: &[u8]) -> Result<(), RadioError> {
            let data = Vec::from_slice(adv_data).map_err(|_| RadioError::AdvertiseFailed)?;
            let _ = self
                .advertisements
                .borrow_mut()
                .push(Advertisement { interval_us, data });
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::gatt::table::GAUGE_SERVICE;

        #[test]
        fn test_mock_handle_layout() {
            let mut radio = MockRadio::new();
            let handles = radio.register_service(&GAUGE_SERVICE).unwrap();

            assert_eq!(handles.to_ordered(), [3, 5, 7, 9, 11, 13, 15, 16]);
            assert!(handles.is_distinct());
            assert_eq!(radio.text(handles.pressure_desc), "Pressure");
            assert_eq!(
                radio.text(handles.sensor_control_desc),
                "General purpose sensor control"
            );
        }

        #[test]
        fn test_mock_write_and_read() {
            let mut radio = MockRadio::new();
            let handles = radio.register_service(&GAUGE_SERVICE).unwrap();

            radio.write_attribute(handles.pressure, b"1.5 psi").unwrap();
            let mut buf = [0u8; 16];
            let len = radio.read_attribute(handles.pressure, &mut buf).unwrap();
            assert_eq!(&buf[..len], b"1.5 psi");
        }

        #[test]
        fn test_mock_unknown_handle() {
            let mut radio = MockRadio::new();
            radio.register_service(&GAUGE_SERVICE).unwrap();

            assert_eq!(radio.write_attribute(99, b"x"), Err(RadioError::InvalidHandle));
            assert_eq!(radio.notify(1, 99), Err(RadioError::InvalidHandle));
        }

        #[test]
        fn test_mock_write_error_is_one_shot() {
            let mut radio = MockRadio::new();
            let handles = radio.register_service(&GAUGE_SERVICE).unwrap();
            radio.set_next_write_error(RadioError::InvalidHandle);

            assert_eq!(
                radio.write_attribute(handles.pressure, b"0 psi"),
                Err(RadioError::InvalidHandle)
            );
            radio.write_attribute(handles.pressure, b"0 psi").unwrap();
        }
    }
}
