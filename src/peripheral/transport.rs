#![allow(dead_code)]
use async_trait::async_trait;

use super::address::MacAddress;
use super::error::LinkError;

/// UART-style service the pointer device exposes, and its writable
/// characteristic.
pub const SERVICE_UUID: &str = "6E400001-B5A3-F393-E0A9-E50E24DCCA9E";
pub const WRITE_CHAR_UUID: &str = "6E400002-B5A3-F393-E0A9-E50E24DCCA9E";

/// Seam to the platform wireless stack. Implementations own the real
/// adapter; the link only ever holds one connection handle at a time.
#[async_trait]
pub trait PointerTransport: Send + Sync {
    fn adapter_available(&self) -> bool;

    fn adapter_enabled(&self) -> bool;

    /// Wireless permission state; may be revoked at any time.
    fn authorized(&self) -> bool;

    /// Establish a low-level connection to the device at `address`.
    async fn connect(&self, address: &MacAddress) -> Result<Box<dyn PointerConnection>, LinkError>;
}

/// An established low-level connection. Dropping a connection releases
/// the underlying handle; `close` does so explicitly.
#[async_trait]
pub trait PointerConnection: Send + Sync {
    /// Locate the known service and its writable characteristic.
    async fn discover_writer(&mut self) -> Result<(), LinkError>;

    /// Write one payload to the writable characteristic.
    async fn write(&mut self, payload: &[u8]) -> Result<(), LinkError>;

    async fn close(&mut self);
}

/// Transport used when no platform wireless backend is wired in; every
/// connect fails fast with a missing adapter.
pub struct NoAdapterTransport;

#[async_trait]
impl PointerTransport for NoAdapterTransport {
    fn adapter_available(&self) -> bool {
        false
    }

    fn adapter_enabled(&self) -> bool {
        false
    }

    fn authorized(&self) -> bool {
        false
    }

    async fn connect(
        &self,
        _address: &MacAddress,
    ) -> Result<Box<dyn PointerConnection>, LinkError> {
        Err(LinkError::AdapterMissing)
    }
}
