mod address;
mod error;
mod link;
mod payload;
mod transport;

pub use address::{AddressParseError, MacAddress};
pub use error::LinkError;
pub use link::{LinkState, PeripheralLink};
pub use payload::format_pointing;
pub use transport::{
    NoAdapterTransport, PointerConnection, PointerTransport, SERVICE_UUID, WRITE_CHAR_UUID,
};
