pub mod advertiser;
pub mod commands;
pub mod connections;
pub mod service;
pub mod table;
pub mod traits;
pub mod types;

pub use advertiser::{Advertiser, AdvertisingError};
pub use commands::{CommandHandlers, Handler};
pub use connections::{ConnectionError, ConnectionRegistry};
pub use service::{GaugeService, ServiceConfig, ServiceError};
pub use table::{AttributeHandles, Telemetry, GAUGE_SERVICE};
pub use traits::{RadioError, RadioStack};
pub use types::{AttrHandle, ConnHandle, ControlCommand, RadioEvent};
