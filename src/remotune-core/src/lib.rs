pub mod config;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod models;
pub mod object;
pub mod paths;
pub mod registry;
pub mod router;
pub mod schema;
pub mod target_contract;
pub mod transport;
pub mod value;

#[cfg(test)]
mod fixtures;

pub use config::{
    Config, ConfigError, LogLevel, LoggingConfig, MediaKeysConfig, RemoteConfig, TargetsConfig,
    ValidationError,
};
pub use dispatcher::{ControlState, Dispatcher};
pub use error::{ControlError, ControlResult, ErrorKind, SupportExt};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use models::{
    AccessState, NowPlayingInfo, PlaybackState, RepeatMode, SaveOption, TargetId,
};
pub use object::{
    Application, Bounds, PlaylistEntry, RemoteHandle, RemoteObject, Session, SessionOptions,
    Window, DEFAULT_TIMEOUT,
};
pub use paths::{AppDirs, DirsError};
pub use registry::{Remote, RegistryError, TargetRegistry};
pub use router::{
    KeyAction, KeyDisposition, MediaKey, MediaKeyRouter, RoutedKey, TargetNotRunningAction,
};
pub use schema::{
    Access, CapabilitySchema, Canonical, EnumEntry, EnumTable, GenericElement, GenericOperation,
    GenericProperty, ObjectKind, ParamSpec, PropertyOwner, Range, SchemaError,
    StructuralOperation, StructuralSupport, Target, TargetElement, TargetOperation,
    TargetProperty, Unit,
};
pub use target_contract::{run_target_contract, TargetContractError, TargetContractExpectations};
pub use transport::memory::{MemoryProxy, RecordedCall, SimulatedApp};
pub use transport::{Connection, ConnectionError, Invocation, RemoteError, RemoteObjectProxy};
pub use value::{Enumerator, FourCharCode, ObjectPath, Specifier, Value, ValueKind};

pub const APP_NAME: &str = "remotune";
pub const APP_AUTHOR: &str = "Remotune";
pub const APP_QUALIFIER: &str = "io";
