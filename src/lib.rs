//! Foreign Bridge - interop between a managed runtime and native memory/code
//!
//! Two halves share one idea, "generic operation -> backing-specific handler":
//! - `foreign` - native buffers answering a small message protocol
//!   (size, indexed read/write, unbox) behind per-capability traits
//! - `altrep` - alternate-representation method tables whose entries carry
//!   the calling convention needed to invoke them
//!
//! `interop` holds the native call machinery (convention tags, value
//! marshaling, typed direct calls, trampolines, symbol lookup) and `ffi`
//! exposes registration to native extensions over a C ABI.

pub mod altrep;
pub mod config;
pub mod error;
pub mod ffi;
pub mod foreign;
pub mod interop;
pub mod logging;

pub use altrep::{
    AltClass, AltVector, ClassBuilder, ClassRegistry, ElementType, MethodTable,
    OperationDescriptor, OperationKind, Sortedness,
};
pub use config::BridgeConfig;
pub use error::{InteropError, Result};
pub use foreign::{
    is_foreign_buffer, send, supports, Capability, CharArray, ForeignBuffer, ForeignObject,
    HasSize, Message, NativeHandle, Readable, Reply, Unboxable, Writable,
};
pub use interop::{
    CallingConvention, ConventionSet, EntryPoint, NativeType, NativeValue, Signature,
};

/// Bridge initialization: logging from the environment
#[no_mangle]
pub extern "C" fn fbridge_init() {
    logging::init();
    logging::log_bridge_init();
}

/// Initialize the bridge from a loaded configuration
///
/// Installs `config` as the global configuration used by the global class
/// registry and the C buffer entry points. Must run before either is first
/// used; otherwise logging is still set up and `Config` is returned.
pub fn init_with_config(config: &BridgeConfig) -> Result<()> {
    logging::init_with_config(config.log_config());
    logging::log_bridge_init();
    crate::config::install(config.clone())
}
