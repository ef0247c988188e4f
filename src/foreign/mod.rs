//! Foreign values - native-backed values behind a message protocol
//!
//! Each operation is its own capability trait. A value advertises what it
//! implements through `ForeignObject`; `send` checks the capability before
//! dispatching, so an unsupported operation is never attempted.
//!
//! Values:
//! - `buffer.rs` - non-owning view of native bytes (full buffer protocol)
//! - `char_array.rs` - managed bytes that migrate to native memory on unbox
//! - `handle.rs` - opaque native address (unbox only)

mod buffer;
mod char_array;
mod handle;

pub use buffer::ForeignBuffer;
pub use char_array::CharArray;
pub use handle::NativeHandle;

use crate::error::{InteropError, Result};
use crate::interop::{record, Counter};
use crate::logging::log_capability_mismatch;
use std::fmt;

/// Participates in the sized-container capability
pub trait HasSize {
    fn size(&self) -> usize;
}

/// Indexed byte read; `OutOfBounds` outside `[0, size)`
pub trait Readable: HasSize {
    fn read(&self, index: i64) -> Result<u8>;
}

/// Indexed byte write returning the stored value
///
/// Writes go straight to the backing memory and are visible to every alias.
pub trait Writable: HasSize {
    fn write(&self, index: i64, value: u8) -> Result<u8>;
}

/// Raw address escape hatch; no bounds guarantees past this point
pub trait Unboxable {
    fn unbox(&self) -> usize;
}

/// Protocol capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Size,
    Read,
    Write,
    Unbox,
}

impl Capability {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Read => "read",
            Self::Write => "write",
            Self::Unbox => "unbox",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value reachable through the message protocol
///
/// Accessors return `None` for capabilities the value lacks. Implementations
/// must answer from the type alone (no I/O, no locking).
pub trait ForeignObject {
    fn type_name(&self) -> &'static str;

    fn as_sized(&self) -> Option<&dyn HasSize> {
        None
    }

    fn as_readable(&self) -> Option<&dyn Readable> {
        None
    }

    fn as_writable(&self) -> Option<&dyn Writable> {
        None
    }

    fn as_unboxable(&self) -> Option<&dyn Unboxable> {
        None
    }
}

/// Capability check, O(1)
#[inline]
pub fn supports(value: &dyn ForeignObject, capability: Capability) -> bool {
    match capability {
        Capability::Size => value.as_sized().is_some(),
        Capability::Read => value.as_readable().is_some(),
        Capability::Write => value.as_writable().is_some(),
        Capability::Unbox => value.as_unboxable().is_some(),
    }
}

/// Whether `value` speaks the whole foreign-buffer protocol
#[inline]
pub fn is_foreign_buffer(value: &dyn ForeignObject) -> bool {
    [Capability::Size, Capability::Read, Capability::Write, Capability::Unbox]
        .into_iter()
        .all(|capability| supports(value, capability))
}

/// Generic operation on a foreign value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    HasSize,
    GetSize,
    Read(i64),
    Write(i64, u8),
    Unbox,
}

impl Message {
    /// Capability required to answer; `HasSize` is answerable by anyone
    pub const fn capability(self) -> Option<Capability> {
        match self {
            Self::HasSize => None,
            Self::GetSize => Some(Capability::Size),
            Self::Read(_) => Some(Capability::Read),
            Self::Write(..) => Some(Capability::Write),
            Self::Unbox => Some(Capability::Unbox),
        }
    }
}

/// Result of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Bool(bool),
    Size(usize),
    Byte(u8),
    Address(usize),
}

/// Dispatch `message` to the handler `receiver` provides
pub fn send(receiver: &dyn ForeignObject, message: Message) -> Result<Reply> {
    record(Counter::Messages);

    match message {
        Message::HasSize => Ok(Reply::Bool(supports(receiver, Capability::Size))),
        Message::GetSize => {
            let sized = require(receiver.as_sized(), Capability::Size, receiver)?;
            Ok(Reply::Size(sized.size()))
        }
        Message::Read(index) => {
            let readable = require(receiver.as_readable(), Capability::Read, receiver)?;
            readable.read(index).map(Reply::Byte)
        }
        Message::Write(index, value) => {
            let writable = require(receiver.as_writable(), Capability::Write, receiver)?;
            writable.write(index, value).map(Reply::Byte)
        }
        Message::Unbox => {
            let unboxable = require(receiver.as_unboxable(), Capability::Unbox, receiver)?;
            Ok(Reply::Address(unboxable.unbox()))
        }
    }
}

fn require<'a, T: ?Sized>(
    handler: Option<&'a T>,
    capability: Capability,
    receiver: &dyn ForeignObject,
) -> Result<&'a T> {
    handler.ok_or_else(|| {
        record(Counter::CapabilityMismatches);
        log_capability_mismatch(receiver.type_name(), capability.name());
        InteropError::CapabilityMismatch {
            capability,
            receiver: receiver.type_name(),
        }
    })
}

/// Bounds check shared by the byte-indexed values
#[inline]
pub(crate) fn check_index(index: i64, length: usize) -> Result<usize> {
    match usize::try_from(index) {
        Ok(i) if i < length => Ok(i),
        _ => {
            record(Counter::BoundsViolations);
            crate::logging::log_bounds_violation(index, length);
            Err(InteropError::OutOfBounds { index, length })
        }
    }
}
