//! bladeRF receiver exposed as a streaming source of [`Complex32`](num_complex::Complex32)
//! samples.
//!
//! The [`BladeRfSource`] adapter opens a device through a [`Backend`], forwards RX
//! configuration to its [`HardwareControl`] layer and pulls SC16 Q11 sample blocks through
//! [`SyncRx`], converting them to floating point on every [`work`](BladeRfSource::work) cycle.
mod args;
pub use args::Args;

mod block;
pub use block::SyncBlock;
pub use block::WorkStatus;

mod buffer;
pub use buffer::ConvBuffer;

mod channel;
pub use channel::Channel;
pub use channel::Direction;

mod config;
pub use config::Flag;
pub use config::SourceConfig;

pub mod convert;

mod device;
pub use device::enumerate;
pub use device::open;
pub use device::Device;
pub use device::GenericDevice;

mod hardware;
pub use hardware::Backend;
pub use hardware::BoardRevision;
pub use hardware::CorrectionMode;
pub use hardware::DeviceError;
pub use hardware::FpgaVersion;
pub use hardware::HardwareControl;
pub use hardware::Metadata;
pub use hardware::SamplingMode;
pub use hardware::StreamConfig;
pub use hardware::SyncRx;
pub use hardware::META_FLAG_RX_NOW;

pub mod impls;

mod range;
pub use range::Range;
pub use range::RangeItem;

mod source;
pub use source::BladeRfSource;
pub use source::MAX_CONSECUTIVE_FAILURES;

use std::str::FromStr;
use thiserror::Error;

/// Source Error
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("Value Error")]
    ValueError,
    #[error("Not Found")]
    NotFound,
    #[error("{0} is not supported")]
    NotSupported(&'static str),
    #[error("DeviceError: {0}")]
    Device(#[from] DeviceError),
    #[error("could not {op}: {source}")]
    Hardware {
        op: &'static str,
        #[source]
        source: DeviceError,
    },
    #[error("failed to grow the conversion buffer to {0} samples")]
    Alloc(usize),
}

impl Error {
    /// Attach the failed operation to a driver error.
    pub(crate) fn hardware(op: &'static str) -> impl FnOnce(DeviceError) -> Error {
        move |source| Error::Hardware { op, source }
    }
}

/// Backend implementation that can provide a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    #[cfg(feature = "dummy")]
    Dummy,
    #[cfg(feature = "libbladerf")]
    LibBladeRf,
}

impl FromStr for Driver {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_lowercase();
        #[cfg(feature = "dummy")]
        {
            if s == "dummy" {
                return Ok(Driver::Dummy);
            }
        }
        #[cfg(feature = "libbladerf")]
        {
            if s == "bladerf" || s == "libbladerf" {
                return Ok(Driver::LibBladeRf);
            }
        }
        Err(Error::ValueError)
    }
}

impl std::fmt::Display for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            #[cfg(feature = "dummy")]
            Driver::Dummy => write!(f, "dummy"),
            #[cfg(feature = "libbladerf")]
            Driver::LibBladeRf => write!(f, "bladerf"),
        }
    }
}
