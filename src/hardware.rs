use num_complex::Complex64;
use std::str::FromStr;
use std::time::Duration;

use crate::Args;
use crate::Channel;
use crate::Direction;
use crate::Error;
use crate::Range;

/// Error reported by the device driver.
///
/// Variants mirror the libbladeRF status codes, and their messages the strings libbladeRF
/// reports for them.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DeviceError {
    #[error("An unexpected error occurred")]
    Unexpected,
    #[error("Provided parameter was out of the allowable range")]
    Range,
    #[error("Invalid operation or parameter")]
    Inval,
    #[error("A memory allocation error occurred")]
    Mem,
    #[error("File or device I/O failure")]
    Io,
    #[error("Operation timed out")]
    Timeout,
    #[error("No devices available")]
    Nodev,
    #[error("Operation not supported")]
    Unsupported,
    #[error("Misaligned flash access")]
    Misaligned,
    #[error("Invalid checksum")]
    Checksum,
    #[error("File not found")]
    NoFile,
    #[error("An FPGA update is required")]
    UpdateFpga,
    #[error("A firmware update is required")]
    UpdateFw,
    #[error("Requested timestamp is in the past")]
    TimePast,
    #[error("Could not enqueue data into full queue")]
    QueueFull,
    #[error("An FPGA operation reported a failure")]
    FpgaOp,
    #[error("Insufficient permissions for the requested operation")]
    Permission,
    #[error("Operation would block, but has been requested to be non-blocking")]
    WouldBlock,
    #[error("Device insufficiently initialized for operation")]
    NotInit,
    #[error("Unknown error code: {0}")]
    Code(i32),
}

impl DeviceError {
    /// Map a negative libbladeRF status code to an error.
    pub fn from_code(code: i32) -> Self {
        match code {
            -1 => DeviceError::Unexpected,
            -2 => DeviceError::Range,
            -3 => DeviceError::Inval,
            -4 => DeviceError::Mem,
            -5 => DeviceError::Io,
            -6 => DeviceError::Timeout,
            -7 => DeviceError::Nodev,
            -8 => DeviceError::Unsupported,
            -9 => DeviceError::Misaligned,
            -10 => DeviceError::Checksum,
            -11 => DeviceError::NoFile,
            -12 => DeviceError::UpdateFpga,
            -13 => DeviceError::UpdateFw,
            -14 => DeviceError::TimePast,
            -15 => DeviceError::QueueFull,
            -16 => DeviceError::FpgaOp,
            -17 => DeviceError::Permission,
            -18 => DeviceError::WouldBlock,
            -19 => DeviceError::NotInit,
            c => DeviceError::Code(c),
        }
    }

    /// Turn a libbladeRF return value into a `Result`.
    pub fn check(ret: i32) -> Result<(), DeviceError> {
        if ret < 0 {
            Err(DeviceError::from_code(ret))
        } else {
            Ok(())
        }
    }
}

/// Board generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardRevision {
    /// bladeRF (x40/x115), a single RX channel.
    BladeRf1,
    /// bladeRF 2.0 micro, two RX channels.
    BladeRf2,
}

impl BoardRevision {
    /// Number of receive channels of the board.
    pub fn rx_channels(&self) -> usize {
        match self {
            BoardRevision::BladeRf1 => 1,
            BoardRevision::BladeRf2 => 2,
        }
    }

    /// Number of channels of the board in `direction`.
    pub fn channels(&self, direction: Direction) -> usize {
        match direction {
            Direction::Rx => self.rx_channels(),
            Direction::Tx => match self {
                BoardRevision::BladeRf1 => 1,
                BoardRevision::BladeRf2 => 2,
            },
        }
    }
}

impl FromStr for BoardRevision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "bladerf1" => Ok(BoardRevision::BladeRf1),
            "2" | "bladerf2" => Ok(BoardRevision::BladeRf2),
            _ => Err(Error::ValueError),
        }
    }
}

/// FPGA bitstream version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FpgaVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl FpgaVersion {
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl std::fmt::Display for FpgaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for FpgaVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim_start_matches('v').splitn(3, '.');
        let mut next = || -> Result<u16, Error> {
            parts
                .next()
                .ok_or(Error::ValueError)?
                .parse()
                .or(Err(Error::ValueError))
        };
        Ok(Self::new(next()?, next()?, next()?))
    }
}

/// Sampling clock of the ADC on bladeRF 1 boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    Internal,
    External,
}

impl FromStr for SamplingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "internal" => Ok(SamplingMode::Internal),
            "external" => Ok(SamplingMode::External),
            _ => Err(Error::ValueError),
        }
    }
}

/// DC offset and IQ balance correction modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionMode {
    /// No correction; the hardware is reset to a zero correction.
    Off,
    /// Keep correcting with the last values written.
    Manual,
    /// Track the correction automatically.
    Automatic,
}

/// Request the samples to be received immediately rather than at a timestamp.
pub const META_FLAG_RX_NOW: u32 = 1 << 31;

/// Per-transfer metadata (`struct bladerf_metadata`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metadata {
    pub timestamp: u64,
    pub flags: u32,
    pub status: u32,
    pub actual_count: u32,
    pub reserved: [u8; 32],
}

impl Metadata {
    /// Zeroed metadata flagged to receive immediately.
    pub fn rx_now() -> Self {
        Self {
            flags: META_FLAG_RX_NOW,
            ..Default::default()
        }
    }
}

/// Parameters of the synchronous streaming interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    /// Number of sample buffers.
    pub num_buffers: u32,
    /// Samples per buffer, a multiple of 1024.
    pub buffer_size: u32,
    /// Number of USB transfers in flight.
    pub num_transfers: u32,
    /// Timeout for a single transfer.
    pub timeout: Duration,
    /// Use the SC16 Q11 format with in-band metadata.
    pub metadata: bool,
}

/// Device control, parameterized by direction and channel.
///
/// Frequencies, rates and bandwidths are in Hz, gains in dB. Setters return the value that
/// the hardware actually applied.
pub trait HardwareControl: Send {
    /// Identifier of the opened device, e.g., its serial.
    fn id(&self) -> Result<String, DeviceError>;
    fn board_revision(&self) -> BoardRevision;
    fn fpga_version(&self) -> Result<FpgaVersion, DeviceError>;
    fn num_channels(&self, direction: Direction) -> Result<usize, DeviceError>;

    /// Select the ADC sampling clock.
    fn set_sampling(&self, mode: SamplingMode) -> Result<(), DeviceError>;

    /// Enable the data path of a direction.
    fn start(&self, direction: Direction) -> Result<(), DeviceError>;
    /// Disable the data path of a direction.
    fn stop(&self, direction: Direction) -> Result<(), DeviceError>;

    //================================ SAMPLE RATE ============================================
    fn sample_rate_range(&self, direction: Direction) -> Result<Range, DeviceError>;
    fn set_sample_rate(&self, direction: Direction, rate: f64) -> Result<f64, DeviceError>;
    fn sample_rate(&self, direction: Direction) -> Result<f64, DeviceError>;

    //================================ FREQUENCY ==============================================
    fn frequency_range(&self, channel: Channel) -> Result<Range, DeviceError>;
    fn set_frequency(&self, channel: Channel, frequency: f64) -> Result<f64, DeviceError>;
    fn frequency(&self, channel: Channel) -> Result<f64, DeviceError>;

    //================================ GAIN ===================================================
    /// Names of the gain stages, in order RF to baseband.
    fn gain_stages(&self, channel: Channel) -> Result<Vec<String>, DeviceError>;
    /// Range of the overall gain, or of a single stage if `stage` is given.
    fn gain_range(&self, channel: Channel, stage: Option<&str>) -> Result<Range, DeviceError>;
    /// Set the overall gain, or that of a single stage if `stage` is given.
    fn set_gain(&self, channel: Channel, stage: Option<&str>, gain: f64)
        -> Result<f64, DeviceError>;
    fn gain(&self, channel: Channel, stage: Option<&str>) -> Result<f64, DeviceError>;
    /// Enable or disable automatic gain control. Returns the mode now in effect.
    fn set_gain_mode(&self, channel: Channel, automatic: bool) -> Result<bool, DeviceError>;
    fn gain_mode(&self, channel: Channel) -> Result<bool, DeviceError>;

    //================================ BANDWIDTH ==============================================
    fn bandwidth_range(&self, channel: Channel) -> Result<Range, DeviceError>;
    fn set_bandwidth(&self, channel: Channel, bandwidth: u32) -> Result<u32, DeviceError>;
    fn bandwidth(&self, channel: Channel) -> Result<u32, DeviceError>;

    //================================ CORRECTION =============================================
    /// Write DC offset correction, I in the real and Q in the imaginary part, in [-1, 1].
    fn set_dc_offset(&self, channel: Channel, offset: Complex64) -> Result<(), DeviceError>;
    /// Write IQ balance correction, gain in the real and phase in the imaginary part.
    fn set_iq_balance(&self, channel: Channel, balance: Complex64) -> Result<(), DeviceError>;

    //================================ CLOCK ==================================================
    fn clock_sources(&self, mboard: usize) -> Result<Vec<String>, DeviceError>;
    fn set_clock_source(&self, source: &str, mboard: usize) -> Result<(), DeviceError>;
    fn clock_source(&self, mboard: usize) -> Result<String, DeviceError>;
}

/// Blocking sample transfer from the device.
pub trait SyncRx: Send {
    /// Configure the synchronous interface of a direction. Must precede [`sync_rx`](Self::sync_rx).
    fn configure(&self, direction: Direction, config: &StreamConfig) -> Result<(), DeviceError>;

    /// Fill `samples` with interleaved SC16 Q11 I/Q pairs, `samples.len() / 2` of them.
    ///
    /// Blocks for at most `timeout`.
    fn sync_rx(
        &self,
        samples: &mut [i16],
        metadata: Option<&mut Metadata>,
        timeout: Duration,
    ) -> Result<(), DeviceError>;
}

/// Opening and discovery of a device implementation.
pub trait Backend: HardwareControl + SyncRx + Sized {
    /// Devices of this backend that match `args`, each described by the arguments that open it.
    fn probe(args: &Args) -> Result<Vec<Args>, Error>;
    /// Open the device selected by `args`.
    fn open(args: &Args) -> Result<Self, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(DeviceError::from_code(-6), DeviceError::Timeout);
        assert_eq!(DeviceError::from_code(-7), DeviceError::Nodev);
        assert_eq!(DeviceError::from_code(-42), DeviceError::Code(-42));
        assert_eq!(DeviceError::check(0), Ok(()));
        assert_eq!(DeviceError::check(-3), Err(DeviceError::Inval));
        assert_eq!(DeviceError::Timeout.to_string(), "Operation timed out");
    }
    #[test]
    fn fpga_version_order() {
        let v: FpgaVersion = "0.15.3".parse().unwrap();
        assert_eq!(v, FpgaVersion::new(0, 15, 3));
        assert_eq!("v0.0.1".parse::<FpgaVersion>().unwrap(), FpgaVersion::new(0, 0, 1));
        assert!(FpgaVersion::new(0, 0, 0) < FpgaVersion::new(0, 0, 1));
        assert!(FpgaVersion::new(0, 1, 0) > FpgaVersion::new(0, 0, 1));
        assert!("1.2".parse::<FpgaVersion>().is_err());
        assert_eq!(v.to_string(), "v0.15.3");
    }
    #[test]
    fn board_revision() {
        assert_eq!("bladerf2".parse::<BoardRevision>(), Ok(BoardRevision::BladeRf2));
        assert_eq!("1".parse::<BoardRevision>(), Ok(BoardRevision::BladeRf1));
        assert_eq!(BoardRevision::BladeRf1.rx_channels(), 1);
        assert_eq!(BoardRevision::BladeRf2.rx_channels(), 2);
        assert_eq!(BoardRevision::BladeRf1.channels(Direction::Tx), 1);
        assert_eq!(BoardRevision::BladeRf2.channels(Direction::Tx), 2);
    }
    #[test]
    fn sampling_mode() {
        assert_eq!("internal".parse::<SamplingMode>(), Ok(SamplingMode::Internal));
        assert_eq!("external".parse::<SamplingMode>(), Ok(SamplingMode::External));
        assert!("auto".parse::<SamplingMode>().is_err());
    }
    #[test]
    fn rx_now_metadata() {
        let m = Metadata::rx_now();
        assert_eq!(m.flags, META_FLAG_RX_NOW);
        assert_eq!(m.timestamp, 0);
        assert_eq!(m.actual_count, 0);
    }
}
