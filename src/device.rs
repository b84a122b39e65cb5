use num_complex::Complex64;
use std::time::Duration;

#[allow(unused_imports)]
use crate::impls;
use crate::Args;
#[allow(unused_imports)]
use crate::Backend;
use crate::BoardRevision;
use crate::Channel;
use crate::DeviceError;
use crate::Direction;
use crate::Driver;
use crate::Error;
use crate::FpgaVersion;
use crate::HardwareControl;
use crate::Metadata;
use crate::Range;
use crate::SamplingMode;
use crate::StreamConfig;
use crate::SyncRx;

/// A device that can be controlled and streamed from.
pub trait Device: HardwareControl + SyncRx {}

impl<T: HardwareControl + SyncRx + ?Sized> Device for T {}

/// Type-erased device, used when the backend is only known at runtime through the `driver`
/// argument.
pub type GenericDevice = Box<dyn Device>;

/// Enumerate devices of all enabled backends, filtered by the `driver` argument if present.
pub fn enumerate<A: TryInto<Args>>(args: A) -> Result<Vec<Args>, Error> {
    let args: Args = args.try_into().or(Err(Error::ValueError))?;
    let driver = args.get_opt::<Driver>("driver")?;
    #[allow(unused_mut)]
    let mut devs = Vec::new();

    #[cfg(feature = "libbladerf")]
    {
        if driver.is_none() || matches!(driver, Some(Driver::LibBladeRf)) {
            devs.append(&mut impls::LibBladeRf::probe(&args)?);
        }
    }
    #[cfg(feature = "dummy")]
    {
        if driver.is_none() || matches!(driver, Some(Driver::Dummy)) {
            devs.append(&mut impls::Dummy::probe(&args)?);
        }
    }

    log::debug!("enumerated {} device(s) for {:?}: {devs:?}", devs.len(), driver);
    Ok(devs)
}

/// Open the device selected by `args`.
///
/// With a `driver` argument only that backend is tried; otherwise the first backend that
/// finds a matching device wins.
pub fn open<A: TryInto<Args>>(args: A) -> Result<GenericDevice, Error> {
    let args: Args = args.try_into().or(Err(Error::ValueError))?;
    let driver = args.get_opt::<Driver>("driver")?;

    #[cfg(feature = "libbladerf")]
    {
        if driver.is_none() || matches!(driver, Some(Driver::LibBladeRf)) {
            match impls::LibBladeRf::open(&args) {
                Ok(d) => return Ok(Box::new(d)),
                Err(Error::NotFound) | Err(Error::Device(DeviceError::Nodev)) => {
                    if driver.is_some() {
                        return Err(Error::NotFound);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
    #[cfg(feature = "dummy")]
    {
        if driver.is_none() || matches!(driver, Some(Driver::Dummy)) {
            match impls::Dummy::open(&args) {
                Ok(d) => return Ok(Box::new(d)),
                Err(Error::NotFound) => {
                    if driver.is_some() {
                        return Err(Error::NotFound);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    log::debug!("no device found for {args} (driver {driver:?})");
    Err(Error::NotFound)
}

impl HardwareControl for Box<dyn Device> {
    fn id(&self) -> Result<String, DeviceError> {
        self.as_ref().id()
    }
    fn board_revision(&self) -> BoardRevision {
        self.as_ref().board_revision()
    }
    fn fpga_version(&self) -> Result<FpgaVersion, DeviceError> {
        self.as_ref().fpga_version()
    }
    fn num_channels(&self, direction: Direction) -> Result<usize, DeviceError> {
        self.as_ref().num_channels(direction)
    }
    fn set_sampling(&self, mode: SamplingMode) -> Result<(), DeviceError> {
        self.as_ref().set_sampling(mode)
    }
    fn start(&self, direction: Direction) -> Result<(), DeviceError> {
        self.as_ref().start(direction)
    }
    fn stop(&self, direction: Direction) -> Result<(), DeviceError> {
        self.as_ref().stop(direction)
    }
    fn sample_rate_range(&self, direction: Direction) -> Result<Range, DeviceError> {
        self.as_ref().sample_rate_range(direction)
    }
    fn set_sample_rate(&self, direction: Direction, rate: f64) -> Result<f64, DeviceError> {
        self.as_ref().set_sample_rate(direction, rate)
    }
    fn sample_rate(&self, direction: Direction) -> Result<f64, DeviceError> {
        self.as_ref().sample_rate(direction)
    }
    fn frequency_range(&self, channel: Channel) -> Result<Range, DeviceError> {
        self.as_ref().frequency_range(channel)
    }
    fn set_frequency(&self, channel: Channel, frequency: f64) -> Result<f64, DeviceError> {
        self.as_ref().set_frequency(channel, frequency)
    }
    fn frequency(&self, channel: Channel) -> Result<f64, DeviceError> {
        self.as_ref().frequency(channel)
    }
    fn gain_stages(&self, channel: Channel) -> Result<Vec<String>, DeviceError> {
        self.as_ref().gain_stages(channel)
    }
    fn gain_range(&self, channel: Channel, stage: Option<&str>) -> Result<Range, DeviceError> {
        self.as_ref().gain_range(channel, stage)
    }
    fn set_gain(
        &self,
        channel: Channel,
        stage: Option<&str>,
        gain: f64,
    ) -> Result<f64, DeviceError> {
        self.as_ref().set_gain(channel, stage, gain)
    }
    fn gain(&self, channel: Channel, stage: Option<&str>) -> Result<f64, DeviceError> {
        self.as_ref().gain(channel, stage)
    }
    fn set_gain_mode(&self, channel: Channel, automatic: bool) -> Result<bool, DeviceError> {
        self.as_ref().set_gain_mode(channel, automatic)
    }
    fn gain_mode(&self, channel: Channel) -> Result<bool, DeviceError> {
        self.as_ref().gain_mode(channel)
    }
    fn bandwidth_range(&self, channel: Channel) -> Result<Range, DeviceError> {
        self.as_ref().bandwidth_range(channel)
    }
    fn set_bandwidth(&self, channel: Channel, bandwidth: u32) -> Result<u32, DeviceError> {
        self.as_ref().set_bandwidth(channel, bandwidth)
    }
    fn bandwidth(&self, channel: Channel) -> Result<u32, DeviceError> {
        self.as_ref().bandwidth(channel)
    }
    fn set_dc_offset(&self, channel: Channel, offset: Complex64) -> Result<(), DeviceError> {
        self.as_ref().set_dc_offset(channel, offset)
    }
    fn set_iq_balance(&self, channel: Channel, balance: Complex64) -> Result<(), DeviceError> {
        self.as_ref().set_iq_balance(channel, balance)
    }
    fn clock_sources(&self, mboard: usize) -> Result<Vec<String>, DeviceError> {
        self.as_ref().clock_sources(mboard)
    }
    fn set_clock_source(&self, source: &str, mboard: usize) -> Result<(), DeviceError> {
        self.as_ref().set_clock_source(source, mboard)
    }
    fn clock_source(&self, mboard: usize) -> Result<String, DeviceError> {
        self.as_ref().clock_source(mboard)
    }
}

impl SyncRx for Box<dyn Device> {
    fn configure(&self, direction: Direction, config: &StreamConfig) -> Result<(), DeviceError> {
        self.as_ref().configure(direction, config)
    }
    fn sync_rx(
        &self,
        samples: &mut [i16],
        metadata: Option<&mut Metadata>,
        timeout: Duration,
    ) -> Result<(), DeviceError> {
        self.as_ref().sync_rx(samples, metadata, timeout)
    }
}
