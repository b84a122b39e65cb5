use num_complex::Complex32;
use num_complex::Complex64;

use crate::convert;
use crate::Args;
use crate::Backend;
use crate::Channel;
use crate::ConvBuffer;
use crate::CorrectionMode;
use crate::Direction;
use crate::Error;
use crate::FpgaVersion;
use crate::GenericDevice;
use crate::HardwareControl;
use crate::Metadata;
use crate::Range;
use crate::SamplingMode;
use crate::SourceConfig;
use crate::SyncBlock;
use crate::SyncRx;
use crate::WorkStatus;

/// Number of failed transfers in a row after which the source reports [`WorkStatus::Done`].
pub const MAX_CONSECUTIVE_FAILURES: usize = 3;

/// Oldest FPGA image that produces SC16 Q11 samples in the expected layout.
const MIN_FPGA_VERSION: FpgaVersion = FpgaVersion::new(0, 0, 1);

/// Bandwidth relative to the sample rate, used when no bandwidth is given.
const DEFAULT_BANDWIDTH_RATIO: f64 = 0.75;

/// bladeRF receiver producing [`Complex32`] samples.
///
/// Channel arguments are RX channel indices, i.e., `0` is `RX0`.
pub struct BladeRfSource<D: HardwareControl + SyncRx = GenericDevice> {
    dev: D,
    config: SourceConfig,
    conv_buf: ConvBuffer,
    consecutive_failures: usize,
    done: bool,
    streaming: bool,
}

impl BladeRfSource {
    /// Open the device selected by `args` with whichever enabled backend finds it.
    pub fn open<A: TryInto<Args>>(args: A) -> Result<Self, Error> {
        let args: Args = args.try_into().or(Err(Error::ValueError))?;
        let dev = crate::open(&args)?;
        Self::from_device(dev, args)
    }

    /// Arguments of all devices the enabled backends can find.
    pub fn devices() -> Result<Vec<Args>, Error> {
        crate::enumerate(())
    }
}

impl<D: Backend> BladeRfSource<D> {
    /// Open a device of backend `D`.
    pub fn new<A: TryInto<Args>>(args: A) -> Result<Self, Error> {
        let args: Args = args.try_into().or(Err(Error::ValueError))?;
        let dev = D::open(&args)?;
        Self::from_device(dev, args)
    }
}

impl<D: HardwareControl + SyncRx> BladeRfSource<D> {
    /// Wrap an opened device, applying the options in `args`.
    pub fn from_device<A: TryInto<Args>>(dev: D, args: A) -> Result<Self, Error> {
        let args: Args = args.try_into().or(Err(Error::ValueError))?;
        let config = SourceConfig::from_args(&args)?;

        match dev.id() {
            Ok(id) => log::info!("using bladeRF {id} ({:?})", dev.board_revision()),
            Err(e) => log::debug!("could not read serial: {e}"),
        }

        if let Some(sampling) = args.get_opt::<String>("sampling")? {
            match sampling.parse::<SamplingMode>() {
                Ok(mode) => match dev.set_sampling(mode) {
                    Ok(()) => log::info!("sampling mode set to {sampling}"),
                    Err(e) => log::warn!("could not set sampling mode {sampling}: {e}"),
                },
                Err(_) => log::warn!("Invalid sampling mode '{sampling}'"),
            }
        }

        match dev.fpga_version() {
            Ok(v) if v < MIN_FPGA_VERSION => log::warn!(
                "FPGA version {v} is older than {MIN_FPGA_VERSION}, samples will be misinterpreted; update the FPGA image"
            ),
            Ok(v) => log::debug!("FPGA version {v}"),
            Err(e) => log::warn!("could not query FPGA version: {e}"),
        }

        if let Some(agc) = config.agc {
            dev.set_gain_mode(Channel::rx(0), agc.0)
                .map_err(Error::hardware("set gain mode"))?;
        }

        Ok(Self {
            dev,
            config,
            conv_buf: ConvBuffer::new(),
            consecutive_failures: 0,
            done: false,
            streaming: false,
        })
    }

    pub fn device(&self) -> &D {
        &self.dev
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Number of complex samples the conversion buffer holds.
    pub fn scratch_capacity(&self) -> usize {
        self.conv_buf.capacity()
    }

    pub fn consecutive_failures(&self) -> usize {
        self.consecutive_failures
    }

    /// Whether the source gave up after too many failed transfers.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Configure the synchronous RX interface and enable the RX path.
    pub fn start(&mut self) -> bool {
        let stream = self.config.stream_config();
        if let Err(e) = self.dev.configure(Direction::Rx, &stream) {
            log::error!("could not configure RX stream {stream:?}: {e}");
            return false;
        }
        if let Err(e) = self.dev.start(Direction::Rx) {
            log::error!("could not enable RX: {e}");
            return false;
        }
        log::debug!("RX started with {stream:?}");
        self.consecutive_failures = 0;
        self.done = false;
        self.streaming = true;
        true
    }

    /// Disable the RX path.
    pub fn stop(&mut self) -> bool {
        match self.dev.stop(Direction::Rx) {
            Ok(()) => {
                self.streaming = false;
                true
            }
            Err(e) => {
                log::error!("could not disable RX: {e}");
                false
            }
        }
    }

    /// Receive `output.len()` samples.
    ///
    /// A failed transfer yields zeros, as does the missing tail of a short read. After [`MAX_CONSECUTIVE_FAILURES`] failures in a row the
    /// source returns [`WorkStatus::Done`] and keeps doing so until it is started again.
    pub fn work(&mut self, output: &mut [Complex32]) -> Result<WorkStatus, Error> {
        if self.done {
            return Ok(WorkStatus::Done);
        }
        let n = output.len();
        self.conv_buf.reserve(n)?;

        let mut meta = self.config.enable_metadata.0.then(Metadata::rx_now);
        let raw = self.conv_buf.samples_mut(n);
        match self.dev.sync_rx(raw, meta.as_mut(), self.config.timeout()) {
            Ok(()) => {
                self.consecutive_failures = 0;
                if let Some(m) = meta {
                    let actual = (m.actual_count as usize).min(n);
                    if actual < n {
                        log::warn!("received {actual} of {n} samples");
                        raw[2 * actual..].fill(0);
                    }
                }
            }
            Err(e) => {
                log::error!("Failed to read samples: {e}");
                self.consecutive_failures += 1;
                if self.consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    log::error!("Consecutive error limit hit. Shutting down.");
                    self.done = true;
                    return Ok(WorkStatus::Done);
                }
                raw.fill(0);
            }
        }

        convert::sc16_q11_to_cf32(self.conv_buf.samples(n), output);
        Ok(WorkStatus::Produced(n))
    }

    pub fn num_channels(&self) -> Result<usize, Error> {
        Ok(self.dev.num_channels(Direction::Rx)?)
    }

    pub fn sample_rates(&self) -> Result<Range, Error> {
        Ok(self.dev.sample_rate_range(Direction::Rx)?)
    }

    pub fn set_sample_rate(&mut self, rate: f64) -> Result<f64, Error> {
        Ok(self.dev.set_sample_rate(Direction::Rx, rate)?)
    }

    pub fn sample_rate(&self) -> Result<f64, Error> {
        Ok(self.dev.sample_rate(Direction::Rx)?)
    }

    pub fn freq_range(&self, chan: usize) -> Result<Range, Error> {
        Ok(self.dev.frequency_range(Channel::rx(chan))?)
    }

    pub fn set_center_freq(&mut self, freq: f64, chan: usize) -> Result<f64, Error> {
        Ok(self.dev.set_frequency(Channel::rx(chan), freq)?)
    }

    pub fn center_freq(&self, chan: usize) -> Result<f64, Error> {
        Ok(self.dev.frequency(Channel::rx(chan))?)
    }

    /// Frequency correction is not available on bladeRF.
    pub fn has_freq_corr(&self) -> bool {
        false
    }

    pub fn set_freq_corr(&mut self, _ppm: f64, _chan: usize) -> Result<f64, Error> {
        Err(Error::NotSupported("frequency correction"))
    }

    pub fn freq_corr(&self, _chan: usize) -> f64 {
        0.0
    }

    pub fn gain_names(&self, chan: usize) -> Result<Vec<String>, Error> {
        Ok(self.dev.gain_stages(Channel::rx(chan))?)
    }

    pub fn gain_range(&self, chan: usize) -> Result<Range, Error> {
        Ok(self.dev.gain_range(Channel::rx(chan), None)?)
    }

    pub fn gain_range_named(&self, name: &str, chan: usize) -> Result<Range, Error> {
        Ok(self.dev.gain_range(Channel::rx(chan), Some(name))?)
    }

    pub fn set_gain_mode(&mut self, automatic: bool, chan: usize) -> Result<bool, Error> {
        Ok(self.dev.set_gain_mode(Channel::rx(chan), automatic)?)
    }

    pub fn gain_mode(&self, chan: usize) -> Result<bool, Error> {
        Ok(self.dev.gain_mode(Channel::rx(chan))?)
    }

    pub fn set_gain(&mut self, gain: f64, chan: usize) -> Result<f64, Error> {
        Ok(self.dev.set_gain(Channel::rx(chan), None, gain)?)
    }

    pub fn set_gain_named(&mut self, gain: f64, name: &str, chan: usize) -> Result<f64, Error> {
        Ok(self.dev.set_gain(Channel::rx(chan), Some(name), gain)?)
    }

    pub fn gain(&self, chan: usize) -> Result<f64, Error> {
        Ok(self.dev.gain(Channel::rx(chan), None)?)
    }

    pub fn gain_named(&self, name: &str, chan: usize) -> Result<f64, Error> {
        Ok(self.dev.gain(Channel::rx(chan), Some(name))?)
    }

    /// `RX0`, and `RX1` on boards with a second receiver.
    pub fn antennas(&self, _chan: usize) -> Vec<String> {
        let mut antennas = vec![Channel::rx(0).to_string()];
        if self.dev.board_revision().rx_channels() > 1 {
            antennas.push(Channel::rx(1).to_string());
        }
        antennas
    }

    /// The antenna is fixed; this only reports it.
    pub fn set_antenna(&mut self, _name: &str, chan: usize) -> String {
        self.antenna(chan)
    }

    pub fn antenna(&self, _chan: usize) -> String {
        Channel::rx(0).to_string()
    }

    pub fn set_dc_offset_mode(&mut self, mode: CorrectionMode, chan: usize) -> Result<(), Error> {
        match mode {
            CorrectionMode::Off => self.set_dc_offset(Complex64::new(0.0, 0.0), chan),
            CorrectionMode::Manual => Ok(()),
            CorrectionMode::Automatic => {
                log::info!("Automatic DC correction mode is not implemented.");
                Err(Error::NotSupported("automatic DC offset correction"))
            }
        }
    }

    pub fn set_dc_offset(&mut self, offset: Complex64, chan: usize) -> Result<(), Error> {
        self.dev
            .set_dc_offset(Channel::rx(chan), offset)
            .map_err(Error::hardware("set DC offset"))
    }

    pub fn set_iq_balance_mode(&mut self, mode: CorrectionMode, chan: usize) -> Result<(), Error> {
        match mode {
            CorrectionMode::Off => self.set_iq_balance(Complex64::new(0.0, 0.0), chan),
            CorrectionMode::Manual => Ok(()),
            CorrectionMode::Automatic => {
                log::info!("Automatic IQ correction mode is not implemented.");
                Err(Error::NotSupported("automatic IQ balance correction"))
            }
        }
    }

    pub fn set_iq_balance(&mut self, balance: Complex64, chan: usize) -> Result<(), Error> {
        self.dev
            .set_iq_balance(Channel::rx(chan), balance)
            .map_err(Error::hardware("set IQ balance"))
    }

    /// Set the analog filter bandwidth. `0.0` picks a bandwidth matching the sample rate.
    pub fn set_bandwidth(&mut self, bandwidth: f64, chan: usize) -> Result<f64, Error> {
        let bandwidth = if bandwidth == 0.0 {
            self.sample_rate()? * DEFAULT_BANDWIDTH_RATIO
        } else {
            bandwidth
        };
        self.dev
            .set_bandwidth(Channel::rx(chan), bandwidth as u32)
            .map_err(Error::hardware("set bandwidth"))?;
        self.bandwidth(chan)
    }

    pub fn bandwidth(&self, chan: usize) -> Result<f64, Error> {
        let bw = self
            .dev
            .bandwidth(Channel::rx(chan))
            .map_err(Error::hardware("read bandwidth"))?;
        Ok(bw as f64)
    }

    pub fn bandwidth_range(&self, chan: usize) -> Result<Range, Error> {
        Ok(self.dev.bandwidth_range(Channel::rx(chan))?)
    }

    pub fn set_clock_source(&mut self, source: &str, mboard: usize) -> Result<(), Error> {
        Ok(self.dev.set_clock_source(source, mboard)?)
    }

    pub fn clock_source(&self, mboard: usize) -> Result<String, Error> {
        Ok(self.dev.clock_source(mboard)?)
    }

    pub fn clock_sources(&self, mboard: usize) -> Result<Vec<String>, Error> {
        Ok(self.dev.clock_sources(mboard)?)
    }
}

impl<D: HardwareControl + SyncRx> SyncBlock for BladeRfSource<D> {
    fn start(&mut self) -> bool {
        BladeRfSource::start(self)
    }

    fn stop(&mut self) -> bool {
        BladeRfSource::stop(self)
    }

    fn work(&mut self, output: &mut [Complex32]) -> Result<WorkStatus, Error> {
        BladeRfSource::work(self, output)
    }
}

impl<D: HardwareControl + SyncRx> Drop for BladeRfSource<D> {
    fn drop(&mut self) {
        if self.streaming {
            BladeRfSource::stop(self);
        }
    }
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::impls::Dummy;

    fn source(args: &str) -> (Dummy, BladeRfSource<Dummy>) {
        let dev = Dummy::open(args).unwrap();
        let src = BladeRfSource::from_device(dev.clone(), args).unwrap();
        (dev, src)
    }

    #[test]
    fn invalid_sampling_mode_is_ignored() {
        let (dev, _src) = source("driver=dummy, revision=1, sampling=bogus");
        assert_eq!(dev.sampling(), None);
        let (dev, _src) = source("driver=dummy, revision=1, sampling=external");
        assert_eq!(dev.sampling(), Some(SamplingMode::External));
    }
    #[test]
    fn sampling_failure_is_not_fatal() {
        let (dev, _src) = source("driver=dummy, revision=2, sampling=external");
        assert_eq!(dev.sampling(), None);
    }
    #[test]
    fn old_or_unknown_fpga_is_not_fatal() {
        source("driver=dummy, fpga=0.0.0");
        source("driver=dummy, fpga=unavailable");
    }
    #[test]
    fn initial_gain_mode() {
        let (dev, _src) = source("driver=dummy, agc=on");
        assert!(dev.gain_mode(Channel::rx(0)).unwrap());
        let (dev, _src) = source("driver=dummy, agc=0");
        assert!(!dev.gain_mode(Channel::rx(0)).unwrap());
    }
    #[test]
    fn stream_options_from_args() {
        let (_dev, src) = source("driver=dummy, buffers=8, transfers=4, enable_metadata=yes");
        assert_eq!(src.config().buffers, 8);
        assert_eq!(src.config().transfers, 4);
        assert!(src.config().stream_config().metadata);
        assert_eq!(src.config().timeout(), std::time::Duration::from_millis(3000));
    }
    #[test]
    fn invalid_stream_options() {
        let dev = Dummy::open("driver=dummy").unwrap();
        assert_eq!(
            BladeRfSource::from_device(dev, "buflen=1000").err(),
            Some(Error::ValueError)
        );
    }
    #[test]
    fn counter_tracks_failures() {
        let (dev, mut src) = source("driver=dummy");
        assert!(src.start());
        let mut out = vec![Complex32::default(); 16];
        dev.fail_next(2);
        src.work(&mut out).unwrap();
        assert_eq!(src.consecutive_failures(), 1);
        src.work(&mut out).unwrap();
        assert_eq!(src.consecutive_failures(), 2);
        src.work(&mut out).unwrap();
        assert_eq!(src.consecutive_failures(), 0);
    }
    #[test]
    fn drop_stops_streaming() {
        let (dev, mut src) = source("driver=dummy");
        assert!(!src.is_streaming());
        assert!(src.start());
        assert!(src.is_streaming());
        assert!(dev.is_streaming(Direction::Rx));
        drop(src);
        assert!(!dev.is_streaming(Direction::Rx));
    }
}
