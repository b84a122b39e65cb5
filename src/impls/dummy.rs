//! Simulated bladeRF for CI and tests.
//!
//! Opened with `driver=dummy`. Optional arguments: `serial`, `revision` (`1` or `2`, default
//! `2`) and `fpga` (a version like `0.15.3`, or `unavailable` to make the version query fail).
//! Clones share the same device state, so a test can keep a handle to inspect and script the
//! device while an adapter owns another.
use num_complex::Complex64;
use std::f32::consts::PI;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use crate::Args;
use crate::Backend;
use crate::BoardRevision;
use crate::Channel;
use crate::DeviceError;
use crate::Direction;
use crate::Error;
use crate::FpgaVersion;
use crate::HardwareControl;
use crate::Metadata;
use crate::Range;
use crate::RangeItem;
use crate::SamplingMode;
use crate::StreamConfig;
use crate::SyncRx;

const BLADERF1_BANDWIDTHS: [f64; 16] = [
    1.5e6, 1.75e6, 2.5e6, 2.75e6, 3e6, 3.84e6, 5e6, 5.5e6, 6e6, 7e6, 8.75e6, 10e6, 12e6, 14e6,
    20e6, 28e6,
];

/// Amplitude of the generated tone, about 0.7 of full scale.
const TONE_AMPLITUDE: f32 = 1448.0;
/// The tone sits at a quarter of the sample rate from the center.
const TONE_PERIOD: usize = 4;

/// Record of the last sample transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transfer {
    /// Number of complex samples requested.
    pub samples: usize,
    /// Metadata flags passed with the transfer, if any metadata was passed.
    pub flags: Option<u32>,
    pub timeout: Duration,
    pub ok: bool,
}

#[derive(Debug, Clone)]
struct ChannelState {
    frequency: f64,
    gain: f64,
    stages: Vec<(String, f64)>,
    agc: bool,
    bandwidth: u32,
    dc_offset: Complex64,
    iq_balance: Complex64,
}

#[derive(Debug, Clone, Copy)]
enum Fill {
    Tone,
    Constant(i16, i16),
}

#[derive(Debug)]
struct State {
    serial: String,
    revision: BoardRevision,
    fpga: Option<FpgaVersion>,
    sampling: Option<SamplingMode>,
    clock_source: String,
    rx_rate: f64,
    tx_rate: f64,
    rx_enabled: bool,
    tx_enabled: bool,
    rx_config: Option<StreamConfig>,
    channels: Vec<ChannelState>,
    fill: Fill,
    phase: usize,
    timestamp: u64,
    pending_failures: usize,
    short_read: Option<usize>,
    transfers: usize,
    last_transfer: Option<Transfer>,
}

/// Dummy Device
#[derive(Clone)]
pub struct Dummy {
    state: Arc<Mutex<State>>,
}

impl Dummy {
    /// Get a list of Devices
    ///
    /// Will only return exactly one device, if `dummy` is set as driver.
    pub fn probe(args: &Args) -> Result<Vec<Args>, Error> {
        match args.get::<String>("driver").as_deref() {
            Ok("dummy") => {
                let mut a = Args::new();
                a.set("driver", "dummy");
                a.set(
                    "serial",
                    args.get::<String>("serial")
                        .unwrap_or_else(|_| "dummy".to_string()),
                );
                if let Ok(r) = args.get::<String>("revision") {
                    a.set("revision", r);
                }
                Ok(vec![a])
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Create a Dummy Device
    pub fn open<A: TryInto<Args>>(args: A) -> Result<Self, Error> {
        let args: Args = args.try_into().or(Err(Error::ValueError))?;
        if args.get::<String>("driver").as_deref() != Ok("dummy") {
            return Err(Error::NotFound);
        }
        let revision = args
            .get_opt::<BoardRevision>("revision")?
            .unwrap_or(BoardRevision::BladeRf2);
        let fpga = match args.get::<String>("fpga").as_deref() {
            Ok("unavailable") => None,
            Ok(v) => Some(v.parse()?),
            Err(_) => Some(FpgaVersion::new(0, 15, 3)),
        };

        let channel = |index: usize| {
            let stages = match revision {
                BoardRevision::BladeRf1 => vec![
                    ("lna".to_string(), 6.0),
                    ("rxvga1".to_string(), 30.0),
                    ("rxvga2".to_string(), 3.0),
                ],
                BoardRevision::BladeRf2 => vec![("full".to_string(), 30.0)],
            };
            ChannelState {
                frequency: 915e6 + index as f64 * 1e6,
                gain: stages.iter().map(|(_, g)| g).sum(),
                stages,
                agc: false,
                bandwidth: 1_500_000,
                dc_offset: Complex64::new(0.0, 0.0),
                iq_balance: Complex64::new(0.0, 0.0),
            }
        };

        log::debug!("opening dummy bladeRF {revision:?} with FPGA {fpga:?}");

        Ok(Self {
            state: Arc::new(Mutex::new(State {
                serial: args
                    .get::<String>("serial")
                    .unwrap_or_else(|_| "dummy".to_string()),
                revision,
                fpga,
                sampling: None,
                clock_source: match revision {
                    BoardRevision::BladeRf1 => "internal".to_string(),
                    BoardRevision::BladeRf2 => "onboard".to_string(),
                },
                rx_rate: 2e6,
                tx_rate: 2e6,
                rx_enabled: false,
                tx_enabled: false,
                rx_config: None,
                channels: (0..4).map(|raw| channel(raw >> 1)).collect(),
                fill: Fill::Tone,
                phase: 0,
                timestamp: 0,
                pending_failures: 0,
                short_read: None,
                transfers: 0,
                last_transfer: None,
            })),
        })
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make the next `n` transfers fail with a timeout.
    pub fn fail_next(&self, n: usize) {
        self.state().pending_failures = n;
    }

    /// Deliver only `samples` samples on the next transfer that carries metadata.
    pub fn short_next(&self, samples: usize) {
        self.state().short_read = Some(samples);
    }

    /// Deliver the raw pair `(i, q)` for every sample instead of the tone.
    pub fn set_constant(&self, i: i16, q: i16) {
        self.state().fill = Fill::Constant(i, q);
    }

    pub fn transfer_count(&self) -> usize {
        self.state().transfers
    }

    pub fn last_transfer(&self) -> Option<Transfer> {
        self.state().last_transfer
    }

    pub fn is_streaming(&self, direction: Direction) -> bool {
        let s = self.state();
        match direction {
            Direction::Rx => s.rx_enabled,
            Direction::Tx => s.tx_enabled,
        }
    }

    pub fn stream_config(&self) -> Option<StreamConfig> {
        self.state().rx_config
    }

    pub fn sampling(&self) -> Option<SamplingMode> {
        self.state().sampling
    }

    pub fn dc_offset(&self, channel: Channel) -> Option<Complex64> {
        self.state()
            .channels
            .get(channel.raw().ok()? as usize)
            .map(|c| c.dc_offset)
    }

    pub fn iq_balance(&self, channel: Channel) -> Option<Complex64> {
        self.state()
            .channels
            .get(channel.raw().ok()? as usize)
            .map(|c| c.iq_balance)
    }

    /// Run `f` on the state of `channel`, failing for channels the board does not have.
    fn with_channel<R>(
        &self,
        channel: Channel,
        f: impl FnOnce(&mut ChannelState, BoardRevision) -> Result<R, DeviceError>,
    ) -> Result<R, DeviceError> {
        let mut s = self.state();
        if channel.index() >= s.revision.channels(channel.direction()) {
            return Err(DeviceError::Inval);
        }
        let revision = s.revision;
        f(&mut s.channels[channel.raw()? as usize], revision)
    }

    fn stage_range(revision: BoardRevision, stage: &str) -> Option<Range> {
        match (revision, stage) {
            (BoardRevision::BladeRf1, "lna") => {
                Some(Range::new(vec![RangeItem::Step(0.0, 6.0, 3.0)]))
            }
            (BoardRevision::BladeRf1, "rxvga1") => Some(Range::scaled(5, 30, 1, 1.0)),
            (BoardRevision::BladeRf1, "rxvga2") => Some(Range::scaled(0, 30, 3, 1.0)),
            (BoardRevision::BladeRf2, "full") => Some(Range::scaled(-15, 60, 1, 1.0)),
            _ => None,
        }
    }

    fn overall_gain_range(revision: BoardRevision) -> Range {
        match revision {
            BoardRevision::BladeRf1 => Range::scaled(5, 66, 1, 1.0),
            BoardRevision::BladeRf2 => Range::scaled(-15, 60, 1, 1.0),
        }
    }
}

fn tone(phase: usize) -> (i16, i16) {
    let w = 2.0 * PI * (phase % TONE_PERIOD) as f32 / TONE_PERIOD as f32;
    (
        (TONE_AMPLITUDE * w.cos()).round() as i16,
        (TONE_AMPLITUDE * w.sin()).round() as i16,
    )
}

impl HardwareControl for Dummy {
    fn id(&self) -> Result<String, DeviceError> {
        Ok(self.state().serial.clone())
    }

    fn board_revision(&self) -> BoardRevision {
        self.state().revision
    }

    fn fpga_version(&self) -> Result<FpgaVersion, DeviceError> {
        self.state().fpga.ok_or(DeviceError::Unsupported)
    }

    fn num_channels(&self, direction: Direction) -> Result<usize, DeviceError> {
        Ok(self.state().revision.channels(direction))
    }

    fn set_sampling(&self, mode: SamplingMode) -> Result<(), DeviceError> {
        let mut s = self.state();
        if s.revision != BoardRevision::BladeRf1 {
            return Err(DeviceError::Unsupported);
        }
        s.sampling = Some(mode);
        Ok(())
    }

    fn start(&self, direction: Direction) -> Result<(), DeviceError> {
        let mut s = self.state();
        match direction {
            Direction::Rx => {
                if s.rx_config.is_none() {
                    return Err(DeviceError::NotInit);
                }
                s.rx_enabled = true;
            }
            Direction::Tx => s.tx_enabled = true,
        }
        Ok(())
    }

    fn stop(&self, direction: Direction) -> Result<(), DeviceError> {
        let mut s = self.state();
        match direction {
            Direction::Rx => s.rx_enabled = false,
            Direction::Tx => s.tx_enabled = false,
        }
        Ok(())
    }

    fn sample_rate_range(&self, _direction: Direction) -> Result<Range, DeviceError> {
        Ok(match self.state().revision {
            BoardRevision::BladeRf1 => Range::scaled(160_000, 40_000_000, 1, 1.0),
            BoardRevision::BladeRf2 => Range::scaled(520_834, 61_440_000, 1, 1.0),
        })
    }

    fn set_sample_rate(&self, direction: Direction, rate: f64) -> Result<f64, DeviceError> {
        let actual = self.sample_rate_range(direction)?.clip(rate, true);
        let mut s = self.state();
        match direction {
            Direction::Rx => s.rx_rate = actual,
            Direction::Tx => s.tx_rate = actual,
        }
        Ok(actual)
    }

    fn sample_rate(&self, direction: Direction) -> Result<f64, DeviceError> {
        let s = self.state();
        Ok(match direction {
            Direction::Rx => s.rx_rate,
            Direction::Tx => s.tx_rate,
        })
    }

    fn frequency_range(&self, channel: Channel) -> Result<Range, DeviceError> {
        self.with_channel(channel, |_, revision| {
            Ok(match revision {
                BoardRevision::BladeRf1 => Range::scaled(237_500_000, 3_800_000_000, 1, 1.0),
                BoardRevision::BladeRf2 => Range::scaled(70_000_000, 6_000_000_000, 1, 1.0),
            })
        })
    }

    fn set_frequency(&self, channel: Channel, frequency: f64) -> Result<f64, DeviceError> {
        let range = self.frequency_range(channel)?;
        if !range.contains(frequency.round()) {
            return Err(DeviceError::Range);
        }
        self.with_channel(channel, |c, _| {
            c.frequency = frequency.round();
            Ok(c.frequency)
        })
    }

    fn frequency(&self, channel: Channel) -> Result<f64, DeviceError> {
        self.with_channel(channel, |c, _| Ok(c.frequency))
    }

    fn gain_stages(&self, channel: Channel) -> Result<Vec<String>, DeviceError> {
        self.with_channel(channel, |c, _| {
            Ok(c.stages.iter().map(|(n, _)| n.clone()).collect())
        })
    }

    fn gain_range(&self, channel: Channel, stage: Option<&str>) -> Result<Range, DeviceError> {
        self.with_channel(channel, |_, revision| match stage {
            None => Ok(Self::overall_gain_range(revision)),
            Some(name) => Self::stage_range(revision, name).ok_or(DeviceError::Inval),
        })
    }

    fn set_gain(
        &self,
        channel: Channel,
        stage: Option<&str>,
        gain: f64,
    ) -> Result<f64, DeviceError> {
        self.with_channel(channel, |c, revision| match stage {
            None => {
                c.gain = Self::overall_gain_range(revision).clip(gain, true);
                Ok(c.gain)
            }
            Some(name) => {
                let range = Self::stage_range(revision, name).ok_or(DeviceError::Inval)?;
                let actual = range.clip(gain, true);
                let slot = c
                    .stages
                    .iter_mut()
                    .find(|(n, _)| n == name)
                    .ok_or(DeviceError::Inval)?;
                slot.1 = actual;
                c.gain = c.stages.iter().map(|(_, g)| g).sum();
                Ok(actual)
            }
        })
    }

    fn gain(&self, channel: Channel, stage: Option<&str>) -> Result<f64, DeviceError> {
        self.with_channel(channel, |c, _| match stage {
            None => Ok(c.gain),
            Some(name) => c
                .stages
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, g)| *g)
                .ok_or(DeviceError::Inval),
        })
    }

    fn set_gain_mode(&self, channel: Channel, automatic: bool) -> Result<bool, DeviceError> {
        self.with_channel(channel, |c, _| {
            c.agc = automatic;
            Ok(c.agc)
        })
    }

    fn gain_mode(&self, channel: Channel) -> Result<bool, DeviceError> {
        self.with_channel(channel, |c, _| Ok(c.agc))
    }

    fn bandwidth_range(&self, channel: Channel) -> Result<Range, DeviceError> {
        self.with_channel(channel, |_, revision| {
            Ok(match revision {
                BoardRevision::BladeRf1 => Range::new(
                    BLADERF1_BANDWIDTHS
                        .iter()
                        .copied()
                        .map(RangeItem::Value)
                        .collect(),
                ),
                BoardRevision::BladeRf2 => Range::scaled(200_000, 56_000_000, 1, 1.0),
            })
        })
    }

    fn set_bandwidth(&self, channel: Channel, bandwidth: u32) -> Result<u32, DeviceError> {
        let range = self.bandwidth_range(channel)?;
        let max = range.stop().unwrap_or(0.0);
        if bandwidth as f64 > max {
            return Err(DeviceError::Range);
        }
        // the LMS6002D only has discrete filters, pick the next wider one
        let actual = range
            .items()
            .iter()
            .filter_map(|i| match *i {
                RangeItem::Value(v) if v >= bandwidth as f64 => Some(v),
                _ => None,
            })
            .reduce(f64::min)
            .unwrap_or_else(|| range.clip(bandwidth as f64, true));
        self.with_channel(channel, |c, _| {
            c.bandwidth = actual as u32;
            Ok(c.bandwidth)
        })
    }

    fn bandwidth(&self, channel: Channel) -> Result<u32, DeviceError> {
        self.with_channel(channel, |c, _| Ok(c.bandwidth))
    }

    fn set_dc_offset(&self, channel: Channel, offset: Complex64) -> Result<(), DeviceError> {
        if offset.re.abs() > 1.0 || offset.im.abs() > 1.0 {
            return Err(DeviceError::Range);
        }
        self.with_channel(channel, |c, _| {
            c.dc_offset = offset;
            Ok(())
        })
    }

    fn set_iq_balance(&self, channel: Channel, balance: Complex64) -> Result<(), DeviceError> {
        if balance.re.abs() > 1.0 || balance.im.abs() > 1.0 {
            return Err(DeviceError::Range);
        }
        self.with_channel(channel, |c, _| {
            c.iq_balance = balance;
            Ok(())
        })
    }

    fn clock_sources(&self, mboard: usize) -> Result<Vec<String>, DeviceError> {
        if mboard != 0 {
            return Err(DeviceError::Inval);
        }
        let sources: &[&str] = match self.state().revision {
            BoardRevision::BladeRf1 => &["internal", "external_1pps", "external_10mhz"],
            BoardRevision::BladeRf2 => &["onboard", "external"],
        };
        Ok(sources.iter().map(|s| s.to_string()).collect())
    }

    fn set_clock_source(&self, source: &str, mboard: usize) -> Result<(), DeviceError> {
        if !self.clock_sources(mboard)?.iter().any(|s| s == source) {
            return Err(DeviceError::Inval);
        }
        self.state().clock_source = source.to_string();
        Ok(())
    }

    fn clock_source(&self, mboard: usize) -> Result<String, DeviceError> {
        if mboard != 0 {
            return Err(DeviceError::Inval);
        }
        Ok(self.state().clock_source.clone())
    }
}

impl SyncRx for Dummy {
    fn configure(&self, direction: Direction, config: &StreamConfig) -> Result<(), DeviceError> {
        if config.buffer_size == 0 || config.buffer_size % 1024 != 0 {
            return Err(DeviceError::Inval);
        }
        match direction {
            Direction::Rx => {
                self.state().rx_config = Some(*config);
                Ok(())
            }
            Direction::Tx => Err(DeviceError::Unsupported),
        }
    }

    fn sync_rx(
        &self,
        samples: &mut [i16],
        metadata: Option<&mut Metadata>,
        timeout: Duration,
    ) -> Result<(), DeviceError> {
        let mut s = self.state();
        let n = samples.len() / 2;
        s.transfers += 1;
        let mut transfer = Transfer {
            samples: n,
            flags: metadata.as_ref().map(|m| m.flags),
            timeout,
            ok: false,
        };

        let config = match (s.rx_config, s.rx_enabled) {
            (Some(c), true) => c,
            _ => {
                s.last_transfer = Some(transfer);
                return Err(DeviceError::NotInit);
            }
        };
        if config.metadata && metadata.is_none() {
            s.last_transfer = Some(transfer);
            return Err(DeviceError::Inval);
        }
        if s.pending_failures > 0 {
            s.pending_failures -= 1;
            s.last_transfer = Some(transfer);
            return Err(DeviceError::Timeout);
        }

        let actual = match (metadata.is_some(), s.short_read.take()) {
            (true, Some(k)) => k.min(n),
            _ => n,
        };
        for iq in samples.chunks_exact_mut(2).take(actual) {
            let (i, q) = match s.fill {
                Fill::Tone => tone(s.phase),
                Fill::Constant(i, q) => (i, q),
            };
            s.phase = (s.phase + 1) % TONE_PERIOD;
            iq[0] = i;
            iq[1] = q;
        }
        if let Some(m) = metadata {
            m.timestamp = s.timestamp;
            m.actual_count = actual as u32;
        }
        s.timestamp += actual as u64;
        transfer.ok = true;
        s.last_transfer = Some(transfer);
        Ok(())
    }
}

impl Backend for Dummy {
    fn probe(args: &Args) -> Result<Vec<Args>, Error> {
        Dummy::probe(args)
    }

    fn open(args: &Args) -> Result<Self, Error> {
        Dummy::open(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(args: &str) -> Dummy {
        let d = Dummy::open(args).unwrap();
        let config = StreamConfig {
            num_buffers: 32,
            buffer_size: 4096,
            num_transfers: 16,
            timeout: Duration::from_millis(100),
            metadata: false,
        };
        d.configure(Direction::Rx, &config).unwrap();
        HardwareControl::start(&d, Direction::Rx).unwrap();
        d
    }

    #[test]
    fn needs_dummy_driver() {
        assert!(matches!(Dummy::open("bladerf=0"), Err(Error::NotFound)));
        assert!(Dummy::probe(&Args::new()).unwrap().is_empty());
    }
    #[test]
    fn revision_and_channels() {
        let d = Dummy::open("driver=dummy, revision=1").unwrap();
        assert_eq!(d.board_revision(), BoardRevision::BladeRf1);
        assert_eq!(d.num_channels(Direction::Rx).unwrap(), 1);
        assert_eq!(d.frequency(Channel::rx(1)), Err(DeviceError::Inval));
        assert_eq!(d.gain_stages(Channel::rx(0)).unwrap(), ["lna", "rxvga1", "rxvga2"]);
    }
    #[test]
    fn fpga_version_arg() {
        let d = Dummy::open("driver=dummy, fpga=0.0.0").unwrap();
        assert_eq!(d.fpga_version(), Ok(FpgaVersion::new(0, 0, 0)));
        let d = Dummy::open("driver=dummy, fpga=unavailable").unwrap();
        assert_eq!(d.fpga_version(), Err(DeviceError::Unsupported));
        assert!(Dummy::open("driver=dummy, fpga=new").is_err());
    }
    #[test]
    fn sample_rate_clipped() {
        let d = Dummy::open("driver=dummy").unwrap();
        assert_eq!(d.set_sample_rate(Direction::Rx, 1e9).unwrap(), 61.44e6);
        assert_eq!(d.sample_rate(Direction::Rx).unwrap(), 61.44e6);
    }
    #[test]
    fn bladerf1_bandwidth_filters() {
        let d = Dummy::open("driver=dummy, revision=1").unwrap();
        assert_eq!(d.set_bandwidth(Channel::rx(0), 4_000_000).unwrap(), 5_000_000);
        assert_eq!(d.set_bandwidth(Channel::rx(0), 30_000_000), Err(DeviceError::Range));
    }
    #[test]
    fn stage_gains_sum() {
        let d = Dummy::open("driver=dummy, revision=1").unwrap();
        let ch = Channel::rx(0);
        assert_eq!(d.set_gain(ch, Some("rxvga2"), 14.0).unwrap(), 15.0);
        assert_eq!(d.gain(ch, None).unwrap(), 6.0 + 30.0 + 15.0);
        assert_eq!(d.set_gain(ch, Some("bogus"), 1.0), Err(DeviceError::Inval));
    }
    #[test]
    fn transfer_requires_start() {
        let d = Dummy::open("driver=dummy").unwrap();
        let mut buf = [0i16; 8];
        assert_eq!(
            d.sync_rx(&mut buf, None, Duration::from_millis(1)),
            Err(DeviceError::NotInit)
        );
    }
    #[test]
    fn tone_and_failures() {
        let d = started("driver=dummy");
        let mut buf = [0i16; 8];
        d.sync_rx(&mut buf, None, Duration::from_millis(1)).unwrap();
        assert_eq!(buf, [1448, 0, 0, 1448, -1448, 0, 0, -1448]);

        d.fail_next(1);
        assert_eq!(
            d.sync_rx(&mut buf, None, Duration::from_millis(1)),
            Err(DeviceError::Timeout)
        );
        assert!(!d.last_transfer().unwrap().ok);
        d.set_constant(7, -7);
        d.sync_rx(&mut buf, None, Duration::from_millis(1)).unwrap();
        assert_eq!(buf, [7, -7, 7, -7, 7, -7, 7, -7]);
        assert_eq!(d.transfer_count(), 3);
    }
    #[test]
    fn metadata_filled() {
        let d = started("driver=dummy");
        let mut buf = [0i16; 16];
        let mut meta = Metadata::rx_now();
        d.sync_rx(&mut buf, Some(&mut meta), Duration::from_millis(1))
            .unwrap();
        assert_eq!(meta.actual_count, 8);
        assert_eq!(d.last_transfer().unwrap().flags, Some(crate::META_FLAG_RX_NOW));

        d.set_constant(5, 5);
        d.short_next(2);
        let mut buf = [0i16; 8];
        d.sync_rx(&mut buf, Some(&mut meta), Duration::from_millis(1))
            .unwrap();
        assert_eq!(meta.actual_count, 2);
        assert_eq!(buf, [5, 5, 5, 5, 0, 0, 0, 0]);
    }
    #[test]
    fn channel_bounds_follow_direction() {
        let d = Dummy::open("driver=dummy, revision=1").unwrap();
        assert!(d.set_dc_offset(Channel::tx(0), Complex64::new(0.1, 0.0)).is_ok());
        assert_eq!(
            d.set_dc_offset(Channel::tx(1), Complex64::new(0.1, 0.0)),
            Err(DeviceError::Inval)
        );
        assert_eq!(d.frequency(Channel::rx(128)), Err(DeviceError::Inval));
        assert_eq!(d.dc_offset(Channel::rx(usize::MAX)), None);
        assert_eq!(d.num_channels(Direction::Tx).unwrap(), 1);
    }
}
