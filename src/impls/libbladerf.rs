//! bladeRF devices through the vendor library, libbladeRF.
//!
//! Devices are selected with `bladerf=<instance>` or `bladerf=<serial>`; without a selector the
//! first device is opened.
use num_complex::Complex64;
use std::ffi::CStr;
use std::ffi::CString;
use std::os::raw::{c_char, c_int, c_uint, c_void};
use std::ptr;
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
use crate::SamplingMode;
use crate::StreamConfig;
use crate::SyncRx;

type BladerfDevice = c_void;

const BLADERF_RX: c_int = 0;
const BLADERF_TX: c_int = 1;
const BLADERF_RX_X1: c_int = 0;
const BLADERF_FORMAT_SC16_Q11: c_int = 0;
const BLADERF_FORMAT_SC16_Q11_META: c_int = 1;
const BLADERF_GAIN_DEFAULT: c_int = 0;
const BLADERF_GAIN_MGC: c_int = 1;
const BLADERF_SAMPLING_INTERNAL: c_int = 1;
const BLADERF_SAMPLING_EXTERNAL: c_int = 2;
const BLADERF_CORR_DCOFF_I: c_int = 0;
const BLADERF_CORR_DCOFF_Q: c_int = 1;
const BLADERF_CORR_PHASE: c_int = 2;
const BLADERF_CORR_GAIN: c_int = 3;

const DCOFF_SCALE: f64 = 2048.0;
const GAIN_SCALE: f64 = 4096.0;
const PHASE_SCALE: f64 = 4096.0;

const SERIAL_LENGTH: usize = 33;

/// bladeRF 1 clock references, driven through the VCTCXO tamer.
const TAMER_MODES: [(&str, c_int); 3] = [("internal", 0), ("external_1pps", 1), ("external_10mhz", 2)];
/// bladeRF 2 reference clock selection.
const CLOCK_SELECTS: [(&str, c_int); 2] = [("onboard", 0), ("external", 1)];

#[repr(C)]
struct BladerfDevinfo {
    backend: c_int,
    serial: [c_char; SERIAL_LENGTH],
    usb_bus: u8,
    usb_addr: u8,
    instance: c_uint,
    manufacturer: [c_char; SERIAL_LENGTH],
    product: [c_char; SERIAL_LENGTH],
}

#[repr(C)]
struct BladerfVersion {
    major: u16,
    minor: u16,
    patch: u16,
    describe: *const c_char,
}

#[repr(C)]
struct BladerfRange {
    min: i64,
    max: i64,
    step: i64,
    scale: f32,
}

extern "C" {
    fn bladerf_open(device: *mut *mut BladerfDevice, identifier: *const c_char) -> c_int;
    fn bladerf_close(device: *mut BladerfDevice);
    fn bladerf_get_device_list(devices: *mut *mut BladerfDevinfo) -> c_int;
    fn bladerf_free_device_list(devices: *mut BladerfDevinfo);
    fn bladerf_get_serial(dev: *mut BladerfDevice, serial: *mut c_char) -> c_int;
    fn bladerf_fpga_version(dev: *mut BladerfDevice, version: *mut BladerfVersion) -> c_int;
    fn bladerf_get_board_name(dev: *mut BladerfDevice) -> *const c_char;
    fn bladerf_get_channel_count(dev: *mut BladerfDevice, dir: c_int) -> usize;
    fn bladerf_set_sampling(dev: *mut BladerfDevice, sampling: c_int) -> c_int;
    fn bladerf_enable_module(dev: *mut BladerfDevice, ch: c_int, enable: bool) -> c_int;

    fn bladerf_set_sample_rate(
        dev: *mut BladerfDevice,
        ch: c_int,
        rate: c_uint,
        actual: *mut c_uint,
    ) -> c_int;
    fn bladerf_get_sample_rate(dev: *mut BladerfDevice, ch: c_int, rate: *mut c_uint) -> c_int;
    fn bladerf_get_sample_rate_range(
        dev: *mut BladerfDevice,
        ch: c_int,
        range: *mut *const BladerfRange,
    ) -> c_int;

    fn bladerf_set_frequency(dev: *mut BladerfDevice, ch: c_int, frequency: u64) -> c_int;
    fn bladerf_get_frequency(dev: *mut BladerfDevice, ch: c_int, frequency: *mut u64) -> c_int;
    fn bladerf_get_frequency_range(
        dev: *mut BladerfDevice,
        ch: c_int,
        range: *mut *const BladerfRange,
    ) -> c_int;

    fn bladerf_set_gain(dev: *mut BladerfDevice, ch: c_int, gain: c_int) -> c_int;
    fn bladerf_get_gain(dev: *mut BladerfDevice, ch: c_int, gain: *mut c_int) -> c_int;
    fn bladerf_get_gain_range(
        dev: *mut BladerfDevice,
        ch: c_int,
        range: *mut *const BladerfRange,
    ) -> c_int;
    fn bladerf_set_gain_mode(dev: *mut BladerfDevice, ch: c_int, mode: c_int) -> c_int;
    fn bladerf_get_gain_mode(dev: *mut BladerfDevice, ch: c_int, mode: *mut c_int) -> c_int;
    fn bladerf_get_gain_stages(
        dev: *mut BladerfDevice,
        ch: c_int,
        stages: *mut *const c_char,
        count: usize,
    ) -> c_int;
    fn bladerf_set_gain_stage(
        dev: *mut BladerfDevice,
        ch: c_int,
        stage: *const c_char,
        gain: c_int,
    ) -> c_int;
    fn bladerf_get_gain_stage(
        dev: *mut BladerfDevice,
        ch: c_int,
        stage: *const c_char,
        gain: *mut c_int,
    ) -> c_int;
    fn bladerf_get_gain_stage_range(
        dev: *mut BladerfDevice,
        ch: c_int,
        stage: *const c_char,
        range: *mut *const BladerfRange,
    ) -> c_int;

    fn bladerf_set_bandwidth(
        dev: *mut BladerfDevice,
        ch: c_int,
        bandwidth: c_uint,
        actual: *mut c_uint,
    ) -> c_int;
    fn bladerf_get_bandwidth(dev: *mut BladerfDevice, ch: c_int, bandwidth: *mut c_uint)
        -> c_int;
    fn bladerf_get_bandwidth_range(
        dev: *mut BladerfDevice,
        ch: c_int,
        range: *mut *const BladerfRange,
    ) -> c_int;

    fn bladerf_set_correction(dev: *mut BladerfDevice, ch: c_int, corr: c_int, value: i16)
        -> c_int;

    fn bladerf_set_vctcxo_tamer_mode(dev: *mut BladerfDevice, mode: c_int) -> c_int;
    fn bladerf_get_vctcxo_tamer_mode(dev: *mut BladerfDevice, mode: *mut c_int) -> c_int;
    fn bladerf_set_clock_select(dev: *mut BladerfDevice, sel: c_int) -> c_int;
    fn bladerf_get_clock_select(dev: *mut BladerfDevice, sel: *mut c_int) -> c_int;

    fn bladerf_sync_config(
        dev: *mut BladerfDevice,
        layout: c_int,
        format: c_int,
        num_buffers: c_uint,
        buffer_size: c_uint,
        num_transfers: c_uint,
        stream_timeout: c_uint,
    ) -> c_int;
    fn bladerf_sync_rx(
        dev: *mut BladerfDevice,
        samples: *mut c_void,
        num_samples: c_uint,
        metadata: *mut Metadata,
        timeout_ms: c_uint,
    ) -> c_int;
}

fn c_str(chars: &[c_char]) -> String {
    // SAFETY: libbladeRF NUL-terminates the fixed-size fields
    unsafe { CStr::from_ptr(chars.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

fn c_string(s: &str) -> Result<CString, DeviceError> {
    CString::new(s).or(Err(DeviceError::Inval))
}

fn direction_to_brf(direction: Direction) -> c_int {
    match direction {
        Direction::Rx => BLADERF_RX,
        Direction::Tx => BLADERF_TX,
    }
}

/// Read a range through one of the `bladerf_get_*_range` getters.
fn range(f: impl FnOnce(*mut *const BladerfRange) -> c_int) -> Result<Range, DeviceError> {
    let mut r: *const BladerfRange = ptr::null();
    DeviceError::check(f(&mut r))?;
    if r.is_null() {
        return Err(DeviceError::Unexpected);
    }
    // SAFETY: libbladeRF returns pointers to static range tables
    let r = unsafe { &*r };
    Ok(Range::scaled(r.min, r.max, r.step, r.scale as f64))
}

/// bladeRF opened through libbladeRF.
pub struct LibBladeRf {
    dev: *mut BladerfDevice,
    revision: BoardRevision,
}

// the handle may be used from another thread than the one that opened it
unsafe impl Send for LibBladeRf {}

impl LibBladeRf {
    pub fn probe(_args: &Args) -> Result<Vec<Args>, Error> {
        let mut list: *mut BladerfDevinfo = ptr::null_mut();
        let count = unsafe { bladerf_get_device_list(&mut list) };
        if count == -7 || count == 0 {
            return Ok(Vec::new());
        }
        DeviceError::check(count)?;
        if list.is_null() {
            return Ok(Vec::new());
        }

        let mut devs = Vec::with_capacity(count as usize);
        for i in 0..count as usize {
            // SAFETY: the list holds `count` entries until it is freed below
            let info = unsafe { &*list.add(i) };
            let serial = c_str(&info.serial);
            log::debug!(
                "probing bladeRF {} at {}:{}",
                info.instance,
                info.usb_bus,
                info.usb_addr
            );
            let mut a = Args::new();
            a.set("driver", "bladerf");
            a.set("bladerf", info.instance.to_string());
            a.set("label", format!("{} SN {}", c_str(&info.product), serial));
            a.set("serial", serial);
            devs.push(a);
        }
        unsafe { bladerf_free_device_list(list) };

        Ok(devs)
    }

    pub fn open<A: TryInto<Args>>(args: A) -> Result<Self, Error> {
        let args: Args = args.try_into().or(Err(Error::ValueError))?;
        let identifier = match args.get::<String>("bladerf") {
            Ok(s) if s.is_empty() => String::new(),
            Ok(s) if s.chars().all(|c| c.is_ascii_digit()) => format!("*:instance={s}"),
            Ok(s) => format!("*:serial={s}"),
            Err(Error::NotFound) => String::new(),
            Err(e) => return Err(e),
        };
        let identifier = c_string(&identifier)?;

        let mut dev: *mut BladerfDevice = ptr::null_mut();
        match DeviceError::check(unsafe { bladerf_open(&mut dev, identifier.as_ptr()) }) {
            Ok(()) => {}
            Err(DeviceError::Nodev) => return Err(Error::NotFound),
            Err(e) => return Err(e.into()),
        }

        let name = unsafe { bladerf_get_board_name(dev) };
        let revision = if !name.is_null()
            && unsafe { CStr::from_ptr(name) }.to_bytes() == b"bladerf2"
        {
            BoardRevision::BladeRf2
        } else {
            BoardRevision::BladeRf1
        };
        log::info!("opened bladeRF ({revision:?}) with identifier {identifier:?}");

        Ok(Self { dev, revision })
    }

    fn with_stage<R>(
        &self,
        stage: Option<&str>,
        f: impl FnOnce(*const c_char) -> Result<R, DeviceError>,
    ) -> Result<R, DeviceError> {
        match stage {
            Some(s) => {
                let s = c_string(s)?;
                f(s.as_ptr())
            }
            None => f(ptr::null()),
        }
    }

    fn clock_table(&self) -> &'static [(&'static str, c_int)] {
        match self.revision {
            BoardRevision::BladeRf1 => &TAMER_MODES,
            BoardRevision::BladeRf2 => &CLOCK_SELECTS,
        }
    }
}

impl Drop for LibBladeRf {
    fn drop(&mut self) {
        log::debug!("closing bladeRF");
        unsafe { bladerf_close(self.dev) };
    }
}

impl HardwareControl for LibBladeRf {
    fn id(&self) -> Result<String, DeviceError> {
        let mut serial = [0 as c_char; SERIAL_LENGTH];
        DeviceError::check(unsafe { bladerf_get_serial(self.dev, serial.as_mut_ptr()) })?;
        Ok(c_str(&serial))
    }

    fn board_revision(&self) -> BoardRevision {
        self.revision
    }

    fn fpga_version(&self) -> Result<FpgaVersion, DeviceError> {
        let mut v = BladerfVersion {
            major: 0,
            minor: 0,
            patch: 0,
            describe: ptr::null(),
        };
        DeviceError::check(unsafe { bladerf_fpga_version(self.dev, &mut v) })?;
        Ok(FpgaVersion::new(v.major, v.minor, v.patch))
    }

    fn num_channels(&self, direction: Direction) -> Result<usize, DeviceError> {
        Ok(unsafe { bladerf_get_channel_count(self.dev, direction_to_brf(direction)) })
    }

    fn set_sampling(&self, mode: SamplingMode) -> Result<(), DeviceError> {
        let mode = match mode {
            SamplingMode::Internal => BLADERF_SAMPLING_INTERNAL,
            SamplingMode::External => BLADERF_SAMPLING_EXTERNAL,
        };
        DeviceError::check(unsafe { bladerf_set_sampling(self.dev, mode) })
    }

    fn start(&self, direction: Direction) -> Result<(), DeviceError> {
        let ch = direction.channel(0).raw()?;
        DeviceError::check(unsafe { bladerf_enable_module(self.dev, ch, true) })
    }

    fn stop(&self, direction: Direction) -> Result<(), DeviceError> {
        let ch = direction.channel(0).raw()?;
        DeviceError::check(unsafe { bladerf_enable_module(self.dev, ch, false) })
    }

    fn sample_rate_range(&self, direction: Direction) -> Result<Range, DeviceError> {
        let ch = direction.channel(0).raw()?;
        range(|r| unsafe { bladerf_get_sample_rate_range(self.dev, ch, r) })
    }

    fn set_sample_rate(&self, direction: Direction, rate: f64) -> Result<f64, DeviceError> {
        let ch = direction.channel(0).raw()?;
        let mut actual: c_uint = 0;
        DeviceError::check(unsafe {
            bladerf_set_sample_rate(self.dev, ch, rate as c_uint, &mut actual)
        })?;
        Ok(actual as f64)
    }

    fn sample_rate(&self, direction: Direction) -> Result<f64, DeviceError> {
        let ch = direction.channel(0).raw()?;
        let mut rate: c_uint = 0;
        DeviceError::check(unsafe { bladerf_get_sample_rate(self.dev, ch, &mut rate) })?;
        Ok(rate as f64)
    }

    fn frequency_range(&self, channel: Channel) -> Result<Range, DeviceError> {
        let ch = channel.raw()?;
        range(|r| unsafe { bladerf_get_frequency_range(self.dev, ch, r) })
    }

    fn set_frequency(&self, channel: Channel, frequency: f64) -> Result<f64, DeviceError> {
        let ch = channel.raw()?;
        DeviceError::check(unsafe { bladerf_set_frequency(self.dev, ch, frequency as u64) })?;
        self.frequency(channel)
    }

    fn frequency(&self, channel: Channel) -> Result<f64, DeviceError> {
        let ch = channel.raw()?;
        let mut f: u64 = 0;
        DeviceError::check(unsafe { bladerf_get_frequency(self.dev, ch, &mut f) })?;
        Ok(f as f64)
    }

    fn gain_stages(&self, channel: Channel) -> Result<Vec<String>, DeviceError> {
        let ch = channel.raw()?;
        let count = unsafe { bladerf_get_gain_stages(self.dev, ch, ptr::null_mut(), 0) };
        DeviceError::check(count)?;
        let mut names: Vec<*const c_char> = vec![ptr::null(); count as usize];
        let n = unsafe { bladerf_get_gain_stages(self.dev, ch, names.as_mut_ptr(), names.len()) };
        DeviceError::check(n)?;
        Ok(names
            .into_iter()
            .take(n as usize)
            .filter(|p| !p.is_null())
            // SAFETY: stage names are static strings owned by libbladeRF
            .map(|p| unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned())
            .collect())
    }

    fn gain_range(&self, channel: Channel, stage: Option<&str>) -> Result<Range, DeviceError> {
        let ch = channel.raw()?;
        self.with_stage(stage, |s| {
            if s.is_null() {
                range(|r| unsafe { bladerf_get_gain_range(self.dev, ch, r) })
            } else {
                range(|r| unsafe { bladerf_get_gain_stage_range(self.dev, ch, s, r) })
            }
        })
    }

    fn set_gain(
        &self,
        channel: Channel,
        stage: Option<&str>,
        gain: f64,
    ) -> Result<f64, DeviceError> {
        let ch = channel.raw()?;
        let g = gain.round() as c_int;
        self.with_stage(stage, |s| {
            if s.is_null() {
                DeviceError::check(unsafe { bladerf_set_gain(self.dev, ch, g) })
            } else {
                DeviceError::check(unsafe { bladerf_set_gain_stage(self.dev, ch, s, g) })
            }
        })?;
        self.gain(channel, stage)
    }

    fn gain(&self, channel: Channel, stage: Option<&str>) -> Result<f64, DeviceError> {
        let ch = channel.raw()?;
        let mut g: c_int = 0;
        self.with_stage(stage, |s| {
            if s.is_null() {
                DeviceError::check(unsafe { bladerf_get_gain(self.dev, ch, &mut g) })
            } else {
                DeviceError::check(unsafe { bladerf_get_gain_stage(self.dev, ch, s, &mut g) })
            }
        })?;
        Ok(g as f64)
    }

    fn set_gain_mode(&self, channel: Channel, automatic: bool) -> Result<bool, DeviceError> {
        let ch = channel.raw()?;
        let mode = if automatic {
            BLADERF_GAIN_DEFAULT
        } else {
            BLADERF_GAIN_MGC
        };
        DeviceError::check(unsafe { bladerf_set_gain_mode(self.dev, ch, mode) })?;
        self.gain_mode(channel)
    }

    fn gain_mode(&self, channel: Channel) -> Result<bool, DeviceError> {
        let ch = channel.raw()?;
        let mut mode: c_int = BLADERF_GAIN_MGC;
        DeviceError::check(unsafe { bladerf_get_gain_mode(self.dev, ch, &mut mode) })?;
        Ok(mode != BLADERF_GAIN_MGC)
    }

    fn bandwidth_range(&self, channel: Channel) -> Result<Range, DeviceError> {
        let ch = channel.raw()?;
        range(|r| unsafe { bladerf_get_bandwidth_range(self.dev, ch, r) })
    }

    fn set_bandwidth(&self, channel: Channel, bandwidth: u32) -> Result<u32, DeviceError> {
        let ch = channel.raw()?;
        let mut actual: c_uint = 0;
        DeviceError::check(unsafe {
            bladerf_set_bandwidth(self.dev, ch, bandwidth as c_uint, &mut actual)
        })?;
        Ok(actual)
    }

    fn bandwidth(&self, channel: Channel) -> Result<u32, DeviceError> {
        let ch = channel.raw()?;
        let mut bw: c_uint = 0;
        DeviceError::check(unsafe { bladerf_get_bandwidth(self.dev, ch, &mut bw) })?;
        Ok(bw)
    }

    fn set_dc_offset(&self, channel: Channel, offset: Complex64) -> Result<(), DeviceError> {
        let ch = channel.raw()?;
        let i = (offset.re * DCOFF_SCALE) as i16;
        let q = (offset.im * DCOFF_SCALE) as i16;
        DeviceError::check(unsafe {
            bladerf_set_correction(self.dev, ch, BLADERF_CORR_DCOFF_I, i)
        })?;
        DeviceError::check(unsafe { bladerf_set_correction(self.dev, ch, BLADERF_CORR_DCOFF_Q, q) })
    }

    fn set_iq_balance(&self, channel: Channel, balance: Complex64) -> Result<(), DeviceError> {
        let ch = channel.raw()?;
        let gain = (balance.re * GAIN_SCALE) as i16;
        let phase = (balance.im * PHASE_SCALE) as i16;
        DeviceError::check(unsafe { bladerf_set_correction(self.dev, ch, BLADERF_CORR_GAIN, gain) })?;
        DeviceError::check(unsafe {
            bladerf_set_correction(self.dev, ch, BLADERF_CORR_PHASE, phase)
        })
    }

    fn clock_sources(&self, mboard: usize) -> Result<Vec<String>, DeviceError> {
        if mboard != 0 {
            return Err(DeviceError::Inval);
        }
        Ok(self.clock_table().iter().map(|(n, _)| n.to_string()).collect())
    }

    fn set_clock_source(&self, source: &str, mboard: usize) -> Result<(), DeviceError> {
        if mboard != 0 {
            return Err(DeviceError::Inval);
        }
        let value = self
            .clock_table()
            .iter()
            .find(|(n, _)| *n == source)
            .map(|(_, v)| *v)
            .ok_or(DeviceError::Inval)?;
        DeviceError::check(unsafe {
            match self.revision {
                BoardRevision::BladeRf1 => bladerf_set_vctcxo_tamer_mode(self.dev, value),
                BoardRevision::BladeRf2 => bladerf_set_clock_select(self.dev, value),
            }
        })
    }

    fn clock_source(&self, mboard: usize) -> Result<String, DeviceError> {
        if mboard != 0 {
            return Err(DeviceError::Inval);
        }
        let mut value: c_int = 0;
        DeviceError::check(unsafe {
            match self.revision {
                BoardRevision::BladeRf1 => bladerf_get_vctcxo_tamer_mode(self.dev, &mut value),
                BoardRevision::BladeRf2 => bladerf_get_clock_select(self.dev, &mut value),
            }
        })?;
        self.clock_table()
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(n, _)| n.to_string())
            .ok_or(DeviceError::Unexpected)
    }
}

impl SyncRx for LibBladeRf {
    fn configure(&self, direction: Direction, config: &StreamConfig) -> Result<(), DeviceError> {
        if direction != Direction::Rx {
            return Err(DeviceError::Unsupported);
        }
        let format = if config.metadata {
            BLADERF_FORMAT_SC16_Q11_META
        } else {
            BLADERF_FORMAT_SC16_Q11
        };
        DeviceError::check(unsafe {
            bladerf_sync_config(
                self.dev,
                BLADERF_RX_X1,
                format,
                config.num_buffers,
                config.buffer_size,
                config.num_transfers,
                config.timeout.as_millis() as c_uint,
            )
        })
    }

    fn sync_rx(
        &self,
        samples: &mut [i16],
        metadata: Option<&mut Metadata>,
        timeout: Duration,
    ) -> Result<(), DeviceError> {
        let meta = metadata.map_or(ptr::null_mut(), |m| m as *mut Metadata);
        DeviceError::check(unsafe {
            bladerf_sync_rx(
                self.dev,
                samples.as_mut_ptr() as *mut c_void,
                (samples.len() / 2) as c_uint,
                meta,
                timeout.as_millis() as c_uint,
            )
        })
    }
}

impl Backend for LibBladeRf {
    fn probe(args: &Args) -> Result<Vec<Args>, Error> {
        LibBladeRf::probe(args)
    }

    fn open(args: &Args) -> Result<Self, Error> {
        LibBladeRf::open(args)
    }
}
