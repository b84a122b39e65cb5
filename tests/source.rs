#![cfg(feature = "dummy")]

use bladerf_source::impls::Dummy;
use bladerf_source::BladeRfSource;
use bladerf_source::Channel;
use bladerf_source::CorrectionMode;
use bladerf_source::DeviceError;
use bladerf_source::Direction;
use bladerf_source::Error;
use bladerf_source::StreamConfig;
use bladerf_source::SyncBlock;
use bladerf_source::WorkStatus;
use bladerf_source::META_FLAG_RX_NOW;
use num_complex::Complex32;
use num_complex::Complex64;
use std::time::Duration;

fn started(args: &str) -> (Dummy, BladeRfSource<Dummy>) {
    let dev = Dummy::open(args).unwrap();
    let mut src = BladeRfSource::from_device(dev.clone(), args).unwrap();
    assert!(src.start());
    (dev, src)
}

fn block(n: usize) -> Vec<Complex32> {
    vec![Complex32::new(9.0, 9.0); n]
}

#[test]
fn start_configures_stream() {
    let (dev, mut src) =
        started("driver=dummy, buffers=16, buflen=8192, transfers=8, stream_timeout=250");
    assert_eq!(
        dev.stream_config(),
        Some(StreamConfig {
            num_buffers: 16,
            buffer_size: 8192,
            num_transfers: 8,
            timeout: Duration::from_millis(250),
            metadata: false,
        })
    );
    assert!(dev.is_streaming(Direction::Rx));
    assert!(src.stop());
    assert!(!dev.is_streaming(Direction::Rx));
}

#[test]
fn scratch_grows_monotonically() {
    let (_dev, mut src) = started("driver=dummy");
    assert_eq!(src.scratch_capacity(), 0);
    for (n, expected) in [(16, 16), (1024, 1024), (8, 1024), (2048, 2048), (0, 2048)] {
        let mut out = block(n);
        assert_eq!(src.work(&mut out).unwrap(), WorkStatus::Produced(n));
        assert_eq!(src.scratch_capacity(), expected);
    }
}

#[test]
fn converts_sc16_q11() {
    let (dev, mut src) = started("driver=dummy");
    let mut out = block(4);

    dev.set_constant(2048, -2048);
    src.work(&mut out).unwrap();
    assert!(out.iter().all(|s| *s == Complex32::new(1.0, -1.0)));

    dev.set_constant(0, 0);
    src.work(&mut out).unwrap();
    assert!(out.iter().all(|s| *s == Complex32::new(0.0, 0.0)));

    dev.set_constant(1024, -512);
    src.work(&mut out).unwrap();
    assert!(out.iter().all(|s| *s == Complex32::new(0.5, -0.25)));
}

#[test]
fn default_tone() {
    let (_dev, mut src) = started("driver=dummy");
    let mut out = block(4);
    src.work(&mut out).unwrap();
    let a = 1448.0 / 2048.0;
    assert_eq!(
        out,
        [
            Complex32::new(a, 0.0),
            Complex32::new(0.0, a),
            Complex32::new(-a, 0.0),
            Complex32::new(0.0, -a),
        ]
    );
}

#[test]
fn gives_up_after_consecutive_failures() {
    let (dev, mut src) = started("driver=dummy");
    let mut out = block(8);
    dev.fail_next(3);
    assert_eq!(src.work(&mut out).unwrap(), WorkStatus::Produced(8));
    assert_eq!(src.work(&mut out).unwrap(), WorkStatus::Produced(8));
    assert_eq!(src.work(&mut out).unwrap(), WorkStatus::Done);
    assert!(src.is_done());
    assert_eq!(dev.transfer_count(), 3);

    assert_eq!(src.work(&mut out).unwrap(), WorkStatus::Done);
    assert_eq!(dev.transfer_count(), 3);
}

#[test]
fn success_resets_failure_counter() {
    let (dev, mut src) = started("driver=dummy");
    let mut out = block(8);
    for _ in 0..3 {
        dev.fail_next(2);
        assert_eq!(src.work(&mut out).unwrap(), WorkStatus::Produced(8));
        assert_eq!(src.work(&mut out).unwrap(), WorkStatus::Produced(8));
        assert_eq!(src.consecutive_failures(), 2);
        assert_eq!(src.work(&mut out).unwrap(), WorkStatus::Produced(8));
        assert_eq!(src.consecutive_failures(), 0);
    }
    assert!(!src.is_done());
}

#[test]
fn failed_transfer_yields_silence() {
    let (dev, mut src) = started("driver=dummy");
    let mut out = block(8);
    dev.set_constant(2048, 2048);
    src.work(&mut out).unwrap();

    dev.fail_next(1);
    assert_eq!(src.work(&mut out).unwrap(), WorkStatus::Produced(8));
    assert!(!dev.last_transfer().unwrap().ok);
    assert!(out.iter().all(|s| *s == Complex32::new(0.0, 0.0)));
}

#[test]
fn restart_after_done() {
    let (dev, mut src) = started("driver=dummy");
    let mut out = block(8);
    dev.fail_next(3);
    while src.work(&mut out).unwrap() != WorkStatus::Done {}
    assert!(src.stop());
    assert!(src.start());
    assert_eq!(src.work(&mut out).unwrap(), WorkStatus::Produced(8));
}

#[test]
fn transfer_parameters() {
    let (dev, mut src) = started("driver=dummy, stream_timeout=500");
    let mut out = block(32);
    src.work(&mut out).unwrap();
    let t = dev.last_transfer().unwrap();
    assert_eq!(t.samples, 32);
    assert_eq!(t.timeout, Duration::from_millis(500));
    assert_eq!(t.flags, None);

    let (dev, mut src) = started("driver=dummy, enable_metadata=1");
    assert!(dev.stream_config().unwrap().metadata);
    src.work(&mut out).unwrap();
    let t = dev.last_transfer().unwrap();
    assert!(t.ok);
    assert_eq!(t.flags, Some(META_FLAG_RX_NOW));
}

#[test]
fn work_through_host_contract() {
    let dev = Dummy::open("driver=dummy").unwrap();
    let mut host: Box<dyn SyncBlock> =
        Box::new(BladeRfSource::from_device(dev.clone(), "driver=dummy").unwrap());
    assert!(host.start());
    let mut out = block(64);
    assert_eq!(host.work(&mut out).unwrap(), WorkStatus::Produced(64));
    assert!(host.stop());
    drop(host);
    assert!(!dev.is_streaming(Direction::Rx));
}

#[test]
fn open_by_driver() {
    let mut src = BladeRfSource::open("driver=dummy, revision=1").unwrap();
    assert_eq!(src.num_channels().unwrap(), 1);
    assert!(src.start());
    let mut out = block(16);
    assert_eq!(src.work(&mut out).unwrap(), WorkStatus::Produced(16));

    let src = BladeRfSource::<Dummy>::new("driver=dummy").unwrap();
    assert_eq!(src.num_channels().unwrap(), 2);

    assert_eq!(
        BladeRfSource::open("driver=dummy, buflen=100").err(),
        Some(Error::ValueError)
    );
    assert_eq!(
        BladeRfSource::<Dummy>::new("bladerf=0").err(),
        Some(Error::NotFound)
    );
}

#[test]
fn default_bandwidth_follows_sample_rate() {
    let (_dev, mut src) = started("driver=dummy");
    assert_eq!(src.set_sample_rate(10e6).unwrap(), 10e6);
    assert_eq!(src.set_bandwidth(0.0, 0).unwrap(), 7.5e6);
    assert_eq!(src.bandwidth(0).unwrap(), 7.5e6);

    let (_dev, mut src) = started("driver=dummy, revision=1");
    src.set_sample_rate(4e6).unwrap();
    assert_eq!(src.set_bandwidth(0.0, 0).unwrap(), 3e6);
    assert_eq!(src.set_bandwidth(4e6, 0).unwrap(), 5e6);
}

#[test]
fn bandwidth_hardware_errors() {
    let (_dev, mut src) = started("driver=dummy, revision=1");
    assert_eq!(
        src.set_bandwidth(30e6, 0),
        Err(Error::Hardware {
            op: "set bandwidth",
            source: DeviceError::Range,
        })
    );
    assert_eq!(
        src.bandwidth(1),
        Err(Error::Hardware {
            op: "read bandwidth",
            source: DeviceError::Inval,
        })
    );
}

#[test]
fn antennas_by_revision() {
    let (_dev, src) = started("driver=dummy, revision=1");
    assert_eq!(src.antennas(0), ["RX0"]);
    let (_dev, mut src) = started("driver=dummy, revision=2");
    assert_eq!(src.antennas(0), ["RX0", "RX1"]);

    assert_eq!(src.set_antenna("RX1", 0), "RX0");
    assert_eq!(src.antenna(0), "RX0");
}

#[test]
fn no_frequency_correction() {
    let (_dev, mut src) = started("driver=dummy");
    assert!(!src.has_freq_corr());
    assert_eq!(src.freq_corr(0), 0.0);
    assert!(matches!(src.set_freq_corr(1.5, 0), Err(Error::NotSupported(_))));
    assert_eq!(src.freq_corr(0), 0.0);
}

#[test]
fn dc_offset_and_iq_balance() {
    let (dev, mut src) = started("driver=dummy");
    let ch = Channel::rx(0);
    let v = Complex64::new(0.5, -0.25);

    src.set_dc_offset(v, 0).unwrap();
    src.set_dc_offset_mode(CorrectionMode::Manual, 0).unwrap();
    assert_eq!(dev.dc_offset(ch), Some(v));
    src.set_dc_offset_mode(CorrectionMode::Off, 0).unwrap();
    assert_eq!(dev.dc_offset(ch), Some(Complex64::new(0.0, 0.0)));

    src.set_iq_balance(v, 0).unwrap();
    assert_eq!(dev.iq_balance(ch), Some(v));
    src.set_iq_balance_mode(CorrectionMode::Off, 0).unwrap();
    assert_eq!(dev.iq_balance(ch), Some(Complex64::new(0.0, 0.0)));

    assert!(matches!(
        src.set_dc_offset_mode(CorrectionMode::Automatic, 0),
        Err(Error::NotSupported(_))
    ));
    assert!(matches!(
        src.set_iq_balance_mode(CorrectionMode::Automatic, 0),
        Err(Error::NotSupported(_))
    ));

    assert_eq!(
        src.set_dc_offset(Complex64::new(2.0, 0.0), 0),
        Err(Error::Hardware {
            op: "set DC offset",
            source: DeviceError::Range,
        })
    );
    assert_eq!(
        src.set_iq_balance(Complex64::new(0.0, -3.0), 0),
        Err(Error::Hardware {
            op: "set IQ balance",
            source: DeviceError::Range,
        })
    );
}

#[test]
fn tuning_and_gain() {
    let (_dev, mut src) = started("driver=dummy, revision=1");
    assert_eq!(src.set_center_freq(433.92e6, 0).unwrap(), 433.92e6);
    assert_eq!(src.center_freq(0).unwrap(), 433.92e6);
    assert!(src.freq_range(0).unwrap().contains(1e9));
    assert!(src.set_center_freq(100e6, 0).is_err());

    assert_eq!(src.gain_names(0).unwrap(), ["lna", "rxvga1", "rxvga2"]);
    assert_eq!(src.set_gain_named(14.0, "rxvga2", 0).unwrap(), 15.0);
    assert_eq!(src.gain_named("rxvga2", 0).unwrap(), 15.0);
    assert_eq!(src.gain_range_named("lna", 0).unwrap().stop(), Some(6.0));
    assert_eq!(src.gain_range(0).unwrap().start(), Some(5.0));
    assert_eq!(src.set_gain(100.0, 0).unwrap(), 66.0);
    assert_eq!(src.gain(0).unwrap(), 66.0);

    assert!(src.set_gain_mode(true, 0).unwrap());
    assert!(src.gain_mode(0).unwrap());
}

#[test]
fn clock_sources() {
    let (_dev, mut src) = started("driver=dummy, revision=2");
    assert_eq!(src.clock_sources(0).unwrap(), ["onboard", "external"]);
    assert_eq!(src.clock_source(0).unwrap(), "onboard");
    src.set_clock_source("external", 0).unwrap();
    assert_eq!(src.clock_source(0).unwrap(), "external");
    assert_eq!(
        src.set_clock_source("external_10mhz", 0),
        Err(Error::Device(DeviceError::Inval))
    );
}

#[test]
fn sample_rates() {
    let (_dev, mut src) = started("driver=dummy, revision=1");
    let rates = src.sample_rates().unwrap();
    assert_eq!(rates.start(), Some(160e3));
    assert_eq!(rates.stop(), Some(40e6));
    assert_eq!(src.set_sample_rate(100e6).unwrap(), 40e6);
    assert_eq!(src.sample_rate().unwrap(), 40e6);
}

#[test]
fn out_of_range_channel_is_rejected() {
    let (dev, mut src) = started("driver=dummy, revision=1");
    let rx0 = src.center_freq(0).unwrap();
    let gain = src.gain(0).unwrap();

    assert!(src.set_center_freq(433.92e6, 128).is_err());
    assert!(src.set_gain(10.0, 256).is_err());
    assert!(src.set_dc_offset(Complex64::new(0.5, 0.5), 128).is_err());
    assert!(src.center_freq(usize::MAX).is_err());

    assert_eq!(src.center_freq(0).unwrap(), rx0);
    assert_eq!(src.gain(0).unwrap(), gain);
    assert_eq!(dev.dc_offset(Channel::rx(0)), Some(Complex64::new(0.0, 0.0)));
}

#[test]
fn short_read_tail_is_silent() {
    let (dev, mut src) = started("driver=dummy, enable_metadata=1");
    let mut out = block(8);
    dev.set_constant(2048, 2048);
    src.work(&mut out).unwrap();
    assert!(out.iter().all(|s| *s == Complex32::new(1.0, 1.0)));

    dev.set_constant(-2048, -2048);
    dev.short_next(3);
    assert_eq!(src.work(&mut out).unwrap(), WorkStatus::Produced(8));
    assert!(out[..3].iter().all(|s| *s == Complex32::new(-1.0, -1.0)));
    assert!(out[3..].iter().all(|s| *s == Complex32::new(0.0, 0.0)));
    assert_eq!(src.consecutive_failures(), 0);
}
