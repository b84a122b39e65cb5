use clap::Parser;
use num_complex::Complex32;
use std::error::Error;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use bladerf_source::BladeRfSource;
use bladerf_source::SyncBlock;
use bladerf_source::WorkStatus;

#[derive(Parser, Debug)]
#[clap(version)]
struct Args {
    /// Device Arguments
    #[clap(short, long, default_value = "driver=dummy")]
    args: String,
    /// Center Frequency
    #[clap(short, long, default_value_t = 915e6)]
    frequency: f64,
    /// Sample Rate
    #[clap(short, long, default_value_t = 4e6)]
    sample_rate: f64,
    /// Gain
    #[clap(short, long, default_value_t = 30.0)]
    gain: f64,
    /// Samples per Block
    #[clap(short, long, default_value_t = 8192)]
    block: usize,
    /// Number of Blocks, 0 to run until Ctrl-C
    #[clap(short, long, default_value_t = 0)]
    num_blocks: usize,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Args::parse();

    let mut src = BladeRfSource::open(cli.args.as_str())?;
    src.set_sample_rate(cli.sample_rate)?;
    src.set_center_freq(cli.frequency, 0)?;
    src.set_gain(cli.gain, 0)?;
    src.set_bandwidth(0.0, 0)?;

    println!("sample rate: {:?}", src.sample_rate()?);
    println!("frequency:   {:?}", src.center_freq(0)?);
    println!("gain:        {:?}", src.gain(0)?);
    println!("bandwidth:   {:?}", src.bandwidth(0)?);
    println!("antenna:     {:?}", src.antenna(0));
    println!("stream:      {:?}", src.config().stream_config());

    let terminate = Arc::new(AtomicBool::new(false));
    ctrlc::set_handler({
        let terminate = terminate.clone();
        move || {
            println!("terminating...");
            terminate.store(true, Ordering::Relaxed);
        }
    })?;

    let mut block: Box<dyn SyncBlock> = Box::new(src);
    if !block.start() {
        return Err("could not start receiver".into());
    }

    let mut samples = vec![Complex32::new(0.0, 0.0); cli.block];
    let mut received = 0;
    while !terminate.load(Ordering::Relaxed) && (cli.num_blocks == 0 || received < cli.num_blocks)
    {
        match block.work(&mut samples)? {
            WorkStatus::Produced(n) => {
                let power =
                    samples[..n].iter().map(|s| s.norm_sqr()).sum::<f32>() / n.max(1) as f32;
                println!(
                    "received {n} samples, mean power {:.2} dBFS",
                    10.0 * power.log10()
                );
                received += 1;
            }
            WorkStatus::Done => {
                println!("receiver gave up");
                break;
            }
        }
    }

    block.stop();
    Ok(())
}
