use bladerf_source::enumerate;
use bladerf_source::BladeRfSource;

pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = std::env::args().nth(1).unwrap_or_default();

    let devs = enumerate(filter.as_str())?;
    println!("Devices");
    println!("=========================================");
    println!("devs: {devs:?}");

    for d in devs {
        let src = BladeRfSource::open(d.clone())?;

        println!();
        println!("Device ({d})");
        println!("=========================================");

        println!("revision:     {:?}", src.device().board_revision());
        println!("channels:     {:?}", src.num_channels()?);
        println!("antennas:     {:?}", src.antennas(0));
        println!("sample rate:  {:?}", src.sample_rate()?);
        println!("frequency:    {:?}", src.center_freq(0)?);
        println!("gain stages:  {:?}", src.gain_names(0)?);
        println!("gain:         {:?}", src.gain(0)?);
        println!("gain range:   {:?}", src.gain_range(0)?);
        println!("bandwidth:    {:?}", src.bandwidth(0)?);
        println!("clock source: {:?}", src.clock_source(0)?);
        println!("sample rate range: {:?}", src.sample_rates()?);
        println!("frequency range:   {:?}", src.freq_range(0)?);
    }

    Ok(())
}
