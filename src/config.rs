use serde::Deserialize;
use serde_with::serde_as;
use serde_with::DisplayFromStr;
use std::str::FromStr;
use std::time::Duration;

use crate::Args;
use crate::Error;
use crate::StreamConfig;

/// Boolean argument value.
///
/// Accepts `1`, `true`, `yes`, `on` and `0`, `false`, `no`, `off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flag(pub bool);

impl FromStr for Flag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Flag(true)),
            "0" | "false" | "no" | "off" => Ok(Flag(false)),
            _ => Err(Error::ValueError),
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", if self.0 { 1 } else { 0 })
    }
}

/// Stream and adapter options read from the construction [`Args`].
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Number of sample buffers of the synchronous interface.
    #[serde_as(as = "DisplayFromStr")]
    pub buffers: u32,
    /// Samples per buffer.
    #[serde_as(as = "DisplayFromStr")]
    pub buflen: u32,
    /// Number of USB transfers in flight.
    #[serde_as(as = "DisplayFromStr")]
    pub transfers: u32,
    /// Timeout of a single transfer in milliseconds.
    #[serde_as(as = "DisplayFromStr")]
    pub stream_timeout: u32,
    /// Tag transfers with metadata requesting immediate reception.
    #[serde_as(as = "DisplayFromStr")]
    pub enable_metadata: Flag,
    /// Initial automatic gain control mode, left untouched if unset.
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub agc: Option<Flag>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            buffers: 32,
            buflen: 4096,
            transfers: 16,
            stream_timeout: 3000,
            enable_metadata: Flag(false),
            agc: None,
        }
    }
}

impl SourceConfig {
    /// Read the options from `args`, ignoring keys that are not options.
    pub fn from_args(args: &Args) -> Result<Self, Error> {
        let config: SourceConfig = args.deserialize()?;
        if config.buflen == 0 || config.buflen % 1024 != 0 {
            log::warn!("buflen must be a non-zero multiple of 1024, got {}", config.buflen);
            return Err(Error::ValueError);
        }
        if config.transfers == 0 || config.transfers >= config.buffers {
            log::warn!(
                "transfers ({}) must be non-zero and less than buffers ({})",
                config.transfers,
                config.buffers
            );
            return Err(Error::ValueError);
        }
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.stream_timeout as u64)
    }

    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            num_buffers: self.buffers,
            buffer_size: self.buflen,
            num_transfers: self.transfers,
            timeout: self.timeout(),
            metadata: self.enable_metadata.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = SourceConfig::from_args(&Args::new()).unwrap();
        assert_eq!(c, SourceConfig::default());
        assert_eq!(c.timeout(), Duration::from_millis(3000));
        assert!(!c.stream_config().metadata);
    }
    #[test]
    fn unrelated_keys_ignored() {
        let a: Args = "bladerf=0,sampling=bogus,stream_timeout=250".parse().unwrap();
        let c = SourceConfig::from_args(&a).unwrap();
        assert_eq!(c.stream_timeout, 250);
        assert_eq!(c.buffers, 32);
    }
    #[test]
    fn stream_parameters() {
        let a: Args = "buffers=64,buflen=8192,transfers=32,enable_metadata=yes,agc=0"
            .parse()
            .unwrap();
        let c = SourceConfig::from_args(&a).unwrap();
        assert_eq!(c.agc, Some(Flag(false)));
        let s = c.stream_config();
        assert_eq!(s.num_buffers, 64);
        assert_eq!(s.buffer_size, 8192);
        assert_eq!(s.num_transfers, 32);
        assert!(s.metadata);
    }
    #[test]
    fn invalid_values() {
        for a in [
            "stream_timeout=soon",
            "buflen=1000",
            "buffers=8,transfers=8",
            "enable_metadata=maybe",
        ] {
            let a: Args = a.parse().unwrap();
            assert_eq!(SourceConfig::from_args(&a), Err(Error::ValueError), "{a}");
        }
    }
    #[test]
    fn flag() {
        assert_eq!("ON".parse::<Flag>(), Ok(Flag(true)));
        assert_eq!("0".parse::<Flag>(), Ok(Flag(false)));
        assert!("2".parse::<Flag>().is_err());
    }
}
