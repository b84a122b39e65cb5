use crate::DeviceError;

/// Direction of a data path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Rx,
    Tx,
}

impl Direction {
    /// Channel `index` in this direction.
    pub fn channel(self, index: usize) -> Channel {
        match self {
            Direction::Rx => Channel::rx(index),
            Direction::Tx => Channel::tx(index),
        }
    }
}

/// Hardware channel identifier.
///
/// The raw encoding follows libbladeRF: the logical index is shifted left by one and the
/// lowest bit carries the direction (`0` for RX, `1` for TX). `Channel::rx(0)` is therefore also
/// the identifier of the RX module as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Channel {
    index: usize,
    direction: Direction,
}

impl Channel {
    pub fn rx(index: usize) -> Self {
        Self {
            index,
            direction: Direction::Rx,
        }
    }

    pub fn tx(index: usize) -> Self {
        Self {
            index,
            direction: Direction::Tx,
        }
    }

    /// Zero-based logical index within its direction.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Raw libbladeRF channel value.
    ///
    /// Fails with [`DeviceError::Inval`] if the index does not fit the encoding.
    pub fn raw(&self) -> Result<i32, DeviceError> {
        let bit = match self.direction {
            Direction::Rx => 0,
            Direction::Tx => 1,
        };
        i32::try_from(self.index)
            .ok()
            .and_then(|i| i.checked_mul(2))
            .map(|r| r | bit)
            .ok_or(DeviceError::Inval)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.direction() {
            Direction::Rx => write!(f, "RX{}", self.index()),
            Direction::Tx => write!(f, "TX{}", self.index()),
        }
    }
}
