use crate::error::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sensor channels feeding the estimation pipeline.
/// Each channel owns one bit of a [SensorSet].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SensorChannel {
    /// Rate gyroscope (rad.s⁻¹, body frame)
    Gyroscope,
    /// Accelerometer (m.s⁻², body frame)
    Accelerometer,
    /// Magnetometer (body frame, any consistent unit)
    Magnetometer,
    /// GPS position, linearized to NED meters about the home reference
    Position,
    /// GPS velocity (NED, m.s⁻¹)
    Velocity,
    /// Barometric altitude (m)
    Barometer,
    /// Calibrated airspeed (m.s⁻¹)
    Airspeed,
}

impl SensorChannel {
    /// All channels, in bit order
    pub const ALL: [Self; 7] = [
        Self::Gyroscope,
        Self::Accelerometer,
        Self::Magnetometer,
        Self::Position,
        Self::Velocity,
        Self::Barometer,
        Self::Airspeed,
    ];

    /// Bit identifying this channel in a [SensorSet]
    pub const fn bit(&self) -> u8 {
        match self {
            Self::Gyroscope => 1 << 0,
            Self::Accelerometer => 1 << 1,
            Self::Magnetometer => 1 << 2,
            Self::Position => 1 << 3,
            Self::Velocity => 1 << 4,
            Self::Barometer => 1 << 5,
            Self::Airspeed => 1 << 6,
        }
    }
}

impl std::fmt::Display for SensorChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gyroscope => write!(f, "gyroscope"),
            Self::Accelerometer => write!(f, "accelerometer"),
            Self::Magnetometer => write!(f, "magnetometer"),
            Self::Position => write!(f, "position"),
            Self::Velocity => write!(f, "velocity"),
            Self::Barometer => write!(f, "barometer"),
            Self::Airspeed => write!(f, "airspeed"),
        }
    }
}

impl std::str::FromStr for SensorChannel {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gyr" | "gyro" | "gyroscope" => Ok(Self::Gyroscope),
            "acc" | "accel" | "accelerometer" => Ok(Self::Accelerometer),
            "mag" | "magnetometer" => Ok(Self::Magnetometer),
            "pos" | "position" => Ok(Self::Position),
            "vel" | "velocity" => Ok(Self::Velocity),
            "bar" | "baro" | "barometer" => Ok(Self::Barometer),
            "ias" | "airspeed" => Ok(Self::Airspeed),
            _ => Err(Error::UnknownChannel),
        }
    }
}

/// Set of [SensorChannel]s, stored as a bitmask.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SensorSet(u8);

impl SensorSet {
    /// Mask covering every known channel
    const MASK: u8 = 0x7f;

    /// Builds an empty [SensorSet]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Builds a [SensorSet] containing all channels
    pub const fn all() -> Self {
        Self(Self::MASK)
    }

    /// Builds [SensorSet] from raw bits. Unknown bits are discarded.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::MASK)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn contains(&self, channel: SensorChannel) -> bool {
        self.0 & channel.bit() != 0
    }

    pub fn insert(&mut self, channel: SensorChannel) {
        self.0 |= channel.bit();
    }

    pub fn remove(&mut self, channel: SensorChannel) {
        self.0 &= !channel.bit();
    }

    /// Copies and returns a new [SensorSet] with this channel added
    pub fn with(&self, channel: SensorChannel) -> Self {
        let mut s = *self;
        s.insert(channel);
        s
    }

    /// Number of channels in this set
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates the channels contained in this set, in bit order
    pub fn iter(&self) -> impl Iterator<Item = SensorChannel> + '_ {
        SensorChannel::ALL
            .into_iter()
            .filter(move |channel| self.contains(*channel))
    }
}

impl FromIterator<SensorChannel> for SensorSet {
    fn from_iter<I: IntoIterator<Item = SensorChannel>>(iter: I) -> Self {
        let mut s = Self::empty();
        for channel in iter {
            s.insert(channel);
        }
        s
    }
}

impl std::fmt::Display for SensorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, channel) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", channel)?;
        }
        write!(f, "}}")
    }
}
