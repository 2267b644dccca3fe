use core::fmt;

/// One of the two regulated tanks.
///
/// The rig pairs every tank with exactly one inlet control valve, so the same
/// letter identifies the tank, its level sensor and its valve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TankId {
    A,
    B,
}

impl TankId {
    pub const ALL: [TankId; 2] = [TankId::A, TankId::B];

    /// Valve that feeds this tank.
    pub fn valve(self) -> ValveId {
        match self {
            TankId::A => ValveId::A,
            TankId::B => ValveId::B,
        }
    }

    /// 0-based position used for fixed-size per-tank arrays.
    pub fn index(self) -> usize {
        match self {
            TankId::A => 0,
            TankId::B => 1,
        }
    }

    /// 1-based number used in operator-facing labels ("Tank 1").
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    fn letter(self) -> char {
        match self {
            TankId::A => 'A',
            TankId::B => 'B',
        }
    }
}

impl fmt::Display for TankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tank-{}", self.letter())
    }
}

/// One of the two proportional control valves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValveId {
    A,
    B,
}

impl ValveId {
    pub const ALL: [ValveId; 2] = [ValveId::A, ValveId::B];

    pub fn tank(self) -> TankId {
        match self {
            ValveId::A => TankId::A,
            ValveId::B => TankId::B,
        }
    }

    pub fn index(self) -> usize {
        self.tank().index()
    }

    pub fn number(self) -> u8 {
        self.tank().number()
    }
}

impl fmt::Display for ValveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "valve-{}", self.tank().letter())
    }
}

/// Calibrated sensor channel.
///
/// Level channels report percent-full; valve feedback channels report the
/// measured opening as a fraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "id"))]
pub enum ChannelId {
    TankLevel(TankId),
    ValveFeedback(ValveId),
}

impl ChannelId {
    /// Every channel the controller samples, in ADC input order.
    pub const ALL: [ChannelId; 4] = [
        ChannelId::TankLevel(TankId::A),
        ChannelId::TankLevel(TankId::B),
        ChannelId::ValveFeedback(ValveId::A),
        ChannelId::ValveFeedback(ValveId::B),
    ];

    /// Position in [`ChannelId::ALL`].
    pub fn index(self) -> usize {
        match self {
            ChannelId::TankLevel(tank) => tank.index(),
            ChannelId::ValveFeedback(valve) => 2 + valve.index(),
        }
    }

    pub fn is_level(self) -> bool {
        matches!(self, ChannelId::TankLevel(_))
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelId::TankLevel(tank) => write!(f, "{tank}-level"),
            ChannelId::ValveFeedback(valve) => write!(f, "{valve}-feedback"),
        }
    }
}
