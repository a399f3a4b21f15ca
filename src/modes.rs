mod sealed {
    pub trait Sealed {}
}

pub trait ActiveMode: sealed::Sealed {
    const MODE: Modes;
}

macro_rules! impl_mode {
    ($mode:ident) => {
        impl sealed::Sealed for $mode {}
        impl ActiveMode for $mode {
            const MODE: Modes = Modes::$mode;
        }
    };
}

/// Raw bitbang mode, the entry point to every binary protocol mode.
pub struct Bitbang;
impl_mode!(Bitbang);

pub struct I2c;
impl_mode!(I2c);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modes {
    Bitbang,
    I2c,
}

impl Modes {
    pub fn name(&self) -> &'static str {
        match self {
            Modes::Bitbang => "bitbang",
            Modes::I2c => "I2C",
        }
    }

    /// The version string the Bus Pirate answers with on entering the mode.
    pub(crate) fn id(&self) -> &'static str {
        match self {
            Modes::Bitbang => "BBIO1",
            Modes::I2c => "I2C1",
        }
    }
}
