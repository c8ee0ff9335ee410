use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The decoder met an opcode with no defined instruction. The CPU stays locked afterwards.
    #[error("unknown {} opcode {opcode:#04x} at pc {pc:#06x}", opcode_table(.prefixed))]
    UnknownOpcode { opcode: u8, pc: u16, prefixed: bool },

    #[error("cartridge type {code:#04x} is not supported")]
    UnsupportedCartridge { code: u8 },

    #[error("unsupported cartridge configuration: {0}")]
    UnsupportedConfiguration(String),

    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Message(String),
}

fn opcode_table(prefixed: &bool) -> &'static str {
    if *prefixed {
        "0xcb-prefixed"
    } else {
        "base"
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn from_message(msg: String) -> Self {
        Error::Message(msg)
    }

    pub fn unsupported_feature(feature: impl Into<String>) -> Self {
        Error::UnsupportedFeature(feature.into())
    }
}
