use std::path::{Path, PathBuf};

/// Settings for one emulation session, usually built from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorConfig {
    pub rom_path: PathBuf,
    /// 256 byte boot ROM. Without one the machine starts in the post-boot state.
    pub boot_rom_path: Option<PathBuf>,
    /// Where battery-backed cartridge RAM is kept. Defaults to the ROM path with a `.sav` extension.
    pub save_path: Option<PathBuf>,
    /// Start paused, waiting for a resume or step request.
    pub start_paused: bool,
    /// Pace emulation to the hardware frame rate.
    pub throttled: bool,
    pub breakpoints: Vec<u16>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            rom_path: PathBuf::new(),
            boot_rom_path: None,
            save_path: None,
            start_paused: false,
            throttled: true,
            breakpoints: Vec::new(),
        }
    }
}

impl EmulatorConfig {
    pub fn new(rom_path: impl AsRef<Path>) -> Self {
        Self {
            rom_path: rom_path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn save_path(&self) -> PathBuf {
        self.save_path
            .clone()
            .unwrap_or_else(|| self.rom_path.with_extension("sav"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_path_defaults_next_to_rom() {
        let config = EmulatorConfig::new("roms/tetris.gb");
        assert_eq!(PathBuf::from("roms/tetris.sav"), config.save_path());
        assert!(config.throttled);

        let config = EmulatorConfig {
            save_path: Some(PathBuf::from("/tmp/slot1.sav")),
            ..config
        };
        assert_eq!(PathBuf::from("/tmp/slot1.sav"), config.save_path());
    }
}
