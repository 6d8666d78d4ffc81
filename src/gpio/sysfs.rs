//! Linux sysfs GPIO backend (`/sys/class/gpio`).

use super::{Direction, Gpio};
use crate::error::{GlowError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// errno returned by the kernel when exporting an already exported pin.
const EBUSY: i32 = 16;

pub struct SysfsGpio {
    root: PathBuf,
}

impl SysfsGpio {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn pin_file(&self, pin: u32, name: &str) -> PathBuf {
        self.root.join(format!("gpio{pin}")).join(name)
    }

    fn write(path: &Path, pin: u32, op: &'static str, data: &str) -> Result<()> {
        std::fs::write(path, data).map_err(|source| GlowError::Gpio { pin, op, source })
    }
}

/// Parse the contents of a sysfs `value` file.
fn parse_level(pin: u32, raw: &str) -> Result<bool> {
    if raw.contains('1') {
        Ok(true)
    } else if raw.contains('0') {
        Ok(false)
    } else {
        Err(GlowError::GpioValue {
            pin,
            raw: raw.to_string(),
        })
    }
}

impl Gpio for SysfsGpio {
    fn export(&self, pin: u32) -> Result<()> {
        match std::fs::write(self.root.join("export"), pin.to_string()) {
            Ok(()) => Ok(()),
            Err(e) if e.raw_os_error() == Some(EBUSY) => {
                debug!("gpio {pin} already exported");
                Ok(())
            }
            Err(source) => Err(GlowError::Gpio {
                pin,
                op: "export",
                source,
            }),
        }
    }

    fn unexport(&self, pin: u32) -> Result<()> {
        Self::write(&self.root.join("unexport"), pin, "unexport", &pin.to_string())
    }

    fn set_direction(&self, pin: u32, direction: Direction) -> Result<()> {
        Self::write(
            &self.pin_file(pin, "direction"),
            pin,
            "set direction",
            direction.as_str(),
        )
    }

    fn read_value(&self, pin: u32) -> Result<bool> {
        let raw = std::fs::read_to_string(self.pin_file(pin, "value")).map_err(|source| {
            GlowError::Gpio {
                pin,
                op: "read",
                source,
            }
        })?;
        parse_level(pin, &raw)
    }

    fn write_value(&self, pin: u32, value: bool) -> Result<()> {
        Self::write(
            &self.pin_file(pin, "value"),
            pin,
            "write",
            if value { "1" } else { "0" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("glowd-sysfs-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("gpio5")).unwrap();
        dir
    }

    #[test]
    fn parse_level_values() {
        assert!(parse_level(1, "1\n").unwrap());
        assert!(!parse_level(1, "0\n").unwrap());
        assert!(matches!(
            parse_level(1, ""),
            Err(GlowError::GpioValue { pin: 1, .. })
        ));
    }

    #[test]
    fn writes_sysfs_files() {
        let root = scratch_root("write");
        let gpio = SysfsGpio::new(&root);

        gpio.export(5).unwrap();
        assert_eq!(std::fs::read_to_string(root.join("export")).unwrap(), "5");

        gpio.set_direction(5, Direction::Out).unwrap();
        assert_eq!(
            std::fs::read_to_string(root.join("gpio5/direction")).unwrap(),
            "out"
        );

        gpio.write_value(5, true).unwrap();
        assert!(gpio.read_value(5).unwrap());
        gpio.write_value(5, false).unwrap();
        assert!(!gpio.read_value(5).unwrap());

        gpio.unexport(5).unwrap();
        assert_eq!(std::fs::read_to_string(root.join("unexport")).unwrap(), "5");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_pin_reports_context() {
        let root = scratch_root("missing");
        let gpio = SysfsGpio::new(&root);
        let err = gpio.read_value(99).unwrap_err();
        assert!(matches!(err, GlowError::Gpio { pin: 99, op: "read", .. }));
        let _ = std::fs::remove_dir_all(&root);
    }
}
