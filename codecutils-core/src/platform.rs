use std::sync::OnceLock;

/// Facts about the host, probed once per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    little_endian: bool,
}

static PLATFORM: OnceLock<Platform> = OnceLock::new();

impl Platform {
    /// Returns the process-wide platform context.
    pub fn current() -> &'static Platform {
        PLATFORM.get_or_init(Platform::probe)
    }

    fn probe() -> Platform {
        let probe = 0x1234_5678u32.to_ne_bytes();
        Platform {
            little_endian: probe[0] == 0x78,
        }
    }

    pub fn is_little_endian(&self) -> bool {
        self.little_endian
    }
}

/// Returns true when native multi-byte numbers store the low byte first.
pub fn is_little_endian() -> bool {
    Platform::current().is_little_endian()
}
