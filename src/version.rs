//! Format version shared by keymap documents and song files
//!
//! Packed as `major << 24 | minor << 16 | patch << 8 | build`, which is also
//! the value stored in `.fpm` headers.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version(pub u32);

impl Version {
    /// Version written by this crate
    pub const CURRENT: Version = Version::new(1, 8, 0, 0);
    /// Note names moved up one octave
    pub const V1_7: Version = Version::new(1, 7, 0, 0);
    /// Program takes its op before the value; Controller became raw MIDI
    pub const V1_8: Version = Version::new(1, 8, 0, 0);
    /// Assumed for keymaps without a `FreePiano` header
    pub const OLDEST: Version = Version(0);

    pub const fn new(major: u8, minor: u8, patch: u8, build: u8) -> Self {
        Version(
            (major as u32) << 24 | (minor as u32) << 16 | (patch as u32) << 8 | build as u32,
        )
    }

    pub const fn major(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn minor(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn patch(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn build(self) -> u8 {
        self.0 as u8
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())?;
        if self.patch() != 0 || self.build() != 0 {
            write!(f, ".{}", self.patch())?;
        }
        if self.build() != 0 {
            write!(f, ".{}", self.build())?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = ();

    /// `major.minor[.patch[.build]]`, each part 0..=255
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = [0u8; 4];
        let mut count = 0;
        for part in s.split('.') {
            if count == parts.len() {
                return Err(());
            }
            parts[count] = part.parse().map_err(|_| ())?;
            count += 1;
        }
        if count < 2 {
            return Err(());
        }
        Ok(Version::new(parts[0], parts[1], parts[2], parts[3]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing() {
        assert_eq!(Version::CURRENT.0, 0x01080000);
        assert_eq!(Version::V1_7.0, 0x01070000);
        assert!(Version::V1_7 < Version::CURRENT);
    }

    #[test]
    fn test_parse() {
        assert_eq!("1.8".parse(), Ok(Version::CURRENT));
        assert_eq!("1.7.2".parse(), Ok(Version::new(1, 7, 2, 0)));
        assert_eq!("1.8.0.3".parse(), Ok(Version(0x01080003)));
        assert_eq!("1".parse::<Version>(), Err(()));
        assert_eq!("1.8.0.0.1".parse::<Version>(), Err(()));
        assert_eq!("1.x".parse::<Version>(), Err(()));
        assert_eq!("1.300".parse::<Version>(), Err(()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Version::CURRENT.to_string(), "1.8");
        assert_eq!(Version::new(1, 7, 2, 0).to_string(), "1.7.2");
        assert_eq!(Version::new(1, 8, 0, 3).to_string(), "1.8.0.3");
    }
}
