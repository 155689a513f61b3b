use crate::error::DriverError;
use md5::Md5;
use sha1::{Digest, Sha1};
use std::fmt;
use std::str::FromStr;

/// Hash algorithms every driver supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Md5,
}

impl HashAlgorithm {
    pub fn digest(&self, content: &[u8]) -> String {
        match self {
            HashAlgorithm::Sha1 => format!("{:x}", Sha1::digest(content)),
            HashAlgorithm::Md5 => format!("{:x}", Md5::digest(content)),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(HashAlgorithm::Sha1),
            "md5" => Ok(HashAlgorithm::Md5),
            _ => Err(DriverError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Sha1 => write!(f, "sha1"),
            HashAlgorithm::Md5 => write!(f, "md5"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_supported() {
        assert_eq!("sha1".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha1);
        assert_eq!("MD5".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Md5);
    }

    #[test]
    fn test_parse_unsupported() {
        let err = "crc99".parse::<HashAlgorithm>().unwrap_err();
        assert!(matches!(err, DriverError::UnsupportedAlgorithm(ref a) if a == "crc99"));
    }

    #[test]
    fn test_known_digests() {
        assert_eq!(
            HashAlgorithm::Sha1.digest(b"abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            HashAlgorithm::Md5.digest(b"abc"),
            "900150983cd24fb0d6963f7d28e17f72"
        );
    }
}
