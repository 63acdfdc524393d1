//! Host cloud detection from DMI data.

use std::{fs, io, path::Path};

/// Sysfs file holding the system vendor string.
pub const SYS_VENDOR_PATH: &str = "/sys/class/dmi/id/sys_vendor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cloud {
    Ec2,
    Azure,
    Gce,
}

impl Cloud {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cloud::Ec2 => "ec2",
            Cloud::Azure => "azure",
            Cloud::Gce => "gce",
        }
    }
}

/// Classifies a DMI vendor string. Matching is case-insensitive.
pub fn classify_vendor(vendor: &str) -> Option<Cloud> {
    let vendor = vendor.to_lowercase();
    if vendor.contains("amazon") {
        Some(Cloud::Ec2)
    } else if vendor.contains("microsoft") {
        Some(Cloud::Azure)
    } else if vendor.contains("google") {
        Some(Cloud::Gce)
    } else {
        None
    }
}

/// Reads the vendor file at `path` and classifies it.
pub fn detect_cloud_from(path: &Path) -> io::Result<Option<Cloud>> {
    let vendor = fs::read_to_string(path)?;
    Ok(classify_vendor(&vendor))
}

/// Detects the cloud this host runs on.
pub fn detect_cloud() -> io::Result<Option<Cloud>> {
    detect_cloud_from(Path::new(SYS_VENDOR_PATH))
}
