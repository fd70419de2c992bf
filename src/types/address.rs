// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validated device address and firmware URL types.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use url::Url;

use crate::error::ValueError;

/// IPv4 address of the device.
///
/// Only strict dotted quads are accepted: four decimal octets in `0..=255`.
/// Hostnames, ports and schemes are rejected; the HTTP port is part of the
/// client configuration.
///
/// # Examples
///
/// ```
/// use esplink::types::DeviceAddress;
///
/// let addr: DeviceAddress = "192.168.1.100".parse().unwrap();
/// assert_eq!(addr.to_string(), "192.168.1.100");
///
/// assert!("999.1.1.1".parse::<DeviceAddress>().is_err());
/// assert!("not-an-ip".parse::<DeviceAddress>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddress(Ipv4Addr);

impl DeviceAddress {
    /// Parses and validates a device address.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidAddress` if `address` is not an IPv4 dotted quad.
    pub fn parse(address: &str) -> Result<Self, ValueError> {
        address.parse()
    }
}

impl FromStr for DeviceAddress {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ipv4Addr::from_str(s)
            .map(Self)
            .map_err(|_| ValueError::InvalidAddress(s.to_string()))
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Absolute `http`/`https` URL of a firmware image for OTA updates.
///
/// # Examples
///
/// ```
/// use esplink::types::FirmwareUrl;
///
/// let url = FirmwareUrl::parse("http://10.0.0.5:8001/static/firmware.bin").unwrap();
/// assert_eq!(url.as_str(), "http://10.0.0.5:8001/static/firmware.bin");
///
/// assert!(FirmwareUrl::parse("not-a-url").is_err());
/// assert!(FirmwareUrl::parse("ftp://host/fw.bin").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareUrl(Url);

impl FirmwareUrl {
    /// Parses and validates a firmware URL.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidFirmwareUrl` if the URL is relative,
    /// malformed, has no host, or uses a scheme other than http/https.
    pub fn parse(url: &str) -> Result<Self, ValueError> {
        let invalid = |reason: &str| ValueError::InvalidFirmwareUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing host"));
        }

        Ok(Self(parsed))
    }

    /// Returns the URL as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for FirmwareUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_dotted_quads() {
        for addr in ["0.0.0.0", "192.168.1.100", "255.255.255.255", "127.0.0.1"] {
            assert!(DeviceAddress::parse(addr).is_ok(), "{addr} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for addr in [
            "999.1.1.1",
            "300.1.1.1",
            "not-an-ip",
            "",
            "192.168.1",
            "192.168.1.1.1",
            "192.168.1.100:80",
            "http://192.168.1.100",
            "-1.2.3.4",
        ] {
            assert_eq!(
                DeviceAddress::parse(addr),
                Err(ValueError::InvalidAddress(addr.to_string())),
                "{addr} should be rejected"
            );
        }
    }

    #[test]
    fn firmware_url_accepts_https() {
        let url = FirmwareUrl::parse("https://example.com/fw.bin").unwrap();
        assert_eq!(url.to_string(), "https://example.com/fw.bin");
    }

    #[test]
    fn firmware_url_rejects_relative() {
        let err = FirmwareUrl::parse("/static/firmware.bin").unwrap_err();
        assert!(matches!(err, ValueError::InvalidFirmwareUrl { .. }));
    }

    #[test]
    fn firmware_url_rejects_other_schemes() {
        let err = FirmwareUrl::parse("file:///tmp/fw.bin").unwrap_err();
        assert_eq!(
            err,
            ValueError::InvalidFirmwareUrl {
                url: "file:///tmp/fw.bin".to_string(),
                reason: "scheme must be http or https".to_string(),
            }
        );
    }
}
