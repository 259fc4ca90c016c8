use crate::errors::Error;
use crate::util::discovery::Device;

/// A caller-supplied way of naming a light, classified exactly once at the
/// input boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LightIdentifier {
    /// A `host:port` pair, reachable without going through discovery.
    Address { host: String, port: u16 },
    /// A full or short light name to match against discovery results.
    Name(String),
}

impl LightIdentifier {
    /// Classifies a raw identifier. Anything containing a `:` separator is
    /// treated as an address; a port is required since there is no default.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        match raw.split_once(':') {
            None => Ok(LightIdentifier::Name(raw.to_string())),
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| Error::MalformedAddress {
                    identifier: raw.to_string(),
                })?;
                Ok(LightIdentifier::Address {
                    host: host.to_string(),
                    port,
                })
            }
        }
    }
}

/// Caller identifiers split into directly reachable devices and names that
/// still have to go through discovery.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PartitionedLights {
    pub address_devices: Vec<Device>,
    pub names_to_discover: Vec<String>,
}

/// Partitions identifiers so automation with known addresses can skip the
/// multi-second discovery window entirely.
pub fn partition_lights(identifiers: &[String]) -> Result<PartitionedLights, Error> {
    let mut partitioned = PartitionedLights::default();
    for raw in identifiers {
        match LightIdentifier::parse(raw)? {
            LightIdentifier::Address { host, port } => partitioned
                .address_devices
                .push(Device::from_address(&host, port)),
            LightIdentifier::Name(name) => partitioned.names_to_discover.push(name),
        }
    }
    Ok(partitioned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifiers(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_name_and_address_are_partitioned() {
        let partitioned = partition_lights(&identifiers(&["111A", "10.0.0.5:9123"])).unwrap();
        assert_eq!(
            partitioned.address_devices,
            vec![Device::from_address("10.0.0.5", 9123)]
        );
        assert_eq!(partitioned.names_to_discover, vec!["111A".to_string()]);
    }

    #[test]
    fn test_full_names_stay_names() {
        let partitioned = partition_lights(&identifiers(&["Elgato Key Light 111A"])).unwrap();
        assert!(partitioned.address_devices.is_empty());
        assert_eq!(
            partitioned.names_to_discover,
            vec!["Elgato Key Light 111A".to_string()]
        );
    }

    #[test]
    fn test_malformed_port_is_a_hard_error() {
        let err = partition_lights(&identifiers(&["10.0.0.5:ninety"])).unwrap_err();
        assert_eq!(
            err,
            Error::MalformedAddress {
                identifier: "10.0.0.5:ninety".to_string()
            }
        );
    }

    #[test]
    fn test_missing_port_is_a_hard_error() {
        assert!(LightIdentifier::parse("10.0.0.5:").is_err());
    }

    #[test]
    fn test_zero_port_parses() {
        assert_eq!(
            LightIdentifier::parse("10.0.0.5:0").unwrap(),
            LightIdentifier::Address {
                host: "10.0.0.5".to_string(),
                port: 0
            }
        );
    }
}
