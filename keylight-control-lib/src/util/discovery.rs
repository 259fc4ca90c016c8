use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use mdns_sd::{ResolvedService, ScopedIp, ServiceDaemon, ServiceEvent};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::errors::Error;

/// The DNS-SD service type advertised by Elgato accessories (the trailing
/// dot is required by mdns-sd).
pub const ELGATO_SERVICE_TYPE: &str = "_elg._tcp.local.";

/// Buffer a few results to simplify transport implementations.
const RESULT_BUFFER: usize = 5;

/// A network-attached light accessory. Produced by a [`Discovery`]
/// implementation, or created from an explicit `host:port` pair when
/// running in a static environment. Never mutated once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    /// Advertised instance name. Absent for devices synthesized from a
    /// direct address.
    pub name: Option<String>,
    pub address: String,
    pub port: u16,
}

impl Device {
    pub fn new(name: &str, address: &str, port: u16) -> Self {
        Device {
            name: Some(name.to_string()),
            address: address.to_string(),
            port,
        }
    }

    /// A device reachable at a known address, bypassing discovery.
    pub fn from_address(address: &str, port: u16) -> Self {
        Device {
            name: None,
            address: address.to_string(),
            port,
        }
    }

    /// Human-readable identifier: the advertised name when known,
    /// otherwise `address:port`.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{}:{}", self.address, self.port),
        }
    }
}

impl Display for Device {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The transport seam for locating accessories on the local network.
///
/// The default implementation is [`MdnsDiscovery`]. Implementations stream
/// every service announcement they see; filtering and deduplication happen
/// in [`LightDiscoverer`].
#[async_trait]
pub trait Discovery: Send + 'static {
    /// Runs the browse loop until `cancel` fires or the transport fails.
    /// The result channel must be closed when this returns, which is what
    /// signals end-of-stream to the consumer.
    async fn run(self: Box<Self>, cancel: CancellationToken) -> Result<(), Error>;

    /// Hands out the receiving end of the result stream. The stream can be
    /// taken once; later calls return an already-closed stream.
    fn results(&mut self) -> mpsc::Receiver<Device>;
}

/// mDNS-backed [`Discovery`] browsing for `_elg._tcp` services.
pub struct MdnsDiscovery {
    daemon: ServiceDaemon,
    results_tx: mpsc::Sender<Device>,
    results_rx: Option<mpsc::Receiver<Device>>,
}

impl MdnsDiscovery {
    /// Spawns the mDNS daemon. The browse itself does not start until
    /// [`Discovery::run`] is called.
    pub fn new() -> Result<Self, Error> {
        let daemon = ServiceDaemon::new().map_err(|e| Error::TransportSetup(e.to_string()))?;
        let (results_tx, results_rx) = mpsc::channel(RESULT_BUFFER);
        Ok(MdnsDiscovery {
            daemon,
            results_tx,
            results_rx: Some(results_rx),
        })
    }
}

#[async_trait]
impl Discovery for MdnsDiscovery {
    async fn run(self: Box<Self>, cancel: CancellationToken) -> Result<(), Error> {
        let events = self
            .daemon
            .browse(ELGATO_SERVICE_TYPE)
            .map_err(|e| Error::TransportRun(e.to_string()))?;

        let result = loop {
            tokio::select! {
                _ = cancel.cancelled() => break Ok(()),
                event = events.recv_async() => match event {
                    Ok(ServiceEvent::ServiceResolved(service)) => {
                        let device = device_from_service(&service);
                        debug!(
                            "resolved accessory {} at {}:{}",
                            device.label(),
                            device.address,
                            device.port
                        );
                        if self.results_tx.send(device).await.is_err() {
                            // Consumer is gone, nothing left to report to.
                            break Ok(());
                        }
                    }
                    Ok(_) => {}
                    Err(e) => break Err(Error::TransportRun(e.to_string())),
                },
            }
        };

        if let Err(e) = self.daemon.stop_browse(ELGATO_SERVICE_TYPE) {
            warn!("failed to stop mDNS browse: {e:?}");
        }
        let _ = self.daemon.shutdown();

        result
    }

    fn results(&mut self) -> mpsc::Receiver<Device> {
        self.results_rx.take().unwrap_or_else(|| {
            let (_tx, rx) = mpsc::channel(1);
            rx
        })
    }
}

fn device_from_service(service: &ResolvedService) -> Device {
    // Prefer a resolved IPv4 address over the advertised hostname; some
    // resolvers on the network cannot look up `.local.` names.
    let address = service
        .addresses
        .iter()
        .find_map(|addr| match addr {
            ScopedIp::V4(v4) => Some(v4.addr().to_string()),
            _ => None,
        })
        .unwrap_or_else(|| service.host.trim_end_matches('.').to_string());

    Device::new(&instance_name(&service.fullname), &address, service.port)
}

/// Extracts the instance name from a service fullname such as
/// `Elgato Key Light 111A._elg._tcp.local.`.
fn instance_name(fullname: &str) -> String {
    fullname
        .strip_suffix(ELGATO_SERVICE_TYPE)
        .map(|instance| instance.trim_end_matches('.'))
        .unwrap_or(fullname)
        .to_string()
}

/// Collects devices from a [`Discovery`] stream until a matching policy is
/// satisfied or the collection window closes.
///
/// Accepted devices are keyed by name, so a device that is re-announced
/// during the window is recorded once.
pub struct LightDiscoverer {
    discovery: Box<dyn Discovery>,
    all_lights: bool,
    required_lights: Vec<String>,
}

impl LightDiscoverer {
    /// Accept every discovered accessory until the window closes.
    pub fn for_all(discovery: Box<dyn Discovery>) -> Self {
        LightDiscoverer {
            discovery,
            all_lights: true,
            required_lights: Vec::new(),
        }
    }

    /// Accept only accessories whose name ends with one of the required
    /// suffixes, stopping early once every requirement is satisfied.
    pub fn for_required(discovery: Box<dyn Discovery>, required_lights: Vec<String>) -> Self {
        LightDiscoverer {
            discovery,
            all_lights: false,
            required_lights,
        }
    }

    /// Runs the transport browse loop and the collector concurrently,
    /// joining both before returning.
    ///
    /// A transport failure on either side cancels the other and discards
    /// any partial results. Expiry of `window` is not an error by itself:
    /// whatever was accepted is returned, provided every required name
    /// matched at least one device.
    pub async fn run(self, window: Duration) -> Result<Vec<Device>, Error> {
        let LightDiscoverer {
            mut discovery,
            all_lights,
            required_lights,
        } = self;

        let mut results = discovery.results();
        let cancel = CancellationToken::new();
        let browse = tokio::spawn({
            let cancel = cancel.clone();
            async move { discovery.run(cancel).await }
        });

        // Owned by this task alone until the join below; nothing else may
        // observe it mid-collection.
        let mut accepted: BTreeMap<String, Device> = BTreeMap::new();

        let deadline = tokio::time::sleep(window);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    debug!("discovery window closed after {window:?}");
                    break;
                }
                next = results.recv() => {
                    let Some(device) = next else { break };
                    let Some(name) = device.name.clone() else {
                        debug!(
                            "ignoring unnamed announcement from {}:{}",
                            device.address, device.port
                        );
                        continue;
                    };

                    if all_lights {
                        accepted.insert(name, device);
                        continue;
                    }

                    // TODO: Should check if the requirement is a full name or short name
                    //       and compare differently based on the two (full match vs suffix)
                    if required_lights.iter().any(|req| name.ends_with(req.as_str())) {
                        accepted.insert(name, device);
                    }

                    if accepted.len() == required_lights.len() {
                        break;
                    }
                }
            }
        }

        cancel.cancel();
        drop(results);
        browse
            .await
            .map_err(|e| Error::TransportRun(e.to_string()))??;

        let devices: Vec<Device> = accepted.into_values().collect();
        info!("discovery finished with {} accessory(ies)", devices.len());

        if !all_lights {
            for requirement in &required_lights {
                let satisfied = devices.iter().any(|device| {
                    device
                        .name
                        .as_deref()
                        .is_some_and(|name| name.ends_with(requirement.as_str()))
                });
                if !satisfied {
                    return Err(Error::RequirementNotMet(requirement.clone()));
                }
            }
        }

        Ok(devices)
    }
}
