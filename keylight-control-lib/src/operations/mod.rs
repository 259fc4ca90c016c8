//! High-level operations composing discovery, address resolution, and
//! device control: discover, describe, and switch.

use std::time::Duration;

use log::debug;
use serde::Serialize;

use crate::control_interface::{AccessoryInfo, ControlInterface, LightAdjustment, LightGroup};
use crate::errors::Error;
use crate::util::discovery::{Device, Discovery, LightDiscoverer};
use crate::util::resolve::partition_lights;

/// Which lights an operation should act on. `all` and explicit
/// identifiers are mutually exclusive; callers enforce that at the input
/// boundary.
#[derive(Debug, Clone, Default)]
pub struct LightSelection {
    /// Explicit names, short name suffixes, or `host:port` addresses.
    pub lights: Vec<String>,
    /// Act on every accessory discovered within the window.
    pub all: bool,
}

/// Everything known about one resolved accessory after a describe pass.
#[derive(Debug, Clone, Serialize)]
pub struct LightStatus {
    pub device: Device,
    pub group: LightGroup,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<AccessoryInfo>,
}

/// Resolves a selection into concrete devices. Address-form identifiers
/// are used directly; discovery only runs when name-form identifiers (or
/// the all flag) require it, so automation with known addresses skips the
/// discovery window entirely.
pub async fn resolve_lights<F>(
    new_discovery: F,
    selection: &LightSelection,
    window: Duration,
) -> Result<Vec<Device>, Error>
where
    F: FnOnce() -> Result<Box<dyn Discovery>, Error>,
{
    let partitioned = partition_lights(&selection.lights)?;
    let mut devices = partitioned.address_devices;

    if partitioned.names_to_discover.is_empty() && !selection.all {
        debug!("all lights resolved by address, skipping discovery");
        return Ok(devices);
    }

    let discoverer = if selection.all {
        LightDiscoverer::for_all(new_discovery()?)
    } else {
        LightDiscoverer::for_required(new_discovery()?, partitioned.names_to_discover)
    };
    devices.extend(discoverer.run(window).await?);

    Ok(devices)
}

/// Discovers every accessory announcing itself within the window.
pub async fn discover_lights<F>(new_discovery: F, window: Duration) -> Result<Vec<Device>, Error>
where
    F: FnOnce() -> Result<Box<dyn Discovery>, Error>,
{
    LightDiscoverer::for_all(new_discovery()?).run(window).await
}

/// Fetches the current state of every selected light, sequentially.
///
/// The first fetch failure aborts the whole operation; a partial report
/// would be worse than a hard failure for an observability command.
pub async fn describe_lights<F>(
    new_discovery: F,
    selection: &LightSelection,
    window: Duration,
    with_info: bool,
) -> Result<Vec<LightStatus>, Error>
where
    F: FnOnce() -> Result<Box<dyn Discovery>, Error>,
{
    let devices = resolve_lights(new_discovery, selection, window).await?;
    if devices.is_empty() {
        return Err(Error::NoMatchingDevices);
    }

    let mut statuses = Vec::with_capacity(devices.len());
    for device in devices {
        let control = ControlInterface::new(&device);
        let group = control.fetch_light_group().await?;
        let info = if with_info {
            Some(control.fetch_accessory_info().await?)
        } else {
            None
        };
        statuses.push(LightStatus {
            device,
            group,
            info,
        });
    }

    Ok(statuses)
}

/// Applies `adjustment` to every selected light through a sequential
/// read-modify-write cycle, stopping at the first device-level failure.
///
/// Devices updated before a failure are not rolled back; there is no
/// partial-success reporting. Returns the devices that were updated.
pub async fn switch_lights<F>(
    new_discovery: F,
    selection: &LightSelection,
    adjustment: &LightAdjustment,
    window: Duration,
) -> Result<Vec<Device>, Error>
where
    F: FnOnce() -> Result<Box<dyn Discovery>, Error>,
{
    let devices = resolve_lights(new_discovery, selection, window).await?;
    if devices.is_empty() {
        return Err(Error::NoMatchingDevices);
    }

    for device in &devices {
        let control = ControlInterface::new(device);
        let current = control.fetch_light_group().await?;
        let desired = current.adjusted(adjustment);
        let updated = control.update_light_group(&desired).await?;
        debug!("updated {}: {:?}", device.label(), updated);
    }

    Ok(devices)
}
