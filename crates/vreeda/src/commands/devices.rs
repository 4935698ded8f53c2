//! Device command handlers.

use tabled::Tabled;
use vreeda_core::{
    lookup_device, Channel, CoreError, Device, DeviceOp, DeviceStateController, Preset,
    RemoteDeviceGateway, SelectionCoordinator,
};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts, PresetName};
use crate::config::{self, Resolved};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Power")]
    power: String,
    #[tabled(rename = "Hue")]
    hue: String,
    #[tabled(rename = "Sat")]
    saturation: String,
    #[tabled(rename = "Bright")]
    brightness: String,
    #[tabled(rename = "Program")]
    program: String,
}

fn power_label(on: Option<bool>) -> &'static str {
    match on {
        Some(true) => "on",
        Some(false) => "off",
        None => "-",
    }
}

fn row(d: &Device, color: bool) -> DeviceRow {
    DeviceRow {
        id: d.id.clone(),
        name: d.display_name().to_owned(),
        status: output::paint_status(d.status_label(), d.connected, color),
        power: power_label(d.states.on).into(),
        hue: output::percent(d.states.hue),
        saturation: output::percent(d.states.saturation),
        brightness: output::percent(d.states.brightness),
        program: d.states.program.clone().unwrap_or_else(|| "-".into()),
    }
}

fn detail(d: &Device, color: bool) -> String {
    [
        format!("ID:         {}", d.id),
        format!("Name:       {}", d.display_name()),
        format!(
            "Status:     {}",
            output::paint_status(d.status_label(), d.connected, color)
        ),
        format!("Power:      {}", power_label(d.states.on)),
        format!("Hue:        {}", output::percent(d.states.hue)),
        format!("Saturation: {}", output::percent(d.states.saturation)),
        format!("Brightness: {}", output::percent(d.states.brightness)),
        format!(
            "Program:    {}",
            d.states.program.as_deref().unwrap_or("-")
        ),
    ]
    .join("\n")
}

impl From<PresetName> for Preset {
    fn from(name: PresetName) -> Self {
        match name {
            PresetName::Alert => Self::Alert,
            PresetName::Neutral => Self::Neutral,
        }
    }
}

/// Channel changes in a fixed order: hue, saturation, brightness.
fn channel_ops(hue: Option<f64>, saturation: Option<f64>, brightness: Option<f64>) -> Vec<DeviceOp> {
    [
        (Channel::Hue, hue),
        (Channel::Saturation, saturation),
        (Channel::Brightness, brightness),
    ]
    .into_iter()
    .filter_map(|(channel, value)| value.map(|value| DeviceOp::SetChannel { channel, value }))
    .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let resolved = Resolved::load(global);
    let api = config::resolve_api_config(&resolved, global)?;
    let gateway = RemoteDeviceGateway::from_config(&api)?;
    let color = output::should_color(&global.color);

    match args.command {
        DevicesCommand::List => {
            let devices = gateway.list_devices().await?;
            let out = output::render_list(
                &global.output,
                &devices,
                |d| row(d, color),
                |d| d.id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Get { device } => {
            let device = gateway.find_device(&device).await?;
            print_device(&device, global, color)
        }

        DevicesCommand::Toggle { devices } => match devices.as_slice() {
            [device] => run_ops(gateway, device, vec![DeviceOp::Toggle], global, color).await,
            _ => toggle_all(gateway, &devices, global, color).await,
        },

        DevicesCommand::Set {
            device,
            hue,
            saturation,
            brightness,
        } => {
            let ops = channel_ops(hue, saturation, brightness);
            run_ops(gateway, &device, ops, global, color).await
        }

        DevicesCommand::Preset { device, preset } => {
            let ops = vec![DeviceOp::Preset(preset.into())];
            run_ops(gateway, &device, ops, global, color).await
        }
    }
}

/// Apply `ops` in order through one controller, then show the resulting state.
async fn run_ops(
    gateway: RemoteDeviceGateway,
    identifier: &str,
    ops: Vec<DeviceOp>,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    let mut device = gateway.find_device(identifier).await?;
    let controller = DeviceStateController::new(&device, gateway);

    for op in ops {
        controller.apply(op).await?;
    }

    device.states = controller.current_state();
    output::notice(&format!("Updated {}", device.display_name()), global.quiet);
    print_device(&device, global, color)
}

/// Resolve every identifier against one listing, in the order given.
fn select_devices(
    devices: &[Device],
    identifiers: &[String],
) -> Result<SelectionCoordinator, CoreError> {
    let mut selection = SelectionCoordinator::new();
    for identifier in identifiers {
        selection.select(lookup_device(devices, identifier)?.id.clone());
    }
    Ok(selection)
}

/// Toggle each selected device once, stopping at the first failure.
async fn toggle_all(
    gateway: RemoteDeviceGateway,
    identifiers: &[String],
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    let listing = gateway.list_devices().await?;
    let selection = select_devices(&listing, identifiers)?;

    let mut updated = Vec::with_capacity(selection.len());
    for id in selection.selected() {
        let mut device = lookup_device(&listing, id)?.clone();
        let controller = DeviceStateController::new(&device, gateway.clone());
        controller.toggle_on().await?;
        device.states = controller.current_state();
        output::notice(&format!("Updated {}", device.display_name()), global.quiet);
        updated.push(device);
    }

    let out = output::render_list(
        &global.output,
        &updated,
        |d| row(d, color),
        |d| d.id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn print_device(device: &Device, global: &GlobalOpts, color: bool) -> Result<(), CliError> {
    let out = output::render_single(
        &global.output,
        device,
        |d| detail(d, color),
        |d| d.id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
