//! Device command handlers.

use cuby_core::cuby_api::{CubyClient, Device, DeviceInfo, DeviceState};
use tabled::Tabled;

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Firmware")]
    firmware: String,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            id: d.id.clone(),
            name: d.display_name(),
            model: d.model.clone().unwrap_or_default(),
            firmware: d.firmware_version.clone().unwrap_or_default(),
        }
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}

fn device_detail(d: &Device) -> String {
    output::detail_lines(&[
        ("ID:", d.id.clone()),
        ("Name:", d.display_name()),
        ("Model:", opt(d.model.as_deref())),
        ("Firmware:", opt(d.firmware_version.as_deref())),
    ])
}

fn state_detail(s: &DeviceState, color: bool) -> String {
    let power = match s.power {
        Some(true) => output::paint_status("on", Some(true), color),
        Some(false) => output::paint_status("off", Some(false), color),
        None => output::paint_status("-", None, color),
    };
    output::detail_lines(&[
        ("Power:", power),
        ("Mode:", opt(s.mode.as_deref())),
        ("Fan:", opt(s.fan_mode.as_deref())),
        ("Swing:", opt(s.swing.as_deref())),
        ("Target:", opt(s.target_temperature.map(|t| format!("{t} °C")))),
        ("Current:", opt(s.current_temperature.map(|t| format!("{t} °C")))),
    ])
}

fn info_detail(i: &DeviceInfo, color: bool) -> String {
    let online = match i.online {
        Some(true) => output::paint_status("online", Some(true), color),
        _ => output::paint_status("offline", Some(false), color),
    };
    output::detail_lines(&[
        ("Name:", opt(i.name.as_deref())),
        ("Model:", opt(i.model.as_deref())),
        ("Firmware:", opt(i.firmware_version.as_deref())),
        ("WiFi:", opt(i.wifi_signal.map(|dbm| format!("{dbm} dBm")))),
        ("Status:", online),
    ])
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: &CubyClient,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        DevicesCommand::List => {
            let devices = client.try_get_devices().await?;
            let out = output::render_list(
                &global.output,
                &devices,
                |d: &Device| DeviceRow::from(d),
                |d| d.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Get { device } => {
            let devices = client.try_get_devices().await?;
            let found = devices
                .into_iter()
                .find(|d| d.id == device)
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "device".into(),
                    identifier: device.clone(),
                    list_command: "devices list".into(),
                })?;
            let out = output::render_single(&global.output, &found, device_detail, |d| {
                d.id.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::State { device } => {
            let state = client.try_get_device_state(&device).await?;
            let out = output::render_single(
                &global.output,
                &state,
                |s| state_detail(s, color),
                |s| s.mode.clone().unwrap_or_else(|| "unknown".into()),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Info { device } => {
            let info = client.try_get_device_info(&device).await?;
            let out = output::render_single(
                &global.output,
                &info,
                |i| info_detail(i, color),
                |i| {
                    if i.online == Some(true) {
                        "online".into()
                    } else {
                        "offline".into()
                    }
                },
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
