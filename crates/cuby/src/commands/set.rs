//! Control command handlers.

use cuby_core::cuby_api::{CubyClient, clamp_temperature};
use serde_json::{Map, Value};

use crate::cli::{GlobalOpts, PowerState, SetArgs, SetCommand};
use crate::error::CliError;

fn confirm(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("✓ {message}");
    }
}

pub async fn handle(client: &CubyClient, args: SetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SetCommand::Power { device, state } => {
            let on = matches!(state, PowerState::On);
            client.try_set_ac_power(&device, on).await?;
            confirm(global, &format!("{device} turned {}", if on { "on" } else { "off" }));
            Ok(())
        }

        SetCommand::Temp { device, celsius } => {
            client.try_set_ac_temperature(&device, celsius).await?;
            let applied = clamp_temperature(celsius);
            if (applied - celsius).abs() > f64::EPSILON {
                confirm(
                    global,
                    &format!("{device} target set to {applied} °C (clamped from {celsius})"),
                );
            } else {
                confirm(global, &format!("{device} target set to {applied} °C"));
            }
            Ok(())
        }

        SetCommand::Mode { device, mode } => {
            client.try_set_ac_mode(&device, &mode).await?;
            confirm(global, &format!("{device} mode set to {mode}"));
            Ok(())
        }

        SetCommand::Fan { device, speed } => {
            client.try_set_ac_fan_mode(&device, &speed).await?;
            confirm(global, &format!("{device} fan set to {speed}"));
            Ok(())
        }

        SetCommand::Swing { device, direction } => {
            client.try_set_ac_swing_mode(&device, &direction).await?;
            confirm(global, &format!("{device} swing set to {direction}"));
            Ok(())
        }

        SetCommand::State { device, json } => {
            let state: Map<String, Value> = serde_json::from_str(&json)?;
            client.try_set_ac_full_state(&device, &state).await?;
            confirm(global, &format!("{device} state updated"));
            Ok(())
        }
    }
}
