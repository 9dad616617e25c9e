//! Dimmable smart bulb.

use crate::command::{arg_i64, CommandArgs, CommandOutcome};
use crate::device::Link;
use crate::entropy::Entropy;
use hearth_core::{DeviceStatus, IssueKind, Payload};
use serde_json::json;

/// Peak draw of the simulated LED bulb, in watts.
const MAX_WATTS: f64 = 10.0;
/// Draw while off but still on the network.
const STANDBY_WATTS: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct Bulb {
    is_on: bool,
    brightness: u8,
    flickering: bool,
    color_temp_k: u32,
}

impl Default for Bulb {
    fn default() -> Self {
        Self::new()
    }
}

impl Bulb {
    pub fn new() -> Self {
        Self {
            is_on: false,
            brightness: 100,
            flickering: false,
            color_temp_k: 4000,
        }
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn set_on(&mut self, on: bool) {
        self.is_on = on;
    }

    /// Out-of-range levels are clamped, not rejected.
    pub fn set_brightness(&mut self, level: i64) {
        self.brightness = level.clamp(0, 100) as u8;
    }

    fn current_draw(&self) -> f64 {
        if self.is_on {
            (self.brightness as f64 / 100.0) * MAX_WATTS
        } else {
            STANDBY_WATTS
        }
    }

    pub(crate) fn issue(&mut self, link: &mut Link, entropy: &mut Entropy) -> Option<IssueKind> {
        // Flicker is more likely than overload, so it gets priority
        if self.is_on && entropy.chance(0.04) {
            self.flickering = true;
            link.flag(IssueKind::BulbFlickering, DeviceStatus::Warning);
            return Some(IssueKind::BulbFlickering);
        }

        // Sustained max brightness occasionally overloads the driver
        if self.is_on && self.brightness == 100 && entropy.chance(0.02) {
            link.flag(IssueKind::Overload, DeviceStatus::Warning);
            return Some(IssueKind::Overload);
        }

        self.flickering = false;
        None
    }

    pub(crate) fn payload(&mut self) -> Payload {
        self.peek_payload()
    }

    pub(crate) fn peek_payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert("is_on".into(), json!(self.is_on));
        payload.insert("brightness".into(), json!(self.brightness));
        payload.insert("power_draw".into(), json!(self.current_draw()));
        payload.insert("color_temp".into(), json!(self.color_temp_k));
        payload.insert("flickering".into(), json!(self.flickering));
        payload
    }

    /// Resets the bulb to stop flickering, backing brightness off slightly.
    pub fn fix_flicker(&mut self, link: &mut Link) -> bool {
        self.flickering = false;
        self.brightness = self.brightness.saturating_sub(10).max(80);
        link.clear_issue();
        true
    }

    /// Caps brightness to relieve an overloaded driver.
    pub fn reduce_load(&mut self, link: &mut Link) -> u8 {
        self.brightness = self.brightness.min(75);
        link.clear_issue();
        self.brightness
    }

    pub(crate) fn apply_command(
        &mut self,
        link: &mut Link,
        command: &str,
        args: &CommandArgs,
    ) -> CommandOutcome {
        match command {
            "turn_on" => {
                self.is_on = true;
                CommandOutcome::applied("ok")
            }
            "turn_off" => {
                self.is_on = false;
                CommandOutcome::applied("ok")
            }
            "toggle" => {
                self.is_on = !self.is_on;
                CommandOutcome::applied("toggled")
            }
            "set_brightness" => {
                self.set_brightness(arg_i64(args, "level", 100));
                CommandOutcome::applied(format!("brightness={}", self.brightness))
            }
            "fix_flicker" => {
                self.fix_flicker(link);
                CommandOutcome::applied("fixed")
            }
            "reduce_load" => {
                let level = self.reduce_load(link);
                CommandOutcome::applied(format!("reduced to {level}%"))
            }
            _ => CommandOutcome::Unrecognized,
        }
    }
}
