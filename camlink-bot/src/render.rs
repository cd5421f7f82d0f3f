//! Reply texts sent back to the chat.

use crate::models::{display_value, ClimateReading, DeviceStatus, Switch};

pub const PIR_DISCONNECTED: &str = "❌ Cannot connect to ESP32 for PIR check. Auto-PIR stopped.";
pub const PHOTO_CAPTION: &str = "📸 Manual capture SVGA 800×600:";
pub const PHOTO_FILENAME: &str = "photo.jpg";
pub const SENSOR_FAILED: &str = "⚠️ Failed to read DHT11 sensor.";

/// Seconds to `HH:MM:SS`; hours keep counting past 24.
pub fn format_uptime(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

pub fn help(prefix: &str, stream_url: &str) -> String {
    format!(
        "**AVAILABLE COMMANDS:**\n\
         • `{p}help` or `{p}start` → Show this guide.\n\
         • `{p}pir on` / `{p}pir off` → Enable/disable PIR auto-capture.\n\
         • `{p}relay on` / `{p}relay off` → Control relay.\n\
         • `{p}flash on` / `{p}flash off` → Control flash LED.\n\
         • `{p}dht` → Read DHT11 sensor.\n\
         • `{p}photo` → Manual photo capture (SVGA 800×600).\n\
         • `{p}status` → System status (chip info, temp, uptime, RSSI).\n\
         • `{p}stream` → Get URL to view MJPEG multi-client stream.\n\n\
         🔔 **NOTE**: the MJPEG stream is always live at `{stream_url}`; the device starts streaming when a client connects.",
        p = prefix,
    )
}

pub fn usage(prefix: &str, command: &str) -> String {
    format!("❓ Use `{prefix}{command} on` or `{prefix}{command} off`.")
}

pub fn invalid_command(prefix: &str) -> String {
    format!("❓ Invalid command. Use `{prefix}help` for a list of commands.")
}

pub fn cannot_connect(action: &str) -> String {
    format!("❌ Cannot connect to ESP32 to {action}.")
}

pub fn pir_toggled(state: Switch) -> String {
    match state {
        Switch::On => "👀 PIR auto **enabled**. The device will push a capture on motion.".to_string(),
        Switch::Off => "🚫 PIR auto **disabled**.".to_string(),
    }
}

pub fn relay_toggled(state: Switch) -> String {
    format!("💡 Relay **{}**.", state.as_str().to_uppercase())
}

pub fn flash_toggled(state: Switch) -> String {
    format!("🔦 Flash LED **{}**.", state.as_str().to_uppercase())
}

/// Une décimale, demi arrondi vers l'infini (`{:.1}` seul arrondit au pair)
fn one_decimal(x: f64) -> String {
    format!("{:.1}", (x * 10.0).round() / 10.0)
}

pub fn climate(reading: &ClimateReading) -> String {
    format!(
        "🌡 **Temperature**: {} °C\n💧 **Humidity**: {} %",
        one_decimal(reading.temperature),
        one_decimal(reading.humidity)
    )
}

pub fn stream(stream_url: &str) -> String {
    format!("📺 View MJPEG stream (multi-client) at:\n{stream_url}")
}

fn on_off(field: &Option<String>) -> &'static str {
    if field.as_deref() == Some("on") {
        "ON"
    } else {
        "OFF"
    }
}

fn shown(field: &Option<serde_json::Value>) -> String {
    field.as_ref().map(display_value).unwrap_or_else(|| "n/a".to_string())
}

pub fn status(s: &DeviceStatus) -> String {
    let uptime = s.uptime_sec.map(format_uptime).unwrap_or_else(|| "--:--:--".to_string());
    let features = s.chip_features.as_ref().map(|f| f.to_string()).unwrap_or_else(|| "n/a".to_string());

    format!(
        "🎛 **SYSTEM STATUS:**\n\
         • PIR auto    : **{pir}**\n\
         • Relay       : **{relay}**\n\
         • Flash       : **{flash}**\n\n\
         **DETAILED INFO:**\n\
         • Chip        : **{model}** with **{cores} cores**, features: {features}\n\
         • Temperature : **{temp} °C**\n\
         • Uptime      : **{uptime}**\n\
         • RSSI        : **{rssi} dBm**",
        pir = on_off(&s.pir),
        relay = on_off(&s.relay),
        flash = on_off(&s.flash),
        model = shown(&s.chip_model),
        cores = shown(&s.chip_cores),
        temp = shown(&s.temperature),
        rssi = shown(&s.rssi),
    )
}
