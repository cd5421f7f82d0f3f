use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// État on/off accepté par les routes `/pir`, `/relay` et `/flash`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Switch::On => "on",
            Switch::Off => "off",
        }
    }
}

impl FromStr for Switch {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("on") {
            Ok(Switch::On)
        } else if s.eq_ignore_ascii_case("off") {
            Ok(Switch::Off)
        } else {
            Err(())
        }
    }
}

impl fmt::Display for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Réponse de `/pir_status`, utilisée uniquement comme sonde de présence
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PresenceStatus {
    #[serde(default)]
    pub pir: Option<String>,
}

/// Réponse de `/dht`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClimateReading {
    #[serde(deserialize_with = "lenient_f64")]
    pub temperature: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub humidity: f64,
}

/// Réponse de `/status`. Tous les champs sont optionnels pour qu'un status partiel reste affichable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeviceStatus {
    pub pir: Option<String>,
    pub relay: Option<String>,
    pub flash: Option<String>,
    pub temperature: Option<Value>,
    pub chip_model: Option<Value>,
    pub chip_cores: Option<Value>,
    pub chip_features: Option<ChipFeatures>,
    #[serde(deserialize_with = "lenient_u64")]
    pub uptime_sec: Option<u64>,
    pub rssi: Option<Value>,
}

/// Le firmware envoie `chip_features` soit en liste, soit en valeur unique.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ChipFeatures {
    List(Vec<Value>),
    Single(Value),
}

impl fmt::Display for ChipFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChipFeatures::List(items) => {
                let joined: Vec<String> = items.iter().map(display_value).collect();
                f.write_str(&joined.join(", "))
            }
            ChipFeatures::Single(v) => f.write_str(&display_value(v)),
        }
    }
}

/// Valeur JSON rendue telle que le device l'a envoyée (chaînes sans guillemets)
pub fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => "n/a".to_string(),
        other => other.to_string(),
    }
}

/// Vrai si la réponse porte un champ `error` non vide
pub fn has_device_error(v: &Value) -> bool {
    match v.get("error") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|x| x != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    let parsed = match &v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| serde::de::Error::custom(format!("expected a number, got {v}")))
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(match v {
        Some(Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().filter(|x| *x >= 0.0).map(|x| x as u64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_switch_parsing() {
        assert_eq!("on".parse::<Switch>(), Ok(Switch::On));
        assert_eq!("OFF".parse::<Switch>(), Ok(Switch::Off));
        assert!("onn".parse::<Switch>().is_err());
        assert!("".parse::<Switch>().is_err());
        assert_eq!(Switch::On.to_string(), "on");
    }

    #[test]
    fn test_climate_accepts_numeric_strings() {
        let r: ClimateReading =
            serde_json::from_value(json!({"temperature": "21.25", "humidity": 40})).unwrap();
        assert_eq!(r, ClimateReading { temperature: 21.25, humidity: 40.0 });
        assert!(serde_json::from_value::<ClimateReading>(json!({"temperature": 1})).is_err());
    }

    #[test]
    fn test_status_features_list_or_scalar() {
        let s: DeviceStatus = serde_json::from_value(json!({"chip_features": ["WiFi", "BLE"]})).unwrap();
        assert_eq!(s.chip_features.unwrap().to_string(), "WiFi, BLE");

        let s: DeviceStatus = serde_json::from_value(json!({"chip_features": "WiFi/BT"})).unwrap();
        assert_eq!(s.chip_features.unwrap().to_string(), "WiFi/BT");
    }

    #[test]
    fn test_status_uptime_is_lenient() {
        let s: DeviceStatus = serde_json::from_value(json!({"uptime_sec": "3661"})).unwrap();
        assert_eq!(s.uptime_sec, Some(3661));
        let s: DeviceStatus = serde_json::from_value(json!({"uptime_sec": "soon"})).unwrap();
        assert_eq!(s.uptime_sec, None);
        let s: DeviceStatus = serde_json::from_value(json!({})).unwrap();
        assert_eq!(s.uptime_sec, None);
    }

    #[test]
    fn test_device_error_truthiness() {
        assert!(has_device_error(&json!({"error": "DHT timeout"})));
        assert!(has_device_error(&json!({"error": true})));
        assert!(!has_device_error(&json!({"error": false})));
        assert!(!has_device_error(&json!({"error": ""})));
        assert!(!has_device_error(&json!({"temperature": 20})));
    }
}
