//! Temperatures from OS sensor chips and the storage appliance's per-drive
//! status file, merged into one label -> degrees C map.

use crate::hostfs;
use crate::types::Temperatures;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use sysinfo::Components;
use tracing::warn;

/// Chips whose maximum reading is the CPU temperature, in preference order.
pub const CPU_SENSOR_CHIPS: [&str; 3] = ["coretemp", "k10temp", "zenpower"];

static SENSOR_LABELS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("coretemp", "CPU"),
        ("k10temp", "CPU"),
        ("zenpower", "CPU"),
        ("nvme", "NVMe Drive"),
        ("acpitz", "System"),
        ("pch_skylake", "Chipset"),
        ("iwlwifi", "Wi-Fi"),
        ("amdgpu", "GPU"),
        ("radeon", "GPU"),
        ("nouveau", "GPU"),
    ])
});

// Drive readings outside this band are sensor noise.
const DRIVE_TEMP_RANGE: std::ops::RangeInclusive<i64> = 10..=100;

/// One reading attributed to the chip (hwmon driver) that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub chip: String,
    pub celsius: f32,
}

/// Capitalize each run of letters, lower-casing the rest of the run.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_alpha = false;
    for ch in raw.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

pub fn friendly_label(chip: &str) -> String {
    SENSOR_LABELS
        .get(chip)
        .map(|s| s.to_string())
        .unwrap_or_else(|| title_case(chip))
}

/// Refresh and flatten the sensor list. The chip is the first word of the
/// component label ("coretemp Package id 0" -> "coretemp").
pub fn read_sensors(components: &mut Components) -> Vec<SensorReading> {
    components.refresh(true);
    components
        .iter()
        .filter_map(|c| {
            let chip = c.label().split_whitespace().next()?.to_ascii_lowercase();
            let celsius = c.temperature().filter(|t| t.is_finite())?;
            Some(SensorReading { chip, celsius })
        })
        .collect()
}

/// Maximum per chip.
fn chip_maxima(readings: &[SensorReading]) -> BTreeMap<&str, f32> {
    let mut max: BTreeMap<&str, f32> = BTreeMap::new();
    for r in readings {
        max.entry(r.chip.as_str())
            .and_modify(|m| *m = m.max(r.celsius))
            .or_insert(r.celsius);
    }
    max
}

/// Max reading of the first preferred CPU chip that is present.
pub fn cpu_temperature(readings: &[SensorReading]) -> Option<f32> {
    let max = chip_maxima(readings);
    CPU_SENSOR_CHIPS.iter().find_map(|chip| max.get(chip).copied())
}

/// Sensor groups under friendly labels; chips sharing a label keep the
/// highest reading.
pub fn label_sensors(readings: &[SensorReading]) -> Temperatures {
    let mut out = Temperatures::new();
    for (chip, t) in chip_maxima(readings) {
        let t = f64::from(t);
        out.entry(friendly_label(chip))
            .and_modify(|m| *m = m.max(t))
            .or_insert(t);
    }
    out
}

/// `Drive <section>` entries from an INI drive-status listing. A `temp` of
/// `*`, empty, non-numeric or outside 10..=100 yields no entry.
pub fn parse_drive_temps<'a, I>(lines: I) -> Temperatures
where
    I: IntoIterator<Item = &'a str>,
{
    hostfs::parse_ini(lines)
        .into_iter()
        .filter_map(|s| {
            let raw = s.get("temp")?;
            if raw == "*" || raw.is_empty() {
                return None;
            }
            let t: i64 = raw.parse().ok()?;
            DRIVE_TEMP_RANGE
                .contains(&t)
                .then(|| (format!("Drive {}", s.name), t as f64))
        })
        .collect()
}

/// Drive temperatures, or nothing when the file is absent.
pub fn drive_temps(disks_ini: &Path) -> Temperatures {
    if !disks_ini.exists() {
        return Temperatures::new();
    }
    match hostfs::read_lines(disks_ini) {
        Ok(lines) => parse_drive_temps(lines.iter().map(String::as_str)),
        Err(e) => {
            warn!(path = %disks_ini.display(), error = %e, "drive status file unreadable");
            Temperatures::new()
        }
    }
}

pub fn merge(sensors: &[SensorReading], disks_ini: &Path) -> Temperatures {
    let mut out = label_sensors(sensors);
    out.extend(drive_temps(disks_ini));
    out
}
