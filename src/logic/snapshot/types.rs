use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ============================================================================
// SENSOR FIELDS
// ============================================================================

/// Named numeric sensor fields of a simulation input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorField {
    FlowIn,
    FlowOut,
    PressureIn,
    PressureOut,
    TemperatureIn,
    TemperatureOut,
    DensityIn,
    DensityOut,
    VelocityVariation,
    Vorticity,
    MassDeviation,
    EnergyLoss,
}

impl SensorField {
    pub const ALL: [SensorField; 12] = [
        SensorField::FlowIn,
        SensorField::FlowOut,
        SensorField::PressureIn,
        SensorField::PressureOut,
        SensorField::TemperatureIn,
        SensorField::TemperatureOut,
        SensorField::DensityIn,
        SensorField::DensityOut,
        SensorField::VelocityVariation,
        SensorField::Vorticity,
        SensorField::MassDeviation,
        SensorField::EnergyLoss,
    ];

    /// Readings shown next to the inlet valve
    pub const INLET: [SensorField; 4] = [
        SensorField::FlowIn,
        SensorField::PressureIn,
        SensorField::TemperatureIn,
        SensorField::DensityIn,
    ];

    /// Readings shown next to the outlet valve
    pub const OUTLET: [SensorField; 7] = [
        SensorField::FlowOut,
        SensorField::PressureOut,
        SensorField::TemperatureOut,
        SensorField::DensityOut,
        SensorField::Vorticity,
        SensorField::MassDeviation,
        SensorField::EnergyLoss,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlowIn => "flow_in",
            Self::FlowOut => "flow_out",
            Self::PressureIn => "pressure_in",
            Self::PressureOut => "pressure_out",
            Self::TemperatureIn => "temperature_in",
            Self::TemperatureOut => "temperature_out",
            Self::DensityIn => "density_in",
            Self::DensityOut => "density_out",
            Self::VelocityVariation => "velocity_variation",
            Self::Vorticity => "vorticity",
            Self::MassDeviation => "mass_deviation",
            Self::EnergyLoss => "energy_loss",
        }
    }

    /// Human label ("flow in")
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

// ============================================================================
// SEGMENT IDENTIFIER
// ============================================================================

/// Raw segment identifier as delivered upstream.
///
/// Upstream versions send integers, floats or numeric strings; anything else
/// is kept so the geolocator can apply its non-numeric fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SegmentId {
    Number(f64),
    Text(String),
    Other(Value),
}

impl SegmentId {
    /// Numeric value, `None` when the identifier is not a finite number
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.value() == Some(0.0)
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        SegmentId::Number(0.0)
    }
}

impl From<f64> for SegmentId {
    fn from(n: f64) -> Self {
        SegmentId::Number(n)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
            Self::Other(v) => write!(f, "{}", v),
        }
    }
}

// ============================================================================
// SIMULATION INPUT
// ============================================================================

/// Sensor readings of one prediction cycle.
///
/// Every field is optional: partial payloads are normal and evaluators treat
/// absent values as "no signal".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationInput {
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub flow_in: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub flow_out: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub pressure_in: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub pressure_out: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub temperature_in: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub temperature_out: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub density_in: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub density_out: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub velocity_variation: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub vorticity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub mass_deviation: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub energy_loss: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gps_segment_id: Option<SegmentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<SegmentId>,

    /// Fields this client does not interpret, kept for reports and persistence
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SimulationInput {
    /// Read a sensor value
    pub fn get(&self, field: SensorField) -> Option<f64> {
        match field {
            SensorField::FlowIn => self.flow_in,
            SensorField::FlowOut => self.flow_out,
            SensorField::PressureIn => self.pressure_in,
            SensorField::PressureOut => self.pressure_out,
            SensorField::TemperatureIn => self.temperature_in,
            SensorField::TemperatureOut => self.temperature_out,
            SensorField::DensityIn => self.density_in,
            SensorField::DensityOut => self.density_out,
            SensorField::VelocityVariation => self.velocity_variation,
            SensorField::Vorticity => self.vorticity,
            SensorField::MassDeviation => self.mass_deviation,
            SensorField::EnergyLoss => self.energy_loss,
        }
    }

    /// Builder-style setter, mostly for manual input and tests
    pub fn with(mut self, field: SensorField, value: f64) -> Self {
        let slot = match field {
            SensorField::FlowIn => &mut self.flow_in,
            SensorField::FlowOut => &mut self.flow_out,
            SensorField::PressureIn => &mut self.pressure_in,
            SensorField::PressureOut => &mut self.pressure_out,
            SensorField::TemperatureIn => &mut self.temperature_in,
            SensorField::TemperatureOut => &mut self.temperature_out,
            SensorField::DensityIn => &mut self.density_in,
            SensorField::DensityOut => &mut self.density_out,
            SensorField::VelocityVariation => &mut self.velocity_variation,
            SensorField::Vorticity => &mut self.vorticity,
            SensorField::MassDeviation => &mut self.mass_deviation,
            SensorField::EnergyLoss => &mut self.energy_loss,
        };
        *slot = Some(value);
        self
    }

    pub fn with_gps_segment(mut self, segment: impl Into<SegmentId>) -> Self {
        self.gps_segment_id = Some(segment.into());
        self
    }

    /// First present identifier: `gps_segment_id`, then `segment_id`, then 0
    pub fn segment(&self) -> SegmentId {
        self.gps_segment_id
            .clone()
            .or_else(|| self.segment_id.clone())
            .unwrap_or_default()
    }

    /// Inlet minus outlet flow
    pub fn flow_difference(&self) -> Option<f64> {
        Some(self.flow_in? - self.flow_out?)
    }

    /// Fields a manual prediction request must carry
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing: Vec<&'static str> = SensorField::ALL
            .iter()
            .filter(|f| self.get(**f).is_none())
            .map(|f| f.as_str())
            .collect();

        if self.gps_segment_id.as_ref().and_then(SegmentId::value).is_none() {
            missing.push("gps_segment_id");
        }
        missing
    }

    /// Flat `(key, value)` view in wire order, extras last
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut rows: Vec<(String, String)> = SensorField::ALL
            .iter()
            .filter_map(|f| self.get(*f).map(|v| (f.as_str().to_string(), v.to_string())))
            .collect();

        if let Some(seg) = &self.gps_segment_id {
            rows.push(("gps_segment_id".to_string(), seg.to_string()));
        }
        if let Some(seg) = &self.segment_id {
            rows.push(("segment_id".to_string(), seg.to_string()));
        }
        for (k, v) in &self.extra {
            let text = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            rows.push((k.clone(), text));
        }
        rows
    }
}

// ============================================================================
// PREDICTION RESULT
// ============================================================================

/// Textual marker some upstream versions send instead of (or with) the flag
pub const LEAK_MARKER: &str = "Leak";

/// Opaque prediction outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 1 = leak, 0 = no leak
    #[serde(default, deserialize_with = "lenient_flag", skip_serializing_if = "Option::is_none")]
    pub prediction: Option<i64>,

    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// "Leak" / "No Leak"
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<SegmentId>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PredictionResult {
    pub fn leak() -> Self {
        Self {
            prediction: Some(1),
            details: Some(LEAK_MARKER.to_string()),
            ..Default::default()
        }
    }

    pub fn no_leak() -> Self {
        Self {
            prediction: Some(0),
            details: Some("No Leak".to_string()),
            ..Default::default()
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Either signal is sufficient; conflicting signals are not reconciled
    pub fn indicates_leak(&self) -> bool {
        self.prediction == Some(1) || self.details.as_deref() == Some(LEAK_MARKER)
    }
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// One prediction cycle: sensor input plus model outcome.
///
/// Never mutated after construction; share it as `Arc<Snapshot>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation_input: Option<SimulationInput>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<PredictionResult>,
}

impl Snapshot {
    pub fn new(input: SimulationInput, result: PredictionResult) -> Self {
        Self {
            simulation_input: Some(input),
            result: Some(result),
        }
    }

    pub fn input(&self) -> Option<&SimulationInput> {
        self.simulation_input.as_ref()
    }

    pub fn sensor(&self, field: SensorField) -> Option<f64> {
        self.input().and_then(|i| i.get(field))
    }

    /// Leak condition; a snapshot without sensor input never counts as a leak
    pub fn is_leak(&self) -> bool {
        self.simulation_input.is_some()
            && self.result.as_ref().map(|r| r.indicates_leak()).unwrap_or(false)
    }

    pub fn confidence(&self) -> Option<f64> {
        self.result.as_ref().and_then(|r| r.confidence)
    }
}

// ============================================================================
// LENIENT DESERIALIZERS
// ============================================================================

/// Numbers and numeric strings become `Some`, anything else `None`
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite()))
}

/// Integral numbers only; "1" as a string is not the leak flag
fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        _ => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}
