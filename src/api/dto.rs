use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    db::models::{Inverter, Plant},
    reports::{
        aggregate::{day_key, DailyMaxima, DailyTemperature, InverterTotal, PlantTotals, RangeTotals},
        DateRange,
    },
};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Accept an identifier sent either as a JSON integer or as a numeric string.
fn de_optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Text(String),
    }

    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Int(id)) => Ok(Some(id)),
        Some(RawId::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(RawId::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("identifier must be an integer, got {s:?}"))),
    }
}

/// Keep explicit `null`s: a present-but-null field is `Some(Value::Null)`,
/// an absent one stays `None` through `#[serde(default)]`.
fn de_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Plants
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlantDto {
    pub id: i64,
    pub name: String,
}

impl From<Plant> for PlantDto {
    fn from(p: Plant) -> Self {
        Self { id: p.id, name: p.name }
    }
}

/// Request body for `POST /plants`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreatePlantRequest {
    /// Integer, or a string holding an integer.
    #[serde(default, deserialize_with = "de_optional_id")]
    #[schema(value_type = Option<i64>)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Request body for `PUT /plants/{id}`. Only `name` may change; sending `id`
/// is rejected. Other fields are ignored.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePlantRequest {
    #[serde(default, deserialize_with = "de_present")]
    #[schema(value_type = Option<Object>)]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "de_present")]
    #[schema(value_type = Option<String>)]
    pub name: Option<Value>,
}

// ---------------------------------------------------------------------------
// Inverters
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InverterDto {
    pub inversor_id: i64,
    pub inversor_localizacao: String,
}

impl From<Inverter> for InverterDto {
    fn from(i: Inverter) -> Self {
        Self {
            inversor_id: i.inverter_id,
            inversor_localizacao: i.location,
        }
    }
}

/// Request body for `POST /inversor`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateInverterRequest {
    /// Integer, or a string holding an integer.
    #[serde(default, deserialize_with = "de_optional_id")]
    #[schema(value_type = Option<i64>)]
    pub inversor_id: Option<i64>,
    #[serde(default)]
    pub inversor_localizacao: Option<String>,
}

/// Request body for `PUT /inversor/{inversor_id}`. Only the location may
/// change; sending `inversor_id` (or `id`) is rejected.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateInverterRequest {
    #[serde(default, deserialize_with = "de_present")]
    #[schema(value_type = Option<Object>)]
    pub inversor_id: Option<Value>,
    #[serde(default, deserialize_with = "de_present")]
    #[schema(value_type = Option<Object>)]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "de_present")]
    #[schema(value_type = Option<String>)]
    pub inversor_localizacao: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Response for `DELETE /inversor/{inversor_id}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InverterDeletedResponse {
    pub message: String,
    pub deleted_inversor: InverterDto,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Response for `GET /geracaoInversorRangeDeData/...`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InverterGenerationResponse {
    pub inversor_id: i64,
    /// Range start, ISO-8601 UTC.
    pub data_inicio: String,
    /// Range end, ISO-8601 UTC.
    pub data_fim: String,
    /// Watts, summed over every reading.
    pub total_potencia: f64,
    pub potencia_maxima: Option<f64>,
    pub total_leituras: u64,
}

impl InverterGenerationResponse {
    pub fn new(inversor_id: i64, range: &DateRange, totals: &RangeTotals) -> Self {
        Self {
            inversor_id,
            data_inicio: range.start_iso(),
            data_fim: range.end_iso(),
            total_potencia: totals.total_power,
            potencia_maxima: totals.max_power,
            total_leituras: totals.reading_count,
        }
    }
}

/// Response for `GET /resumoInversor/...`: generation totals plus the mean
/// temperature over the range.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InverterSummaryResponse {
    #[serde(flatten)]
    pub generation: InverterGenerationResponse,
    /// Unrounded; `null` when no reading has a temperature.
    pub media_temperatura: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DailyTemperatureDto {
    /// `YYYY-MM-DD`
    pub dia: String,
    /// Degrees Celsius, 2 decimal places.
    pub media_temperatura: f64,
}

impl From<&DailyTemperature> for DailyTemperatureDto {
    fn from(d: &DailyTemperature) -> Self {
        Self {
            dia: day_key(d.day),
            media_temperatura: d.avg_temperature,
        }
    }
}

/// Response for `GET /temperaturaMediaInversor/...`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AverageTemperatureResponse {
    pub inversor_id: i64,
    pub data_inicio: String,
    pub data_fim: String,
    /// Ascending by day.
    pub temperaturas: Vec<DailyTemperatureDto>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DailyMaxPowerDto {
    /// `YYYY-MM-DD`
    pub dia: String,
    pub potencia: Option<f64>,
}

/// Response for `GET /potenciaMaximaDia/...`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MaximumPowerDayResponse {
    pub inversor_id: i64,
    pub data_inicio: String,
    pub data_fim: String,
    /// Ascending by day.
    pub maximas_diarias: Vec<DailyMaxPowerDto>,
    pub soma_maximas: f64,
}

impl MaximumPowerDayResponse {
    pub fn new(inversor_id: i64, range: &DateRange, maxima: DailyMaxima) -> Self {
        Self {
            inversor_id,
            data_inicio: range.start_iso(),
            data_fim: range.end_iso(),
            maximas_diarias: maxima
                .days
                .iter()
                .map(|d| DailyMaxPowerDto {
                    dia: day_key(d.day),
                    potencia: d.max_power,
                })
                .collect(),
            soma_maximas: maxima.sum_of_maxima,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InverterTotalDto {
    #[serde(rename = "_id")]
    pub inversor_id: i64,
    pub total: f64,
}

impl From<&InverterTotal> for InverterTotalDto {
    fn from(t: &InverterTotal) -> Self {
        Self {
            inversor_id: t.inverter_id,
            total: t.total_power,
        }
    }
}

/// Response for `GET /geracaoUsina/...`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlantGenerationResponse {
    pub usina_id: i64,
    pub data_inicio: String,
    pub data_fim: String,
    /// `0` when the plant has no readings in the range.
    pub soma_total_usina: f64,
    /// Ascending by inverter id.
    pub soma_por_inversor: Vec<InverterTotalDto>,
}

impl PlantGenerationResponse {
    pub fn new(usina_id: i64, range: &DateRange, totals: &PlantTotals) -> Self {
        Self {
            usina_id,
            data_inicio: range.start_iso(),
            data_fim: range.end_iso(),
            soma_total_usina: totals.grand_total,
            soma_por_inversor: totals.per_inverter.iter().map(Into::into).collect(),
        }
    }
}
