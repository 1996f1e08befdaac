//! Bridge WASM <-> JavaScript trung lập framework.

use chrono::NaiveDate;
use registry_core::{
    case_rows, parse_calendar_date, Patient, RegistryConfig, RegistryError, RegistryOverview,
    RegistryQuery,
};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsRegistryConfig {
    #[serde(default)]
    cache_ttl_secs: Option<u64>,
    #[serde(default)]
    cache_key: Option<String>,
    #[serde(default)]
    top_wards: Option<usize>,
    #[serde(default)]
    utc_offset_minutes: Option<i32>,
}

impl From<JsRegistryConfig> for RegistryConfig {
    fn from(cfg: JsRegistryConfig) -> Self {
        let mut base = RegistryConfig::default();
        if let Some(secs) = cfg.cache_ttl_secs {
            base.cache_ttl_secs = secs;
        }
        if let Some(key) = cfg.cache_key {
            base.cache_key = key;
        }
        if let Some(top) = cfg.top_wards {
            base.top_wards = top;
        }
        if let Some(minutes) = cfg.utc_offset_minutes {
            base.utc_offset_minutes = minutes;
        }
        base
    }
}

/// Giá trị thô của các hộp chọn trên màn hình danh sách.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct JsQuery {
    search: String,
    ward: String,
    outcome: String,
    classification: String,
    card: Option<String>,
}

impl TryFrom<JsQuery> for RegistryQuery {
    type Error = RegistryError;

    fn try_from(query: JsQuery) -> Result<Self, Self::Error> {
        RegistryQuery::from_selectors(
            &query.search,
            &query.ward,
            &query.outcome,
            &query.classification,
            query.card.as_deref(),
        )
    }
}

/// Tổng quan (thẻ + biểu đồ) từ phản hồi `{status, data}` của kho dữ liệu.
#[wasm_bindgen]
pub fn summarize_registry(
    response: JsValue,
    today: Option<String>,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let patients = read_patients(response)?;

    let cfg = match config {
        Some(js_cfg) => {
            let cfg: JsRegistryConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            RegistryConfig::from(cfg)
        }
        None => RegistryConfig::default(),
    };

    let overview = RegistryOverview::build(&patients, evaluation_date(today.as_deref(), &cfg), &cfg);

    to_value(&overview)
        .map_err(|err| JsValue::from_str(&format!("Không serialize tổng quan: {err}")))
}

/// Danh sách ca đã lọc, mỗi dòng kèm trạng thái và các trường còn thiếu.
#[wasm_bindgen]
pub fn filter_registry(response: JsValue, query: JsValue) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let patients = read_patients(response)?;

    let query: JsQuery = if query.is_undefined() || query.is_null() {
        JsQuery::default()
    } else {
        from_value(query)
            .map_err(|err| JsValue::from_str(&format!("Không đọc được bộ lọc: {err}")))?
    };
    let query = RegistryQuery::try_from(query)
        .map_err(|err| JsValue::from_str(&format_registry_error(err)))?;

    to_value(&case_rows(&patients, &query))
        .map_err(|err| JsValue::from_str(&format!("Không serialize danh sách: {err}")))
}

fn read_patients(response: JsValue) -> Result<Vec<Patient>, JsValue> {
    let value = from_value::<serde_json::Value>(response)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được JSON phản hồi: {err}")))?;
    Ok(registry_sheets::patients_from_response(&value))
}

fn evaluation_date(today: Option<&str>, cfg: &RegistryConfig) -> NaiveDate {
    today
        .and_then(|raw| parse_calendar_date(raw, cfg.utc_offset()))
        .unwrap_or_else(|| cfg.today())
}

fn format_registry_error(err: RegistryError) -> String {
    format!("Registry error: {err}")
}
