use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

use crate::json_api;
use crate::risk::RiskBand;

// ──────────────────────────────────────────────────────────────────────────────
// HJELPERE
// ──────────────────────────────────────────────────────────────────────────────

/// Godtar både str og dict/list fra Python (serialisert med json.dumps).
fn json_arg(py: Python<'_>, payload: &PyAny) -> PyResult<String> {
    if let Ok(s) = payload.extract::<&str>() {
        return Ok(s.to_owned());
    }
    let json_mod = py
        .import("json")
        .map_err(|e| PyValueError::new_err(format!("failed to import json: {e}")))?;
    json_mod
        .call_method1("dumps", (payload,))
        .and_then(|o| o.extract::<String>())
        .map_err(|e| PyValueError::new_err(format!("failed to serialize payload with json.dumps: {e}")))
}

/// Returnerer dict via Python sin json.loads (unngår pyo3 serde-feature).
fn to_py_obj(py: Python<'_>, out: &str) -> PyResult<PyObject> {
    let json_mod = py
        .import("json")
        .map_err(|e| PyValueError::new_err(format!("failed to import json: {e}")))?;
    let obj = json_mod
        .call_method1("loads", (out,))
        .map_err(|e| PyValueError::new_err(format!("internal JSON parse error via json.loads: {e}")))?;
    Ok(obj.into_py(py))
}

// ──────────────────────────────────────────────────────────────────────────────
// PyO3-FUNKSJONER
// ──────────────────────────────────────────────────────────────────────────────

#[pyfunction]
#[pyo3(signature = (payloads, schema_hint = None))]
fn extract_batch(py: Python<'_>, payloads: &PyAny, schema_hint: Option<&str>) -> PyResult<PyObject> {
    let json_in = json_arg(py, payloads)?;
    let out = json_api::extract_batch_json(&json_in, schema_hint).map_err(PyValueError::new_err)?;
    to_py_obj(py, &out)
}

#[pyfunction]
fn aggregate(py: Python<'_>, request: &PyAny) -> PyResult<PyObject> {
    let json_in = json_arg(py, request)?;
    let out = json_api::aggregate_json(&json_in).map_err(PyValueError::new_err)?;
    to_py_obj(py, &out)
}

#[pyfunction]
fn classify_acwr(acwr: f64) -> Option<&'static str> {
    RiskBand::classify(acwr).map(RiskBand::label)
}

// ──────────────────────────────────────────────────────────────────────────────
// PyO3-MODUL
// ──────────────────────────────────────────────────────────────────────────────

#[pymodule]
fn trainload_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(extract_batch, m)?)?;
    m.add_function(wrap_pyfunction!(aggregate, m)?)?;
    m.add_function(wrap_pyfunction!(classify_acwr, m)?)?;
    Ok(())
}
