//! PyO3 wrapper for BasinModel
//!
//! Exposes the basin model as a Python callable whose keyword levers
//! `v0..v{N-1}` are the policy parameters, the shape expected by
//! many-objective search frameworks.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::collections::HashMap;

use crate::orchestrator::{BasinConfig, BasinModel as RustBasinModel, Evaluation, HydrologyInput, ModelError};
use crate::objectives::Principle;

/// Objective values followed by the principle score
type EvaluationTuple = (f64, f64, f64, f64, f64, f64, Option<f64>);

fn to_py_err(e: ModelError) -> PyErr {
    PyErr::new::<PyValueError, _>(e.to_string())
}

fn to_tuple(evaluation: Evaluation) -> EvaluationTuple {
    let [o1, o2, o3, o4, o5, o6] = evaluation.objectives.to_array();
    (o1, o2, o3, o4, o5, o6, evaluation.principle)
}

/// Python wrapper for Rust BasinModel
///
/// # Example (from Python)
///
/// ```python
/// from basin_sim_core_rs import BasinModel
///
/// model = BasinModel(open("nile.json").read(), open("hydrology.json").read())
/// levers = {f"v{i}": 0.5 for i in range(model.parameter_count())}
/// egypt_agg, egypt_90p, had_low, sudan_agg, sudan_90p, gerd_hp, principle = model(**levers)
/// ```
#[pyclass(name = "BasinModel")]
pub struct PyBasinModel {
    inner: RustBasinModel,
}

#[pymethods]
impl PyBasinModel {
    /// Build a model from JSON configuration and hydrology
    ///
    /// # Errors
    ///
    /// Raises ValueError on any parse or configuration problem.
    #[new]
    #[pyo3(signature = (config_json, hydrology_json, principle = None))]
    fn new(config_json: &str, hydrology_json: &str, principle: Option<&str>) -> PyResult<Self> {
        let config = BasinConfig::from_json_str(config_json).map_err(to_py_err)?;
        let hydrology = HydrologyInput::from_json_str(hydrology_json).map_err(to_py_err)?;
        let mut inner = RustBasinModel::new(config, hydrology).map_err(to_py_err)?;

        if let Some(name) = principle {
            let principle: Principle = name.parse().map_err(to_py_err)?;
            inner.set_principle(principle);
        }

        Ok(PyBasinModel { inner })
    }

    /// Evaluate a parameter vector
    ///
    /// Returns `(o1, o2, o3, o4, o5, o6, principle)`; `principle` is None
    /// when no principle is configured.
    fn evaluate(&mut self, parameters: Vec<f64>) -> PyResult<EvaluationTuple> {
        self.inner
            .evaluate(&parameters)
            .map(to_tuple)
            .map_err(to_py_err)
    }

    /// Evaluate with keyword levers `v0=..., v1=..., ...`
    #[pyo3(signature = (**levers))]
    fn __call__(&mut self, levers: Option<&Bound<'_, PyDict>>) -> PyResult<EvaluationTuple> {
        let levers: HashMap<String, f64> = match levers {
            Some(dict) => dict.extract()?,
            None => HashMap::new(),
        };

        self.inner
            .evaluate_named(&levers)
            .map(to_tuple)
            .map_err(to_py_err)
    }

    /// Number of levers an evaluation expects
    fn parameter_count(&self) -> usize {
        self.inner.parameter_count()
    }

    /// Canonical name of the active principle
    fn principle(&self) -> &'static str {
        self.inner.principle().as_str()
    }

    /// Series of every entity after the latest evaluation, as JSON
    fn snapshot_json(&self) -> PyResult<String> {
        self.inner.snapshot().to_json().map_err(to_py_err)
    }
}
