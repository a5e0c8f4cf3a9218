use env_logger::{Builder, Env};
use log::LevelFilter;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::str::FromStr;

/// Route `log` output to stderr
///
/// Without `level` the filter is read from `RUST_LOG`, falling back to `info`.
/// Calling it a second time leaves the existing logger in place.
///
/// # Arguments
/// * `level` - one of `off`, `error`, `warn`, `info`, `debug`, `trace`
#[pyfunction]
#[pyo3(signature = (level=None))]
pub fn init_logger(level: Option<&str>) -> PyResult<()> {
    let mut builder: Builder = Builder::from_env(Env::default().default_filter_or("info"));

    if let Some(level) = level {
        let level_filter: LevelFilter =
            LevelFilter::from_str(level).map_err(|_| PyValueError::new_err(format!("unknown log level '{level}'")))?;
        builder.filter_level(level_filter);
    }

    match builder.try_init() {
        Ok(()) => log::info!("init_logger: logger initialised"),
        Err(_) => log::debug!("init_logger: logger already initialised"),
    }

    return Ok(());
}

#[test]
fn test_init_logger_twice_is_harmless() {
    assert!(init_logger(Some("warn")).is_ok());
    assert!(init_logger(None).is_ok());
}

#[test]
fn test_init_logger_rejects_unknown_level() {
    assert!(init_logger(Some("loud")).is_err());
}
