use std::env;
use std::process::Command;

fn main() {
    // Tests run without the `extension-module` feature, so they need libpython on the link line
    let profile: String = env::var("PROFILE").unwrap_or_default();
    if profile != "test" && profile != "debug" {
        return;
    }

    // PYO3_PYTHON first, then VIRTUAL_ENV, then python3
    let python_cmd: String = if let Ok(pyo3_python) = env::var("PYO3_PYTHON") {
        pyo3_python
    } else if let Ok(venv) = env::var("VIRTUAL_ENV") {
        format!("{}/bin/python", venv)
    } else {
        "python3".to_string()
    };

    let Some(libdir) = python_query(&python_cmd, "import sysconfig; print(sysconfig.get_config_var('LIBDIR'))") else {
        return;
    };
    println!("cargo:rustc-link-search=native={}", libdir);

    if let Some(version) = python_query(&python_cmd, "import sys; print(f'{sys.version_info.major}.{sys.version_info.minor}')") {
        println!("cargo:rustc-link-lib=dylib=python{}", version);
    }
}

/// Run a one-line Python snippet and return its trimmed stdout
fn python_query(python_cmd: &str, snippet: &str) -> Option<String> {
    let output = Command::new(python_cmd).args(["-c", snippet]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout: String = String::from_utf8(output.stdout).ok()?;
    return Some(stdout.trim().to_string());
}
