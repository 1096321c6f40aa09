//! Installation script generation.
//!
//! Renders a resolved package set into pip-consumable artifacts: a pinned
//! `requirements.txt`, POSIX install/activate scripts and a Windows batch
//! installer. Everything is derived from the resolution result; no further
//! registry lookups happen here.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;

use wheelhouse_core::{Environment, ResolutionResult, WheelhouseError, WheelhouseResult};

/// Writes installation artifacts for a resolved package set
pub struct ScriptGenerator {
    output_dir: Utf8PathBuf,
    venv_name: String,
}

impl ScriptGenerator {
    pub fn new(output_dir: Utf8PathBuf, venv_name: String) -> Self {
        Self {
            output_dir,
            venv_name,
        }
    }

    /// Generate every artifact, returning the written paths
    pub fn generate_all(
        &self,
        result: &ResolutionResult,
        environment: &Environment,
    ) -> WheelhouseResult<Vec<Utf8PathBuf>> {
        Ok(vec![
            self.write_requirements(result)?,
            self.write_install_script(result, environment)?,
            self.write_activate_script()?,
            self.write_batch_script(environment)?,
        ])
    }

    /// Write `requirements.txt` with one pinned `name==version` line per
    /// resolved package
    pub fn write_requirements(&self, result: &ResolutionResult) -> WheelhouseResult<Utf8PathBuf> {
        let mut contents = format!("# Generated by wheelhouse on {}\n", timestamp());
        for package in &result.packages {
            contents.push_str(&format!("{}=={}\n", package.name, package.version));
        }
        self.write_file("requirements.txt", &contents, false)
    }

    /// Write `install.sh`: creates the virtual environment and installs the
    /// pinned requirements
    pub fn write_install_script(
        &self,
        result: &ResolutionResult,
        environment: &Environment,
    ) -> WheelhouseResult<Utf8PathBuf> {
        let venv = &self.venv_name;
        let mut contents = format!(
            "#!/usr/bin/env bash\n\
             # Generated by wheelhouse on {}\n\
             # Target: Python {} ({})\n\
             set -euo pipefail\n\n\
             python3 -m venv {venv}\n\
             source {venv}/bin/activate\n\n\
             pip install --upgrade pip\n\
             pip install -r requirements.txt\n\n",
            timestamp(),
            environment.python_version,
            environment.platform,
        );
        contents.push_str(&format!(
            "echo \"Installed {} package(s) into {venv}\"\n",
            result.packages.len()
        ));
        self.write_file("install.sh", &contents, true)
    }

    /// Write `activate.sh`: convenience wrapper sourcing the venv
    pub fn write_activate_script(&self) -> WheelhouseResult<Utf8PathBuf> {
        let venv = &self.venv_name;
        let contents = format!(
            "#!/usr/bin/env bash\n\
             # Generated by wheelhouse on {}\n\
             source {venv}/bin/activate\n",
            timestamp(),
        );
        self.write_file("activate.sh", &contents, true)
    }

    /// Write `install.bat` for Windows hosts
    pub fn write_batch_script(&self, environment: &Environment) -> WheelhouseResult<Utf8PathBuf> {
        let venv = &self.venv_name;
        let contents = format!(
            "@echo off\r\n\
             rem Generated by wheelhouse on {}\r\n\
             rem Target: Python {}\r\n\
             python -m venv {venv}\r\n\
             call {venv}\\Scripts\\activate.bat\r\n\
             pip install --upgrade pip\r\n\
             pip install -r requirements.txt\r\n",
            timestamp(),
            environment.python_version,
        );
        self.write_file("install.bat", &contents, false)
    }

    fn write_file(
        &self,
        name: &str,
        contents: &str,
        executable: bool,
    ) -> WheelhouseResult<Utf8PathBuf> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            WheelhouseError::io(
                format!("Failed to create output directory '{}'", self.output_dir),
                e,
            )
        })?;

        let path = self.output_dir.join(name);
        std::fs::write(&path, contents)
            .map_err(|e| WheelhouseError::io(format!("Failed to write '{path}'"), e))?;

        if executable {
            set_executable(&path)?;
        }

        Ok(path)
    }
}

#[cfg(unix)]
fn set_executable(path: &Utf8Path) -> WheelhouseResult<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(|e| WheelhouseError::io(format!("Failed to set permissions on '{path}'"), e))
}

#[cfg(not(unix))]
fn set_executable(_path: &Utf8Path) -> WheelhouseResult<()> {
    Ok(())
}

fn timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
