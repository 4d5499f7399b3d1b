use super::command_exec::{run_command_with_timeout, spawn_detached};
use super::{InstallRequest, InstallerBackend};
use crate::config::InstallerSettings;
use crate::error::{Result, UnipkgError};
use crate::utils::sanitize;
use std::process::Command;
use std::time::Duration;

const FILE_PLACEHOLDER: &str = "{file}";
const ARGS_PLACEHOLDER: &str = "{args}";
const ID_PLACEHOLDER: &str = "{id}";

/// Installer backend driven by command templates from `settings.kdl`.
///
/// Templates are tokenised with shell quoting rules before placeholders are
/// substituted, so a path with spaces stays a single argument and nothing is
/// ever passed through a shell.
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    settings: InstallerSettings,
}

impl CommandInstaller {
    pub fn new(settings: InstallerSettings) -> Self {
        Self { settings }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.settings.timeout_secs)
    }
}

impl InstallerBackend for CommandInstaller {
    fn install(
        &self,
        request: &InstallRequest<'_>,
        progress: &dyn Fn(Option<f64>),
    ) -> Result<bool> {
        let template = self
            .settings
            .install_template(request.installer_type)
            .ok_or_else(|| {
                UnipkgError::PlatformNotSupported(format!(
                    "no install command configured for '{}' installers",
                    request.installer_type
                ))
            })?;

        let file = request.file.to_string_lossy();
        let mut cmd = build_command(template, &[(FILE_PLACEHOLDER, &*file)], request.args)?;

        progress(None);
        tracing::debug!(command = ?cmd, "running installer");
        let output = run_command_with_timeout(&mut cmd, self.timeout())?;

        if output.status.success() {
            progress(Some(1.0));
            Ok(true)
        } else {
            tracing::warn!(
                status = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "installer exited with failure"
            );
            Ok(false)
        }
    }

    fn is_installed(&self, identifier: &str) -> Result<bool> {
        let Some(template) = &self.settings.is_installed else {
            tracing::debug!(identifier, "no is-installed command configured");
            return Ok(false);
        };
        sanitize::validate_identifier(identifier)?;

        let mut cmd = build_command(template, &[(ID_PLACEHOLDER, identifier)], &[])?;
        let output = run_command_with_timeout(&mut cmd, self.timeout())?;
        Ok(output.status.success())
    }

    fn launch(&self, identifier: &str) -> Result<()> {
        let template = self.settings.launch.as_deref().ok_or_else(|| {
            UnipkgError::PlatformNotSupported("no launch command configured".to_string())
        })?;
        sanitize::validate_identifier(identifier)?;

        let mut cmd = build_command(template, &[(ID_PLACEHOLDER, identifier)], &[])?;
        spawn_detached(&mut cmd)
    }
}

/// Tokenise `template` and substitute placeholders.
///
/// A token that is exactly `{args}` expands to zero or more arguments.
fn build_command(template: &str, values: &[(&str, &str)], args: &[String]) -> Result<Command> {
    let tokens = shlex::split(template).ok_or_else(|| {
        UnipkgError::Config(format!("Invalid quoting in command template: {}", template))
    })?;

    let mut argv: Vec<String> = Vec::with_capacity(tokens.len() + args.len());
    for token in tokens {
        if token == ARGS_PLACEHOLDER {
            argv.extend(args.iter().cloned());
            continue;
        }
        let substituted = values
            .iter()
            .fold(token, |acc, (placeholder, value)| acc.replace(placeholder, value));
        argv.push(substituted.replace(ARGS_PLACEHOLDER, &args.join(" ")));
    }

    let (program, rest) = argv
        .split_first()
        .ok_or_else(|| UnipkgError::Config("Empty command template".to_string()))?;

    let resolved = which::which(program)
        .map_err(|_| UnipkgError::DependencyMissing(program.clone()))?;

    let mut cmd = Command::new(resolved);
    cmd.args(rest);
    Ok(cmd)
}
