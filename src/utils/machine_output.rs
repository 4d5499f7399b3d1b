//! `--json` output: every command prints exactly one envelope on stdout.

use crate::error::Result;
use chrono::Utc;
use serde::Serialize;

pub const ENVELOPE_VERSION: &str = "v1";

#[derive(Debug, Serialize)]
pub struct MachineEnvelope<T>
where
    T: Serialize,
{
    pub version: String,
    pub command: String,
    pub ok: bool,
    pub data: Option<T>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub meta: MachineMeta,
}

#[derive(Debug, Serialize)]
pub struct MachineMeta {
    pub generated_at: String,
}

impl<T: Serialize> MachineEnvelope<T> {
    pub fn new(command: &str, data: Option<T>, warnings: Vec<String>, errors: Vec<String>) -> Self {
        Self {
            version: ENVELOPE_VERSION.to_string(),
            command: command.to_string(),
            ok: errors.is_empty(),
            data,
            warnings,
            errors,
            meta: MachineMeta {
                generated_at: Utc::now().to_rfc3339(),
            },
        }
    }
}

pub fn emit<T>(command: &str, data: T, warnings: Vec<String>) -> Result<()>
where
    T: Serialize,
{
    let envelope = MachineEnvelope::new(command, Some(data), warnings, Vec::new());
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

/// Failure envelope; `data` is null.
pub fn emit_error(command: &str, error: &str) -> Result<()> {
    let envelope: MachineEnvelope<()> =
        MachineEnvelope::new(command, None, Vec::new(), vec![error.to_string()]);
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}
