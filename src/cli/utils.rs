use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::io::{self, BufRead, IsTerminal, Read, Write};

use crate::app::App;
use crate::cli::OutputFormat;
use crate::gate::Target;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: &OutputFormat,
    message: &str,
    error_code: Option<&str>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(
    output_format: &OutputFormat,
    collection_name: &str,
    message: &str,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                collection_name: []
            }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Pretty JSON for `--json`, otherwise the text rendering.
pub fn output_value<T: Serialize>(
    output_format: &OutputFormat,
    value: &T,
    text: impl FnOnce() -> String,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => println!("{}", text()),
    }
    Ok(())
}

/// Stop before any request when the gate would hide this screen or button.
pub fn require(app: &App, target: impl Into<Target>) -> anyhow::Result<()> {
    let target = target.into();
    let session = app.session().get();
    if !session.is_authenticated() {
        return Err(anyhow::anyhow!("Not signed in. Run `simig auth login <username>` first"));
    }

    let allowed = match target {
        Target::Screen(screen) => app.resolve(screen) == screen,
        Target::Action(_) => app.can_see(target),
    };
    if !allowed {
        let role = session.role.map(|r| r.to_string()).unwrap_or_else(|| "unknown".to_string());
        return Err(anyhow::anyhow!("Not available for role '{}'", role));
    }
    Ok(())
}

/// Ask a yes/no question on stderr. `assume_yes` skips the prompt.
pub fn confirm(prompt: &str, assume_yes: bool) -> anyhow::Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    eprint!("{} [y/N] ", prompt);
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Read one line for a secret that was not passed as a flag.
pub fn prompt_secret(label: &str) -> anyhow::Result<String> {
    eprint!("{}: ", label);
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// JSON object from `--data`, or from stdin when it is not a terminal.
pub fn read_json_input(data: Option<String>) -> anyhow::Result<Value> {
    let raw = match data {
        Some(data) => data,
        None => {
            let stdin = io::stdin();
            if stdin.is_terminal() {
                return Err(anyhow::anyhow!("Pass the record as --data '<json>' or pipe it on stdin"));
            }
            let mut buf = String::new();
            stdin.lock().read_to_string(&mut buf)?;
            buf
        }
    };

    let value: Value = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("Invalid JSON input: {}", e))?;
    if !value.is_object() {
        return Err(anyhow::anyhow!("Input must be a JSON object"));
    }
    Ok(value)
}

/// Overlay the keys of `patch` onto `base` and decode the result.
pub fn merge_draft<D: Serialize + DeserializeOwned>(base: &D, patch: Value) -> anyhow::Result<D> {
    let mut merged = serde_json::to_value(base)?;
    if let (Some(target), Value::Object(fields)) = (merged.as_object_mut(), patch) {
        target.extend(fields);
    }
    serde_json::from_value(merged).map_err(|e| anyhow::anyhow!("Invalid record: {}", e))
}
