use super::{Field, FieldValue, FieldValues, MetadataError, MetadataStore, MetadataWriteIntent};
use exiftool::{ExifTool, ExifToolError};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Arguments used for every write: edit in place without a `_original` backup
/// and keep the filesystem timestamps.
const WRITE_ARGS: [&str; 2] = ["-overwrite_original_in_place", "-P"];

/// Marks IPTC text as UTF-8 so German tags survive. Only sent along with IPTC
/// fields, it creates an IPTC block of its own otherwise.
const IPTC_UTF8_ARG: &str = "-codedcharacterset=utf8";

/// [`MetadataStore`] backed by a persistent `exiftool -stay_open` process.
///
/// The process lives as long as the store; dropping the store shuts it down.
/// When the process dies mid-batch, the failing call reports the error and
/// the next call starts a fresh process.
pub struct ExifToolStore {
    executable: Option<PathBuf>,
    exiftool: Option<ExifTool>,
}

impl ExifToolStore {
    /// Starts exiftool, either from `exiftool_path` or from the system's PATH.
    pub fn new(exiftool_path: Option<&Path>) -> Result<Self, ExifToolError> {
        let executable = exiftool_path.map(Path::to_path_buf);
        let exiftool = spawn(executable.as_deref())?;
        Ok(Self {
            executable,
            exiftool: Some(exiftool),
        })
    }

    fn with_process<T>(
        &mut self,
        command: impl FnOnce(&ExifTool) -> Result<T, ExifToolError>,
    ) -> Result<T, ExifToolError> {
        let exiftool = match self.exiftool.take() {
            Some(exiftool) => exiftool,
            None => {
                tracing::info!("Restarting exiftool");
                spawn(self.executable.as_deref())?
            }
        };

        let result = command(&exiftool);
        match &result {
            Err(err) if is_process_failure(err) => {
                tracing::warn!(error = %err, "exiftool process is gone, a new one is started for the next file");
            }
            _ => self.exiftool = Some(exiftool),
        }
        result
    }
}

fn spawn(executable: Option<&Path>) -> Result<ExifTool, ExifToolError> {
    match executable {
        Some(path) => ExifTool::with_executable(path),
        None => ExifTool::new(),
    }
}

/// Errors after which the stay_open process cannot answer any further command.
fn is_process_failure(err: &ExifToolError) -> bool {
    match err {
        ExifToolError::Io(_)
        | ExifToolError::ProcessTerminated
        | ExifToolError::StderrDisconnected
        | ExifToolError::MutexPoison(_) => true,
        ExifToolError::ExifToolProcess { message, .. } => message.contains("Process terminated"),
        _ => false,
    }
}

impl MetadataStore for ExifToolStore {
    fn read_fields(&mut self, path: &Path, fields: &[Field]) -> Result<FieldValues, MetadataError> {
        let tag_args: Vec<String> = fields.iter().map(|f| format!("-{}", f.write_tag())).collect();
        let mut args = vec!["-G"];
        args.extend(tag_args.iter().map(String::as_str));

        let json = self
            .with_process(|exiftool| exiftool.json(path, &args))
            .map_err(MetadataError::Read)?;
        Ok(fields_from_json(&json, fields))
    }

    fn write_fields(&mut self, path: &Path, intent: &MetadataWriteIntent) -> Result<(), MetadataError> {
        if intent.is_empty() {
            return Ok(());
        }
        let command = write_command(path, intent);
        let args: Vec<&str> = command.iter().map(String::as_str).collect();

        let lines = self
            .with_process(|exiftool| exiftool.execute_lines(&args))
            .map_err(MetadataError::Write)?;
        ensure_updated(&lines)
    }
}

/// Full argument list for writing `intent` to `path`.
fn write_command(path: &Path, intent: &MetadataWriteIntent) -> Vec<String> {
    let mut args: Vec<String> = WRITE_ARGS.iter().map(|arg| (*arg).to_string()).collect();
    if intent.iter().any(|(field, _)| field.is_iptc()) {
        args.push(IPTC_UTF8_ARG.to_string());
    }
    args.extend(assignment_args(intent));
    args.push(path.to_string_lossy().into_owned());
    args
}

/// Picks the requested fields out of exiftool's `-j -G` output for one file.
fn fields_from_json(json: &Value, fields: &[Field]) -> FieldValues {
    fields
        .iter()
        .filter_map(|&field| {
            let value = json.get(field.read_key())?;
            value_to_field(value).map(|v| (field, v))
        })
        .collect()
}

fn value_to_field(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Array(items) => Some(FieldValue::List(
            items.iter().filter_map(scalar_to_string).collect(),
        )),
        other => scalar_to_string(other).map(FieldValue::Text),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// One `-TAG=value` argument per value. Repeating a list tag within one command
/// replaces the old list with all given items.
fn assignment_args(intent: &MetadataWriteIntent) -> Vec<String> {
    let mut args = Vec::new();
    for (field, value) in intent.iter() {
        match value {
            FieldValue::Text(text) => args.push(assignment(*field, text)),
            FieldValue::List(items) => {
                args.extend(items.iter().map(|item| assignment(*field, item)));
            }
        }
    }
    args
}

fn assignment(field: Field, value: &str) -> String {
    // The stay_open protocol is line based, a raw newline would split the argument.
    let value = value.replace(['\r', '\n'], " ");
    format!("-{}={}", field.write_tag(), value)
}

/// Exiftool reports the result of a write as summary lines such as
/// `    1 image files updated`. Anything without an updated or unchanged
/// file counts as a rejected write.
fn ensure_updated(lines: &[String]) -> Result<(), MetadataError> {
    let touched = lines.iter().any(|line| {
        let line = line.trim();
        let count = line
            .split_whitespace()
            .next()
            .and_then(|n| n.parse::<u32>().ok())
            .unwrap_or(0);
        count > 0 && (line.ends_with("image files updated") || line.ends_with("image files unchanged"))
    });

    if touched {
        Ok(())
    } else {
        Err(MetadataError::Rejected(lines.join("; ")))
    }
}
