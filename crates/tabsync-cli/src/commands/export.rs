use std::path::Path;

use tabsync_core::export::ExportFormat;

use crate::cli::ExportFormatArg;
use crate::commands::common::{finish_background_sync, open_manager, CliContext};
use crate::error::CliError;

/// Explicit format first, then the path extension. Stdout defaults to json.
pub fn resolve_export_format(
    format: Option<ExportFormatArg>,
    path: Option<&Path>,
) -> Result<ExportFormat, CliError> {
    if let Some(format) = format {
        return Ok(format.into());
    }
    match path {
        Some(path) => Ok(ExportFormat::from_path(path)?),
        None => Ok(ExportFormat::Json),
    }
}

pub async fn run_export(
    format: Option<ExportFormatArg>,
    output_path: Option<&Path>,
    context: &CliContext,
) -> Result<(), CliError> {
    let format = resolve_export_format(format, output_path)?;
    let manager = open_manager(context).await?;
    let rendered = manager.export_sessions(format).await?;

    if let Some(path) = output_path {
        std::fs::write(path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}

pub async fn run_import(
    path: &Path,
    format: Option<ExportFormatArg>,
    context: &CliContext,
) -> Result<(), CliError> {
    let format = resolve_export_format(format, Some(path))?;
    let data = std::fs::read_to_string(path)?;
    let manager = open_manager(context).await?;
    let mutation = manager.import_sessions(&data, format).await?;

    println!(
        "Imported {} sessions from {}",
        mutation.value.len(),
        path.display()
    );
    finish_background_sync(mutation.sync).await;
    Ok(())
}
