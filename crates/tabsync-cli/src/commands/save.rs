use crate::commands::common::{finish_background_sync, normalize_session_name, open_manager, CliContext};
use crate::error::CliError;

pub async fn run_save(name_parts: &[String], context: &CliContext) -> Result<(), CliError> {
    let name = normalize_session_name(name_parts)?;
    let manager = open_manager(context).await?;
    let mutation = manager.save_current_session(&name).await?;
    let session = &mutation.value;

    println!(
        "Saved '{}' ({} windows, {} tabs)",
        session.name,
        session.windows.len(),
        session.tab_count()
    );
    println!("{}", session.id);
    finish_background_sync(mutation.sync).await;
    Ok(())
}
