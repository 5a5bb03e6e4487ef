use crate::commands::common::{open_manager, parse_session_id, CliContext};
use crate::error::CliError;

pub async fn run_restore(id: &str, context: &CliContext) -> Result<(), CliError> {
    let session_id = parse_session_id(id)?;
    let manager = open_manager(context).await?;
    let session = manager.restore_session(&session_id).await?;

    println!(
        "Restored '{}' ({} windows, {} tabs)",
        session.name,
        session.windows.len(),
        session.tab_count()
    );
    Ok(())
}
