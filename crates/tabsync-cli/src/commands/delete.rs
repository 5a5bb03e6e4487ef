use crate::commands::common::{finish_background_sync, open_manager, parse_session_id, CliContext};
use crate::error::CliError;

pub async fn run_delete(id: &str, context: &CliContext) -> Result<(), CliError> {
    let session_id = parse_session_id(id)?;
    let manager = open_manager(context).await?;
    let mutation = manager.delete_session(&session_id).await?;

    if mutation.value {
        println!("{session_id}");
    } else {
        println!("No session with id {session_id}; nothing deleted.");
    }
    finish_background_sync(mutation.sync).await;
    Ok(())
}
