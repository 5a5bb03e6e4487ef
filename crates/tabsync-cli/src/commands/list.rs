use crate::commands::common::{
    format_session_detail, format_session_lines, open_manager, parse_session_id,
    session_to_list_item, CliContext,
};
use crate::error::CliError;

pub async fn run_list(json: bool, context: &CliContext) -> Result<(), CliError> {
    let manager = open_manager(context).await?;
    let sessions = manager.list_sessions().await?;

    if json {
        let items = sessions.iter().map(session_to_list_item).collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("No saved sessions.");
        return Ok(());
    }

    for line in format_session_lines(&sessions) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_show(id: &str, json: bool, context: &CliContext) -> Result<(), CliError> {
    let session_id = parse_session_id(id)?;
    let manager = open_manager(context).await?;
    let session = manager.get_session(&session_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        for line in format_session_detail(&session) {
            println!("{line}");
        }
    }
    Ok(())
}
