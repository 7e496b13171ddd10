use crate::app::command_support::{success, CommandContext};
use tracing::info;

pub fn cmd_build_db(context: &CommandContext) -> Result<String, String> {
    let db = context.open_database()?;
    db.build_schema().map_err(|e| e.to_string())?;
    info!(database = db.location(), "schema created");
    Ok(success("Database tables created successfully!"))
}

pub fn cmd_nuke_db(context: &CommandContext) -> Result<String, String> {
    let db = context.open_database()?;
    db.drop_schema().map_err(|e| e.to_string())?;
    info!(database = db.location(), "schema dropped");
    Ok(success("Database tables cleared successfully!"))
}
