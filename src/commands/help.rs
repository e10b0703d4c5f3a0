//! Usage hints for commands invoked with bad arguments.

/// Show brief usage for a command (used for error messages)
pub fn show_command_usage(command: &str) {
    match command {
        "plan" => log_block_start!("Usage: sundim plan [YYYY-MM-DD]"),
        "sun" => log_block_start!("Usage: sundim sun [YYYY-MM-DD]"),
        "on" | "off" | "toggle" => log_block_start!("Usage: sundim {}", command),
        "brightness" => log_block_start!("Usage: sundim brightness <0-100>"),
        "brighter" | "dimmer" => log_block_start!("Usage: sundim {} [1-100]", command),
        "props" => log_block_start!("Usage: sundim props [NAME]"),
        _ => log_block_start!("Usage: sundim [OPTIONS] [COMMAND]"),
    }
}
