use anyhow::Result;

use crate::app::App;
use crate::formatting::{normalize_emoji, REACTION_PICKER};

pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    pub fn parse(text: &str) -> Option<Self> {
        if !text.starts_with('/') {
            return None;
        }

        let parts: Vec<&str> = text.split_whitespace().collect();
        if parts.is_empty() {
            return None;
        }

        let name = parts[0][1..].to_string();
        let args = parts[1..].iter().map(|s| s.to_string()).collect();

        Some(Command { name, args })
    }
}

pub struct CommandHandler;

impl CommandHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn handle_command(&mut self, app: &mut App, text: &str) -> Result<()> {
        let cmd = match Command::parse(text) {
            Some(c) => c,
            None => return Ok(()),
        };

        match cmd.name.as_str() {
            "new" => {
                Self::handle_new(app, &cmd).await;
            }
            "rename" => {
                Self::handle_rename(app, &cmd).await;
            }
            "delete" => {
                app.delete_channel().await;
            }
            "thread" | "t" => {
                Self::handle_thread(app, &cmd).await;
            }
            "close" => {
                app.close_thread();
            }
            "react" => {
                Self::handle_react(app, &cmd, true).await;
            }
            "unreact" => {
                Self::handle_react(app, &cmd, false).await;
            }
            "read" => {
                app.mark_read().await;
            }
            "logout" => {
                app.logout().await;
            }
            "help" | "h" => {
                app.set_status(
                    "Commands: /new <name> | /rename <name> | /delete | /thread N | /close | \
                     /react <emoji> [N] | /unreact <emoji> [N] | /read | /logout",
                );
            }
            _ => {
                app.set_status(&format!("Unknown command: /{}", cmd.name));
            }
        }

        Ok(())
    }

    async fn handle_new(app: &mut App, cmd: &Command) {
        if cmd.args.is_empty() {
            app.set_status("Usage: /new <channel name>");
            return;
        }
        let name = cmd.args.join(" ");
        app.create_channel(&name).await;
    }

    async fn handle_rename(app: &mut App, cmd: &Command) {
        if cmd.args.is_empty() {
            app.set_status("Usage: /rename <new name>");
            return;
        }
        let name = cmd.args.join(" ");
        app.rename_channel(&name).await;
    }

    async fn handle_thread(app: &mut App, cmd: &Command) {
        if cmd.args.is_empty() {
            app.set_status("Usage: /thread N or /t N");
            return;
        }

        let num_str = cmd.args[0].trim_start_matches('#');
        let num: usize = match num_str.parse() {
            Ok(n) => n,
            Err(_) => {
                app.set_status("Usage: /thread N (where N is the message number)");
                return;
            }
        };

        let message_id = match app.message_at_display(num) {
            Some(msg) => msg.id,
            None => {
                app.set_status(&format!(
                    "Message #{} not found (1-{})",
                    num,
                    app.state.messages.len()
                ));
                return;
            }
        };

        app.open_thread(message_id).await;
    }

    async fn handle_react(app: &mut App, cmd: &Command, add: bool) {
        if cmd.args.is_empty() {
            app.set_status(&format!(
                "React with: {}  (usage: /react <emoji> [N])",
                REACTION_PICKER.join(" ")
            ));
            return;
        }

        let emoji = normalize_emoji(&cmd.args[0]);
        let target_num = cmd.args.get(1).and_then(|s| s.parse::<usize>().ok());
        let message_id = match app.reaction_target(target_num) {
            Some(id) => id,
            None => {
                app.set_status("No message to react to");
                return;
            }
        };

        if add {
            app.add_reaction(message_id, &emoji).await;
        } else {
            app.remove_reaction(message_id, &emoji).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_with_args() {
        let cmd = Command::parse("/rename dev talk").unwrap();
        assert_eq!(cmd.name, "rename");
        assert_eq!(cmd.args, vec!["dev".to_string(), "talk".to_string()]);
    }

    #[test]
    fn test_parse_rejects_plain_text() {
        assert!(Command::parse("hello world").is_none());
    }

    #[test]
    fn test_parse_bare_command() {
        let cmd = Command::parse("/delete").unwrap();
        assert_eq!(cmd.name, "delete");
        assert!(cmd.args.is_empty());
    }
}
