#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut args = text
            .trim()
            .split(' ')
            .filter(|e| return !e.is_empty())
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        if args.is_empty() {
            return None;
        }
        let prefix = args.remove(0);

        let cmd = SlashCommand {
            command: prefix,
            args,
        };
        if cmd.is_quit()
            || cmd.is_help()
            || cmd.is_voice()
            || cmd.is_upload()
            || cmd.is_documents()
            || cmd.is_delete()
            || cmd.is_debug()
            || cmd.is_cancel()
        {
            return Some(cmd);
        }

        return None;
    }

    /// All arguments rejoined, so file paths containing spaces survive.
    pub fn arg(&self) -> Option<String> {
        if self.args.is_empty() {
            return None;
        }

        return Some(self.args.join(" "));
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }

    pub fn is_voice(&self) -> bool {
        return ["/v", "/voice"].contains(&self.command.as_str());
    }

    pub fn is_upload(&self) -> bool {
        return ["/u", "/upload"].contains(&self.command.as_str());
    }

    pub fn is_documents(&self) -> bool {
        return ["/docs", "/documents"].contains(&self.command.as_str());
    }

    pub fn is_delete(&self) -> bool {
        return ["/delete", "/rm"].contains(&self.command.as_str());
    }

    pub fn is_debug(&self) -> bool {
        return ["/d", "/debug"].contains(&self.command.as_str());
    }

    pub fn is_cancel(&self) -> bool {
        return ["/cancel"].contains(&self.command.as_str());
    }
}
