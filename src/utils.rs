/// Body line for an unread notification.
pub fn unread_summary(channel_name: &str, count: u32) -> String {
    if count == 1 {
        format!("1 new message in #{}", channel_name)
    } else {
        format!("{} new messages in #{}", count, channel_name)
    }
}

/// Send a desktop notification (macOS and Linux)
pub fn send_desktop_notification(title: &str, message: &str) {
    use std::process::Command;

    #[cfg(target_os = "macos")]
    {
        let safe_title = title.replace('"', "\\\"");
        let safe_msg = message.replace('"', "\\\"");
        let script = format!(
            "display notification \"{}\" with title \"{}\"",
            safe_msg, safe_title
        );
        let _ = Command::new("osascript").arg("-e").arg(&script).output();
    }

    #[cfg(target_os = "linux")]
    {
        let _ = Command::new("notify-send")
            .arg("--app-name=Belay Client")
            .arg("--urgency=normal")
            .arg("--expire-time=5000")
            .arg(title)
            .arg(message)
            .output();
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        let _ = (title, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unread_summary_pluralizes() {
        assert_eq!(unread_summary("general", 1), "1 new message in #general");
        assert_eq!(unread_summary("random", 4), "4 new messages in #random");
    }
}
