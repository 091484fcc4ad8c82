use colored::Colorize;
use portal_session::{Notice, NoticeLevel, Notifier, Session};

/// Prints notices to stderr, colored by level.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        let line = match notice.level {
            NoticeLevel::Info => format!("ℹ {}", notice.message).bright_blue(),
            NoticeLevel::Warning => format!("⚠ {}", notice.message).yellow(),
            NoticeLevel::Error => format!("✖ {}", notice.message).bright_red().bold(),
        };
        eprintln!("{}", line);
    }
}

pub fn print_banner(portal_name: &str) {
    let title = format!("  Course Enrollment · {}  ", portal_name);
    let rule = "═".repeat(title.chars().count());
    println!("{}", format!("╔{}╗", rule).bright_cyan());
    println!("{}", format!("║{}║", title).bright_cyan());
    println!("{}", format!("╚{}╝", rule).bright_cyan());
    println!();
}

pub fn print_session(session: &Session) {
    if !session.is_authenticated() {
        println!("{}", "Not signed in".dimmed());
        return;
    }

    let role = session
        .role
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".to_string());

    println!("{:>12} {}", "user".bold(), session.username);
    println!("{:>12} {}", "id".bold(), session.user_id);
    println!("{:>12} {}", "role".bold(), role);
    if let Some(secondary_id) = &session.secondary_id {
        println!("{:>12} {}", "student no.".bold(), secondary_id);
    }
    if let Some(avatar) = &session.avatar_url {
        println!("{:>12} {}", "avatar".bold(), avatar);
    }
}

pub fn success(message: &str) {
    println!("{}", format!("✔ {}", message).bright_green());
}

pub fn failure(message: &str) {
    println!("{}", format!("✖ {}", message).bright_red());
}
