use colored::Colorize;

/// Width of the banner and closing block rules
pub const RULE_WIDTH: usize = 60;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Format a step indicator
pub fn step(num: usize, total: usize, msg: &str) -> String {
    format!("{} {}", format!("[{}/{}]", num, total).blue().bold(), msg)
}

/// A full-width rule made of `ch`
pub fn rule(ch: char) -> String {
    ch.to_string().repeat(RULE_WIDTH)
}

/// Lines of the run banner
pub fn banner(title: &str) -> [String; 3] {
    [rule('='), title.bold().to_string(), rule('=')]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_width() {
        assert_eq!(rule('=').len(), 60);
        assert_eq!(rule('-'), "-".repeat(60));
    }

    #[test]
    fn test_banner_is_framed() {
        colored::control::set_override(false);
        let lines = banner("Apache Web Server Installation Script");
        assert_eq!(lines[0], lines[2]);
        assert_eq!(lines[1], "Apache Web Server Installation Script");
    }

    #[test]
    fn test_step_indicator() {
        colored::control::set_override(false);
        assert_eq!(step(3, 9, "start-service"), "[3/9] start-service");
    }
}
