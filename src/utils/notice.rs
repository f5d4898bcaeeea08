//! Human-readable status lines printed alongside the structured logs.

use owo_colors::OwoColorize;

pub fn progress(message: &str) {
    println!("{}", message.cyan());
}

pub fn success(message: &str) {
    println!("{}", format!("✅ {message}").green());
}

pub fn complete(label: &str, detail: &str) {
    println!("{} {}", format!("✅ {label}").green().bold(), detail);
}

pub fn failure(message: &str) {
    eprintln!("{}", format!("❌ {message}").red());
}
