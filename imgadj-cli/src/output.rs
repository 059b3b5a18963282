use colored::*;

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

pub fn print_progress(message: &str) {
    println!("{} {}", "⟳".cyan(), message);
}

/// Indented before/after line under a step.
pub fn print_change(line: &str) {
    println!("  {}", line.dimmed());
}
