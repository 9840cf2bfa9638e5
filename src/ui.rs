//! Terminal UI: notifications, prompts and tables.
//!
//! The orchestrator and the provisioner talk to the user only through the
//! [`Notifier`] and [`Prompter`] traits, so they can be driven by scripted
//! implementations in tests.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// User-facing messages
pub trait Notifier: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Interactive questions. `None` / `false` mean the user backed out.
pub trait Prompter: Send + Sync {
    /// Pick one of `options`, returning its index.
    fn select(&self, title: &str, options: &[String]) -> Option<usize>;
    fn confirm(&self, message: &str) -> bool;
    fn password(&self, message: &str) -> Option<String>;
}

/// Prints coloured one-line messages
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn info(&self, message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    fn warn(&self, message: &str) {
        println!("{} {}", "!".yellow(), message);
    }

    fn error(&self, message: &str) {
        eprintln!("{} {}", "x".red(), message);
    }
}

/// Prompts on the console with `inquire`
#[derive(Debug, Default, Clone, Copy)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn select(&self, title: &str, options: &[String]) -> Option<usize> {
        inquire::Select::new(title, options.to_vec())
            .raw_prompt()
            .ok()
            .map(|choice| choice.index)
    }

    fn confirm(&self, message: &str) -> bool {
        inquire::Confirm::new(message)
            .with_default(false)
            .prompt()
            .unwrap_or(false)
    }

    fn password(&self, message: &str) -> Option<String> {
        inquire::Password::new(message)
            .without_confirmation()
            .prompt()
            .ok()
    }
}

/// Spinner for a long wait. A hidden bar is returned when `visible` is false.
pub fn spinner(message: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} [{elapsed}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("◜◠◝◞◡◟"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}

/// Box-drawn table sized to its content, shrunk to the terminal width
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(console::measure_text_width(cell));
            }
        }

        let overhead = 3 * widths.len() + 3;
        while widths.iter().sum::<usize>() + overhead > max_width {
            match widths.iter_mut().max() {
                Some(widest) if *widest > 8 => *widest -= 1,
                _ => break,
            }
        }
        widths
    }

    pub fn render(&self, max_width: usize) -> String {
        let widths = self.column_widths(max_width);
        let rule = |left: &str, mid: &str, right: &str| {
            let inner: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}", left, inner.join(mid), right)
        };
        let line = |cells: &[String]| {
            let inner: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| {
                    let cell = console::truncate_str(cell, *width, "...");
                    let pad = width.saturating_sub(console::measure_text_width(&cell));
                    format!(" {}{} ", cell, " ".repeat(pad))
                })
                .collect();
            format!("  │{}│", inner.join("│"))
        };

        let headers: Vec<String> = self.headers.iter().map(|h| h.bold().to_string()).collect();
        let mut out = vec![rule("┌", "┬", "┐"), line(&headers[..]), rule("├", "┼", "┤")];
        out.extend(self.rows.iter().map(|row| line(&row[..])));
        out.push(rule("└", "┴", "┘"));
        out.join("\n")
    }

    pub fn print(&self) {
        let (_, width) = console::Term::stdout().size();
        println!("{}", self.render(width as usize));
    }
}
