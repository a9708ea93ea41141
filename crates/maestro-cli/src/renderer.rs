//! Terminal rendering for plan markdown.
//!
//! Plan overviews and step details arrive as markdown: a header line, one
//! line per step carrying the cursor arrow and a status icon, and a
//! progress footer. Rich mode styles those shapes directly (the arrow and
//! the icons get their own colors) and hands the remaining inline markdown
//! to termimad; `--no-color` passes the text through untouched.

use std::fmt::Write;

use anyhow::Result;
use termimad::{crossterm::style::Color, MadSkin};

const HEADER: &str = "\x1b[1;36m";
const CURSOR: &str = "\x1b[1;33m";
const RESET: &str = "\x1b[0m";

/// Renders plan markdown to the terminal, rich or plain.
pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::Magenta);
        skin.inline_code.set_bg(Color::AnsiValue(238));
        Self { rich_enabled, skin }
    }

    /// Render plan markdown to stdout.
    pub fn render(&self, markdown: &str) -> Result<()> {
        let mut out = String::new();
        self.render_to(&mut out, markdown)?;
        print!("{out}");
        Ok(())
    }

    fn render_to(&self, out: &mut String, markdown: &str) -> Result<()> {
        if !self.rich_enabled {
            out.push_str(markdown);
            return Ok(());
        }
        for line in markdown.lines() {
            if let Some(title) = line.strip_prefix("# ").or_else(|| line.strip_prefix("## ")) {
                writeln!(out, "{HEADER}{title}{RESET}")?;
            } else {
                let line = color_status_icons(line);
                if let Some(step) = line.strip_prefix('→') {
                    writeln!(out, "{CURSOR}→{RESET}{}", self.skin.inline(step))?;
                } else {
                    writeln!(out, "{}", self.skin.inline(&line))?;
                }
            }
        }
        Ok(())
    }
}

/// Color the step status icons in place; the surrounding text keeps its
/// markdown styling.
fn color_status_icons(line: &str) -> String {
    line.replace('✓', "\x1b[32m✓\x1b[0m")
        .replace('✗', "\x1b[31m✗\x1b[0m")
        .replace('➤', "\x1b[33m➤\x1b[0m")
}
