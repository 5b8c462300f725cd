//! Plain-text rendering of page regions and the stdin dialog host.

use std::io::{self, BufRead, Write};

use client_core::{
    view::{Node, NodeKind, Region},
    Prompter,
};
use tracing::warn;

pub fn render_region(out: &mut impl Write, region: &Region) -> io::Result<()> {
    render_nodes(out, &region.nodes)
}

pub fn render_nodes(out: &mut impl Write, nodes: &[Node]) -> io::Result<()> {
    for node in nodes {
        render_node(out, node, 0)?;
    }
    out.flush()
}

fn render_node(out: &mut impl Write, node: &Node, depth: usize) -> io::Result<()> {
    let indent = "  ".repeat(depth);
    match node.kind {
        NodeKind::Bubble => {
            let speaker = if node.has_class("user-message") {
                "you"
            } else {
                "learnbot"
            };
            let mut lines = node.text.lines();
            writeln!(out, "{indent}{speaker}> {}", lines.next().unwrap_or(""))?;
            let pad = " ".repeat(speaker.len() + 2);
            for line in lines {
                writeln!(out, "{indent}{pad}{line}")?;
            }
            return Ok(());
        }
        NodeKind::Heading => writeln!(out, "{indent}== {} ==", node.text)?,
        NodeKind::Button => {
            let id = node.id.as_deref().unwrap_or("-");
            let state = if node.enabled { "" } else { " (busy)" };
            let mark = if node.has_class("mc-correct") {
                " ✓"
            } else if node.has_class("mc-wrong") {
                " ✗"
            } else {
                ""
            };
            writeln!(out, "{indent}[{}] <{id}>{mark}{state}", node.text)?;
        }
        NodeKind::Input => {
            let id = node.id.as_deref().unwrap_or("-");
            writeln!(out, "{indent}<{id}> {}", node.text)?;
        }
        NodeKind::Notice => {
            let tag = if node.has_class("text-danger") { "!" } else { "*" };
            writeln!(out, "{indent}{tag} {}", node.text)?;
        }
        NodeKind::ListItem => writeln!(out, "{indent}-")?,
        NodeKind::Text | NodeKind::Paragraph if !node.text.is_empty() => {
            writeln!(out, "{indent}{}", node.text)?
        }
        NodeKind::Container
        | NodeKind::Text
        | NodeKind::Paragraph
        | NodeKind::LineBreak => {}
    }
    for child in &node.children {
        render_node(out, child, depth + 1)?;
    }
    Ok(())
}

/// Reads one trimmed line; `None` at end of input.
pub fn read_line(input: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

pub struct StdinPrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> StdinPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompter for StdinPrompter<R, W> {
    fn confirm(&mut self, message: &str) -> bool {
        if let Err(err) = write!(self.output, "{message} [y/N] ").and_then(|()| self.output.flush())
        {
            warn!(error = %err, "could not show confirmation prompt");
            return false;
        }
        matches!(
            read_line(&mut self.input).ok().flatten().as_deref(),
            Some("y" | "Y" | "yes" | "Yes")
        )
    }

    fn alert(&mut self, message: &str) {
        if let Err(err) = writeln!(self.output, "! {message}") {
            warn!(error = %err, message, "could not show alert");
        }
    }
}

#[cfg(test)]
#[path = "tests/terminal_tests.rs"]
mod tests;
