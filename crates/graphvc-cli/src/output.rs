//! Terminal output formatting.

use colored::{ColoredString, Colorize};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use graphvc_core::api::{GenerateResponse, GraphRecord, UsageInfo};
use graphvc_core::graph::neighbors::ConnectedNode;
use graphvc_core::{EntityType, GraphNode, VCGraph};

/// Entity type in its graph color.
pub fn entity_badge(entity_type: EntityType) -> ColoredString {
    let name = entity_type.as_str();
    match entity_type {
        EntityType::Investor => name.blue(),
        EntityType::Project => name.green(),
        EntityType::Round => name.yellow(),
        EntityType::Narrative => name.magenta(),
        EntityType::Person => name.cyan(),
    }
}

pub fn print_generate_summary(response: &GenerateResponse) {
    let graph = &response.graph;
    let meta = &response.meta;

    if graph.is_empty() {
        println!("{}", "No VC relationships found in this content.".yellow());
        println!(
            "{}",
            "Try a funding announcement, an investor portfolio page or a deal article.".dimmed()
        );
        return;
    }

    println!(
        "{} {} nodes, {} edges",
        "Graph".cyan().bold(),
        graph.node_count(),
        graph.edge_count()
    );
    print_type_counts(graph);
    println!();

    let mut source = meta.source_type.as_str().to_string();
    if meta.cache_hit {
        match meta.cache_age_seconds {
            Some(age) => source.push_str(&format!(", cached {} ago", format_wait(age))),
            None => source.push_str(", cached"),
        }
    }

    println!("  {}:     {}", "Session".bold(), meta.session_id);
    println!("  {}:      {}", "Source".bold(), source);
    println!("  {}:      {}", "Tokens".bold(), meta.token_count);
    println!("  {}:        {} ms", "Time".bold(), meta.processing_ms);
}

pub fn print_type_counts(graph: &VCGraph) {
    let parts: Vec<String> = graph
        .type_counts()
        .into_iter()
        .map(|(t, count)| format!("{} {}", count, entity_badge(t)))
        .collect();
    println!("  {}", parts.join("  "));
}

/// Node detail with its properties and connections.
pub fn print_node(node: &GraphNode, connections: &[ConnectedNode<'_>]) {
    println!(
        "{} {} {}",
        node.label.bold(),
        entity_badge(node.entity_type),
        format!("({})", node.id).dimmed()
    );

    let entries = node.properties.entries();
    if !entries.is_empty() {
        println!();
        let width = entries.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
        for (name, value) in entries {
            println!("  {}  {}", pad_right(name, width).dimmed(), value);
        }
    }

    println!();
    if connections.is_empty() {
        println!("{}", "No connections.".dimmed());
        return;
    }

    println!("{}", format!("Connections ({})", connections.len()).bold());
    for c in connections {
        println!(
            "  {} {:<14} {} {}",
            c.direction.arrow().dimmed(),
            c.relationship.as_str(),
            c.node.label,
            entity_badge(c.node.entity_type)
        );
    }
}

/// Print graph history as a table.
pub fn print_history_table(records: &[GraphRecord]) {
    if records.is_empty() {
        println!("{}", "No saved graphs.".dimmed());
        return;
    }

    println!(
        "{:<10} {} {:>6} {:>6}  {}",
        "ID",
        pad_right("Title", 40),
        "Nodes",
        "Edges",
        "Created"
    );
    println!("{}", "─".repeat(84));

    for record in records {
        println!(
            "{:<10} {} {:>6} {:>6}  {}",
            short_id(&record.id),
            pad_right(&truncate(&record.title, 40), 40),
            record.node_count,
            record.edge_count,
            record.created_at.get(..10).unwrap_or(record.created_at.as_str()).dimmed()
        );
    }

    println!();
    println!("{} graph(s)", records.len());
}

pub fn print_usage(usage: &UsageInfo) {
    if usage.limit == 0 {
        println!("{}", "Daily limits are not enforced by this server.".dimmed());
        return;
    }
    let remaining = usage.remaining();
    let count = format!("{} of {}", remaining, usage.limit);
    let count = if remaining == 0 { count.red() } else { count.green() };
    println!("  {}: {} generations left today", "Server".bold(), count);
}

/// Human wait time: `45s`, `1m 30s`, `3h 5m`.
pub fn format_wait(secs: u64) -> String {
    match secs {
        0..=59 => format!("{}s", secs),
        60..=3599 if secs % 60 == 0 => format!("{}m", secs / 60),
        60..=3599 => format!("{}m {}s", secs / 60, secs % 60),
        _ if secs % 3600 / 60 == 0 => format!("{}h", secs / 3600),
        _ => format!("{}h {}m", secs / 3600, secs % 3600 / 60),
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Pad a plain string to a given visual width (right-padded).
fn pad_right(s: &str, width: usize) -> String {
    let visual = UnicodeWidthStr::width(s);
    if visual >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - visual))
    }
}

/// Truncate a string respecting visual width.
pub fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }

    let mut out = String::new();
    let mut width = 0;
    for c in s.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w > max_width - 3 {
            break;
        }
        out.push(c);
        width += w;
    }
    out.push_str("...");
    out
}
