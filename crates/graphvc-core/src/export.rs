//! Graph export.

use chrono::NaiveDate;
use std::path::Path;

use crate::error::GraphvcResult;
use crate::graph::model::VCGraph;

const MAX_SLUG_CHARS: usize = 40;

/// Serialize a graph as pretty-printed JSON.
pub fn to_json(graph: &VCGraph) -> GraphvcResult<String> {
    Ok(serde_json::to_string_pretty(graph)?)
}

/// Write a graph as pretty-printed JSON to `path`.
pub fn export_json(graph: &VCGraph, path: &Path) -> GraphvcResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, to_json(graph)?)?;
    Ok(())
}

/// Build a download filename: `graphvc-<slug>-<YYYY-MM-DD>.<ext>`.
///
/// The slug comes from `title`, or from the first three node labels when
/// there is no title.
pub fn generate_filename(graph: &VCGraph, title: Option<&str>, ext: &str, date: NaiveDate) -> String {
    let mut slug = title.map(slugify).unwrap_or_default();

    if slug.is_empty() {
        let labels: Vec<&str> = graph.nodes.iter().take(3).map(|n| n.label.as_str()).collect();
        slug = slugify(&labels.join(" "));
    }
    if slug.is_empty() {
        slug = "graph".to_string();
    }

    format!("graphvc-{}-{}.{}", slug, date.format("%Y-%m-%d"), ext)
}

/// Same as [`generate_filename`] with today's local date.
pub fn generate_filename_today(graph: &VCGraph, title: Option<&str>, ext: &str) -> String {
    generate_filename(graph, title, ext, chrono::Local::now().date_naive())
}

/// Lowercase, collapse every run of non-alphanumerics into `-`, cap the length.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug.truncate(MAX_SLUG_CHARS);
    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::{EntityType, GraphNode, NodeProperties};

    fn sample() -> VCGraph {
        let node = |id: &str, label: &str, t| GraphNode {
            id: id.to_string(),
            label: label.to_string(),
            entity_type: t,
            properties: NodeProperties::default(),
        };
        VCGraph {
            nodes: vec![
                node("paradigm", "Paradigm Capital", EntityType::Investor),
                node("uniswap", "Uniswap", EntityType::Project),
                node("series-a", "Series A 2024", EntityType::Round),
                node("hayden", "Hayden Adams", EntityType::Person),
            ],
            edges: vec![],
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_uses_title() {
        let name = generate_filename(&sample(), Some("My VC Graph"), "json", date());
        assert_eq!(name, "graphvc-my-vc-graph-2024-03-09.json");
    }

    #[test]
    fn test_slugifies_special_chars() {
        let name = generate_filename(&sample(), Some("TechCrunch: $50M Raise!!!"), "json", date());
        assert_eq!(name, "graphvc-techcrunch-50m-raise-2024-03-09.json");
    }

    #[test]
    fn test_truncates_long_titles() {
        let long = "A".repeat(100);
        let name = generate_filename(&sample(), Some(&long), "png", date());
        assert_eq!(name, format!("graphvc-{}-2024-03-09.png", "a".repeat(40)));
    }

    #[test]
    fn test_truncation_does_not_leave_trailing_dash() {
        let title = format!("{} tail", "b".repeat(39));
        assert_eq!(slugify(&title), "b".repeat(39));
    }

    #[test]
    fn test_falls_back_to_labels() {
        let name = generate_filename(&sample(), None, "json", date());
        assert_eq!(name, "graphvc-paradigm-capital-uniswap-series-a-2024-2024-03-09.json");
        let blank = generate_filename(&sample(), Some("!!!"), "json", date());
        assert!(blank.contains("paradigm"));
    }

    #[test]
    fn test_empty_graph_without_title() {
        let name = generate_filename(&VCGraph::default(), None, "json", date());
        assert_eq!(name, "graphvc-graph-2024-03-09.json");
    }

    #[test]
    fn test_export_json_writes_pretty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("graph.json");
        export_json(&sample(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\n  \"nodes\""));
        let parsed: VCGraph = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, sample());
    }
}
