//! The compose module renders parsed artifacts and the summary history into
//! text formats: a Markdown slide deck, a Graphviz mindmap and a Markdown
//! history digest.

use anyhow::Result;
use log::info;
use std::fs::OpenOptions;
use std::io::Write;

use crate::artifact::mindmap::{Mindmap, MindmapNode, NodeKind};
use crate::artifact::slides::SlideSpec;
use crate::error::RenderError;
use crate::storage::{Storage, SummaryRecord};

const TITLE_SLIDE_SUBTITLE: &str = "AI-Generated Presentation";
const TAKEAWAYS_TITLE: &str = "Key Takeaways";
const TAKEAWAYS_COUNT: usize = 3;

const CENTRAL_COLOR: &str = "#FF6B6B";
const BRANCH_COLORS: [&str; 4] = ["#4ECDC4", "#45B7D1", "#A5D8D1", "#7FB3D5"];
const SUB_BRANCH_COLORS: [&str; 3] = ["#FFE66D", "#FFD166", "#F7C1BB"];

fn bullet_list(bullets: &[String]) -> String {
    bullets.iter().map(|bullet| format!("- {bullet}\n")).collect()
}

fn slide_page(slide: &SlideSpec) -> String {
    if slide.is_title_slide {
        let bullets = if slide.bullets.is_empty() {
            String::new()
        } else {
            format!("\n{}", bullet_list(&slide.bullets))
        };
        format!("# {}\n\n{TITLE_SLIDE_SUBTITLE}\n{bullets}", slide.title)
    } else {
        format!(
            "# {}\n\n{}\n_Theme: {}_\n",
            slide.title,
            bullet_list(&slide.bullets),
            slide.theme
        )
    }
}

/// Renders slides as Markdown separated by `---`, closed by a key takeaways
/// slide built from the first bullet of the leading content slides.
///
/// # Errors
///
/// Returns [`RenderError::EmptyDeck`] when there is nothing to render.
pub fn compose_deck(slides: &[SlideSpec]) -> Result<String, RenderError> {
    if slides.is_empty() {
        return Err(RenderError::EmptyDeck);
    }

    let mut pages: Vec<String> = slides.iter().map(slide_page).collect();

    let takeaways: Vec<String> = slides
        .iter()
        .filter(|slide| !slide.is_title_slide)
        .filter_map(|slide| slide.bullets.first())
        .take(TAKEAWAYS_COUNT)
        .enumerate()
        .map(|(i, takeaway)| format!("{}. {takeaway}\n", i + 1))
        .collect();
    if !takeaways.is_empty() {
        pages.push(format!("# {TAKEAWAYS_TITLE}\n\n{}", takeaways.concat()));
    }

    Ok(pages.join("\n---\n\n"))
}

fn dot_escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

fn palette(colors: &[&'static str], index: usize) -> &'static str {
    colors
        .get(index % colors.len().max(1))
        .copied()
        .unwrap_or(CENTRAL_COLOR)
}

fn dot_node(node: &MindmapNode, index: usize) -> String {
    let style = match node.kind {
        NodeKind::Central => format!(
            r#"shape=circle, style=filled, fillcolor="{CENTRAL_COLOR}", fontcolor=white, fontsize=24, width=1, height=1, fixedsize=true"#
        ),
        NodeKind::Branch => format!(
            r#"shape=ellipse, style=filled, fillcolor="{}", fontcolor=white, fontsize=18"#,
            palette(&BRANCH_COLORS, index)
        ),
        NodeKind::SubBranch => format!(
            r#"shape=box, style="rounded,filled", fillcolor="{}", fontsize=14, margin="0.1,0.05""#,
            palette(&SUB_BRANCH_COLORS, index)
        ),
    };
    let (x, y) = node.position;
    format!(
        "  \"{}\" [{style}, pos=\"{x:.3},{y:.3}!\"];\n",
        dot_escape(&node.label)
    )
}

/// Renders the mindmap as a Graphviz `neato` graph with pinned positions.
///
/// # Errors
///
/// Returns [`RenderError::EmptyMindmap`] when there is no central node.
pub fn compose_mindmap_dot(map: &Mindmap) -> Result<String, RenderError> {
    let central = map.central.as_ref().ok_or(RenderError::EmptyMindmap)?;

    let mut out = String::from(
        "digraph mindmap {\n  graph [layout=neato, overlap=false, splines=true, bgcolor=transparent, center=true];\n",
    );
    out.push_str(&dot_node(central, 0));
    for (i, node) in map.nodes.iter().enumerate() {
        out.push_str(&dot_node(node, i + 1));
    }
    for edge in &map.edges {
        let (width, color) = if edge.from == central.label {
            ("2", "#555555")
        } else {
            ("1.5", "#777777")
        };
        out.push_str(&format!(
            "  \"{}\" -> \"{}\" [penwidth={width}, color=\"{color}\"];\n",
            dot_escape(&edge.from),
            dot_escape(&edge.to)
        ));
    }
    out.push_str("}\n");

    Ok(out)
}

/// Renders history entries as a Markdown digest, one section per summary.
pub fn compose_history(records: &[SummaryRecord]) -> String {
    records
        .iter()
        .map(|record| {
            format!(
                "## [{}] {} ({})\n{}\n\n",
                record.source_type.to_uppercase(),
                record.source_value,
                record.created_at.format("%Y-%m-%d %H:%M"),
                record.summary,
            )
        })
        .collect()
}

/// Writes `content` to `output_path`, replacing any previous file.
///
/// # Errors
///
/// Returns an error if the file can't be written.
pub fn write_output(output_path: &str, content: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(output_path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Composes a user's whole summary history into a Markdown file.
///
/// # Arguments
///
/// * `storage` - Database holding the history
/// * `username` - Owner of the history
/// * `output_path` - Path to the output file where the composed content will be written
///
/// # Errors
///
/// Returns an error if:
/// * Database operations fail
/// * File operations fail
pub fn compose(storage: &Storage, username: &str, output_path: &str) -> Result<usize> {
    info!("Composing {username}'s history to {output_path}...");

    let records = storage.list_summaries(username)?;
    write_output(output_path, &compose_history(&records))?;

    info!("Composed {} summaries to {output_path}", records.len());
    Ok(records.len())
}
