//! GraphViz UML rendering
//!
//! Consumes a [`ResolvedGraph`] and never feeds anything back into
//! resolution. Two layouts:
//!
//! - **plain**: `shape=record` nodes, one per type
//! - **clustered**: HTML-table nodes with one port per field, grouped into a
//!   `subgraph cluster_*` per source; edges leave from the field that
//!   creates them

use std::collections::BTreeMap;

use tracing::debug;

use crate::annotations::TypeAnnotations;
use crate::config::{DiagramStyle, RenderConfig};
use crate::graph::{local_part, ResolvedGraph};

/// GraphViz node identifier for a type name: `_` doubles, `.` becomes `_`
pub fn type_to_node(type_name: &str) -> String {
    type_name.replace('_', "__").replace('.', "_")
}

/// Name shown in the diagram
pub fn type_to_display(type_name: &str) -> &str {
    local_part(type_name)
}

/// Escape text for GraphViz labels. Covers the characters that occur in
/// type displays and comments, not general purpose.
pub fn dot_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Greedy word wrap of plain text at `width` characters. Each line is
/// escaped, then joined with `<BR/>`; long words are never split.
pub fn wrap_comment(comment: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    for word in comment.split_whitespace() {
        let word_width = word.chars().count();
        if current_width > 0 && current_width + 1 + word_width > width {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }
        if current_width > 0 {
            current.push(' ');
            current_width += 1;
        }
        current.push_str(word);
        current_width += word_width;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
        .iter()
        .map(|line| dot_escape(line))
        .collect::<Vec<_>>()
        .join("<BR/>")
}

/// Renders resolved graphs as DOT text
#[derive(Debug, Clone, Default)]
pub struct DotRenderer {
    config: RenderConfig,
    annotations: TypeAnnotations,
    cluster_urls: BTreeMap<String, String>,
}

impl DotRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Header comments per local type name (clustered layout only)
    pub fn with_annotations(mut self, annotations: TypeAnnotations) -> Self {
        self.annotations = annotations;
        self
    }

    /// Cluster label -> URL
    pub fn with_cluster_urls(mut self, urls: BTreeMap<String, String>) -> Self {
        self.cluster_urls = urls;
        self
    }

    /// Style actually used for `graph`
    pub fn style_for(&self, graph: &ResolvedGraph) -> DiagramStyle {
        match self.config.style {
            DiagramStyle::Auto if graph.groupings.is_empty() => DiagramStyle::Plain,
            DiagramStyle::Auto => DiagramStyle::Clustered,
            style => style,
        }
    }

    pub fn render(&self, graph: &ResolvedGraph) -> String {
        match self.style_for(graph) {
            DiagramStyle::Clustered => self.render_clustered(graph),
            _ => self.render_plain(graph),
        }
    }

    fn render_plain(&self, graph: &ResolvedGraph) -> String {
        let mut output = String::new();

        output.push_str("digraph UML {\n");
        output.push_str("node [\n");
        output.push_str("\tshape=record\n");
        output.push_str("]\n");

        for (type_name, fields) in graph.types.iter() {
            output.push_str(&format!("{} [\n", type_to_node(type_name)));
            output.push_str(&format!("\tlabel=\"{{{}", type_to_display(type_name)));
            for field in fields {
                output.push_str(&format!("|{} : {}", field.name, dot_escape(&field.type_display)));
            }
            output.push_str("}\"\n");
            output.push_str("]\n");
        }

        output.push_str("edge [\n");
        output.push_str("\tdir=both\n");
        output.push_str("\tarrowtail=odiamond\n");
        output.push_str("\tarrowhead=none\n");
        output.push_str("]\n");

        for edge in graph.containments.iter().filter(|e| self.is_drawable(graph, &e.contained)) {
            output.push_str(&format!(
                "{} -> {}\n",
                type_to_node(&edge.owner),
                type_to_node(&edge.contained)
            ));
        }

        output.push_str("edge [\n");
        output.push_str("\tdir=both\n");
        output.push_str("\tarrowtail=none\n");
        output.push_str("\tarrowhead=vee\n");
        output.push_str("\tstyle=dashed\n");
        output.push_str("]\n");

        for edge in &graph.references {
            output.push_str(&format!(
                "{} -> {}\n",
                type_to_node(&edge.referencer),
                type_to_node(&edge.referencee)
            ));
        }

        output.push_str("}\n");
        output
    }

    fn render_clustered(&self, graph: &ResolvedGraph) -> String {
        let mut output = String::new();

        output.push_str("digraph UML {\n");
        output.push_str("node [\n");
        output.push_str("\tshape=plaintext\n");
        output.push_str("]\n\n");

        for (type_name, fields) in graph.types.iter() {
            let display = type_to_display(type_name);

            output.push_str(&format!("{} [label=<\n", type_to_node(type_name)));
            output.push_str("<TABLE BORDER='0' CELLBORDER='1' CELLSPACING='0' CELLPADDING='4' bgcolor='#002060' color='#002060'>\n");
            output.push_str("\t<TR>\n");
            output.push_str(&format!(
                "\t\t<TD COLSPAN='2' bgcolor='#79A6FF' border='3'><FONT POINT-SIZE='20' color='white'>{}</FONT>",
                display
            ));
            if let Some(comment) = self.annotations.get(display) {
                output.push_str(&format!(
                    "<BR/><FONT POINT-SIZE='15' color='white'>{}</FONT>",
                    wrap_comment(comment, self.config.comment_width)
                ));
            }
            output.push_str("</TD>\n");
            output.push_str("\t</TR>\n");

            // Two columns: [a, b, c, d, e] lays out as a|d, b|e, c
            let rows = fields.len().div_ceil(2);
            for i in 0..rows {
                output.push_str("\t<TR>\n");
                for field in [fields.get(i), fields.get(rows + i)].into_iter().flatten() {
                    output.push_str(&format!(
                        "\t\t<TD align='left' port='{}'><FONT color='white'>- {}</FONT></TD>\n",
                        field.name, field.name
                    ));
                }
                output.push_str("\t</TR>\n");
            }

            output.push_str("</TABLE>>];\n\n");
        }

        for grouping in &graph.groupings {
            output.push_str(&format!("subgraph cluster_{} {{\n", type_to_node(&grouping.label)));
            output.push_str("\tstyle=\"rounded, filled\";\n");
            output.push_str("\tcolor=lightgrey;\n");
            output.push_str("\tnode [style=filled,color=white];\n");
            output.push_str(&format!("\tlabel = \"{}\";\n", grouping.label));
            if let Some(url) = self.cluster_urls.get(&grouping.label) {
                output.push_str(&format!("\tURL=\"{}\";\n", url));
            }
            for type_name in &grouping.types {
                output.push_str(&format!("\t{};\n", type_to_node(type_name)));
            }
            output.push_str("}\n\n");
        }

        output.push_str("\n// Define containment edges\n");
        output.push_str("edge [\n");
        output.push_str("\tdir=both\n");
        output.push_str("\tarrowtail=odiamond\n");
        output.push_str("\tarrowhead=none\n");
        output.push_str("\tcolor=\"#C55A11\"\n");
        output.push_str("\tpenwidth=2\n");
        output.push_str("]\n\n");

        for edge in graph.containments.iter().filter(|e| self.is_drawable(graph, &e.contained)) {
            output.push_str(&format!(
                "{}:{}:w -> {}\n",
                type_to_node(&edge.owner),
                edge.via_field,
                type_to_node(&edge.contained)
            ));
        }

        output.push_str("\n// Define references edges\n");
        output.push_str("\nedge [\n");
        output.push_str("\tdir=both\n");
        output.push_str("\tarrowtail=none\n");
        output.push_str("\tarrowhead=vee\n");
        output.push_str("\tstyle=dashed\n");
        output.push_str("\tcolor=\"darkgreen\"\n");
        output.push_str("\tpenwidth=2\n");
        output.push_str("]\n\n");

        for edge in &graph.references {
            output.push_str(&format!(
                "{}:{}:w -> {}:{}:w\n",
                type_to_node(&edge.referencer),
                edge.via_field,
                type_to_node(&edge.referencee),
                id_port(graph, &edge.referencee)
            ));
        }

        output.push_str("}\n");
        output
    }

    fn is_drawable(&self, graph: &ResolvedGraph, contained: &str) -> bool {
        let known = graph.types.contains(contained);
        if !known {
            debug!(%contained, "skipping containment of unregistered type");
        }
        known
    }
}

/// Port of the target's identity field, matching its declared casing
fn id_port<'g>(graph: &'g ResolvedGraph, type_name: &str) -> &'g str {
    graph
        .types
        .get(type_name)
        .and_then(|fields| fields.iter().find(|f| f.name.eq_ignore_ascii_case("id")))
        .map(|f| f.name.as_str())
        .unwrap_or("id")
}
