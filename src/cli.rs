use clap::{Parser, Subcommand};

use crate::tag_tree::{TagNode, ALL_PATH};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API.
    Serve {
        /// Override listen_addr from config.yaml
        #[clap(short, long)]
        addr: Option<String>,
    },
    /// Search entries with a boolean query
    ///
    /// Words match as case-insensitive substrings of title, url,
    /// description and tags. Supports AND, OR, NOT, parentheses and
    /// "quoted phrases"; adjacent words are ANDed.
    Search {
        /// Query words, joined with spaces
        #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,

        /// Restrict to a tag tree path (e.g. dev/go, Untagged)
        #[clap(short, long)]
        path: Option<String>,

        /// Print the count
        #[clap(short = 'c', long, default_value = "false")]
        count: bool,
    },
    /// Print the tag tree with entry counts
    Tree {
        /// Print as JSON
        #[clap(long, default_value = "false")]
        json: bool,
    },
    /// Replace all entries with the contents of an export file.
    Import {
        /// JSON file: an export document or a bare entry array
        file: String,

        /// Auto confirm
        #[clap(short, long, default_value = "false")]
        yes: bool,
    },
    /// Write all entries as a JSON document
    Export {
        /// Output file, stdout when omitted
        #[clap(short, long)]
        output: Option<String>,
    },
}

/// Indented `name (count)` lines, children by count then name.
pub fn render_tree(root: &TagNode) -> String {
    let mut out = String::new();
    render_node(root, 0, &mut out);
    out
}

fn render_node(node: &TagNode, depth: usize, out: &mut String) {
    let label = if node.path == ALL_PATH {
        "All"
    } else {
        node.name.as_str()
    };
    out.push_str(&format!("{}{label} ({})\n", "  ".repeat(depth), node.count()));
    for child in node.sorted_children() {
        render_node(child, depth + 1, out);
    }
}
