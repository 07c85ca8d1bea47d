use anyhow::{Context, Result};
use std::{env, path::PathBuf, process};
use wikidom_engine::editing::Range;
use wikidom_engine::{io, DocumentModel, NodeId};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let path = match args.get(1) {
        Some(arg) => PathBuf::from(arg),
        None => {
            eprintln!("Usage: {} <document.json>", args[0]);
            process::exit(2);
        }
    };

    let object = io::read_document(&path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let doc = DocumentModel::from_object(&object)
        .with_context(|| format!("failed to build model from {}", path.display()))?;

    println!("{}", path.display());
    println!(
        "  {} slots, {} nodes, version {}",
        doc.len(),
        doc.node_count(),
        doc.version()
    );
    print_outline(&doc, doc.root(), 0)?;

    doc.verify_tree().context("tree audit failed")?;
    println!("  tree audit: ok");
    Ok(())
}

fn print_outline(doc: &DocumentModel, id: NodeId, depth: usize) -> Result<()> {
    let indent = "  ".repeat(depth + 1);
    let kind = doc.node_kind(id);
    if kind.is_branch() {
        println!(
            "{indent}{kind} ({} children, content length {})",
            doc.node_children(id).len(),
            doc.content_length(id)
        );
        for &child in doc.node_children(id) {
            print_outline(doc, child, depth + 1)?;
        }
    } else {
        let span = doc.range_from_node(id)?;
        let text = doc.get_plain_text(Range::new(span.start() + 1, span.end() - 1))?;
        let preview: String = text.chars().take(40).collect();
        println!("{indent}{kind} ({} chars) {preview:?}", text.chars().count());
    }
    Ok(())
}
