// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
use wikidom_engine::editing::data::chars;
use wikidom_engine::{DataItem, NodeKind};

#[allow(dead_code)]
pub fn generate_document_data(paragraphs: usize) -> Vec<DataItem> {
    let mut data = Vec::new();
    for i in 0..paragraphs {
        if i % 10 == 0 {
            data.push(DataItem::open(NodeKind::Heading));
            data.extend(chars("Section heading"));
            data.push(DataItem::close(NodeKind::Heading));
        }
        data.push(DataItem::open(NodeKind::Paragraph));
        data.extend(chars(
            "Paragraph with enough content to make offset arithmetic non-trivial.",
        ));
        data.push(DataItem::close(NodeKind::Paragraph));
    }
    data
}

#[allow(dead_code)]
pub fn generate_list_data(items: usize) -> Vec<DataItem> {
    let mut data = vec![DataItem::open(NodeKind::List)];
    for _ in 0..items {
        data.push(DataItem::open(NodeKind::ListItem));
        data.push(DataItem::open(NodeKind::Paragraph));
        data.extend(chars("List item content"));
        data.push(DataItem::close(NodeKind::Paragraph));
        data.push(DataItem::close(NodeKind::ListItem));
    }
    data.push(DataItem::close(NodeKind::List));
    data
}
