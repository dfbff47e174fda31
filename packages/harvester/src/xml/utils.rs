//! XML utility functions for navigating and extracting data from DOM trees.

use roxmltree::Node;

/// Get the tag name without namespace prefix.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use heartland_harvester::xml::get_tag_name;
///
/// let xml = r#"<record xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>t</dc:title></record>"#;
/// let doc = Document::parse(xml).unwrap();
/// let title = doc.root_element().first_element_child().unwrap();
/// assert_eq!(get_tag_name(title), "title");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Get the lowercased tag name without namespace prefix.
///
/// Field paths are built from these names, so `titleInfo` and `titleinfo`
/// land on the same key.
pub fn local_name(node: Node<'_, '_>) -> String {
    get_tag_name(node).to_lowercase()
}

/// Find the first child element with the given tag name.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use heartland_harvester::xml::find_child;
///
/// let xml = r#"<record><header/><metadata/></record>"#;
/// let doc = Document::parse(xml).unwrap();
/// let root = doc.root_element();
///
/// assert!(find_child(root, "header").is_some());
/// assert!(find_child(root, "about").is_none());
/// ```
pub fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && get_tag_name(*child) == tag)
}

/// Find all child elements with the given tag name.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use heartland_harvester::xml::find_children;
///
/// let xml = r#"<header><setSpec>a</setSpec><setSpec>b</setSpec><identifier/></header>"#;
/// let doc = Document::parse(xml).unwrap();
///
/// let sets: Vec<_> = find_children(doc.root_element(), "setSpec").collect();
/// assert_eq!(sets.len(), 2);
/// ```
pub fn find_children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && get_tag_name(*child) == tag)
}

/// Get the direct text content of a node, trimmed.
pub fn get_text(node: Node<'_, '_>) -> String {
    node.text()
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Get all text beneath a node (descendant text nodes concatenated), trimmed.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use heartland_harvester::xml::deep_text;
///
/// let xml = "<subject> <topic>Cats</topic> and <topic>Dogs</topic> </subject>";
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(deep_text(doc.root_element()), "Cats and Dogs");
/// ```
pub fn deep_text(node: Node<'_, '_>) -> String {
    let text: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    text.trim().to_string()
}

/// Check if a node has a specific tag name.
pub fn has_tag(node: Node<'_, '_>, tag: &str) -> bool {
    node.is_element() && get_tag_name(node) == tag
}

/// Get all element children of a node.
///
/// Excludes text nodes, comments and processing instructions.
pub fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}
