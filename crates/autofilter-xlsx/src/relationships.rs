use roxmltree::Document;

use crate::error::ExtractError;

pub(crate) const REL_TYPE_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
/// Strict OOXML uses a different relationship namespace.
pub(crate) const REL_TYPE_OFFICE_DOCUMENT_STRICT: &str =
    "http://purl.oclc.org/ooxml/officeDocument/relationships/officeDocument";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub type_: String,
    pub target: String,
    pub external: bool,
}

pub fn parse_relationships(xml: &str, part_name: &str) -> Result<Vec<Relationship>, ExtractError> {
    let doc = Document::parse(xml).map_err(|e| ExtractError::xml(part_name, e))?;

    let mut rels = Vec::new();
    for node in doc.descendants().filter(|n| n.is_element()) {
        if node.tag_name().name() != "Relationship" {
            continue;
        }

        let id = match node.attribute("Id") {
            Some(id) => id.to_string(),
            None => continue,
        };
        let type_ = node.attribute("Type").unwrap_or_default().to_string();
        let target = node.attribute("Target").unwrap_or_default().to_string();
        let external = node
            .attribute("TargetMode")
            .is_some_and(|mode| mode.trim().eq_ignore_ascii_case("External"));
        rels.push(Relationship {
            id,
            type_,
            target,
            external,
        });
    }

    Ok(rels)
}
