//! OPC part-name helpers.

/// Relationship part for `part` (`xl/workbook.xml` -> `xl/_rels/workbook.xml.rels`).
pub fn rels_for_part(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file_name)) => format!("{dir}/_rels/{file_name}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship `Target` against the part that owns the relationship.
///
/// Absolute targets (`/xl/worksheets/sheet1.xml`) are rooted at the package;
/// relative ones are resolved against the source part's directory. URI
/// fragments are dropped since OPC part names never carry them.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    let target = target.split('#').next().unwrap_or(target);
    if target.is_empty() {
        return normalize_part_name(source_part);
    }
    if let Some(target) = target.strip_prefix('/') {
        return normalize_part_name(target);
    }

    let base_dir = source_part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    normalize_part_name(&format!("{base_dir}/{target}"))
}

/// Normalize a ZIP entry or part name: forward slashes, no leading `/`, and
/// `.`/`..` segments resolved.
pub fn normalize_part_name(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out.join("/")
}
