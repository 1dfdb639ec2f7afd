//! Output layout: where each generated test file lands and how deep it sits
//! relative to the shared setup module.

use std::path::PathBuf;

use crate::collection::{Collection, CollectionNode, RequestNode};

pub const TEST_EXTENSION: &str = "test.js";

#[derive(Debug)]
pub struct PlannedTest<'a> {
    pub request: &'a RequestNode,
    /// `"<parent group> - <request name>"` once nested, else the bare name.
    pub suite_name: String,
    /// Relative to the output root.
    pub output_path: PathBuf,
    /// Path segments between the file's directory and the output root;
    /// 0 at the root.
    pub import_depth: usize,
}

#[derive(Debug, Default)]
pub struct Plan<'a> {
    pub tests: Vec<PlannedTest<'a>>,
    /// Directories to create before any file write, walk order, parents
    /// before children. Empty when flattening.
    pub dirs: Vec<PathBuf>,
    /// Non-empty groups visited, whether flattened or not.
    pub folders: usize,
    pub warnings: Vec<String>,
}

/// The relative reference from a file `depth` segments down back to the setup
/// module. Depth 0 is spelled `./setup` so the generated `require` resolves
/// without a module-resolution fallback.
pub fn setup_reference(depth: usize) -> String {
    if depth == 0 {
        "./setup".to_string()
    } else {
        format!("{}setup", "../".repeat(depth))
    }
}

/// Case-normalized, filesystem-safe segment: non-alphanumeric runs collapse
/// to a single hyphen, leading/trailing hyphens trimmed.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    if out.is_empty() { "unnamed".to_string() } else { out }
}

/// Pre-order walk over the validated tree. Groups with zero children are
/// skipped outright: no directory, no count. Sibling slug collisions are
/// tolerated (last write wins on disk) but reported as a warning.
pub fn plan(collection: &Collection, flatten: bool) -> Plan<'_> {
    let mut plan = Plan::default();
    let mut segments: Vec<String> = Vec::new();
    walk(&collection.children, None, flatten, &mut segments, &mut plan);
    plan
}

fn walk<'a>(
    nodes: &'a [CollectionNode],
    parent: Option<&str>,
    flatten: bool,
    segments: &mut Vec<String>,
    plan: &mut Plan<'a>,
) {
    for node in nodes {
        match node {
            CollectionNode::Group { name, children } => {
                if children.is_empty() {
                    continue;
                }
                plan.folders += 1;
                if flatten {
                    walk(children, Some(name.as_str()), flatten, segments, plan);
                } else {
                    segments.push(slugify(name));
                    plan.dirs.push(segments.iter().collect());
                    walk(children, Some(name.as_str()), flatten, segments, plan);
                    segments.pop();
                }
            }
            CollectionNode::Request(request) => {
                let mut output_path: PathBuf = segments.iter().collect();
                output_path.push(format!("{}.{TEST_EXTENSION}", slugify(&request.name)));
                if plan.tests.iter().any(|t| t.output_path == output_path) {
                    plan.warnings.push(format!(
                        "two requests generate {}; the later one overwrites the earlier",
                        output_path.display()
                    ));
                }
                let suite_name = match parent {
                    Some(parent) => format!("{parent} - {}", request.name),
                    None => request.name.clone(),
                };
                plan.tests.push(PlannedTest {
                    request,
                    suite_name,
                    output_path,
                    import_depth: segments.len(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::RequestNode;

    fn request(name: &str) -> CollectionNode {
        CollectionNode::Request(RequestNode {
            name: name.to_string(),
            method: None,
            url: String::new(),
            body: None,
            headers: Vec::new(),
            script: None,
        })
    }

    fn group(name: &str, children: Vec<CollectionNode>) -> CollectionNode {
        CollectionNode::Group { name: name.to_string(), children }
    }

    fn collection(children: Vec<CollectionNode>) -> Collection {
        Collection { name: Some("t".to_string()), children }
    }

    #[test]
    fn slugify_collapses_non_alphanumeric_runs() {
        assert_eq!(slugify("Get All"), "get-all");
        assert_eq!(slugify("  Users // v2 !"), "users-v2");
        assert_eq!(slugify("ALREADY-fine"), "already-fine");
        assert_eq!(slugify("???"), "unnamed");
    }

    #[test]
    fn setup_reference_repeats_parent_hops() {
        assert_eq!(setup_reference(0), "./setup");
        assert_eq!(setup_reference(1), "../setup");
        assert_eq!(setup_reference(3), "../../../setup");
    }

    #[test]
    fn import_depth_counts_active_segments() {
        let tree = collection(vec![group("A", vec![group("B", vec![request("r")])])]);

        let nested = plan(&tree, false);
        assert_eq!(nested.tests[0].import_depth, 2);
        assert_eq!(nested.tests[0].output_path, PathBuf::from("a/b/r.test.js"));

        let flat = plan(&tree, true);
        assert_eq!(flat.tests[0].import_depth, 0);
        assert_eq!(flat.tests[0].output_path, PathBuf::from("r.test.js"));
    }

    #[test]
    fn suite_name_uses_the_nearest_group() {
        let tree = collection(vec![
            group("Users", vec![request("Get All")]),
            request("Health"),
        ]);
        let plan = plan(&tree, false);
        assert_eq!(plan.tests[0].suite_name, "Users - Get All");
        assert_eq!(plan.tests[1].suite_name, "Health");
    }

    #[test]
    fn empty_groups_are_invisible() {
        let tree = collection(vec![group("Empty", vec![]), request("r")]);
        let plan = plan(&tree, false);
        assert_eq!(plan.folders, 0);
        assert!(plan.dirs.is_empty());
        assert_eq!(plan.tests.len(), 1);
    }

    #[test]
    fn group_of_empty_groups_still_counts_once_visited() {
        let tree = collection(vec![group("Outer", vec![group("Inner", vec![])])]);
        let plan = plan(&tree, false);
        assert_eq!(plan.folders, 1);
        assert_eq!(plan.dirs, vec![PathBuf::from("outer")]);
        assert!(plan.tests.is_empty());
    }

    #[test]
    fn sibling_slug_collisions_warn_but_do_not_fail() {
        let tree = collection(vec![group("G", vec![request("Get!"), request("get")])]);
        let plan = plan(&tree, false);
        assert_eq!(plan.tests.len(), 2);
        assert_eq!(plan.tests[0].output_path, plan.tests[1].output_path);
        assert_eq!(plan.warnings.len(), 1);
    }

    #[test]
    fn dirs_come_parents_first() {
        let tree = collection(vec![group("A", vec![group("B", vec![request("r")])])]);
        let plan = plan(&tree, false);
        assert_eq!(plan.dirs, vec![PathBuf::from("a"), PathBuf::from("a/b")]);
    }
}
