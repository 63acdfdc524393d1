//! Ordered depth-first traversal of resolved value trees.

use std::iter::FusedIterator;

use cliapi_types::FieldPath;
use serde_json::Value;

/// Depth-first iterator over the scalar leaves of a value tree.
///
/// Mappings are visited in insertion order and sequences in index order.
/// Empty mappings and sequences contribute no leaves. The iterator is
/// consumed as it goes; scan again to start over.
#[derive(Debug, Clone)]
pub struct Scan<'a> {
    stack: Vec<(FieldPath, &'a Value)>,
}

impl<'a> Scan<'a> {
    /// Scans several named trees as if they were members of one mapping.
    pub fn over_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a Value)>,
    {
        let mut stack: Vec<_> = entries
            .into_iter()
            .map(|(name, value)| (FieldPath::new().key(name), value))
            .collect();
        stack.reverse();
        Self { stack }
    }
}

impl<'a> Iterator for Scan<'a> {
    type Item = (FieldPath, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((path, value)) = self.stack.pop() {
            match value {
                Value::Object(map) => {
                    for (key, child) in map.iter().rev() {
                        self.stack.push((path.child_key(key), child));
                    }
                }
                Value::Array(items) => {
                    for (index, child) in items.iter().enumerate().rev() {
                        self.stack.push((path.child_index(index), child));
                    }
                }
                leaf => return Some((path, leaf)),
            }
        }
        None
    }
}

impl FusedIterator for Scan<'_> {}

/// Returns the first leaf, in scan order, whose final key equals `name`.
///
/// Index steps never match, so `[0]` cannot be looked up by suffix.
pub fn find_by_suffix<'a, I>(leaves: I, name: &str) -> Option<&'a Value>
where
    I: IntoIterator<Item = (FieldPath, &'a Value)>,
{
    leaves
        .into_iter()
        .find(|(path, _)| path.leaf_name() == Some(name))
        .map(|(_, value)| value)
}

/// Returns the first leaf, in scan order, whose path ends with every step of `suffix`.
///
/// `compute.name` matches `meta_data.compute.name`; steps are compared whole,
/// so it does not match `meta_data.compute.hostname`.
pub fn find_by_path_suffix<'a, I>(leaves: I, suffix: &FieldPath) -> Option<&'a Value>
where
    I: IntoIterator<Item = (FieldPath, &'a Value)>,
{
    leaves
        .into_iter()
        .find(|(path, _)| path.ends_with(suffix))
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scan_root(root: &Value) -> Scan<'_> {
        Scan {
            stack: vec![(FieldPath::new(), root)],
        }
    }

    fn rendered(scan: Scan<'_>) -> Vec<(String, Value)> {
        scan.map(|(path, value)| (path.to_string(), value.clone())).collect()
    }

    #[test]
    fn visits_leaves_depth_first_in_insertion_order() {
        let tree = json!({
            "zeta": {"name": "first", "tags": ["a", "b"]},
            "alpha": 1,
            "empty": {},
            "none": []
        });
        assert_eq!(
            rendered(scan_root(&tree)),
            vec![
                ("zeta.name".to_string(), json!("first")),
                ("zeta.tags[0]".to_string(), json!("a")),
                ("zeta.tags[1]".to_string(), json!("b")),
                ("alpha".to_string(), json!(1)),
            ]
        );
    }

    #[test]
    fn scanning_twice_gives_the_same_sequence() {
        let tree = json!({"a": [{"b": 1}, {"b": 2}], "c": null});
        assert_eq!(rendered(scan_root(&tree)), rendered(scan_root(&tree)));
    }

    #[test]
    fn scalar_root_is_its_own_leaf() {
        let tree = json!("vm1");
        let leaves: Vec<_> = scan_root(&tree).collect();
        assert_eq!(leaves.len(), 1);
        assert!(leaves[0].0.is_empty());
    }

    #[test]
    fn entries_are_prefixed_with_their_names() {
        let first = json!({"compute": {"name": "vm1"}});
        let second = json!("2017-08-01");
        let scan = Scan::over_entries([("meta_data", &first), ("some_stuff", &second)]);
        assert_eq!(
            rendered(scan),
            vec![
                ("meta_data.compute.name".to_string(), json!("vm1")),
                ("some_stuff".to_string(), json!("2017-08-01")),
            ]
        );
    }

    #[test]
    fn suffix_lookup_prefers_the_earlier_leaf() {
        let tree = json!({"network": {"ip": "10.0.0.4"}, "public": {"ip": "52.1.1.1"}});
        assert_eq!(find_by_suffix(scan_root(&tree), "ip"), Some(&json!("10.0.0.4")));
        assert_eq!(find_by_suffix(scan_root(&tree), "mac"), None);
    }

    #[test]
    fn suffix_lookup_ignores_indices() {
        let tree = json!({"list": ["x"]});
        assert_eq!(find_by_suffix(scan_root(&tree), "0"), None);
        assert_eq!(find_by_suffix(scan_root(&tree), "list"), None);
    }

    #[test]
    fn path_suffix_lookup_matches_whole_trailing_steps() {
        let tree = json!({
            "compute": {"hostname": "h1", "name": "vm1"},
            "network": {"interface": [{"macAddress": "000D3A"}]}
        });
        let suffix = FieldPath::new().key("compute").key("name");
        assert_eq!(find_by_path_suffix(scan_root(&tree), &suffix), Some(&json!("vm1")));
        let suffix = FieldPath::new().key("interface").index(0).key("macAddress");
        assert_eq!(find_by_path_suffix(scan_root(&tree), &suffix), Some(&json!("000D3A")));
        let suffix = FieldPath::new().key("interface").index(1).key("macAddress");
        assert_eq!(find_by_path_suffix(scan_root(&tree), &suffix), None);
    }

    #[test]
    fn exhausted_scan_stays_exhausted() {
        let tree = json!({"a": 1});
        let mut scan = scan_root(&tree);
        assert!(scan.next().is_some());
        assert!(scan.next().is_none());
        assert!(scan.next().is_none());
    }
}
