//! Logical stream paths.
//!
//! A path such as `"/robot/arm/joints"` names the group chain `robot/arm`
//! and the dataset `joints`. Segments are separated by `/` or whitespace and
//! empty segments are ignored, so `"robot//arm joints"` is the same path.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::storage::Storage;

/// Split `path` into its group segments and leaf name.
pub fn split(path: &str) -> Result<(Vec<&str>, &str)> {
    let mut segments: Vec<&str> = path
        .split(|c: char| c == '/' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();
    let leaf = segments
        .pop()
        .ok_or_else(|| Error::InvalidPath(path.to_string()))?;
    Ok((segments, leaf))
}

/// Walk `path` from the root, creating any missing groups.
///
/// Returns the parent group of the leaf and the leaf name. The leaf itself is
/// not touched. Not safe against another writer creating the same groups
/// concurrently.
pub fn resolve<'p, S: Storage>(storage: &mut S, path: &'p str) -> Result<(S::Group, &'p str)> {
    let (groups, leaf) = split(path)?;
    let mut current = storage.root();
    for name in groups {
        current = match storage.open_group(current, name)? {
            Some(group) => {
                info!(group = name, path, "reusing existing group");
                group
            }
            None => {
                debug!(group = name, path, "creating group");
                storage.create_group(current, name)?
            }
        };
    }
    Ok((current, leaf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, Mutation};

    #[test]
    fn split_segments() {
        assert_eq!(split("/a/b/c").unwrap(), (vec!["a", "b"], "c"));
        assert_eq!(split("x").unwrap(), (vec![], "x"));
        assert_eq!(split(" /a//b  c/ ").unwrap(), (vec!["a", "b"], "c"));
        assert!(matches!(split("///"), Err(Error::InvalidPath(_))));
        assert!(matches!(split(""), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn resolve_is_idempotent() {
        let mut mem = MemoryStorage::new();
        let (g1, leaf1) = resolve(&mut mem, "/g/h/a").unwrap();
        let (g2, leaf2) = resolve(&mut mem, "/g/h/b").unwrap();
        assert_eq!(g1, g2);
        assert_eq!((leaf1, leaf2), ("a", "b"));
        assert_eq!(
            mem.mutations(),
            &[
                Mutation::CreateGroup { path: "/g".into() },
                Mutation::CreateGroup { path: "/g/h".into() },
            ]
        );
    }

    #[test]
    fn leaf_only_path_uses_root() {
        let mut mem = MemoryStorage::new();
        let (group, leaf) = resolve(&mut mem, "speed").unwrap();
        assert_eq!(group, mem.root());
        assert_eq!(leaf, "speed");
        assert!(mem.mutations().is_empty());
    }

    #[test]
    fn dataset_in_the_way_is_an_error() {
        use h5stream_format::{ElementType, FormatError};

        let mut mem = MemoryStorage::new();
        let root = mem.root();
        mem.create_dataset(root, "d", ElementType::F64, &[1]).unwrap();
        assert!(matches!(
            resolve(&mut mem, "/d/x"),
            Err(Error::Storage(FormatError::NotAGroup(_)))
        ));
    }
}
