// tree.rs - Newick and JSON writers

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use super::create_output;
use crate::core::Tree;
use crate::error::{PhyloError, Result};

/// Write the tree as a single Newick line
pub fn write_newick(file_path: &Path, tree: &Tree) -> Result<()> {
    let mut writer = create_output(file_path)?;
    writeln!(writer, "{}", tree.to_newick())?;
    writer.flush()?;
    info!(path = %file_path.display(), leaves = tree.leaf_count(), "newick tree written");
    Ok(())
}

/// Pretty-printed JSON of any serializable result
pub fn write_json<T: Serialize + ?Sized>(file_path: &Path, value: &T) -> Result<()> {
    let mut writer = create_output(file_path)?;
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| PhyloError::Config(format!("Failed to serialize JSON: {}", e)))?;
    writeln!(writer)?;
    writer.flush()?;
    info!(path = %file_path.display(), "JSON written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{upgma, DistanceMatrix};

    fn tree() -> Tree {
        let dm = DistanceMatrix::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![0.0, 0.6], vec![0.6, 0.0]],
        )
        .unwrap();
        upgma(&dm).unwrap()
    }

    #[test]
    fn test_newick_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.nwk");
        write_newick(&path, &tree()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "(a:0.3,b:0.3);\n");
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/tree.json");
        let original = tree();
        write_json(&path, &original).unwrap();

        let parsed: Tree = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, original);
    }
}
