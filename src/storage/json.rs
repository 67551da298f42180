//! JSON file storage backend
//!
//! Layout under the data directory:
//!
//! ```text
//! nodes.json
//! embeddings.json              (compact)
//! networks/summary.json
//! networks/conversation_contexts.json
//! networks/<view>/graph.json
//! networks/<view>/stats.json
//! ```

use super::traits::{
    check_nodes, check_view_name, GraphRecord, NetworkStore, OpenStore, StorageError, StorageResult,
};
use crate::evaluate::ContextTable;
use crate::graph::Node;
use crate::topology::TopologyStats;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

const NODES_FILE: &str = "nodes.json";
const EMBEDDINGS_FILE: &str = "embeddings.json";
const NETWORKS_DIR: &str = "networks";
const GRAPH_FILE: &str = "graph.json";
const STATS_FILE: &str = "stats.json";
const SUMMARY_FILE: &str = "summary.json";
const CONTEXTS_FILE: &str = "conversation_contexts.json";

/// Directory-backed store writing one JSON document per record.
///
/// Writes go to a temporary file in the target directory which is then
/// renamed over the old file, so readers see either the old or the new
/// record.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn view_dir(&self, view: &str) -> StorageResult<PathBuf> {
        check_view_name(view)?;
        Ok(self.root.join(NETWORKS_DIR).join(view))
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
        match fs::File::open(path) {
            Ok(file) => Ok(Some(serde_json::from_reader(BufReader::new(file))?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, pretty: bool) -> StorageResult<()> {
        let dir = path
            .parent()
            .ok_or_else(|| StorageError::InvalidRecord(format!("no parent directory for {}", path.display())))?;
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            if pretty {
                serde_json::to_writer_pretty(&mut writer, value)?;
            } else {
                serde_json::to_writer(&mut writer, value)?;
            }
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path)?;
        debug!(path = %path.display(), "wrote record");
        Ok(())
    }
}

impl OpenStore for JsonFileStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(root.join(NETWORKS_DIR))?;
        Ok(Self { root })
    }
}

impl NetworkStore for JsonFileStore {
    fn load_nodes(&self) -> StorageResult<Vec<Node>> {
        let nodes: Vec<Node> = Self::read_json(&self.root.join(NODES_FILE))?.unwrap_or_default();
        check_nodes(&nodes)?;
        Ok(nodes)
    }

    fn save_nodes(&self, nodes: &[Node]) -> StorageResult<()> {
        check_nodes(nodes)?;
        Self::write_json(&self.root.join(NODES_FILE), nodes, true)
    }

    fn load_embeddings(&self) -> StorageResult<Vec<Vec<f32>>> {
        Ok(Self::read_json(&self.root.join(EMBEDDINGS_FILE))?.unwrap_or_default())
    }

    fn save_embeddings(&self, embeddings: &[Vec<f32>]) -> StorageResult<()> {
        Self::write_json(&self.root.join(EMBEDDINGS_FILE), embeddings, false)
    }

    fn load_graph(&self, view: &str) -> StorageResult<Option<GraphRecord>> {
        Self::read_json(&self.view_dir(view)?.join(GRAPH_FILE))
    }

    fn save_graph(&self, record: &GraphRecord) -> StorageResult<()> {
        Self::write_json(&self.view_dir(&record.view)?.join(GRAPH_FILE), record, true)
    }

    fn load_stats(&self, view: &str) -> StorageResult<Option<TopologyStats>> {
        Self::read_json(&self.view_dir(view)?.join(STATS_FILE))
    }

    fn save_stats(&self, view: &str, stats: &TopologyStats) -> StorageResult<()> {
        Self::write_json(&self.view_dir(view)?.join(STATS_FILE), stats, true)
    }

    fn load_summary(&self) -> StorageResult<Vec<TopologyStats>> {
        Ok(Self::read_json(&self.root.join(NETWORKS_DIR).join(SUMMARY_FILE))?.unwrap_or_default())
    }

    fn save_summary(&self, summary: &[TopologyStats]) -> StorageResult<()> {
        Self::write_json(&self.root.join(NETWORKS_DIR).join(SUMMARY_FILE), summary, true)
    }

    fn list_views(&self) -> StorageResult<Vec<String>> {
        let dir = self.root.join(NETWORKS_DIR);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut views = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.path().join(GRAPH_FILE).is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    views.push(name.to_string());
                }
            }
        }
        views.sort();
        Ok(views)
    }

    fn load_contexts(&self) -> StorageResult<ContextTable> {
        Ok(Self::read_json(&self.root.join(NETWORKS_DIR).join(CONTEXTS_FILE))?.unwrap_or_default())
    }

    fn save_contexts(&self, contexts: &ContextTable) -> StorageResult<()> {
        Self::write_json(&self.root.join(NETWORKS_DIR).join(CONTEXTS_FILE), contexts, true)
    }
}
