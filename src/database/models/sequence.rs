//! Sequence session document model.
//!
//! An ephemeral per-user session collecting files to be re-sent in episode
//! order. Created by /startsequence, deleted on /endsequence or
//! /cancelsequence.

use serde::{Deserialize, Serialize};

use super::user::MediaKind;

/// One file collected during a sequence session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SequencedFile {
    pub file_id: String,
    pub file_name: String,
    /// Episode number extracted from the file name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    pub kind: MediaKind,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SequenceSession {
    /// Owning user (primary key).
    pub user_id: i64,
    /// Unix timestamp of /startsequence.
    pub started_at: i64,
    #[serde(default)]
    pub files: Vec<SequencedFile>,
}

impl SequenceSession {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            started_at: chrono::Utc::now().timestamp(),
            files: Vec::new(),
        }
    }

    /// Files in sending order: by episode number, unknown episodes last in
    /// arrival order. The sort is stable so arrival order breaks ties.
    pub fn ordered_files(&self) -> Vec<&SequencedFile> {
        let mut files: Vec<&SequencedFile> = self.files.iter().collect();
        files.sort_by_key(|f| f.episode.map_or(u64::MAX, |e| e as u64));
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, episode: Option<u32>) -> SequencedFile {
        SequencedFile {
            file_id: format!("id-{}", name),
            file_name: name.to_string(),
            episode,
            kind: MediaKind::Video,
        }
    }

    #[test]
    fn test_ordered_by_episode() {
        let mut session = SequenceSession::new(1);
        session.files = vec![file("c", Some(3)), file("a", Some(1)), file("b", Some(2))];

        let order: Vec<_> = session.ordered_files().iter().map(|f| f.episode).collect();
        assert_eq!(order, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_unknown_episodes_keep_arrival_order_at_end() {
        let mut session = SequenceSession::new(1);
        session.files = vec![
            file("x", None),
            file("b", Some(2)),
            file("y", None),
            file("a", Some(1)),
        ];

        let names: Vec<_> = session
            .ordered_files()
            .iter()
            .map(|f| f.file_name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "x", "y"]);
    }
}
