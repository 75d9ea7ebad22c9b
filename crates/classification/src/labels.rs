use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("File {} not found", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read class names")]
    Read(#[from] std::io::Error),
}

/// Class names indexed by class id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassLabels {
    names: Vec<String>,
}

impl ClassLabels {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// One class name per line; `\n` and `\r\n` terminators are stripped.
    pub fn load(path: &Path) -> Result<Self, LabelError> {
        let file = File::open(path).map_err(|source| LabelError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let labels = Self::from_reader(BufReader::new(file))?;
        tracing::info!(path = %path.display(), classes = labels.len(), "Class names loaded");
        Ok(labels)
    }

    /// One name per line. Bytes that are not valid UTF-8 are replaced
    /// rather than rejected.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, LabelError> {
        let names = reader
            .split(b'\n')
            .map(|line| {
                let mut line = line?;
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                Ok(String::from_utf8_lossy(&line).into_owned())
            })
            .collect::<Result<Vec<_>, std::io::Error>>()?;
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of `class_id`, or `Class #<id>` when there is none.
    pub fn label_for(&self, class_id: usize) -> Cow<'_, str> {
        match self.names.get(class_id) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("Class #{class_id}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn test_non_utf8_names_are_kept() {
        let labels = ClassLabels::from_reader(Cursor::new(b"caf\xe9\r\ndog\n".as_slice())).unwrap();

        assert_eq!(labels.len(), 2);
        assert!(labels.label_for(0).starts_with("caf"));
        assert_eq!(labels.label_for(1), "dog");
    }

    #[test]
    fn test_lines_map_to_class_ids() {
        let labels = ClassLabels::from_reader(Cursor::new("tench\r\ngoldfish\nshark\n")).unwrap();

        assert_eq!(labels.len(), 3);
        assert_eq!(labels.label_for(0), "tench");
        assert_eq!(labels.label_for(1), "goldfish");
        assert_eq!(labels.label_for(2), "shark");
    }

    #[test]
    fn test_out_of_range_id_uses_placeholder() {
        let labels = ClassLabels::new(vec!["cat".into(), "dog".into()]);
        assert_eq!(labels.label_for(2), "Class #2");
        assert_eq!(labels.label_for(999), "Class #999");
    }

    #[test]
    fn test_no_file_uses_placeholders() {
        let labels = ClassLabels::default();
        assert!(labels.is_empty());
        assert_eq!(labels.label_for(0), "Class #0");
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("classes.txt");
        std::fs::write(&path, "airplane\nautomobile\n").unwrap();

        let labels = ClassLabels::load(&path).unwrap();
        assert_eq!(labels.label_for(1), "automobile");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.txt");

        let err = ClassLabels::load(&path).unwrap_err();
        assert!(matches!(err, LabelError::NotFound { .. }));
        assert!(err.to_string().contains("missing.txt"));
    }
}
