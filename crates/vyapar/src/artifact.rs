use std::path::{Path, PathBuf};

use crate::error::Error;

/// Writes generated deliverables (JSON / CSV / Markdown) under one output
/// directory. File names are sanitized to a flat, portable character set.
pub struct ArtifactWriter {
    root: PathBuf,
}

impl ArtifactWriter {
    /// Create a writer rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a pretty-printed JSON artifact. The output is guaranteed to
    /// parse back through `serde_json`.
    pub fn write_json(&self, name: &str, value: &serde_json::Value) -> Result<PathBuf, Error> {
        let path = self.path_for(name, "json");
        let content = serde_json::to_string_pretty(value)?;
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Write a Markdown artifact.
    pub fn write_markdown(&self, name: &str, content: &str) -> Result<PathBuf, Error> {
        let path = self.path_for(name, "md");
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Write a CSV artifact with RFC-4180 quoting for fields containing
    /// commas, quotes, or newlines.
    pub fn write_csv(
        &self,
        name: &str,
        headers: &[&str],
        rows: &[Vec<String>],
    ) -> Result<PathBuf, Error> {
        let path = self.path_for(name, "csv");
        let mut out = String::new();
        out.push_str(&csv_line(headers.iter().map(|h| h.to_string()).collect::<Vec<_>>()));
        for row in rows {
            out.push_str(&csv_line(row.clone()));
        }
        std::fs::write(&path, out)?;
        Ok(path)
    }

    fn path_for(&self, name: &str, extension: &str) -> PathBuf {
        let safe: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{safe}.{extension}"))
    }
}

fn csv_line(fields: Vec<String>) -> String {
    let escaped: Vec<String> = fields
        .into_iter()
        .map(|f| {
            if f.contains(',') || f.contains('"') || f.contains('\n') {
                format!("\"{}\"", f.replace('"', "\"\""))
            } else {
                f
            }
        })
        .collect();
    let mut line = escaped.join(",");
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer() -> (tempfile::TempDir, ArtifactWriter) {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path().join("out")).unwrap();
        (dir, writer)
    }

    #[test]
    fn json_artifact_round_trips() {
        let (_dir, writer) = writer();
        let value = serde_json::json!({
            "business": "Sharma Dhaba",
            "score": 87.5,
            "channels": ["instagram", "whatsapp"],
        });
        let path = writer.write_json("weekly report", &value).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn file_names_are_sanitized() {
        let (_dir, writer) = writer();
        let path = writer
            .write_json("report: week #1/2", &serde_json::json!({}))
            .unwrap();
        let file_name = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(file_name, "report__week__1_2.json");
    }

    #[test]
    fn markdown_artifact_written() {
        let (_dir, writer) = writer();
        let path = writer.write_markdown("summary", "# Weekly Summary\n").unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Weekly Summary"));
    }

    #[test]
    fn csv_escapes_commas_and_quotes() {
        let (_dir, writer) = writer();
        let rows = vec![
            vec!["Mon".to_string(), "120".to_string(), "normal".to_string()],
            vec![
                "Tue".to_string(),
                "98".to_string(),
                "promo, \"flash\" sale".to_string(),
            ],
        ];
        let path = writer.write_csv("metrics", &["day", "visitors", "note"], &rows).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), "day,visitors,note");
        assert_eq!(lines.next().unwrap(), "Mon,120,normal");
        assert_eq!(lines.next().unwrap(), "Tue,98,\"promo, \"\"flash\"\" sale\"");
    }

    #[test]
    fn new_creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let writer = ArtifactWriter::new(&nested).unwrap();
        assert!(writer.root().exists());
    }
}
