/// Uploaded image referenced by annotations.
///
/// Content rows are shared across dataset versions; versioning only extends
/// their dataset association set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub id: String,
    pub user_id: String,
    pub stored_dir: String,
    pub stored_path: String,
    pub width: u32,
    pub height: u32,
}

impl Content {
    /// Source location handed to the training backend, e.g.
    /// `s3://<dir>/<file>` for a `s3://` prefix.
    pub fn source_uri(&self, uri_prefix: &str) -> String {
        let dir = self.stored_dir.trim_matches('/');
        let path = self.stored_path.trim_start_matches('/');
        if dir.is_empty() {
            format!("{uri_prefix}{path}")
        } else {
            format!("{uri_prefix}{dir}/{path}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(dir: &str, path: &str) -> Content {
        Content {
            id: "c1".into(),
            user_id: "u1".into(),
            stored_dir: dir.into(),
            stored_path: path.into(),
            width: 640,
            height: 480,
        }
    }

    #[test]
    fn source_uri_joins_prefix_dir_and_path() {
        assert_eq!(
            content("emld/u1/uploads/", "cat.jpg").source_uri("s3://"),
            "s3://emld/u1/uploads/cat.jpg"
        );
        assert_eq!(content("", "/cat.jpg").source_uri("file://"), "file://cat.jpg");
    }
}
