//! Static file serving and HTML template rendering.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use minijinja::Environment;
use serde_json::Value as JsonValue;

/// Map a URL path onto `base`, refusing anything that would escape it.
fn resolve_path(base: &Path, url_path: &str) -> Option<PathBuf> {
    let mut pb = base.to_path_buf();
    for comp in Path::new(url_path.trim_start_matches('/')).components() {
        match comp {
            Component::Normal(s) => pb.push(s),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(pb)
}

/// Files served verbatim from a mount directory.
pub struct StaticFiles {
    base_dir: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self { base_dir: base.into() }
    }

    fn content_type(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "html" => "text/html",
            "css" => "text/css",
            "js" => "application/javascript",
            "json" => "application/json",
            "txt" => "text/plain",
            "png" => "image/png",
            "svg" => "image/svg+xml",
            _ => "application/octet-stream",
        }
    }

    /// Load a file under the mount. Traversal outside the base directory is
    /// a not-found error, never an escape.
    pub fn load(&self, url_path: &str) -> io::Result<(Vec<u8>, &'static str)> {
        let path = resolve_path(&self.base_dir, url_path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "invalid path"))?;
        if !path.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }
        let bytes = fs::read(&path)?;
        Ok((bytes, Self::content_type(&path)))
    }
}

/// HTML templates rendered with minijinja.
pub struct Templates {
    base_dir: PathBuf,
}

impl Templates {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self { base_dir: base.into() }
    }

    /// Render the named template file with the given context.
    pub fn render(&self, name: &str, ctx: &JsonValue) -> anyhow::Result<String> {
        let path = resolve_path(&self.base_dir, name)
            .ok_or_else(|| anyhow::anyhow!("invalid template name {name:?}"))?;
        let source = fs::read_to_string(&path)
            .with_context(|| format!("failed to read template {}", path.display()))?;
        let mut env = Environment::new();
        env.add_template(name, &source)?;
        let rendered = env.get_template(name)?.render(ctx)?;
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_path_prevents_traversal() {
        let base = Path::new("staticdata");
        assert!(resolve_path(base, "../Cargo.toml").is_none());
        assert!(resolve_path(base, "a/../../Cargo.toml").is_none());
        assert_eq!(
            resolve_path(base, "/css/app.css"),
            Some(PathBuf::from("staticdata/css/app.css"))
        );
    }

    #[test]
    fn load_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "Hello\n").unwrap();
        let sf = StaticFiles::new(dir.path());
        let (bytes, ct) = sf.load("hello.txt").unwrap();
        assert_eq!(ct, "text/plain");
        assert_eq!(String::from_utf8(bytes).unwrap(), "Hello\n");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let sf = StaticFiles::new(dir.path());
        assert_eq!(
            sf.load("nope.txt").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn render_template_with_context() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.html"), "<h1>Hello {{ name }}!</h1>").unwrap();
        let templates = Templates::new(dir.path());
        let out = templates.render("hello.html", &json!({ "name": "World" })).unwrap();
        assert_eq!(out, "<h1>Hello World!</h1>");
    }
}
