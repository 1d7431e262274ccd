//! Offline HTML tree map.
//!
//! Renders a directory tree into a single static page for local browsing. This
//! runs on trusted input from the command line and never goes through the
//! HTTP service's path confinement.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Local};
use walkdir::{DirEntry, WalkDir};

use crate::filesystem::{display, mime};

const EXCLUDED_DIRS: &[&str] = &[".git", "node_modules"];
const EXCLUDED_FILE_SUFFIXES: &[&str] = &[".out", ".so", ".so.1", ".swa", ".swp", ".rej", ".orig", "~"];

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Tree view</title>
<style>
  body { font-family: sans-serif; font-size: 14px; }
  ul { list-style: none; padding-left: 1.2em; }
  .folder > a { font-weight: bold; }
  .file a { text-decoration: none; color: #1a4f8b; }
  .link { color: #888; font-style: italic; }
</style>
</head>
<body>
<ul class="tree">
"#;

const PAGE_TAIL: &str = r#"</ul>
<script>
  document.querySelectorAll('.file a[data-path]').forEach(function (a) {
    a.href = a.dataset.path;
  });
</script>
</body>
</html>
"#;

/// Render the tree rooted at `root` as a complete HTML document
pub fn render_tree(root: &Path) -> String {
    let mut html = String::from(PAGE_HEAD);
    let mut open_dirs = 0usize;

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by(compare_entries)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_excluded_dir(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Error accessing {:?}: {}", e.path(), e);
                continue;
            }
        };

        while open_dirs > entry.depth() {
            html.push_str("</ul></li>\n");
            open_dirs -= 1;
        }

        let name = escape_html(&entry_name(&entry, root));
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            html.push_str(&format!("<li><span class=\"link\">{} (link)</span></li>\n", name));
        } else if file_type.is_dir() {
            html.push_str(&format!("<li><span class=\"folder\"><a>{}</a></span>\n<ul>\n", name));
            open_dirs += 1;
        } else if file_type.is_file() && !is_excluded_file(&entry) {
            html.push_str(&file_item(&entry, root, &name));
        } else {
            tracing::debug!("Skipped file: {}", entry.path().display());
        }
    }

    while open_dirs > 0 {
        html.push_str("</ul></li>\n");
        open_dirs -= 1;
    }

    html.push_str(PAGE_TAIL);
    html
}

/// Render the tree and write it to `output`, creating parent directories
pub fn write_tree(root: &Path, output: &Path) -> io::Result<()> {
    tracing::info!("Building HTML file tree for {}", root.display());
    let html = render_tree(root);
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, html)?;
    tracing::info!("Generated HTML: {}", output.display());
    Ok(())
}

fn file_item(entry: &DirEntry, root: &Path, name: &str) -> String {
    let relative = entry
        .path()
        .strip_prefix(root)
        .unwrap_or(entry.path())
        .to_string_lossy()
        .replace('\\', "/");

    let tooltip = match entry.metadata() {
        Ok(metadata) => {
            let modified = metadata
                .modified()
                .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|_| "?".to_string());
            format!(
                "Type: {} | Size: {} | Modified: {}",
                mime::guess_mime_from_extension(entry.path()),
                display::human_size(metadata.len()),
                modified
            )
        }
        Err(_) => "Type: ? | Size: ? | Modified: ?".to_string(),
    };

    format!(
        "<li><span class=\"file\"><a data-path=\"{}\" title=\"{}\">{}</a></span></li>\n",
        escape_html(&relative),
        escape_html(&tooltip),
        name
    )
}

fn entry_name(entry: &DirEntry, root: &Path) -> String {
    if entry.depth() == 0 {
        return root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root.display().to_string());
    }
    entry.file_name().to_string_lossy().to_string()
}

/// Directories first, then case-insensitive by name
fn compare_entries(a: &DirEntry, b: &DirEntry) -> Ordering {
    b.file_type()
        .is_dir()
        .cmp(&a.file_type().is_dir())
        .then_with(|| {
            a.file_name()
                .to_string_lossy()
                .to_lowercase()
                .cmp(&b.file_name().to_string_lossy().to_lowercase())
        })
}

fn is_excluded_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    EXCLUDED_DIRS.contains(&name.as_ref()) || name.starts_with("__")
}

fn is_excluded_file(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    EXCLUDED_FILE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_lists_directories_before_files() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.txt"), "a").unwrap();
        std::fs::create_dir(temp.path().join("Zeta")).unwrap();
        std::fs::write(temp.path().join("Zeta/inner.md"), "i").unwrap();

        let html = render_tree(temp.path());
        let dir_pos = html.find(">Zeta<").unwrap();
        let file_pos = html.find(">a.txt<").unwrap();
        assert!(dir_pos < file_pos);
        assert!(html.contains("data-path=\"Zeta/inner.md\""));
        assert!(html.contains("Type: text/markdown"));
        assert_eq!(html.matches("<ul>").count(), html.matches("</ul></li>").count());
    }

    #[test]
    fn test_render_skips_excluded_entries() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".git")).unwrap();
        std::fs::write(temp.path().join(".git/HEAD"), "ref").unwrap();
        std::fs::create_dir(temp.path().join("__cache")).unwrap();
        std::fs::write(temp.path().join("notes.txt~"), "old").unwrap();
        std::fs::write(temp.path().join("main.swp"), "swap").unwrap();
        std::fs::write(temp.path().join("keep.rs"), "fn main() {}").unwrap();

        let html = render_tree(temp.path());
        assert!(!html.contains("HEAD"));
        assert!(!html.contains("__cache"));
        assert!(!html.contains("notes.txt~"));
        assert!(!html.contains("main.swp"));
        assert!(html.contains(">keep.rs<"));
    }

    #[test]
    fn test_render_escapes_names() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("<b>&.txt"), "x").unwrap();

        let html = render_tree(temp.path());
        assert!(html.contains("&lt;b&gt;&amp;.txt"));
        assert!(!html.contains("<b>&.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_render_marks_symlinks_without_following() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("real")).unwrap();
        std::fs::write(temp.path().join("real/only-once.txt"), "x").unwrap();
        symlink(temp.path().join("real"), temp.path().join("alias")).unwrap();

        let html = render_tree(temp.path());
        assert!(html.contains("alias (link)"));
        assert_eq!(html.matches("only-once.txt").count(), 2); // data-path + label
    }

    #[test]
    fn test_write_tree_creates_output() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.txt"), "a").unwrap();
        let out = TempDir::new().unwrap();
        let output = out.path().join("site/treeview.html");

        write_tree(temp.path(), &output).unwrap();
        let written = std::fs::read_to_string(output).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
    }
}
