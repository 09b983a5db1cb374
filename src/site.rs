use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use config::{Config, Environment, File};
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

/// Optional per-project overrides, read from the project root.
pub const CONFIG_FILE: &str = "blog.toml";
const ENV_PREFIX: &str = "BLOG";

pub const UNTITLED: &str = "Untitled Post";

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#\s+(.+)$").unwrap());
static DATE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})(?:-|$)").unwrap());

/// Project-relative locations, `/`-separated so they double as URL paths.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Layout {
    pub incoming_dir: String,
    pub processed_dir: String,
    pub posts_dir: String,
    pub images_dir: String,
    pub index_file: String,
    pub default_image: String,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            incoming_dir: "markdown_format/original_articles".into(),
            processed_dir: "markdown_format/processed_articles".into(),
            posts_dir: "assets/blog_posts".into(),
            images_dir: "assets/images/articles".into(),
            index_file: "index.html".into(),
            default_image: "assets/default_blog.jpg".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Site {
    pub root: PathBuf,
    pub layout: Layout,
}

impl Site {
    pub fn new(root: impl Into<PathBuf>, layout: Layout) -> Self {
        Site {
            root: root.into(),
            layout,
        }
    }

    /// Defaults, then `blog.toml` in the root, then `BLOG_*` environment variables.
    pub fn load(root: &Path) -> Result<Self> {
        let d = Layout::default();
        let settings = Config::builder()
            .set_default("incoming_dir", d.incoming_dir)?
            .set_default("processed_dir", d.processed_dir)?
            .set_default("posts_dir", d.posts_dir)?
            .set_default("images_dir", d.images_dir)?
            .set_default("index_file", d.index_file)?
            .set_default("default_image", d.default_image)?
            .add_source(File::from(root.join(CONFIG_FILE)).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to load site configuration")?;
        let layout: Layout = settings
            .try_deserialize()
            .context("Invalid site configuration")?;
        debug!(?layout, root = %root.display(), "Loaded site layout");
        Ok(Site::new(root, layout))
    }

    pub fn incoming_dir(&self) -> PathBuf {
        self.root.join(&self.layout.incoming_dir)
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join(&self.layout.processed_dir)
    }

    pub fn posts_dir(&self) -> PathBuf {
        self.root.join(&self.layout.posts_dir)
    }

    pub fn index_file(&self) -> PathBuf {
        self.root.join(&self.layout.index_file)
    }

    /// Link target of a published post, as the index page references it.
    pub fn post_link(&self, post_name: &str) -> String {
        format!("blog-post.html?post={}/{}", self.layout.posts_dir, post_name)
    }

    /// Conventional cover image: `<images_dir>/<stem without date>.jpg`.
    pub fn article_image(&self, post_name: &str) -> String {
        let stem = file_stem(post_name);
        format!("{}/{}.jpg", self.layout.images_dir, strip_date_prefix(&stem))
    }
}

// ── Article naming ──

pub fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
}

/// Drop a leading `YYYY-MM-DD-` from a file name.
pub fn strip_date_prefix(name: &str) -> &str {
    match DATE_PREFIX_RE.find(name) {
        Some(m) if m.end() < name.len() => &name[m.end()..],
        _ => name,
    }
}

/// `YYYY-MM-DD` prefix of a file name, if present and a real date.
pub fn date_prefix(file_name: &str) -> Option<NaiveDate> {
    let caps = DATE_PREFIX_RE.captures(file_name)?;
    NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()
}

/// Destination name for a post published on `today`. An existing date prefix
/// is replaced.
pub fn dated_filename(file_name: &str, today: NaiveDate) -> String {
    format!("{}-{}", today.format("%Y-%m-%d"), strip_date_prefix(file_name))
}

/// Text of the first level-1 heading outside fenced code.
pub fn extract_title(markdown: &str) -> Option<String> {
    let mut in_fence = false;
    for line in markdown.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(caps) = TITLE_RE.captures(line) {
            let title = caps[1].trim();
            if !title.is_empty() {
                return Some(title.to_string());
            }
        }
    }
    None
}
