use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::format::format_markdown;
use crate::index::{splice, ArticleCard, Splice};
use crate::site::{self, Site};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("markdown file not found: {}", .0.display())]
    MissingFile(PathBuf),
}

/// Result of offering a card to the index page.
#[derive(Debug, Clone)]
pub struct IndexUpdate {
    pub card: ArticleCard,
    /// False when the index already had a card for this link.
    pub inserted: bool,
}

#[derive(Debug, Clone)]
pub struct Published {
    pub destination: PathBuf,
    pub archived: PathBuf,
    pub index: IndexUpdate,
}

/// Format an incoming article, publish it under today's date, add its card to
/// the index and archive the original.
///
/// Steps run in order and each one commits before the next: formatted post,
/// then index, then the move out of the incoming directory. A failure leaves
/// earlier steps in place; re-running is safe because the index refuses
/// duplicate cards.
pub fn publish(site: &Site, file_name: &str, image: Option<&str>, today: NaiveDate) -> Result<Published> {
    let source = site.incoming_dir().join(file_name);
    if !source.is_file() {
        return Err(PublishError::MissingFile(source).into());
    }
    let base_name = base_name(file_name);

    let posts_dir = site.posts_dir();
    fs::create_dir_all(&posts_dir)
        .with_context(|| format!("Failed to create {}", posts_dir.display()))?;
    let post_name = site::dated_filename(&base_name, today);
    let destination = posts_dir.join(&post_name);

    let raw = fs::read_to_string(&source)
        .with_context(|| format!("Failed to read {}", source.display()))?;
    let formatted = format_markdown(&raw);
    fs::write(&destination, &formatted)
        .with_context(|| format!("Failed to write {}", destination.display()))?;
    info!("Formatted {} -> {}", source.display(), destination.display());

    let title = site::extract_title(&formatted).unwrap_or_else(|| site::file_stem(&base_name));
    let image = image
        .map(str::to_string)
        .unwrap_or_else(|| site.article_image(&post_name));
    let card = ArticleCard::new(site.post_link(&post_name), image, title, today);
    let index = update_index(site, card)?;

    let archived = archive(site, &source, &base_name)?;

    Ok(Published {
        destination,
        archived,
        index,
    })
}

/// Register an already formatted post in the index without touching the file.
/// Title falls back to "Untitled Post", date to the file's date prefix or `today`.
pub fn add(site: &Site, markdown_path: &str, image: Option<&str>, today: NaiveDate) -> Result<IndexUpdate> {
    let path = site.root.join(markdown_path);
    if !path.is_file() {
        return Err(PublishError::MissingFile(path).into());
    }
    let markdown = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let title = site::extract_title(&markdown).unwrap_or_else(|| site::UNTITLED.to_string());
    let date = site::date_prefix(&base_name(markdown_path)).unwrap_or_else(|| {
        debug!("No date prefix on {}, using {}", markdown_path, today);
        today
    });
    let image = image.unwrap_or(site.layout.default_image.as_str()).to_string();
    let href = format!("blog-post.html?post={}", markdown_path);

    update_index(site, ArticleCard::new(href, image, title, date))
}

/// Format a markdown file into `output`, or in place.
pub fn format_file(input: &Path, output: Option<&Path>) -> Result<PathBuf> {
    if !input.is_file() {
        return Err(PublishError::MissingFile(input.to_path_buf()).into());
    }
    let raw = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let target = output.unwrap_or(input).to_path_buf();
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&target, format_markdown(&raw))
        .with_context(|| format!("Failed to write {}", target.display()))?;
    info!("Formatted {} -> {}", input.display(), target.display());
    Ok(target)
}

/// Splice `card` into the live index document. The file is rewritten only when
/// a card was actually inserted.
pub fn update_index(site: &Site, card: ArticleCard) -> Result<IndexUpdate> {
    let index_path = site.index_file();
    let document = fs::read_to_string(&index_path)
        .with_context(|| format!("Failed to read {}", index_path.display()))?;

    let fragment = card.to_fragment()?;
    let outcome = splice(&document, &card.href, &fragment)
        .with_context(|| format!("Cannot add article to {}", index_path.display()))?;

    let inserted = match outcome {
        Splice::Inserted(updated) => {
            fs::write(&index_path, updated)
                .with_context(|| format!("Failed to write {}", index_path.display()))?;
            info!("Added \"{}\" to {}", card.title, index_path.display());
            true
        }
        Splice::AlreadyPresent => {
            warn!("{} already exists in {}", card.href, index_path.display());
            false
        }
    };

    Ok(IndexUpdate { card, inserted })
}

fn archive(site: &Site, source: &Path, base_name: &str) -> Result<PathBuf> {
    let processed_dir = site.processed_dir();
    fs::create_dir_all(&processed_dir)
        .with_context(|| format!("Failed to create {}", processed_dir.display()))?;
    let target = processed_dir.join(base_name);
    move_file(source, &target)?;
    info!("Moved {} -> {}", source.display(), target.display());
    Ok(target)
}

/// Rename, or copy and delete when the rename crosses filesystems.
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Err(e) = fs::rename(from, to) {
        debug!("rename {} failed ({}), copying instead", from.display(), e);
        fs::copy(from, to)
            .with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
        fs::remove_file(from)
            .with_context(|| format!("Failed to remove {}", from.display()))?;
    }
    Ok(())
}

fn base_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::splice::SpliceError;
    use crate::site::Layout;
    use tempfile::TempDir;

    const INDEX_FIXTURE: &str = "tests/fixtures/index.html";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn setup(index: &str) -> (TempDir, Site) {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path(), Layout::default());
        fs::create_dir_all(site.incoming_dir()).unwrap();
        fs::write(site.index_file(), index).unwrap();
        (dir, site)
    }

    fn fixture_index() -> String {
        fs::read_to_string(INDEX_FIXTURE).unwrap()
    }

    fn write_incoming(site: &Site, name: &str, body: &str) {
        fs::write(site.incoming_dir().join(name), body).unwrap();
    }

    #[test]
    fn publish_end_to_end() {
        let (_dir, site) = setup(&fixture_index());
        write_incoming(&site, "2024-01-15-my-post.md", "# Hello World\n\nSome text.");
        assert!(!site.posts_dir().exists());

        let published = publish(&site, "2024-01-15-my-post.md", None, today()).unwrap();

        assert_eq!(published.destination, site.posts_dir().join("2026-10-19-my-post.md"));
        let post = fs::read_to_string(&published.destination).unwrap();
        assert_eq!(post, "# 📌 Hello World\n\nSome text.\n");

        let index = fs::read_to_string(site.index_file()).unwrap();
        assert_eq!(index.matches("class=\"article-card\"").count(), 2);
        assert_eq!(index.matches("data-date=\"2026-10-19\"").count(), 1);
        assert!(index.contains("<h3>📌 Hello World</h3>"));
        assert!(index.contains("October 19, 2026"));
        assert!(index.contains("src=\"assets/images/articles/my-post.jpg\""));
        // newest first
        let new_card = index.find("2026-10-19-my-post.md").unwrap();
        let old_card = index.find("2024-01-10-first-post.md").unwrap();
        assert!(new_card < old_card);

        assert!(published.index.inserted);
        assert_eq!(published.index.card.title, "📌 Hello World");
        assert!(!site.incoming_dir().join("2024-01-15-my-post.md").exists());
        assert_eq!(
            published.archived,
            site.processed_dir().join("2024-01-15-my-post.md")
        );
        assert!(published.archived.is_file());
    }

    #[test]
    fn image_override() {
        let (_dir, site) = setup(&fixture_index());
        write_incoming(&site, "post.md", "# Setup guide\n");
        let published = publish(&site, "post.md", Some("img/cover.png"), today()).unwrap();
        assert_eq!(published.index.card.image, "img/cover.png");
        assert_eq!(published.index.card.title, "🔧 Setup guide");
        let index = fs::read_to_string(site.index_file()).unwrap();
        assert!(index.contains("src=\"img/cover.png\""));
    }

    #[test]
    fn title_falls_back_to_stem() {
        let (_dir, site) = setup(&fixture_index());
        write_incoming(&site, "notes.md", "Just a paragraph.\n");
        let published = publish(&site, "notes.md", None, today()).unwrap();
        assert_eq!(published.index.card.title, "notes");
    }

    #[test]
    fn republish_does_not_duplicate_card() {
        let (_dir, site) = setup(&fixture_index());
        write_incoming(&site, "my-post.md", "# Hello\n");
        publish(&site, "my-post.md", None, today()).unwrap();
        let after_first = fs::read_to_string(site.index_file()).unwrap();

        write_incoming(&site, "my-post.md", "# Hello again\n");
        let second = publish(&site, "my-post.md", None, today()).unwrap();
        assert!(!second.index.inserted);
        assert_eq!(fs::read_to_string(site.index_file()).unwrap(), after_first);
    }

    #[test]
    fn missing_source_writes_nothing() {
        let (_dir, site) = setup(&fixture_index());
        let err = publish(&site, "nope.md", None, today()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PublishError>(),
            Some(PublishError::MissingFile(_))
        ));
        assert!(!site.posts_dir().exists());
        assert!(!site.processed_dir().exists());
        assert_eq!(fs::read_to_string(site.index_file()).unwrap(), fixture_index());
    }

    #[test]
    fn missing_container_keeps_source() {
        let index = "<html><body><div class=\"grid\"></div></body></html>";
        let (_dir, site) = setup(index);
        write_incoming(&site, "post.md", "# Post\n");

        let err = publish(&site, "post.md", None, today()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SpliceError>(),
            Some(&SpliceError::MissingContainer)
        );
        // formatted post stays, index untouched, source not archived
        assert!(site.posts_dir().join("2026-10-19-post.md").is_file());
        assert_eq!(fs::read_to_string(site.index_file()).unwrap(), index);
        assert!(site.incoming_dir().join("post.md").is_file());
        assert!(!site.processed_dir().exists());
    }

    #[test]
    fn add_uses_filename_date() {
        let (_dir, site) = setup(&fixture_index());
        fs::create_dir_all(site.posts_dir()).unwrap();
        let rel = "assets/blog_posts/2024-02-03-rust.md";
        fs::write(site.root.join(rel), "# 🦀 Rust Notes\n\nBody.\n").unwrap();

        let update = add(&site, rel, None, today()).unwrap();
        assert!(update.inserted);
        assert_eq!(update.card.title, "🦀 Rust Notes");
        assert_eq!(update.card.data_date(), "2024-02-03");
        assert_eq!(update.card.image, "assets/default_blog.jpg");

        let index = fs::read_to_string(site.index_file()).unwrap();
        assert!(index.contains(&format!("href=\"blog-post.html?post={}\"", rel)));
        assert!(index.contains("February 03, 2024"));
    }

    #[test]
    fn add_without_title_or_date() {
        let (_dir, site) = setup(&fixture_index());
        fs::write(site.root.join("draft.md"), "no heading\n").unwrap();
        let update = add(&site, "draft.md", Some("assets/x.jpg"), today()).unwrap();
        assert_eq!(update.card.title, site::UNTITLED);
        assert_eq!(update.card.date, today());
        assert_eq!(update.card.image, "assets/x.jpg");
    }

    #[test]
    fn format_file_in_place_and_copy() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.md");
        fs::write(&input, "# Overview\n\n```\nimport os\n```\n").unwrap();

        let out = dir.path().join("out/b.md");
        assert_eq!(format_file(&input, Some(&out)).unwrap(), out);
        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "# 📖 Overview\n\n```text\nimport os\n```\n"
        );
        assert_eq!(fs::read_to_string(&input).unwrap(), "# Overview\n\n```\nimport os\n```\n");

        format_file(&input, None).unwrap();
        assert!(fs::read_to_string(&input).unwrap().starts_with("# 📖 Overview"));
    }

    #[test]
    fn republish_escaped_name_keeps_one_card() {
        for name in ["rust's-ownership.md", "tips&tricks.md"] {
            let (_dir, site) = setup(&fixture_index());
            write_incoming(&site, name, "# Ownership\n");
            let first = publish(&site, name, None, today()).unwrap();
            assert!(first.index.inserted);
            let after_first = fs::read_to_string(site.index_file()).unwrap();
            assert_eq!(after_first.matches("data-date=\"2026-10-19\"").count(), 1);

            write_incoming(&site, name, "# Ownership\n");
            let second = publish(&site, name, None, today()).unwrap();
            assert!(!second.index.inserted, "{} inserted twice", name);
            assert_eq!(fs::read_to_string(site.index_file()).unwrap(), after_first);
        }
    }
}
