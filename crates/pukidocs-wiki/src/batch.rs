//! Whole-directory conversion.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::encoding::{decode_source, SourceEncoding};
use crate::links::PageContext;
use crate::page::convert_page;
use crate::pagename::{decode_page_name, NameError};

/// Extension of the verbatim source copy written next to each page.
pub const SOURCE_COPY_EXTENSION: &str = "pwtxt";

/// A locale and the wiki directory holding its pages.
#[derive(Debug, Clone)]
pub struct LocaleSource {
    /// Locale code, e.g. `ja`
    pub code: String,

    /// Page directory relative to the source root, e.g. `ja/wiki.en`
    pub wiki_dir: PathBuf,
}

impl LocaleSource {
    pub fn new(code: impl Into<String>, wiki_dir: impl Into<PathBuf>) -> Self {
        Self {
            code: code.into(),
            wiki_dir: wiki_dir.into(),
        }
    }
}

/// Configuration for a conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// PukiWiki data root (e.g. `htdocs`)
    pub source_dir: PathBuf,

    /// Markdown docs root
    pub output_dir: PathBuf,

    /// Locale rendered at the site root
    pub default_locale: String,

    /// Locales to convert
    pub locales: Vec<LocaleSource>,

    /// Attachment directory relative to the source root
    pub attach_dir: Option<PathBuf>,

    /// Image directory relative to the output root
    pub images_dir: String,

    /// Page converted to `index`
    pub start_page: String,

    /// Pages that are never written
    pub skip_pages: Vec<String>,

    /// How page sources are decoded
    pub encoding: SourceEncoding,

    /// Write the decoded source next to each page
    pub keep_source: bool,

    /// Remove previous output before converting
    pub clean: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("htdocs"),
            output_dir: PathBuf::from("docs"),
            default_locale: "ja".to_string(),
            locales: vec![
                LocaleSource::new("ja", "ja/wiki"),
                LocaleSource::new("en", "ja/wiki.en"),
            ],
            attach_dir: Some(PathBuf::from("ja/attach")),
            images_dir: "assets/images".to_string(),
            start_page: "FrontPage".to_string(),
            skip_pages: vec!["FormatRule".to_string()],
            encoding: SourceEncoding::Auto,
            keep_source: true,
            clean: false,
        }
    }
}

/// Result of a conversion run.
#[derive(Debug, Default)]
pub struct ConvertReport {
    /// Converted page names per locale, sorted
    pub pages: BTreeMap<String, Vec<String>>,

    /// Number of pages skipped by name
    pub skipped: usize,

    /// Number of attachments copied
    pub attachments: usize,

    /// Files that failed to convert, with the reason
    pub failures: Vec<(PathBuf, String)>,

    /// Total time in milliseconds
    pub duration_ms: u64,
}

impl ConvertReport {
    /// Total number of pages written.
    pub fn page_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }
}

/// Errors that abort a conversion run.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Source is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid name {path}: {source}")]
    Name {
        path: PathBuf,
        #[source]
        source: NameError,
    },

    #[error("Unexpected attachment name: {0}")]
    AttachmentName(PathBuf),
}

impl ConvertError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A page file scheduled for conversion.
#[derive(Debug)]
struct PageJob {
    source_path: PathBuf,
    page: String,
}

/// Converts a PukiWiki data directory into a Markdown docs tree.
pub struct WikiConverter {
    options: ConvertOptions,
}

impl WikiConverter {
    /// Create a converter.
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// Convert every locale and copy attachments.
    ///
    /// The output directory is not touched when the source directory is
    /// missing. Individual page failures are collected in the report.
    pub fn run(&self) -> Result<ConvertReport, ConvertError> {
        let start = Instant::now();
        let source_dir = &self.options.source_dir;

        if !source_dir.exists() {
            return Err(ConvertError::SourceNotFound(source_dir.clone()));
        }
        if !source_dir.is_dir() {
            return Err(ConvertError::NotADirectory(source_dir.clone()));
        }

        if self.options.clean {
            self.clean_output()?;
        }

        fs::create_dir_all(&self.options.output_dir)
            .map_err(|e| ConvertError::io(&self.options.output_dir, e))?;

        let mut report = ConvertReport {
            attachments: self.copy_attachments()?,
            ..Default::default()
        };

        for locale in &self.options.locales {
            self.convert_locale(locale, &mut report)?;
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }

    fn clean_output(&self) -> Result<(), ConvertError> {
        let mut targets: Vec<PathBuf> = self
            .options
            .locales
            .iter()
            .map(|l| self.options.output_dir.join(&l.code))
            .collect();
        targets.push(self.options.output_dir.join(&self.options.images_dir));

        for target in targets {
            if target.exists() {
                tracing::info!("Removing {}", target.display());
                fs::remove_dir_all(&target).map_err(|e| ConvertError::io(&target, e))?;
            }
        }
        Ok(())
    }

    /// Convert all pages of one locale.
    fn convert_locale(
        &self,
        locale: &LocaleSource,
        report: &mut ConvertReport,
    ) -> Result<(), ConvertError> {
        let wiki_dir = self.options.source_dir.join(&locale.wiki_dir);
        if !wiki_dir.is_dir() {
            tracing::warn!(
                "No wiki directory for locale {}: {}",
                locale.code,
                wiki_dir.display()
            );
            report.pages.entry(locale.code.clone()).or_default();
            return Ok(());
        }

        let (jobs, skipped) = self.discover_pages(&wiki_dir, report);
        report.skipped += skipped;
        tracing::info!("{} wiki files: {}", locale.code, jobs.len());

        let results: Vec<(PathBuf, Result<String, String>)> = jobs
            .par_iter()
            .map(|job| {
                let result = self
                    .convert_file(locale, job)
                    .map(|_| job.page.clone())
                    .map_err(|e| e.to_string());
                (job.source_path.clone(), result)
            })
            .collect();

        let pages = report.pages.entry(locale.code.clone()).or_default();
        for (path, result) in results {
            match result {
                Ok(page) => pages.push(page),
                Err(message) => {
                    tracing::error!("Failed to convert {}: {}", path.display(), message);
                    report.failures.push((path, message));
                }
            }
        }
        pages.sort();

        Ok(())
    }

    /// Find page files, decode their names and drop skipped or duplicate pages.
    fn discover_pages(&self, wiki_dir: &Path, report: &mut ConvertReport) -> (Vec<PageJob>, usize) {
        let mut files: Vec<PathBuf> = WalkDir::new(wiki_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("txt"))
            .collect();
        files.sort();

        let mut jobs = Vec::with_capacity(files.len());
        let mut seen = HashSet::new();
        let mut skipped = 0;

        for path in files {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            let page = match decode_page_name(stem) {
                Ok(name) => self.map_start_page(name),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    report.failures.push((path.clone(), e.to_string()));
                    continue;
                }
            };

            if self.options.skip_pages.iter().any(|s| *s == page) {
                tracing::info!("skip: {}", page);
                skipped += 1;
                continue;
            }

            if !seen.insert(page.clone()) {
                tracing::warn!("Duplicate page {} from {}, keeping first", page, path.display());
                skipped += 1;
                continue;
            }

            jobs.push(PageJob {
                source_path: path,
                page,
            });
        }

        (jobs, skipped)
    }

    fn map_start_page(&self, name: String) -> String {
        if name == self.options.start_page {
            "index".to_string()
        } else {
            name
        }
    }

    /// Convert a single page file and write the Markdown output.
    fn convert_file(&self, locale: &LocaleSource, job: &PageJob) -> Result<(), ConvertError> {
        tracing::debug!("processing: {}", job.source_path.display());

        let bytes = fs::read(&job.source_path).map_err(|e| ConvertError::io(&job.source_path, e))?;
        let decoded = decode_source(&bytes, self.options.encoding);
        if decoded.lossy {
            tracing::warn!(
                "Could not determine encoding of {}, decoded as {} with replacements",
                job.source_path.display(),
                decoded.encoding.name()
            );
        }

        let ctx = PageContext {
            page: job.page.clone(),
            locale: locale.code.clone(),
            default_locale: self.options.default_locale.clone(),
            images_dir: self.options.images_dir.clone(),
        };
        let markdown = convert_page(&decoded.text, &ctx);

        let out_file = self
            .options
            .output_dir
            .join(&locale.code)
            .join(format!("{}.md", job.page));
        if let Some(parent) = out_file.parent() {
            fs::create_dir_all(parent).map_err(|e| ConvertError::io(parent, e))?;
        }
        fs::write(&out_file, markdown).map_err(|e| ConvertError::io(&out_file, e))?;

        if self.options.keep_source {
            let copy = out_file.with_extension(SOURCE_COPY_EXTENSION);
            fs::write(&copy, &decoded.text).map_err(|e| ConvertError::io(&copy, e))?;
        }

        tracing::info!("{} -> {}", job.source_path.display(), out_file.display());
        Ok(())
    }

    /// Copy attachments into the image directory.
    ///
    /// Attachment files are named `<hex page>_<hex file>`; files with an
    /// extension are attachment logs and are ignored.
    fn copy_attachments(&self) -> Result<usize, ConvertError> {
        let Some(attach_dir) = &self.options.attach_dir else {
            return Ok(0);
        };
        let attach_dir = self.options.source_dir.join(attach_dir);
        if !attach_dir.is_dir() {
            tracing::debug!("No attachment directory: {}", attach_dir.display());
            return Ok(0);
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&attach_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && p.extension().is_none())
            .collect();
        files.sort();

        let images_root = self.options.output_dir.join(&self.options.images_dir);
        let mut count = 0;

        for path in files {
            let (page, file) = match self.attachment_target(&path) {
                Ok(target) => target,
                Err(e) => {
                    tracing::warn!("Skipping attachment: {}", e);
                    continue;
                }
            };

            let target_dir = images_root.join(&page);
            fs::create_dir_all(&target_dir).map_err(|e| ConvertError::io(&target_dir, e))?;
            let target = target_dir.join(&file);
            fs::copy(&path, &target).map_err(|e| ConvertError::io(&target, e))?;

            tracing::debug!("{} -> {}", path.display(), target.display());
            count += 1;
        }

        tracing::info!("Copied {} attachments", count);
        Ok(count)
    }

    fn attachment_target(&self, path: &Path) -> Result<(String, String), ConvertError> {
        let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        let Some((page_hex, file_hex)) = name.split_once('_') else {
            return Err(ConvertError::AttachmentName(path.to_path_buf()));
        };
        if file_hex.contains('_') {
            return Err(ConvertError::AttachmentName(path.to_path_buf()));
        }

        let decode = |hex: &str| {
            decode_page_name(hex).map_err(|source| ConvertError::Name {
                path: path.to_path_buf(),
                source,
            })
        };
        let page = self.map_start_page(decode(page_hex)?);
        let file = decode(file_hex)?.replace('/', "_");

        Ok((page, file))
    }
}
