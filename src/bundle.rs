// Bundle pipeline - assembles the static site into dist/
//
// Mirrors the project's build workflow: validate the expected layout,
// copy component fragments and assets, concatenate every component
// stylesheet into one bundle, and rewrite index.html to reference it.
// Prod mode additionally strips comments and blank runs from the CSS
// bundle. A JSON manifest records what the build produced.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Build flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleMode {
    Dev,
    Build,
    Prod,
}

impl BundleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleMode::Dev => "dev",
            BundleMode::Build => "build",
            BundleMode::Prod => "prod",
        }
    }
}

/// What a bundle run produced
#[derive(Debug, Serialize)]
pub struct BundleReport {
    pub mode: &'static str,
    pub generated_at: String,
    pub components: Vec<String>,
    pub files_copied: usize,
    pub css_bundle_bytes: usize,
}

/// Assemble `<root>/dist` from the project tree at `root`
pub fn run_bundle(root: &Path, mode: BundleMode) -> Result<BundleReport> {
    tracing::info!(component = "Bundle", "Building project ({})", mode.as_str());

    let components_dir = root.join("components");
    let index_html = root.join("index.html");
    if !components_dir.is_dir() {
        bail!("Project structure invalid: missing components/ directory");
    }
    if !index_html.is_file() {
        bail!("Project structure invalid: missing index.html");
    }

    let dist = root.join("dist");
    fs::create_dir_all(dist.join("assets")).context("Failed to create dist directory")?;

    // Components: copy fragments, gather CSS into one bundle
    let mut components = Vec::new();
    let mut css_bundle = String::new();
    let mut files_copied = 0;

    let mut entries: Vec<_> = fs::read_dir(&components_dir)
        .context("Failed to read components directory")?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = entry.file_name().to_string_lossy().to_string();
        let out_dir = dist.join("components").join(&name);
        fs::create_dir_all(&out_dir).context("Failed to create component output dir")?;

        for file in fs::read_dir(entry.path())?.filter_map(|f| f.ok()) {
            let path = file.path();
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            match ext {
                "css" => {
                    let css = fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    css_bundle.push_str(&format!("/* component: {name} */\n"));
                    css_bundle.push_str(&css);
                    css_bundle.push('\n');
                }
                "html" | "js" | "json" => {
                    fs::copy(&path, out_dir.join(file.file_name()))
                        .with_context(|| format!("Failed to copy {}", path.display()))?;
                    files_copied += 1;
                }
                _ => {}
            }
        }
        components.push(name);
    }

    if mode == BundleMode::Prod {
        css_bundle = minify_css(&css_bundle);
    }
    let css_bundle_bytes = css_bundle.len();
    fs::write(dist.join("assets").join("components.css"), &css_bundle)
        .context("Failed to write CSS bundle")?;

    // Assets: copied as-is (fixtures, icons)
    let assets_dir = root.join("assets");
    if assets_dir.is_dir() {
        files_copied += copy_dir(&assets_dir, &dist.join("assets"))?;
    }

    // Index page: reference the bundled stylesheet
    let index = fs::read_to_string(&index_html).context("Failed to read index.html")?;
    let bundled_link = r#"<link rel="stylesheet" href="assets/components.css">"#;
    let index = if index.contains("</head>") {
        index.replace("</head>", &format!("  {bundled_link}\n</head>"))
    } else {
        format!("{bundled_link}\n{index}")
    };
    fs::write(dist.join("index.html"), index).context("Failed to write index.html")?;
    files_copied += 1;

    let report = BundleReport {
        mode: mode.as_str(),
        generated_at: Utc::now().to_rfc3339(),
        components,
        files_copied,
        css_bundle_bytes,
    };
    fs::write(
        dist.join("build-manifest.json"),
        serde_json::to_string_pretty(&report).context("Failed to serialize manifest")?,
    )
    .context("Failed to write manifest")?;

    tracing::info!(
        component = "Bundle",
        "Build completed: {} components, {} files",
        report.components.len(),
        report.files_copied
    );
    Ok(report)
}

/// Strip block comments and blank runs; enough for fragment-sized CSS
fn minify_css(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start..].find("*/") {
            Some(end) => rest = &rest[start + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);

    out.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn copy_dir(from: &Path, to: &Path) -> Result<usize> {
    fs::create_dir_all(to).with_context(|| format!("Failed to create {}", to.display()))?;
    let mut copied = 0;
    for entry in fs::read_dir(from)?.filter_map(|e| e.ok()) {
        let path = entry.path();
        let target = to.join(entry.file_name());
        if path.is_dir() {
            copied += copy_dir(&path, &target)?;
        } else {
            fs::copy(&path, &target)
                .with_context(|| format!("Failed to copy {}", path.display()))?;
            copied += 1;
        }
    }
    Ok(copied)
}
