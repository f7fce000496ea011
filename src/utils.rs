// 标准库导入
use std::path::{Path, PathBuf};

// 第三方crate导入
use anyhow::{Context, Result};
use tracing::{info, warn};
use url::Url;

/// 输入源类型枚举
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// 本地文件路径
    File(PathBuf),
    /// 网页URL
    Url(Url),
}

/// 初始化日志系统
pub fn init_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}

/// 验证输入源，判断是http(s) URL还是文件路径
pub fn validate_input_source(input: &str) -> Result<InputSource> {
    if let Ok(url) = Url::parse(input) {
        if url.scheme() == "http" || url.scheme() == "https" {
            return Ok(InputSource::Url(url));
        }
    }

    let path = PathBuf::from(input);
    let absolute_path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()?.join(path)
    };

    Ok(InputSource::File(absolute_path))
}

/// 验证输入文件
pub fn validate_input_file(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("input file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("input path is not a file: {}", path.display());
    }

    if let Some(ext) = path.extension() {
        if ext != "html" && ext != "htm" {
            warn!("⚠️  file extension is not HTML: {}", ext.to_string_lossy());
        }
    }

    Ok(())
}

/// 读取输入源的HTML内容
pub async fn load_input(source: &InputSource) -> Result<String> {
    match source {
        InputSource::File(path) => {
            validate_input_file(path)?;
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read input file: {}", path.display()))
        }
        InputSource::Url(url) => {
            info!("🌐 Fetching {}", url);
            let response = reqwest::get(url.clone())
                .await
                .with_context(|| format!("failed to fetch {}", url))?
                .error_for_status()
                .with_context(|| format!("failed to fetch {}", url))?;
            response
                .text()
                .await
                .with_context(|| format!("failed to read body of {}", url))
        }
    }
}

/// 为不同输入源生成输出路径
pub fn generate_output_path_for_source(
    source: &InputSource,
    output: &Option<PathBuf>,
    lang: &str,
) -> PathBuf {
    if let Some(output_path) = output {
        return output_path.clone();
    }

    match source {
        InputSource::File(path) => generate_output_path(path, &None, lang),
        InputSource::Url(url) => {
            let host = url.host_str().unwrap_or("webpage");
            let path_segments: Vec<&str> = url
                .path_segments()
                .map(|segments| segments.filter(|s| !s.is_empty()).collect())
                .unwrap_or_default();

            let filename = match path_segments.last() {
                None => format!("{}_index_{}.html", host, lang),
                Some(page_name) => {
                    let page_name = match page_name.rfind('.') {
                        Some(dot_pos) => &page_name[..dot_pos],
                        None => page_name,
                    };
                    format!("{}_{}_{}.html", host, page_name, lang)
                }
            };

            let safe_filename = filename
                .chars()
                .map(|c| {
                    if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' {
                        c
                    } else {
                        '_'
                    }
                })
                .collect::<String>();

            PathBuf::from(safe_filename)
        }
    }
}

/// 生成输出文件路径: `page.html` -> `page_hi.html`
pub fn generate_output_path(input: &Path, output: &Option<PathBuf>, lang: &str) -> PathBuf {
    if let Some(output_path) = output {
        return output_path.clone();
    }

    let stem = input.file_stem().unwrap_or_default();
    let extension = input.extension().unwrap_or_default();

    let output_name = format!(
        "{}_{}.{}",
        stem.to_string_lossy(),
        lang,
        extension.to_string_lossy()
    );

    match input.parent() {
        Some(parent) => parent.join(output_name),
        None => PathBuf::from(output_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_and_file_sources() {
        assert!(matches!(
            validate_input_source("https://example.com/news/story.html").unwrap(),
            InputSource::Url(_)
        ));
        match validate_input_source("page.html").unwrap() {
            InputSource::File(path) => assert!(path.is_absolute()),
            other => panic!("expected a file, got {:?}", other),
        }
        // 非http协议按路径处理
        assert!(matches!(
            validate_input_source("ftp://example.com/a.html").unwrap(),
            InputSource::File(_)
        ));
    }

    #[test]
    fn test_output_paths() {
        assert_eq!(
            generate_output_path(Path::new("/tmp/site/page.html"), &None, "hi"),
            PathBuf::from("/tmp/site/page_hi.html")
        );
        let explicit = Some(PathBuf::from("out.html"));
        assert_eq!(
            generate_output_path(Path::new("/tmp/page.html"), &explicit, "hi"),
            PathBuf::from("out.html")
        );

        let story = validate_input_source("https://example.com/news/story.html").unwrap();
        assert_eq!(
            generate_output_path_for_source(&story, &None, "hi"),
            PathBuf::from("example.com_story_hi.html")
        );
        let root = validate_input_source("https://example.com/").unwrap();
        assert_eq!(
            generate_output_path_for_source(&root, &None, "hi"),
            PathBuf::from("example.com_index_hi.html")
        );
    }

    #[tokio::test]
    async fn test_load_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<p>Hello</p>").unwrap();

        let html = load_input(&InputSource::File(path)).await.unwrap();
        assert_eq!(html, "<p>Hello</p>");

        let missing = InputSource::File(dir.path().join("missing.html"));
        assert!(load_input(&missing).await.is_err());
    }
}
