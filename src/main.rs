// 标准库导入
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

// 第三方crate导入
use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

// 本地模块导入
use hinglish_translator::action::ActionState;
use hinglish_translator::api_constants::{error_messages, get_batch_size, storage_keys};
use hinglish_translator::background::BackgroundService;
use hinglish_translator::config::{Cli, Command as CliCommand, PageConfig, SelectionArgs};
use hinglish_translator::html_processor::select_elements;
use hinglish_translator::messaging::{channel, parse_command, Command};
use hinglish_translator::page::{Page, PageOrchestrator};
use hinglish_translator::selection::Selection;
use hinglish_translator::settings::{
    load_api_key, load_settings, remove_api_key, save_api_key, save_page_mode,
    save_translation_settings, FileSettingsStore, SettingsStore,
};
use hinglish_translator::stats::{format_duration, print_page_report, PageRunStats};
use hinglish_translator::translator::Dispatcher;
use hinglish_translator::types::{Level, Mode, PageMode, Style};
use hinglish_translator::utils::{
    generate_output_path_for_source, init_logging, load_input, validate_input_source,
};

/// 输出文件名附加的语言代码
const OUTPUT_LANG: &str = "hi";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let store: Arc<dyn SettingsStore> = Arc::new(FileSettingsStore::new(settings_path(&cli)?));

    let outcome = match &cli.command {
        CliCommand::Setup { key, skip_verify } => run_setup(&cli, store, key, *skip_verify).await,
        CliCommand::Forget => run_forget(store).await,
        CliCommand::Settings {
            style,
            level,
            page_mode,
        } => run_settings(store, *style, *level, *page_mode).await,
        CliCommand::Translate(args) => run_selection(&cli, store, Mode::Translate, args).await,
        CliCommand::Explain(args) => run_selection(&cli, store, Mode::Explain, args).await,
        CliCommand::Page {
            input,
            output,
            mode,
            batch_size,
            stats,
        } => {
            let options = PageOptions {
                input,
                output,
                mode: *mode,
                batch_size: *batch_size,
                stats: *stats || cli.verbose,
            };
            run_page(&cli, store, options).await
        }
        CliCommand::Message => run_message(&cli, store).await,
    };

    if let Err(e) = outcome {
        // 静默模式下日志关闭，错误仍输出到stderr
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// 设置文件路径：优先 `--settings`，否则使用平台配置目录
fn settings_path(cli: &Cli) -> Result<PathBuf> {
    if let Some(path) = &cli.settings {
        return Ok(path.clone());
    }
    let dirs = ProjectDirs::from("", "", "hinglish-translator")
        .context("could not determine the config directory, pass --settings")?;
    Ok(dirs.config_dir().join(storage_keys::SETTINGS_FILE_NAME))
}

fn build_dispatcher(cli: &Cli, store: Arc<dyn SettingsStore>) -> Result<Dispatcher> {
    Ok(Dispatcher::new(cli.translator_config(), store)?)
}

/// 未保存密钥时拒绝开始翻译
async fn ensure_credential(store: &dyn SettingsStore) -> Result<()> {
    if load_api_key(store).await?.is_none() {
        anyhow::bail!(
            "{}: {}",
            error_messages::MISSING_CREDENTIAL,
            error_messages::SETUP_HINT
        );
    }
    Ok(())
}

async fn run_setup(
    cli: &Cli,
    store: Arc<dyn SettingsStore>,
    key: &str,
    skip_verify: bool,
) -> Result<()> {
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("API key is empty");
    }

    if skip_verify {
        warn!("⚠️  storing the API key without verification");
    } else {
        info!("🔑 Verifying API key...");
        build_dispatcher(cli, store.clone())?
            .verify_credential(key)
            .await
            .context("API key verification failed")?;
    }

    save_api_key(store.as_ref(), key).await?;
    println!("✅ API key saved. Select text and run `translate` or `explain`.");
    Ok(())
}

async fn run_forget(store: Arc<dyn SettingsStore>) -> Result<()> {
    remove_api_key(store.as_ref()).await?;
    println!("🗑️  API key removed");
    Ok(())
}

async fn run_settings(
    store: Arc<dyn SettingsStore>,
    style: Option<Style>,
    level: Option<Level>,
    page_mode: Option<PageMode>,
) -> Result<()> {
    let current = load_settings(store.as_ref()).await?;

    if style.is_some() || level.is_some() {
        let (current_style, current_level) = current.style_level(Mode::Translate);
        save_translation_settings(
            store.as_ref(),
            style.unwrap_or(current_style),
            level.unwrap_or(current_level),
        )
        .await?;
    }
    if let Some(mode) = page_mode {
        save_page_mode(store.as_ref(), mode).await?;
    }

    let settings = load_settings(store.as_ref()).await?;
    println!("API key:   {}", if settings.api_key.is_some() { "set" } else { "not set" });
    let (style, level) = settings.style_level(Mode::Translate);
    println!("Style:     {}", style);
    println!("Level:     {}", level);
    println!("Page mode: {}", settings.page_mode);
    Ok(())
}

/// `translate` / `explain`：执行一次选区操作，打印浮层文本
async fn run_selection(
    cli: &Cli,
    store: Arc<dyn SettingsStore>,
    mode: Mode,
    args: &SelectionArgs,
) -> Result<()> {
    ensure_credential(store.as_ref()).await?;

    let (mut page, selection) = match (&args.text, &args.input) {
        (Some(text), _) => (Page::blank()?, Selection::Text(text.clone())),
        (None, Some(input)) => {
            let source = validate_input_source(input)?;
            let page = Page::parse(&load_input(&source).await?)?;
            let selector = args.select.as_deref().unwrap_or_default();
            let nodes = select_elements(page.dom(), selector);
            info!("🔎 {} element(s) match '{}'", nodes.len(), selector);
            (page, Selection::Nodes(nodes))
        }
        (None, None) => anyhow::bail!("nothing selected, pass --text or --input with --select"),
    };

    let (background, handle) = BackgroundService::new(build_dispatcher(cli, store.clone())?).spawn();
    let orchestrator = PageOrchestrator::new(Arc::new(background), store, PageConfig::new());

    let invocation = orchestrator
        .translate_selection(&mut page, mode, &selection)
        .await;
    drop(orchestrator);
    handle.await.context("background context panicked")?;

    let overlay = invocation
        .shown_overlay()
        .and_then(|id| page.overlays().get(id))
        .context("no result overlay was shown")?;

    match invocation.state() {
        ActionState::Done => {
            println!("{}", overlay.plain_text());
            Ok(())
        }
        _ => anyhow::bail!("{}", overlay.plain_text()),
    }
}

struct PageOptions<'a> {
    input: &'a str,
    output: &'a Option<PathBuf>,
    mode: Option<PageMode>,
    batch_size: usize,
    stats: bool,
}

/// `page`：翻译整个文档并写入输出文件
async fn run_page(cli: &Cli, store: Arc<dyn SettingsStore>, options: PageOptions<'_>) -> Result<()> {
    ensure_credential(store.as_ref()).await?;

    let total_start = Instant::now();
    let source = validate_input_source(options.input)?;
    let output_path = generate_output_path_for_source(&source, options.output, OUTPUT_LANG);

    info!("🚀 Translating page");
    info!("📂 Input: {}", options.input);
    info!("📄 Output: {}", output_path.display());

    let load_start = Instant::now();
    let html = load_input(&source).await?;
    let mut page = Page::parse(&html)?;
    let load_time = load_start.elapsed();

    let (page_messenger, mut page_inbox) = channel("page", 4);
    let (background, handle) = BackgroundService::new(build_dispatcher(cli, store.clone())?)
        .with_page(page_messenger)
        .spawn();
    let page_config = PageConfig::new().with_batch_size(get_batch_size(Some(options.batch_size)));
    let orchestrator =
        PageOrchestrator::new(Arc::new(background.clone()), store, page_config);

    let translate_start = Instant::now();
    let report = match options.mode {
        Some(mode) => {
            info!("📑 Page mode override: {}", mode);
            orchestrator.translate_page_with_mode(&page, mode).await
        }
        None => {
            // 与弹窗按钮相同的路径：后台把命令转发给页面
            background.send_message(Command::TranslatePage).await?;
            let envelope = page_inbox
                .recv()
                .await
                .context("translatePage was not relayed to the page")?;
            orchestrator
                .handle_envelope(&mut page, envelope)
                .await
                .context("page translation failed")?
        }
    };
    let translation_time = translate_start.elapsed();

    drop(orchestrator);
    drop(background);
    handle.await.context("background context panicked")?;

    let write_start = Instant::now();
    let translated = page.to_html()?;
    tokio::fs::write(&output_path, &translated)
        .await
        .with_context(|| format!("failed to write output file: {}", output_path.display()))?;
    let write_time = write_start.elapsed();

    let total_duration = total_start.elapsed();
    info!(
        "✅ Done: {}/{} translated in {}",
        report.translated,
        report.candidates,
        format_duration(total_duration)
    );
    if report.all_failed() {
        warn!("⚠️  every request failed, output is unchanged");
    }

    if options.stats {
        let stats = PageRunStats {
            load_time,
            translation_time,
            write_time,
            input_size: html.len(),
            output_size: translated.len(),
        };
        print_page_report(&report, &stats, total_duration);
    }

    Ok(())
}

/// `message`：从stdin读取一条JSON命令并打印应答
async fn run_message(cli: &Cli, store: Arc<dyn SettingsStore>) -> Result<()> {
    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("failed to read message from stdin")?;
    let command = parse_command(input.trim()).context("invalid message")?;

    let (background, handle) = BackgroundService::new(build_dispatcher(cli, store)?).spawn();
    let reply = background.send_message(command).await?;
    drop(background);
    handle.await.context("background context panicked")?;

    if let Some(text) = reply.wire_text() {
        println!("{}", text);
    }
    Ok(())
}
