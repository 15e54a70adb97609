use std::process::Stdio;

use anyhow::Context;
use authservice_binary::BinaryFetcher;
use authservice_binary::models::configuration::File;
use authservice_binary::providers::extractor::ExtractOptions;
use authservice_binary::providers::http_downloader::HttpDownloader;
use authservice_binary::providers::tar_gz_extractor::TarGzExtractor;
use log::debug;
use tokio::process::Command;

async fn read_yaml_file(path: &str) -> anyhow::Result<File> {
    let file = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path))?;
    let content = String::from_utf8(file)?;
    let base_file: File = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path))?;
    Ok(base_file)
}

fn fetcher_for(configuration: &File) -> BinaryFetcher {
    let downloader: HttpDownloader = HttpDownloader::default();
    let mut fetcher =
        BinaryFetcher::new(downloader, TarGzExtractor).with_platform(configuration.platform());
    if let Some(token) = &configuration.auth_token {
        fetcher = fetcher.with_auth_token(token.as_str());
    }
    if let Some(sha256) = &configuration.sha256 {
        fetcher = fetcher.with_sha256(sha256.as_str());
    }
    if let Some(prefix) = &configuration.strip_prefix {
        fetcher = fetcher.with_extract_options(ExtractOptions {
            strip_prefix: Some(prefix.clone()),
        });
    }
    fetcher
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let file = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!(
            "Usage: {} <path to yaml file> [args...]",
            std::env::args().next().unwrap_or_default()
        );
        std::process::exit(1);
    });

    let configuration = read_yaml_file(&file).await?;
    let executable_path = fetcher_for(&configuration)
        .ensure_versioned_binary(
            &configuration.version,
            &configuration.dest_dir(),
            &configuration.dest_file,
        )
        .await?;

    let args = std::env::args().skip(2).collect::<Vec<_>>();
    if args.is_empty() {
        println!("{}", executable_path.display());
        return Ok(());
    }

    // exec executable_path with the remaining args, forwarding stdin, stdout and stderr
    debug!("Executing: {} {:?}", executable_path.display(), args);
    let status = Command::new(&executable_path)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .with_context(|| format!("Failed to execute {}", executable_path.display()))?;
    if !status.success() {
        std::process::exit(status.code().unwrap_or(1));
    }

    Ok(())
}
