/*!
 * Copyright (c) 2026 Ming Lyu, aka mingcheng
 *
 * This source code is licensed under the MIT License,
 * which is located in the LICENSE file in the source tree's root directory.
 *
 * File: main.rs
 * Author: mingcheng <mingcheng@apache.org>
 * File Created: 2026-10-19 09:51:30
 *
 * Modified By: mingcheng <mingcheng@apache.org>
 * Last Modified: 2026-10-19 14:08:15
 */

mod command_classifier;
mod config;
mod imap_mailbox;
mod message;
mod rspamd_classifier;
mod scanner;
mod traits;

use clap::Parser;
use command_classifier::CommandClassifier;
use config::{AppConfig, ClassifierKind, CliOverrides, USAGE_HINT};
use imap_mailbox::ImapMailbox;
use log::{error, info};
use rspamd_classifier::RspamdClassifier;
use rustls::crypto;
use std::io::Write;
use traits::SpamClassifier;

struct MultiWriter {
    writers: Vec<Box<dyn Write + Send + 'static>>,
}

impl Write for MultiWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        for w in &mut self.writers {
            let _ = w.write(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        for w in &mut self.writers {
            let _ = w.flush();
        }
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    config: Option<String>,

    /// How many of the most recent messages to classify
    #[arg(short, long)]
    limit: Option<usize>,

    #[arg(long, value_enum)]
    classifier: Option<ClassifierKind>,
}

fn initialize_logger(config: &AppConfig) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::new();

    if let Some(level) = &config.log_level {
        builder.parse_filters(level);
    } else if let Ok(env_level) = std::env::var("RUST_LOG") {
        builder.parse_filters(&env_level);
    } else {
        builder.filter_level(log::LevelFilter::Info);
    }

    if let Some(log_file) = &config.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {}", log_file, e))?;

        if config.quiet {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        } else {
            let multi_writer = MultiWriter {
                writers: vec![Box::new(file), Box::new(std::io::stderr())],
            };
            builder.target(env_logger::Target::Pipe(Box::new(multi_writer)));
        }
    } else if config.quiet {
        builder.target(env_logger::Target::Pipe(Box::new(std::io::sink())));
    }

    builder.init();
    Ok(())
}

fn build_classifier(config: &AppConfig) -> anyhow::Result<Box<dyn SpamClassifier>> {
    let timeout = config.classifier_timeout();

    match config.classifier {
        ClassifierKind::Rspamd => {
            info!("Classifying with rspamd at {}", config.rspamd_url);
            Ok(Box::new(RspamdClassifier::new(&config.rspamd_url, timeout)?))
        }
        ClassifierKind::Command => {
            let (program, args) = config.classifier_argv()?;
            info!("Classifying with command: {}", config.classifier_command);
            Ok(Box::new(CommandClassifier::new(program, args, timeout)))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = crypto::ring::default_provider().install_default();

    let args = Args::parse();
    let overrides = CliOverrides {
        limit: args.limit,
        classifier: args.classifier,
    };

    let config = AppConfig::new(args.config.as_deref(), &overrides).unwrap_or_else(|e| {
        println!("Failed to load config: {}", e);
        std::process::exit(1);
    });

    initialize_logger(&config)?;

    let creds = config.credentials().unwrap_or_else(|e| {
        error!("{}", e);
        println!("{}", USAGE_HINT);
        std::process::exit(1);
    });

    let classifier = build_classifier(&config).unwrap_or_else(|e| {
        println!("Classifier setup error: {:#}", e);
        std::process::exit(1);
    });

    let mut mailbox = ImapMailbox::open(&creds, &config.imap_folder)
        .await
        .unwrap_or_else(|e| {
            println!("IMAP error: {:#}", e);
            std::process::exit(1);
        });

    let result = {
        let mut stdout = std::io::stdout().lock();
        scanner::scan_mailbox(
            &mut mailbox,
            classifier.as_ref(),
            config.scan_limit,
            &mut stdout,
        )
        .await
    };

    if let Err(e) = result {
        println!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
