// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wsup breadcrumbs` - print the breadcrumbs persisted by the last run

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use wsup_core::format_breadcrumbs;
use wsup_supervisor::breadcrumbs::load_breadcrumbs;
use wsup_supervisor::DataPaths;

use super::resolve_data_dir;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct BreadcrumbArgs {
    /// Data directory to read (default: the primary)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Number of most recent entries to show
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}

pub async fn breadcrumbs(args: BreadcrumbArgs, format: OutputFormat) -> Result<()> {
    let (_, data_dir) = resolve_data_dir(args.data_dir)?;
    let mut crumbs = load_breadcrumbs(&DataPaths::new(data_dir).breadcrumbs());
    let skip = crumbs.len().saturating_sub(args.limit);
    crumbs.drain(..skip);

    format_or_json(format, &crumbs, || println!("{}", format_breadcrumbs(&crumbs, None)))
}
