use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "socmap",
    version,
    about = "Build sharded employer/job-title to SOC code maps from LCA disclosure files"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Build(BuildArgs),
    Inventory(InventoryArgs),
    Inspect(InspectArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[arg(long, default_value = "raw_data")]
    pub input_dir: PathBuf,

    #[arg(long, default_value = "../site/public/company_soc")]
    pub output_dir: PathBuf,

    /// JSON object mapping broad SOC codes to detailed O*NET titles.
    #[arg(long)]
    pub enrichment_path: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = "raw_data")]
    pub input_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[arg(long)]
    pub path: PathBuf,

    #[arg(long, default_value_t = 5)]
    pub rows: usize,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "../site/public/company_soc")]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

pub fn default_manifest_path(output_dir: &std::path::Path) -> PathBuf {
    let mut name = output_dir
        .file_name()
        .map(|value| value.to_os_string())
        .unwrap_or_else(|| "shards".into());
    name.push(".manifest.json");
    output_dir.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn default_manifest_path_sits_next_to_shard_directory() {
        assert_eq!(
            default_manifest_path(Path::new("../site/public/company_soc")),
            PathBuf::from("../site/public/company_soc.manifest.json")
        );
        assert_eq!(
            default_manifest_path(Path::new("out/")),
            PathBuf::from("out.manifest.json")
        );
    }

    #[test]
    fn build_args_use_pipeline_defaults() {
        let cli = Cli::parse_from(["socmap", "build"]);
        let Commands::Build(args) = cli.command else {
            panic!("expected build subcommand");
        };
        assert_eq!(args.input_dir, PathBuf::from("raw_data"));
        assert_eq!(args.output_dir, PathBuf::from("../site/public/company_soc"));
        assert!(args.enrichment_path.is_none());
    }
}
