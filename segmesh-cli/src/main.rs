// segmesh command line interface
// Turns segmentation masks into meshes and splits existing meshes into material groups

mod paths;
mod run;

use clap::{Parser, Subcommand};
use segmesh_core::{Prompt, SegmeshConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "segmesh")]
#[command(about = "Mask-driven mesh synthesis and segmentation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (JSON or TOML)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment an image and build a mesh from its masks
    Generate {
        /// Input image
        #[arg(long, default_value = "input.jpg")]
        image: PathBuf,

        /// Output directory (must exist)
        #[arg(long, short, default_value = "output")]
        output: PathBuf,

        /// Mask source: `luminance`, or a path to a masks.json manifest.
        /// Defaults to `provider.model_variant` from the configuration.
        #[arg(long, short)]
        model: Option<String>,
    },

    /// Split an existing OBJ mesh into material groups from prompts
    Segment {
        /// Mesh to segment (.obj)
        #[arg(long)]
        mesh: PathBuf,

        /// Output directory (must exist)
        #[arg(long, short, default_value = "output")]
        output: PathBuf,

        /// Prompt, repeatable: `x,y` for a point, `x0,y0,x1,y1` for a box.
        /// Earlier prompts win faces claimed by later ones.
        #[arg(long = "prompt", value_parser = parse_prompt)]
        prompts: Vec<Prompt>,

        /// Falloff radius of point prompts, in mesh units
        #[arg(long, default_value = "1.0")]
        radius: f32,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn parse_prompt(s: &str) -> Result<Prompt, String> {
    s.parse::<Prompt>()
}

/// Defaults, then the optional file, then `SEGMESH_*` variables
fn load_config(path: Option<&Path>) -> anyhow::Result<SegmeshConfig> {
    let mut config = match path {
        Some(path) => {
            paths::readable_file(path, "config")?;
            SegmeshConfig::from_file(path)?
        }
        None => SegmeshConfig::default(),
    };
    config.apply_env()?;
    config.validate()?;
    Ok(config)
}

fn init_logging(verbose: bool, level: Option<&str>) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("info")))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(cli.verbose, config.log_level.as_deref());

    let result = match cli.command {
        Commands::Generate {
            image,
            output,
            model,
        } => {
            let model = model.unwrap_or_else(|| config.provider.model_variant.clone());
            run::generate(&image, &output, &model, config)
        }
        Commands::Segment {
            mesh,
            output,
            prompts,
            radius,
        } => run::segment(&mesh, &output, prompts, radius, config),
        Commands::Config => config
            .to_toml()
            .map(|text| print!("{}", text))
            .map_err(anyhow::Error::from),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_parser() {
        assert_eq!(parse_prompt("1,2").unwrap(), Prompt::Point { x: 1.0, y: 2.0 });
        assert_eq!(parse_prompt("2,3,0,1").unwrap(), Prompt::boxed(0.0, 1.0, 2.0, 3.0));
        assert!(parse_prompt("1,2,3").is_err());
        assert!(parse_prompt("a,b,c,d").is_err());
    }

    #[test]
    fn test_cli_keeps_prompt_order() {
        let cli = Cli::try_parse_from([
            "segmesh", "segment", "--mesh", "m.obj", "--prompt", "0,0,3,3", "--prompt", "1,1",
            "--prompt", "2,2",
        ])
        .unwrap();
        match cli.command {
            Commands::Segment { prompts, .. } => {
                assert_eq!(
                    prompts,
                    vec![
                        Prompt::boxed(0.0, 0.0, 3.0, 3.0),
                        Prompt::Point { x: 1.0, y: 1.0 },
                        Prompt::Point { x: 2.0, y: 2.0 },
                    ]
                );
            }
            _ => panic!("Expected segment command"),
        }
    }

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::try_parse_from(["segmesh", "generate"]).unwrap();
        match cli.command {
            Commands::Generate {
                image,
                output,
                model,
            } => {
                assert_eq!(image, PathBuf::from("input.jpg"));
                assert_eq!(output, PathBuf::from("output"));
                assert!(model.is_none());
            }
            _ => panic!("Expected generate command"),
        }
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config(Some(Path::new("/no/such/segmesh.toml"))).is_err());
    }
}
