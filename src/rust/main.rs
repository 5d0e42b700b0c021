use std::io::{self, BufRead};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use complaint_router::model_store::DEFAULT_ARTIFACT;
use complaint_router::{ClassifierConfig, DepartmentClassifier, ModelStore, StoreError};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Department model artifact (defaults to the installed `department_classifier`)
    #[arg(long, env = "COMPLAINT_ROUTER_MODEL", global = true)]
    model: Option<PathBuf>,

    /// Expected SHA-256 of the artifact; loading fails on mismatch
    #[arg(long, env = "COMPLAINT_ROUTER_MODEL_SHA256", global = true)]
    sha256: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Route complaint texts to departments (reads one text per stdin line when none are given)
    Classify {
        texts: Vec<String>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the loaded model and its departments
    Info {
        #[arg(long)]
        json: bool,
    },
    /// Install an artifact from a local file into the model store
    Install {
        file: PathBuf,
        #[arg(long, default_value = DEFAULT_ARTIFACT)]
        name: String,
    },
    /// Download an artifact into the model store
    Fetch {
        url: String,
        #[arg(long, default_value = DEFAULT_ARTIFACT)]
        name: String,
        /// Remove any installed copy first
        #[arg(short, long)]
        fresh: bool,
    },
    /// Check an installed artifact against --sha256
    Verify {
        #[arg(long, default_value = DEFAULT_ARTIFACT)]
        name: String,
    },
}

fn classifier_config(args: &Args) -> ClassifierConfig {
    let config = match &args.model {
        Some(path) => ClassifierConfig::new(path),
        None => ClassifierConfig::from_env(),
    };
    match &args.sha256 {
        Some(hash) => config.with_expected_sha256(hash.clone()),
        None => config,
    }
}

fn load(args: &Args) -> Result<DepartmentClassifier> {
    let config = classifier_config(args);
    DepartmentClassifier::load(&config)
        .with_context(|| {
            format!("cannot load department model from {}", config.artifact_path.display())
        })
}

fn classify(args: &Args, texts: &[String], json: bool) -> Result<()> {
    let texts: Vec<String> = if texts.is_empty() {
        io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<Vec<_>>>()?
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .collect()
    } else {
        texts.to_vec()
    };

    let classifier = load(args)?;
    let start = Instant::now();
    let labels = classifier.classify(&texts)?;
    info!("Classified {} texts in {:.2?}", texts.len(), start.elapsed());

    if json {
        let rows: Vec<_> = texts
            .iter()
            .zip(&labels)
            .map(|(text, label)| serde_json::json!({ "text": text, "department": label }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for (text, label) in texts.iter().zip(&labels) {
            println!("{}\t{}", label, text);
        }
    }
    classifier.shutdown();
    Ok(())
}

fn show_info(args: &Args, json: bool) -> Result<()> {
    let classifier = load(args)?;
    let info = classifier.info();
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        let version = info.model_version.as_deref().unwrap_or("unversioned");
        println!("Model:        {} ({})", info.model_kind, version);
        if let Some(path) = &info.artifact_path {
            println!("Artifact:     {}", path);
        }
        println!("Max length:   {} characters", info.max_text_chars);
        println!("Departments:  {}", info.num_departments);
        for label in &info.department_labels {
            println!("  - {}", label);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match &args.command {
        Command::Classify { texts, json } => classify(&args, texts, *json)?,
        Command::Info { json } => show_info(&args, *json)?,
        Command::Install { file, name } => {
            let store = ModelStore::new_default()?;
            let path = store.install_from_file(name, file, args.sha256.as_deref())?;
            println!("Installed {}", path.display());
        }
        Command::Fetch { url, name, fresh } => {
            let store = ModelStore::new_default()?;
            if *fresh {
                info!("Fresh download requested - removing any installed artifact...");
                match store.remove(name) {
                    Ok(()) | Err(StoreError::NotInstalled(_)) => {}
                    Err(e) => return Err(e.into()),
                }
            }
            let path = store.download(name, url, args.sha256.as_deref()).await?;
            println!("Installed {}", path.display());
        }
        Command::Verify { name } => {
            let Some(expected) = args.sha256.as_deref() else {
                bail!("--sha256 (or COMPLAINT_ROUTER_MODEL_SHA256) is required to verify");
            };
            let store = ModelStore::new_default()?;
            if store.verify(name, expected)? {
                println!("{}: OK", name);
            } else {
                bail!("{}: verification failed", name);
            }
        }
    }

    Ok(())
}
