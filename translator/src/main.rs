mod cli;

use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use xcase_psm::{PsmDiagram, PsmProject, Ref};
use xcase_translator::{project_file, Config, TranslationLog, XmlSchemaTranslator, XsdImporter};
use xcase_xsd::FileImportResolver;

use cli::{Cli, Command, ExportArgs, ImportArgs};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => Config::default(),
    };

    let log = match cli.command {
        Command::Export(args) => export(config, args)?,
        Command::Import(args) => import(config, args)?,
    };

    for entry in log.entries() {
        eprintln!("{entry}");
    }
    if cli.strict && log.has_errors() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn export(mut config: Config, args: ExportArgs) -> anyhow::Result<TranslationLog> {
    if let Some(replacement) = args.whitespace_replacement {
        config.translation.whitespace_replacement = replacement;
    }
    let project = project_file::load(&args.project)
        .with_context(|| format!("failed to load project {}", args.project.display()))?;
    let Some((diagram, _)) = project.iter::<PsmDiagram>().nth(args.diagram) else {
        bail!("the project has no diagram with index {}", args.diagram);
    };

    let result = XmlSchemaTranslator::from_config(&config)
        .translate(&project, diagram)
        .context("failed to serialize the schema")?;
    match &args.output {
        Some(path) => std::fs::write(path, &result.schema)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{}", result.schema),
    }
    Ok(result.log)
}

fn import(mut config: Config, args: ImportArgs) -> anyhow::Result<TranslationLog> {
    config.reverse.resolve_srs &= !args.no_resolve_srs;
    config.reverse.delete_unnecessary_srs_made_by_extensions &= !args.keep_extension_srs;
    config.reverse.use_commands &= !args.direct;
    config.reverse.layout |= args.layout;

    let text = std::fs::read_to_string(&args.schema)
        .with_context(|| format!("failed to read {}", args.schema.display()))?;
    let mut project = match &args.output {
        Some(path) if path.exists() => project_file::load(path)
            .with_context(|| format!("failed to load project {}", path.display()))?,
        _ => PsmProject::new(),
    };
    let name = args.name.clone().unwrap_or_else(|| {
        args.schema
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "imported".into())
    });

    let base_dir = args
        .schema
        .parent()
        .map(ToOwned::to_owned)
        .unwrap_or_default();
    let importer =
        XsdImporter::from_config(&config).with_resolver(FileImportResolver::new(base_dir));
    let mut report =
        |done: usize, total: usize| tracing::debug!("created {done} of {total} classes");
    let result = importer
        .import_str_with_progress(&mut project, &name, &text, &mut report)
        .with_context(|| format!("failed to import {}", args.schema.display()))?;
    describe(&project, result.diagram);

    match &args.output {
        Some(path) => project_file::save(&project, path)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", project_file::to_json_string(&project)?),
    }
    Ok(result.log)
}

fn describe(project: &PsmProject, diagram: Ref<PsmDiagram>) {
    let diagram = project.get(diagram);
    tracing::info!(
        "imported diagram {:?} with {} root classes",
        diagram.name,
        diagram.roots.len()
    );
}
